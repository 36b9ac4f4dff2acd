//! Integration tests for CLI behavior

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn eslink_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_eslink"))
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        eslink_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("lint"))
            .stdout(predicate::str::contains("fix"))
            .stdout(predicate::str::contains("debug"));
    }

    #[test]
    fn shows_version_with_flag() {
        eslink_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn requires_a_file() {
        eslink_cmd().arg("lint").assert().failure();
    }

    #[test]
    fn rejects_unknown_format() {
        eslink_cmd()
            .args(["lint", "--format", "sarif", "a.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("sarif"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        eslink_cmd()
            .arg("lint")
            .arg(dir.path().join("missing.js"))
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Cannot open"));
    }

    #[test]
    fn missing_worker_is_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        std::fs::write(&file, "var a = 1;\n").unwrap();

        eslink_cmd()
            .arg("--worker")
            .arg(dir.path().join("no-such-worker"))
            .arg("lint")
            .arg(&file)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Failed to start"));
    }

    #[test]
    fn malformed_settings_are_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        let settings = dir.path().join("settings.json");
        std::fs::write(&file, "var a = 1;\n").unwrap();
        std::fs::write(&settings, "{ not json").unwrap();

        eslink_cmd()
            .arg("--settings")
            .arg(&settings)
            .arg("lint")
            .arg(&file)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Failed to load settings"));
    }
}
