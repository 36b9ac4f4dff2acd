//! Lint records handed to the editor.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::warn;

use eslink_core::{Diagnostic, Fix, LineIndex, Range, Severity};

/// One lint result, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintMessage {
    pub severity: Severity,
    pub message: String,
    pub rule_id: Option<String>,
    pub file_path: PathBuf,
    pub range: Range,
    pub fix: Option<Fix>,
}

impl LintMessage {
    /// Builds the record for `diagnostic`, checking its ranges against the
    /// text that was linted.
    ///
    /// A diagnostic whose range falls outside the text is replaced by an
    /// error on the first line describing the bad location.
    pub fn from_diagnostic(
        diagnostic: Diagnostic,
        file_path: &Path,
        index: &LineIndex,
        show_rule_id: bool,
    ) -> Self {
        let Diagnostic {
            severity,
            message,
            rule_id,
            range,
            fix,
        } = diagnostic;

        if !index.contains(&range) {
            warn!(
                "Dropping invalid range {:?} for {:?} in {}",
                range,
                rule_id,
                file_path.display()
            );
            return Self {
                severity: Severity::Error,
                message: invalid_range_message(&message, rule_id.as_deref(), &range),
                rule_id,
                file_path: file_path.to_path_buf(),
                range: index.line_range(0),
                fix: None,
            };
        }

        let message = match (&rule_id, show_rule_id) {
            (Some(rule), true) => format!("{} ({})", message, rule),
            _ => message,
        };
        Self {
            severity,
            message,
            rule_id,
            file_path: file_path.to_path_buf(),
            range,
            fix: fix.filter(|f| index.contains(&f.range)),
        }
    }

    /// JSON form used by command-line output.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "severity": self.severity,
            "message": self.message,
            "ruleId": self.rule_id,
            "filePath": self.file_path,
            "range": self.range,
            "fix": self.fix,
        })
    }
}

fn invalid_range_message(message: &str, rule_id: Option<&str>, range: &Range) -> String {
    format!(
        "Cannot mark location in editor for {} - {} - Location: {}:{}-{}:{}",
        rule_id.unwrap_or("a parse error"),
        message,
        range.start.line + 1,
        range.start.column + 1,
        range.end.line + 1,
        range.end.column + 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn diagnostic() -> Diagnostic {
        Diagnostic::new(
            Some("semi".to_string()),
            "Extra semicolon.",
            Range::from_tuples((0, 8), (0, 9)),
        )
    }

    #[rstest]
    #[case(true, "Extra semicolon. (semi)")]
    #[case(false, "Extra semicolon.")]
    fn test_rule_id_suffix(#[case] show: bool, #[case] expected: &str) {
        let index = LineIndex::new("foo = 42;;\n");
        let message = LintMessage::from_diagnostic(diagnostic(), Path::new("/p/a.js"), &index, show);
        assert_eq!(message.message, expected);
        assert_eq!(message.file_path, PathBuf::from("/p/a.js"));
        assert_eq!(message.range, Range::from_tuples((0, 8), (0, 9)));
    }

    #[test]
    fn test_out_of_bounds_range_is_reported() {
        let index = LineIndex::new("a;\n");
        let message = LintMessage::from_diagnostic(diagnostic(), Path::new("/p/a.js"), &index, true);

        assert_eq!(message.severity, Severity::Error);
        assert!(message.message.starts_with("Cannot mark location in editor for semi"));
        assert!(message.message.ends_with("Location: 1:9-1:10"));
        assert!(index.contains(&message.range));
        assert_eq!(message.fix, None);
    }
}
