//! Text output formatter

use std::path::Path;

use eslink_core::Severity;
use eslink_session::LintMessage;

pub fn output_text(file: &Path, messages: &[LintMessage]) {
    if !messages.is_empty() {
        println!("\n{}:", file.display());
    }
    for message in messages {
        let severity = match message.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        let fixable = if message.fix.is_some() { " (fixable)" } else { "" };
        println!(
            "  {}:{} {}: {}{}",
            message.range.start.line + 1,
            message.range.start.column + 1,
            severity,
            message.message,
            fixable
        );
    }

    println!();
    println!("Found {} issues", messages.len());
}
