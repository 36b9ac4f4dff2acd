//! JSON output formatter

use miette::{IntoDiagnostic, Result};

use eslink_session::LintMessage;

pub fn output_json(messages: &[LintMessage]) -> Result<()> {
    let output: Vec<_> = messages.iter().map(LintMessage::to_json).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
