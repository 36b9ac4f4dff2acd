//! Output formatting module

mod json;
mod text;

use std::path::Path;

use miette::Result;

use eslink_session::LintMessage;

use crate::cli::OutputFormat;

pub fn output_messages(file: &Path, messages: &[LintMessage], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_json(messages)?,
        OutputFormat::Text => text::output_text(file, messages),
    }
    Ok(())
}
