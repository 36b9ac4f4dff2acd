//! Lint command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use eslink_core::Severity;

use super::{absolute, create_tokio_runtime, start_session};
use crate::cli::{Cli, OutputFormat};
use crate::document::FileDocument;
use crate::output::output_messages;

pub fn run_lint(cli: &Cli, file: &Path, format: OutputFormat) -> Result<bool> {
    let file = absolute(file)?;
    let doc = FileDocument::open(&file).into_diagnostic()?;

    let result = create_tokio_runtime()?.block_on(async {
        let session = start_session(cli)?;
        let result = session.lint(&doc).await;
        session.shutdown().await;
        result.into_diagnostic()
    })?;

    let messages = result.unwrap_or_default();
    info!("{} message(s) for {}", messages.len(), file.display());
    output_messages(&file, &messages, format)?;
    Ok(messages.iter().any(|m| m.severity == Severity::Error))
}
