//! Fix command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result, miette};
use tracing::info;

use eslink_core::executor::FIX_INCOMPLETE;
use eslink_session::FixOutcome;

use super::{absolute, create_tokio_runtime, start_session};
use crate::cli::Cli;
use crate::document::FileDocument;

pub fn run_fix(cli: &Cli, file: &Path) -> Result<bool> {
    let file = absolute(file)?;
    let doc = FileDocument::open(&file).into_diagnostic()?;

    let outcome = create_tokio_runtime()?.block_on(async {
        let session = start_session(cli)?;
        let outcome = session.fix_job(&doc, false).await;
        session.shutdown().await;
        Ok::<_, miette::Report>(outcome)
    })?;

    match outcome {
        FixOutcome::Completed(status) => Ok(status == FIX_INCOMPLETE),
        FixOutcome::Skipped => {
            info!("No ESLint configuration for {}, nothing fixed", file.display());
            Ok(false)
        }
        FixOutcome::Refused => Err(miette!("{} must be saved before fixing", file.display())),
        FixOutcome::Failed(message) => Err(miette!("Fix failed: {}", message)),
    }
}
