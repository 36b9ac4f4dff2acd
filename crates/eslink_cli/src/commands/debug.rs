//! Debug command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use eslink_core::DebugInfo;

use super::{absolute, create_tokio_runtime, start_session};
use crate::cli::Cli;
use crate::document::FileDocument;

pub fn run_debug(cli: &Cli, file: &Path) -> Result<Option<DebugInfo>> {
    let file = absolute(file)?;
    let doc = FileDocument::open(&file).into_diagnostic()?;

    create_tokio_runtime()?.block_on(async {
        let session = start_session(cli)?;
        let info = session.debug(&doc).await;
        session.shutdown().await;
        info.into_diagnostic()
    })
}
