use std::path::PathBuf;
use thiserror::Error;

/// Failure while removing the managed scanner binary.
///
/// A missing binary is never an error (cleanup is idempotent), but any
/// other filesystem failure is surfaced: a binary that cannot be removed
/// would keep passing freshness checks while being stale.
#[derive(Debug, Error)]
#[error("failed to remove scanner binary at {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
