//! Acquisition seam for the managed scanner binary.
//!
//! Fetching the tool (typically from a vendor endpoint, with its own
//! authentication) is not this crate's concern. The pipeline supplies a
//! [`Downloader`]; the orchestrator only decides *when* to invoke it via
//! [`Scanner::should_download`](crate::Scanner::should_download).

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Places the scanner binary at a target path.
///
/// Implementations must leave the file's modification time at "now" on
/// success so that freshness checks see a fresh binary.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, target: &Path) -> Result<()>;
}

/// Downloader that copies the binary from a local path.
///
/// Used by the CLI (`scan --tool <path>`) and in tests, where a network
/// fetch is unavailable or unwanted.
pub struct LocalDownloader {
    source: PathBuf,
}

impl LocalDownloader {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl Downloader for LocalDownloader {
    async fn download(&self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(&self.source, target)
            .await
            .with_context(|| format!("failed to copy {} to {}", self.source.display(), target.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(target).await?.permissions();
            perms.set_mode(perms.mode() | 0o755);
            fs::set_permissions(target, perms).await?;
        }

        Ok(())
    }
}
