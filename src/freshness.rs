//! Freshness policy for the managed scanner binary.
//!
//! The external scanner CLI is cached on disk and re-downloaded once it
//! grows older than a configurable expiration window. This module holds
//! the pure decision function; acquisition itself is the
//! [`Downloader`](crate::Downloader)'s job.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Returns true if the binary at `path` must be (re-)acquired.
///
/// A missing file always needs acquisition. An existing file needs
/// re-acquisition once its age exceeds `window`; a zero window therefore
/// marks every file stale. Any error while reading metadata (permission
/// denied, broken mount) is treated as "file does not exist".
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use std::time::Duration;
/// use depscan::freshness::should_download;
///
/// assert!(should_download(Path::new("/nonexistent/twistcli"), Duration::from_secs(604800)));
/// ```
pub fn should_download(path: &Path, window: Duration) -> bool {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return true,
    };

    match SystemTime::now().duration_since(modified) {
        Ok(age) => age > window,
        // Clock went backwards; the file is from the future, not stale.
        Err(_) => false,
    }
}
