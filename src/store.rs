//! Extraction of the scanner's result file.
//!
//! The external tool writes its findings to a JSON file at a
//! caller-chosen path. [`extract`] reads that file into a [`ScanResult`]
//! and removes it so no temporary state outlives the scan, whatever the
//! parse outcome was.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parsed scan findings: the tool's top-level JSON object.
///
/// An empty map means "no usable result" - failed scan, missing output
/// file, or malformed content. The orchestrator never distinguishes
/// between those; callers that care inspect emptiness.
pub type ScanResult = serde_json::Map<String, Value>;

/// Reads and parses the result file at `output_path`, then deletes it.
///
/// The file is removed on every path - successful parse, parse failure,
/// or unreadable file - so repeated scans never pick up a stale result.
/// A top-level JSON value that is not an object (array, string, number)
/// counts as a parse failure and yields the empty map.
pub fn extract(output_path: &Path) -> ScanResult {
    let content = fs::read_to_string(output_path);
    // Remove before parsing so a malformed file is not left behind either.
    if let Err(e) = fs::remove_file(output_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %output_path.display(), error = %e, "failed to remove result file");
        }
    }

    let content = match content {
        Ok(content) => content,
        Err(_) => return ScanResult::new(),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            debug!(path = %output_path.display(), "result file did not contain a JSON object");
            ScanResult::new()
        }
    }
}
