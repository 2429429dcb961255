//! The scan orchestrator.
//!
//! [`Scanner`] owns the path of the managed scanner binary and composes
//! the freshness policy, the process runner, and the result store into
//! the three operations the pipeline needs: deciding whether the binary
//! must be (re-)downloaded, running a scan against one manifest, and
//! removing the binary.
//!
//! # Example
//!
//! ```no_run
//! use depscan::{ScanCommand, Scanner};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = Scanner::new("/tmp/depscan/twistcli", Duration::from_secs(604_800));
//!
//!     if scanner.should_download() {
//!         // hand off to a Downloader, then:
//!     }
//!
//!     let result = scanner
//!         .run_scan(
//!             &ScanCommand::Shell("/tmp/depscan/twistcli coderepo scan".to_string()),
//!             Path::new("requirements.txt"),
//!             Path::new("requirements_result.json"),
//!         )
//!         .await;
//!
//!     if result.is_empty() {
//!         eprintln!("scan produced no usable result");
//!     }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::CleanupError;
use crate::freshness;
use crate::process::{ProcessRunner, ScanCommand};
use crate::store::{self, ScanResult};

/// Orchestrates the managed scanner binary's lifecycle and execution.
///
/// The binary path is read-only during [`run_scan`](Self::run_scan), so
/// any number of scans with distinct output paths may run concurrently.
/// Do not call [`cleanup`](Self::cleanup) while a scan against the same
/// binary is in flight.
pub struct Scanner {
    binary_path: PathBuf,
    expiration: Duration,
    runner: ProcessRunner,
}

impl Scanner {
    /// Creates a scanner managing the binary at `binary_path`.
    ///
    /// `expiration` is the freshness window; pass the value from
    /// [`Config`](crate::Config) in production code.
    pub fn new(binary_path: impl Into<PathBuf>, expiration: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            expiration,
            runner: ProcessRunner::new(),
        }
    }

    /// Replaces the process runner, e.g. to inject a custom observer.
    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Path of the managed binary.
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// True if the managed binary is absent or older than the expiration
    /// window. Acquisition itself is delegated to a
    /// [`Downloader`](crate::Downloader).
    pub fn should_download(&self) -> bool {
        freshness::should_download(&self.binary_path, self.expiration)
    }

    /// Removes the managed binary.
    ///
    /// Idempotent: an absent binary is a silent no-op. Any other
    /// filesystem failure is returned, since a binary that cannot be
    /// removed would keep looking fresh to later
    /// [`should_download`](Self::should_download) checks.
    pub fn cleanup(&self) -> Result<(), CleanupError> {
        match fs::remove_file(&self.binary_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CleanupError {
                path: self.binary_path.clone(),
                source: e,
            }),
        }
    }

    /// Runs one scan: renders `command` with the manifest and output
    /// paths, executes it, and extracts the result file.
    ///
    /// Never fails: a spawn error, a non-zero exit, or an unusable result
    /// file all come back as the empty map, with the detail logged. On a
    /// non-zero exit the output file is not touched; on exit 0 the result
    /// file is guaranteed to be gone when this returns.
    pub async fn run_scan(
        &self,
        command: &ScanCommand,
        input_path: &Path,
        output_path: &Path,
    ) -> ScanResult {
        let rendered = render_command(command, input_path, output_path);

        let outcome = match self.runner.execute(&rendered).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(input = %input_path.display(), error = %e, "failed to spawn scanner");
                return ScanResult::new();
            }
        };

        if !outcome.success() {
            warn!(
                input = %input_path.display(),
                code = ?outcome.code,
                stderr = %String::from_utf8_lossy(&outcome.stderr),
                "scanner exited with failure"
            );
            return ScanResult::new();
        }

        store::extract(output_path)
    }
}

/// Substitutes the manifest and output paths into the command template.
///
/// The shell form appends `--output-file "<output>" "<input>"` to the base
/// command, matching the external tool's documented CLI shape exactly; the
/// structured form appends the equivalent arguments unquoted.
fn render_command(command: &ScanCommand, input_path: &Path, output_path: &Path) -> ScanCommand {
    match command {
        ScanCommand::Shell(base) => ScanCommand::Shell(format!(
            "{} --output-file \"{}\" \"{}\"",
            base,
            output_path.display(),
            input_path.display()
        )),
        ScanCommand::Args { program, args } => {
            let mut args = args.clone();
            args.push("--output-file".to_string());
            args.push(output_path.display().to_string());
            args.push(input_path.display().to_string());
            ScanCommand::Args {
                program: program.clone(),
                args,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const ONE_WEEK: Duration = Duration::from_secs(604_800);

    #[test]
    fn test_should_download_missing_binary() {
        let dir = tempdir().unwrap();
        let scanner = Scanner::new(dir.path().join("twistcli"), ONE_WEEK);

        assert!(scanner.should_download());
    }

    #[test]
    fn test_should_not_download_fresh_binary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twistcli");
        fs::write(&path, b"").unwrap();
        let scanner = Scanner::new(path, ONE_WEEK);

        assert!(!scanner.should_download());
    }

    #[test]
    fn test_should_download_with_zero_window() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twistcli");
        fs::write(&path, b"").unwrap();
        let scanner = Scanner::new(path, Duration::ZERO);

        assert!(scanner.should_download());
    }

    #[test]
    fn test_cleanup_removes_binary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twistcli");
        fs::write(&path, b"").unwrap();
        let scanner = Scanner::new(&path, ONE_WEEK);

        scanner.cleanup().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_missing_binary_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twistcli");
        let scanner = Scanner::new(&path, ONE_WEEK);

        scanner.cleanup().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_render_shell_command_shape() {
        let rendered = render_command(
            &ScanCommand::Shell("./twistcli coderepo scan".to_string()),
            Path::new("app/requirements.txt"),
            Path::new("app/requirements_result.json"),
        );

        match rendered {
            ScanCommand::Shell(line) => assert_eq!(
                line,
                "./twistcli coderepo scan --output-file \"app/requirements_result.json\" \"app/requirements.txt\""
            ),
            _ => panic!("expected shell command"),
        }
    }

    #[test]
    fn test_render_args_command_shape() {
        let rendered = render_command(
            &ScanCommand::args(
                "./twistcli",
                vec!["coderepo".to_string(), "scan".to_string()],
            ),
            Path::new("requirements.txt"),
            Path::new("result.json"),
        );

        match rendered {
            ScanCommand::Args { program, args } => {
                assert_eq!(program, PathBuf::from("./twistcli"));
                assert_eq!(
                    args,
                    vec![
                        "coderepo",
                        "scan",
                        "--output-file",
                        "result.json",
                        "requirements.txt"
                    ]
                );
            }
            _ => panic!("expected args command"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_scan_returns_parsed_result_and_removes_file() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("requirements_result.json");
        fs::write(&output_path, r#"{"vulnerabilities": []}"#).unwrap();

        let scanner = Scanner::new(dir.path().join("twistcli"), ONE_WEEK);
        // `true` ignores the rendered arguments and exits 0.
        let result = scanner
            .run_scan(
                &ScanCommand::Shell("true".to_string()),
                Path::new("requirements.txt"),
                &output_path,
            )
            .await;

        assert_eq!(result.get("vulnerabilities"), Some(&json!([])));
        assert!(!output_path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_scan_failure_returns_empty_and_keeps_output() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("requirements_result.json");
        fs::write(&output_path, r#"{"vulnerabilities": []}"#).unwrap();

        let scanner = Scanner::new(dir.path().join("twistcli"), ONE_WEEK);
        let result = scanner
            .run_scan(
                &ScanCommand::Shell("false".to_string()),
                Path::new("requirements.txt"),
                &output_path,
            )
            .await;

        assert!(result.is_empty());
        // Non-zero exit: the orchestrator must not touch the output file.
        assert!(output_path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_scan_missing_output_returns_empty() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("requirements_result.json");

        let scanner = Scanner::new(dir.path().join("twistcli"), ONE_WEEK);
        let result = scanner
            .run_scan(
                &ScanCommand::Shell("true".to_string()),
                Path::new("requirements.txt"),
                &output_path,
            )
            .await;

        assert!(result.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_scan_notifies_injected_observer() {
        use crate::process::{ProcessObserver, ProcessOutcome};
        use std::sync::{Arc, Mutex};

        struct Recorder(Mutex<Vec<Option<i32>>>);

        impl ProcessObserver for Recorder {
            fn on_exit(&self, outcome: &ProcessOutcome) {
                self.0.lock().unwrap().push(outcome.code);
            }
        }

        let dir = tempdir().unwrap();
        let observer = Arc::new(Recorder(Mutex::new(Vec::new())));
        let scanner = Scanner::new(dir.path().join("twistcli"), ONE_WEEK)
            .with_runner(ProcessRunner::with_observer(observer.clone()));

        scanner
            .run_scan(
                &ScanCommand::Shell("false".to_string()),
                Path::new("requirements.txt"),
                &dir.path().join("result.json"),
            )
            .await;

        assert_eq!(*observer.0.lock().unwrap(), vec![Some(1)]);
    }

    #[tokio::test]
    async fn test_run_scan_spawn_failure_returns_empty() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("result.json");

        let scanner = Scanner::new(dir.path().join("twistcli"), ONE_WEEK);
        let result = scanner
            .run_scan(
                &ScanCommand::args("/nonexistent/depscan-no-such-tool", Vec::new()),
                Path::new("requirements.txt"),
                &output_path,
            )
            .await;

        assert!(result.is_empty());
    }
}
