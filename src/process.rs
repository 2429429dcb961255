//! Asynchronous subprocess execution for the external scanner CLI.
//!
//! The scanner tool is invoked as a child process. [`ScanCommand`]
//! describes the invocation, [`ProcessRunner`] spawns it on the tokio
//! runtime with both streams captured, and a [`ProcessObserver`] receives
//! the outcome once the child exits. The default observer logs the
//! captured streams via `tracing` so operators can see the tool's own
//! diagnostics.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// A scanner invocation, before the input/output paths are rendered in.
///
/// Prefer [`ScanCommand::Args`]: the program is spawned directly and
/// arguments are passed as-is, so paths with spaces or metacharacters are
/// safe. [`ScanCommand::Shell`] hands the rendered string to `sh -c`
/// unescaped; use it only when the tool's documented interface needs
/// shell features, and only with trusted input.
#[derive(Debug, Clone)]
pub enum ScanCommand {
    /// Structured invocation: program path plus argument list.
    Args { program: PathBuf, args: Vec<String> },
    /// Raw shell command string, executed via `sh -c`.
    Shell(String),
}

impl ScanCommand {
    /// Convenience constructor for the structured form.
    pub fn args(program: impl Into<PathBuf>, args: impl IntoIterator<Item = String>) -> Self {
        Self::Args {
            program: program.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// Exit code and captured streams of a finished scanner process.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutcome {
    /// True if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Observer notified after each scanner process exits.
///
/// Keeps the runner free of a hidden dependency on global logging:
/// callers that want different diagnostics (or none) inject their own
/// implementation.
pub trait ProcessObserver: Send + Sync {
    fn on_exit(&self, outcome: &ProcessOutcome);
}

/// Default observer: logs the captured streams at debug level.
pub struct TraceObserver;

impl ProcessObserver for TraceObserver {
    fn on_exit(&self, outcome: &ProcessOutcome) {
        debug!(
            code = ?outcome.code,
            stdout = %String::from_utf8_lossy(&outcome.stdout),
            stderr = %String::from_utf8_lossy(&outcome.stderr),
            "scanner process exited"
        );
    }
}

/// Spawns scanner invocations without blocking the caller's other tasks.
pub struct ProcessRunner {
    observer: Arc<dyn ProcessObserver>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            observer: Arc::new(TraceObserver),
        }
    }

    /// Creates a runner that reports outcomes to a custom observer.
    pub fn with_observer(observer: Arc<dyn ProcessObserver>) -> Self {
        Self { observer }
    }

    /// Runs `command` to completion, capturing stdout and stderr fully.
    ///
    /// The child is spawned with `kill_on_drop`, so cancelling the
    /// awaiting task terminates it rather than leaving an orphan. The
    /// observer is notified after exit regardless of the exit code.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be spawned (program
    /// missing, permission denied). A non-zero exit is not an error here;
    /// it is reported through [`ProcessOutcome::code`].
    pub async fn execute(&self, command: &ScanCommand) -> io::Result<ProcessOutcome> {
        let mut cmd = match command {
            ScanCommand::Args { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            ScanCommand::Shell(line) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(line);
                cmd
            }
        };

        let output = cmd.kill_on_drop(true).output().await?;

        let outcome = ProcessOutcome {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        };
        self.observer.on_exit(&outcome);
        Ok(outcome)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
