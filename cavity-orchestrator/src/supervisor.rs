//! Process supervisor
//!
//! Runs the external solver as a child process and reports how it ended:
//! - Translating parameters into solver flags
//! - Spawning the solver with piped output
//! - Capturing stdout and stderr into one diagnostics buffer
//! - Observing the exit code
//!
//! Lines from both streams are appended in the order they arrive. Ordering
//! between the two streams depends on OS pipe buffering and is not
//! deterministic; ordering within one stream is preserved.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use cavity_core::domain::simulation::SimulationParams;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Maximum diagnostics captured per run (10 MiB). Later output is read and discarded.
const MAX_DIAGNOSTICS_BYTES: usize = 10 * 1024 * 1024;

const TRUNCATION_MARKER: &str = "\n[output truncated]\n";

/// Solver flag for each parameter, in invocation order
const SOLVER_FLAGS: [(&str, fn(&SimulationParams) -> String); 6] = [
    ("--nx", |p| p.nx.to_string()),
    ("--ny", |p| p.ny.to_string()),
    ("--re", |p| p.reynolds_number.to_string()),
    ("--steps", |p| p.steps.to_string()),
    ("--dt", |p| p.dt.to_string()),
    ("--lid_vel", |p| p.lid_velocity.to_string()),
];

/// Builds the solver arguments for one run
///
/// Numbers use Rust's `Display` form, which is locale independent and never
/// switches to exponent notation (`1.0` -> `1`, `0.0001` -> `0.0001`).
pub fn solver_args(params: &SimulationParams, result_target: &Path) -> Vec<OsString> {
    let mut args = Vec::with_capacity(SOLVER_FLAGS.len() * 2 + 2);
    for (flag, value) in SOLVER_FLAGS {
        args.push(OsString::from(flag));
        args.push(OsString::from(value(params)));
    }
    args.push(OsString::from("--output"));
    args.push(result_target.as_os_str().to_owned());
    args
}

/// How to launch the solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCommand {
    /// Executable, e.g. `python`
    pub program: String,
    /// Arguments placed before the parameter flags, e.g. the script path
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

/// Outcome of a solver process that was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr
    pub diagnostics: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Diagnostics recorded for a failed run, led by the exit code
    pub fn failure_report(&self) -> String {
        match self.exit_code {
            Some(code) => format!("Process exited with code {}\n\n{}", code, self.diagnostics),
            None => format!(
                "Process terminated without an exit code\n\n{}",
                self.diagnostics
            ),
        }
    }
}

/// Errors raised when the solver could not be run at all
///
/// A non-zero exit is not an error; it is reported through [`ProcessOutcome`].
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to prepare output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for solver process: {0}")]
    Wait(#[source] io::Error),
}

/// Runs one solver process to completion
#[async_trait]
pub trait Supervisor: Send + Sync {
    async fn execute(
        &self,
        params: &SimulationParams,
        result_target: &Path,
    ) -> Result<ProcessOutcome, SupervisorError>;
}

/// [`Supervisor`] backed by a local child process
pub struct ProcessSupervisor {
    command: SolverCommand,
}

impl ProcessSupervisor {
    pub fn new(command: SolverCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    async fn execute(
        &self,
        params: &SimulationParams,
        result_target: &Path,
    ) -> Result<ProcessOutcome, SupervisorError> {
        if let Some(dir) = result_target
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| SupervisorError::OutputDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let mut command = Command::new(&self.command.program);
        command
            .args(&self.command.args)
            .args(solver_args(params, result_target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.command.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| SupervisorError::Spawn {
            program: self.command.program.clone(),
            source,
        })?;

        info!(
            pid = ?child.id(),
            program = %self.command.program,
            target = %result_target.display(),
            "Solver process started"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let stdout = pump_lines(child.stdout.take(), "stdout", tx.clone());
        let stderr = pump_lines(child.stderr.take(), "stderr", tx);
        let ((), (), diagnostics) = tokio::join!(stdout, stderr, collect(rx));

        let status = child.wait().await.map_err(SupervisorError::Wait)?;

        info!(exit_code = ?status.code(), bytes = diagnostics.len(), "Solver process exited");

        Ok(ProcessOutcome {
            exit_code: status.code(),
            diagnostics,
        })
    }
}

/// Forwards lines from one stream until EOF
///
/// Lines longer than the diagnostics cap arrive as several segments, so a
/// solver that never prints a newline cannot grow memory without bound.
async fn pump_lines<R: AsyncRead + Unpin>(
    stream: Option<R>,
    name: &'static str,
    tx: mpsc::UnboundedSender<Vec<u8>>,
) {
    let Some(stream) = stream else {
        return;
    };
    let mut reader = BufReader::new(stream);

    loop {
        match next_segment(&mut reader, MAX_DIAGNOSTICS_BYTES).await {
            Ok(None) => break,
            Ok(Some(segment)) => {
                debug!(stream = name, "{}", String::from_utf8_lossy(&segment).trim_end());
                if tx.send(segment).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(stream = name, error = %e, "Failed to read solver output");
                break;
            }
        }
    }
}

/// Reads through the next newline, or `limit` bytes, whichever comes first
///
/// Returns `None` at EOF.
async fn next_segment<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> io::Result<Option<Vec<u8>>> {
    let mut segment = Vec::new();

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok((!segment.is_empty()).then_some(segment));
        }

        let room = limit.saturating_sub(segment.len()).max(1);
        let window = &available[..available.len().min(room)];
        let (used, done) = match window.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (window.len(), segment.len() + window.len() >= limit),
        };

        segment.extend_from_slice(&window[..used]);
        reader.consume(used);

        if done {
            return Ok(Some(segment));
        }
    }
}

/// Concatenates segments in arrival order until every sender is gone
///
/// The result is always a prefix of what arrived: once the cap is reached the
/// rest is drained and dropped, and the marker is appended at the cut.
async fn collect(mut rx: mpsc::UnboundedReceiver<Vec<u8>>) -> String {
    let mut buffer = Vec::new();
    let mut truncated = false;

    while let Some(segment) = rx.recv().await {
        if truncated {
            continue;
        }
        let room = MAX_DIAGNOSTICS_BYTES - buffer.len();
        if segment.len() > room {
            buffer.extend_from_slice(&segment[..room]);
            truncated = true;
        } else {
            buffer.extend_from_slice(&segment);
        }
    }

    let mut diagnostics = String::from_utf8_lossy(&buffer).into_owned();
    if truncated {
        warn!(limit = MAX_DIAGNOSTICS_BYTES, "Solver output truncated");
        diagnostics.push_str(TRUNCATION_MARKER);
    }
    diagnostics
}
