//! The filesystem probe: up to three independent operations, run in a fixed
//! order, whose failures are collected rather than propagated.

pub mod poll;

use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::config::ProbeConfig;
use crate::errors::ProbeError;
use crate::fs_op;

pub use poll::{poll_file_content, PollOutcome};

/// The operations a probe can perform, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    WriteNewFile,
    FileMode,
    ReadFileContent,
}

impl Operation {
    /// Fixed execution order. Later operations run whatever happened to
    /// earlier ones.
    pub const ORDER: [Operation; 3] = [
        Operation::WriteNewFile,
        Operation::FileMode,
        Operation::ReadFileContent,
    ];

    /// Exit policy table: whether a failure of this operation makes the
    /// whole invocation fail.
    ///
    /// Poll-and-read never counts; it always reports what it last saw.
    pub const fn affects_exit_status(self) -> bool {
        match self {
            Operation::WriteNewFile => true,
            Operation::FileMode => true,
            Operation::ReadFileContent => false,
        }
    }

    /// The command-line flag enabling this operation.
    pub const fn flag(self) -> &'static str {
        match self {
            Operation::WriteNewFile => "write_new_file",
            Operation::FileMode => "file_mode",
            Operation::ReadFileContent => "file_content",
        }
    }

    fn target(self, config: &ProbeConfig) -> Option<&Path> {
        match self {
            Operation::WriteNewFile => config.write_path(),
            Operation::FileMode => config.mode_path(),
            Operation::ReadFileContent => config.content_path(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// What happened to one operation.
#[derive(Debug)]
pub enum Outcome {
    /// No target path was configured.
    Skipped,
    /// The operation completed; `report` is the line it printed, if any.
    Succeeded { report: Option<String> },
    Failed(ProbeError),
}

#[derive(Debug)]
pub struct OperationResult {
    pub operation: Operation,
    pub outcome: Outcome,
}

impl OperationResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// Failed, and the policy table says the failure counts.
    pub fn fails_invocation(&self) -> bool {
        self.is_failure() && self.operation.affects_exit_status()
    }

    pub fn report(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Succeeded { report } => report.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match &self.outcome {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// The collected results of one probe invocation.
#[derive(Debug, Default)]
pub struct ProbeReport {
    results: Vec<OperationResult>,
}

impl ProbeReport {
    pub fn results(&self) -> &[OperationResult] {
        &self.results
    }

    pub fn get(&self, operation: Operation) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.operation == operation)
    }

    /// Every failure, whether or not it counts toward the exit status.
    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    pub fn is_success(&self) -> bool {
        !self.results.iter().any(OperationResult::fails_invocation)
    }

    /// `0` when no counted operation failed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// A configured probe. Stateless between calls to [`Probe::run`].
#[derive(Debug, Clone)]
pub struct Probe {
    config: ProbeConfig,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        Probe { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run every configured operation in [`Operation::ORDER`], printing
    /// reports and errors to `out`.
    ///
    /// Operation failures are recorded in the returned report. A failing
    /// `out` is only logged: the exit status comes from the operations.
    pub fn run(&self, out: &mut dyn Write) -> ProbeReport {
        let mut report = ProbeReport::default();
        for operation in Operation::ORDER {
            let outcome = match operation.target(&self.config) {
                None => Outcome::Skipped,
                Some(path) => self.run_operation(operation, path, out),
            };
            match &outcome {
                Outcome::Skipped | Outcome::Succeeded { report: None } => {}
                Outcome::Succeeded { report: Some(line) } => emit(out, line),
                Outcome::Failed(err) => {
                    tracing::warn!(%operation, "{err}");
                    emit(out, &err.to_string());
                }
            }
            report.results.push(OperationResult { operation, outcome });
        }
        if let Err(e) = out.flush() {
            tracing::warn!(error = %e, "failed to flush output");
        }
        report
    }

    fn run_operation(&self, operation: Operation, path: &Path, out: &mut dyn Write) -> Outcome {
        tracing::info!(%operation, path = %path.display(), "running");
        match operation {
            Operation::WriteNewFile => match write_new_file(path) {
                Ok(()) => Outcome::Succeeded { report: None },
                Err(err) => Outcome::Failed(err),
            },
            Operation::FileMode => match file_mode(path) {
                Ok(line) => Outcome::Succeeded { report: Some(line) },
                Err(err) => Outcome::Failed(err),
            },
            Operation::ReadFileContent => {
                let polled = poll_file_content(path, self.config.poll, out);
                Outcome::Succeeded {
                    report: Some(content_line(path, polled.content())),
                }
            }
        }
    }
}

fn emit(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        tracing::warn!(error = %e, "failed to write output line");
    }
}

/// Write the marker file to `path`.
pub fn write_new_file(path: &Path) -> Result<(), ProbeError> {
    fs_op::write_marker_file(path).map_err(|source| ProbeError::WriteNewFile {
        path: path.to_path_buf(),
        source,
    })
}

/// `lstat` `path` and render the `mode of file` report line.
pub fn file_mode(path: &Path) -> Result<String, ProbeError> {
    let mode = fs_op::link_mode(path).map_err(|source| ProbeError::FileMode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("mode of file {path:?}: {mode}"))
}

/// The line the e2e harness matches on. `content` is printed verbatim.
pub fn content_line(path: &Path, content: &str) -> String {
    format!("content of file {path:?}: {content}")
}
