use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the probe's filesystem operations.
///
/// Each variant carries the path the operation was aimed at so the printed
/// line is enough to diagnose the failure without the logs.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Writing the marker file failed.
    #[error("error writing new file {path:?}: {source}")]
    WriteNewFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `lstat` on the mode target failed (usually: the path does not exist).
    #[error("error from lstat({path:?}): {source}")]
    FileMode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single read attempt while polling for content failed.
    #[error("error reading file content for {path:?}: {source}")]
    ReadFileContent {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    /// The path the failed operation was aimed at.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ProbeError::WriteNewFile { path, .. }
            | ProbeError::FileMode { path, .. }
            | ProbeError::ReadFileContent { path, .. } => path,
        }
    }

    /// The `io::ErrorKind` of the underlying cause.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            ProbeError::WriteNewFile { source, .. }
            | ProbeError::FileMode { source, .. }
            | ProbeError::ReadFileContent { source, .. } => source.kind(),
        }
    }
}

/// Errors returned when verifying a host-dir scenario against a runner.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// The collaborator failed to run the pod at all.
    #[error("runner failed for pod `{pod}`: {source:#}")]
    Runner {
        pod: String,
        #[source]
        source: anyhow::Error,
    },

    /// The pod logs have no entry for the container under observation.
    #[error("no logs for container #{index} in pod `{pod}`")]
    MissingContainer { pod: String, index: usize },

    /// The observed container exited unsuccessfully.
    #[error("container `{container}` exited with status {exit_code}; output:\n{output}")]
    ContainerFailed {
        container: String,
        exit_code: i64,
        output: String,
    },

    /// An expected line never appeared in the observed container's output.
    #[error("container `{container}` output is missing {expected:?}; output:\n{output}")]
    MissingOutput {
        container: String,
        expected: String,
        output: String,
    },
}
