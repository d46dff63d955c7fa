use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

/// Default wall-clock budget for polling a file for content.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);
/// Default pause between two poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timing of the poll-and-read operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Budget measured from the start of the operation.
    pub timeout: Duration,
    /// Sleep between attempts after an empty read or a read error.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// What a single probe invocation should do. Every path is an independent
/// toggle: `None` disables the corresponding operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeConfig {
    pub write_path: Option<PathBuf>,
    pub mode_path: Option<PathBuf>,
    pub content_path: Option<PathBuf>,
    pub poll: PollPolicy,
}

impl ProbeConfig {
    pub fn with_write_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_path = non_empty(Some(path.into()));
        self
    }

    pub fn with_mode_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mode_path = non_empty(Some(path.into()));
        self
    }

    pub fn with_content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = non_empty(Some(path.into()));
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn write_path(&self) -> Option<&Path> {
        self.write_path.as_deref()
    }

    pub fn mode_path(&self) -> Option<&Path> {
        self.mode_path.as_deref()
    }

    pub fn content_path(&self) -> Option<&Path> {
        self.content_path.as_deref()
    }
}

/// An empty path means "not set", same as omitting the flag.
fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Command-line surface of the `mt-hostdir` probe.
///
/// Paths are taken as `OsString` so that an explicitly empty value
/// (`--file_mode=`) parses and simply leaves the operation disabled.
#[derive(Parser, Debug)]
#[command(
    name = "mt-hostdir",
    about = "Performs filesystem checks inside a container with a host-dir mount",
    long_about = None
)]
pub struct ProbeArgs {
    /// Path to print the filemode of
    #[arg(long = "file_mode", value_name = "PATH")]
    pub file_mode: Option<OsString>,

    /// Path to read the file content from
    #[arg(long = "file_content", value_name = "PATH")]
    pub file_content: Option<OsString>,

    /// Path to write to
    #[arg(long = "write_new_file", value_name = "PATH")]
    pub write_new_file: Option<OsString>,

    #[arg(
        long = "poll_timeout_secs",
        env = "MT_HOSTDIR_POLL_TIMEOUT_SECS",
        default_value_t = DEFAULT_POLL_TIMEOUT.as_secs(),
        hide = true
    )]
    pub poll_timeout_secs: u64,

    #[arg(
        long = "poll_interval_secs",
        env = "MT_HOSTDIR_POLL_INTERVAL_SECS",
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
        hide = true
    )]
    pub poll_interval_secs: u64,
}

impl From<ProbeArgs> for ProbeConfig {
    fn from(args: ProbeArgs) -> Self {
        ProbeConfig {
            write_path: non_empty(args.write_new_file.map(PathBuf::from)),
            mode_path: non_empty(args.file_mode.map(PathBuf::from)),
            content_path: non_empty(args.file_content.map(PathBuf::from)),
            poll: PollPolicy {
                timeout: Duration::from_secs(args.poll_timeout_secs),
                interval: Duration::from_secs(args.poll_interval_secs),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        ProbeArgs::command().debug_assert();
    }

    #[test]
    fn no_flags_disables_everything() {
        let cfg: ProbeConfig = ProbeArgs::try_parse_from(["mt-hostdir"]).unwrap().into();
        assert_eq!(cfg.write_path(), None);
        assert_eq!(cfg.mode_path(), None);
        assert_eq!(cfg.content_path(), None);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg: ProbeConfig = ProbeArgs::try_parse_from([
            "mt-hostdir",
            "--file_mode=",
            "--file_content=",
            "--write_new_file=/tmp/f",
        ])
        .unwrap()
        .into();
        assert_eq!(cfg.mode_path(), None);
        assert_eq!(cfg.content_path(), None);
        assert_eq!(cfg.write_path(), Some(Path::new("/tmp/f")));
    }

    #[test]
    fn poll_knobs_override_defaults() {
        let cfg: ProbeConfig = ProbeArgs::try_parse_from([
            "mt-hostdir",
            "--poll_timeout_secs=3",
            "--poll_interval_secs=1",
        ])
        .unwrap()
        .into();
        assert_eq!(cfg.poll.timeout, Duration::from_secs(3));
        assert_eq!(cfg.poll.interval, Duration::from_secs(1));
    }

    #[test]
    fn builder_ignores_empty_paths() {
        let cfg = ProbeConfig::default().with_mode_path("").with_content_path("/x");
        assert_eq!(cfg.mode_path(), None);
        assert_eq!(cfg.content_path(), Some(Path::new("/x")));
        assert_eq!(cfg.poll, PollPolicy::default());
    }
}
