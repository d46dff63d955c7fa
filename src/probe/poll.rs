use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Instant;

use crate::config::PollPolicy;
use crate::errors::ProbeError;
use crate::fs_op;

/// How a poll-and-read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A read returned non-empty content.
    Content { content: String, attempts: u32 },
    /// The budget ran out; `last_content` is whatever the last successful
    /// read returned (empty when every read failed or found nothing).
    TimedOut { last_content: String, attempts: u32 },
}

impl PollOutcome {
    pub fn content(&self) -> &str {
        match self {
            PollOutcome::Content { content, .. } => content,
            PollOutcome::TimedOut { last_content, .. } => last_content,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Content { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut { .. })
    }
}

/// Read `path` until it has content or `policy.timeout` has elapsed since
/// the call started.
///
/// Read errors are expected (the writer may not have created the file yet):
/// each one is printed to `out` and retried after `policy.interval`, same as
/// an empty read. At least one attempt is always made, and the last sleep
/// is cut short so the final attempt lands on the deadline.
///
/// Failing to write to `out` is logged and otherwise ignored.
pub fn poll_file_content(path: &Path, policy: PollPolicy, out: &mut dyn Write) -> PollOutcome {
    let start = Instant::now();
    let mut attempts = 0u32;
    let mut last_content = String::new();

    loop {
        attempts += 1;
        match fs_op::read_content(path) {
            Ok(content) if !content.is_empty() => {
                tracing::debug!(path = %path.display(), attempts, "file has content");
                return PollOutcome::Content { content, attempts };
            }
            Ok(content) => {
                tracing::trace!(path = %path.display(), attempts, "file is empty");
                last_content = content;
            }
            Err(source) => {
                let err = ProbeError::ReadFileContent {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::debug!(attempts, "{err}");
                super::emit(out, &err.to_string());
                last_content.clear();
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            tracing::warn!(
                path = %path.display(),
                attempts,
                timeout_secs = policy.timeout.as_secs(),
                "gave up waiting for file content"
            );
            return PollOutcome::TimedOut {
                last_content,
                attempts,
            };
        }
        thread::sleep(policy.interval.min(policy.timeout - elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn quick(timeout_ms: u64) -> PollPolicy {
        PollPolicy {
            timeout: Duration::from_millis(timeout_ms),
            interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn returns_immediately_when_content_present() {
        let td = tempdir().unwrap();
        let file = td.path().join("f");
        fs::write(&file, "hello\n").unwrap();

        let mut out: Vec<u8> = Vec::new();
        let outcome = poll_file_content(&file, PollPolicy::default(), &mut out);
        assert_eq!(
            outcome,
            PollOutcome::Content {
                content: "hello\n".into(),
                attempts: 1
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn missing_file_times_out_with_empty_content() {
        let td = tempdir().unwrap();
        let file = td.path().join("never");

        let mut out: Vec<u8> = Vec::new();
        let outcome = poll_file_content(&file, quick(50), &mut out);
        assert!(outcome.timed_out());
        assert_eq!(outcome.content(), "");
        assert!(outcome.attempts() >= 2);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("error reading file content for "), "{printed}");
        assert_eq!(printed.lines().count() as u32, outcome.attempts());
    }

    #[test]
    fn empty_file_is_retried_without_printing_errors() {
        let td = tempdir().unwrap();
        let file = td.path().join("empty");
        fs::write(&file, "").unwrap();

        let mut out: Vec<u8> = Vec::new();
        let outcome = poll_file_content(&file, quick(40), &mut out);
        assert!(outcome.timed_out());
        assert!(out.is_empty());
    }

    #[test]
    fn zero_timeout_still_reads_once() {
        let td = tempdir().unwrap();
        let file = td.path().join("f");
        fs::write(&file, "x").unwrap();
        let outcome = poll_file_content(&file, quick(0), &mut std::io::sink());
        assert_eq!(outcome.content(), "x");

        let missing = td.path().join("nope");
        let outcome = poll_file_content(&missing, quick(0), &mut std::io::sink());
        assert_eq!(outcome.attempts(), 1);
        assert!(outcome.timed_out());
    }

    #[test]
    fn picks_up_content_written_by_a_concurrent_writer() {
        let td = tempdir().unwrap();
        let file = td.path().join("late");
        let writer_path = file.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            fs::write(writer_path, "arrived\n").unwrap();
        });

        let outcome = poll_file_content(&file, quick(5_000), &mut std::io::sink());
        writer.join().unwrap();
        assert!(!outcome.timed_out());
        assert_eq!(outcome.content(), "arrived\n");
        assert!(outcome.attempts() > 1);
    }

    #[test]
    fn last_sleep_is_clamped_to_the_deadline() {
        let td = tempdir().unwrap();
        let policy = PollPolicy {
            timeout: Duration::from_millis(100),
            interval: Duration::from_secs(10),
        };
        let started = Instant::now();
        let outcome = poll_file_content(&td.path().join("never"), policy, &mut std::io::sink());
        assert!(outcome.timed_out());
        assert_eq!(outcome.attempts(), 2);
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
    }
}
