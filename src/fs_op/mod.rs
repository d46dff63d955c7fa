//! Filesystem primitives the probe is built from.
//!
//! Each helper is a thin wrapper over a single system call and returns
//! `io::Result` so the caller decides how a failure is reported.

pub mod mode;
pub mod write;

pub use mode::{format_unix_mode, link_mode, EntryKind, LinkMode};
pub use write::{write_marker_file, write_truncate, MARKER_CONTENT, MARKER_MODE};

use std::path::Path;

/// Read the whole content of `path` as text. Invalid UTF-8 is replaced
/// rather than rejected; the probe only ever prints what it reads.
pub fn read_content(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
