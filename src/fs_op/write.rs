use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Literal content of the marker file.
pub const MARKER_CONTENT: &str = "hostdir-mount-tester new file\n";

/// Permission bits the marker file is created with (before umask).
pub const MARKER_MODE: u32 = 0o644;

/// Write `data` to `path`, creating the file with `mode` or truncating it if
/// it already exists.
///
/// The write happens in place (no temp file + rename), so an existing file
/// keeps its inode. The parent directory is *not* created: a missing parent
/// is reported as an error.
pub fn write_truncate(path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts.open(path)?;
    file.write_all(data)?;
    file.flush()
}

/// Write the fixed marker content to `path`.
pub fn write_marker_file(path: &Path) -> io::Result<()> {
    write_truncate(path, MARKER_CONTENT.as_bytes(), MARKER_MODE)
}
