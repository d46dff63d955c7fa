//! Link-mode inspection: `lstat` a path and render its type and permission
//! bits the way `ls -l` does.

use std::fs::{self, FileType, Metadata};
use std::io;
use std::path::Path;

/// Lightweight classification of what an `lstat` found at a path.
///
/// Symlinks are never followed, so a link (broken or not) is always
/// `Symlink` rather than the kind of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    /// Anything the platform reports that we cannot name.
    Unknown,
}

impl EntryKind {
    pub fn of(ft: FileType) -> Self {
        if ft.is_symlink() {
            return EntryKind::Symlink;
        }
        if ft.is_dir() {
            return EntryKind::Directory;
        }
        if ft.is_file() {
            return EntryKind::File;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return EntryKind::BlockDevice;
            }
            if ft.is_char_device() {
                return EntryKind::CharDevice;
            }
            if ft.is_fifo() {
                return EntryKind::Fifo;
            }
            if ft.is_socket() {
                return EntryKind::Socket;
            }
        }
        EntryKind::Unknown
    }

    /// The leading character `ls -l` prints for this kind.
    pub fn type_char(self) -> char {
        match self {
            EntryKind::File => '-',
            EntryKind::Directory => 'd',
            EntryKind::Symlink => 'l',
            EntryKind::BlockDevice => 'b',
            EntryKind::CharDevice => 'c',
            EntryKind::Fifo => 'p',
            EntryKind::Socket => 's',
            EntryKind::Unknown => '?',
        }
    }
}

/// Type and permission bits of a path, resolved without dereferencing a
/// terminal symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkMode {
    pub kind: EntryKind,
    /// Permission bits including setuid/setgid/sticky (`mode & 0o7777`).
    pub perm: u32,
}

impl LinkMode {
    pub fn from_metadata(meta: &Metadata) -> Self {
        LinkMode {
            kind: EntryKind::of(meta.file_type()),
            perm: permission_bits(meta),
        }
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.type_char(), format_unix_mode(self.perm))
    }
}

#[cfg(unix)]
fn permission_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

/// `lstat` `path` and return its link-mode.
pub fn link_mode(path: &Path) -> io::Result<LinkMode> {
    let meta = fs::symlink_metadata(path)?;
    Ok(LinkMode::from_metadata(&meta))
}

/// Render the nine `rwx` permission characters for `mode`.
///
/// Setuid/setgid replace the owner/group execute slot with `s` (`S` when
/// the execute bit is clear); sticky does the same for other with `t`/`T`.
pub fn format_unix_mode(mode: u32) -> String {
    let triplet = |shift: u32, special: bool, special_char: char| {
        let bits = (mode >> shift) & 0o7;
        let r = if bits & 0o4 != 0 { 'r' } else { '-' };
        let w = if bits & 0o2 != 0 { 'w' } else { '-' };
        let exec = bits & 0o1 != 0;
        let x = match (special, exec) {
            (true, true) => special_char,
            (true, false) => special_char.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        };
        [r, w, x]
    };

    let mut out = String::with_capacity(9);
    out.extend(triplet(6, mode & 0o4000 != 0, 's'));
    out.extend(triplet(3, mode & 0o2000 != 0, 's'));
    out.extend(triplet(0, mode & 0o1000 != 0, 't'));
    out
}
