//! Platform capability layer.
//!
//! Inode identity, device numbers, ownership, permission bits, extended
//! attributes and positioned reads only exist on some systems. They are
//! exposed through the [`Platform`] trait, implemented once for Unix-like
//! systems and once as a portable fallback where the primitives degrade to
//! "feature absent". The implementation is selected at build time and
//! re-exported as [`Native`].

use std::fs::{File, Metadata};
use std::io;
use std::path::Path;

#[cfg(not(unix))]
mod portable;
#[cfg(unix)]
mod unix;

#[cfg(not(unix))]
pub use portable::Portable as Native;
#[cfg(unix)]
pub use unix::Unix as Native;

/// Identity of a file's inode together with its link count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkInfo {
    /// Device the inode lives on
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// Number of hardlinks pointing at the inode
    pub nlink: u64,
}

impl LinkInfo {
    /// Returns `true` if more than one directory entry refers to the inode.
    pub fn has_hardlinks(&self) -> bool {
        self.nlink > 1
    }
}

/// Major/minor numbers of a character or block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNumbers {
    /// Device major number
    pub major: u32,
    /// Device minor number
    pub minor: u32,
}

/// Numeric owner of a filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// User id
    pub uid: u64,
    /// Group id
    pub gid: u64,
}

/// Filesystem primitives whose availability depends on the target platform.
pub trait Platform {
    /// Returns the inode identity of `meta`, or `None` without inode semantics.
    fn link_info(meta: &Metadata) -> Option<LinkInfo>;

    /// Returns device numbers for character and block devices.
    fn device_numbers(meta: &Metadata) -> Option<DeviceNumbers>;

    /// Returns the numeric owner of `meta`.
    fn owner(meta: &Metadata) -> Option<Owner>;

    /// Returns the permission bits of `meta` (including setuid/setgid/sticky).
    fn mode(meta: &Metadata) -> u32;

    /// Applies permission bits to `path`.
    fn set_mode(path: &Path, mode: u32) -> io::Result<()>;

    /// Creates a new file at `path` with the given permission bits.
    ///
    /// Fails if `path` already exists.
    fn create_new(path: &Path, mode: u32) -> io::Result<File>;

    /// Creates a symbolic link at `link` pointing to `target`.
    fn symlink(target: &Path, link: &Path) -> io::Result<()>;

    /// Reads the extended attribute `name` of `path` without following symlinks.
    ///
    /// Returns `Ok(None)` if the attribute is not set or the platform has no
    /// extended attributes.
    fn read_xattr(path: &Path, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Sets the extended attribute `name` of `path` without following symlinks.
    fn write_xattr(path: &Path, name: &str, value: &[u8]) -> io::Result<()>;

    /// Reads into `buf` starting at `offset` without moving the file position.
    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

/// Fills `buf` from `offset` using positioned reads.
///
/// Returns the number of bytes read, which is less than `buf.len()` only at
/// end of file.
pub fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match Native::read_at(file, &mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
