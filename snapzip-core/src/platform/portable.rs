//! Fallback implementation for targets without POSIX file metadata.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::{DeviceNumbers, LinkInfo, Owner, Platform};

/// Capabilities available through the standard library alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Portable;

impl Platform for Portable {
    fn link_info(_meta: &Metadata) -> Option<LinkInfo> {
        None
    }

    fn device_numbers(_meta: &Metadata) -> Option<DeviceNumbers> {
        None
    }

    fn owner(_meta: &Metadata) -> Option<Owner> {
        None
    }

    fn mode(meta: &Metadata) -> u32 {
        match (meta.is_dir(), meta.permissions().readonly()) {
            (true, false) => 0o755,
            (true, true) => 0o555,
            (false, false) => 0o644,
            (false, true) => 0o444,
        }
    }

    fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_readonly(mode & 0o222 == 0);
        fs::set_permissions(path, permissions)
    }

    fn create_new(path: &Path, mode: u32) -> io::Result<File> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        if mode & 0o222 == 0 {
            Self::set_mode(path, mode)?;
        }
        Ok(file)
    }

    #[cfg(windows)]
    fn symlink(target: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_file(target, link)
    }

    #[cfg(not(windows))]
    fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn read_xattr(_path: &Path, _name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn write_xattr(_path: &Path, _name: &str, _value: &[u8]) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut handle = file;
        let position = handle.stream_position()?;
        handle.seek(SeekFrom::Start(offset))?;
        let read = handle.read(buf);
        handle.seek(SeekFrom::Start(position))?;
        read
    }
}
