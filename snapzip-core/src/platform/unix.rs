//! Unix implementation of the platform capability layer.

use std::fs::{self, File, Metadata, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::{FileExt, FileTypeExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use super::{DeviceNumbers, LinkInfo, Owner, Platform};

/// Capabilities backed by POSIX primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unix;

impl Platform for Unix {
    fn link_info(meta: &Metadata) -> Option<LinkInfo> {
        Some(LinkInfo {
            dev: meta.dev(),
            ino: meta.ino(),
            nlink: meta.nlink(),
        })
    }

    fn device_numbers(meta: &Metadata) -> Option<DeviceNumbers> {
        let file_type = meta.file_type();
        if !(file_type.is_char_device() || file_type.is_block_device()) {
            return None;
        }
        Some(split_device(meta.rdev()))
    }

    fn owner(meta: &Metadata) -> Option<Owner> {
        Some(Owner {
            uid: u64::from(meta.uid()),
            gid: u64::from(meta.gid()),
        })
    }

    fn mode(meta: &Metadata) -> u32 {
        meta.mode() & 0o7777
    }

    fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
        fs::set_permissions(path, Permissions::from_mode(mode & 0o7777))
    }

    fn create_new(path: &Path, mode: u32) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(mode & 0o7777)
            .open(path)
    }

    fn symlink(target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    fn read_xattr(path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        xattr::get(path, name)
    }

    fn write_xattr(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        xattr::set(path, name, value)
    }

    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        file.read_at(buf, offset)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn split_device(rdev: u64) -> DeviceNumbers {
    let major = nix::sys::stat::major(rdev);
    let minor = nix::sys::stat::minor(rdev);
    DeviceNumbers {
        major: u32::try_from(major).unwrap_or(u32::MAX),
        minor: u32::try_from(minor).unwrap_or(u32::MAX),
    }
}

// BSD-style encoding: 8 bits of major number, minor in the remaining bits.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn split_device(rdev: u64) -> DeviceNumbers {
    DeviceNumbers {
        major: ((rdev >> 8) & 0xfff) as u32,
        minor: ((rdev & 0xff) | ((rdev >> 12) & 0xfff00)) as u32,
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod xattr {
    //! Wrapper functions for the libc xattr calls.

    use std::ffi::CString;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    use nix::errno::Errno;

    /// Initial buffer size for attribute values; capability blobs are 20 bytes.
    const INITIAL_VALUE_SIZE: usize = 128;

    fn c_path(path: &Path) -> io::Result<CString> {
        Ok(CString::new(path.as_os_str().as_bytes())?)
    }

    pub(super) fn get(path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        let c_path = c_path(path)?;
        let c_name = CString::new(name)?;
        let mut value = vec![0u8; INITIAL_VALUE_SIZE];

        loop {
            // SAFETY: both strings are NUL terminated and `value` is valid for
            // `value.len()` bytes of writes.
            let res = unsafe {
                libc::lgetxattr(
                    c_path.as_ptr(),
                    c_name.as_ptr(),
                    value.as_mut_ptr().cast(),
                    value.len(),
                )
            };

            match Errno::result(res) {
                Ok(len) => {
                    value.truncate(len as usize);
                    return Ok(Some(value));
                }
                Err(Errno::ENODATA) | Err(Errno::ENOTSUP) => return Ok(None),
                Err(Errno::ERANGE) => {
                    // The value grew or exceeded the initial guess; ask for the size.
                    // SAFETY: a null buffer with size 0 only queries the length.
                    let size = unsafe {
                        libc::lgetxattr(c_path.as_ptr(), c_name.as_ptr(), std::ptr::null_mut(), 0)
                    };
                    let size = Errno::result(size)?;
                    value.resize((size as usize).max(value.len() * 2), 0);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub(super) fn set(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        let c_path = c_path(path)?;
        let c_name = CString::new(name)?;

        // SAFETY: both strings are NUL terminated and `value` is valid for
        // `value.len()` bytes of reads.
        let res = unsafe {
            libc::lsetxattr(
                c_path.as_ptr(),
                c_name.as_ptr(),
                value.as_ptr().cast(),
                value.len(),
                0,
            )
        };
        Errno::result(res)?;
        Ok(())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod xattr {
    use std::io;
    use std::path::Path;

    pub(super) fn get(_path: &Path, _name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    pub(super) fn set(_path: &Path, _name: &str, _value: &[u8]) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }
}
