//! Deterministic directory traversal.
//!
//! [`walk`] yields the root first and then its contents, parents before
//! children and siblings sorted by file name. Symlinks are reported, never
//! followed. Entry names are relative to the root's parent and always use `/`
//! as separator, so walking `/home/me/docs` produces `docs`, `docs/a.txt`, ...

use std::fs::{self, FileType, Metadata};
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::platform::{DeviceNumbers, LinkInfo, Native, Owner, Platform};

/// Kind of a special file that carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Character device
    Char,
    /// Block device
    Block,
    /// Named pipe
    Fifo,
}

/// Type of a filesystem object as seen by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    Regular,
    /// Directory
    Directory,
    /// Symbolic link (not followed)
    Symlink,
    /// Device node or fifo
    Device(DeviceKind),
    /// Anything else, e.g. a socket
    Other,
}

/// One filesystem object observed during a walk.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Name relative to the root's parent, `/` separated
    pub path: String,
    /// Location on disk
    pub source: PathBuf,
    /// Object type
    pub kind: EntryKind,
    /// Payload size; zero for anything but regular files
    pub size: u64,
    /// Permission bits
    pub mode: u32,
    /// Modification time in seconds since the epoch
    pub mtime: u64,
    /// Numeric owner, where the platform has one
    pub owner: Option<Owner>,
    /// Inode identity, where the platform has one
    pub link_info: Option<LinkInfo>,
    /// Major/minor numbers of character and block devices
    pub device: Option<DeviceNumbers>,
}

impl Entry {
    /// Name to store in an archive header; directories end in `/`.
    pub fn archive_name(&self) -> String {
        if self.kind == EntryKind::Directory {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }

    fn from_metadata(path: String, source: PathBuf, meta: &Metadata) -> Self {
        let kind = kind_of(meta.file_type());
        let mtime = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |elapsed| elapsed.as_secs());

        Self {
            path,
            source,
            kind,
            size: if kind == EntryKind::Regular { meta.len() } else { 0 },
            mode: Native::mode(meta),
            mtime,
            owner: Native::owner(meta),
            link_info: Native::link_info(meta),
            device: Native::device_numbers(meta),
        }
    }
}

/// Lazy iterator over the entries below a root.
///
/// Any read failure ends the walk: the error is yielded once and nothing
/// follows it.
pub struct Walker {
    base: PathBuf,
    inner: walkdir::IntoIter,
    failed: bool,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker").field("base", &self.base).finish_non_exhaustive()
    }
}

impl Iterator for Walker {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.inner.next()? {
            Ok(entry) => self.convert(&entry),
            Err(err) => Err(err.into()),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

impl Walker {
    fn convert(&self, entry: &DirEntry) -> Result<Entry> {
        let source = entry.path();
        let meta = entry.metadata()?;
        let relative = source.strip_prefix(&self.base).unwrap_or(source);
        let name = archive_path(relative)?;
        Ok(Entry::from_metadata(name, source.to_path_buf(), &meta))
    }
}

/// Starts a walk at `root`.
///
/// # Parameters
///
/// * `root` - Directory (or single file) to enumerate
///
/// # Returns
///
/// A [`Walker`] yielding `root` itself first.
///
/// # Errors
///
/// Returns [`Error::Fs`] if a root without a final component (`.`, `..`)
/// cannot be canonicalized, and [`Error::InvalidPath`] for the filesystem root.
pub fn walk(root: &Path) -> Result<Walker> {
    let root = resolve_root(root)?;
    let base = root.parent().map(Path::to_path_buf).unwrap_or_default();
    let inner = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();
    Ok(Walker {
        base,
        inner,
        failed: false,
    })
}

/// Counts the entries below `root`, including `root` itself.
///
/// Unreadable subtrees are not counted; the result only feeds progress totals.
pub fn count_entries(root: &Path) -> u64 {
    let count = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .count();
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    if root.file_name().is_some() {
        return Ok(root.to_path_buf());
    }
    let canonical = fs::canonicalize(root).map_err(|source| Error::fs(root, source))?;
    if canonical.file_name().is_none() {
        return Err(Error::InvalidPath {
            path: root.to_path_buf(),
            reason: "the filesystem root cannot be archived",
        });
    }
    Ok(canonical)
}

fn archive_path(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| Error::InvalidPath {
                    path: relative.to_path_buf(),
                    reason: "name is not valid UTF-8",
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(Error::InvalidPath {
                    path: relative.to_path_buf(),
                    reason: "name escapes the archive root",
                })
            }
        }
    }
    Ok(parts.join("/"))
}

fn kind_of(file_type: FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::Regular
    } else if file_type.is_symlink() {
        EntryKind::Symlink
    } else {
        special_kind(file_type)
    }
}

#[cfg(unix)]
fn special_kind(file_type: FileType) -> EntryKind {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_char_device() {
        EntryKind::Device(DeviceKind::Char)
    } else if file_type.is_block_device() {
        EntryKind::Device(DeviceKind::Block)
    } else if file_type.is_fifo() {
        EntryKind::Device(DeviceKind::Fifo)
    } else {
        EntryKind::Other
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: FileType) -> EntryKind {
    EntryKind::Other
}
