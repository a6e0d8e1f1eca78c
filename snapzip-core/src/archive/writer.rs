//! Directory to tar stream conversion.

use std::collections::hash_map::{Entry as Slot, HashMap};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use log::{debug, warn};
use tar::{Builder, EntryType, Header};

use super::{ArchiveSummary, HeaderKind};
use crate::config::{ARCHIVE_PROGRESS_INTERVAL, CAPABILITY_XATTR, PAX_XATTR_PREFIX};
use crate::error::{Error, Result};
use crate::platform::{LinkInfo, Native, Platform};
use crate::progress::{Progress, ProgressSink, Throttle};
use crate::walk::{self, DeviceKind, Entry, EntryKind};

/// First archive path seen for every multiply-linked inode.
///
/// Lives for a single [`write_archive`] call.
#[derive(Debug, Default)]
pub struct InodeTable {
    seen: HashMap<(u64, u64), String>,
}

impl InodeTable {
    /// Claims the inode of `info` for `path`.
    ///
    /// # Returns
    ///
    /// `None` if this is the first occurrence (the inode is now recorded for
    /// `path`), otherwise the path that claimed it first.
    pub fn claim(&mut self, info: &LinkInfo, path: &str) -> Option<&str> {
        match self.seen.entry((info.dev, info.ino)) {
            Slot::Occupied(first) => Some(first.into_mut().as_str()),
            Slot::Vacant(slot) => {
                slot.insert(path.to_owned());
                None
            }
        }
    }

    /// Number of recorded inodes.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` if no inode has been recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Writes `root` and everything below it as a tar stream to `sink`.
///
/// # Parameters
///
/// * `root` - Directory (or file) to archive; its own name becomes the top-level entry
/// * `sink` - Destination of the tar stream
/// * `progress` - Receives entry-count progress lines
///
/// # Returns
///
/// An [`ArchiveSummary`] with entry and byte counts.
///
/// # Errors
///
/// Any walk, read or write failure aborts the archive. The partially written
/// stream is left in `sink`.
pub fn write_archive<W: Write>(
    root: &Path,
    sink: W,
    progress: &mut dyn ProgressSink,
) -> Result<ArchiveSummary> {
    let mut state = Progress::new(
        walk::count_entries(root),
        Throttle::Interval(ARCHIVE_PROGRESS_INTERVAL),
    );
    let mut builder = Builder::new(sink);
    let mut inodes = InodeTable::default();
    let mut summary = ArchiveSummary::default();

    for entry in walk::walk(root)? {
        let entry = entry?;
        let capability = read_capability(&entry.source);
        append_entry(
            &mut builder,
            &entry,
            capability.as_deref(),
            &mut inodes,
            &mut summary,
        )?;
        if state.advance(1) {
            progress.update(&state.entries_line());
        }
    }

    let mut sink = builder.into_inner()?;
    sink.flush()?;

    state.complete();
    progress.update(&state.entries_line());
    progress.finish();

    Ok(summary)
}

/// Appends one walked entry, preceded by a PAX record carrying `capability`
/// when it is set.
fn append_entry<W: Write>(
    builder: &mut Builder<W>,
    entry: &Entry,
    capability: Option<&[u8]>,
    inodes: &mut InodeTable,
    summary: &mut ArchiveSummary,
) -> Result<()> {
    if entry.kind == EntryKind::Other {
        warn!(
            "{}: cannot store this file type in an archive, skipping",
            entry.source.display()
        );
        summary.skipped += 1;
        return Ok(());
    }

    let name = entry.archive_name();
    let fs_err = |source: io::Error| Error::fs(&entry.source, source);

    let mut kind = header_kind(entry.kind);
    let mut link_target = None;
    match entry.kind {
        EntryKind::Symlink => {
            link_target = Some(fs::read_link(&entry.source).map_err(fs_err)?);
        }
        EntryKind::Regular => {
            if let Some(info) = entry.link_info.filter(LinkInfo::has_hardlinks) {
                if let Some(first) = inodes.claim(&info, &name) {
                    kind = HeaderKind::Hardlink;
                    link_target = Some(first.into());
                }
            }
        }
        _ => {}
    }

    let mut header = base_header(entry)?;
    if kind == HeaderKind::Hardlink {
        header.set_entry_type(EntryType::Link);
        header.set_size(0);
    }

    if let Some(capability) = capability {
        let key = format!("{PAX_XATTR_PREFIX}{CAPABILITY_XATTR}");
        builder.append_pax_extensions([(key.as_str(), capability)])?;
    }

    debug!("archiving {name} ({kind:?})");
    match (kind, link_target) {
        (HeaderKind::Symlink | HeaderKind::Hardlink, Some(target)) => {
            builder.append_link(&mut header, &name, &target)?;
            if kind == HeaderKind::Hardlink {
                summary.hardlinks += 1;
            }
        }
        (HeaderKind::Regular, _) => {
            let file = File::open(&entry.source).map_err(fs_err)?;
            builder
                .append_data(&mut header, &name, file.take(entry.size))
                .map_err(fs_err)?;
            summary.bytes += entry.size;
        }
        _ => builder.append_data(&mut header, &name, io::empty())?,
    }
    summary.entries += 1;

    Ok(())
}

fn header_kind(kind: EntryKind) -> HeaderKind {
    match kind {
        EntryKind::Regular => HeaderKind::Regular,
        EntryKind::Directory => HeaderKind::Directory,
        EntryKind::Symlink => HeaderKind::Symlink,
        EntryKind::Device(_) => HeaderKind::Device,
        EntryKind::Other => HeaderKind::Other,
    }
}

fn base_header(entry: &Entry) -> Result<Header> {
    let mut header = Header::new_ustar();
    header.set_mode(entry.mode);
    header.set_mtime(entry.mtime);
    header.set_size(entry.size);
    if let Some(owner) = entry.owner {
        header.set_uid(owner.uid);
        header.set_gid(owner.gid);
    }

    let entry_type = match entry.kind {
        EntryKind::Regular => EntryType::Regular,
        EntryKind::Directory => EntryType::Directory,
        EntryKind::Symlink => EntryType::Symlink,
        EntryKind::Device(DeviceKind::Char) => EntryType::Char,
        EntryKind::Device(DeviceKind::Block) => EntryType::Block,
        EntryKind::Device(DeviceKind::Fifo) => EntryType::Fifo,
        EntryKind::Other => EntryType::new(0),
    };
    header.set_entry_type(entry_type);

    if let Some(device) = entry.device {
        header.set_device_major(device.major)?;
        header.set_device_minor(device.minor)?;
    }

    Ok(header)
}

fn read_capability(path: &Path) -> Option<Vec<u8>> {
    match Native::read_xattr(path, CAPABILITY_XATTR) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "{}: cannot read {CAPABILITY_XATTR}: {err}",
                path.display()
            );
            None
        }
    }
}
