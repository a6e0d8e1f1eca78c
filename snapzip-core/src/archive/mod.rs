//! Tar packing and extraction.
//!
//! The writer turns a directory walk into a ustar stream, deduplicating
//! hardlinks and carrying the capability attribute as a PAX record. The reader
//! finds an archive's top-level directory and materializes its entries below a
//! destination root without overwriting anything.

use std::path::PathBuf;

use tar::EntryType;

pub mod reader;
pub mod writer;

pub use reader::{
    extract, find_top_dir, plan_unpack, plan_unpack_as, unpack, unpack_planned, UnpackPlan,
};
pub use writer::{write_archive, InodeTable};

/// Kind tag of a tar header, as far as snapzip distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// File with payload
    Regular,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Hardlink to an earlier entry
    Hardlink,
    /// Character device, block device or fifo
    Device,
    /// Anything else
    Other,
}

impl From<EntryType> for HeaderKind {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Regular | EntryType::Continuous => HeaderKind::Regular,
            EntryType::Directory => HeaderKind::Directory,
            EntryType::Symlink => HeaderKind::Symlink,
            EntryType::Link => HeaderKind::Hardlink,
            EntryType::Char | EntryType::Block | EntryType::Fifo => HeaderKind::Device,
            _ => HeaderKind::Other,
        }
    }
}

/// Counts of one [`write_archive`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Headers written
    pub entries: u64,
    /// Payload bytes written, excluding headers and padding
    pub bytes: u64,
    /// Entries stored as hardlinks to an earlier entry
    pub hardlinks: u64,
    /// Entries that could not be represented
    pub skipped: u64,
}

/// Outcome of one [`extract`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Directory (or file) the top-level entry was extracted to
    pub root: PathBuf,
    /// Entries materialized on disk
    pub entries: u64,
    /// Payload bytes written
    pub bytes: u64,
    /// Entries skipped because of unsafe names or unsupported kinds
    pub skipped: u64,
}
