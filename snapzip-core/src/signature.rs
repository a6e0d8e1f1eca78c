//! Content sniffing for compressed streams, tar archives and directories.
//!
//! All checks use positioned reads, so they never move the read position of
//! the handle they inspect and can be combined freely.

use std::fs::File;

use crate::config::{STREAM_IDENTIFIER, TAR_MAGIC, TAR_MAGIC_OFFSET};
use crate::platform::read_exact_at;

/// What a file handle turned out to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// A snappy framed stream
    Compressed,
    /// A ustar archive
    Archive,
    /// A directory
    Directory,
    /// Anything else
    Data,
}

/// Returns `true` if `file` starts with the snappy stream identifier.
pub fn is_compressed(file: &File) -> bool {
    has_bytes_at(file, 0, &STREAM_IDENTIFIER)
}

/// Returns `true` if `file` carries the ustar magic at offset 257.
pub fn is_archive(file: &File) -> bool {
    has_bytes_at(file, TAR_MAGIC_OFFSET, &TAR_MAGIC)
}

/// Returns `true` if `file` is an open directory.
pub fn is_directory(file: &File) -> bool {
    file.metadata().is_ok_and(|meta| meta.is_dir())
}

/// Classifies `file`, checking for a compressed stream first.
pub fn classify(file: &File) -> Signature {
    if is_compressed(file) {
        Signature::Compressed
    } else if is_archive(file) {
        Signature::Archive
    } else if is_directory(file) {
        Signature::Directory
    } else {
        Signature::Data
    }
}

fn has_bytes_at<const N: usize>(file: &File, offset: u64, expected: &[u8; N]) -> bool {
    let mut buf = [0u8; N];
    match read_exact_at(file, &mut buf, offset) {
        Ok(read) => read == N && &buf == expected,
        Err(_) => false,
    }
}
