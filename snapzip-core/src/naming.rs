//! Collision-free destination names.
//!
//! Nothing snapzip produces ever replaces an existing filesystem object.
//! When the desired destination is taken, a parenthesized counter is inserted
//! before the extension: `notes.txt` becomes `notes(1).txt`, `docs.tar.sz`
//! becomes `docs(1).tar.sz`.

use std::path::{Path, PathBuf};

/// Extensions treated as a single unit when inserting the counter.
const COMPOUND_EXTENSIONS: &[&str] = &[".tar.sz"];

/// Upper bound for the counter before giving up and returning the last candidate.
const MAX_ATTEMPTS: u32 = 1_000_000;

/// Returns `desired` if nothing exists there, otherwise the first free
/// `base(N)ext` sibling.
///
/// Dangling symlinks count as existing.
pub fn unused_path(desired: &Path) -> PathBuf {
    if !exists(desired) {
        return desired.to_path_buf();
    }

    let file_name = desired
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, ext) = split_extension(&file_name);

    let mut candidate = desired.to_path_buf();
    for counter in 1..=MAX_ATTEMPTS {
        candidate.set_file_name(format!("{base}({counter}){ext}"));
        if !exists(&candidate) {
            break;
        }
    }
    candidate
}

/// Splits a file name into base and extension, keeping compound extensions together.
///
/// Leading dots of hidden files are part of the base.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    for compound in COMPOUND_EXTENSIONS {
        if let Some(base) = file_name.strip_suffix(compound) {
            if !base.is_empty() {
                return (base, &file_name[base.len()..]);
            }
        }
    }

    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(dot) => file_name.split_at(dot),
    }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
