//! File I/O operations and path manipulation for snapzip CLI.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use snapzip_core::naming::unused_path;
use snapzip_core::platform::{Native, Platform};
use tempfile::NamedTempFile;

use crate::config::{CliConfig, SZ_EXTENSION, TAR_EXTENSION, TEMP_PREFIX};
use crate::error::{Error, Result};

/// Opens an input file for reading.
///
/// # Errors
///
/// Returns [`Error::OpenInput`] if the file cannot be opened.
pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::OpenInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns the directory outputs for `input` are written to.
///
/// This is the configured output directory, or the directory containing
/// `input` otherwise. Inputs without a final component (`.`, `docs/..`) are
/// resolved first, so their outputs land next to the directory they name.
///
/// # Errors
///
/// Returns [`Error::OpenInput`] if such an input cannot be canonicalized.
pub fn output_dir(input: &Path, config: &CliConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.output_dir {
        return Ok(dir.clone());
    }
    if input.file_name().is_none() {
        let canonical = canonical_input(input)?;
        return Ok(canonical
            .parent()
            .map_or_else(|| canonical.clone(), Path::to_path_buf));
    }
    Ok(match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    })
}

/// Returns the directory the intermediate archive of `input` is built in.
///
/// That is `out_dir`, unless `out_dir` lies inside the directory being
/// archived; the archive would then contain itself, so the parent of `input`
/// is used instead.
///
/// # Errors
///
/// Returns [`Error::OpenInput`] if `input` cannot be canonicalized, and
/// [`Error::CreateOutput`] if `out_dir` cannot.
pub fn staging_dir(input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let input = canonical_input(input)?;
    let out = fs::canonicalize(out_dir).map_err(|source| Error::CreateOutput {
        path: out_dir.to_path_buf(),
        source,
    })?;
    if !out.starts_with(&input) {
        return Ok(out_dir.to_path_buf());
    }
    input.parent().map(Path::to_path_buf).ok_or_else(|| Error::OpenInput {
        path: input.clone(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"),
    })
}

/// Returns the final name component of `input`.
///
/// Paths like `.` or `docs/..` are canonicalized first.
///
/// # Errors
///
/// Returns [`Error::OpenInput`] if the path cannot be canonicalized, or if it
/// names the filesystem root.
pub fn input_name(input: &Path) -> Result<String> {
    if let Some(name) = input.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    canonical_input(input)?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::OpenInput {
            path: input.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })
}

fn canonical_input(input: &Path) -> Result<PathBuf> {
    fs::canonicalize(input).map_err(|source| Error::OpenInput {
        path: input.to_path_buf(),
        source,
    })
}

/// Name of the compressed output for a file: `<name>.sz`.
pub fn compressed_name(name: &str) -> String {
    format!("{name}.{SZ_EXTENSION}")
}

/// Name of the compressed archive for a directory: `<name>.tar.sz`.
pub fn packed_name(name: &str) -> String {
    format!("{name}.{TAR_EXTENSION}.{SZ_EXTENSION}")
}

/// Name of the intermediate archive for a directory: `<name>.tar`.
pub fn archive_name(name: &str) -> String {
    format!("{name}.{TAR_EXTENSION}")
}

/// Name of the decompressed output: the input name without its `.sz` suffix.
///
/// Inputs without the suffix keep their name; collision avoidance picks a
/// free variant later.
pub fn decompressed_name(name: &str) -> String {
    let suffix = format!(".{SZ_EXTENSION}");
    match name.strip_suffix(&suffix) {
        Some(stem) if !stem.is_empty() => stem.to_owned(),
        _ => name.to_owned(),
    }
}

/// Creates a new output file at the first free variant of `desired`.
///
/// # Parameters
///
/// * `desired` - Preferred output path
/// * `mode` - Permission bits for the new file
///
/// # Returns
///
/// The path actually used and the open file.
///
/// # Errors
///
/// Returns [`Error::CreateOutput`] if the file cannot be created.
pub fn create_output(desired: &Path, mode: u32) -> Result<(PathBuf, File)> {
    loop {
        let path = unused_path(desired);
        match Native::create_new(&path, mode) {
            Ok(file) => {
                // Creation is subject to the umask
                Native::set_mode(&path, mode).map_err(|source| Error::CreateOutput {
                    path: path.clone(),
                    source,
                })?;
                return Ok((path, file));
            }
            // Someone else took the name in between
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(source) => return Err(Error::CreateOutput { path, source }),
        }
    }
}

/// Creates an intermediate file in `dir`, deleted again when dropped.
///
/// # Errors
///
/// Returns [`Error::CreateOutput`] if the file cannot be created.
pub fn create_temporary(dir: &Path, suffix: &str) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(|source| Error::CreateOutput {
            path: dir.to_path_buf(),
            source,
        })
}

/// Moves an intermediate file to the first free variant of `desired`.
///
/// # Returns
///
/// The path the file now lives at.
///
/// # Errors
///
/// Returns [`Error::CreateOutput`] if the file cannot be moved.
pub fn persist_output(mut temp: NamedTempFile, desired: &Path, mode: u32) -> Result<PathBuf> {
    loop {
        let path = unused_path(desired);
        match temp.persist_noclobber(&path) {
            Ok(_) => {
                Native::set_mode(&path, mode).map_err(|source| Error::CreateOutput {
                    path: path.clone(),
                    source,
                })?;
                return Ok(path);
            }
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => temp = err.file,
            Err(err) => {
                return Err(Error::CreateOutput {
                    path,
                    source: err.error,
                })
            }
        }
    }
}

/// Keeps an intermediate file on disk after a failure and logs where it is.
///
/// # Errors
///
/// Returns [`Error::KeepTemporary`] if the file cannot be kept.
pub fn keep_temporary(temp: NamedTempFile) -> Result<PathBuf> {
    let path = temp.path().to_path_buf();
    let (_, kept) = temp.keep().map_err(|err| Error::KeepTemporary {
        path,
        source: err.error,
    })?;
    log::warn!("keeping intermediate file {}", kept.display());
    Ok(kept)
}

/// Removes a partially written output.
///
/// # Errors
///
/// Returns [`Error::RemoveFile`] if the file cannot be removed.
pub fn remove_output(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|source| Error::RemoveFile {
        path: path.to_path_buf(),
        source,
    })
}
