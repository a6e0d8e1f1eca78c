//! Unpack, pack and plain compress operations for snapzip CLI.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use snapzip_core::platform::{Native, Platform};
use snapzip_core::{archive, pipeline, signature, ProgressSink, Signature, Silent};
use tempfile::NamedTempFile;

use crate::config::{CliConfig, Operation, DEFAULT_BUFFER_SIZE};
use crate::console::Console;
use crate::error::{Error, Result};
use crate::io::{
    archive_name, compressed_name, create_output, create_temporary, decompressed_name,
    input_name, keep_temporary, open_input, packed_name, persist_output, remove_output,
    staging_dir,
};

/// Decides what to do with `input` by looking at its contents.
///
/// Compressed streams are unpacked, directories are packed and everything
/// else is compressed.
///
/// # Errors
///
/// Returns [`Error::OpenInput`] if `input` cannot be opened.
pub fn classify(input: &Path) -> Result<Operation> {
    let file = open_input(input)?;
    let operation = match signature::classify(&file) {
        Signature::Compressed => Operation::Unpack,
        Signature::Directory => Operation::Pack,
        // A bare tar archive is just data to be compressed
        Signature::Archive | Signature::Data => Operation::Compress,
    };
    Ok(operation)
}

/// Decompresses `input` into `out_dir`, extracting the result if it is an
/// archive.
///
/// # Parameters
///
/// * `input` - Snappy compressed file
/// * `out_dir` - Directory the result is created in
/// * `config` - CLI configuration
/// * `console` - Console for headlines and progress
///
/// # Returns
///
/// The extracted directory, or the decompressed file.
///
/// # Errors
///
/// Returns an error if the stream is corrupt or any output cannot be written.
/// When extraction fails, the decompressed archive is kept in `out_dir`.
pub fn unpack(
    input: &Path,
    out_dir: &Path,
    config: &CliConfig,
    console: &Console,
) -> Result<PathBuf> {
    let file = open_input(input)?;
    let meta = file.metadata().map_err(|source| Error::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    let target = decompressed_name(&input_name(input)?);

    let temp = create_temporary(out_dir, ".tar")?;
    console.headline(input, &out_dir.join(&target));
    {
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp.as_file());
        let summary = with_progress(config, console, |progress| {
            pipeline::decompress(reader, writer, meta.len(), progress)
        })
        .map_err(|source| core_error(input, source))?;
        log::debug!(
            "{}: {} bytes decompressed to {} bytes",
            input.display(),
            summary.bytes_read,
            summary.bytes_written
        );
    }
    console.done();

    if !signature::is_archive(temp.as_file()) {
        let output = persist_output(temp, &out_dir.join(&target), Native::mode(&meta))?;
        log::info!("{}: decompressed to {}", input.display(), output.display());
        return Ok(output);
    }

    let stem = target
        .strip_suffix(".tar")
        .filter(|stem| !stem.is_empty())
        .unwrap_or(&target);
    let plan = match archive::plan_unpack_as(temp.path(), out_dir, stem) {
        Ok(plan) => plan,
        Err(source) => {
            keep(temp);
            return Err(core_error(input, source));
        }
    };
    console.headline(&out_dir.join(&target), &plan.root);
    let extracted = with_progress(config, console, |progress| {
        archive::unpack_planned(temp.path(), &plan, progress)
    });
    console.done();

    match extracted {
        Ok(summary) => {
            log::info!(
                "{}: extracted {} entries to {}",
                input.display(),
                summary.entries,
                summary.root.display()
            );
            Ok(summary.root)
        }
        Err(source) => {
            keep(temp);
            Err(core_error(input, source))
        }
    }
}

/// Archives the directory `input` and compresses the archive into `out_dir`.
///
/// # Returns
///
/// The path of the new `<name>.tar.sz` file.
///
/// # Errors
///
/// Returns an error if the tree cannot be archived or the output cannot be
/// written. The intermediate archive is kept when compressing it fails.
pub fn pack(
    input: &Path,
    out_dir: &Path,
    config: &CliConfig,
    console: &Console,
) -> Result<PathBuf> {
    let meta = open_input(input)?
        .metadata()
        .map_err(|source| Error::OpenInput {
            path: input.to_path_buf(),
            source,
        })?;
    let name = input_name(input)?;
    let tar_name = archive_name(&name);

    let temp = create_temporary(&staging_dir(input, out_dir)?, ".tar")?;
    console.headline(input, &out_dir.join(&tar_name));
    {
        let writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp.as_file());
        let summary = with_progress(config, console, |progress| {
            archive::write_archive(input, writer, progress)
        })
        .map_err(|source| core_error(input, source))?;
        log::debug!(
            "{}: archived {} entries ({} hardlinks, {} skipped)",
            input.display(),
            summary.entries,
            summary.hardlinks,
            summary.skipped
        );
    }
    console.done();

    // Search bits of the directory do not carry over
    let mode = Native::mode(&meta) & !0o111;
    let shown = out_dir.join(&tar_name);
    let desired = out_dir.join(packed_name(&name));
    match compress_into(temp.path(), &shown, &desired, mode, config, console) {
        Ok(output) => {
            log::info!("{}: packed to {}", input.display(), output.display());
            Ok(output)
        }
        Err(err) => {
            keep(temp);
            Err(err)
        }
    }
}

/// Compresses the regular file `input` into `<name>.sz` in `out_dir`.
///
/// # Returns
///
/// The path of the compressed file.
///
/// # Errors
///
/// Returns an error if `input` cannot be read or the output cannot be
/// written. A partially written output is removed.
pub fn compress_plain(
    input: &Path,
    out_dir: &Path,
    config: &CliConfig,
    console: &Console,
) -> Result<PathBuf> {
    let meta = open_input(input)?
        .metadata()
        .map_err(|source| Error::OpenInput {
            path: input.to_path_buf(),
            source,
        })?;
    let desired = out_dir.join(compressed_name(&input_name(input)?));
    let output = compress_into(input, input, &desired, Native::mode(&meta), config, console)?;
    log::info!("{}: compressed to {}", input.display(), output.display());
    Ok(output)
}

/// Compresses `source` into the first free variant of `desired`.
///
/// `shown` is the name printed in the headline.
fn compress_into(
    source: &Path,
    shown: &Path,
    desired: &Path,
    mode: u32,
    config: &CliConfig,
    console: &Console,
) -> Result<PathBuf> {
    let input = open_input(source)?;
    let expected = input
        .metadata()
        .map_err(|source_err| Error::OpenInput {
            path: source.to_path_buf(),
            source: source_err,
        })?
        .len();
    let (output_path, output) = create_output(desired, mode)?;

    console.headline(shown, &output_path);
    let result = write_compressed(input, output, expected, config, console);
    console.done();

    match result {
        Ok(()) => Ok(output_path),
        Err(source) => {
            if let Err(err) = remove_output(&output_path) {
                log::warn!("{err}");
            }
            Err(core_error(shown, source))
        }
    }
}

fn write_compressed(
    input: File,
    output: File,
    expected: u64,
    config: &CliConfig,
    console: &Console,
) -> snapzip_core::Result<()> {
    let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, input);
    let writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, output);
    let summary = with_progress(config, console, |progress| {
        pipeline::compress(reader, writer, expected, progress)
    })?;
    log::debug!(
        "{} bytes compressed to {} bytes ({:.1}% saved)",
        summary.bytes_read,
        summary.bytes_written,
        summary.space_saved_percent()
    );
    Ok(())
}

fn keep(temp: NamedTempFile) {
    if let Err(err) = keep_temporary(temp) {
        log::warn!("{err}");
    }
}

/// Runs `f` with the console's progress sink, or a silent one.
fn with_progress<T>(
    config: &CliConfig,
    console: &Console,
    f: impl FnOnce(&mut dyn ProgressSink) -> T,
) -> T {
    match console.progress(config.shows_progress()) {
        Some(mut sink) => f(&mut sink),
        None => f(&mut Silent),
    }
}

fn core_error(path: &Path, source: snapzip_core::Error) -> Error {
    Error::Core {
        path: path.to_path_buf(),
        source,
    }
}
