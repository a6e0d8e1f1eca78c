//! High-level file processing and CLI orchestration.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::{CliConfig, Operation};
use crate::console::Console;
use crate::error::{Error, InvocationError, Result};
use crate::io::output_dir;
use crate::operations::{classify, compress_plain, pack, unpack};

/// Processes a single input according to its contents.
///
/// This is the main entry point for file processing operations:
///
/// 1. Classifies the input (compressed stream, directory, anything else)
/// 2. Picks the output directory
/// 3. Unpacks, packs or compresses it
///
/// # Parameters
///
/// * `input_path` - Path to the input file or directory
/// * `config` - CLI configuration
/// * `console` - Console shared by all inputs of this run
///
/// # Returns
///
/// The path of the created output. Existing files are never overwritten, so
/// this may be a renamed variant of the natural output name.
///
/// # Errors
///
/// Returns an error in these cases:
///
/// - Input cannot be opened or read
/// - A compressed input is corrupt
/// - A directory cannot be archived
/// - An output cannot be created
pub fn process_file(input_path: &str, config: &CliConfig, console: &Console) -> Result<PathBuf> {
    let input = Path::new(input_path);
    let operation = classify(input)?;
    let out_dir = output_dir(input, config)?;
    log::debug!(
        "{}: {operation:?} into {}",
        input.display(),
        out_dir.display()
    );

    match operation {
        Operation::Unpack => unpack(input, &out_dir, config, console),
        Operation::Pack => pack(input, &out_dir, config, console),
        Operation::Compress => compress_plain(input, &out_dir, config, console),
    }
}

/// Runs the CLI over every input, each on its own thread.
///
/// Progress display is turned off when more than one input is given. In
/// quiet mode errors are collected and printed once all inputs are done;
/// otherwise each error is printed as soon as it happens.
///
/// # Parameters
///
/// * `files` - Input paths to process
/// * `config` - CLI configuration
/// * `program` - Program name to include in error messages
///
/// # Returns
///
/// Returns `Ok(())` if all inputs were processed successfully.
///
/// # Errors
///
/// Returns the last failure if any input failed. Failures never stop the
/// other inputs. The returned error has already been printed.
pub fn run_cli(files: &[String], config: &CliConfig, program: &str) -> io::Result<()> {
    let mut config = config.clone();
    if files.len() > 1 {
        config.progress = false;
    }
    let console = Console::new(config.quiet);

    let results: Vec<(String, Result<PathBuf>)> = thread::scope(|scope| {
        let handles: Vec<_> = files
            .iter()
            .map(|file| {
                let config = &config;
                let console = &console;
                let handle = scope.spawn(move || {
                    let result = process_file(file, config, console);
                    if let Err(err) = &result {
                        if !console.is_quiet() {
                            console.error(&format!("{program}: {file}: {err}"));
                        }
                    }
                    result
                });
                (file, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(file, handle)| {
                let result = handle.join().unwrap_or_else(|_| {
                    if !console.is_quiet() {
                        console.error(&format!("{program}: {file}: {}", Error::WorkerPanicked));
                    }
                    Err(Error::WorkerPanicked)
                });
                (file.clone(), result)
            })
            .collect()
    });

    let mut last_error = None;
    for (file, result) in results {
        match result {
            Ok(output) => log::debug!("{file}: wrote {}", output.display()),
            Err(source) => {
                let err = InvocationError {
                    program: program.to_owned(),
                    file,
                    source,
                };
                if console.is_quiet() {
                    console.error(&err.to_string());
                }
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) => Err(io::Error::new(err.source.kind(), err)),
        None => Ok(()),
    }
}
