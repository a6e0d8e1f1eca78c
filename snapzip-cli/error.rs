//! Error types for snapzip CLI operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A structured CLI error that preserves the underlying failure.
///
/// Adds the program name and the input it happened on, so messages can be
/// printed right away or collected and printed later.
#[derive(Debug)]
pub struct InvocationError {
    /// Program name to prefix in error output.
    pub program: String,
    /// Input path as given on the command line.
    pub file: String,
    /// Underlying error produced by processing.
    pub source: Error,
}

impl std::fmt::Display for InvocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.program, self.file, self.source)
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Formats an error message for stderr.
///
/// # Parameters
///
/// - `program`: Program name prefix to use in error output.
/// - `err`: The I/O error returned by the CLI runner.
///
/// # Returns
///
/// A single-line message. Errors wrapping an [`InvocationError`] already carry
/// their prefix; anything else is prefixed with `program`.
pub fn format_error_for_stderr(program: &str, err: &io::Error) -> String {
    let run_err = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<InvocationError>());

    match run_err {
        Some(run_err) => run_err.to_string(),
        None => format!("{program}: {err}"),
    }
}

/// Main error type for snapzip CLI operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to open input file
    ///
    /// The message omits the path, [`InvocationError`] names the input.
    #[error("{source}")]
    OpenInput {
        /// Path to the input file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to create output file
    #[error("{}: {source}", path.display())]
    CreateOutput {
        /// Path to the output file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The output directory is unusable
    #[error("{}: Not a directory", path.display())]
    InvalidOutputDir {
        /// The requested directory
        path: PathBuf,
    },

    /// Packing, extraction or the codec failed
    #[error("{source}")]
    Core {
        /// Input being processed
        path: PathBuf,
        /// Engine error
        #[source]
        source: snapzip_core::Error,
    },

    /// Failed to remove a file
    #[error("{}: Cannot remove: {source}", path.display())]
    RemoveFile {
        /// Path to the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to keep an intermediate file after an earlier failure
    #[error("{}: Cannot keep intermediate file: {source}", path.display())]
    KeepTemporary {
        /// Path to the intermediate file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A worker thread panicked
    #[error("internal error: worker thread panicked")]
    WorkerPanicked,
}

/// Specialized `Result` type for snapzip CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the [`io::ErrorKind`] that best describes this error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Error::InvalidOutputDir { .. } => io::ErrorKind::InvalidInput,
            Error::Core { source, .. } => source.io_kind().unwrap_or(io::ErrorKind::InvalidData),
            Error::OpenInput { source, .. }
            | Error::CreateOutput { source, .. }
            | Error::RemoveFile { source, .. }
            | Error::KeepTemporary { source, .. } => source.kind(),
            Error::WorkerPanicked => io::ErrorKind::Other,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        // Preserve the original error kind
        io::Error::new(err.kind(), err)
    }
}
