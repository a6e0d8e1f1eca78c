//! Error types and result handling for packing, extraction and stream operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias using the crate-level [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type covering all failure modes of the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A filesystem operation on a known path failed.
    #[error("{}: {source}", path.display())]
    Fs {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// I/O failure while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Directory traversal failed.
    #[error("cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// The compressed stream is malformed.
    #[error("compressed data is corrupt: {0}")]
    Codec(#[source] snap::Error),

    /// The archive is empty or its headers cannot be parsed.
    #[error("corrupt archive: {reason}")]
    CorruptArchive {
        /// What was wrong with it
        reason: String,
    },

    /// A path cannot be represented inside an archive.
    #[error("{}: cannot store path in an archive: {reason}", path.display())]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Extraction of an archive failed part-way.
    #[error("{}: failed to extract: {source}", archive.display())]
    Extract {
        /// Archive being extracted
        archive: PathBuf,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps an I/O error with the path it occurred on.
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Fs {
            path: path.into(),
            source,
        }
    }

    /// Classifies an I/O error produced by the snappy codec.
    ///
    /// The framing decoder reports malformed input as an [`io::Error`] carrying a
    /// [`snap::Error`]; those become [`Error::Codec`], everything else stays I/O.
    pub(crate) fn from_codec_io(err: io::Error) -> Self {
        let is_codec = err
            .get_ref()
            .is_some_and(|inner| inner.downcast_ref::<snap::Error>().is_some());
        if !is_codec {
            return Error::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<snap::Error>()) {
            Some(Ok(codec)) => Error::Codec(*codec),
            Some(Err(other)) => Error::Io(io::Error::other(other)),
            None => Error::Io(io::Error::other("codec error")),
        }
    }

    /// Returns the kind of the underlying I/O error, if there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Fs { source, .. } | Error::Io(source) => Some(source.kind()),
            Error::Walk(err) => err.io_error().map(io::Error::kind),
            Error::Extract { source, .. } => source.io_kind(),
            Error::Codec(_) | Error::CorruptArchive { .. } | Error::InvalidPath { .. } => None,
        }
    }
}
