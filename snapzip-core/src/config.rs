//! Shared constants and summary types for snappy stream and tar processing.

use std::time::Duration;

/// Size of one chunk fed to the snappy codec.
///
/// Matches the maximum uncompressed block length of the snappy framing
/// format, so every chunk becomes at most one frame.
pub const CHUNK_SIZE: usize = 65536;

/// Stream identifier that opens every snappy framed stream.
pub const STREAM_IDENTIFIER: [u8; 10] = [0xFF, 0x06, 0x00, 0x00, b's', b'N', b'a', b'P', b'p', b'Y'];

/// Magic bytes of a ustar header.
pub const TAR_MAGIC: [u8; 5] = *b"ustar";

/// Offset of [`TAR_MAGIC`] inside the first header block.
pub const TAR_MAGIC_OFFSET: u64 = 257;

/// The single extended attribute carried through archives.
pub const CAPABILITY_XATTR: &str = "security.capability";

/// PAX record prefix used for extended attributes.
pub const PAX_XATTR_PREFIX: &str = "SCHILY.xattr.";

/// Minimum delay between two progress updates of archive operations.
pub const ARCHIVE_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Minimum percentage step between two progress updates of stream operations.
pub const STREAM_PROGRESS_STEP: u32 = 1;

/// Statistical summary of completed stream processing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Total number of bytes read from the input source.
    pub bytes_read: u64,

    /// Total number of bytes written to the output destination.
    pub bytes_written: u64,
}

impl StreamSummary {
    /// Creates a new stream summary with the specified byte counts.
    ///
    /// # Parameters
    ///
    /// * `bytes_read` - Total bytes consumed from the input stream
    /// * `bytes_written` - Total bytes produced to the output stream
    pub(crate) const fn new(bytes_read: u64, bytes_written: u64) -> Self {
        Self {
            bytes_read,
            bytes_written,
        }
    }

    /// Calculates the compression ratio for this stream summary.
    ///
    /// # Returns
    ///
    /// The compression ratio as an `f64`. A value less than 1.0 indicates
    /// compression occurred, while a value greater than 1.0 indicates expansion.
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_read == 0 {
            if self.bytes_written == 0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.bytes_written as f64 / self.bytes_read as f64
        }
    }

    /// Calculates the space saved percentage for compression operations.
    ///
    /// Negative values indicate the output was larger than the input.
    pub fn space_saved_percent(&self) -> f64 {
        if self.bytes_read == 0 {
            0.0
        } else {
            (1.0 - self.compression_ratio()) * 100.0
        }
    }
}
