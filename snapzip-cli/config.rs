//! Configuration types and constants for snapzip CLI operations.

use std::path::PathBuf;

/// Default buffer size for file I/O operations
pub const DEFAULT_BUFFER_SIZE: usize = 512 * 1024;

/// File extension for snappy compressed files
pub const SZ_EXTENSION: &str = "sz";

/// File extension for tar archives
pub const TAR_EXTENSION: &str = "tar";

/// Prefix of intermediate files created next to the outputs
pub const TEMP_PREFIX: &str = ".snapzip-";

/// What snapzip does with an input, decided from its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Decompress a snappy stream, then extract it if it holds a tar archive
    Unpack,
    /// Archive a directory, then compress the archive
    Pack,
    /// Compress a single file
    Compress,
}

/// Configuration for CLI operations
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Suppress headlines and progress; report errors once all inputs are done
    pub quiet: bool,
    /// Verbosity level (as counted by `-v` occurrences)
    pub verbose: u8,
    /// Directory outputs are written to, instead of the input's directory
    pub output_dir: Option<PathBuf>,
    /// Show live progress lines
    pub progress: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: 0,
            output_dir: None,
            progress: true,
        }
    }
}

impl CliConfig {
    /// Returns `true` if progress lines should be drawn.
    pub fn shows_progress(&self) -> bool {
        self.progress && !self.quiet
    }
}
