//! Command line argument parsing for snapzip

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use snapzip_cli::{CliConfig, Error};

/// Snappy compressor for files and directories
///
/// Every FILE is handled according to its contents: snappy compressed files
/// are decompressed (and extracted when they hold a tar archive), directories
/// are archived and compressed to `<name>.tar.sz`, anything else is
/// compressed to `<name>.sz`.
#[derive(Parser, Debug)]
#[command(
    name = "snapzip",
    version,
    about = "Compress or decompress files and directories with snappy",
    long_about = "snapzip compresses files to .sz, archives and compresses directories to \
                  .tar.sz, and reverses both. Existing files are never overwritten; a \
                  counter is added to the output name instead."
)]
pub struct SnapzipOpts {
    /// Files or directories to process
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<String>,

    /// Quiet mode: no headlines or progress, errors are reported at the end
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose logging. Use twice for debug output.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Write outputs into DIR instead of next to each input
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

impl SnapzipOpts {
    /// Parse command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Build CLI configuration from the parsed options
    pub fn config(&self) -> Result<CliConfig, Error> {
        if let Some(dir) = &self.directory {
            if !dir.is_dir() {
                return Err(Error::InvalidOutputDir { path: dir.clone() });
            }
        }

        Ok(CliConfig {
            quiet: self.quiet,
            verbose: self.verbose,
            output_dir: self.directory.clone(),
            ..CliConfig::default()
        })
    }

    /// Log filter matching the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
