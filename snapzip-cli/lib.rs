//! Command-line front end for snapzip.
//!
//! Every input is classified by its contents and then unpacked (snappy
//! compressed, possibly holding a tar archive), packed (a directory, archived
//! and then compressed) or compressed (anything else). Outputs are written
//! next to the input or into a chosen directory and never overwrite existing
//! files.

pub mod config;
pub mod console;
pub mod error;
pub mod io;
pub mod operations;
pub mod process;


pub use config::{CliConfig, Operation, DEFAULT_BUFFER_SIZE, SZ_EXTENSION, TAR_EXTENSION};
pub use console::{Console, ConsoleProgress};
pub use error::{format_error_for_stderr, Error, InvocationError, Result};
pub use operations::{classify, compress_plain, pack, unpack};
pub use process::{process_file, run_cli};
