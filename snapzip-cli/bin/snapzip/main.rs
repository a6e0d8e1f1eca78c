//! snapzip compression utility
//!
//! Compresses files, packs directories and unpacks snappy streams, picking the
//! operation from each input's contents.

use std::io;
use std::process;

mod opts;

use env_logger::{Builder, Env};
use opts::SnapzipOpts;

use snapzip_cli::{format_error_for_stderr, run_cli};

const PROGRAM_NAME: &str = "snapzip";

fn main() -> io::Result<()> {
    let opts = SnapzipOpts::parse();

    Builder::from_env(Env::default().default_filter_or(opts.log_level()))
        .format_timestamp(None)
        .init();

    let config = match opts.config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format_error_for_stderr(PROGRAM_NAME, &err.into()));
            process::exit(1);
        }
    };

    // Failures have been reported by the time run_cli returns
    if run_cli(&opts.files, &config, PROGRAM_NAME).is_err() {
        process::exit(1);
    }

    Ok(())
}
