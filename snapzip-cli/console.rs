//! Terminal output shared by concurrently processed inputs.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use snapzip_core::ProgressSink;

/// Serialized access to stderr.
///
/// Headlines, progress lines and error messages of different inputs never
/// interleave within a line.
#[derive(Debug)]
pub struct Console {
    lock: Mutex<()>,
    quiet: bool,
}

impl Console {
    /// Creates a console. A quiet console prints errors only.
    pub fn new(quiet: bool) -> Self {
        Self {
            lock: Mutex::new(()),
            quiet,
        }
    }

    /// Returns `true` if headlines and progress are suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Prints `"<src>  >  <dst>"` before an operation starts.
    pub fn headline(&self, src: &Path, dst: &Path) {
        if self.quiet {
            return;
        }
        self.write(&format!("{}  >  {}\n", src.display(), dst.display()));
    }

    /// Prints the blank line that closes an operation.
    pub fn done(&self) {
        if self.quiet {
            return;
        }
        self.write("\n");
    }

    /// Prints an error message on its own line.
    pub fn error(&self, message: &str) {
        self.write(&format!("{message}\n"));
    }

    /// Returns a progress sink drawing on this console, or `None` if progress
    /// is not shown.
    pub fn progress(&self, enabled: bool) -> Option<ConsoleProgress<'_>> {
        (enabled && !self.quiet).then_some(ConsoleProgress {
            console: self,
            width: 0,
        })
    }

    fn write(&self, text: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stderr = io::stderr().lock();
        // Nothing sensible to do if stderr is gone
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}

/// Progress sink that redraws a single console line.
#[derive(Debug)]
pub struct ConsoleProgress<'a> {
    console: &'a Console,
    width: usize,
}

impl ProgressSink for ConsoleProgress<'_> {
    fn update(&mut self, line: &str) {
        let width = line.chars().count();
        let pad = self.width.saturating_sub(width);
        self.width = width;
        self.console
            .write(&format!("\r{line}{:pad$}", "", pad = pad));
    }

    fn finish(&mut self) {
        if self.width > 0 {
            self.console.write("\n");
            self.width = 0;
        }
    }
}
