//! Progress accounting for archive and stream operations.
//!
//! Operations own a [`Progress`] value that counts transferred units against an
//! expected total and decides when an update is due. Rendered lines are handed
//! to a [`ProgressSink`]; the engine never prints anything itself.

use std::time::{Duration, Instant};

/// Receiver of rendered progress lines.
pub trait ProgressSink {
    /// Replaces the currently displayed progress line with `line`.
    fn update(&mut self, line: &str);

    /// Called once after the final update of an operation.
    fn finish(&mut self) {}
}

/// A sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressSink for Silent {
    fn update(&mut self, _line: &str) {}
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn update(&mut self, line: &str) {
        (**self).update(line);
    }

    fn finish(&mut self) {
        (**self).finish();
    }
}

/// When a [`Progress`] considers an update due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    /// At most one update per interval.
    Interval(Duration),
    /// Only after the percentage advanced by at least this many points.
    Step(u32),
}

/// Transfer state of a single operation.
#[derive(Debug, Clone)]
pub struct Progress {
    done: u64,
    total: u64,
    last_percent: Option<u32>,
    last_report: Option<Instant>,
    throttle: Throttle,
}

impl Progress {
    /// Creates a progress state expecting `total` units.
    pub fn new(total: u64, throttle: Throttle) -> Self {
        Self {
            done: 0,
            total,
            last_percent: None,
            last_report: None,
            throttle,
        }
    }

    /// Units transferred so far.
    pub fn done(&self) -> u64 {
        self.done
    }

    /// Expected number of units.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Completed percentage, capped at 100. An empty total counts as complete.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        let percent = u128::from(self.done) * 100 / u128::from(self.total);
        u32::try_from(percent.min(100)).unwrap_or(100)
    }

    /// Records `units` more transferred units.
    ///
    /// # Returns
    ///
    /// `true` if an update is due under the throttle policy. The caller is
    /// expected to render and emit one when this returns `true`.
    pub fn advance(&mut self, units: u64) -> bool {
        self.done = self.done.saturating_add(units);

        let percent = self.percent();
        let due = match self.throttle {
            Throttle::Interval(interval) => self
                .last_report
                .is_none_or(|last| last.elapsed() >= interval),
            Throttle::Step(step) => self
                .last_percent
                .is_none_or(|last| percent >= last.saturating_add(step)),
        };

        if due {
            self.mark_reported(percent);
        }
        due
    }

    /// Marks the operation complete; the final update is always due.
    pub fn complete(&mut self) {
        let percent = self.percent();
        self.mark_reported(percent);
    }

    fn mark_reported(&mut self, percent: u32) {
        self.last_percent = Some(percent);
        self.last_report = Some(Instant::now());
    }

    /// Renders `"  {pct}%   {done} / {total} files"` for entry counts.
    pub fn entries_line(&self) -> String {
        format!("  {}%   {} / {} files", self.percent(), self.done, self.total)
    }

    /// Renders `"  {pct}%   {done} / {total}"` with human-readable sizes.
    pub fn bytes_line(&self) -> String {
        format!(
            "  {}%   {} / {}",
            self.percent(),
            size_label(self.done),
            size_label(self.total)
        )
    }

    /// Renders the byte line followed by `" = {ratio:.3}"`, the ratio of
    /// `produced` to the units consumed so far.
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio_line(&self, produced: u64) -> String {
        let ratio = if self.done == 0 {
            0.0
        } else {
            produced as f64 / self.done as f64
        };
        format!("{} = {ratio:.3}", self.bytes_line())
    }
}

/// Formats a byte count as `B`, `KiB`, `MiB` or `GiB`.
#[allow(clippy::cast_precision_loss)]
pub fn size_label(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let value = bytes as f64;
    if value >= GIB {
        format!("{:.1} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.1} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}
