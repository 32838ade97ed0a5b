//! Console verbosity for fsviz.
//!
//! `-q` keeps only errors and the lines naming written images, `-v` adds
//! load details and render timings. Library renderers always announce the
//! files they write; everything else printed by the binary goes through the
//! macros here.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// How much the binary prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors and written files.
    Quiet = 0,
    /// Progress lines and result tables.
    Normal = 1,
    /// Load details and timings.
    Verbose = 2,
}

impl Verbosity {
    /// Level selected by the `-q`/`-v` flags (clap rejects both at once).
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Set the process-wide level from the CLI flags.
pub fn init(quiet: bool, verbose: bool) {
    LEVEL.store(Verbosity::from_flags(quiet, verbose) as u8, Ordering::Relaxed);
}

/// Returns `true` if messages at `level` should be printed.
pub fn enabled(level: Verbosity) -> bool {
    LEVEL.load(Ordering::Relaxed) >= level as u8
}

/// Returns `true` in quiet mode.
pub fn is_quiet() -> bool {
    !enabled(Verbosity::Normal)
}

/// `println!` at verbose level only.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Verbose) {
            println!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `println!` unless quiet.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Normal) {
            println!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Prints how long a scope took when verbose.
///
/// ```ignore
/// let _t = Timer::start("render");
/// // "  render: 42.0ms" on drop
/// ```
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Start timing `label`.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        vprintln!("  {}: {:.1?}", self.label, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pick_level() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Verbose);
    }
}
