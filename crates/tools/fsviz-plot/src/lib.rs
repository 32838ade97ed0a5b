//! Rendering for false-sharing benchmark results.
//!
//! Loads the two CSV layouts written by the vector-arithmetic benchmarks,
//! normalizes raw counts for display, and draws grouped bar charts and
//! cache-line range diagrams to PNG files. Also provides the cache-line
//! overlap check used to flag false sharing between thread ranges, and
//! terminal summaries of loaded results.

pub mod chart;
pub mod config;
pub mod diagram;
pub mod error;
pub mod fonts;
pub mod output;
pub mod ranges;
pub mod series;
pub mod table;
pub mod units;

pub use error::{FormatError, RangeError};
