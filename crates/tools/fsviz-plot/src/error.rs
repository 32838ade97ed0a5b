//! Error types for loading benchmark tables and building thread ranges.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading a benchmark CSV file.
#[derive(Debug)]
pub enum FormatError {
    /// I/O error opening or reading the input file.
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The CSV reader rejected the input (bad quoting, ragged rows, ...).
    Csv(csv::Error),
    /// A required column is absent from the header.
    MissingColumn(String),
    /// The table has fewer data rows than the layout requires.
    MissingRow {
        /// Rows the layout needs.
        expected: usize,
        /// Rows actually present.
        found: usize,
    },
    /// A numeric cell is not a finite number.
    InvalidValue {
        /// Column holding the cell.
        column: String,
        /// 1-based data row index.
        row: usize,
        /// Raw cell text.
        value: String,
    },
    /// A benchmark record could not be coerced to its typed form.
    InvalidRecord {
        /// 1-based line number in the file.
        line: u64,
        /// Deserialization failure.
        source: csv::Error,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read '{}': {source}", path.display()),
            Self::Csv(e) => write!(f, "malformed CSV: {e}"),
            Self::MissingColumn(name) => write!(f, "missing required column '{name}'"),
            Self::MissingRow { expected, found } => {
                write!(f, "expected at least {expected} data rows, found {found}")
            }
            Self::InvalidValue { column, row, value } => {
                write!(f, "row {row}, column '{column}': '{value}' is not a finite number")
            }
            Self::InvalidRecord { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(e) | Self::InvalidRecord { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for FormatError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

/// Errors building or placing thread ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// The range starts past its end.
    Reversed {
        /// First element index.
        start: usize,
        /// One past the last element index.
        end: usize,
    },
    /// A byte offset of the range does not fit in `usize`.
    Overflow {
        /// Element index whose offset overflowed.
        index: usize,
        /// Element size in bytes.
        element_size: usize,
    },
    /// The ranges cover more cache lines than a diagram can show.
    TooManyLines {
        /// Cache lines needed.
        lines: usize,
        /// Largest supported count.
        max: usize,
    },
    /// More ranges than a pairwise scan accepts.
    TooManyRanges {
        /// Ranges given.
        ranges: usize,
        /// Largest supported count.
        max: usize,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reversed { start, end } => {
                write!(f, "invalid range {start}..{end}: start must not exceed end")
            }
            Self::Overflow { index, element_size } => write!(
                f,
                "element {index} of {element_size} bytes lies outside the address space"
            ),
            Self::TooManyLines { lines, max } => {
                write!(f, "ranges span {lines} cache lines (at most {max} can be drawn)")
            }
            Self::TooManyRanges { ranges, max } => {
                write!(f, "{ranges} ranges given (at most {max} supported)")
            }
        }
    }
}

impl std::error::Error for RangeError {}
