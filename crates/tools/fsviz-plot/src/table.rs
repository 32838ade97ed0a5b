//! CSV loading for the two benchmark result layouts.
//!
//! - **Metric table**: a header plus two data rows, row 0 holding aligned
//!   measurements and row 1 misaligned ones, one column per metric. An
//!   optional leading label column (e.g. `layout,aligned`) is skipped.
//! - **Benchmark table**: one row per `(threads, offset)` run with the columns
//!   in [`BENCHMARK_COLUMNS`]. The benchmark appends a header on every run,
//!   so rows repeating the header are dropped before coercion.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::FormatError;
use crate::series::MetricSeries;

/// Columns every benchmark table must carry.
pub const BENCHMARK_COLUMNS: [&str; 7] = [
    "threads",
    "offset",
    "aligned_time",
    "misaligned_time",
    "speedup",
    "aligned_false_sharing",
    "misaligned_false_sharing",
];

/// Aligned and misaligned measurements over the same metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    /// Row 0 of the file.
    pub aligned: MetricSeries,
    /// Row 1 of the file.
    pub misaligned: MetricSeries,
}

impl MetricTable {
    /// Metric names in column order.
    pub fn metrics(&self) -> &[String] {
        self.aligned.labels()
    }
}

/// One benchmark run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkRow {
    /// Worker thread count.
    pub threads: u32,
    /// Misalignment offset of the data buffer, in bytes.
    pub offset: u64,
    /// Mean time over the cache-aligned buffer, in seconds.
    pub aligned_time: f64,
    /// Mean time over the offset buffer, in seconds.
    pub misaligned_time: f64,
    /// `misaligned_time / aligned_time`.
    pub speedup: f64,
    /// Thread ranges over the aligned buffer share a cache line.
    #[serde(deserialize_with = "flag")]
    pub aligned_false_sharing: bool,
    /// Thread ranges over the offset buffer share a cache line.
    #[serde(deserialize_with = "flag")]
    pub misaligned_false_sharing: bool,
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.as_str() {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        other => Err(de::Error::custom(format!(
            "invalid flag '{other}' (expected 0 or 1)"
        ))),
    }
}

fn open(path: &Path) -> Result<File, FormatError> {
    File::open(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_numeric(cell: Option<&str>) -> bool {
    cell.is_some_and(|s| s.parse::<f64>().is_ok())
}

/// Load a metric table from `path`.
pub fn load_metric_table(path: &Path) -> Result<MetricTable, FormatError> {
    read_metric_table(open(path)?)
}

/// Parse a metric table from any reader.
pub fn read_metric_table<R: io::Read>(reader: R) -> Result<MetricTable, FormatError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let rows = rdr.records().collect::<Result<Vec<StringRecord>, _>>()?;

    if rows.len() < 2 {
        return Err(FormatError::MissingRow {
            expected: 2,
            found: rows.len(),
        });
    }

    // A non-numeric first column names the rows rather than holding a metric.
    let first = usize::from(!(is_numeric(rows[0].get(0)) && is_numeric(rows[1].get(0))));
    let metrics: Vec<String> = headers.iter().skip(first).map(str::to_string).collect();
    if metrics.is_empty() {
        return Err(FormatError::MissingColumn("metric".into()));
    }

    let mut parsed = [Vec::with_capacity(metrics.len()), Vec::with_capacity(metrics.len())];
    for (row_idx, values) in parsed.iter_mut().enumerate() {
        for (offset, name) in metrics.iter().enumerate() {
            let cell = rows[row_idx].get(first + offset).unwrap_or_default();
            let value = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FormatError::InvalidValue {
                    column: name.clone(),
                    row: row_idx + 1,
                    value: cell.to_string(),
                })?;
            values.push(value);
        }
    }

    let [aligned, misaligned] = parsed;
    let series = |name: &str, values| {
        MetricSeries::new(name, metrics.clone(), values)
            .ok_or(FormatError::MissingColumn("metric".into()))
    };
    Ok(MetricTable {
        aligned: series("Aligned", aligned)?,
        misaligned: series("Misaligned", misaligned)?,
    })
}

/// Load a benchmark table from `path`.
pub fn load_benchmark_rows(path: &Path) -> Result<Vec<BenchmarkRow>, FormatError> {
    read_benchmark_rows(open(path)?)
}

/// Parse a benchmark table from any reader, dropping repeated header rows.
pub fn read_benchmark_rows<R: io::Read>(reader: R) -> Result<Vec<BenchmarkRow>, FormatError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    for column in BENCHMARK_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(FormatError::MissingColumn(column.into()));
        }
    }
    let threads_idx = headers
        .iter()
        .position(|h| h == "threads")
        .unwrap_or_default();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.get(threads_idx) == Some("threads") {
            continue;
        }
        let line = record.position().map_or(0, csv::Position::line);
        let row = record
            .deserialize::<BenchmarkRow>(Some(&headers))
            .map_err(|source| FormatError::InvalidRecord { line, source })?;
        check_finite(&row, rows.len() + 1)?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(FormatError::MissingRow {
            expected: 1,
            found: 0,
        });
    }
    Ok(rows)
}

/// Reject timings that cannot be placed on an axis (`NaN`, `inf`).
fn check_finite(row: &BenchmarkRow, index: usize) -> Result<(), FormatError> {
    let timings = [
        ("aligned_time", row.aligned_time),
        ("misaligned_time", row.misaligned_time),
        ("speedup", row.speedup),
    ];
    match timings.into_iter().find(|(_, v)| !v.is_finite()) {
        Some((column, value)) => Err(FormatError::InvalidValue {
            column: column.into(),
            row: index,
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

/// Group rows by thread count, ascending; rows keep file order within a group.
pub fn group_by_threads(rows: &[BenchmarkRow]) -> BTreeMap<u32, Vec<&BenchmarkRow>> {
    let mut groups: BTreeMap<u32, Vec<&BenchmarkRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.threads).or_default().push(row);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "threads,offset,aligned_time,misaligned_time,speedup,aligned_false_sharing,misaligned_false_sharing\n";

    #[test]
    fn metric_table_without_label_column() {
        let data = "metric_a,metric_b\n1.5,2000000\n3.5,500000\n";
        let table = read_metric_table(data.as_bytes()).unwrap();
        assert_eq!(table.metrics(), &["metric_a", "metric_b"]);
        assert_eq!(table.aligned.values(), &[1.5, 2_000_000.0]);
        assert_eq!(table.misaligned.values(), &[3.5, 500_000.0]);
        assert_eq!(crate::units::scale_all(table.aligned.values()), vec![1.5, 2.0]);
        assert_eq!(crate::units::scale_all(table.misaligned.values()), vec![3.5, 0.5]);
    }

    #[test]
    fn metric_table_skips_label_column() {
        let data = "layout,time,cache_misses\naligned,0.012,1500000\nmisaligned,0.019,4200000\n";
        let table = read_metric_table(data.as_bytes()).unwrap();
        assert_eq!(table.metrics(), &["time", "cache_misses"]);
        assert_eq!(table.aligned.values(), &[0.012, 1_500_000.0]);
        assert_eq!(table.misaligned.name(), "Misaligned");
    }

    #[test]
    fn metric_table_needs_two_rows() {
        let err = read_metric_table("a,b\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::MissingRow { expected: 2, found: 1 }));
    }

    #[test]
    fn metric_table_rejects_text_values() {
        let data = "layout,time\naligned,fast\nmisaligned,0.2\n";
        let err = read_metric_table(data.as_bytes()).unwrap_err();
        match err {
            FormatError::InvalidValue { column, row, value } => {
                assert_eq!(column, "time");
                assert_eq!(row, 1);
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn benchmark_rows_parse() {
        let data = format!("{HEADER}2,4,0.0105,0.0121,1.15,0,1\n4,8,0.0061,0.0060,0.98,0,0\n");
        let rows = read_benchmark_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].threads, 2);
        assert_eq!(rows[0].offset, 4);
        assert!(!rows[0].aligned_false_sharing);
        assert!(rows[0].misaligned_false_sharing);
        assert_eq!(rows[1].speedup, 0.98);
    }

    #[test]
    fn repeated_headers_are_dropped() {
        let data = format!("{HEADER}{HEADER}2,4,0.01,0.02,2.0,0,1\n{HEADER}2,16,0.01,0.01,1.0,0,0\n");
        let rows = read_benchmark_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].offset, 4);
        assert_eq!(rows[1].offset, 16);
    }

    #[test]
    fn missing_speedup_is_format_error() {
        let data = "threads,offset,aligned_time,misaligned_time,aligned_false_sharing,misaligned_false_sharing\n2,4,0.01,0.02,0,1\n";
        let err = read_benchmark_rows(data.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::MissingColumn(ref c) if c == "speedup"));
    }

    #[test]
    fn bad_flag_reports_line() {
        let data = format!("{HEADER}2,4,0.01,0.02,2.0,0,maybe\n");
        let err = read_benchmark_rows(data.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn header_only_is_missing_rows() {
        let err = read_benchmark_rows(HEADER.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::MissingRow { expected: 1, found: 0 }));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let data = "threads,offset,aligned_time,misaligned_time,speedup,aligned_false_sharing,misaligned_false_sharing,note\n8,0,0.003,0.003,1.0,true,false,baseline\n";
        let rows = read_benchmark_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].threads, 8);
        assert!(rows[0].aligned_false_sharing);
    }

    #[test]
    fn groups_sorted_by_threads() {
        let data = format!(
            "{HEADER}4,4,0.1,0.1,1.0,0,0\n2,8,0.1,0.1,1.0,0,0\n4,0,0.1,0.1,1.0,0,0\n2,4,0.1,0.1,1.0,0,0\n"
        );
        let rows = read_benchmark_rows(data.as_bytes()).unwrap();
        let groups = group_by_threads(&rows);
        let keys: Vec<u32> = groups.keys().copied().collect();
        assert_eq!(keys, vec![2, 4]);
        let offsets: Vec<u64> = groups[&4].iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![4, 0]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_benchmark_rows(Path::new("/nonexistent/benchmark_results.csv")).unwrap_err();
        assert!(matches!(err, FormatError::Io { .. }));
    }

    #[test]
    fn metric_table_rejects_non_finite_values() {
        let data = "metric_a,metric_b\n1.5,inf\n3.5,0.5\n";
        let err = read_metric_table(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidValue { ref column, row: 1, ref value } if column == "metric_b" && value == "inf"
        ));
    }

    #[test]
    fn benchmark_rows_reject_non_finite_timings() {
        let data = format!("{HEADER}2,4,0.01,0.02,2.0,0,1\n{HEADER}2,8,0.01,NaN,2.0,0,0\n");
        let err = read_benchmark_rows(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidValue { ref column, row: 2, .. } if column == "misaligned_time"
        ));

        let data = format!("{HEADER}2,4,inf,0.02,2.0,0,1\n");
        let err = read_benchmark_rows(data.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::InvalidValue { ref column, .. } if column == "aligned_time"));
    }
}
