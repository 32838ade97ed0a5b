//! Terminal output formatting for loaded results and range checks.

use std::fmt::Write;

use crate::ranges::{Conflict, ThreadRange};
use crate::table::{self, BenchmarkRow, MetricTable};
use crate::units;

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Format the metric table with the same labels the chart uses.
pub fn format_metric_table(table: &MetricTable) -> String {
    let max_name = table
        .metrics()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(6)
        .max(6);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<width$}  {:>14}  {:>14}",
        "Metric",
        "Aligned",
        "Misaligned",
        width = max_name
    );
    let _ = writeln!(out, "  {:-<width$}  {:->14}  {:->14}", "", "", "", width = max_name);

    let rows = table
        .metrics()
        .iter()
        .zip(table.aligned.values())
        .zip(table.misaligned.values());
    for ((name, &aligned), &misaligned) in rows {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>14}  {:>14}",
            name,
            units::display_label(aligned),
            units::display_label(misaligned),
            width = max_name
        );
    }
    out
}

/// Format one table per thread count, ascending.
pub fn format_benchmark_summary(rows: &[BenchmarkRow]) -> String {
    let mut out = String::new();
    for (threads, group) in table::group_by_threads(rows) {
        let _ = writeln!(out, "\n  Threads = {threads}");
        let _ = writeln!(
            out,
            "  {:>8}  {:>12}  {:>12}  {:>8}  {:>6}  {:>6}",
            "Offset", "Aligned (s)", "Misalgn (s)", "Speedup", "FS-A", "FS-M"
        );
        let _ = writeln!(
            out,
            "  {:->8}  {:->12}  {:->12}  {:->8}  {:->6}  {:->6}",
            "", "", "", "", "", ""
        );
        for row in group {
            let _ = writeln!(
                out,
                "  {:>8}  {:>12.5}  {:>12.5}  {:>7.2}x  {:>6}  {:>6}",
                row.offset,
                row.aligned_time,
                row.misaligned_time,
                row.speedup,
                yes_no(row.aligned_false_sharing),
                yes_no(row.misaligned_false_sharing),
            );
        }
    }
    out
}

/// Format the outcome of a cache-line overlap check.
pub fn format_conflicts(ranges: &[ThreadRange], conflicts: &[Conflict]) -> String {
    let mut out = String::new();
    for (thread, range) in ranges.iter().enumerate() {
        let _ = writeln!(
            out,
            "  Thread {thread}: elements {}..{} ({} elements)",
            range.start(),
            range.end(),
            range.len()
        );
    }
    if conflicts.is_empty() {
        let _ = writeln!(out, "  No false sharing: threads access separate cache lines.");
        return out;
    }
    for c in conflicts {
        let _ = writeln!(
            out,
            "  False sharing between threads {} and {}: cache lines {}-{} vs {}-{}",
            c.first, c.second, c.first_lines.0, c.first_lines.1, c.second_lines.0, c.second_lines.1
        );
    }
    out
}

/// Print the metric table.
pub fn print_metric_table(table: &MetricTable) {
    println!();
    print!("{}", format_metric_table(table));
    println!();
}

/// Print per-thread-count benchmark summaries.
pub fn print_benchmark_summary(rows: &[BenchmarkRow]) {
    print!("{}", format_benchmark_summary(rows));
    println!();
}

/// Print a cache-line overlap report.
pub fn print_conflicts(ranges: &[ThreadRange], conflicts: &[Conflict]) {
    print!("{}", format_conflicts(ranges, conflicts));
}
