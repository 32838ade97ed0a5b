//! fsviz: plots for false-sharing benchmarks.
//!
//! Turns the CSV files written by the vector-arithmetic benchmarks into bar
//! charts, and draws how per-thread element ranges fall onto cache lines.
//!
//! Pipeline: load CSV → scale for display → compose panels → write PNG.

mod cli;
mod verbose;
mod viewer;

use std::path::Path;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use fsviz_plot::config::PlotConfig;
use fsviz_plot::ranges::{self, RangeLayout};
use fsviz_plot::{chart, diagram, output, table};

use crate::verbose::{Timer, dprintln, vprintln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let config = PlotConfig::resolve(cli.config.as_deref())?;
    vprintln!(
        "Figure sizes: metrics {:?}, bench {:?}, diagram {:?} ({})",
        config.metrics.dims(),
        config.bench.dims(),
        config.diagram.dims(),
        config.font
    );

    match cli.command {
        cli::Command::Metrics(ref args) => cmd_metrics(args, &config),
        cli::Command::Bench(ref args) => cmd_bench(args, &config),
        cli::Command::Ranges(ref args) => cmd_ranges(args, &config),
        cli::Command::Detect(ref args) => cmd_detect(args, &config),
    }
}

/// Abort with a clap usage error (exit status 2).
fn usage_error(message: impl std::fmt::Display) -> ! {
    cli::Cli::command()
        .error(ErrorKind::ValueValidation, message)
        .exit()
}

// ===========================================================================
// Commands
// ===========================================================================

/// Chart the two-row metric table.
fn cmd_metrics(args: &cli::MetricsArgs, config: &PlotConfig) -> Result<()> {
    dprintln!("Loading {}...", args.input.display());
    let metrics = table::load_metric_table(&args.input)
        .with_context(|| format!("loading metric table {}", args.input.display()))?;
    vprintln!("  {} metrics", metrics.metrics().len());

    if !verbose::is_quiet() {
        output::print_metric_table(&metrics);
    }

    {
        let _t = Timer::start("render");
        chart::render_metric_chart(&metrics, &args.output, config)?;
    }
    if args.show {
        viewer::show(&args.output);
    }
    Ok(())
}

/// Chart the benchmark table, one image per thread count.
fn cmd_bench(args: &cli::BenchArgs, config: &PlotConfig) -> Result<()> {
    dprintln!("Loading {}...", args.input.display());
    let rows = table::load_benchmark_rows(&args.input)
        .with_context(|| format!("loading benchmark results {}", args.input.display()))?;
    let groups = table::group_by_threads(&rows);
    dprintln!("  {} runs across {} thread counts", rows.len(), groups.len());

    if !verbose::is_quiet() {
        output::print_benchmark_summary(&rows);
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let written = {
        let _t = Timer::start("render");
        chart::render_benchmark_charts(&rows, &args.output_dir, config)?
    };
    dprintln!("Wrote {} chart(s).", written.len());

    if args.show {
        for path in &written {
            viewer::show(path);
        }
    }
    Ok(())
}

/// Draw user-supplied ranges over cache lines.
fn cmd_ranges(args: &cli::RangesArgs, config: &PlotConfig) -> Result<()> {
    let thread_ranges = ranges::from_pairs(&args.ranges).unwrap_or_else(|e| usage_error(e));
    let layout = ranges::layout(&thread_ranges, ranges::ELEMENT_SIZE, ranges::CACHE_LINE_SIZE)
        .unwrap_or_else(|e| usage_error(e));
    render_ranges(&layout, ranges::ELEMENT_SIZE, &args.output, args.show, config)
}

/// Split elements evenly across threads and report cache-line sharing.
fn cmd_detect(args: &cli::DetectArgs, config: &PlotConfig) -> Result<()> {
    if args.threads == 0 {
        usage_error("--threads must be at least 1");
    }
    if args.threads > ranges::MAX_RANGES {
        usage_error(format!("--threads must be at most {}", ranges::MAX_RANGES));
    }
    if args.element_size == 0 {
        usage_error("--element-size must be at least 1");
    }

    dprintln!(
        "Checking {} elements of {} bytes over {} threads (base offset {} bytes)",
        args.elements,
        args.element_size,
        args.threads,
        args.base_offset
    );
    let thread_ranges = ranges::even_split(args.elements, args.threads);
    let conflicts = ranges::detect_false_sharing(
        &thread_ranges,
        args.element_size,
        ranges::CACHE_LINE_SIZE,
        args.base_offset,
    )
    .unwrap_or_else(|e| usage_error(e));
    let layout = args.output.as_ref().map(|_| {
        ranges::layout(&thread_ranges, args.element_size, ranges::CACHE_LINE_SIZE)
            .unwrap_or_else(|e| usage_error(e))
    });
    output::print_conflicts(&thread_ranges, &conflicts);

    if let (Some(path), Some(layout)) = (&args.output, &layout) {
        render_ranges(layout, args.element_size, path, args.show, config)?;
    }
    Ok(())
}

fn render_ranges(
    layout: &RangeLayout,
    element_size: usize,
    path: &Path,
    show: bool,
    config: &PlotConfig,
) -> Result<()> {
    {
        let _t = Timer::start("render");
        diagram::render_range_diagram(layout, element_size, path, config)?;
    }
    vprintln!(
        "  {} bytes over {} cache lines, {} ranges",
        layout.max_extent,
        layout.lines.len(),
        layout.rects.len()
    );

    if show {
        viewer::show(path);
    }
    Ok(())
}
