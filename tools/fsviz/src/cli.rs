//! Command-line interface definitions for fsviz.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Plot false-sharing benchmark results.
#[derive(Parser)]
#[command(name = "fsviz", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Figure configuration file (default: fsviz.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress progress output; show only errors and written files.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output with timings.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Chart an aligned-vs-misaligned metric table.
    Metrics(MetricsArgs),
    /// Chart a benchmark results table, one image per thread count.
    Bench(BenchArgs),
    /// Draw thread element ranges over cache lines.
    Ranges(RangesArgs),
    /// Split elements across threads and check for cache-line sharing.
    Detect(DetectArgs),
}

/// Arguments for the `metrics` subcommand.
#[derive(Parser)]
pub struct MetricsArgs {
    /// Two-row metric CSV (row 0 aligned, row 1 misaligned).
    #[arg(long, short = 'i', default_value = "vec_timing.csv")]
    pub input: PathBuf,

    /// Output PNG path.
    #[arg(long, short = 'o', default_value = "perf_plot.png")]
    pub output: PathBuf,

    /// Open the written image in the system viewer (otherwise it is only saved).
    #[arg(long)]
    pub show: bool,
}

/// Arguments for the `bench` subcommand.
#[derive(Parser)]
pub struct BenchArgs {
    /// Benchmark results CSV.
    #[arg(long, short = 'i', default_value = "benchmark_results.csv")]
    pub input: PathBuf,

    /// Directory receiving one PNG per thread count.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Open the written images in the system viewer (otherwise they are only saved).
    #[arg(long)]
    pub show: bool,
}

/// Arguments for the `ranges` subcommand.
#[derive(Parser)]
pub struct RangesArgs {
    /// Element range owned by one thread; repeat once per thread.
    #[arg(
        long = "range",
        num_args = 2,
        value_names = ["START", "END"],
        required = true
    )]
    pub ranges: Vec<usize>,

    /// Output PNG path.
    #[arg(long, short = 'o', default_value = "false_sharing_ranges.png")]
    pub output: PathBuf,

    /// Open the written image in the system viewer (otherwise it is only saved).
    #[arg(long)]
    pub show: bool,
}

/// Arguments for the `detect` subcommand.
#[derive(Parser)]
pub struct DetectArgs {
    /// Total number of elements to split.
    #[arg(long)]
    pub elements: usize,

    /// Number of threads sharing the elements.
    #[arg(long)]
    pub threads: usize,

    /// Size of one element in bytes.
    #[arg(long, default_value = "4")]
    pub element_size: usize,

    /// Byte offset of element 0 from a cache-line boundary.
    #[arg(long, default_value = "0")]
    pub base_offset: usize,

    /// Also render the split as a range diagram to this PNG.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Open the rendered diagram in the system viewer (otherwise it is only saved).
    #[arg(long, requires = "output")]
    pub show: bool,
}
