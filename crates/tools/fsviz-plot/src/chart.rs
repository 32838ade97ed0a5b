//! Grouped bar charts for benchmark results.
//!
//! A chart is one or more [`Panel`]s stacked vertically. Each panel draws
//! its series as bars offset around every category tick, a value label above
//! each bar, and a warning glyph above bars whose companion flag is set.
//! Bar and label placement is computed by [`Panel::bars`] and friends; the
//! `render_*` functions only hand that geometry to plotters.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::PlotConfig;
use crate::fonts;
use crate::table::{self, BenchmarkRow, MetricTable};
use crate::units;

/// Width of one bar in category units.
pub const BAR_WIDTH: f64 = 0.35;

/// Glyph drawn above bars flagged for false sharing.
pub const WARNING_GLYPH: &str = "\u{26a0}";

/// Aligned series color.
pub const ALIGNED_COLOR: RGBColor = RGBColor(0, 128, 0);

/// Misaligned series color.
pub const MISALIGNED_COLOR: RGBColor = RGBColor(255, 0, 0);

/// Headroom above the tallest bar, as a fraction of its height.
const HEADROOM: f64 = 1.15;

/// Gap between a bar's label and its warning glyph, as a fraction of the y-range.
const MARKER_LIFT: f64 = 0.06;

const TITLE_FONT_SIZE: u32 = 24;
const AXIS_FONT_SIZE: u32 = 16;
const LABEL_FONT_SIZE: u32 = 12;
const MARKER_FONT_SIZE: u32 = 18;

/// One bar series within a panel.
#[derive(Debug, Clone)]
pub struct BarSeries {
    /// Legend entry.
    pub name: String,
    /// Fill color.
    pub color: RGBColor,
    /// Bar heights, one per category.
    pub values: Vec<f64>,
    /// Text drawn above each bar.
    pub labels: Vec<String>,
    /// Bars that get a warning glyph.
    pub markers: Vec<bool>,
}

/// A single set of axes with grouped bars.
#[derive(Debug, Clone)]
pub struct Panel {
    /// Panel caption.
    pub title: String,
    /// Y axis description.
    pub y_desc: String,
    /// X axis description, if any.
    pub x_desc: Option<String>,
    /// Category tick labels.
    pub categories: Vec<String>,
    /// Series drawn side by side at each category.
    pub series: Vec<BarSeries>,
    /// Fixed top of the y-range; derived from the data when `None`.
    pub y_max: Option<f64>,
    /// Fill opacity.
    pub opacity: f64,
    /// Distance between a bar top and its label, in y units.
    pub label_offset: f64,
}

/// Rectangle for one bar, in chart coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Index of the series in [`Panel::series`].
    pub series: usize,
    /// Index of the category.
    pub category: usize,
    /// Left edge.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Bar height.
    pub height: f64,
}

impl Bar {
    /// Horizontal center.
    pub fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// Center of the bar for `series` of `series_count` at `category`.
///
/// Bars are spread symmetrically around the tick: with two series they sit
/// at `category - BAR_WIDTH / 2` and `category + BAR_WIDTH / 2`.
#[allow(clippy::cast_precision_loss)]
pub fn bar_center(category: usize, series: usize, series_count: usize) -> f64 {
    let shift = series as f64 - (series_count.max(1) as f64 - 1.0) / 2.0;
    category as f64 + shift * BAR_WIDTH
}

impl Panel {
    /// Top of the y-range.
    pub fn y_upper(&self) -> f64 {
        if let Some(max) = self.y_max {
            return max;
        }
        let max = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        if max > 0.0 { max * HEADROOM } else { 1.0 }
    }

    /// Every bar, series by series in category order.
    pub fn bars(&self) -> Vec<Bar> {
        let count = self.series.len();
        self.series
            .iter()
            .enumerate()
            .flat_map(|(series, s)| {
                s.values.iter().enumerate().map(move |(category, &height)| {
                    let center = bar_center(category, series, count);
                    Bar {
                        series,
                        category,
                        left: center - BAR_WIDTH / 2.0,
                        right: center + BAR_WIDTH / 2.0,
                        height,
                    }
                })
            })
            .collect()
    }

    /// Anchor (bottom center) of the value label above `bar`.
    pub fn label_anchor(&self, bar: &Bar) -> (f64, f64) {
        (bar.center(), bar.height + self.label_offset)
    }

    /// Anchor of the warning glyph above `bar`, or `None` if it is not flagged.
    pub fn marker_anchor(&self, bar: &Bar) -> Option<(f64, f64)> {
        let flagged = self.series[bar.series]
            .markers
            .get(bar.category)
            .copied()
            .unwrap_or(false);
        flagged.then(|| {
            let (x, y) = self.label_anchor(bar);
            (x, y + MARKER_LIFT * self.y_upper())
        })
    }
}

/// Panel for the aligned-vs-misaligned metric table.
///
/// Heights go through [`units::scale`]; labels show the raw value.
pub fn metric_panel(table: &MetricTable) -> Panel {
    let series = |s: &crate::series::MetricSeries, color| BarSeries {
        name: s.name().to_string(),
        color,
        values: units::scale_all(s.values()),
        labels: s.values().iter().copied().map(units::display_label).collect(),
        markers: Vec::new(),
    };
    Panel {
        title: "False Sharing: Aligned vs Misaligned Performance".into(),
        y_desc: "Count (Millions) or Seconds".into(),
        x_desc: None,
        categories: table.metrics().to_vec(),
        series: vec![
            series(&table.aligned, ALIGNED_COLOR),
            series(&table.misaligned, MISALIGNED_COLOR),
        ],
        y_max: None,
        opacity: 1.0,
        label_offset: 0.0,
    }
}

fn offsets(rows: &[&BenchmarkRow]) -> Vec<String> {
    rows.iter().map(|r| r.offset.to_string()).collect()
}

/// Timing panel for one thread count, flagging runs that shared cache lines.
pub fn timing_panel(threads: u32, rows: &[&BenchmarkRow]) -> Panel {
    let series = |name: &str, color, time: fn(&BenchmarkRow) -> f64, flag: fn(&BenchmarkRow) -> bool| {
        BarSeries {
            name: name.into(),
            color,
            values: rows.iter().map(|r| time(r)).collect(),
            labels: rows.iter().map(|r| format!("{:.5}", time(r))).collect(),
            markers: rows.iter().map(|r| flag(r)).collect(),
        }
    };
    Panel {
        title: format!("Vector Arithmetic Performance (Threads={threads})"),
        y_desc: "Time (seconds)".into(),
        x_desc: None,
        categories: offsets(rows),
        series: vec![
            series("Aligned", ALIGNED_COLOR, |r| r.aligned_time, |r| r.aligned_false_sharing),
            series(
                "Misaligned",
                MISALIGNED_COLOR,
                |r| r.misaligned_time,
                |r| r.misaligned_false_sharing,
            ),
        ],
        y_max: None,
        opacity: 0.7,
        label_offset: 0.0,
    }
}

/// Boolean false-sharing panel for one thread count.
pub fn indicator_panel(threads: u32, rows: &[&BenchmarkRow]) -> Panel {
    let series = |name: &str, color, flag: fn(&BenchmarkRow) -> bool| BarSeries {
        name: name.into(),
        color,
        values: rows.iter().map(|r| if flag(r) { 1.0 } else { 0.0 }).collect(),
        labels: rows
            .iter()
            .map(|r| (if flag(r) { "Yes" } else { "No" }).to_string())
            .collect(),
        markers: Vec::new(),
    };
    Panel {
        title: format!("False Sharing Detection (Threads={threads})"),
        y_desc: "False Sharing (0=No, 1=Yes)".into(),
        x_desc: Some("Offset (bytes)".into()),
        categories: offsets(rows),
        series: vec![
            series("Aligned", ALIGNED_COLOR, |r| r.aligned_false_sharing),
            series("Misaligned", MISALIGNED_COLOR, |r| r.misaligned_false_sharing),
        ],
        y_max: Some(1.2),
        opacity: 0.7,
        label_offset: 0.05,
    }
}

/// File name for the chart of one thread count.
pub fn benchmark_chart_path(dir: &Path, threads: u32) -> PathBuf {
    dir.join(format!("vec_benchmark_threads_{threads}_with_false_sharing.png"))
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn draw_panel(area: &DrawingArea<BitMapBackend<'_>, Shift>, panel: &Panel, font: &str) -> Result<()> {
    let n = panel.categories.len();
    let y_upper = panel.y_upper();

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (font, TITLE_FONT_SIZE))
        .margin(16)
        .x_label_area_size(if panel.x_desc.is_some() { 56 } else { 40 })
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_upper)?;

    let categories = &panel.categories;
    let format_x = |x: &f64| {
        let idx = x.round();
        if idx >= 0.0 && (x - idx).abs() < 0.3 {
            categories.get(idx as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&format_x)
        .light_line_style(WHITE)
        .bold_line_style(BLACK.mix(0.15))
        .y_desc(panel.y_desc.as_str())
        .label_style((font, LABEL_FONT_SIZE + 2))
        .axis_desc_style((font, AXIS_FONT_SIZE));
    if let Some(desc) = &panel.x_desc {
        mesh.x_desc(desc.as_str());
    }
    mesh.draw()?;

    let bars = panel.bars();
    let label_style = (font, LABEL_FONT_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let marker_style = (font, MARKER_FONT_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));

    for (idx, series) in panel.series.iter().enumerate() {
        let (color, opacity) = (series.color, panel.opacity);
        let own = || bars.iter().filter(move |b| b.series == idx);

        chart
            .draw_series(own().map(|b| {
                Rectangle::new([(b.left, 0.0), (b.right, b.height)], color.mix(opacity).filled())
            }))?
            .label(series.name.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(opacity).filled())
            });

        chart.draw_series(own().zip(&series.labels).map(|(b, text)| {
            Text::new(text.clone(), panel.label_anchor(b), label_style.clone())
        }))?;

        chart.draw_series(own().filter_map(|b| {
            panel
                .marker_anchor(b)
                .map(|at| Text::new(WARNING_GLYPH, at, marker_style.clone()))
        }))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((font, LABEL_FONT_SIZE + 2))
        .draw()?;

    Ok(())
}

/// Draw `panels` stacked top to bottom into a PNG at `path`.
fn render_panels(panels: &[Panel], path: &Path, size: (u32, u32), font: &str) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((panels.len().max(1), 1));
    for (area, panel) in areas.iter().zip(panels) {
        draw_panel(area, panel, font)
            .with_context(|| format!("drawing panel '{}'", panel.title))?;
    }

    root.present()
        .with_context(|| format!("writing chart to {}", path.display()))
}

/// Run `write` for every job in order. If one fails, files written by the
/// earlier jobs are removed before the error is returned.
fn write_all<T>(
    jobs: &[(PathBuf, T)],
    mut write: impl FnMut(&Path, &T) -> Result<()>,
) -> Result<Vec<PathBuf>> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(jobs.len());
    for (path, job) in jobs {
        if let Err(err) = write(path, job) {
            for done in &written {
                let _ = std::fs::remove_file(done);
            }
            return Err(err);
        }
        written.push(path.clone());
    }
    Ok(written)
}

/// Render the aligned-vs-misaligned metric chart.
pub fn render_metric_chart(table: &MetricTable, path: &Path, config: &PlotConfig) -> Result<()> {
    fonts::install(config)?;
    render_panels(&[metric_panel(table)], path, config.metrics.dims(), &config.font)?;
    println!("  Chart written to {}", path.display());
    Ok(())
}

/// Render one chart per distinct thread count into `dir`, ascending by thread count.
///
/// Each chart holds the timing and false-sharing panels of its group. Either
/// every chart is written or none is left behind.
pub fn render_benchmark_charts(
    rows: &[BenchmarkRow],
    dir: &Path,
    config: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    let jobs: Vec<(PathBuf, [Panel; 2])> = table::group_by_threads(rows)
        .into_iter()
        .map(|(threads, group)| {
            (
                benchmark_chart_path(dir, threads),
                [timing_panel(threads, &group), indicator_panel(threads, &group)],
            )
        })
        .collect();

    fonts::install(config)?;
    let written = write_all(&jobs, |path, panels| {
        render_panels(panels, path, config.bench.dims(), &config.font)
    })?;
    for path in &written {
        println!("  Chart written to {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(offset: u64, aligned: f64, misaligned: f64, fs: (bool, bool)) -> BenchmarkRow {
        BenchmarkRow {
            threads: 4,
            offset,
            aligned_time: aligned,
            misaligned_time: misaligned,
            speedup: misaligned / aligned,
            aligned_false_sharing: fs.0,
            misaligned_false_sharing: fs.1,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn two_series_straddle_the_tick() {
        assert!(close(bar_center(0, 0, 2), -0.175));
        assert!(close(bar_center(0, 1, 2), 0.175));
        assert!(close(bar_center(3, 1, 2), 3.175));
        assert!(close(bar_center(2, 0, 1), 2.0));
    }

    #[test]
    fn metric_panel_scales_heights_and_keeps_raw_labels() {
        let table = table::read_metric_table("metric_a,metric_b\n1.5,2000000\n3.5,500000\n".as_bytes())
            .unwrap();
        let panel = metric_panel(&table);
        assert_eq!(panel.categories, vec!["metric_a", "metric_b"]);
        assert_eq!(panel.series[0].values, vec![1.5, 2.0]);
        assert_eq!(panel.series[1].values, vec![3.5, 0.5]);
        assert_eq!(panel.series[0].labels, vec!["1.50000", "2.00M"]);
        assert_eq!(panel.series[1].labels, vec!["3.50000", "0.50M"]);
        assert!(close(panel.y_upper(), 3.5 * 1.15));
    }

    #[test]
    fn bars_follow_series_then_category() {
        let rows = [row(0, 0.01, 0.02, (false, false)), row(4, 0.01, 0.03, (false, true))];
        let refs: Vec<&BenchmarkRow> = rows.iter().collect();
        let panel = timing_panel(4, &refs);
        let bars = panel.bars();
        assert_eq!(bars.len(), 4);
        assert_eq!((bars[1].series, bars[1].category), (0, 1));
        assert_eq!((bars[2].series, bars[2].category), (1, 0));
        assert!(close(bars[3].right - bars[3].left, BAR_WIDTH));
        assert!(close(bars[3].height, 0.03));
    }

    #[test]
    fn markers_only_on_flagged_bars() {
        let rows = [row(0, 0.01, 0.02, (false, false)), row(4, 0.01, 0.03, (false, true))];
        let refs: Vec<&BenchmarkRow> = rows.iter().collect();
        let panel = timing_panel(4, &refs);
        let flagged: Vec<(usize, usize)> = panel
            .bars()
            .iter()
            .filter(|b| panel.marker_anchor(b).is_some())
            .map(|b| (b.series, b.category))
            .collect();
        assert_eq!(flagged, vec![(1, 1)]);
        assert_eq!(panel.series[1].labels, vec!["0.02000", "0.03000"]);
        assert_eq!(panel.categories, vec!["0", "4"]);
    }

    #[test]
    fn marker_sits_above_label() {
        let rows = [row(8, 0.01, 0.02, (true, false))];
        let refs: Vec<&BenchmarkRow> = rows.iter().collect();
        let panel = timing_panel(2, &refs);
        let bar = panel.bars()[0];
        let (_, label_y) = panel.label_anchor(&bar);
        let (_, marker_y) = panel.marker_anchor(&bar).unwrap();
        assert!(marker_y > label_y);
    }

    #[test]
    fn indicator_panel_uses_yes_no() {
        let rows = [row(0, 0.01, 0.02, (false, true))];
        let refs: Vec<&BenchmarkRow> = rows.iter().collect();
        let panel = indicator_panel(8, &refs);
        assert_eq!(panel.series[0].values, vec![0.0]);
        assert_eq!(panel.series[1].values, vec![1.0]);
        assert_eq!(panel.series[0].labels, vec!["No"]);
        assert_eq!(panel.series[1].labels, vec!["Yes"]);
        assert!(close(panel.y_upper(), 1.2));
        let bar = panel.bars()[1];
        assert!(close(panel.label_anchor(&bar).1, 1.05));
        assert_eq!(panel.title, "False Sharing Detection (Threads=8)");
    }

    #[test]
    fn empty_panel_has_unit_range() {
        let panel = timing_panel(1, &[]);
        assert!(panel.bars().is_empty());
        assert!(close(panel.y_upper(), 1.0));
    }

    #[test]
    fn chart_path_names_thread_count() {
        let path = benchmark_chart_path(Path::new("out"), 16);
        assert_eq!(
            path,
            Path::new("out").join("vec_benchmark_threads_16_with_false_sharing.png")
        );
    }

    #[test]
    fn non_finite_values_do_not_stretch_the_axis() {
        let rows = [row(0, 0.01, f64::INFINITY, (false, false)), row(4, f64::NAN, 0.02, (false, false))];
        let refs: Vec<&BenchmarkRow> = rows.iter().collect();
        let panel = timing_panel(2, &refs);
        assert!(close(panel.y_upper(), 0.02 * 1.15));
    }

    #[test]
    fn failed_chart_removes_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let jobs: Vec<(PathBuf, u32)> = [2, 4, 8]
            .into_iter()
            .map(|threads| (benchmark_chart_path(dir.path(), threads), threads))
            .collect();

        let err = write_all(&jobs, |path, &threads| {
            if threads == 8 {
                anyhow::bail!("render failed");
            }
            std::fs::write(path, b"png")?;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "render failed");
        assert!(jobs.iter().all(|(path, _)| !path.exists()));

        let written = write_all(&jobs, |path, _| Ok(std::fs::write(path, b"png")?)).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|path| path.exists()));
    }
}
