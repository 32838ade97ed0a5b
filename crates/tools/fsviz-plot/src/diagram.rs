//! Cache-line range diagram.
//!
//! Draws a dashed box per cache line and one translucent rectangle per
//! thread range over a byte axis, using the placement computed by
//! [`ranges::layout`](crate::ranges::layout).

use std::path::Path;

use anyhow::{Context, Result};
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::PlotConfig;
use crate::fonts;
use crate::ranges::{RangeLayout, RangeRect};

/// Thread colors, cycled by position in the input list.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 128, 0),
    RGBColor(255, 0, 0),
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(23, 190, 207),
];

/// Dash and gap length of the cache-line outlines, in pixels.
const DASH_PX: u32 = 6;
const GAP_PX: u32 = 4;

/// Color for the range at position `thread`.
pub fn thread_color(thread: usize) -> RGBColor {
    PALETTE[thread % PALETTE.len()]
}

/// Legend text for one range.
pub fn range_label(rect: &RangeRect) -> String {
    format!(
        "Thread {}: elements {}\u{2013}{} (bytes {}\u{2013}{})",
        rect.thread,
        rect.range.start(),
        rect.range.end().saturating_sub(1),
        rect.byte_start,
        rect.byte_end,
    )
}

#[allow(clippy::cast_precision_loss)]
fn draw_layout(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    layout: &RangeLayout,
    element_size: usize,
    font: &str,
) -> Result<()> {
    let x_max = layout.max_extent.max(layout.line_size) as f64;
    let line = layout.line_size as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!(
                "False Sharing with {element_size}-byte elements \u{2013} Cache Line Overlap"
            ),
            (font, 20),
        )
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(0.0..x_max, 0.0..1.3)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(layout.lines.len() + 1)
        .x_label_formatter(&|x| format!("{x:.0}"))
        .x_desc("Memory Address Space (Bytes)")
        .label_style((font, 12))
        .axis_desc_style((font, 14))
        .draw()?;

    for lb in &layout.lines {
        let x0 = lb.start as f64;
        let x1 = x0 + line;
        chart.draw_series(std::iter::once(DashedPathElement::new(
            vec![(x0, 0.0), (x1, 0.0), (x1, 1.0), (x0, 1.0), (x0, 0.0)],
            DASH_PX,
            GAP_PX,
            BLACK.mix(0.45).stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("Cache Line {}", lb.index),
            (x0 + line / 2.0, 1.05),
            (font, 12)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom)),
        )))?;
    }

    for rect in &layout.rects {
        let color = thread_color(rect.thread);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (rect.byte_start as f64, rect.y),
                    (rect.byte_end as f64, rect.y + rect.height),
                ],
                color.mix(0.5).filled(),
            )))?
            .label(range_label(rect))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.5).filled()));
    }

    if !layout.rects.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((font, 12))
            .draw()?;
    }
    Ok(())
}

/// Render a range layout to a PNG at `path`.
pub fn render_range_diagram(
    layout: &RangeLayout,
    element_size: usize,
    path: &Path,
    config: &PlotConfig,
) -> Result<()> {
    fonts::install(config)?;

    let root = BitMapBackend::new(path, config.diagram.dims()).into_drawing_area();
    root.fill(&WHITE)?;
    draw_layout(&root, layout, element_size, &config.font).context("drawing range diagram")?;
    root.present()
        .with_context(|| format!("writing diagram to {}", path.display()))?;

    println!("Diagram saved to {}", path.display());
    Ok(())
}
