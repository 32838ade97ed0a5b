//! Font registration for text rendering.
//!
//! Text is rasterized with plotters' built-in glyph renderer, which only
//! knows fonts registered by family name. [`install`] loads one TrueType
//! file and registers it under the configured family.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow, bail};
use plotters::style::{FontStyle, register_font};

use crate::config::PlotConfig;

/// Fonts tried, in order, when no `font_path` is configured.
pub const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static INSTALLED: OnceLock<PathBuf> = OnceLock::new();

/// First existing file among `candidates`.
pub fn find_font<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<&'a Path> {
    candidates.into_iter().find(|p| p.is_file())
}

/// Register the configured (or first available system) font under
/// `config.font`. Later calls return the path registered first.
pub fn install(config: &PlotConfig) -> Result<&'static Path> {
    if let Some(path) = INSTALLED.get() {
        return Ok(path.as_path());
    }

    let path = match &config.font_path {
        Some(path) => path.clone(),
        None => find_font(SYSTEM_FONTS.iter().map(Path::new))
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("no TrueType font found; set font_path in fsviz.toml"))?,
    };

    let bytes = std::fs::read(&path).with_context(|| format!("reading font {}", path.display()))?;
    // Registered fonts must live for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    for style in [FontStyle::Normal, FontStyle::Bold] {
        if register_font(&config.font, style, bytes).is_err() {
            bail!("{} is not a usable TrueType font", path.display());
        }
    }

    Ok(INSTALLED.get_or_init(|| path).as_path())
}
