//! Figure configuration.
//!
//! Deserialized from an optional `fsviz.toml`:
//!
//! ```toml
//! font = "sans-serif"
//! font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
//!
//! [metrics]
//! width = 1200
//! height = 600
//!
//! [bench]
//! width = 1200
//! height = 1000
//!
//! [diagram]
//! width = 1200
//! height = 300
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "fsviz.toml";

/// Pixel dimensions of one output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FigureSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FigureSize {
    /// `(width, height)` as plotters expects it.
    pub fn dims(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Top-level figure configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Font family for all text.
    pub font: String,
    /// TrueType file registered under [`font`](Self::font); a system font
    /// is searched for when unset.
    pub font_path: Option<PathBuf>,
    /// Aligned-vs-misaligned metric chart.
    pub metrics: FigureSize,
    /// Two-panel per-thread-count benchmark chart.
    pub bench: FigureSize,
    /// Cache-line range diagram.
    pub diagram: FigureSize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            font: "sans-serif".into(),
            font_path: None,
            metrics: FigureSize {
                width: 1200,
                height: 600,
            },
            bench: FigureSize {
                width: 1200,
                height: 1000,
            },
            diagram: FigureSize {
                width: 1200,
                height: 300,
            },
        }
    }
}

impl PlotConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse figure configuration")
    }

    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("in {}", path.display()))
    }

    /// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
