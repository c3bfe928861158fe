//! Generation options.

use crate::palette::ColorPalette;
use crate::primitive::FontFamily;
use serde::{Deserialize, Serialize};

/// Geometry, typography and palette for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorOptions {
    pub slide_width: f64,
    pub slide_height: f64,
    /// Gap between neighbouring slides, both axes.
    pub slide_spacing: f64,
    /// Slides per grid row.
    pub grid_cols: usize,
    pub title_font_size: f64,
    pub content_font_size: f64,
    pub bullet_font_size: f64,
    pub code_font_size: f64,
    /// Family for everything except code.
    pub font_family: FontFamily,
    /// Word-wrap budget in characters.
    pub wrap_width: usize,
    pub palette: ColorPalette,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            slide_width: 1200.0,
            slide_height: 800.0,
            slide_spacing: 200.0,
            grid_cols: 5,
            title_font_size: 48.0,
            content_font_size: 32.0,
            bullet_font_size: 28.0,
            code_font_size: 24.0,
            font_family: FontFamily::Hand,
            wrap_width: crate::wrap::DEFAULT_WRAP_WIDTH,
            palette: ColorPalette::default(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_grid_cols(mut self, cols: usize) -> Self {
        self.grid_cols = cols;
        self
    }

    /// Column count, never zero.
    pub fn columns(&self) -> usize {
        self.grid_cols.max(1)
    }

    /// Horizontal distance between slide origins.
    pub fn column_pitch(&self) -> f64 {
        self.slide_width + self.slide_spacing
    }

    /// Vertical distance between slide origins.
    pub fn row_pitch(&self) -> f64 {
        self.slide_height + self.slide_spacing
    }
}
