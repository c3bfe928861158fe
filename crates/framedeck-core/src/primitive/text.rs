//! Text run primitive: one wrapped line of text.

use super::{PrimitiveId, PrimitiveStyle, PrimitiveTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font family options.
///
/// Discriminants match the numeric font ids of the Excalidraw format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Hand-drawn style font (default).
    #[default]
    Hand = 1,
    /// Clean sans-serif font.
    Normal = 2,
    /// Monospace font used for code.
    Code = 3,
}

impl FontFamily {
    /// Get the font family name as used by renderers.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Hand => "Virgil",
            FontFamily::Normal => "Helvetica",
            FontFamily::Code => "Cascadia",
        }
    }

    /// Numeric id used by the Excalidraw format.
    pub fn excalidraw_id(&self) -> u8 {
        *self as u8
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[FontFamily::Hand, FontFamily::Normal, FontFamily::Code]
    }
}

/// A single line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub(crate) id: PrimitiveId,
    /// Position (top-left corner of the line box).
    pub position: Point,
    /// The line content.
    pub content: String,
    /// Font size in canvas units.
    pub font_size: f64,
    /// Font family.
    pub font_family: FontFamily,
    /// Owning frame, by id.
    #[serde(default)]
    pub frame_id: Option<PrimitiveId>,
    /// Style properties (stroke color is the text color).
    pub style: PrimitiveStyle,
}

impl TextRun {
    /// Average glyph advance as a fraction of the font size.
    pub const CHAR_WIDTH_FACTOR: f64 = 0.6;
    /// Line box height as a fraction of the font size.
    pub const LINE_HEIGHT_FACTOR: f64 = 1.25;

    /// Create a new text run.
    pub fn new(position: Point, content: impl Into<String>, font_size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content: content.into(),
            font_size,
            font_family: FontFamily::default(),
            frame_id: None,
            style: PrimitiveStyle::default(),
        }
    }

    /// Set the font family.
    pub fn with_font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    /// Attach this run to a frame.
    pub fn in_frame(mut self, frame_id: PrimitiveId) -> Self {
        self.frame_id = Some(frame_id);
        self
    }

    /// Set the style.
    pub fn with_style(mut self, style: PrimitiveStyle) -> Self {
        self.style = style;
        self
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Approximate width based on character count and font size.
    pub fn width(&self) -> f64 {
        self.content.chars().count() as f64 * self.font_size * Self::CHAR_WIDTH_FACTOR
    }

    /// Height of the line box.
    pub fn height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT_FACTOR
    }
}

impl PrimitiveTrait for TextRun {
    fn id(&self) -> PrimitiveId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width(),
            self.position.y + self.height(),
        )
    }

    fn style(&self) -> &PrimitiveStyle {
        &self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_run_creation() {
        let run = TextRun::new(Point::new(100.0, 100.0), "Hello", 20.0);
        assert_eq!(run.content(), "Hello");
        assert!(run.frame_id.is_none());
        assert_eq!(run.font_family, FontFamily::Hand);
    }

    #[test]
    fn test_bounds_from_metrics() {
        let run = TextRun::new(Point::new(10.0, 10.0), "abcd", 10.0);
        let bounds = run.bounds();
        assert!((bounds.width() - 24.0).abs() < 1e-9);
        assert!((bounds.height() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_width_counts_chars_not_bytes() {
        let run = TextRun::new(Point::ZERO, "• a", 10.0);
        assert!((run.width() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_font_ids() {
        assert_eq!(FontFamily::Hand.excalidraw_id(), 1);
        assert_eq!(FontFamily::Code.excalidraw_id(), 3);
        assert_eq!(FontFamily::all().len(), 3);
    }
}
