//! Frame primitive: the named rectangle that groups a slide's content.

use super::{PrimitiveId, PrimitiveStyle, PrimitiveTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named rectangular frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub(crate) id: PrimitiveId,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the frame.
    pub width: f64,
    /// Height of the frame.
    pub height: f64,
    /// Display name (slide title or a synthesized label).
    #[serde(default)]
    pub name: Option<String>,
    /// Style properties.
    pub style: PrimitiveStyle,
}

impl Frame {
    /// Create a new frame.
    pub fn new(position: Point, width: f64, height: f64, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            name: Some(name.into()),
            style: PrimitiveStyle::default(),
        }
    }

    /// Create a frame without a name (as drawn by hand on the canvas).
    pub fn unnamed(position: Point, width: f64, height: f64) -> Self {
        Self {
            name: None,
            ..Self::new(position, width, height, String::new())
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: PrimitiveStyle) -> Self {
        self.style = style;
        self
    }

    /// Get the frame as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

impl PrimitiveTrait for Frame {
    fn id(&self) -> PrimitiveId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn style(&self) -> &PrimitiveStyle {
        &self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(Point::new(10.0, 20.0), 100.0, 50.0, "Intro");
        assert!((frame.position.x - 10.0).abs() < f64::EPSILON);
        assert!((frame.position.y - 20.0).abs() < f64::EPSILON);
        assert_eq!(frame.name.as_deref(), Some("Intro"));
    }

    #[test]
    fn test_bounds() {
        let frame = Frame::new(Point::new(10.0, 20.0), 100.0, 50.0, "Intro");
        let bounds = frame.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 110.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unnamed() {
        let frame = Frame::unnamed(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(frame.name.is_none());
        assert_eq!(frame.as_rect(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }
}
