//! Drawable primitives placed on the canvas.

mod frame;
mod text;

pub use frame::Frame;
pub use text::{FontFamily, TextRun};

use kurbo::Rect;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a CSS-style hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`) or `transparent`.
    ///
    /// Returns `None` for anything else.
    pub fn from_hex(color: &str) -> Option<Self> {
        let color = color.trim();
        if color.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }

        let hex = color.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(0..1)? * 17;
                let g = channel(1..2)? * 17;
                let b = channel(2..3)? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by all primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveStyle {
    /// Stroke (or text) color.
    pub stroke_color: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Seed carried into interchange formats that render hand-drawn strokes.
    #[serde(default = "generate_seed")]
    pub seed: u32,
}

fn default_opacity() -> f64 {
    1.0
}

/// Generate a seed for new primitives.
/// Uses a counter + hash approach that works on all platforms including WASM.
fn generate_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    // splitmix32-style mixing
    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

impl PrimitiveStyle {
    /// Style for a stroked shape with an optional fill.
    pub fn stroked(stroke: SerializableColor, fill: Option<SerializableColor>) -> Self {
        Self {
            stroke_color: stroke,
            fill_color: fill,
            ..Self::default()
        }
    }

    /// Stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }
}

impl Default for PrimitiveStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
            seed: generate_seed(),
        }
    }
}

/// Unique identifier for primitives.
pub type PrimitiveId = Uuid;

/// Common behaviour of every drawable primitive.
pub trait PrimitiveTrait {
    /// Get the unique identifier.
    fn id(&self) -> PrimitiveId;

    /// Get the bounding box in world coordinates.
    fn bounds(&self) -> Rect;

    /// Get the style.
    fn style(&self) -> &PrimitiveStyle;
}

/// Enum wrapper for all primitive types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Frame(Frame),
    Text(TextRun),
}

impl Primitive {
    pub fn id(&self) -> PrimitiveId {
        match self {
            Primitive::Frame(f) => f.id(),
            Primitive::Text(t) => t.id(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Primitive::Frame(f) => f.bounds(),
            Primitive::Text(t) => t.bounds(),
        }
    }

    pub fn style(&self) -> &PrimitiveStyle {
        match self {
            Primitive::Frame(f) => f.style(),
            Primitive::Text(t) => t.style(),
        }
    }

    /// Check if this primitive is a frame.
    pub fn is_frame(&self) -> bool {
        matches!(self, Primitive::Frame(_))
    }

    /// Get the frame if this primitive is a frame.
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Primitive::Frame(f) => Some(f),
            _ => None,
        }
    }

    /// Get the text run if this primitive is a text run.
    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Primitive::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The owning frame declared by this primitive, if any.
    pub fn frame_ref(&self) -> Option<PrimitiveId> {
        match self {
            Primitive::Frame(_) => None,
            Primitive::Text(t) => t.frame_id,
        }
    }

    /// Finite coordinates and a strictly positive size.
    pub fn is_well_formed(&self) -> bool {
        let b = self.bounds();
        [b.x0, b.y0, b.x1, b.y1].iter().all(|v| v.is_finite())
            && b.width() > 0.0
            && b.height() > 0.0
    }
}
