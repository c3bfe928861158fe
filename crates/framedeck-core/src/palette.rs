//! Built-in eight-role color palettes.

use crate::primitive::SerializableColor;
use serde::{Deserialize, Serialize};

/// A named palette assigning a color to each visual role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPalette {
    pub name: String,
    /// Canvas and frame fill.
    pub background: SerializableColor,
    pub surface: SerializableColor,
    /// Titles.
    pub primary: SerializableColor,
    /// Body text and notes.
    pub secondary: SerializableColor,
    /// Bullets.
    pub accent: SerializableColor,
    /// Frame outlines.
    pub border: SerializableColor,
    pub code_background: SerializableColor,
    pub code_text: SerializableColor,
}

// name, background, surface, primary, secondary, accent, border, code background, code text
static BUILTIN: [[&str; 9]; ColorPalette::COUNT] = [
    ["xpres.so", "#FFFEF9", "#FAF8F3", "#2C3E50", "#5A6C7D", "#E67E22", "#2C3E5033", "#F8F5ED", "#D35400"],
    ["Dark Mode", "#1A1A1A", "#2D2D2D", "#F0F0F0", "#B8B8B8", "#00D9FF", "#F0F0F033", "#0D1117", "#58A6FF"],
    ["Ocean", "#E8F4F8", "#D1E9F0", "#1E3A5F", "#4A6FA5", "#00ACC1", "#1E3A5F33", "#C5E1E8", "#006064"],
    ["Forest", "#F5F3E9", "#E8E5D8", "#2D4A2B", "#4A6349", "#FF8F00", "#2D4A2B33", "#E0DCCA", "#6A4C93"],
    ["Sunset", "#FFF5F5", "#FFE8E8", "#8B2635", "#B85450", "#FF6B35", "#8B263533", "#FFDDD8", "#C73E1D"],
    ["Lavender", "#F8F5FF", "#EDE6FF", "#4A148C", "#7B1FA2", "#E91E63", "#4A148C33", "#E1D5F5", "#6A1B9A"],
    ["Corporate", "#F5F5F5", "#E8E8E8", "#212121", "#616161", "#1976D2", "#21212133", "#DEDEDE", "#0D47A1"],
    ["Cyberpunk", "#0A0A0A", "#1A0A1A", "#00FF00", "#00CC00", "#FF00FF", "#00FF0033", "#0D0D0D", "#FFFF00"],
    ["Paper", "#F4ECD8", "#EBE0C8", "#5D4037", "#795548", "#D84315", "#5D403733", "#E6D7C3", "#BF360C"],
    ["High Contrast", "#FFFFFF", "#F0F0F0", "#000000", "#333333", "#FF0000", "#00000033", "#E0E0E0", "#0000FF"],
];

impl ColorPalette {
    /// Number of built-in palettes.
    pub const COUNT: usize = 10;

    fn from_row(row: &[&str; 9]) -> Self {
        let color = |hex: &str| SerializableColor::from_hex(hex).unwrap_or(SerializableColor::black());
        Self {
            name: row[0].to_string(),
            background: color(row[1]),
            surface: color(row[2]),
            primary: color(row[3]),
            secondary: color(row[4]),
            accent: color(row[5]),
            border: color(row[6]),
            code_background: color(row[7]),
            code_text: color(row[8]),
        }
    }

    /// All built-in palettes in their canonical order.
    pub fn all() -> Vec<ColorPalette> {
        BUILTIN.iter().map(Self::from_row).collect()
    }

    /// Palette by exact name.
    pub fn by_name(name: &str) -> Option<ColorPalette> {
        BUILTIN.iter().find(|row| row[0] == name).map(Self::from_row)
    }

    /// Palette by index; any integer is accepted and wrapped modulo the count.
    pub fn by_index(index: i64) -> ColorPalette {
        let wrapped = (index.unsigned_abs() % Self::COUNT as u64) as usize;
        Self::from_row(&BUILTIN[wrapped])
    }

    /// Names of the built-in palettes.
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|row| row[0])
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::by_index(0)
    }
}
