//! Abstract slide model, independent of any visual representation.

use serde::{Deserialize, Serialize};

/// A fenced code block captured from a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag (`"text"` when the fence carries none).
    pub language: String,
    /// Verbatim code, lines joined by `\n`.
    pub content: String,
}

/// One slide's semantic content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body paragraphs.
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
}

impl Slide {
    /// A slide is kept only if it has a title, body text, bullets or code.
    pub fn has_content(&self) -> bool {
        self.title.is_some()
            || !self.content.is_empty()
            || self.bullets.is_some()
            || self.code.is_some()
    }

    /// Display name for the slide at `index` (0-based).
    pub fn display_name(&self, index: usize) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("Slide {}", index + 1),
        }
    }
}
