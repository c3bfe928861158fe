//! Model-assisted structuring with unconditional fallback to the grammar parser.

use super::grammar::{DEFAULT_CODE_LANGUAGE, SlideParser};
use crate::slide::{CodeBlock, Slide};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future for collaborator calls (single-threaded, so no `Send` bound).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Failures of a structuring collaborator.
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    #[error("{provider} credential is not configured")]
    MissingCredential { provider: &'static str },
    #[error("{provider} request failed with HTTP {status}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} transport error: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned malformed JSON: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} response has no usable slides: {reason}")]
    InvalidShape {
        provider: &'static str,
        reason: String,
    },
}

/// Result type for structuring calls.
pub type RemoteResult<T> = Result<T, RemoteServiceError>;

/// Code block as returned by a structuring collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredCode {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// One slide as returned by a structuring collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSlide {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<String>>,
    #[serde(default)]
    pub bullets: Option<Vec<String>>,
    #[serde(default)]
    pub code: Option<StructuredCode>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub visual_description: Option<String>,
}

/// How a provider fills gaps in the slides it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideDefaults {
    /// Title given to slides that come back without one.
    pub untitled: Option<&'static str>,
    /// Language given to code blocks that come back without one.
    pub code_language: &'static str,
}

impl Default for SlideDefaults {
    fn default() -> Self {
        Self {
            untitled: None,
            code_language: DEFAULT_CODE_LANGUAGE,
        }
    }
}

impl StructuredSlide {
    /// Normalize into the abstract slide model.
    ///
    /// Blank strings become absent, empty bullet lists are dropped and code
    /// without content is dropped.
    pub fn into_slide(self, defaults: SlideDefaults) -> Slide {
        let non_blank = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        let title = self
            .title
            .and_then(non_blank)
            .or_else(|| defaults.untitled.map(str::to_string));
        let content = self
            .content
            .unwrap_or_default()
            .into_iter()
            .filter_map(non_blank)
            .collect();
        let bullets = self
            .bullets
            .map(|items| items.into_iter().filter_map(non_blank).collect::<Vec<_>>())
            .filter(|items| !items.is_empty());
        let code = self.code.and_then(|code| {
            let content = code.content.filter(|c| !c.trim().is_empty())?;
            let language = code
                .language
                .and_then(non_blank)
                .unwrap_or_else(|| defaults.code_language.to_string());
            Some(CodeBlock { language, content })
        });

        Slide {
            title,
            content,
            bullets,
            code,
            notes: self.notes.and_then(non_blank),
            image: None,
            visual_description: self.visual_description.and_then(non_blank),
        }
    }
}

/// A structured presentation as returned by a collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDeck {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub slides: Vec<StructuredSlide>,
}

/// Capability interface of a remote structuring collaborator.
pub trait StructuringProvider {
    /// Short provider name for logs and errors.
    fn name(&self) -> &'static str;

    /// Whether a credential is configured.
    fn available(&self) -> bool;

    /// How gaps in returned slides are filled.
    fn slide_defaults(&self) -> SlideDefaults {
        SlideDefaults::default()
    }

    /// Convert raw text into a structured deck.
    fn structure_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, RemoteResult<StructuredDeck>>;
}

/// Parses text through a structuring collaborator, falling back to the
/// grammar parser on any failure.
pub struct AssistedParser<'p> {
    grammar: SlideParser,
    provider: Option<&'p dyn StructuringProvider>,
}

impl<'p> AssistedParser<'p> {
    /// Create an assisted parser. `None` means grammar parsing only.
    pub fn new(grammar: SlideParser, provider: Option<&'p dyn StructuringProvider>) -> Self {
        Self { grammar, provider }
    }

    /// Grammar parsing only.
    pub fn grammar_only(grammar: SlideParser) -> Self {
        Self::new(grammar, None)
    }

    /// Parse `text` into slides. Never fails; remote errors are logged.
    pub async fn parse(&self, text: &str) -> Vec<Slide> {
        let Some(provider) = self.provider else {
            return self.grammar.parse(text);
        };
        if !provider.available() {
            log::info!(
                "{} is not configured; using the grammar parser",
                provider.name()
            );
            return self.grammar.parse(text);
        }

        match self.structure(provider, text).await {
            Ok(slides) => {
                log::debug!("{} produced {} slide(s)", provider.name(), slides.len());
                slides
            }
            Err(err) => {
                log::warn!("Structuring failed, falling back to grammar parser: {err}");
                self.grammar.parse(text)
            }
        }
    }

    async fn structure(
        &self,
        provider: &dyn StructuringProvider,
        text: &str,
    ) -> RemoteResult<Vec<Slide>> {
        let deck = provider.structure_text(text).await?;
        let defaults = provider.slide_defaults();
        let slides: Vec<Slide> = deck
            .slides
            .into_iter()
            .map(|slide| slide.into_slide(defaults))
            .filter(Slide::has_content)
            .collect();

        if slides.is_empty() {
            return Err(RemoteServiceError::InvalidShape {
                provider: provider.name(),
                reason: "no slide carried any content".to_string(),
            });
        }
        Ok(slides)
    }
}
