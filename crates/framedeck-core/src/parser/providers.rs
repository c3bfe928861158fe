//! Concrete structuring collaborators.
//!
//! Both providers build a fixed instruction prompt, hand the HTTP exchange to
//! an injected [`CompletionTransport`] and unwrap their provider-specific
//! response envelope before validating the deck JSON.

use super::remote::{
    BoxFuture, RemoteResult, RemoteServiceError, SlideDefaults, StructuredDeck,
    StructuringProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Placeholder credential shipped in sample environment files.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Environment variable holding the Grok credential.
pub const XAI_API_KEY_VAR: &str = "XAI_API_KEY";
/// Environment variable holding the Gemini credential.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// An outgoing JSON POST request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

/// The raw response to a [`CompletionRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub status: u16,
    pub body: String,
}

impl CompletionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the HTTP exchange for a provider.
///
/// Errors are plain messages; providers wrap them in [`RemoteServiceError`].
pub trait CompletionTransport {
    fn send<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> BoxFuture<'a, Result<CompletionResponse, String>>;
}

/// Credential and endpoint for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn grok(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: "grok-4-fast-reasoning".to_string(),
            base_url: "https://api.x.ai".to_string(),
        }
    }

    pub fn gemini(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    /// Grok configuration with the key read from `XAI_API_KEY`.
    pub fn grok_from_env() -> Self {
        Self::grok(std::env::var(XAI_API_KEY_VAR).ok())
    }

    /// Gemini configuration with the key read from `GEMINI_API_KEY`.
    pub fn gemini_from_env() -> Self {
        Self::gemini(std::env::var(GEMINI_API_KEY_VAR).ok())
    }

    /// The configured key, unless blank or the placeholder.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }
}

const DECK_SHAPE: &str = r#"{
  "title": "Presentation title",
  "theme": "light, dark or colorful",
  "slides": [
    {
      "title": "Slide title",
      "content": ["paragraph"],
      "bullets": ["bullet point"],
      "code": { "language": "language name", "content": "code" },
      "notes": "speaker notes",
      "visualDescription": "description of visual elements"
    }
  ]
}"#;

/// Instruction prompt shared by both providers.
pub fn structuring_prompt(text: &str) -> String {
    format!(
        "Convert the following text into a structured slide presentation.\n\
         Respond with a single JSON object only, with no markdown and no commentary, \
         in exactly this shape:\n\n{DECK_SHAPE}\n\n\
         Guidelines:\n\
         - Split the material into focused slides, typically between 5 and 15.\n\
         - Give every slide a title.\n\
         - Use bullets for lists and key points.\n\
         - Preserve code snippets with their language.\n\
         - Add speaker notes where the topic needs explanation.\n\
         - Describe diagrams or imagery in visualDescription.\n\n\
         Text to convert:\n{text}"
    )
}

/// Remove markdown code fences from a model reply.
fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse a deck from model output, tolerating fences and surrounding prose.
pub fn parse_deck_reply(provider: &'static str, content: &str) -> RemoteResult<StructuredDeck> {
    let cleaned = strip_code_fences(content);
    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => value,
        Err(first) => {
            log::debug!("{provider} reply is not bare JSON ({first}); trying outermost object");
            let span = content
                .find('{')
                .zip(content.rfind('}'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &content[start..=end])
                .ok_or_else(|| RemoteServiceError::MalformedResponse {
                    provider,
                    message: "no JSON object in reply".to_string(),
                })?;
            serde_json::from_str(span).map_err(|e| RemoteServiceError::MalformedResponse {
                provider,
                message: e.to_string(),
            })?
        }
    };

    if !value.get("slides").is_some_and(Value::is_array) {
        return Err(RemoteServiceError::InvalidShape {
            provider,
            reason: "missing slides array".to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| RemoteServiceError::InvalidShape {
        provider,
        reason: e.to_string(),
    })
}

/// Send a request and return the body of a successful response.
async fn exchange(
    provider: &'static str,
    transport: &dyn CompletionTransport,
    request: CompletionRequest,
) -> RemoteResult<String> {
    let response = transport
        .send(request)
        .await
        .map_err(|message| RemoteServiceError::Transport { provider, message })?;
    if !response.is_success() {
        return Err(RemoteServiceError::Http {
            provider,
            status: response.status,
            body: response.body,
        });
    }
    Ok(response.body)
}

fn envelope_text<'v>(
    provider: &'static str,
    envelope: &'v Value,
    pointer: &str,
) -> RemoteResult<&'v str> {
    envelope
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| RemoteServiceError::MalformedResponse {
            provider,
            message: format!("response envelope has no text at {pointer}"),
        })
}

fn parse_envelope(provider: &'static str, body: &str) -> RemoteResult<Value> {
    serde_json::from_str(body).map_err(|e| RemoteServiceError::MalformedResponse {
        provider,
        message: e.to_string(),
    })
}

/// Chat-completions structuring provider (xAI Grok).
pub struct GrokProvider {
    config: ProviderConfig,
    transport: Arc<dyn CompletionTransport>,
}

impl GrokProvider {
    const NAME: &'static str = "grok";

    pub fn new(config: ProviderConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { config, transport }
    }

    fn request(&self, key: &str, text: &str) -> CompletionRequest {
        CompletionRequest {
            url: format!(
                "{}/v1/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {key}")),
            ],
            body: json!({
                "model": self.config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": "You create structured presentations. Always reply with valid JSON only, without markdown formatting."
                    },
                    { "role": "user", "content": structuring_prompt(text) }
                ],
                "temperature": 0.7,
                "max_tokens": 4000,
                "stream": false
            }),
        }
    }
}

impl StructuringProvider for GrokProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn available(&self) -> bool {
        self.config.credential().is_some()
    }

    fn slide_defaults(&self) -> SlideDefaults {
        SlideDefaults {
            untitled: None,
            code_language: "javascript",
        }
    }

    fn structure_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, RemoteResult<StructuredDeck>> {
        Box::pin(async move {
            let key = self
                .config
                .credential()
                .ok_or(RemoteServiceError::MissingCredential {
                    provider: Self::NAME,
                })?;
            let body = exchange(Self::NAME, self.transport.as_ref(), self.request(key, text)).await?;
            let envelope = parse_envelope(Self::NAME, &body)?;
            let content = envelope_text(Self::NAME, &envelope, "/choices/0/message/content")?;
            parse_deck_reply(Self::NAME, content)
        })
    }
}

/// Generate-content structuring provider (Google Gemini, JSON mode).
pub struct GeminiProvider {
    config: ProviderConfig,
    transport: Arc<dyn CompletionTransport>,
}

impl GeminiProvider {
    const NAME: &'static str = "gemini";

    pub fn new(config: ProviderConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { config, transport }
    }

    fn request(&self, key: &str, text: &str) -> CompletionRequest {
        CompletionRequest {
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                self.config.base_url.trim_end_matches('/'),
                self.config.model
            ),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("x-goog-api-key".to_string(), key.to_string()),
            ],
            body: json!({
                "contents": [{ "parts": [{ "text": structuring_prompt(text) }] }],
                "generationConfig": { "responseMimeType": "application/json" }
            }),
        }
    }
}

impl StructuringProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn available(&self) -> bool {
        self.config.credential().is_some()
    }

    fn slide_defaults(&self) -> SlideDefaults {
        SlideDefaults {
            untitled: Some("Untitled Slide"),
            ..SlideDefaults::default()
        }
    }

    fn structure_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, RemoteResult<StructuredDeck>> {
        Box::pin(async move {
            let key = self
                .config
                .credential()
                .ok_or(RemoteServiceError::MissingCredential {
                    provider: Self::NAME,
                })?;
            let body = exchange(Self::NAME, self.transport.as_ref(), self.request(key, text)).await?;
            let envelope = parse_envelope(Self::NAME, &body)?;
            let content =
                envelope_text(Self::NAME, &envelope, "/candidates/0/content/parts/0/text")?;
            parse_deck_reply(Self::NAME, content)
        })
    }
}

/// Which structuring collaborator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    Grok,
    Gemini,
    /// Grammar parsing only.
    #[default]
    None,
}

impl ProviderChoice {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "grok" | "xai" => Some(Self::Grok),
            "gemini" => Some(Self::Gemini),
            "none" | "grammar" => Some(Self::None),
            _ => None,
        }
    }
}

/// Both providers, selectable at call time.
pub struct ProviderSet {
    pub grok: GrokProvider,
    pub gemini: GeminiProvider,
}

impl ProviderSet {
    /// Build both providers sharing one transport.
    pub fn new(
        grok: ProviderConfig,
        gemini: ProviderConfig,
        transport: Arc<dyn CompletionTransport>,
    ) -> Self {
        Self {
            grok: GrokProvider::new(grok, Arc::clone(&transport)),
            gemini: GeminiProvider::new(gemini, transport),
        }
    }

    /// Build both providers with credentials from the environment.
    pub fn from_env(transport: Arc<dyn CompletionTransport>) -> Self {
        Self::new(
            ProviderConfig::grok_from_env(),
            ProviderConfig::gemini_from_env(),
            transport,
        )
    }

    /// Grok when configured, then Gemini, else grammar only.
    pub fn default_choice(&self) -> ProviderChoice {
        if self.grok.available() {
            ProviderChoice::Grok
        } else if self.gemini.available() {
            ProviderChoice::Gemini
        } else {
            ProviderChoice::None
        }
    }

    pub fn get(&self, choice: ProviderChoice) -> Option<&dyn StructuringProvider> {
        match choice {
            ProviderChoice::Grok => Some(&self.grok),
            ProviderChoice::Gemini => Some(&self.gemini),
            ProviderChoice::None => None,
        }
    }
}
