//! Text-to-slide parsing.

mod grammar;
mod providers;
mod remote;

pub use grammar::{
    DEFAULT_CODE_LANGUAGE, ParserOptions, SlideParser, parse_markdown_to_slides,
    parse_numbered_slides,
};
pub use providers::{
    CompletionRequest, CompletionResponse, CompletionTransport, GEMINI_API_KEY_VAR,
    GeminiProvider, GrokProvider, PLACEHOLDER_API_KEY, ProviderChoice, ProviderConfig,
    ProviderSet, XAI_API_KEY_VAR, parse_deck_reply, structuring_prompt,
};
pub use remote::{
    AssistedParser, BoxFuture, RemoteResult, RemoteServiceError, SlideDefaults, StructuredCode,
    StructuredDeck, StructuredSlide, StructuringProvider,
};
