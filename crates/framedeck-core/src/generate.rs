//! Text-to-canvas generation pipeline.
//!
//! Parses text (optionally through a structuring provider), lays the slides
//! out and appends the result to the host's scene. Generation is additive:
//! existing drawables are kept.

use crate::host::{CanvasError, CanvasHost};
use crate::layout::{GeneratedDeck, generate_presentation};
use crate::options::GeneratorOptions;
use crate::parser::{AssistedParser, SlideParser, StructuringProvider};
use crate::primitive::{Primitive, PrimitiveId};
use crate::region::derive_regions;
use crate::scene::{AppStatePatch, SceneUpdate};
use crate::slide::Slide;
use std::collections::HashSet;
use thiserror::Error;

/// Generation failures. None of them leave partial changes on the canvas.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Please enter some text to generate slides")]
    EmptyInput,
    #[error("Nothing could be parsed into slides")]
    NothingParsed,
    #[error("No valid elements were generated")]
    NoValidPrimitives,
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub slide_count: usize,
    /// Primitives appended to the scene.
    pub primitive_count: usize,
    /// Primitives dropped for invalid geometry or a rejected owner frame.
    pub rejected: usize,
    /// Registry index of the first generated region, when regions existed
    /// before this run.
    pub first_new_region: Option<usize>,
}

/// Drives parsing, layout and injection into a [`CanvasHost`].
#[derive(Debug, Clone, Default)]
pub struct DeckGenerator {
    parser: SlideParser,
    options: GeneratorOptions,
}

impl DeckGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            parser: SlideParser::default(),
            options,
        }
    }

    pub fn with_parser(mut self, parser: SlideParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate with the grammar parser.
    pub fn generate<H: CanvasHost + ?Sized>(
        &self,
        host: &mut H,
        text: &str,
    ) -> GenerateResult<GenerationReport> {
        ensure_input(text)?;
        let slides = self.parser.parse(text);
        self.generate_from_slides(host, slides)
    }

    /// Generate through a structuring provider, falling back to the grammar
    /// parser when it is missing or fails.
    pub async fn generate_assisted<H: CanvasHost + ?Sized>(
        &self,
        host: &mut H,
        text: &str,
        provider: Option<&dyn StructuringProvider>,
    ) -> GenerateResult<GenerationReport> {
        ensure_input(text)?;
        let slides = AssistedParser::new(self.parser.clone(), provider)
            .parse(text)
            .await;
        self.generate_from_slides(host, slides)
    }

    /// Lay out already-parsed slides and append them to the scene.
    pub fn generate_from_slides<H: CanvasHost + ?Sized>(
        &self,
        host: &mut H,
        slides: Vec<Slide>,
    ) -> GenerateResult<GenerationReport> {
        if slides.is_empty() {
            log::warn!("Generation parsed zero slides");
            return Err(GenerateError::NothingParsed);
        }

        let GeneratedDeck {
            primitives,
            viewport,
        } = generate_presentation(&slides, &self.options);
        let generated = primitives.len();
        let accepted = validate(primitives);
        if accepted.is_empty() {
            log::warn!("All {generated} generated element(s) were rejected");
            return Err(GenerateError::NoValidPrimitives);
        }
        let rejected = generated - accepted.len();
        if rejected > 0 {
            log::warn!("Rejected {rejected} malformed element(s)");
        }

        let mut elements = host.scene_elements();
        let had_regions = !derive_regions(&elements).is_empty();
        let first_frame = accepted.iter().find(|p| p.is_frame()).map(Primitive::id);
        let primitive_count = accepted.len();
        elements.extend(accepted);

        let first_new_region = match (had_regions, first_frame) {
            (true, Some(id)) => derive_regions(&elements).iter().position(|r| r.id == id),
            _ => None,
        };

        host.update_scene(SceneUpdate {
            elements: Some(elements),
            app_state: Some(AppStatePatch {
                camera: Some(viewport.camera),
                background: Some(viewport.background),
                active_tool: None,
            }),
        })?;

        log::info!(
            "Generated {} slide(s) as {primitive_count} element(s)",
            slides.len()
        );
        Ok(GenerationReport {
            slide_count: slides.len(),
            primitive_count,
            rejected,
            first_new_region,
        })
    }
}

fn ensure_input(text: &str) -> GenerateResult<()> {
    if text.trim().is_empty() {
        return Err(GenerateError::EmptyInput);
    }
    Ok(())
}

/// Drop malformed primitives, and text runs whose frame was dropped.
fn validate(primitives: Vec<Primitive>) -> Vec<Primitive> {
    let rejected_frames: HashSet<PrimitiveId> = primitives
        .iter()
        .filter(|p| p.is_frame() && !p.is_well_formed())
        .map(Primitive::id)
        .collect();
    primitives
        .into_iter()
        .filter(|p| p.is_well_formed())
        .filter(|p| p.frame_ref().is_none_or(|owner| !rejected_frames.contains(&owner)))
        .collect()
}
