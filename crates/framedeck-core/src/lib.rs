//! FrameDeck Core Library
//!
//! Turns loosely structured text into slide frames on a canvas, orders the
//! frames into navigable regions and drives the presentation camera.

pub mod animation;
pub mod camera;
pub mod debounce;
pub mod generate;
pub mod host;
pub mod layout;
pub mod memory;
pub mod options;
pub mod palette;
pub mod parser;
pub mod presenter;
pub mod primitive;
pub mod region;
pub mod scene;
pub mod sequencer;
pub mod slide;
pub mod wrap;

pub use animation::{CameraAnimation, ease_out_cubic};
pub use camera::{CameraState, frame_region};
pub use debounce::RefreshDebouncer;
pub use generate::{DeckGenerator, GenerateError, GenerationReport};
pub use host::{
    CanvasError, CanvasHost, CanvasResult, RasterImage, RasterOptions, RegionSnapshotRequest,
};
pub use layout::{GeneratedDeck, ViewportState, generate_presentation, generate_slides};
pub use memory::MemoryCanvas;
pub use options::GeneratorOptions;
pub use palette::ColorPalette;
pub use parser::{AssistedParser, SlideParser, StructuringProvider, parse_markdown_to_slides};
pub use presenter::{PresentError, PresentationCommand, PresentationMode, Presenter};
pub use primitive::{Frame, Primitive, PrimitiveId, SerializableColor, TextRun};
pub use region::{Region, RegionRegistry, derive_regions, region_members};
pub use scene::{AppState, Scene, SceneUpdate, ToolKind};
pub use sequencer::{FrameOutcome, Sequencer};
pub use slide::{CodeBlock, Slide};
pub use wrap::{break_content_into_lines, wrap_text};
