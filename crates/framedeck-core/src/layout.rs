//! Grid layout of slides into frames and wrapped text runs.

use crate::camera::CameraState;
use crate::options::GeneratorOptions;
use crate::primitive::{
    FontFamily, Frame, Primitive, PrimitiveId, PrimitiveStyle, SerializableColor, TextRun,
};
use crate::slide::Slide;
use crate::wrap::wrap_block;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Vertical offset of the first block inside a slide.
const CONTENT_TOP: f64 = 100.0;
/// Left inset of titles, body text and notes.
const TEXT_INSET: f64 = 50.0;
/// Left inset of bullets and code.
const INDENTED_INSET: f64 = 80.0;
/// Line pitch as a multiple of the font size.
const LINE_PITCH: f64 = 1.5;
/// Gap after the title as a multiple of its font size.
const TITLE_GAP: f64 = 0.5;
/// Gap after each bullet or paragraph.
const ITEM_GAP: f64 = 10.0;
/// Gap after the code block, and again before the notes.
const SECTION_GAP: f64 = 20.0;
/// Notes are set smaller than body text.
const NOTES_SCALE: f64 = 0.75;
/// Zoom of the initial overview camera.
const OVERVIEW_ZOOM: f64 = 0.5;

/// Initial viewport state for a generated deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub background: SerializableColor,
    pub camera: CameraState,
}

/// Output of [`generate_presentation`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDeck {
    pub primitives: Vec<Primitive>,
    pub viewport: ViewportState,
}

impl GeneratedDeck {
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.primitives.iter().filter_map(Primitive::as_frame)
    }
}

/// Emits the text runs of one slide, top to bottom.
struct SlideWriter<'a> {
    options: &'a GeneratorOptions,
    frame_id: PrimitiveId,
    origin: Point,
    cursor_y: f64,
    out: &'a mut Vec<Primitive>,
}

impl SlideWriter<'_> {
    /// Emit one wrapped block at `inset`; returns the number of lines.
    fn block(
        &mut self,
        inset: f64,
        text: &str,
        font_size: f64,
        family: FontFamily,
        color: SerializableColor,
    ) -> usize {
        let lines = wrap_block(text, self.options.wrap_width);
        let x = self.origin.x + inset;
        for (index, line) in lines.iter().enumerate() {
            let position = Point::new(x, self.cursor_y + index as f64 * font_size * LINE_PITCH);
            let run = TextRun::new(position, line.as_str(), font_size)
                .with_font_family(family)
                .with_style(PrimitiveStyle::stroked(color, None))
                .in_frame(self.frame_id);
            self.out.push(Primitive::Text(run));
        }
        lines.len()
    }

    fn advance(&mut self, lines: usize, font_size: f64, gap: f64) {
        self.cursor_y += lines as f64 * font_size * LINE_PITCH + gap;
    }

    fn write(&mut self, slide: &Slide) {
        let options = self.options;
        let palette = &options.palette;
        let family = options.font_family;

        if let Some(title) = &slide.title {
            let size = options.title_font_size;
            let lines = self.block(TEXT_INSET, title, size, family, palette.primary);
            self.advance(lines, size, size * TITLE_GAP);
        }

        match &slide.bullets {
            Some(bullets) if !bullets.is_empty() => {
                for bullet in bullets {
                    let size = options.bullet_font_size;
                    let text = format!("• {bullet}");
                    let lines = self.block(INDENTED_INSET, &text, size, family, palette.accent);
                    self.advance(lines, size, ITEM_GAP);
                }
            }
            _ => {
                for paragraph in &slide.content {
                    let size = options.content_font_size;
                    let lines = self.block(TEXT_INSET, paragraph, size, family, palette.secondary);
                    self.advance(lines, size, ITEM_GAP);
                }
            }
        }

        if let Some(code) = slide.code.as_ref().filter(|c| !c.content.is_empty()) {
            let size = options.code_font_size;
            let lines = self.block(
                INDENTED_INSET,
                &code.content,
                size,
                FontFamily::Code,
                palette.code_text,
            );
            self.advance(lines, size, SECTION_GAP);
        }

        if let Some(notes) = &slide.notes {
            self.cursor_y += SECTION_GAP;
            self.block(
                TEXT_INSET,
                &format!("Notes: {notes}"),
                options.content_font_size * NOTES_SCALE,
                family,
                palette.secondary,
            );
        }
    }
}

/// Lay out slides on a grid, one frame per slide with its text runs.
///
/// Slide `i` sits at row `i / cols`, column `i % cols`. Every text run
/// refers to its frame by id.
pub fn generate_slides(slides: &[Slide], options: &GeneratorOptions) -> Vec<Primitive> {
    let columns = options.columns();
    let palette = &options.palette;
    let mut primitives = Vec::new();

    for (index, slide) in slides.iter().enumerate() {
        let origin = Point::new(
            (index % columns) as f64 * options.column_pitch(),
            (index / columns) as f64 * options.row_pitch(),
        );
        let frame = Frame::new(
            origin,
            options.slide_width,
            options.slide_height,
            slide.display_name(index),
        )
        .with_style(PrimitiveStyle::stroked(palette.border, Some(palette.background)));
        let frame_id = frame.id;
        primitives.push(Primitive::Frame(frame));

        SlideWriter {
            options,
            frame_id,
            origin,
            cursor_y: origin.y + CONTENT_TOP,
            out: &mut primitives,
        }
        .write(slide);
    }

    log::debug!(
        "Laid out {} slide(s) as {} primitive(s)",
        slides.len(),
        primitives.len()
    );
    primitives
}

/// Lay out slides and compute the initial overview viewport.
pub fn generate_presentation(slides: &[Slide], options: &GeneratorOptions) -> GeneratedDeck {
    GeneratedDeck {
        primitives: generate_slides(slides, options),
        viewport: ViewportState {
            background: options.palette.background,
            camera: CameraState::new(OVERVIEW_ZOOM, Vec2::ZERO),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::ColorPalette;
    use crate::primitive::PrimitiveTrait;
    use crate::slide::CodeBlock;
    use std::collections::HashSet;

    fn titled(title: &str) -> Slide {
        Slide {
            title: Some(title.into()),
            ..Slide::default()
        }
    }

    fn texts(primitives: &[Primitive]) -> Vec<&TextRun> {
        primitives.iter().filter_map(Primitive::as_text).collect()
    }

    #[test]
    fn test_grid_positions() {
        let slides: Vec<Slide> = (0..7).map(|i| titled(&format!("S{i}"))).collect();
        let primitives = generate_slides(&slides, &GeneratorOptions::default());
        let frames: Vec<&Frame> = primitives.iter().filter_map(Primitive::as_frame).collect();
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[4].position, Point::new(5600.0, 0.0));
        assert_eq!(frames[5].position, Point::new(0.0, 1000.0));
        assert_eq!(frames[6].position, Point::new(1400.0, 1000.0));
    }

    #[test]
    fn test_frame_names_and_style() {
        let untitled = Slide {
            content: vec!["body".into()],
            ..Slide::default()
        };
        let slides = vec![titled("Intro"), untitled];
        let palette = ColorPalette::by_name("Ocean").unwrap();
        let options = GeneratorOptions::default().with_palette(palette.clone());
        let primitives = generate_slides(&slides, &options);
        let names: Vec<_> = primitives
            .iter()
            .filter_map(Primitive::as_frame)
            .map(|f| f.name.clone().unwrap())
            .collect();
        assert_eq!(names, ["Intro", "Slide 2"]);

        let frame = primitives[0].as_frame().unwrap();
        assert_eq!(frame.style.stroke_color, palette.border);
        assert_eq!(frame.style.fill_color, Some(palette.background));
    }

    #[test]
    fn test_block_offsets() {
        let slide = Slide {
            title: Some("Title".into()),
            bullets: Some(vec!["one".into(), "two".into()]),
            content: vec!["ignored when bullets exist".into()],
            code: Some(CodeBlock {
                language: "rust".into(),
                content: "let a = 1;\nlet b = 2;".into(),
            }),
            notes: Some("remember".into()),
            ..Slide::default()
        };
        let options = GeneratorOptions::default();
        let primitives = generate_slides(&[slide], &options);
        let runs = texts(&primitives);
        let lines: Vec<&str> = runs.iter().map(|t| t.content()).collect();
        assert_eq!(
            lines,
            ["Title", "• one", "• two", "let a = 1;", "let b = 2;", "Notes: remember"]
        );

        let ys: Vec<f64> = runs.iter().map(|t| t.position.y).collect();
        // title at 100; bullets start at 100 + 96
        assert_eq!(ys[0], 100.0);
        assert_eq!(ys[1], 196.0);
        assert_eq!(ys[2], 196.0 + 42.0 + 10.0);
        let code_y = 248.0 + 42.0 + 10.0;
        assert_eq!(ys[3], code_y);
        assert_eq!(ys[4], code_y + 36.0);
        assert_eq!(ys[5], code_y + 72.0 + 20.0 + 20.0);

        assert_eq!(runs[0].position.x, 50.0);
        assert_eq!(runs[1].position.x, 80.0);
        assert_eq!(runs[3].font_family, FontFamily::Code);
        assert_eq!(runs[5].font_size, 24.0);
    }

    #[test]
    fn test_role_colors() {
        let palette = ColorPalette::default();
        let slide = Slide {
            title: Some("T".into()),
            content: vec!["body".into()],
            notes: Some("n".into()),
            ..Slide::default()
        };
        let primitives = generate_slides(&[slide], &GeneratorOptions::default());
        let runs = texts(&primitives);
        assert_eq!(runs[0].style.stroke_color, palette.primary);
        assert_eq!(runs[1].style.stroke_color, palette.secondary);
        assert_eq!(runs[2].style.stroke_color, palette.secondary);
    }

    #[test]
    fn test_every_run_references_its_frame() {
        let slides = vec![titled("A"), titled("B")];
        let primitives = generate_slides(&slides, &GeneratorOptions::default());
        let frame_ids: HashSet<PrimitiveId> = primitives
            .iter()
            .filter_map(Primitive::as_frame)
            .map(PrimitiveTrait::id)
            .collect();
        for run in texts(&primitives) {
            assert!(frame_ids.contains(&run.frame_id.unwrap()));
        }
        let all_ids: HashSet<PrimitiveId> = primitives.iter().map(Primitive::id).collect();
        assert_eq!(all_ids.len(), primitives.len());
    }

    #[test]
    fn test_long_text_wraps() {
        let long = "word ".repeat(40);
        let slide = Slide {
            content: vec![long.trim().to_string()],
            ..Slide::default()
        };
        let primitives = generate_slides(&[slide], &GeneratorOptions::default());
        let runs = texts(&primitives);
        assert!(runs.len() > 1);
        assert!(runs.iter().all(|r| r.content().chars().count() <= 60));
        assert_eq!(runs[1].position.y - runs[0].position.y, 48.0);
    }

    #[test]
    fn test_wrapped_title_pushes_bullets_down() {
        let slide = Slide {
            title: Some("word ".repeat(20).trim().to_string()),
            bullets: Some(vec!["point".into()]),
            ..Slide::default()
        };
        let primitives = generate_slides(&[slide], &GeneratorOptions::default());
        let runs = texts(&primitives);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].position.y, 100.0);
        assert_eq!(runs[1].position.y, 172.0);
        // two title lines of 72 plus a 24 gap
        assert_eq!(runs[2].content(), "• point");
        assert_eq!(runs[2].position.y, 100.0 + 144.0 + 24.0);
    }

    #[test]
    fn test_presentation_viewport() {
        let deck = generate_presentation(&[titled("A")], &GeneratorOptions::default());
        assert_eq!(deck.viewport.camera.zoom, 0.5);
        assert_eq!(deck.viewport.camera.offset, Vec2::ZERO);
        assert_eq!(deck.viewport.background, ColorPalette::default().background);
        assert_eq!(deck.frames().count(), 1);
    }

    #[test]
    fn test_empty_deck() {
        assert!(generate_slides(&[], &GeneratorOptions::default()).is_empty());
    }
}
