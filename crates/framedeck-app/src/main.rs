//! FrameDeck command-line entry point.
//!
//! Reads a text file, generates the deck on an in-memory canvas, prints the
//! navigation order of its regions and writes a paginated PDF.

use clap::Parser;
use framedeck_core::parser::{ParserOptions, parse_numbered_slides};
use framedeck_core::{
    CanvasHost, ColorPalette, DeckGenerator, GenerateError, GeneratorOptions, MemoryCanvas,
    RegionRegistry, Scene, SlideParser,
};
use framedeck_export::{ExportError, PdfExporter, export_filename};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Generate a slide deck from text and export it to PDF
#[derive(Parser, Debug)]
#[command(name = "framedeck", version)]
struct Args {
    /// Text file to convert (`---` separates slides)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output PDF path (defaults to a timestamped name)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Palette name or index
    #[arg(short, long, env = "FRAMEDECK_PALETTE")]
    palette: Option<String>,

    /// Slides per grid row
    #[arg(long)]
    cols: Option<usize>,

    /// JSON file with generator options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Treat `Slide N:` lines as slide boundaries
    #[arg(long)]
    numbered: bool,

    /// Slide delimiter line
    #[arg(long, default_value = "---")]
    delimiter: String,

    /// Also write the scene as Excalidraw JSON
    #[arg(long, value_name = "FILE")]
    excalidraw: Option<PathBuf>,

    /// List the built-in palettes and exit
    #[arg(long)]
    list_palettes: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown palette \"{0}\"")]
    UnknownPalette(String),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

fn read_file(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_palette(name: &str) -> Result<ColorPalette, AppError> {
    if let Some(palette) = ColorPalette::by_name(name) {
        return Ok(palette);
    }
    name.trim()
        .parse::<i64>()
        .map(ColorPalette::by_index)
        .map_err(|_| AppError::UnknownPalette(name.to_string()))
}

fn generator_options(args: &Args) -> Result<GeneratorOptions, AppError> {
    let mut options = match &args.options {
        Some(path) => serde_json::from_str(&read_file(path)?)?,
        None => GeneratorOptions::default(),
    };
    if let Some(name) = &args.palette {
        options = options.with_palette(resolve_palette(name)?);
    }
    if let Some(cols) = args.cols {
        options = options.with_grid_cols(cols);
    }
    Ok(options)
}

async fn run(args: Args) -> Result<PathBuf, AppError> {
    let options = generator_options(&args)?;
    let text = read_file(&args.input)?;

    let parser = SlideParser::new(ParserOptions {
        slide_delimiter: args.delimiter.clone(),
        ..ParserOptions::default()
    });
    let generator = DeckGenerator::new(options).with_parser(parser);
    let mut canvas = MemoryCanvas::new();
    let report = if args.numbered && !text.trim().is_empty() {
        generator.generate_from_slides(&mut canvas, parse_numbered_slides(&text))?
    } else {
        generator.generate(&mut canvas, &text)?
    };
    log::info!(
        "Generated {} slide(s), {} element(s)",
        report.slide_count,
        report.primitive_count
    );

    let mut registry = RegionRegistry::new();
    for (index, region) in registry.refresh(&canvas.scene_elements()).iter().enumerate() {
        println!(
            "{:>3}. {} ({:.0}, {:.0})",
            index + 1,
            region.name,
            region.x(),
            region.y()
        );
    }

    if let Some(path) = &args.excalidraw {
        let scene = Scene::from_primitives(canvas.scene_elements());
        let json = serde_json::to_string_pretty(&scene.to_excalidraw(&canvas.app_state()))?;
        std::fs::write(path, json).map_err(|source| AppError::Io {
            path: path.clone(),
            source,
        })?;
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_filename(chrono::Local::now().naive_local())));
    let pdf = PdfExporter::default()
        .export_all(&mut canvas, registry.regions())
        .await?;
    pdf.save(&output)?;
    Ok(output)
}

fn main() {
    env_logger::init();
    log::info!("Starting FrameDeck");

    let args = Args::parse();
    if args.list_palettes {
        for (index, name) in ColorPalette::names().enumerate() {
            println!("{index}: {name}");
        }
        return;
    }

    match pollster::block_on(run(args)) {
        Ok(path) => println!("Wrote {}", path.display()),
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
