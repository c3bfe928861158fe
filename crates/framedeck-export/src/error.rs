//! Export errors.

use framedeck_core::CanvasError;
use thiserror::Error;

/// Export errors. Any of them aborts the whole export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There are no frames to export")]
    NoRegions,
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error("Raster for \"{region}\" is empty or inconsistent")]
    InvalidRaster { region: String },
    #[error("Cannot fit image on page: {0}")]
    PageFit(String),
    #[error("PDF assembly failed: {0}")]
    Pdf(String),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
