//! FrameDeck Export Library
//!
//! Paginated PDF and single-image PNG export of canvas regions.

mod error;
mod fit;
mod guard;
mod pdf;
mod snapshot;

pub use error::{ExportError, ExportResult};
pub use fit::fit_to_page;
pub use guard::ViewportGuard;
pub use pdf::{A4_LANDSCAPE, ExportedPdf, PageSummary, PdfConfig, PdfExporter, export_filename};
pub use snapshot::{encode_png, export_region_png};
