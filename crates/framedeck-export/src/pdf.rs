//! Paginated PDF export, one page per region.

use crate::error::{ExportError, ExportResult};
use crate::fit::fit_to_page;
use crate::guard::ViewportGuard;
use chrono::NaiveDateTime;
use framedeck_core::region::MEMBERSHIP_TOLERANCE;
use framedeck_core::{
    CanvasHost, RasterImage, RasterOptions, Region, RegionSnapshotRequest, SceneUpdate,
    frame_region, region_members,
};
use kurbo::{Rect, Size};
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};
use std::path::Path;

/// A4 landscape in points.
pub const A4_LANDSCAPE: Size = Size::new(841.89, 595.28);

const MM_PER_POINT: f64 = 25.4 / 72.0;
/// Resolution images are embedded at before scaling onto the page.
const IMAGE_DPI: f64 = 300.0;
const CAPTION_FONT_SIZE: f64 = 10.0;
/// Approximate Helvetica advance as a fraction of the font size.
const CAPTION_CHAR_WIDTH: f64 = 0.5;

/// Page geometry and rasterization settings for PDF export.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfConfig {
    pub title: String,
    /// Page size in points.
    pub page_size: Size,
    /// Margin in points.
    pub margin: f64,
    pub raster: RasterOptions,
    /// Bounding-box membership tolerance in world units.
    pub membership_tolerance: f64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            title: "FrameDeck Presentation".to_string(),
            page_size: A4_LANDSCAPE,
            margin: 20.0,
            raster: RasterOptions::default(),
            membership_tolerance: MEMBERSHIP_TOLERANCE,
        }
    }
}

/// Layout of one exported page, in points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub caption: String,
    /// `i / N` page indicator.
    pub indicator: String,
    pub image_rect: Rect,
    pub pixel_size: (u32, u32),
}

/// A finished PDF and the layout of its pages.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageSummary>,
}

impl ExportedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        log::info!(
            "Wrote {} page(s), {} bytes to {}",
            self.pages.len(),
            self.bytes.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// File name for an export started at `at`.
pub fn export_filename(at: NaiveDateTime) -> String {
    format!("framedeck-presentation-{}.pdf", at.format("%Y-%m-%d_%H%M%S"))
}

/// Builds a PDF from the regions of a canvas.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: PdfConfig,
}

impl PdfExporter {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    /// Export `regions` in the given order, one page each.
    ///
    /// Every region is rasterized before the document is assembled, one at a
    /// time. The host camera is moved onto each region while it is captured
    /// and restored afterwards whatever the outcome.
    pub async fn export_all<H: CanvasHost + ?Sized>(
        &self,
        host: &mut H,
        regions: &[Region],
    ) -> ExportResult<ExportedPdf> {
        if regions.is_empty() {
            return Err(ExportError::NoRegions);
        }

        let rasters = {
            let mut guard = ViewportGuard::new(host);
            let mut rasters = Vec::with_capacity(regions.len());
            for (index, region) in regions.iter().enumerate() {
                log::debug!(
                    "Rasterizing region {}/{} \"{}\"",
                    index + 1,
                    regions.len(),
                    region.name
                );
                rasters.push(self.capture(&mut guard, region).await?);
            }
            rasters
        };

        let mut pages = Vec::with_capacity(regions.len());
        for (index, (region, raster)) in regions.iter().zip(&rasters).enumerate() {
            let pixels = Size::new(f64::from(raster.width), f64::from(raster.height));
            pages.push(PageSummary {
                caption: region.name.clone(),
                indicator: format!("{} / {}", index + 1, regions.len()),
                image_rect: fit_to_page(pixels, self.config.page_size, self.config.margin)?,
                pixel_size: (raster.width, raster.height),
            });
        }

        let bytes = self.assemble(&pages, &rasters)?;
        log::info!("Exported {} region(s) to PDF", pages.len());
        Ok(ExportedPdf { bytes, pages })
    }

    async fn capture<H: CanvasHost + ?Sized>(
        &self,
        guard: &mut ViewportGuard<'_, H>,
        region: &Region,
    ) -> ExportResult<RasterImage> {
        let viewport = guard.app_state().viewport_size;
        match frame_region(region.rect, viewport) {
            Some(camera) => guard.update_scene(SceneUpdate::camera(camera))?,
            None => log::debug!("Region \"{}\" cannot be framed; capturing as is", region.name),
        }

        let members = region_members(
            &guard.scene_elements(),
            region,
            self.config.membership_tolerance,
        );
        let request = RegionSnapshotRequest {
            region: region.rect,
            members,
            files: guard.files(),
            options: self.config.raster,
        };
        let raster = guard.export_region_to_image(request).await?;
        if raster.width == 0 || raster.height == 0 || !raster.is_consistent() {
            return Err(ExportError::InvalidRaster {
                region: region.name.clone(),
            });
        }
        Ok(raster)
    }

    fn assemble(&self, pages: &[PageSummary], rasters: &[RasterImage]) -> ExportResult<Vec<u8>> {
        let page_w = to_mm(self.config.page_size.width);
        let page_h = to_mm(self.config.page_size.height);
        let (doc, first_page, first_layer) =
            PdfDocument::new(self.config.title.as_str(), page_w, page_h, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        for (index, (page, raster)) in pages.iter().zip(rasters).enumerate() {
            let (page_index, layer_index) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(page_w, page_h, "Layer 1")
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);

            let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(flatten(raster)?));
            // Natural size at IMAGE_DPI, in points.
            let natural_w = f64::from(raster.width) / IMAGE_DPI * 72.0;
            let natural_h = f64::from(raster.height) / IMAGE_DPI * 72.0;
            image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(to_mm(page.image_rect.x0)),
                    translate_y: Some(to_mm(page.image_rect.y0)),
                    scale_x: Some((page.image_rect.width() / natural_w) as f32),
                    scale_y: Some((page.image_rect.height() / natural_h) as f32),
                    dpi: Some(IMAGE_DPI as f32),
                    ..Default::default()
                },
            );

            let baseline = (self.config.margin - CAPTION_FONT_SIZE) / 2.0;
            layer.use_text(
                page.caption.as_str(),
                CAPTION_FONT_SIZE as f32,
                to_mm(self.config.margin),
                to_mm(baseline),
                &font,
            );
            let indicator_width =
                page.indicator.chars().count() as f64 * CAPTION_FONT_SIZE * CAPTION_CHAR_WIDTH;
            layer.use_text(
                page.indicator.as_str(),
                CAPTION_FONT_SIZE as f32,
                to_mm(self.config.page_size.width - self.config.margin - indicator_width),
                to_mm(baseline),
                &font,
            );
        }

        doc.save_to_bytes()
            .map_err(|e| ExportError::Pdf(format!("save failed: {e}")))
    }
}

fn to_mm(points: f64) -> Mm {
    Mm((points * MM_PER_POINT) as f32)
}

/// Composite an RGBA raster onto white, dropping alpha.
fn flatten(raster: &RasterImage) -> ExportResult<RgbImage> {
    let rgb: Vec<u8> = raster
        .pixels
        .chunks_exact(4)
        .flat_map(|px| {
            let alpha = u16::from(px[3]);
            let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            [blend(px[0]), blend(px[1]), blend(px[2])]
        })
        .collect();
    RgbImage::from_raw(raster.width, raster.height, rgb).ok_or_else(|| {
        ExportError::Pdf(format!(
            "raster buffer does not match {}x{}",
            raster.width, raster.height
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use framedeck_core::SerializableColor;

    #[test]
    fn test_filename_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 42)
            .unwrap();
        assert_eq!(
            export_filename(at),
            "framedeck-presentation-2024-03-09_070542.pdf"
        );
    }

    #[test]
    fn test_flatten_onto_white() {
        let mut raster = RasterImage::filled(2, 1, SerializableColor::new(0, 0, 0, 255));
        raster.pixels[4..8].copy_from_slice(&[0, 0, 0, 0]);
        let rgb = flatten(&raster).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_flatten_half_alpha() {
        let raster = RasterImage::filled(1, 1, SerializableColor::new(0, 0, 0, 128));
        let value = flatten(&raster).unwrap().get_pixel(0, 0).0[0];
        assert!((126..=128).contains(&value));
    }

    #[test]
    fn test_default_config() {
        let config = PdfConfig::default();
        assert_eq!(config.margin, 20.0);
        assert_eq!(config.raster.scale, 2.0);
        assert_eq!(config.raster.padding, 20.0);
        assert_eq!(config.membership_tolerance, 10.0);
        assert!(config.page_size.width > config.page_size.height);
    }
}
