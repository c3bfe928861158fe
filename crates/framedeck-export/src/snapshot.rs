//! Single-region PNG export.

use crate::error::{ExportError, ExportResult};
use framedeck_core::{CanvasHost, RasterImage, RasterOptions, Region, RegionSnapshotRequest, region_members};

/// Encode an RGBA raster to PNG bytes.
pub fn encode_png(image: &RasterImage) -> ExportResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.pixels)?;
    }
    Ok(png_data)
}

/// Rasterize one region and encode it as PNG. The camera is left untouched.
pub async fn export_region_png<H: CanvasHost + ?Sized>(
    host: &H,
    region: &Region,
    options: RasterOptions,
    tolerance: f64,
) -> ExportResult<Vec<u8>> {
    let request = RegionSnapshotRequest {
        region: region.rect,
        members: region_members(&host.scene_elements(), region, tolerance),
        files: host.files(),
        options,
    };
    let raster = host.export_region_to_image(request).await?;
    if raster.width == 0 || raster.height == 0 || !raster.is_consistent() {
        return Err(ExportError::InvalidRaster {
            region: region.name.clone(),
        });
    }
    let bytes = encode_png(&raster)?;
    log::info!(
        "PNG export of \"{}\" complete: {} bytes",
        region.name,
        bytes.len()
    );
    Ok(bytes)
}
