//! Aspect-preserving page placement.

use crate::error::{ExportError, ExportResult};
use kurbo::{Rect, Size};

/// Place an image of `image` size on a page, preserving its aspect ratio
/// inside the page inset by `margin` and centering it on the page.
///
/// Coordinates are page units with the origin at a page corner; centering is
/// symmetric so the choice of corner does not matter.
pub fn fit_to_page(image: Size, page: Size, margin: f64) -> ExportResult<Rect> {
    let available = Size::new(page.width - margin * 2.0, page.height - margin * 2.0);
    let finite = [image.width, image.height, available.width, available.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(ExportError::PageFit(format!(
            "non-finite geometry (image {image:?}, page {page:?})"
        )));
    }
    if image.width <= 0.0 || image.height <= 0.0 {
        return Err(ExportError::PageFit(format!("empty image {image:?}")));
    }
    if available.width <= 0.0 || available.height <= 0.0 {
        return Err(ExportError::PageFit(format!(
            "margin {margin} leaves no room on page {page:?}"
        )));
    }

    let image_aspect = image.width / image.height;
    let page_aspect = available.width / available.height;
    let fitted = if image_aspect > page_aspect {
        Size::new(available.width, available.width / image_aspect)
    } else {
        Size::new(available.height * image_aspect, available.height)
    };

    let x = (page.width - fitted.width) / 2.0;
    let y = (page.height - fitted.height) / 2.0;
    Ok(Rect::from_origin_size((x, y), fitted))
}
