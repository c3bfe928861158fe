//! Camera state and region framing math.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Padding kept around a framed region, in world units.
pub const FRAME_PADDING: f64 = 50.0;
/// Upper bound on the zoom chosen when framing a region.
pub const MAX_FRAME_ZOOM: f64 = 2.0;
/// Offsets closer than this are considered equal.
pub const OFFSET_EPSILON: f64 = 1.0;
/// Zoom levels closer than this are considered equal.
pub const ZOOM_EPSILON: f64 = 0.01;

/// The viewport's zoom and scroll offset.
///
/// A world point maps to the screen as `(world + offset) * zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub zoom: f64,
    pub offset: Vec2,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl CameraState {
    pub fn new(zoom: f64, offset: Vec2) -> Self {
        Self { zoom, offset }
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.offset)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.offset) * Affine::scale(1.0 / self.zoom)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// The world-space rectangle visible in a viewport of `viewport` size.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Equal within the offset and zoom tolerances.
    pub fn approx_eq(&self, other: &CameraState) -> bool {
        (self.offset.x - other.offset.x).abs() < OFFSET_EPSILON
            && (self.offset.y - other.offset.y).abs() < OFFSET_EPSILON
            && (self.zoom - other.zoom).abs() < ZOOM_EPSILON
    }

    /// Componentwise interpolation; `t = 0` yields `from`, `t = 1` yields `to`.
    pub fn lerp(from: &CameraState, to: &CameraState, t: f64) -> CameraState {
        CameraState {
            zoom: from.zoom + (to.zoom - from.zoom) * t,
            offset: from.offset + (to.offset - from.offset) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.zoom.is_finite() && self.offset.x.is_finite() && self.offset.y.is_finite()
    }
}

/// Camera that centers `region` in a viewport of `viewport` size.
///
/// The zoom fits the padded region on both axes and never exceeds
/// [`MAX_FRAME_ZOOM`]. Returns `None` for an empty viewport or a
/// non-finite result.
pub fn frame_region(region: Rect, viewport: Size) -> Option<CameraState> {
    if !(viewport.width > 0.0 && viewport.height > 0.0) {
        return None;
    }

    let zoom_x = viewport.width / (region.width() + FRAME_PADDING * 2.0);
    let zoom_y = viewport.height / (region.height() + FRAME_PADDING * 2.0);
    let zoom = zoom_x.min(zoom_y).min(MAX_FRAME_ZOOM);
    if !(zoom.is_finite() && zoom > 0.0) {
        return None;
    }

    let center = region.center();
    let camera = CameraState {
        zoom,
        offset: Vec2::new(
            viewport.width / (2.0 * zoom) - center.x,
            viewport.height / (2.0 * zoom) - center.y,
        ),
    };
    camera.is_finite().then_some(camera)
}
