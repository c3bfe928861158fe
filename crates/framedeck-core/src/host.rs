//! The canvas collaborator interface.
//!
//! The drawing surface itself lives outside this crate. Everything here talks
//! to it through [`CanvasHost`]: scene CRUD, viewport get/set, region
//! snapshots and change notifications.

use crate::parser::BoxFuture;
use crate::primitive::{Primitive, SerializableColor};
use crate::scene::{AppState, SceneUpdate};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by a canvas host.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Rasterization failed: {0}")]
    Raster(String),
    #[error("Viewport takeover denied: {0}")]
    TakeoverDenied(String),
    #[error("Scene update rejected: {0}")]
    Update(String),
}

/// Result type for host calls.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Handle returned by [`CanvasHost::on_scene_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Scene-change listener.
pub type SceneListener = Box<dyn FnMut()>;

/// An embedded binary asset (images referenced by the scene).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFile {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Assets keyed by file id.
pub type BinaryFiles = HashMap<String, BinaryFile>;

/// How a region is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Pixels per world unit.
    pub scale: f64,
    /// World units of padding around the region.
    pub padding: f64,
    /// Opaque background painted before any content.
    pub background: SerializableColor,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            padding: 20.0,
            background: SerializableColor::white(),
        }
    }
}

impl RasterOptions {
    /// Pixel size of the raster for `region`, or `None` if it would be empty
    /// or not finite.
    pub fn pixel_size(&self, region: Rect) -> Option<(u32, u32)> {
        let width = ((region.width() + self.padding * 2.0) * self.scale).ceil();
        let height = ((region.height() + self.padding * 2.0) * self.scale).ceil();
        let valid = |v: f64| v.is_finite() && v >= 1.0 && v <= u32::MAX as f64;
        (valid(width) && valid(height)).then_some((width as u32, height as u32))
    }
}

/// What to rasterize: a region and the drawables that belong to it.
#[derive(Debug, Clone)]
pub struct RegionSnapshotRequest {
    pub region: Rect,
    pub members: Vec<Primitive>,
    pub files: BinaryFiles,
    pub options: RasterOptions,
}

/// An RGBA8 raster, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// A raster filled with `color`.
    pub fn filled(width: u32, height: u32, color: SerializableColor) -> Self {
        let pixels = [color.r, color.g, color.b, color.a]
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels
            .get(i..i + 4)
            .and_then(|p| <[u8; 4]>::try_from(p).ok())
    }

    /// Whether the buffer length matches the dimensions.
    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * 4
    }
}

/// The external drawing surface.
pub trait CanvasHost {
    /// Current drawables in back-to-front order.
    fn scene_elements(&self) -> Vec<Primitive>;

    /// Apply a scene mutation and notify listeners when elements change.
    fn update_scene(&mut self, update: SceneUpdate) -> CanvasResult<()>;

    fn app_state(&self) -> AppState;

    /// Binary assets referenced by the scene.
    fn files(&self) -> BinaryFiles;

    /// Rasterize one region in isolation.
    fn export_region_to_image<'a>(
        &'a self,
        request: RegionSnapshotRequest,
    ) -> BoxFuture<'a, CanvasResult<RasterImage>>;

    /// Rasterize whatever the viewport currently shows.
    fn capture_viewport_to_image<'a>(
        &'a self,
        options: RasterOptions,
    ) -> BoxFuture<'a, CanvasResult<RasterImage>>;

    /// Register a listener called after every element change.
    fn on_scene_change(&mut self, listener: SceneListener) -> SubscriptionId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Ask for exclusive (fullscreen) use of the viewport.
    fn request_takeover(&mut self) -> CanvasResult<()>;

    fn end_takeover(&mut self);

    fn is_taken_over(&self) -> bool;
}
