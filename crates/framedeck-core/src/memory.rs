//! In-memory canvas host.
//!
//! Keeps the scene and viewport in memory and paints regions with flat
//! rectangles. Used by the CLI and by tests; it also supports injecting
//! takeover denial and rasterization failures.

use crate::camera::CameraState;
use crate::host::{
    BinaryFile, BinaryFiles, CanvasError, CanvasHost, CanvasResult, RasterImage, RasterOptions,
    RegionSnapshotRequest, SceneListener, SubscriptionId,
};
use crate::parser::BoxFuture;
use crate::primitive::{Primitive, SerializableColor};
use crate::scene::{AppState, Scene, SceneUpdate};
use kurbo::{Rect, Size};
use std::cell::Cell;

/// Largest raster the in-memory painter will allocate, in pixels.
const MAX_RASTER_PIXELS: u64 = 64 * 1024 * 1024;

/// Reference [`CanvasHost`] backed by a [`Scene`].
pub struct MemoryCanvas {
    scene: Scene,
    app_state: AppState,
    files: BinaryFiles,
    listeners: Vec<(SubscriptionId, SceneListener)>,
    next_subscription: u64,
    taken_over: bool,
    deny_takeover: bool,
    fail_exports_after: Option<usize>,
    exports: Cell<usize>,
    camera_writes: usize,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self::with_scene(Scene::new())
    }

    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            app_state: AppState::default(),
            files: BinaryFiles::new(),
            listeners: Vec::new(),
            next_subscription: 1,
            taken_over: false,
            deny_takeover: false,
            fail_exports_after: None,
            exports: Cell::new(0),
            camera_writes: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Resize the viewport (window resize, entering fullscreen).
    pub fn set_viewport_size(&mut self, size: Size) {
        self.app_state.viewport_size = size;
    }

    /// Set the camera without counting it as a scene update.
    pub fn set_camera(&mut self, camera: CameraState) {
        self.app_state.camera = camera;
    }

    /// Number of camera writes received through [`CanvasHost::update_scene`].
    pub fn camera_writes(&self) -> usize {
        self.camera_writes
    }

    pub fn insert_file(&mut self, id: impl Into<String>, file: BinaryFile) {
        self.files.insert(id.into(), file);
    }

    /// Make every takeover request fail.
    pub fn deny_takeover(&mut self, deny: bool) {
        self.deny_takeover = deny;
    }

    /// Fail region exports once `count` of them have succeeded.
    pub fn fail_exports_after(&mut self, count: Option<usize>) {
        self.fail_exports_after = count;
        self.exports.set(0);
    }

    /// Number of region exports attempted.
    pub fn export_count(&self) -> usize {
        self.exports.get()
    }

    /// Simulate the user leaving fullscreen from outside the application.
    pub fn exit_takeover_externally(&mut self) {
        self.taken_over = false;
    }

    fn notify_listeners(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
    }

    fn paint(
        &self,
        area: Rect,
        members: &[Primitive],
        options: &RasterOptions,
    ) -> CanvasResult<RasterImage> {
        let (width, height) = options
            .pixel_size(area)
            .ok_or_else(|| CanvasError::Raster(format!("cannot rasterize area {area:?}")))?;
        if u64::from(width) * u64::from(height) > MAX_RASTER_PIXELS {
            return Err(CanvasError::Raster(format!(
                "raster of {width}x{height} pixels is too large"
            )));
        }

        let mut image = RasterImage::filled(width, height, options.background);
        let origin = (area.x0 - options.padding, area.y0 - options.padding);
        let to_pixels = |rect: Rect| {
            Rect::new(
                (rect.x0 - origin.0) * options.scale,
                (rect.y0 - origin.1) * options.scale,
                (rect.x1 - origin.0) * options.scale,
                (rect.y1 - origin.1) * options.scale,
            )
        };

        for member in members {
            let style = member.style();
            let bounds = to_pixels(member.bounds());
            match member {
                Primitive::Frame(_) => {
                    if let Some(fill) = style.fill_color {
                        fill_rect(&mut image, bounds, fill, style.opacity);
                    }
                    let stroke = (style.stroke_width * options.scale).max(1.0);
                    stroke_rect(&mut image, bounds, stroke, style.stroke_color, style.opacity);
                }
                Primitive::Text(_) => {
                    // Text is drawn as a bar covering the middle of the line box.
                    let inset = bounds.height() * 0.2;
                    let bar = Rect::new(bounds.x0, bounds.y0 + inset, bounds.x1, bounds.y1 - inset);
                    fill_rect(&mut image, bar, style.stroke_color, style.opacity);
                }
            }
        }
        Ok(image)
    }
}

fn stroke_rect(
    image: &mut RasterImage,
    rect: Rect,
    width: f64,
    color: SerializableColor,
    opacity: f64,
) {
    let edges = [
        Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + width),
        Rect::new(rect.x0, rect.y1 - width, rect.x1, rect.y1),
        Rect::new(rect.x0, rect.y0 + width, rect.x0 + width, rect.y1 - width),
        Rect::new(rect.x1 - width, rect.y0 + width, rect.x1, rect.y1 - width),
    ];
    for edge in edges {
        fill_rect(image, edge, color, opacity);
    }
}

/// Source-over fill of the pixels whose centers fall inside `rect`.
fn fill_rect(image: &mut RasterImage, rect: Rect, color: SerializableColor, opacity: f64) {
    let alpha = (f64::from(color.a) / 255.0 * opacity.clamp(0.0, 1.0)) as f32;
    if alpha <= 0.0 || !rect.is_finite() {
        return;
    }
    let clamp = |v: f64, max: u32| (v - 0.5).ceil().clamp(0.0, f64::from(max)) as u32;
    let (x0, x1) = (clamp(rect.x0, image.width), clamp(rect.x1, image.width));
    let (y0, y1) = (clamp(rect.y0, image.height), clamp(rect.y1, image.height));
    let src = [color.r, color.g, color.b];
    let stride = image.width as usize * 4;

    for y in y0..y1 {
        let row = y as usize * stride;
        for x in x0..x1 {
            let i = row + x as usize * 4;
            let Some(px) = image.pixels.get_mut(i..i + 4) else {
                continue;
            };
            for c in 0..3 {
                let blended = f32::from(src[c]) * alpha + f32::from(px[c]) * (1.0 - alpha);
                px[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
            let dst_a = f32::from(px[3]) / 255.0;
            px[3] = ((alpha + dst_a * (1.0 - alpha)) * 255.0).round() as u8;
        }
    }
}

impl CanvasHost for MemoryCanvas {
    fn scene_elements(&self) -> Vec<Primitive> {
        self.scene.to_vec()
    }

    fn update_scene(&mut self, update: SceneUpdate) -> CanvasResult<()> {
        if let Some(camera) = update.app_state.as_ref().and_then(|patch| patch.camera) {
            if !(camera.is_finite() && camera.zoom > 0.0) {
                return Err(CanvasError::Update(format!("invalid camera {camera:?}")));
            }
        }

        if let Some(patch) = &update.app_state {
            if patch.camera.is_some() {
                self.camera_writes += 1;
            }
            patch.apply(&mut self.app_state);
        }
        if let Some(elements) = update.elements {
            self.scene = Scene::from_primitives(elements);
            self.notify_listeners();
        }
        Ok(())
    }

    fn app_state(&self) -> AppState {
        self.app_state.clone()
    }

    fn files(&self) -> BinaryFiles {
        self.files.clone()
    }

    fn export_region_to_image<'a>(
        &'a self,
        request: RegionSnapshotRequest,
    ) -> BoxFuture<'a, CanvasResult<RasterImage>> {
        let attempt = self.exports.get();
        self.exports.set(attempt + 1);
        let result = match self.fail_exports_after {
            Some(limit) if attempt >= limit => Err(CanvasError::Raster(format!(
                "injected failure on export {}",
                attempt + 1
            ))),
            _ => self.paint(request.region, &request.members, &request.options),
        };
        Box::pin(async move { result })
    }

    fn capture_viewport_to_image<'a>(
        &'a self,
        options: RasterOptions,
    ) -> BoxFuture<'a, CanvasResult<RasterImage>> {
        let visible = self
            .app_state
            .camera
            .visible_world_rect(self.app_state.viewport_size);
        let elements = self.scene.to_vec();
        let result = self.paint(visible, &elements, &options);
        Box::pin(async move { result })
    }

    fn on_scene_change(&mut self, listener: SceneListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn request_takeover(&mut self) -> CanvasResult<()> {
        if self.deny_takeover {
            return Err(CanvasError::TakeoverDenied(
                "fullscreen is not available".to_string(),
            ));
        }
        self.taken_over = true;
        Ok(())
    }

    fn end_takeover(&mut self) {
        self.taken_over = false;
    }

    fn is_taken_over(&self) -> bool {
        self.taken_over
    }
}
