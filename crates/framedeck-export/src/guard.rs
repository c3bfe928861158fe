//! Camera restoration around export.

use framedeck_core::{CameraState, CanvasHost, SceneUpdate};
use std::ops::{Deref, DerefMut};

/// Borrows a host for the duration of an export and writes the camera it
/// had on entry back when dropped, on success and failure alike.
pub struct ViewportGuard<'h, H: CanvasHost + ?Sized> {
    host: &'h mut H,
    saved: CameraState,
}

impl<'h, H: CanvasHost + ?Sized> ViewportGuard<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        let saved = host.app_state().camera;
        Self { host, saved }
    }

    /// The camera that will be restored.
    pub fn saved(&self) -> CameraState {
        self.saved
    }
}

impl<H: CanvasHost + ?Sized> Deref for ViewportGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: CanvasHost + ?Sized> DerefMut for ViewportGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: CanvasHost + ?Sized> Drop for ViewportGuard<'_, H> {
    fn drop(&mut self) {
        match self.host.update_scene(SceneUpdate::camera(self.saved)) {
            Ok(()) => log::debug!("Restored camera {:?}", self.saved),
            Err(err) => log::error!("Failed to restore camera after export: {err}"),
        }
    }
}
