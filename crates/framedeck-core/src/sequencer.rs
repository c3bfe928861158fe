//! Region-to-region camera navigation.

use crate::animation::{ANIMATION_DURATION, ANIMATION_STEPS, AnimationStep, CameraAnimation};
use crate::camera::frame_region;
use crate::host::{CanvasHost, CanvasResult};
use crate::region::Region;
use crate::scene::SceneUpdate;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// What a framing request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The target camera was written in one update.
    Direct,
    /// An animation run was started with this token.
    Animating(u64),
    /// The viewport had no usable size; nothing was written.
    Skipped,
}

/// Frames regions and steps between them.
///
/// At most one animation is in flight. Starting a new one, or framing
/// directly, supersedes it; steps from a superseded run are discarded.
#[derive(Debug, Clone)]
pub struct Sequencer {
    current: usize,
    generation: u64,
    animation: Option<CameraAnimation>,
    duration: Duration,
    steps: u32,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self::with_timing(ANIMATION_DURATION, ANIMATION_STEPS)
    }

    pub fn with_timing(duration: Duration, steps: u32) -> Self {
        Self {
            current: 0,
            generation: 0,
            animation: None,
            duration,
            steps: steps.max(1),
        }
    }

    /// Index of the region last navigated to.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Token of the in-flight animation, if any.
    pub fn active_token(&self) -> Option<u64> {
        self.animation.as_ref().map(CameraAnimation::token)
    }

    /// Stop any in-flight animation. Its remaining steps become stale.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.animation.take().is_some() {
            log::debug!("Camera animation cancelled");
        }
    }

    /// Move the camera so `region` fills the current viewport.
    ///
    /// Without `animate`, or when the camera is already within tolerance of
    /// the target, the target is written once. Otherwise an eased animation
    /// starts at `now` and is advanced by [`Sequencer::tick`].
    pub fn frame<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        region: &Region,
        animate: bool,
        now: Instant,
    ) -> CanvasResult<FrameOutcome> {
        self.cancel();
        let state = host.app_state();
        let Some(target) = frame_region(region.rect, state.viewport_size) else {
            log::warn!(
                "Cannot frame '{}' in a {}x{} viewport",
                region.name,
                state.viewport_size.width,
                state.viewport_size.height
            );
            return Ok(FrameOutcome::Skipped);
        };

        if !animate || state.camera.approx_eq(&target) {
            host.update_scene(SceneUpdate::camera(target))?;
            return Ok(FrameOutcome::Direct);
        }

        let token = self.generation;
        self.animation = Some(CameraAnimation::with_timing(
            token,
            state.camera,
            target,
            now,
            self.duration,
            self.steps,
        ));
        log::debug!("Animating to '{}' (run {token})", region.name);
        Ok(FrameOutcome::Animating(token))
    }

    /// Push every animation step that is due. Returns how many were applied.
    pub fn tick<H: CanvasHost + ?Sized>(&mut self, host: &mut H, now: Instant) -> CanvasResult<usize> {
        let steps = match self.animation.as_mut() {
            Some(animation) => animation.due_steps(now),
            None => return Ok(0),
        };
        let mut applied = 0;
        for step in steps {
            if self.apply_step(host, step)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Write one animation step, unless it belongs to a superseded run.
    pub fn apply_step<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        step: AnimationStep,
    ) -> CanvasResult<bool> {
        let steps = match &self.animation {
            Some(animation) if animation.token() == step.token => animation.steps(),
            _ => {
                log::trace!("Discarding stale animation step {}", step.index);
                return Ok(false);
            }
        };

        if let Err(err) = host.update_scene(SceneUpdate::camera(step.camera)) {
            self.cancel();
            return Err(err);
        }
        if step.is_last(steps) {
            self.animation = None;
        }
        Ok(true)
    }

    /// Navigate to `index`. Out-of-range indices are ignored, and so is a
    /// region that cannot be framed in the current viewport.
    pub fn go_to<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        regions: &[Region],
        index: usize,
        animate: bool,
        now: Instant,
    ) -> CanvasResult<bool> {
        let Some(region) = regions.get(index) else {
            return Ok(false);
        };
        if self.frame(host, region, animate, now)? == FrameOutcome::Skipped {
            return Ok(false);
        }
        self.current = index;
        Ok(true)
    }

    /// Next region; stays put on the last one.
    pub fn next<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        regions: &[Region],
        animate: bool,
        now: Instant,
    ) -> CanvasResult<bool> {
        if regions.is_empty() {
            return Ok(false);
        }
        let current = self.current.min(regions.len() - 1);
        if current + 1 >= regions.len() {
            return Ok(false);
        }
        self.go_to(host, regions, current + 1, animate, now)
    }

    /// Previous region; stays put on the first one.
    pub fn previous<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        regions: &[Region],
        animate: bool,
        now: Instant,
    ) -> CanvasResult<bool> {
        if regions.is_empty() {
            return Ok(false);
        }
        let current = self.current.min(regions.len() - 1);
        if current == 0 {
            return Ok(false);
        }
        self.go_to(host, regions, current - 1, animate, now)
    }

    pub fn first<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        regions: &[Region],
        animate: bool,
        now: Instant,
    ) -> CanvasResult<bool> {
        self.go_to(host, regions, 0, animate, now)
    }

    pub fn last<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        regions: &[Region],
        animate: bool,
        now: Instant,
    ) -> CanvasResult<bool> {
        match regions.len() {
            0 => Ok(false),
            len => self.go_to(host, regions, len - 1, animate, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraState;
    use crate::memory::MemoryCanvas;
    use kurbo::{Rect, Size, Vec2};
    use uuid::Uuid;

    fn region(x: f64, y: f64) -> Region {
        Region {
            id: Uuid::new_v4(),
            name: format!("{x},{y}"),
            rect: Rect::new(x, y, x + 800.0, y + 600.0),
        }
    }

    fn canvas() -> MemoryCanvas {
        let mut canvas = MemoryCanvas::new();
        canvas.set_viewport_size(Size::new(1600.0, 900.0));
        canvas
    }

    #[test]
    fn test_direct_frame_single_update() {
        let mut host = canvas();
        let mut sequencer = Sequencer::new();
        let outcome = sequencer
            .frame(&mut host, &region(0.0, 0.0), false, Instant::now())
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Direct);
        assert_eq!(host.camera_writes(), 1);
        assert!((host.app_state().camera.zoom - 900.0 / 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_epsilon_skip_is_one_update() {
        let mut host = canvas();
        let target = region(0.0, 0.0);
        let goal = frame_region(target.rect, Size::new(1600.0, 900.0)).unwrap();
        host.set_camera(CameraState::new(goal.zoom + 0.005, goal.offset + Vec2::new(0.5, -0.5)));
        let writes_before = host.camera_writes();

        let mut sequencer = Sequencer::new();
        let start = Instant::now();
        let outcome = sequencer.frame(&mut host, &target, true, start).unwrap();
        assert_eq!(outcome, FrameOutcome::Direct);
        assert_eq!(sequencer.tick(&mut host, start + Duration::from_secs(2)).unwrap(), 0);
        assert_eq!(host.camera_writes() - writes_before, 1);
    }

    #[test]
    fn test_animation_runs_sixty_steps() {
        let mut host = canvas();
        let mut sequencer = Sequencer::new();
        let start = Instant::now();
        let outcome = sequencer.frame(&mut host, &region(5000.0, 0.0), true, start).unwrap();
        assert!(matches!(outcome, FrameOutcome::Animating(_)));

        let mut applied = 0;
        for i in 1..=60u64 {
            applied += sequencer
                .tick(&mut host, start + Duration::from_micros(i * 16_667))
                .unwrap();
        }
        assert_eq!(applied, 60);
        assert_eq!(host.camera_writes(), 60);
        assert!(!sequencer.is_animating());
    }

    #[test]
    fn test_new_request_supersedes_and_stale_steps_dropped() {
        let mut host = canvas();
        let mut sequencer = Sequencer::new();
        let start = Instant::now();
        let FrameOutcome::Animating(first) =
            sequencer.frame(&mut host, &region(5000.0, 0.0), true, start).unwrap()
        else {
            panic!("expected animation");
        };
        let stale = AnimationStep {
            token: first,
            index: 1,
            camera: CameraState::new(3.0, Vec2::ZERO),
        };

        let second = sequencer
            .frame(&mut host, &region(-5000.0, 0.0), true, start)
            .unwrap();
        assert!(matches!(second, FrameOutcome::Animating(t) if t != first));
        assert!(!sequencer.apply_step(&mut host, stale).unwrap());
        assert_eq!(host.camera_writes(), 0);

        sequencer.tick(&mut host, start + Duration::from_secs(1)).unwrap();
        let expected = frame_region(region(-5000.0, 0.0).rect, Size::new(1600.0, 900.0)).unwrap();
        assert!(host.app_state().camera.approx_eq(&expected));
    }

    #[test]
    fn test_cancel_discards_remaining_steps() {
        let mut host = canvas();
        let mut sequencer = Sequencer::new();
        let start = Instant::now();
        sequencer.frame(&mut host, &region(5000.0, 0.0), true, start).unwrap();
        sequencer.tick(&mut host, start + Duration::from_millis(100)).unwrap();
        let writes = host.camera_writes();
        sequencer.cancel();
        assert_eq!(sequencer.tick(&mut host, start + Duration::from_secs(2)).unwrap(), 0);
        assert_eq!(host.camera_writes(), writes);
    }

    #[test]
    fn test_bounded_navigation() {
        let mut host = canvas();
        let regions = vec![region(0.0, 0.0), region(1400.0, 0.0), region(2800.0, 0.0)];
        let mut sequencer = Sequencer::new();
        let now = Instant::now();

        assert!(!sequencer.previous(&mut host, &regions, false, now).unwrap());
        assert!(sequencer.next(&mut host, &regions, false, now).unwrap());
        assert!(sequencer.next(&mut host, &regions, false, now).unwrap());
        assert_eq!(sequencer.current(), 2);
        assert!(!sequencer.next(&mut host, &regions, false, now).unwrap());
        assert!(sequencer.first(&mut host, &regions, false, now).unwrap());
        assert_eq!(sequencer.current(), 0);
        assert!(sequencer.last(&mut host, &regions, false, now).unwrap());
        assert_eq!(sequencer.current(), 2);
        assert!(!sequencer.go_to(&mut host, &regions, 3, false, now).unwrap());
        assert!(!sequencer.last(&mut host, &[], false, now).unwrap());
    }

    #[test]
    fn test_current_clamped_after_shrink() {
        let mut host = canvas();
        let regions = vec![region(0.0, 0.0), region(1400.0, 0.0)];
        let mut sequencer = Sequencer::new();
        sequencer.set_current(5);
        assert!(sequencer.previous(&mut host, &regions, false, Instant::now()).unwrap());
        assert_eq!(sequencer.current(), 0);
    }

    #[test]
    fn test_empty_viewport_skips() {
        let mut host = canvas();
        host.set_viewport_size(Size::ZERO);
        let mut sequencer = Sequencer::new();
        let outcome = sequencer
            .frame(&mut host, &region(0.0, 0.0), true, Instant::now())
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(host.camera_writes(), 0);
    }

    #[test]
    fn test_unframeable_request_still_supersedes() {
        let mut host = canvas();
        let regions = vec![region(0.0, 0.0), region(5000.0, 0.0), region(-5000.0, 0.0)];
        let mut sequencer = Sequencer::new();
        let start = Instant::now();
        assert!(sequencer.go_to(&mut host, &regions, 1, true, start).unwrap());
        assert!(sequencer.is_animating());

        host.set_viewport_size(Size::ZERO);
        assert!(!sequencer.go_to(&mut host, &regions, 2, true, start).unwrap());
        assert_eq!(sequencer.current(), 1);
        assert!(!sequencer.is_animating());

        host.set_viewport_size(Size::new(1600.0, 900.0));
        assert_eq!(sequencer.tick(&mut host, start + Duration::from_secs(2)).unwrap(), 0);
        assert_eq!(host.camera_writes(), 0);
    }
}
