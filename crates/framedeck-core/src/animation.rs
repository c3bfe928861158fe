//! Stepped camera animation.

use crate::camera::CameraState;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Number of camera updates in one transition.
pub const ANIMATION_STEPS: u32 = 60;
/// Length of one transition.
pub const ANIMATION_DURATION: Duration = Duration::from_millis(1000);

/// Cubic ease-out: fast start, gentle landing.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// One intermediate camera state belonging to a specific animation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStep {
    /// Generation of the run that produced this step.
    pub token: u64,
    /// 1-based step number.
    pub index: u32,
    pub camera: CameraState,
}

impl AnimationStep {
    pub fn is_last(&self, steps: u32) -> bool {
        self.index >= steps
    }
}

/// A transition from one camera state to another.
#[derive(Debug, Clone)]
pub struct CameraAnimation {
    token: u64,
    from: CameraState,
    to: CameraState,
    start: Instant,
    duration: Duration,
    steps: u32,
    emitted: u32,
}

impl CameraAnimation {
    pub fn new(token: u64, from: CameraState, to: CameraState, start: Instant) -> Self {
        Self::with_timing(token, from, to, start, ANIMATION_DURATION, ANIMATION_STEPS)
    }

    pub fn with_timing(
        token: u64,
        from: CameraState,
        to: CameraState,
        start: Instant,
        duration: Duration,
        steps: u32,
    ) -> Self {
        Self {
            token,
            from,
            to,
            start,
            duration,
            steps: steps.max(1),
            emitted: 0,
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn target(&self) -> CameraState {
        self.to
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.emitted >= self.steps
    }

    /// The camera at step `index` (1-based).
    pub fn step(&self, index: u32) -> AnimationStep {
        let index = index.min(self.steps);
        let progress = f64::from(index) / f64::from(self.steps);
        let camera = if index == self.steps {
            self.to
        } else {
            CameraState::lerp(&self.from, &self.to, ease_out_cubic(progress))
        };
        AnimationStep {
            token: self.token,
            index,
            camera,
        }
    }

    fn step_due_at(&self, index: u32) -> Instant {
        self.start + self.duration.mul_f64(f64::from(index) / f64::from(self.steps))
    }

    /// Steps whose time has come, in order. Each step is emitted once.
    pub fn due_steps(&mut self, now: Instant) -> Vec<AnimationStep> {
        let mut due = Vec::new();
        while self.emitted < self.steps && self.step_due_at(self.emitted + 1) <= now {
            self.emitted += 1;
            due.push(self.step(self.emitted));
        }
        due
    }
}
