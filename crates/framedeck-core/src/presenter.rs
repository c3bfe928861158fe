//! Presentation mode: takeover, tool switching and keyboard navigation.

use crate::debounce::{ChangeCounter, DeferredTask, RefreshDebouncer};
use crate::host::{CanvasError, CanvasHost, SubscriptionId};
use crate::region::{Region, RegionRegistry};
use crate::scene::{AppStatePatch, SceneUpdate, ToolKind};
use crate::sequencer::Sequencer;
use std::time::Duration;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Delay between requesting the takeover and framing the first region, so
/// the viewport can settle at its new size.
pub const TAKEOVER_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Presentation failures.
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("There are no regions to present")]
    NoRegions,
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Result type for presentation operations.
pub type PresentResult<T> = Result<T, PresentError>;

/// Whether a presentation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationMode {
    #[default]
    Idle,
    Presenting,
}

/// User intents understood by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationCommand {
    Start,
    Next,
    Previous,
    First,
    Last,
    Exit,
    ToggleTakeover,
}

impl PresentationCommand {
    /// Map a key name (DOM `KeyboardEvent.key` style) to a command.
    ///
    /// While idle only `p` is bound; while presenting the navigation keys are.
    pub fn from_key(key: &str, mode: PresentationMode) -> Option<Self> {
        match mode {
            PresentationMode::Idle => match key {
                "p" | "P" => Some(Self::Start),
                _ => None,
            },
            PresentationMode::Presenting => match key {
                "ArrowRight" | " " | "Space" => Some(Self::Next),
                "ArrowLeft" => Some(Self::Previous),
                "Home" => Some(Self::First),
                "End" => Some(Self::Last),
                "Escape" => Some(Self::Exit),
                "f" | "F" => Some(Self::ToggleTakeover),
                _ => None,
            },
        }
    }
}

/// Drives a presentation over a canvas host.
///
/// The host's frame loop calls [`Presenter::tick`]; it rebuilds the region
/// registry after scene changes settle, fires the deferred first-frame
/// navigation and advances camera animations.
pub struct Presenter {
    mode: PresentationMode,
    registry: RegionRegistry,
    sequencer: Sequencer,
    debouncer: RefreshDebouncer,
    changes: ChangeCounter,
    subscription: Option<SubscriptionId>,
    first_frame: DeferredTask,
    settle_delay: Duration,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            mode: PresentationMode::Idle,
            registry: RegionRegistry::new(),
            sequencer: Sequencer::new(),
            debouncer: RefreshDebouncer::default(),
            changes: ChangeCounter::new(),
            subscription: None,
            first_frame: DeferredTask::new(),
            settle_delay: TAKEOVER_SETTLE_DELAY,
        }
    }

    /// Replace the camera sequencer (custom animation timing).
    pub fn with_sequencer(mut self, sequencer: Sequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Subscribe to scene changes and build the initial registry.
    pub fn attach<H: CanvasHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(previous) = self.subscription.take() {
            host.unsubscribe(previous);
        }
        self.subscription = Some(host.on_scene_change(self.changes.listener()));
        self.refresh_now(host);
    }

    pub fn detach<H: CanvasHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(subscription) = self.subscription.take() {
            host.unsubscribe(subscription);
        }
        self.debouncer.cancel();
    }

    /// Rebuild the registry immediately, bypassing the debounce.
    pub fn refresh_now<H: CanvasHost + ?Sized>(&mut self, host: &H) -> &[Region] {
        self.debouncer.cancel();
        self.registry.refresh(&host.scene_elements())
    }

    /// Rebuild the registry if the scene changed since the last refresh, so
    /// navigation never runs against a stale ordering.
    fn sync_registry<H: CanvasHost + ?Sized>(&mut self, host: &H) {
        if !(self.changes.take_changes() || self.debouncer.is_pending()) {
            return;
        }
        let len = self.refresh_now(host).len();
        if len > 0 && self.sequencer.current() >= len {
            self.sequencer.set_current(len - 1);
        }
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn is_presenting(&self) -> bool {
        self.mode == PresentationMode::Presenting
    }

    pub fn regions(&self) -> &[Region] {
        self.registry.regions()
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn current_index(&self) -> usize {
        self.sequencer.current()
    }

    pub fn current_region(&self) -> Option<&Region> {
        self.registry.get(self.sequencer.current())
    }

    /// Enter presentation mode.
    ///
    /// Requires at least one region. Switches to the laser pointer, requests
    /// the viewport takeover and frames the first region once the settle
    /// delay has passed, whether or not the takeover was granted.
    pub fn start<H: CanvasHost + ?Sized>(&mut self, host: &mut H, now: Instant) -> PresentResult<()> {
        if self.is_presenting() {
            return Ok(());
        }
        self.sync_registry(host);
        if self.registry.is_empty() {
            log::warn!("Cannot start a presentation without regions");
            return Err(PresentError::NoRegions);
        }

        host.update_scene(SceneUpdate::app_state(AppStatePatch::tool(ToolKind::LaserPointer)))?;
        self.mode = PresentationMode::Presenting;
        match host.request_takeover() {
            Ok(()) => log::info!("Presentation started with {} region(s)", self.registry.len()),
            Err(err) => log::warn!("Presenting without takeover: {err}"),
        }
        self.first_frame.schedule(now, self.settle_delay);
        Ok(())
    }

    /// Leave presentation mode and give the viewport back.
    pub fn stop<H: CanvasHost + ?Sized>(&mut self, host: &mut H) -> PresentResult<()> {
        if !self.is_presenting() {
            return Ok(());
        }
        self.enter_idle();
        if host.is_taken_over() {
            host.end_takeover();
        }
        host.update_scene(SceneUpdate::app_state(AppStatePatch::tool(ToolKind::Select)))?;
        log::info!("Presentation stopped");
        Ok(())
    }

    /// The takeover ended outside our control (e.g. the user left fullscreen).
    pub fn on_takeover_exited<H: CanvasHost + ?Sized>(&mut self, host: &mut H) -> PresentResult<()> {
        if !self.is_presenting() {
            return Ok(());
        }
        log::info!("Takeover exited externally; leaving presentation");
        self.enter_idle();
        host.update_scene(SceneUpdate::app_state(AppStatePatch::tool(ToolKind::Select)))?;
        Ok(())
    }

    fn enter_idle(&mut self) {
        self.mode = PresentationMode::Idle;
        self.first_frame.cancel();
        self.sequencer.cancel();
    }

    /// Cancel any camera animation so an export can move the viewport.
    /// The presentation itself keeps running.
    pub fn suspend_for_export(&mut self) {
        self.sequencer.cancel();
    }

    /// Apply a command. Returns whether anything happened.
    pub fn dispatch<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        command: PresentationCommand,
        now: Instant,
    ) -> PresentResult<bool> {
        if !self.is_presenting() {
            return match command {
                PresentationCommand::Start => self.start(host, now).map(|()| true),
                _ => Ok(false),
            };
        }

        self.sync_registry(host);
        let regions = self.registry.regions();
        let moved = match command {
            PresentationCommand::Start => false,
            PresentationCommand::Next => self.sequencer.next(host, regions, true, now)?,
            PresentationCommand::Previous => self.sequencer.previous(host, regions, true, now)?,
            PresentationCommand::First => self.sequencer.first(host, regions, true, now)?,
            PresentationCommand::Last => self.sequencer.last(host, regions, true, now)?,
            PresentationCommand::Exit => {
                self.stop(host)?;
                true
            }
            PresentationCommand::ToggleTakeover => {
                if host.is_taken_over() {
                    // Leaving fullscreen ends the presentation.
                    host.end_takeover();
                    self.on_takeover_exited(host)?;
                } else if let Err(err) = host.request_takeover() {
                    log::warn!("Takeover request failed: {err}");
                }
                true
            }
        };
        Ok(moved)
    }

    /// Handle a key press by name.
    pub fn handle_key<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        key: &str,
        now: Instant,
    ) -> PresentResult<bool> {
        match PresentationCommand::from_key(key, self.mode) {
            Some(command) => self.dispatch(host, command, now),
            None => Ok(false),
        }
    }

    /// Navigate without animation, e.g. to the first region of a new deck.
    pub fn jump_to<H: CanvasHost + ?Sized>(
        &mut self,
        host: &mut H,
        index: usize,
        now: Instant,
    ) -> PresentResult<bool> {
        self.sync_registry(host);
        Ok(self.sequencer.go_to(host, self.registry.regions(), index, false, now)?)
    }

    /// Advance timers: debounced refresh, deferred first frame, animation.
    pub fn tick<H: CanvasHost + ?Sized>(&mut self, host: &mut H, now: Instant) -> PresentResult<()> {
        if self.changes.take_changes() {
            self.debouncer.notify(now);
        }
        if self.debouncer.poll(now) {
            self.registry.refresh(&host.scene_elements());
        }
        if self.first_frame.poll(now).is_some() && self.is_presenting() {
            self.sequencer
                .go_to(host, self.registry.regions(), 0, true, now)?;
        }
        self.sequencer.tick(host, now)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCanvas;
    use crate::primitive::{Frame, Primitive};
    use kurbo::{Point, Size};

    fn deck(count: usize) -> MemoryCanvas {
        let frames = (0..count)
            .map(|i| {
                Primitive::Frame(Frame::new(
                    Point::new(i as f64 * 1400.0, 0.0),
                    1200.0,
                    800.0,
                    format!("Slide {}", i + 1),
                ))
            })
            .collect();
        let mut canvas = MemoryCanvas::new();
        canvas.set_viewport_size(Size::new(1600.0, 900.0));
        canvas.update_scene(SceneUpdate::elements(frames)).unwrap();
        canvas
    }

    fn attached(count: usize) -> (MemoryCanvas, Presenter) {
        let mut canvas = deck(count);
        let mut presenter = Presenter::new();
        presenter.attach(&mut canvas);
        (canvas, presenter)
    }

    #[test]
    fn test_start_without_regions_stays_idle() {
        let (mut canvas, mut presenter) = attached(0);
        let result = presenter.start(&mut canvas, Instant::now());
        assert!(matches!(result, Err(PresentError::NoRegions)));
        assert_eq!(presenter.mode(), PresentationMode::Idle);
        assert_eq!(canvas.app_state().active_tool, ToolKind::Select);
        assert!(!canvas.is_taken_over());
    }

    #[test]
    fn test_start_frames_first_region_after_settle() {
        let (mut canvas, mut presenter) = attached(3);
        let start = Instant::now();
        presenter.start(&mut canvas, start).unwrap();
        assert!(presenter.is_presenting());
        assert!(canvas.is_taken_over());
        assert_eq!(canvas.app_state().active_tool, ToolKind::LaserPointer);

        presenter.tick(&mut canvas, start + Duration::from_millis(100)).unwrap();
        assert_eq!(canvas.camera_writes(), 0);

        presenter.tick(&mut canvas, start + Duration::from_millis(150)).unwrap();
        presenter.tick(&mut canvas, start + Duration::from_millis(1200)).unwrap();
        let expected = crate::camera::frame_region(presenter.regions()[0].rect, Size::new(1600.0, 900.0)).unwrap();
        assert!(canvas.app_state().camera.approx_eq(&expected));
        assert_eq!(presenter.current_index(), 0);
    }

    #[test]
    fn test_denied_takeover_still_navigates() {
        let (mut canvas, mut presenter) = attached(2);
        canvas.deny_takeover(true);
        let start = Instant::now();
        presenter.start(&mut canvas, start).unwrap();
        assert!(presenter.is_presenting());
        assert!(!canvas.is_taken_over());
        presenter.tick(&mut canvas, start + Duration::from_millis(150)).unwrap();
        presenter.tick(&mut canvas, start + Duration::from_secs(2)).unwrap();
        assert!(canvas.camera_writes() > 0);
    }

    #[test]
    fn test_stop_restores_tool_and_takeover() {
        let (mut canvas, mut presenter) = attached(1);
        let now = Instant::now();
        presenter.start(&mut canvas, now).unwrap();
        presenter.dispatch(&mut canvas, PresentationCommand::Exit, now).unwrap();
        assert_eq!(presenter.mode(), PresentationMode::Idle);
        assert_eq!(canvas.app_state().active_tool, ToolKind::Select);
        assert!(!canvas.is_taken_over());
    }

    #[test]
    fn test_external_exit_goes_idle() {
        let (mut canvas, mut presenter) = attached(1);
        presenter.start(&mut canvas, Instant::now()).unwrap();
        canvas.exit_takeover_externally();
        presenter.on_takeover_exited(&mut canvas).unwrap();
        assert_eq!(presenter.mode(), PresentationMode::Idle);
        assert_eq!(canvas.app_state().active_tool, ToolKind::Select);
    }

    #[test]
    fn test_toggle_takeover_off_ends_presentation() {
        let (mut canvas, mut presenter) = attached(1);
        let now = Instant::now();
        presenter.start(&mut canvas, now).unwrap();
        presenter.handle_key(&mut canvas, "f", now).unwrap();
        assert!(!presenter.is_presenting());
    }

    #[test]
    fn test_keys_navigate() {
        let (mut canvas, mut presenter) = attached(3);
        let start = Instant::now();
        assert!(presenter.handle_key(&mut canvas, "p", start).unwrap());
        presenter.tick(&mut canvas, start + Duration::from_millis(150)).unwrap();

        let now = start + Duration::from_millis(200);
        assert!(presenter.handle_key(&mut canvas, "ArrowRight", now).unwrap());
        assert!(presenter.handle_key(&mut canvas, " ", now).unwrap());
        assert!(!presenter.handle_key(&mut canvas, "ArrowRight", now).unwrap());
        assert_eq!(presenter.current_index(), 2);
        assert!(presenter.handle_key(&mut canvas, "Home", now).unwrap());
        assert_eq!(presenter.current_index(), 0);
        assert!(presenter.handle_key(&mut canvas, "End", now).unwrap());
        assert_eq!(presenter.current_index(), 2);
        assert!(presenter.handle_key(&mut canvas, "ArrowLeft", now).unwrap());
        assert_eq!(presenter.current_index(), 1);
        assert!(!presenter.handle_key(&mut canvas, "x", now).unwrap());
    }

    #[test]
    fn test_idle_ignores_navigation_keys() {
        assert_eq!(
            PresentationCommand::from_key("ArrowRight", PresentationMode::Idle),
            None
        );
        assert_eq!(
            PresentationCommand::from_key("P", PresentationMode::Idle),
            Some(PresentationCommand::Start)
        );
        assert_eq!(
            PresentationCommand::from_key("p", PresentationMode::Presenting),
            None
        );
    }

    #[test]
    fn test_scene_changes_refresh_after_quiet_period() {
        let (mut canvas, mut presenter) = attached(1);
        assert_eq!(presenter.regions().len(), 1);

        let mut elements = canvas.scene_elements();
        elements.push(Primitive::Frame(Frame::new(Point::new(0.0, 2000.0), 100.0, 100.0, "New")));
        canvas.update_scene(SceneUpdate::elements(elements)).unwrap();

        let start = Instant::now();
        presenter.tick(&mut canvas, start).unwrap();
        assert_eq!(presenter.regions().len(), 1);
        presenter.tick(&mut canvas, start + Duration::from_millis(100)).unwrap();
        assert_eq!(presenter.regions().len(), 2);
    }

    #[test]
    fn test_start_sees_fresh_deck_before_debounce() {
        let (mut canvas, mut presenter) = attached(0);
        let frame = Primitive::Frame(Frame::new(Point::ZERO, 1200.0, 800.0, "Fresh"));
        canvas.update_scene(SceneUpdate::elements(vec![frame])).unwrap();

        let now = Instant::now();
        presenter.tick(&mut canvas, now).unwrap();
        presenter.start(&mut canvas, now).unwrap();
        assert!(presenter.is_presenting());
        assert_eq!(presenter.regions().len(), 1);
        assert_eq!(presenter.regions()[0].name, "Fresh");
    }

    #[test]
    fn test_next_reaches_region_added_while_presenting() {
        let (mut canvas, mut presenter) = attached(1);
        let start = Instant::now();
        presenter.start(&mut canvas, start).unwrap();
        presenter.tick(&mut canvas, start + Duration::from_millis(150)).unwrap();

        let mut elements = canvas.scene_elements();
        elements.push(Primitive::Frame(Frame::new(
            Point::new(1400.0, 0.0),
            1200.0,
            800.0,
            "Added",
        )));
        canvas.update_scene(SceneUpdate::elements(elements)).unwrap();

        let now = start + Duration::from_millis(160);
        assert!(presenter.dispatch(&mut canvas, PresentationCommand::Next, now).unwrap());
        assert_eq!(presenter.regions().len(), 2);
        assert_eq!(presenter.current_index(), 1);
        assert_eq!(presenter.current_region().unwrap().name, "Added");
    }

    #[test]
    fn test_current_clamped_when_regions_removed() {
        let (mut canvas, mut presenter) = attached(3);
        let start = Instant::now();
        presenter.start(&mut canvas, start).unwrap();
        presenter.tick(&mut canvas, start + Duration::from_millis(150)).unwrap();
        presenter.dispatch(&mut canvas, PresentationCommand::Last, start).unwrap();
        assert_eq!(presenter.current_index(), 2);

        let mut elements = canvas.scene_elements();
        elements.truncate(1);
        canvas.update_scene(SceneUpdate::elements(elements)).unwrap();
        assert!(!presenter.dispatch(&mut canvas, PresentationCommand::Next, start).unwrap());
        assert_eq!(presenter.current_index(), 0);
    }

    #[test]
    fn test_suspend_for_export_keeps_mode() {
        let (mut canvas, mut presenter) = attached(2);
        let start = Instant::now();
        presenter.start(&mut canvas, start).unwrap();
        presenter.tick(&mut canvas, start + Duration::from_millis(150)).unwrap();
        presenter.suspend_for_export();
        let writes = canvas.camera_writes();
        presenter.tick(&mut canvas, start + Duration::from_secs(2)).unwrap();
        assert_eq!(canvas.camera_writes(), writes);
        assert!(presenter.is_presenting());
    }

    #[test]
    fn test_detach_stops_listening() {
        let (mut canvas, mut presenter) = attached(1);
        presenter.detach(&mut canvas);
        canvas.update_scene(SceneUpdate::elements(Vec::new())).unwrap();
        let start = Instant::now();
        presenter.tick(&mut canvas, start).unwrap();
        presenter.tick(&mut canvas, start + Duration::from_secs(1)).unwrap();
        assert_eq!(presenter.regions().len(), 1);
    }
}
