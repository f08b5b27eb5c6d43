//! Composition root: owns every camera component and the bus wiring.
//!
//! A [`CameraController`] is constructed explicitly and passed by reference.
//! `initialize` subscribes to the bus, `dispose` tears every subscription and
//! timer down again; after `dispose` every public operation returns
//! [`CameraError::Disposed`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;

use crate::bus::{BusEvent, EventBus, PublisherId, Subscription, Topic};
use crate::config::SceneConfig;
use crate::coordinator::{CoordinatorSettings, InteractionCoordinator};
use crate::driver::{AnimationDriver, BlendMode, FrameReport, MotionContext, RenderTarget};
use crate::easing::Easing;
use crate::error::CameraError;
use crate::input::{InputController, InputEvent, InputResponse, InputSettings, InputSignal, InteractionSink};
use crate::motion::{MotionParamsPatch, MotionType};
use crate::pose::{Pose, PosePatch, PoseSource};
use crate::presets;
use crate::snapshot::CameraSnapshot;
use crate::store::{InteractionKind, MotionSwitch, PoseStore, StoreSnapshot};
use crate::transition::{AnimationHandle, CompleteFn, ProjectionMode, TransitionService, UpdateFn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Initialized,
    Disposed,
}

/// Bus events received since the last frame. The controller subscribes under
/// its own [`PublisherId`], so its own publications never land here.
type SharedMailbox = Arc<Mutex<VecDeque<BusEvent>>>;

fn lock(mailbox: &SharedMailbox) -> MutexGuard<'_, VecDeque<BusEvent>> {
    mailbox.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settle the driver and pause motion ahead of a gesture.
fn suspend_for_interaction(
    driver: &mut AnimationDriver,
    coordinator: &mut InteractionCoordinator,
    transitions: &mut TransitionService,
    store: &mut PoseStore,
    now_ms: f64,
) -> Result<(), CameraError> {
    if transitions.cancel_pose(now_ms).is_some() {
        log::debug!("pose transition cancelled by interaction");
    }
    driver.settle(store)?;
    coordinator.on_interaction_start(store, now_ms);
    Ok(())
}

struct ControllerSink<'a> {
    driver: &'a mut AnimationDriver,
    coordinator: &'a mut InteractionCoordinator,
    transitions: &'a mut TransitionService,
    now_ms: f64,
}

impl InteractionSink for ControllerSink<'_> {
    fn interaction_started(&mut self, _kind: InteractionKind, store: &mut PoseStore) {
        if let Err(e) = suspend_for_interaction(self.driver, self.coordinator, self.transitions, store, self.now_ms) {
            log::warn!("failed to settle camera before interaction: {e}");
        }
    }

    fn interaction_ended(&mut self, store: &mut PoseStore) {
        self.coordinator.on_interaction_end(store, self.now_ms);
    }
}

pub struct CameraController {
    config: SceneConfig,
    store: PoseStore,
    input: InputController,
    driver: AnimationDriver,
    transitions: TransitionService,
    coordinator: InteractionCoordinator,
    motion: MotionContext,
    easing: Easing,
    bus: Option<(EventBus, PublisherId)>,
    subscriptions: Vec<Subscription>,
    mailbox: SharedMailbox,
    lifecycle: Lifecycle,
    clock_ms: f64,
    paused_at: Option<f64>,
    /// Motion the controller-level pause suspended.
    resume_motion_on_resume: bool,
    total_paused_ms: f64,
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("lifecycle", &self.lifecycle)
            .field("clock_ms", &self.clock_ms)
            .field("store", &self.store.state())
            .field("driver", &self.driver)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::build(SceneConfig::default())
    }
}

impl CameraController {
    pub fn new(config: SceneConfig) -> Result<Self, CameraError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SceneConfig) -> Self {
        let limits = config.pose_limits();
        let mode = config.projection_mode;
        let pose = mode.camera_config();
        let mut controller = Self {
            store: PoseStore::new(pose, limits),
            input: InputController::new(InputSettings::from(&config)),
            driver: AnimationDriver::new(pose, limits, config.camera_motion_blend, config.sync_interval_frames),
            transitions: TransitionService::new(mode),
            coordinator: InteractionCoordinator::new(CoordinatorSettings::from(&config)),
            motion: MotionContext {
                params: config.motion_params,
                tracking_target: None,
            },
            easing: Easing::default(),
            bus: None,
            subscriptions: Vec::new(),
            mailbox: SharedMailbox::default(),
            lifecycle: Lifecycle::Created,
            clock_ms: 0.0,
            paused_at: None,
            resume_motion_on_resume: false,
            total_paused_ms: 0.0,
            config,
        };
        controller.driver.adopt(&controller.store, 0.0);
        controller
    }

    fn live(&self) -> Result<(), CameraError> {
        match self.lifecycle {
            Lifecycle::Disposed => Err(CameraError::Disposed),
            Lifecycle::Created | Lifecycle::Initialized => Ok(()),
        }
    }

    fn publish(&self, event: BusEvent) {
        if let Some((bus, me)) = self.bus.as_ref() {
            bus.publish_as(*me, event);
        }
    }

    fn publish_pose(&self, source: PoseSource) {
        self.publish(BusEvent::PoseChanged {
            pose: self.driver.current_pose(&self.store),
            source,
        });
    }

    // -- lifecycle ---------------------------------------------------------

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Subscribe to the bus and start the configured motion. Calling it again
    /// is a no-op.
    pub fn initialize(&mut self, bus: EventBus) -> Result<(), CameraError> {
        match self.lifecycle {
            Lifecycle::Disposed => return Err(CameraError::Disposed),
            Lifecycle::Initialized => return Ok(()),
            Lifecycle::Created => {}
        }
        let me = bus.register_publisher();
        for topic in [
            Topic::InteractionStart,
            Topic::InteractionEnd,
            Topic::PoseChanged,
            Topic::SystemError,
        ] {
            let mailbox = self.mailbox.clone();
            self.subscriptions.push(bus.subscribe_as(me, topic, move |event| {
                lock(&mailbox).push_back(event.clone());
            }));
        }
        self.bus = Some((bus, me));
        self.lifecycle = Lifecycle::Initialized;

        let kind = self.config.camera_motion_type;
        if !kind.is_static() {
            self.start_motion(kind)?;
        }
        log::debug!("camera controller initialized");
        self.publish(BusEvent::SystemInitialized);
        Ok(())
    }

    /// Release every subscription, timer, transition and the render target.
    /// A no-op when never initialized; repeated calls are harmless.
    pub fn dispose(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Initialized {
            return false;
        }
        self.publish(BusEvent::SystemDisposed);
        for sub in self.subscriptions.drain(..) {
            sub.dispose();
        }
        let timers = self.coordinator.teardown();
        let transitions = self.transitions.cancel_all();
        self.input.cancel();
        self.driver.unbind();
        lock(&self.mailbox).clear();
        self.bus = None;
        self.lifecycle = Lifecycle::Disposed;
        log::debug!("camera controller disposed ({timers} timers, {transitions} transitions cleared)");
        true
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    /// Stop motion, cancel all animation and return to the projection's
    /// canonical pose.
    pub fn reset(&mut self) -> Result<(), CameraError> {
        self.live()?;
        self.store.stop_motion();
        self.coordinator.release();
        self.transitions.cancel_all();
        self.input.cancel();
        self.store.end_interaction();
        let pose = self.transitions.projection_mode().camera_config();
        self.store.set_pose(pose, PoseSource::Reset)?;
        self.driver.reset(self.store.pose());
        self.driver.adopt(&self.store, self.clock_ms);
        log::debug!("camera reset");
        self.publish_pose(PoseSource::Reset);
        Ok(())
    }

    /// Controller-level pause: freezes motion and transitions and starts
    /// counting paused time.
    pub fn pause(&mut self) -> Result<bool, CameraError> {
        self.live()?;
        if self.paused_at.is_some() {
            return Ok(false);
        }
        let now = self.clock_ms;
        self.paused_at = Some(now);
        self.transitions.pause_all(now);
        // motion held by an interaction is still owed its resume
        let owed = self.coordinator.owns_pause();
        self.coordinator.release();
        let running = self.store.pause_motion(now);
        self.resume_motion_on_resume = running || owed;
        self.driver.settle(&mut self.store)?;
        self.publish(BusEvent::SystemPaused { at_ms: now });
        Ok(true)
    }

    pub fn resume(&mut self) -> Result<bool, CameraError> {
        self.live()?;
        let Some(at) = self.paused_at.take() else {
            return Ok(false);
        };
        let now = self.clock_ms;
        let paused_for_ms = (now - at).max(0.0);
        self.total_paused_ms += paused_for_ms;
        self.transitions.resume_all(now);
        if std::mem::take(&mut self.resume_motion_on_resume) {
            if self.store.interaction().is_interacting {
                self.coordinator.claim_pause();
            } else {
                self.store.resume_motion(now);
            }
        }
        self.publish(BusEvent::SystemResumed { paused_for_ms });
        Ok(true)
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Total time spent in controller-level pause, including a pause in progress.
    pub fn total_paused_ms(&self) -> f64 {
        self.total_paused_ms + self.paused_at.map_or(0.0, |at| (self.clock_ms - at).max(0.0))
    }

    // -- clock & frame -----------------------------------------------------

    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Advance the controller clock without running a frame, for hosts that
    /// issue commands between frames.
    pub fn set_clock(&mut self, now_ms: f64) {
        if now_ms.is_finite() && now_ms > self.clock_ms {
            self.clock_ms = now_ms;
        }
    }

    /// Run one frame: drain bus events, close idle gestures, fire due
    /// resumes, then resolve and apply the pose.
    pub fn update_frame(&mut self, dt: f32, now_ms: f64) -> Result<FrameReport, CameraError> {
        self.live()?;
        self.set_clock(now_ms);
        let now = self.clock_ms;
        self.process_events()?;

        let mut sink = ControllerSink {
            driver: &mut self.driver,
            coordinator: &mut self.coordinator,
            transitions: &mut self.transitions,
            now_ms: now,
        };
        let idle = self.input.tick(now, &mut self.store, &mut sink);
        self.after_input(&idle);

        if self.coordinator.poll(&mut self.store, now) {
            log::debug!("motion auto-resumed at {now}ms");
        }

        let report = self.driver.update_frame(dt, now, &mut self.store, &mut self.transitions, &self.motion)?;
        if !report.completed.is_empty() {
            self.publish_pose(PoseSource::Animation);
        }
        if let Some(pose) = report.synced {
            self.publish(BusEvent::PoseChanged {
                pose,
                source: PoseSource::Sync,
            });
        }
        Ok(report)
    }

    /// Handle bus events received since the last frame.
    pub fn process_events(&mut self) -> Result<usize, CameraError> {
        self.live()?;
        let events: Vec<BusEvent> = lock(&self.mailbox).drain(..).collect();
        let n = events.len();
        for event in events {
            match event {
                BusEvent::InteractionStart { kind } => {
                    self.start_interaction(kind)?;
                }
                BusEvent::InteractionEnd => {
                    self.end_interaction()?;
                }
                BusEvent::PoseChanged {
                    pose,
                    source: PoseSource::User,
                } => {
                    if !pose.is_finite() {
                        log::warn!("ignoring non-finite user pose from bus");
                        continue;
                    }
                    if self.store.set_pose(pose, PoseSource::User)? {
                        self.driver.adopt(&self.store, self.clock_ms);
                    }
                }
                BusEvent::PoseChanged { .. } => {}
                BusEvent::SystemError { message, recoverable } => {
                    if recoverable {
                        log::warn!("recoverable system error: {message}");
                    } else {
                        log::error!("unrecoverable system error, resetting camera: {message}");
                        self.reset()?;
                    }
                }
                _ => {}
            }
        }
        Ok(n)
    }

    // -- pose commands -----------------------------------------------------

    fn animate_to(&mut self, patch: PosePatch, duration_ms: f64, source: PoseSource) -> Result<Pose, CameraError> {
        self.live()?;
        let from = self.driver.current_pose(&self.store);
        let to = patch.merge_over(&from);
        to.validate()?;
        let to = to.sanitized(&self.store.limits());
        if duration_ms > 0.0 && duration_ms.is_finite() {
            self.transitions
                .animate_pose(from, &PosePatch::from(to), duration_ms, self.easing, self.clock_ms);
        } else {
            self.transitions.cancel_pose(self.clock_ms);
            self.store.set_pose(to, source)?;
            self.driver.adopt(&self.store, self.clock_ms);
            self.publish_pose(source);
        }
        Ok(to)
    }

    /// Move the eye, animating over `duration_ms` (0 applies immediately).
    pub fn move_to(&mut self, position: Vec3, duration_ms: f64) -> Result<Pose, CameraError> {
        self.animate_to(PosePatch::default().position(position), duration_ms, PoseSource::External)
    }

    pub fn look_at(&mut self, target: Vec3, duration_ms: f64) -> Result<Pose, CameraError> {
        self.animate_to(PosePatch::default().target(target), duration_ms, PoseSource::External)
    }

    /// Field of view in degrees; clamped to the configured range.
    pub fn set_fov(&mut self, fov: f32, duration_ms: f64) -> Result<Pose, CameraError> {
        self.animate_to(PosePatch::default().fov(fov), duration_ms, PoseSource::External)
    }

    /// Animate to a named preset. Unknown names resolve to the default pose.
    pub fn apply_preset(&mut self, name: &str) -> Result<Pose, CameraError> {
        let pose = presets::resolve(name, self.config.preset_distance);
        self.animate_to(PosePatch::from(pose), self.config.preset_duration_ms, PoseSource::Preset)
    }

    pub fn get_current_pose(&self) -> Result<Pose, CameraError> {
        self.live()?;
        Ok(self.driver.current_pose(&self.store))
    }

    pub fn state(&self) -> Result<StoreSnapshot, CameraError> {
        self.live()?;
        Ok(self.store.state())
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    // -- interaction -------------------------------------------------------

    pub fn start_interaction(&mut self, kind: InteractionKind) -> Result<(), CameraError> {
        self.live()?;
        if self.store.interaction().is_interacting {
            self.store.start_interaction(kind);
            return Ok(());
        }
        suspend_for_interaction(
            &mut self.driver,
            &mut self.coordinator,
            &mut self.transitions,
            &mut self.store,
            self.clock_ms,
        )?;
        self.store.start_interaction(kind);
        Ok(())
    }

    pub fn end_interaction(&mut self) -> Result<(), CameraError> {
        self.live()?;
        if !self.store.end_interaction() {
            return Ok(());
        }
        if self.coordinator.on_interaction_end(&self.store, self.clock_ms).is_some() {
            self.publish(BusEvent::MotionResumeRequested { immediate: false });
        }
        Ok(())
    }

    /// Suppress motion application without changing motion state.
    pub fn set_user_interacting(&mut self, interacting: bool) -> Result<(), CameraError> {
        self.live()?;
        self.driver.set_user_interacting(interacting);
        if interacting {
            self.driver.settle(&mut self.store)?;
        }
        Ok(())
    }

    pub fn handle_input(&mut self, event: &InputEvent, now_ms: f64) -> Result<InputResponse, CameraError> {
        self.live()?;
        self.set_clock(now_ms);
        let mut sink = ControllerSink {
            driver: &mut self.driver,
            coordinator: &mut self.coordinator,
            transitions: &mut self.transitions,
            now_ms: self.clock_ms,
        };
        let response = self.input.handle(event, self.clock_ms, &mut self.store, &mut sink);
        self.after_input(&response);
        Ok(response)
    }

    fn after_input(&mut self, response: &InputResponse) {
        if let Some(pose) = response.pose_changed {
            self.publish(BusEvent::PoseChanged {
                pose,
                source: PoseSource::User,
            });
        }
        if response.signals.contains(&InputSignal::Ended) && self.coordinator.pending_resume_at().is_some() {
            self.publish(BusEvent::MotionResumeRequested { immediate: false });
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.input.set_viewport(width, height);
    }

    // -- motion ------------------------------------------------------------

    fn effective_speed(&self) -> f32 {
        self.config.effective_motion_speed()
    }

    /// Start `kind` from progress 0, anchored at the current pose.
    pub fn start_motion(&mut self, kind: MotionType) -> Result<(), CameraError> {
        self.live()?;
        self.coordinator.release();
        let anchor = self.driver.current_pose(&self.store);
        self.store.start_motion(kind, self.clock_ms, self.effective_speed());
        self.driver.reanchor(anchor);
        self.config.camera_motion_type = kind;
        Ok(())
    }

    pub fn switch_motion(&mut self, kind: MotionType, mode: MotionSwitch) -> Result<(), CameraError> {
        self.live()?;
        let anchor = self.driver.current_pose(&self.store);
        self.store.switch_motion(kind, self.clock_ms, mode);
        match mode {
            MotionSwitch::Restart => self.driver.reanchor(anchor),
            MotionSwitch::Continue => {
                let progress = self.store.motion().progress_at(self.clock_ms);
                self.driver.capture_base(anchor, progress);
            }
        }
        self.config.camera_motion_type = kind;
        Ok(())
    }

    pub fn stop_motion(&mut self) -> Result<bool, CameraError> {
        self.live()?;
        self.coordinator.release();
        let anchor = self.driver.current_pose(&self.store);
        let stopped = self.store.stop_motion();
        if stopped {
            self.driver.settle(&mut self.store)?;
            self.driver.reanchor(anchor);
        }
        Ok(stopped)
    }

    pub fn pause_motion(&mut self) -> Result<bool, CameraError> {
        self.live()?;
        self.coordinator.release();
        let paused = self.store.pause_motion(self.clock_ms);
        if paused {
            self.driver.settle(&mut self.store)?;
        }
        Ok(paused)
    }

    /// Resume right away, cancelling any pending delayed resume.
    pub fn resume_motion(&mut self) -> Result<bool, CameraError> {
        self.live()?;
        let resumed = self.coordinator.immediate_resume(&mut self.store, self.clock_ms);
        if resumed {
            self.publish(BusEvent::MotionResumeRequested { immediate: true });
        }
        Ok(resumed)
    }

    pub fn set_motion_speed(&mut self, speed: f32) -> Result<(), CameraError> {
        self.live()?;
        if !speed.is_finite() {
            return Err(CameraError::invalid_config("motion speed must be finite"));
        }
        self.config.camera_motion_speed = speed;
        self.store.set_motion_speed(self.effective_speed(), self.clock_ms);
        Ok(())
    }

    pub fn set_motion_params(&mut self, patch: &MotionParamsPatch) -> Result<(), CameraError> {
        self.live()?;
        self.config.motion_params = self.config.motion_params.merged(patch);
        self.motion.params = self.config.motion_params;
        self.store.set_motion_speed(self.effective_speed(), self.clock_ms);
        Ok(())
    }

    pub fn set_blend_mode(&mut self, blend: BlendMode) -> Result<(), CameraError> {
        self.live()?;
        self.config.camera_motion_blend = blend;
        self.driver.set_blend_mode(blend);
        Ok(())
    }

    /// Point followed by `TRACKING`; `None` holds the base pose.
    pub fn set_tracking_target(&mut self, target: Option<Vec3>) -> Result<(), CameraError> {
        self.live()?;
        self.motion.tracking_target = target.filter(|t| t.is_finite());
        Ok(())
    }

    // -- projection & tweens -----------------------------------------------

    pub fn projection_mode(&self) -> ProjectionMode {
        self.transitions.projection_mode()
    }

    pub fn transition_projection(&mut self, mode: ProjectionMode, duration_ms: f64) -> Result<bool, CameraError> {
        self.live()?;
        let current = self.driver.current_pose(&self.store);
        let started = self
            .transitions
            .transition_projection(mode, current, duration_ms, self.easing, self.clock_ms);
        if started {
            self.config.projection_mode = mode;
        }
        Ok(started)
    }

    pub fn reverse_projection(&mut self, duration_ms: f64) -> Result<Option<ProjectionMode>, CameraError> {
        self.live()?;
        let current = self.driver.current_pose(&self.store);
        let back = self
            .transitions
            .reverse_projection(current, duration_ms, self.easing, self.clock_ms);
        if let Some(mode) = back {
            self.config.projection_mode = mode;
        }
        Ok(back)
    }

    /// Run an arbitrary eased tween on the controller's clock.
    pub fn animate(
        &mut self,
        duration_ms: f64,
        easing: Easing,
        on_update: UpdateFn,
        on_complete: Option<CompleteFn>,
    ) -> Result<AnimationHandle, CameraError> {
        self.live()?;
        Ok(self
            .transitions
            .create_animation(duration_ms, easing, on_update, on_complete, self.clock_ms))
    }

    pub fn cancel_animation(&mut self, handle: AnimationHandle) -> Result<bool, CameraError> {
        self.live()?;
        Ok(self.transitions.cancel(handle))
    }

    // -- render target -----------------------------------------------------

    pub fn bind_target(&mut self, target: Box<dyn RenderTarget>) -> Result<Option<Box<dyn RenderTarget>>, CameraError> {
        self.live()?;
        Ok(self.driver.bind(target))
    }

    pub fn unbind_target(&mut self) -> Result<Option<Box<dyn RenderTarget>>, CameraError> {
        self.live()?;
        Ok(self.driver.unbind())
    }

    // -- config & persistence ----------------------------------------------

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Apply a new scene configuration to every component. Running motion
    /// keeps its progress; a changed motion type restarts it.
    pub fn apply_config(&mut self, config: SceneConfig) -> Result<(), CameraError> {
        self.live()?;
        config.validate()?;
        let previous = std::mem::replace(&mut self.config, config);
        let limits = self.config.pose_limits();
        self.store.set_limits(limits);
        self.driver.set_limits(limits);
        self.driver.set_sync_interval(self.config.sync_interval_frames);
        self.driver.set_blend_mode(self.config.camera_motion_blend);
        self.input.set_settings(InputSettings::from(&self.config));
        self.coordinator.set_settings(CoordinatorSettings::from(&self.config));
        self.motion.params = self.config.motion_params;
        self.store.set_motion_speed(self.effective_speed(), self.clock_ms);

        if self.config.projection_mode != previous.projection_mode {
            self.transition_projection(self.config.projection_mode, self.config.preset_duration_ms)?;
        }
        let kind = self.config.camera_motion_type;
        if kind != previous.camera_motion_type {
            if kind.is_static() {
                self.stop_motion()?;
            } else {
                self.start_motion(kind)?;
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Result<CameraSnapshot, CameraError> {
        self.live()?;
        let motion = self.store.motion();
        Ok(CameraSnapshot {
            pose: self.driver.current_pose(&self.store),
            motion_type: if motion.is_active {
                motion.motion_type
            } else {
                MotionType::Static
            },
            motion_speed: self.config.camera_motion_speed,
            blend_mode: self.driver.blend_mode(),
            projection_mode: self.transitions.projection_mode(),
        })
    }

    /// Apply a snapshot without animating; motion restarts if it is not static.
    pub fn restore(&mut self, snapshot: &CameraSnapshot) -> Result<(), CameraError> {
        self.live()?;
        snapshot.pose.validate()?;
        self.transitions.cancel_all();
        self.transitions.set_projection_mode(snapshot.projection_mode);
        self.config.projection_mode = snapshot.projection_mode;
        self.config.camera_motion_speed = snapshot.motion_speed;
        self.config.camera_motion_blend = snapshot.blend_mode;
        self.driver.set_blend_mode(snapshot.blend_mode);
        self.coordinator.release();
        self.store.stop_motion();
        self.store.set_pose(snapshot.pose, PoseSource::External)?;
        self.driver.adopt(&self.store, self.clock_ms);
        if snapshot.motion_type.is_static() {
            self.config.camera_motion_type = MotionType::Static;
        } else {
            self.start_motion(snapshot.motion_type)?;
        }
        self.publish_pose(PoseSource::External);
        Ok(())
    }

    // -- introspection -----------------------------------------------------

    pub fn pending_resume_at(&self) -> Option<f64> {
        self.coordinator.pending_resume_at()
    }

    pub fn pending_timers(&self) -> usize {
        self.coordinator.pending_timers()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_bound(&self) -> bool {
        self.driver.is_bound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_before_initialize_is_a_noop() {
        let mut c = CameraController::default();
        assert!(!c.dispose());
        assert_eq!(c.lifecycle(), Lifecycle::Created);
        assert!(c.get_current_pose().is_ok());
    }

    #[test]
    fn immediate_fov_is_clamped() {
        let mut c = CameraController::default();
        let pose = c.set_fov(500.0, 0.0).unwrap();
        assert_eq!(pose.fov, 120.0);
        assert_eq!(c.get_current_pose().unwrap().fov, 120.0);
        assert!(c.set_fov(f32::NAN, 0.0).is_err());
    }

    #[test]
    fn own_publications_are_not_echoed() {
        let mut c = CameraController::default();
        let bus = EventBus::new();
        c.initialize(bus.clone()).unwrap();
        c.move_to(Vec3::new(1.0, 0.0, 5.0), 0.0).unwrap();
        assert_eq!(c.process_events().unwrap(), 0);
    }

    #[test]
    fn events_published_in_reaction_to_own_are_kept() {
        let mut c = CameraController::default();
        let bus = EventBus::new();
        c.initialize(bus.clone()).unwrap();
        let relay = bus.clone();
        let _sub = bus.subscribe(Topic::SystemPaused, move |_| {
            relay.publish(BusEvent::InteractionStart {
                kind: InteractionKind::Touch,
            });
        });

        assert!(c.pause().unwrap());
        assert_eq!(c.process_events().unwrap(), 1);
        assert!(c.state().unwrap().interaction.is_interacting);
    }
}
