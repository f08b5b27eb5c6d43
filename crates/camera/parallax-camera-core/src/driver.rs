//! Per-frame pose resolution and render-target binding.
//!
//! The [`AnimationDriver`] decides, once per frame, which source owns the camera
//! (an in-flight transition, procedural motion, or a pending store write),
//! writes the resolved pose to the bound [`RenderTarget`] and periodically
//! copies the target's live pose back into the [`PoseStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::motion::{calculate_motion, MotionParams, MotionType};
use crate::pose::{Pose, PoseLimits, PoseSource};
use crate::store::{MotionState, PoseStore};
use crate::transition::{CompletedTransition, ProjectionFrame, TransitionService};

/// How procedural motion combines with the user-set base pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// The motion's displacement from its own starting point is added to the base pose.
    #[default]
    Additive,
    /// The motion result replaces the base pose.
    Override,
}

/// Camera plus orbit rig the driver writes into.
pub trait RenderTarget: Send + Sync {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn target(&self) -> Vec3;
    fn set_target(&mut self, target: Vec3);
    fn up(&self) -> Vec3;
    fn set_up(&mut self, up: Vec3);
    fn fov(&self) -> f32;
    fn set_fov(&mut self, fov: f32);
    fn clip(&self) -> (f32, f32);
    fn set_clip(&mut self, near: f32, far: f32);
    fn update_projection_matrix(&mut self);
    /// Let the orbit rig recompute its internal state after `target` moved.
    fn update_rig(&mut self);
    /// Request a redraw.
    fn invalidate(&mut self);

    fn read_pose(&self) -> Pose {
        let (near, far) = self.clip();
        Pose {
            position: self.position(),
            target: self.target(),
            up: self.up(),
            fov: self.fov(),
            near,
            far,
        }
    }

    fn write_pose(&mut self, pose: &Pose) {
        self.set_position(pose.position);
        self.set_target(pose.target);
        self.set_up(pose.up);
        self.set_fov(pose.fov);
        self.set_clip(pose.near, pose.far);
        self.update_projection_matrix();
        self.update_rig();
    }
}

/// Plain in-memory render target; counts matrix/rig updates and redraw requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraRig {
    pub pose: Pose,
    pub projection_updates: u64,
    pub rig_updates: u64,
    pub needs_redraw: bool,
}

impl CameraRig {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            ..Self::default()
        }
    }

    /// Clear and return the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}

impl RenderTarget for CameraRig {
    fn position(&self) -> Vec3 {
        self.pose.position
    }
    fn set_position(&mut self, position: Vec3) {
        self.pose.position = position;
    }
    fn target(&self) -> Vec3 {
        self.pose.target
    }
    fn set_target(&mut self, target: Vec3) {
        self.pose.target = target;
    }
    fn up(&self) -> Vec3 {
        self.pose.up
    }
    fn set_up(&mut self, up: Vec3) {
        self.pose.up = up;
    }
    fn fov(&self) -> f32 {
        self.pose.fov
    }
    fn set_fov(&mut self, fov: f32) {
        self.pose.fov = fov;
    }
    fn clip(&self) -> (f32, f32) {
        (self.pose.near, self.pose.far)
    }
    fn set_clip(&mut self, near: f32, far: f32) {
        self.pose.near = near;
        self.pose.far = far;
    }
    fn update_projection_matrix(&mut self) {
        self.projection_updates += 1;
    }
    fn update_rig(&mut self) {
        self.rig_updates += 1;
    }
    fn invalidate(&mut self) {
        self.needs_redraw = true;
    }
}

/// Cloneable handle to a [`CameraRig`] so a host can read what the driver wrote.
#[derive(Clone, Debug, Default)]
pub struct SharedRig(Arc<Mutex<CameraRig>>);

impl SharedRig {
    pub fn new(pose: Pose) -> Self {
        Self(Arc::new(Mutex::new(CameraRig::new(pose))))
    }

    pub fn lock(&self) -> MutexGuard<'_, CameraRig> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pose(&self) -> Pose {
        self.lock().pose
    }

    pub fn take_redraw(&self) -> bool {
        self.lock().take_redraw()
    }
}

impl RenderTarget for SharedRig {
    fn position(&self) -> Vec3 {
        self.lock().pose.position
    }
    fn set_position(&mut self, position: Vec3) {
        self.lock().set_position(position);
    }
    fn target(&self) -> Vec3 {
        self.lock().pose.target
    }
    fn set_target(&mut self, target: Vec3) {
        self.lock().set_target(target);
    }
    fn up(&self) -> Vec3 {
        self.lock().pose.up
    }
    fn set_up(&mut self, up: Vec3) {
        self.lock().set_up(up);
    }
    fn fov(&self) -> f32 {
        self.lock().pose.fov
    }
    fn set_fov(&mut self, fov: f32) {
        self.lock().set_fov(fov);
    }
    fn clip(&self) -> (f32, f32) {
        self.lock().clip()
    }
    fn set_clip(&mut self, near: f32, far: f32) {
        self.lock().set_clip(near, far);
    }
    fn update_projection_matrix(&mut self) {
        self.lock().update_projection_matrix();
    }
    fn update_rig(&mut self) {
        self.lock().update_rig();
    }
    fn invalidate(&mut self) {
        self.lock().invalidate();
    }

    fn read_pose(&self) -> Pose {
        self.lock().pose
    }

    fn write_pose(&mut self, pose: &Pose) {
        let mut rig = self.lock();
        rig.write_pose(pose);
    }
}

/// Displacement a motion applies on top of the base pose in additive mode,
/// measured from the sample at the anchor progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionOffset {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}

impl MotionOffset {
    pub fn apply(&self, pose: &Pose) -> Pose {
        Pose {
            position: pose.position + self.position,
            target: pose.target + self.target,
            fov: pose.fov + self.fov,
            ..*pose
        }
    }
}

/// Per-frame inputs to motion evaluation that live outside the store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionContext {
    pub params: MotionParams,
    pub tracking_target: Option<Vec3>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameSource {
    Transition,
    Motion,
    Store,
    #[default]
    Hold,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub source: FrameSource,
    /// The motion-application step advanced the pose this frame.
    pub motion_applied: bool,
    /// The resolved pose changed and was written to the target.
    pub pose_applied: bool,
    pub progress: Option<f32>,
    pub projection: Option<ProjectionFrame>,
    pub completed: Vec<CompletedTransition>,
    /// Live pose copied back into the store by the periodic sync.
    pub synced: Option<Pose>,
}

pub struct AnimationDriver {
    target: Option<Box<dyn RenderTarget>>,
    blend: BlendMode,
    user_interacting: bool,
    base: Pose,
    /// Progress at which `base` was captured; additive motion is zero there.
    anchor_progress: f32,
    last_progress: f32,
    resolved: Pose,
    applied_revision: Option<u64>,
    limits: PoseLimits,
    frame: u64,
    sync_interval: u32,
    last_source: FrameSource,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("bound", &self.target.is_some())
            .field("blend", &self.blend)
            .field("user_interacting", &self.user_interacting)
            .field("base", &self.base)
            .field("resolved", &self.resolved)
            .field("frame", &self.frame)
            .finish()
    }
}

impl AnimationDriver {
    pub fn new(initial: Pose, limits: PoseLimits, blend: BlendMode, sync_interval: u32) -> Self {
        let initial = initial.sanitized(&limits);
        Self {
            target: None,
            blend,
            user_interacting: false,
            base: initial,
            anchor_progress: 0.0,
            last_progress: 0.0,
            resolved: initial,
            applied_revision: None,
            limits,
            frame: 0,
            sync_interval: sync_interval.max(1),
            last_source: FrameSource::Hold,
        }
    }

    // -- binding -----------------------------------------------------------

    /// Bind a render target, returning the previously bound one. The current
    /// resolved pose is written to the new target immediately.
    pub fn bind(&mut self, mut target: Box<dyn RenderTarget>) -> Option<Box<dyn RenderTarget>> {
        target.write_pose(&self.resolved);
        target.invalidate();
        self.target.replace(target)
    }

    /// Safe to call any number of times.
    pub fn unbind(&mut self) -> Option<Box<dyn RenderTarget>> {
        self.target.take()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    // -- settings ----------------------------------------------------------

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Switching blend mode re-anchors motion at the current resolved pose and
    /// progress.
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        if blend != self.blend {
            self.blend = blend;
            self.capture_base(self.resolved, self.last_progress);
        }
    }

    /// Suppress motion application without touching the motion state machine.
    pub fn set_user_interacting(&mut self, interacting: bool) {
        self.user_interacting = interacting;
    }

    #[inline]
    pub fn is_user_interacting(&self) -> bool {
        self.user_interacting
    }

    pub fn set_limits(&mut self, limits: PoseLimits) {
        self.limits = limits;
    }

    pub fn set_sync_interval(&mut self, frames: u32) {
        self.sync_interval = frames.max(1);
    }

    // -- pose bookkeeping --------------------------------------------------

    #[inline]
    pub fn resolved_pose(&self) -> Pose {
        self.resolved
    }

    #[inline]
    pub fn base_pose(&self) -> Pose {
        self.base
    }

    #[inline]
    pub fn last_source(&self) -> FrameSource {
        self.last_source
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Pose a caller should observe right now.
    pub fn current_pose(&self, store: &PoseStore) -> Pose {
        match self.last_source {
            FrameSource::Transition | FrameSource::Motion => self.resolved,
            FrameSource::Store | FrameSource::Hold => store.pose(),
        }
    }

    /// Adopt a user-set pose as the new base, anchored at `progress`. Additive
    /// motion resuming at that progress starts exactly at `user_pose`.
    pub fn capture_base(&mut self, user_pose: Pose, progress: f32) {
        self.base = user_pose;
        self.anchor_progress = progress;
        self.last_progress = progress;
    }

    /// Restart motion blending from `pose` at progress 0.
    pub fn reanchor(&mut self, pose: Pose) {
        self.capture_base(pose, 0.0);
    }

    /// Snap everything to `pose` (controller reset).
    pub fn reset(&mut self, pose: Pose) {
        let pose = pose.sanitized(&self.limits);
        self.reanchor(pose);
        self.user_interacting = false;
        self.applied_revision = None;
        self.last_source = FrameSource::Hold;
        self.apply(pose);
    }

    /// Take the store's pose right away instead of on the next frame, rebasing
    /// motion onto it.
    pub fn adopt(&mut self, store: &PoseStore, now_ms: f64) {
        let pose = store.pose();
        self.capture_base(pose, store.motion().progress_at(now_ms));
        self.apply(pose);
        self.applied_revision = Some(store.revision());
        self.last_source = FrameSource::Store;
    }

    /// Write the resolved pose into the store so readers never see a stale
    /// pose after the driver stops driving. A no-op unless a transition or
    /// motion drove the last frame.
    pub fn settle(&mut self, store: &mut PoseStore) -> Result<bool, CameraError> {
        if !matches!(self.last_source, FrameSource::Transition | FrameSource::Motion) {
            return Ok(false);
        }
        let changed = store.set_pose(self.resolved, PoseSource::Sync)?;
        self.applied_revision = Some(store.revision());
        self.last_source = FrameSource::Hold;
        Ok(changed)
    }

    fn apply(&mut self, pose: Pose) -> bool {
        let pose = pose.sanitized(&self.limits);
        if pose == self.resolved {
            return false;
        }
        self.resolved = pose;
        if let Some(target) = self.target.as_mut() {
            target.write_pose(&pose);
            target.invalidate();
        }
        true
    }

    fn motion_pose(&mut self, motion: &MotionState, now_ms: f64, ctx: &MotionContext) -> Option<(Pose, f32)> {
        let progress = motion.progress_at(now_ms);
        let kind = motion.motion_type;
        let sample = calculate_motion(kind, progress, &self.base, &ctx.params, ctx.tracking_target)?;
        // Tracking locks onto the followed point; it has no displacement to add.
        let pose = if self.blend == BlendMode::Override || kind == MotionType::Tracking {
            sample.apply_to(&self.base)
        } else {
            let origin = calculate_motion(kind, self.anchor_progress, &self.base, &ctx.params, ctx.tracking_target)?;
            MotionOffset {
                position: sample.position - origin.position,
                target: sample.target - origin.target,
                fov: sample.fov - origin.fov,
            }
            .apply(&self.base)
        };
        self.last_progress = progress;
        Some((pose, progress))
    }

    // -- frame -------------------------------------------------------------

    /// Resolve and apply this frame's pose.
    ///
    /// 1. A pose/projection transition in flight is applied exclusively.
    /// 2. Otherwise running motion is applied unless the user is interacting.
    /// 3. Otherwise a store write the driver has not seen yet is followed.
    /// 4. Otherwise the last resolved pose is held.
    pub fn update_frame(
        &mut self,
        _dt: f32,
        now_ms: f64,
        store: &mut PoseStore,
        transitions: &mut TransitionService,
        ctx: &MotionContext,
    ) -> Result<FrameReport, CameraError> {
        self.frame += 1;
        let mut report = FrameReport::default();
        let snap = store.state();

        let mut follow = false;
        if self.applied_revision != Some(snap.revision) {
            if snap.last_source != PoseSource::Sync {
                self.capture_base(snap.pose, snap.motion.progress_at(now_ms));
            }
            self.applied_revision = Some(snap.revision);
            follow = true;
        }

        let interacting = self.user_interacting || snap.interaction.is_interacting;
        let tf = transitions.advance(now_ms);
        report.projection = tf.projection;
        report.completed = tf.completed;

        if let Some(pose) = tf.pose {
            report.source = FrameSource::Transition;
            report.pose_applied = self.apply(pose);
            if !transitions.is_driving() {
                store.set_pose(self.resolved, PoseSource::Animation)?;
                self.applied_revision = Some(store.revision());
                self.capture_base(self.resolved, snap.motion.progress_at(now_ms));
            }
        } else if snap.motion.is_running() && !interacting {
            if let Some((pose, progress)) = self.motion_pose(&snap.motion, now_ms, ctx) {
                report.source = FrameSource::Motion;
                report.motion_applied = true;
                report.progress = Some(progress);
                report.pose_applied = self.apply(pose);
            }
        }

        if report.source == FrameSource::Hold && follow {
            report.source = FrameSource::Store;
            report.pose_applied = self.apply(snap.pose);
        }

        // motion suppressed or switched off since the last frame
        if report.source == FrameSource::Hold {
            self.settle(store)?;
        }

        if self.frame % self.sync_interval as u64 == 0 {
            report.synced = self.sync(store)?;
        }

        self.last_source = report.source;
        Ok(report)
    }

    /// Copy the target's live pose (or the resolved pose when unbound) into
    /// the store if it drifted.
    fn sync(&mut self, store: &mut PoseStore) -> Result<Option<Pose>, CameraError> {
        let live = match self.target.as_ref() {
            Some(target) => target.read_pose(),
            None => self.resolved,
        };
        if !live.is_finite() || live.approx_eq(&store.pose(), 1e-6) {
            return Ok(None);
        }
        store.set_pose(live, PoseSource::Sync)?;
        self.applied_revision = Some(store.revision());
        self.resolved = store.pose();
        Ok(Some(self.resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::pose::PosePatch;
    use crate::store::InteractionKind;

    fn driver() -> AnimationDriver {
        AnimationDriver::new(Pose::default(), PoseLimits::default(), BlendMode::Additive, 30)
    }

    #[test]
    fn unbind_is_idempotent_and_bind_returns_previous() {
        let mut d = driver();
        assert!(d.unbind().is_none());
        assert!(d.bind(Box::new(CameraRig::default())).is_none());
        assert!(d.bind(Box::new(CameraRig::default())).is_some());
        assert!(d.unbind().is_some());
        assert!(d.unbind().is_none());
    }

    #[test]
    fn transition_takes_priority_over_motion() {
        let mut d = driver();
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        store.start_motion(MotionType::Orbit, 0.0, 1.0);
        tr.animate_pose(store.pose(), &PosePatch::default().fov(70.0), 100.0, Easing::Linear, 0.0);

        let r = d.update_frame(0.016, 50.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert_eq!(r.source, FrameSource::Transition);
        assert!(!r.motion_applied);

        let r = d.update_frame(0.016, 100.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert_eq!(r.completed, vec![CompletedTransition::Pose]);
        assert_eq!(store.pose().fov, 70.0);

        let r = d.update_frame(0.016, 150.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert_eq!(r.source, FrameSource::Motion);
    }

    #[test]
    fn interaction_blocks_motion_step() {
        let mut d = driver();
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        store.start_motion(MotionType::Orbit, 0.0, 1.0);
        store.start_interaction(InteractionKind::Rotate);
        let r = d.update_frame(0.016, 500.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert!(!r.motion_applied);

        store.end_interaction();
        d.set_user_interacting(true);
        let r = d.update_frame(0.016, 600.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert!(!r.motion_applied);
    }

    #[test]
    fn holding_after_motion_settles_the_store() {
        let mut d = driver();
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        let rig = SharedRig::default();
        d.bind(Box::new(rig.clone()));
        store.start_motion(MotionType::Orbit, 0.0, 1.0);
        d.update_frame(0.016, 0.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        d.update_frame(0.016, 400.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert!(!store.pose().approx_eq(&rig.pose(), 1e-4));

        d.set_user_interacting(true);
        let r = d.update_frame(0.016, 416.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert_eq!(r.source, FrameSource::Hold);
        assert!(store.pose().approx_eq(&rig.pose(), 1e-6));
        assert!(d.current_pose(&store).approx_eq(&rig.pose(), 1e-6));
        assert_eq!(store.last_source(), PoseSource::Sync);
    }

    #[test]
    fn additive_motion_starts_at_the_base_pose() {
        let mut d = driver();
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        let rig = SharedRig::default();
        d.bind(Box::new(rig.clone()));
        store.start_motion(MotionType::Orbit, 0.0, 1.0);

        let r = d.update_frame(0.016, 0.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert_eq!(r.source, FrameSource::Motion);
        assert!(d.resolved_pose().approx_eq(&Pose::default(), 1e-5));

        d.update_frame(0.016, 2_500.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert!(!rig.pose().approx_eq(&Pose::default(), 1e-3));
        assert!(rig.take_redraw());
    }

    #[test]
    fn additive_arc_resumes_from_the_user_pose() {
        let mut d = driver();
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        let ctx = MotionContext::default();
        store.start_motion(MotionType::Arc, 0.0, 1.0);
        d.update_frame(0.016, 2_000.0, &mut store, &mut tr, &ctx).unwrap();
        d.settle(&mut store).unwrap();
        store.pause_motion(2_000.0);

        let user = Pose::new(Vec3::new(4.0, 2.0, 1.0), Vec3::ZERO);
        store.set_pose(user, PoseSource::User).unwrap();
        d.update_frame(0.016, 2_100.0, &mut store, &mut tr, &ctx).unwrap();
        assert!(d.resolved_pose().approx_eq(&user, 1e-5));

        store.resume_motion(3_000.0);
        let r = d.update_frame(0.016, 3_000.0, &mut store, &mut tr, &ctx).unwrap();
        assert!(r.motion_applied);
        assert!(d.resolved_pose().approx_eq(&user, 1e-4));
    }

    #[test]
    fn override_places_the_eye_on_the_orbit() {
        let mut d = AnimationDriver::new(Pose::default(), PoseLimits::default(), BlendMode::Override, 30);
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        store.start_motion(MotionType::Orbit, 0.0, 1.0);
        d.update_frame(0.016, 1_234.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        let pose = d.resolved_pose();
        assert!((pose.distance() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn periodic_sync_copies_live_target_pose() {
        let mut d = AnimationDriver::new(Pose::default(), PoseLimits::default(), BlendMode::Additive, 2);
        let mut store = PoseStore::default();
        let mut tr = TransitionService::default();
        let rig = SharedRig::default();
        d.bind(Box::new(rig.clone()));
        rig.lock().pose.fov = 42.0;

        let r = d.update_frame(0.016, 0.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert!(r.synced.is_none());
        let r = d.update_frame(0.016, 16.0, &mut store, &mut tr, &MotionContext::default()).unwrap();
        assert_eq!(r.synced.map(|p| p.fov), Some(42.0));
        assert_eq!(store.last_source(), PoseSource::Sync);
    }
}
