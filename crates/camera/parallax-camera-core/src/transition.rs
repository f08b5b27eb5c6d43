//! Time-boxed interpolation: generic tweens, pose transitions and projection
//! transitions.
//!
//! All three share [`Timeline`], which turns host timestamps into a raw
//! progress in `[0, 1]` and supports pause/resume by rebuilding a virtual start
//! time. The service is advanced explicitly with [`TransitionService::advance`];
//! nothing completes behind the caller's back.

use glam::Vec3;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::pose::{Pose, PosePatch};

pub type UpdateFn = Box<dyn FnMut(f32) + Send + Sync>;
pub type CompleteFn = Box<dyn FnOnce() + Send + Sync>;

/// Geometric mapping used to render the depth surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Plane,
    Sphere,
    Cylinder,
    Dome,
}

impl ProjectionMode {
    pub const ALL: [ProjectionMode; 4] = [Self::Plane, Self::Sphere, Self::Cylinder, Self::Dome];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Plane => "plane",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Dome => "dome",
        }
    }

    /// Canonical camera for viewing a surface in this projection. Immersive
    /// modes put the eye just off the centre of the surface.
    pub fn camera_config(&self) -> Pose {
        let inside = |target: Vec3, fov: f32| Pose {
            position: Vec3::new(0.0, 0.0, 0.1),
            target,
            up: Vec3::Y,
            fov,
            near: 0.01,
            far: 1000.0,
        };
        match self {
            Self::Plane => Pose::default(),
            Self::Sphere => inside(Vec3::NEG_Z, 75.0),
            Self::Cylinder => inside(Vec3::NEG_Z, 70.0),
            Self::Dome => inside(Vec3::new(0.0, 0.5, -1.0), 90.0),
        }
    }
}

impl From<&str> for ProjectionMode {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "plane" | "flat" => Self::Plane,
            "sphere" | "spherical" => Self::Sphere,
            "cylinder" | "cylindrical" => Self::Cylinder,
            "dome" => Self::Dome,
            other => {
                log::warn!("unknown projection mode '{other}', using plane");
                Self::Plane
            }
        }
    }
}

/// Elapsed-time progress with pause/resume continuity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timeline {
    pub duration_ms: f64,
    start_ms: f64,
    paused_at: Option<f32>,
}

impl Timeline {
    pub fn new(duration_ms: f64, now_ms: f64) -> Self {
        Self {
            duration_ms: if duration_ms.is_finite() { duration_ms.max(0.0) } else { 0.0 },
            start_ms: now_ms,
            paused_at: None,
        }
    }

    /// Raw (un-eased) progress in `[0, 1]`.
    pub fn progress_at(&self, now_ms: f64) -> f32 {
        if let Some(p) = self.paused_at {
            return p;
        }
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (((now_ms - self.start_ms) / self.duration_ms) as f32).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self, now_ms: f64) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(self.progress_at(now_ms));
        true
    }

    pub fn resume(&mut self, now_ms: f64) -> bool {
        let Some(p) = self.paused_at.take() else {
            return false;
        };
        self.start_ms = now_ms - p as f64 * self.duration_ms;
        true
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct AnimationHandle(pub u64);

struct Tween {
    timeline: Timeline,
    easing: Easing,
    on_update: UpdateFn,
    on_complete: Option<CompleteFn>,
}

/// Interpolation between two full poses; partial targets were merged over
/// `from` at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseTransition {
    pub from: Pose,
    pub to: Pose,
    pub easing: Easing,
    pub timeline: Timeline,
}

impl PoseTransition {
    pub fn new(from: Pose, to: &PosePatch, duration_ms: f64, easing: Easing, now_ms: f64) -> Self {
        Self {
            from,
            to: to.merge_over(&from),
            easing,
            timeline: Timeline::new(duration_ms, now_ms),
        }
    }

    pub fn sample(&self, raw_progress: f32) -> Pose {
        self.from.lerp(&self.to, self.easing.apply(raw_progress))
    }

    pub fn sample_at(&self, now_ms: f64) -> Pose {
        self.sample(self.timeline.progress_at(now_ms))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ProjectionTransition {
    from: ProjectionMode,
    to: ProjectionMode,
    pose: PoseTransition,
}

/// Surface morph state reported while a projection transition runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionFrame {
    pub from: ProjectionMode,
    pub to: ProjectionMode,
    /// Eased blend factor between the two surfaces.
    pub mix: f32,
    pub pose: Pose,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletedTransition {
    Pose,
    Projection(ProjectionMode),
}

/// Outcome of one [`TransitionService::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionFrame {
    /// Pose to apply this frame. A projection transition takes precedence over
    /// a concurrent pose transition.
    pub pose: Option<Pose>,
    pub projection: Option<ProjectionFrame>,
    pub completed: Vec<CompletedTransition>,
}

#[derive(Default)]
pub struct TransitionService {
    next_id: u64,
    tweens: HashMap<AnimationHandle, Tween>,
    pose: Option<PoseTransition>,
    projection: Option<ProjectionTransition>,
    mode: ProjectionMode,
    previous_mode: Option<ProjectionMode>,
}

impl std::fmt::Debug for TransitionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionService")
            .field("tweens", &self.tweens.len())
            .field("pose", &self.pose)
            .field("projection", &self.projection)
            .field("mode", &self.mode)
            .field("previous_mode", &self.previous_mode)
            .finish()
    }
}

impl TransitionService {
    pub fn new(mode: ProjectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    // -- generic tweens ----------------------------------------------------

    /// Start a tween that reports eased progress to `on_update` on every
    /// advance and calls `on_complete` once when it reaches the end.
    pub fn create_animation(
        &mut self,
        duration_ms: f64,
        easing: Easing,
        on_update: UpdateFn,
        on_complete: Option<CompleteFn>,
        now_ms: f64,
    ) -> AnimationHandle {
        let handle = AnimationHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tweens.insert(
            handle,
            Tween {
                timeline: Timeline::new(duration_ms, now_ms),
                easing,
                on_update,
                on_complete,
            },
        );
        handle
    }

    /// Drop a tween without calling its completion callback.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        self.tweens.remove(&handle).is_some()
    }

    pub fn pause(&mut self, handle: AnimationHandle, now_ms: f64) -> bool {
        self.tweens
            .get_mut(&handle)
            .is_some_and(|t| t.timeline.pause(now_ms))
    }

    pub fn resume(&mut self, handle: AnimationHandle, now_ms: f64) -> bool {
        self.tweens
            .get_mut(&handle)
            .is_some_and(|t| t.timeline.resume(now_ms))
    }

    #[inline]
    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        self.tweens.contains_key(&handle)
    }

    // -- pose transitions --------------------------------------------------

    /// Replace any in-flight pose transition with one from `from` to `to`.
    pub fn animate_pose(
        &mut self,
        from: Pose,
        to: &PosePatch,
        duration_ms: f64,
        easing: Easing,
        now_ms: f64,
    ) -> Pose {
        if self.pose.is_some() {
            log::debug!("pose transition replaced");
        }
        let transition = PoseTransition::new(from, to, duration_ms, easing, now_ms);
        self.pose = Some(transition);
        transition.to
    }

    pub fn pose_transition(&self) -> Option<&PoseTransition> {
        self.pose.as_ref()
    }

    /// Cancel the pose transition, returning where it had got to.
    pub fn cancel_pose(&mut self, now_ms: f64) -> Option<Pose> {
        self.pose.take().map(|t| t.sample_at(now_ms))
    }

    // -- projection transitions --------------------------------------------

    #[inline]
    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    #[inline]
    pub fn previous_projection(&self) -> Option<ProjectionMode> {
        self.previous_mode
    }

    /// Switch projection without animating (snapshot restore).
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.projection = None;
        if mode != self.mode {
            self.previous_mode = Some(self.mode);
            self.mode = mode;
        }
    }

    /// Animate the camera into `to`'s canonical configuration. An in-flight
    /// projection transition is cancelled and the new one starts from its
    /// current interpolated pose. Returns `false` when already in `to`.
    pub fn transition_projection(
        &mut self,
        to: ProjectionMode,
        current_pose: Pose,
        duration_ms: f64,
        easing: Easing,
        now_ms: f64,
    ) -> bool {
        if to == self.mode && self.projection.is_none() {
            return false;
        }
        let from_pose = match self.projection.take() {
            Some(running) => {
                log::debug!(
                    "projection transition {} -> {} replaced",
                    running.from.name(),
                    running.to.name()
                );
                running.pose.sample_at(now_ms)
            }
            None => current_pose,
        };
        // A concurrent pose transition would fight the projection one.
        self.pose = None;

        let from = self.mode;
        self.previous_mode = Some(from);
        self.mode = to;
        let target = PosePatch::from(to.camera_config());
        self.projection = Some(ProjectionTransition {
            from,
            to,
            pose: PoseTransition::new(from_pose, &target, duration_ms, easing, now_ms),
        });
        log::debug!("projection transition {} -> {}", from.name(), to.name());
        true
    }

    /// Transition back to the previously active projection, if any.
    pub fn reverse_projection(
        &mut self,
        current_pose: Pose,
        duration_ms: f64,
        easing: Easing,
        now_ms: f64,
    ) -> Option<ProjectionMode> {
        let back = self.previous_mode?;
        self.transition_projection(back, current_pose, duration_ms, easing, now_ms)
            .then_some(back)
    }

    // -- frame -------------------------------------------------------------

    /// Whether a pose or projection transition currently owns the camera.
    #[inline]
    pub fn is_driving(&self) -> bool {
        self.pose.is_some() || self.projection.is_some()
    }

    #[inline]
    pub fn active_tweens(&self) -> usize {
        self.tweens.len()
    }

    pub fn advance(&mut self, now_ms: f64) -> TransitionFrame {
        let mut frame = TransitionFrame::default();

        let mut finished = Vec::new();
        for (handle, tween) in self.tweens.iter_mut() {
            let raw = tween.timeline.progress_at(now_ms);
            (tween.on_update)(tween.easing.apply(raw));
            if raw >= 1.0 {
                finished.push(*handle);
            }
        }
        for handle in finished {
            if let Some(tween) = self.tweens.remove(&handle) {
                if let Some(done) = tween.on_complete {
                    done();
                }
            }
        }

        if let Some(t) = self.pose {
            let raw = t.timeline.progress_at(now_ms);
            frame.pose = Some(t.sample(raw));
            if raw >= 1.0 {
                self.pose = None;
                frame.completed.push(CompletedTransition::Pose);
                log::debug!("pose transition complete");
            }
        }

        if let Some(t) = self.projection {
            let raw = t.pose.timeline.progress_at(now_ms);
            let pose = t.pose.sample(raw);
            frame.pose = Some(pose);
            frame.projection = Some(ProjectionFrame {
                from: t.from,
                to: t.to,
                mix: t.pose.easing.apply(raw),
                pose,
            });
            if raw >= 1.0 {
                self.projection = None;
                frame.completed.push(CompletedTransition::Projection(t.to));
                log::debug!("projection transition to {} complete", t.to.name());
            }
        }

        frame
    }

    pub fn pause_all(&mut self, now_ms: f64) {
        for tween in self.tweens.values_mut() {
            tween.timeline.pause(now_ms);
        }
        if let Some(t) = self.pose.as_mut() {
            t.timeline.pause(now_ms);
        }
        if let Some(t) = self.projection.as_mut() {
            t.pose.timeline.pause(now_ms);
        }
    }

    pub fn resume_all(&mut self, now_ms: f64) {
        for tween in self.tweens.values_mut() {
            tween.timeline.resume(now_ms);
        }
        if let Some(t) = self.pose.as_mut() {
            t.timeline.resume(now_ms);
        }
        if let Some(t) = self.projection.as_mut() {
            t.pose.timeline.resume(now_ms);
        }
    }

    /// Cancel every tween and transition. Completion callbacks do not fire.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tweens.len()
            + usize::from(self.pose.is_some())
            + usize::from(self.projection.is_some());
        self.tweens.clear();
        self.pose = None;
        self.projection = None;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn timeline_pause_resume_is_continuous() {
        let mut tl = Timeline::new(1_000.0, 0.0);
        assert!(tl.pause(250.0));
        assert!(!tl.pause(300.0));
        assert_eq!(tl.progress_at(900.0), 0.25);
        assert!(tl.resume(5_000.0));
        assert!((tl.progress_at(5_000.0) - 0.25).abs() < 1e-6);
        assert!((tl.progress_at(5_500.0) - 0.75).abs() < 1e-6);
        assert!(!tl.resume(5_600.0));
    }

    #[test]
    fn tween_reports_progress_and_completes_once() {
        let mut svc = TransitionService::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(AtomicU32::new(0));
        let (s, d) = (seen.clone(), done.clone());
        svc.create_animation(
            100.0,
            Easing::Linear,
            Box::new(move |p| s.lock().unwrap().push(p)),
            Some(Box::new(move || {
                d.fetch_add(1, Ordering::SeqCst);
            })),
            0.0,
        );
        svc.advance(50.0);
        svc.advance(100.0);
        svc.advance(150.0);
        assert_eq!(*seen.lock().unwrap(), vec![0.5, 1.0]);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(svc.active_tweens(), 0);
    }

    #[test]
    fn cancelled_tween_never_completes() {
        let mut svc = TransitionService::default();
        let done = Arc::new(AtomicU32::new(0));
        let d = done.clone();
        let h = svc.create_animation(
            100.0,
            Easing::Linear,
            Box::new(|_| {}),
            Some(Box::new(move || {
                d.fetch_add(1, Ordering::SeqCst);
            })),
            0.0,
        );
        assert!(svc.cancel(h));
        assert!(!svc.cancel(h));
        svc.advance(500.0);
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pose_transition_merges_partial_target() {
        let mut svc = TransitionService::default();
        let from = Pose::default();
        svc.animate_pose(from, &PosePatch::default().fov(70.0), 300.0, Easing::Linear, 0.0);
        let frame = svc.advance(150.0);
        let pose = frame.pose.unwrap();
        assert!((pose.fov - 60.0).abs() < 1e-4);
        assert_eq!(pose.position, from.position);

        let end = svc.advance(300.0);
        assert_eq!(end.completed, vec![CompletedTransition::Pose]);
        assert!(!svc.is_driving());
    }

    #[test]
    fn projection_transition_is_reversible_and_restartable() {
        let mut svc = TransitionService::new(ProjectionMode::Plane);
        assert!(!svc.transition_projection(ProjectionMode::Plane, Pose::default(), 500.0, Easing::Linear, 0.0));

        assert!(svc.transition_projection(ProjectionMode::Sphere, Pose::default(), 1_000.0, Easing::Linear, 0.0));
        let mid = svc.advance(500.0);
        let pf = mid.projection.unwrap();
        assert_eq!((pf.from, pf.to), (ProjectionMode::Plane, ProjectionMode::Sphere));
        assert!((pf.mix - 0.5).abs() < 1e-6);

        // replaced mid-flight: new transition starts from the interpolated pose
        assert!(svc.transition_projection(ProjectionMode::Dome, Pose::default(), 1_000.0, Easing::Linear, 500.0));
        let restart = svc.advance(500.0).pose.unwrap();
        assert!(restart.approx_eq(&pf.pose, 1e-5));

        let done = svc.advance(1_500.0);
        assert_eq!(done.completed, vec![CompletedTransition::Projection(ProjectionMode::Dome)]);
        assert_eq!(svc.projection_mode(), ProjectionMode::Dome);
        assert_eq!(svc.previous_projection(), Some(ProjectionMode::Sphere));

        let back = svc.reverse_projection(done.pose.unwrap(), 0.0, Easing::Linear, 2_000.0);
        assert_eq!(back, Some(ProjectionMode::Sphere));
        let snap = svc.advance(2_000.0).pose.unwrap();
        assert!(snap.approx_eq(&ProjectionMode::Sphere.camera_config(), 1e-6));
    }
}
