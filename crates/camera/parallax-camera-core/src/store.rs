//! Single-writer container for pose, motion and interaction state.
//!
//! Every mutation goes through a `PoseStore` method; other components read
//! point-in-time copies via [`PoseStore::state`] and never hold references
//! across a frame boundary.

use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::motion::progress::elapsed_for_progress;
use crate::motion::{calculate_progress, MotionType};
use crate::pose::{Pose, PoseLimits, PosePatch, PoseSource};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionState {
    pub motion_type: MotionType,
    pub is_active: bool,
    pub is_paused: bool,
    /// Progress captured by the last pause, also held while `speed` is zero.
    pub paused_at: f32,
    /// (Virtual) host timestamp in ms at which progress was zero.
    pub start_time: f64,
    pub speed: f32,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            motion_type: MotionType::Static,
            is_active: false,
            is_paused: false,
            paused_at: 0.0,
            start_time: 0.0,
            speed: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionPhase {
    Stopped,
    Active,
    Paused,
}

impl MotionState {
    pub fn phase(&self) -> MotionPhase {
        match (self.is_active, self.is_paused) {
            (false, _) => MotionPhase::Stopped,
            (true, false) => MotionPhase::Active,
            (true, true) => MotionPhase::Paused,
        }
    }

    /// Whether the motion would advance the pose on a frame at this moment.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused
    }

    pub fn progress_at(&self, now_ms: f64) -> f32 {
        match self.phase() {
            MotionPhase::Stopped => 0.0,
            MotionPhase::Paused => self.paused_at,
            MotionPhase::Active if self.speed == 0.0 => self.paused_at,
            MotionPhase::Active => calculate_progress(now_ms - self.start_time, self.speed),
        }
    }

    fn start_time_for(&self, progress: f32, now_ms: f64) -> f64 {
        now_ms - elapsed_for_progress(progress, self.speed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Rotate,
    Pan,
    Zoom,
    Touch,
    Pinch,
    #[default]
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub is_interacting: bool,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    /// Reference pose that gesture deltas are measured against.
    pub base_pose_at_start: Pose,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            is_interacting: false,
            kind: InteractionKind::None,
            base_pose_at_start: Pose::default(),
        }
    }
}

/// How [`PoseStore::switch_motion`] treats progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionSwitch {
    Restart,
    Continue,
}

/// Point-in-time copy of the whole store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoreSnapshot {
    pub pose: Pose,
    pub motion: MotionState,
    pub interaction: InteractionState,
    pub revision: u64,
    pub last_source: PoseSource,
}

#[derive(Debug, Clone)]
pub struct PoseStore {
    pose: Pose,
    motion: MotionState,
    interaction: InteractionState,
    limits: PoseLimits,
    revision: u64,
    last_source: PoseSource,
}

impl Default for PoseStore {
    fn default() -> Self {
        Self::new(Pose::default(), PoseLimits::default())
    }
}

impl PoseStore {
    pub fn new(pose: Pose, limits: PoseLimits) -> Self {
        Self {
            pose: pose.sanitized(&limits),
            motion: MotionState::default(),
            interaction: InteractionState::default(),
            limits,
            revision: 0,
            last_source: PoseSource::Reset,
        }
    }

    pub fn state(&self) -> StoreSnapshot {
        StoreSnapshot {
            pose: self.pose,
            motion: self.motion,
            interaction: self.interaction,
            revision: self.revision,
            last_source: self.last_source,
        }
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    #[inline]
    pub fn motion(&self) -> MotionState {
        self.motion
    }

    #[inline]
    pub fn interaction(&self) -> InteractionState {
        self.interaction
    }

    /// Incremented on every pose write that changed the pose.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn last_source(&self) -> PoseSource {
        self.last_source
    }

    #[inline]
    pub fn limits(&self) -> PoseLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: PoseLimits) {
        self.limits = limits;
        let clamped = self.pose.sanitized(&limits);
        if clamped != self.pose {
            self.pose = clamped;
            self.revision += 1;
        }
    }

    // -- pose --------------------------------------------------------------

    /// Write a full pose. Returns `Ok(false)` when the sanitized pose equals
    /// the current one (no revision bump).
    pub fn set_pose(&mut self, pose: Pose, source: PoseSource) -> Result<bool, CameraError> {
        pose.validate()?;
        let pose = pose.sanitized(&self.limits);
        if pose == self.pose {
            return Ok(false);
        }
        self.pose = pose;
        self.revision += 1;
        self.last_source = source;
        Ok(true)
    }

    pub fn patch_pose(&mut self, patch: &PosePatch, source: PoseSource) -> Result<bool, CameraError> {
        self.set_pose(patch.merge_over(&self.pose), source)
    }

    // -- motion ------------------------------------------------------------

    pub fn start_motion(&mut self, kind: MotionType, now_ms: f64, speed: f32) {
        log::debug!("motion start: {} at {now_ms}ms", kind.name());
        self.motion = MotionState {
            motion_type: kind,
            is_active: true,
            is_paused: false,
            paused_at: 0.0,
            start_time: now_ms,
            speed,
        };
    }

    /// Change the motion type. A stopped motion only records the new type.
    pub fn switch_motion(&mut self, kind: MotionType, now_ms: f64, mode: MotionSwitch) {
        if !self.motion.is_active {
            self.motion.motion_type = kind;
            return;
        }
        match mode {
            MotionSwitch::Restart => {
                self.motion.paused_at = 0.0;
                self.motion.start_time = now_ms;
            }
            MotionSwitch::Continue => {
                let p = self.motion.progress_at(now_ms);
                self.motion.start_time = self.motion.start_time_for(p, now_ms);
            }
        }
        log::debug!(
            "motion switch: {} -> {} ({mode:?})",
            self.motion.motion_type.name(),
            kind.name()
        );
        self.motion.motion_type = kind;
    }

    /// Freeze progress. Returns `false` if the motion was not running.
    pub fn pause_motion(&mut self, now_ms: f64) -> bool {
        if !self.motion.is_running() {
            return false;
        }
        self.motion.paused_at = self.motion.progress_at(now_ms);
        self.motion.is_paused = true;
        log::debug!("motion paused at progress {:.4}", self.motion.paused_at);
        true
    }

    /// Continue from the paused progress by shifting the virtual start time.
    pub fn resume_motion(&mut self, now_ms: f64) -> bool {
        if self.motion.phase() != MotionPhase::Paused {
            return false;
        }
        self.motion.start_time = self.motion.start_time_for(self.motion.paused_at, now_ms);
        self.motion.is_paused = false;
        log::debug!("motion resumed from progress {:.4}", self.motion.paused_at);
        true
    }

    pub fn stop_motion(&mut self) -> bool {
        if !self.motion.is_active {
            return false;
        }
        log::debug!("motion stopped: {}", self.motion.motion_type.name());
        self.motion = MotionState {
            motion_type: self.motion.motion_type,
            speed: self.motion.speed,
            ..MotionState::default()
        };
        true
    }

    /// Change speed without moving the current progress. At speed zero the
    /// progress is held in `paused_at` until the speed changes again.
    pub fn set_motion_speed(&mut self, speed: f32, now_ms: f64) {
        if self.motion.is_running() {
            let p = self.motion.progress_at(now_ms);
            self.motion.speed = speed;
            if speed == 0.0 {
                self.motion.paused_at = p;
            } else {
                self.motion.start_time = self.motion.start_time_for(p, now_ms);
            }
        } else {
            self.motion.speed = speed;
        }
    }

    pub fn motion_progress(&self, now_ms: f64) -> f32 {
        self.motion.progress_at(now_ms)
    }

    // -- interaction -------------------------------------------------------

    /// Begin a gesture, capturing the current pose as its reference. Returns
    /// `false` if a gesture was already in progress (the kind is still updated).
    pub fn start_interaction(&mut self, kind: InteractionKind) -> bool {
        if self.interaction.is_interacting {
            self.interaction.kind = kind;
            return false;
        }
        self.interaction = InteractionState {
            is_interacting: true,
            kind,
            base_pose_at_start: self.pose,
        };
        true
    }

    /// Switch the kind of an ongoing gesture and re-capture its reference pose.
    pub fn rebase_interaction(&mut self, kind: InteractionKind) {
        if self.interaction.is_interacting {
            self.interaction.kind = kind;
            self.interaction.base_pose_at_start = self.pose;
        }
    }

    pub fn end_interaction(&mut self) -> bool {
        if !self.interaction.is_interacting {
            return false;
        }
        self.interaction.is_interacting = false;
        self.interaction.kind = InteractionKind::None;
        true
    }
}
