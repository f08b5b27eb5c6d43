//! Shared scene configuration read by the camera controller.
//!
//! Field names serialise in camelCase so the same JSON the host keeps for its
//! scene settings (`cameraMotionType`, `motionResumeDelayMs`, ...) deserialises
//! directly. Every field has a default.

use serde::{Deserialize, Serialize};

use crate::driver::BlendMode;
use crate::error::CameraError;
use crate::motion::{MotionParams, MotionParamsPatch, MotionType};
use crate::pose::PoseLimits;
use crate::transition::ProjectionMode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub camera_motion_type: MotionType,
    pub camera_motion_speed: f32,
    pub camera_motion_blend: BlendMode,
    pub motion_resume_delay_ms: f64,
    pub auto_resume_motion: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub projection_mode: ProjectionMode,
    pub rotate_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
    /// Field-of-view clamp range in degrees.
    pub fov_min: f32,
    pub fov_max: f32,
    /// Vertical rotation limits in degrees above/below the target's horizon.
    pub min_elevation: f32,
    pub max_elevation: f32,
    /// Frames between render-target → store resynchronisations.
    pub sync_interval_frames: u32,
    pub preset_distance: f32,
    pub preset_duration_ms: f64,
    pub motion_params: MotionParams,
    pub scene_hint: Option<SceneKind>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_motion_type: MotionType::Static,
            camera_motion_speed: 1.0,
            camera_motion_blend: BlendMode::Additive,
            motion_resume_delay_ms: 1000.0,
            auto_resume_motion: true,
            min_distance: 0.5,
            max_distance: 50.0,
            projection_mode: ProjectionMode::Plane,
            rotate_sensitivity: 1.0,
            pan_sensitivity: 1.0,
            zoom_sensitivity: 1.0,
            fov_min: 10.0,
            fov_max: 120.0,
            min_elevation: -85.0,
            max_elevation: 85.0,
            sync_interval_frames: 30,
            preset_distance: 5.0,
            preset_duration_ms: 800.0,
            motion_params: MotionParams::default(),
            scene_hint: None,
        }
    }
}

impl SceneConfig {
    /// Parse and validate a JSON scene configuration.
    pub fn from_json(json: &str) -> Result<Self, CameraError> {
        let cfg: SceneConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.fov_min.is_finite() && self.fov_max.is_finite()) || self.fov_min >= self.fov_max {
            return Err(CameraError::invalid_config(format!(
                "fovMin ({}) must be below fovMax ({})",
                self.fov_min, self.fov_max
            )));
        }
        if self.fov_min <= 0.0 || self.fov_max >= 180.0 {
            return Err(CameraError::invalid_config("fov range must lie inside (0, 180)"));
        }
        if !(self.min_distance > 0.0 && self.min_distance <= self.max_distance) {
            return Err(CameraError::invalid_config(format!(
                "distance range [{}, {}] is invalid",
                self.min_distance, self.max_distance
            )));
        }
        if !self.motion_resume_delay_ms.is_finite() || self.motion_resume_delay_ms < 0.0 {
            return Err(CameraError::invalid_config(
                "motionResumeDelayMs must be a finite, non-negative number",
            ));
        }
        if self.sync_interval_frames == 0 {
            return Err(CameraError::invalid_config("syncIntervalFrames must be at least 1"));
        }
        if !(self.min_elevation > -90.0
            && self.max_elevation < 90.0
            && self.min_elevation <= self.max_elevation)
        {
            return Err(CameraError::invalid_config(
                "elevation range must lie inside (-90, 90)",
            ));
        }
        if !self.camera_motion_speed.is_finite() {
            return Err(CameraError::invalid_config("cameraMotionSpeed must be finite"));
        }
        Ok(())
    }

    pub fn pose_limits(&self) -> PoseLimits {
        PoseLimits {
            fov_min: self.fov_min,
            fov_max: self.fov_max,
        }
    }

    /// Effective progress rate: scene speed times the motion's own speed multiplier.
    pub fn effective_motion_speed(&self) -> f32 {
        self.camera_motion_speed * self.motion_params.speed
    }

    /// Adopt the motion suggested by an external scene analysis.
    pub fn with_scene_hint(mut self, kind: SceneKind) -> Self {
        let (motion, patch) = kind.suggestion();
        self.camera_motion_type = motion;
        self.motion_params = self.motion_params.merged(&patch);
        self.scene_hint = Some(kind);
        self
    }
}

/// Scene classification produced by the (external) analysis pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    Portrait,
    Landscape,
    Architecture,
    Object,
    Interior,
}

impl SceneKind {
    pub fn suggestion(&self) -> (MotionType, MotionParamsPatch) {
        match self {
            Self::Portrait => (
                MotionType::DollyZoom,
                MotionParamsPatch {
                    dolly_range: Some(1.5),
                    dolly_intensity: Some(0.6),
                    ..Default::default()
                },
            ),
            Self::Landscape => (
                MotionType::FlyBy,
                MotionParamsPatch {
                    speed: Some(0.6),
                    ..Default::default()
                },
            ),
            Self::Architecture => (
                MotionType::Arc,
                MotionParamsPatch {
                    arc_angle: Some(20.0),
                    ..Default::default()
                },
            ),
            Self::Object => (MotionType::Orbit, MotionParamsPatch::default()),
            Self::Interior => (
                MotionType::Arc,
                MotionParamsPatch {
                    arc_angle: Some(15.0),
                    speed: Some(0.5),
                    ..Default::default()
                },
            ),
        }
    }
}
