//! Camera pose value types.
//!
//! A [`Pose`] is the complete camera state handed to a render target: eye
//! position, look-at target, up vector, vertical field of view (degrees) and
//! clip planes. [`PosePatch`] is the partial form used by transitions, where
//! omitted fields hold steady.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::easing::lerp_f32;

/// Smallest camera-to-target distance a sanitized pose may have.
pub const MIN_POSE_DISTANCE: f32 = 1e-4;

/// Canonical default pose: looking down -Z at the origin from 5 units away.
pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 0.0, 5.0);
pub const DEFAULT_FOV: f32 = 50.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: DEFAULT_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// Clamp ranges applied to every pose that reaches the store or a render target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseLimits {
    pub fov_min: f32,
    pub fov_max: f32,
}

impl Default for PoseLimits {
    fn default() -> Self {
        Self {
            fov_min: 10.0,
            fov_max: 120.0,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Self::default()
        }
    }

    /// Vector from target to eye.
    #[inline]
    pub fn offset(&self) -> Vec3 {
        self.position - self.target
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.offset().length()
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.target.is_finite()
            && self.up.is_finite()
            && self.fov.is_finite()
            && self.near.is_finite()
            && self.far.is_finite()
    }

    /// Reject poses that cannot be repaired by [`Pose::sanitized`].
    pub fn validate(&self) -> Result<(), CameraError> {
        if !self.is_finite() {
            return Err(CameraError::invalid_pose("pose has non-finite components"));
        }
        Ok(())
    }

    /// Repair a finite pose so it satisfies the pose invariants: fov within
    /// limits, `0 < near < far`, unit up vector and a non-degenerate eye/target
    /// separation.
    pub fn sanitized(mut self, limits: &PoseLimits) -> Self {
        self.fov = self.fov.clamp(limits.fov_min, limits.fov_max);

        self.near = if self.near > 0.0 { self.near } else { DEFAULT_NEAR };
        if self.far <= self.near {
            self.far = self.near + 1.0;
        }

        self.up = self.up.try_normalize().unwrap_or(Vec3::Y);

        if self.distance() < MIN_POSE_DISTANCE {
            self.position = self.target + Vec3::Z * MIN_POSE_DISTANCE;
        }
        self
    }

    /// Component-wise linear interpolation (position, target, up, fov, clip planes).
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            target: self.target.lerp(other.target, t),
            up: self.up.lerp(other.up, t),
            fov: lerp_f32(self.fov, other.fov, t),
            near: lerp_f32(self.near, other.near, t),
            far: lerp_f32(self.far, other.far, t),
        }
    }

    pub fn approx_eq(&self, other: &Pose, eps: f32) -> bool {
        self.position.abs_diff_eq(other.position, eps)
            && self.target.abs_diff_eq(other.target, eps)
            && self.up.abs_diff_eq(other.up, eps)
            && (self.fov - other.fov).abs() <= eps
            && (self.near - other.near).abs() <= eps
            && (self.far - other.far).abs() <= eps
    }

    /// Move the eye along the current view axis so it sits `distance` from the target.
    pub fn with_distance(&self, distance: f32) -> Pose {
        let dir = self.offset().try_normalize().unwrap_or(Vec3::Z);
        Pose {
            position: self.target + dir * distance,
            ..*self
        }
    }

    pub fn orbit_angles(&self) -> OrbitAngles {
        OrbitAngles::from_offset(self.offset())
    }
}

/// Spherical coordinates of the eye around the target.
///
/// Azimuth is measured from +Z towards +X, elevation from the XZ plane towards +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitAngles {
    pub radius: f32,
    pub azimuth: f32,
    pub elevation: f32,
}

impl OrbitAngles {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < MIN_POSE_DISTANCE {
            return Self {
                radius: 0.0,
                azimuth: 0.0,
                elevation: 0.0,
            };
        }
        Self {
            radius,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / radius).clamp(-1.0, 1.0).asin(),
        }
    }

    pub fn to_offset(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        Vec3::new(
            self.radius * cos_el * sin_az,
            self.radius * sin_el,
            self.radius * cos_el * cos_az,
        )
    }
}

/// Partial pose; `None` fields keep the value of the pose it is merged over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PosePatch {
    pub position: Option<Vec3>,
    pub target: Option<Vec3>,
    pub up: Option<Vec3>,
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
}

impl PosePatch {
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn target(mut self, target: Vec3) -> Self {
        self.target = Some(target);
        self
    }

    pub fn up(mut self, up: Vec3) -> Self {
        self.up = Some(up);
        self
    }

    pub fn fov(mut self, fov: f32) -> Self {
        self.fov = Some(fov);
        self
    }

    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = Some(near);
        self.far = Some(far);
        self
    }

    pub fn merge_over(&self, base: &Pose) -> Pose {
        Pose {
            position: self.position.unwrap_or(base.position),
            target: self.target.unwrap_or(base.target),
            up: self.up.unwrap_or(base.up),
            fov: self.fov.unwrap_or(base.fov),
            near: self.near.unwrap_or(base.near),
            far: self.far.unwrap_or(base.far),
        }
    }
}

impl From<Pose> for PosePatch {
    fn from(pose: Pose) -> Self {
        Self {
            position: Some(pose.position),
            target: Some(pose.target),
            up: Some(pose.up),
            fov: Some(pose.fov),
            near: Some(pose.near),
            far: Some(pose.far),
        }
    }
}

/// Who wrote a pose. Carried on store writes and on `camera:pose-changed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseSource {
    /// Direct user manipulation (input gestures, UI sliders).
    User,
    /// Render-target resynchronisation; never re-captured as a base pose.
    Sync,
    /// Transitions and procedural motion.
    Animation,
    Preset,
    Reset,
    External,
}
