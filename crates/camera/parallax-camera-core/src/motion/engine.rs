//! Stateless motion path evaluator.
//!
//! [`calculate_motion`] maps `(type, progress, base pose, params)` to an eye
//! position, look-at target and fov. It never mutates anything and never
//! divides by a near-zero distance: degenerate bases come back unchanged.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::{MotionParams, MotionType};
use crate::easing::{ease_in_out_cubic, lerp_f32};
use crate::pose::Pose;

/// Below this eye/target separation a base pose is treated as degenerate.
pub const MIN_MOTION_DISTANCE: f32 = 1e-3;
/// Closest the dolly may push the eye towards the target.
pub const MIN_DOLLY_DISTANCE: f32 = 0.1;
/// Extra fov (degrees) at the fly-by's closest approach.
pub const FLY_BY_FOV_PULSE: f32 = 4.0;
/// Fraction of the fly-by's lateral offset the look-at target follows.
pub const FLY_BY_TARGET_LEAD: f32 = 0.15;

/// Result of evaluating a motion path at one progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}

impl From<&Pose> for MotionSample {
    fn from(pose: &Pose) -> Self {
        Self {
            position: pose.position,
            target: pose.target,
            fov: pose.fov,
        }
    }
}

impl MotionSample {
    /// Apply the sample over `base`, keeping its up vector and clip planes.
    pub fn apply_to(&self, base: &Pose) -> Pose {
        Pose {
            position: self.position,
            target: self.target,
            fov: self.fov,
            ..*base
        }
    }
}

/// Evaluate `kind` at `progress` (wrapped into `[0, 1)`).
///
/// Returns `None` for [`MotionType::Static`]. `Tracking` without a tracking
/// target returns the base pose unchanged.
pub fn calculate_motion(
    kind: MotionType,
    progress: f32,
    base: &Pose,
    params: &MotionParams,
    tracking_target: Option<Vec3>,
) -> Option<MotionSample> {
    let p = if progress.is_finite() {
        progress.rem_euclid(1.0)
    } else {
        0.0
    };
    match kind {
        MotionType::Static => None,
        MotionType::Orbit => Some(orbit(p, base, params)),
        MotionType::Arc => Some(arc(p, base, params)),
        MotionType::Spiral => Some(spiral(p, base, params)),
        MotionType::DollyZoom => Some(dolly_zoom(p, base, params)),
        MotionType::FlyBy => Some(fly_by(p, base, params)),
        MotionType::Tracking => Some(tracking(base, params, tracking_target)),
    }
}

fn orbit(p: f32, base: &Pose, params: &MotionParams) -> MotionSample {
    let radius = params.orbit_radius * params.scale;
    let (sin_tilt, cos_tilt) = params.orbit_tilt.to_radians().sin_cos();
    let (sin_az, cos_az) = (p * TAU).sin_cos();
    MotionSample {
        position: base.target
            + Vec3::new(
                radius * cos_tilt * sin_az,
                radius * sin_tilt,
                radius * cos_tilt * cos_az,
            ),
        target: base.target,
        fov: base.fov,
    }
}

fn arc(p: f32, base: &Pose, params: &MotionParams) -> MotionSample {
    let offset = base.offset();
    let height = offset.y;
    let mut horizontal = Vec3::new(offset.x, 0.0, offset.z).length();
    let base_azimuth = if horizontal < MIN_MOTION_DISTANCE {
        horizontal = params.orbit_radius * params.scale;
        0.0
    } else {
        offset.x.atan2(offset.z)
    };
    let azimuth = base_azimuth + (p * TAU).sin() * params.arc_angle.to_radians();
    let (sin_az, cos_az) = azimuth.sin_cos();
    MotionSample {
        position: base.target + Vec3::new(horizontal * sin_az, height, horizontal * cos_az),
        target: base.target,
        fov: base.fov,
    }
}

fn spiral(p: f32, base: &Pose, params: &MotionParams) -> MotionSample {
    let radius = params.spiral_radius * params.scale;
    let half = params.spiral_height * params.scale * 0.5;
    let (sin_az, cos_az) = (p * TAU * params.spiral_loops).sin_cos();
    MotionSample {
        position: base.target + Vec3::new(radius * sin_az, lerp_f32(-half, half, p), radius * cos_az),
        target: base.target,
        fov: base.fov,
    }
}

/// Vertigo effect: the eye dollies along the view axis while fov compensates so
/// `tan(fov / 2) * distance` stays at its starting value (blended by intensity).
fn dolly_zoom(p: f32, base: &Pose, params: &MotionParams) -> MotionSample {
    let offset = base.offset();
    let d0 = offset.length();
    if d0 < MIN_MOTION_DISTANCE {
        return MotionSample::from(base);
    }
    let dir = offset / d0;
    let intensity = params.dolly_intensity;
    let distance = (d0 + (p * TAU).sin() * params.dolly_range * params.scale * intensity)
        .max(MIN_DOLLY_DISTANCE);

    let half_width = (base.fov.to_radians() * 0.5).tan() * d0;
    let vertigo_fov = (2.0 * (half_width / distance).atan()).to_degrees();

    MotionSample {
        position: base.target + dir * distance,
        target: base.target,
        fov: lerp_f32(base.fov, vertigo_fov, intensity.clamp(0.0, 1.0)),
    }
}

/// Approach-and-pass sweep across the view in the base pose's camera frame.
/// The first half-cycle passes left to right, the second flies back, so the
/// path is closed across the progress wrap.
fn fly_by(p: f32, base: &Pose, params: &MotionParams) -> MotionSample {
    let offset = base.offset();
    let d0 = offset.length();
    if d0 < MIN_MOTION_DISTANCE {
        return MotionSample::from(base);
    }
    let back = offset / d0;
    let right = base.up.cross(back).try_normalize().unwrap_or(Vec3::X);
    let up = back.cross(right);

    let s = ease_in_out_cubic(1.0 - (2.0 * p - 1.0).abs());
    let closeness = (s * PI).sin();
    let swing = params.fly_by_swing * params.scale;
    let lateral = lerp_f32(-swing, swing, s);
    let depth = (d0 - params.fly_by_depth * params.scale * closeness).max(MIN_DOLLY_DISTANCE);
    let height = params.fly_by_height * params.scale * 0.5 * (s * PI).cos();

    MotionSample {
        position: base.target + back * depth + right * lateral + up * height,
        target: base.target + right * lateral * FLY_BY_TARGET_LEAD,
        fov: base.fov + FLY_BY_FOV_PULSE * closeness,
    }
}

fn tracking(base: &Pose, params: &MotionParams, tracking_target: Option<Vec3>) -> MotionSample {
    let Some(followed) = tracking_target else {
        return MotionSample::from(base);
    };
    let back = base.offset().try_normalize().unwrap_or(Vec3::Z);
    MotionSample {
        position: followed
            + back * params.tracking_distance * params.scale
            + params.tracking_offset * params.scale,
        target: followed,
        fov: base.fov,
    }
}
