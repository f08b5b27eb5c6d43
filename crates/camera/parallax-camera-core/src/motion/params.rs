//! Per-motion tunables.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Flat record of motion tunables. Angles are degrees. `scale` multiplies every
/// radius, range and distance; `speed` multiplies the progress rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionParams {
    pub orbit_radius: f32,
    pub orbit_tilt: f32,
    pub arc_angle: f32,
    pub spiral_radius: f32,
    pub spiral_loops: f32,
    pub spiral_height: f32,
    pub dolly_range: f32,
    pub dolly_intensity: f32,
    pub fly_by_swing: f32,
    pub fly_by_depth: f32,
    pub fly_by_height: f32,
    pub tracking_distance: f32,
    pub tracking_offset: Vec3,
    pub speed: f32,
    pub scale: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            orbit_radius: 9.0,
            orbit_tilt: 15.0,
            arc_angle: 30.0,
            spiral_radius: 8.0,
            spiral_loops: 2.0,
            spiral_height: 3.0,
            dolly_range: 3.0,
            dolly_intensity: 1.0,
            fly_by_swing: 6.0,
            fly_by_depth: 3.0,
            fly_by_height: 1.5,
            tracking_distance: 6.0,
            tracking_offset: Vec3::new(0.0, 1.5, 0.0),
            speed: 1.0,
            scale: 1.0,
        }
    }
}

/// Caller overrides; present fields replace the corresponding [`MotionParams`] field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionParamsPatch {
    pub orbit_radius: Option<f32>,
    pub orbit_tilt: Option<f32>,
    pub arc_angle: Option<f32>,
    pub spiral_radius: Option<f32>,
    pub spiral_loops: Option<f32>,
    pub spiral_height: Option<f32>,
    pub dolly_range: Option<f32>,
    pub dolly_intensity: Option<f32>,
    pub fly_by_swing: Option<f32>,
    pub fly_by_depth: Option<f32>,
    pub fly_by_height: Option<f32>,
    pub tracking_distance: Option<f32>,
    pub tracking_offset: Option<Vec3>,
    pub speed: Option<f32>,
    pub scale: Option<f32>,
}

impl MotionParams {
    /// Shallow merge: every field present in `patch` wins.
    pub fn merged(&self, patch: &MotionParamsPatch) -> Self {
        Self {
            orbit_radius: patch.orbit_radius.unwrap_or(self.orbit_radius),
            orbit_tilt: patch.orbit_tilt.unwrap_or(self.orbit_tilt),
            arc_angle: patch.arc_angle.unwrap_or(self.arc_angle),
            spiral_radius: patch.spiral_radius.unwrap_or(self.spiral_radius),
            spiral_loops: patch.spiral_loops.unwrap_or(self.spiral_loops),
            spiral_height: patch.spiral_height.unwrap_or(self.spiral_height),
            dolly_range: patch.dolly_range.unwrap_or(self.dolly_range),
            dolly_intensity: patch.dolly_intensity.unwrap_or(self.dolly_intensity),
            fly_by_swing: patch.fly_by_swing.unwrap_or(self.fly_by_swing),
            fly_by_depth: patch.fly_by_depth.unwrap_or(self.fly_by_depth),
            fly_by_height: patch.fly_by_height.unwrap_or(self.fly_by_height),
            tracking_distance: patch.tracking_distance.unwrap_or(self.tracking_distance),
            tracking_offset: patch.tracking_offset.unwrap_or(self.tracking_offset),
            speed: patch.speed.unwrap_or(self.speed),
            scale: patch.scale.unwrap_or(self.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_shallow_and_partial() {
        let patch: MotionParamsPatch =
            serde_json::from_str(r#"{ "orbitRadius": 4.0, "trackingOffset": [1.0, 0.0, 0.0] }"#)
                .unwrap();
        let merged = MotionParams::default().merged(&patch);
        assert_eq!(merged.orbit_radius, 4.0);
        assert_eq!(merged.tracking_offset, Vec3::X);
        assert_eq!(merged.orbit_tilt, MotionParams::default().orbit_tilt);
    }
}
