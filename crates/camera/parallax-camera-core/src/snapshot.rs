//! Plain camera state record used by project save/load.

use serde::{Deserialize, Serialize};

use crate::driver::BlendMode;
use crate::error::CameraError;
use crate::motion::MotionType;
use crate::pose::Pose;
use crate::transition::ProjectionMode;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSnapshot {
    pub pose: Pose,
    #[serde(default)]
    pub motion_type: MotionType,
    #[serde(default = "default_speed")]
    pub motion_speed: f32,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub projection_mode: ProjectionMode,
}

fn default_speed() -> f32 {
    1.0
}

impl CameraSnapshot {
    pub fn to_json(&self) -> Result<String, CameraError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CameraError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and reject poses that could not be applied.
    pub fn from_json(json: &str) -> Result<Self, CameraError> {
        let snapshot: CameraSnapshot = serde_json::from_str(json)?;
        snapshot.pose.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let snap = CameraSnapshot::from_json(
            r#"{ "pose": { "position": [0, 1, 4], "target": [0, 0, 0], "up": [0, 1, 0],
                           "fov": 45, "near": 0.1, "far": 100 } }"#,
        )
        .unwrap();
        assert_eq!(snap.motion_type, MotionType::Static);
        assert_eq!(snap.motion_speed, 1.0);
        assert_eq!(snap.blend_mode, BlendMode::Additive);
        assert_eq!(snap.projection_mode, ProjectionMode::Plane);
        assert_eq!(snap.pose.fov, 45.0);
    }

    #[test]
    fn missing_pose_is_an_error() {
        assert!(CameraSnapshot::from_json(r#"{ "motionType": "ORBIT" }"#).is_err());
    }
}
