//! Named camera views around the origin.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::pose::{OrbitAngles, Pose};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Preset {
    Front,
    Top,
    Side,
    Iso,
    Focus,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Fraction of the preset distance used by `FOCUS`.
const FOCUS_DISTANCE: f32 = 0.6;
const FOCUS_FOV: f32 = 35.0;
const CORNER_AZIMUTH_DEG: f32 = 45.0;
const CORNER_ELEVATION_DEG: f32 = 30.0;

impl Preset {
    pub const ALL: [Preset; 9] = [
        Self::Front,
        Self::Top,
        Self::Side,
        Self::Iso,
        Self::Focus,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Front => "FRONT",
            Self::Top => "TOP",
            Self::Side => "SIDE",
            Self::Iso => "ISO",
            Self::Focus => "FOCUS",
            Self::TopLeft => "TOP_LEFT",
            Self::TopRight => "TOP_RIGHT",
            Self::BottomLeft => "BOTTOM_LEFT",
            Self::BottomRight => "BOTTOM_RIGHT",
        }
    }

    /// Case-insensitive; `_`, `-` and spaces are ignored (`top-left`, `TopLeft`).
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_uppercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|p| p.name().replace('_', "") == key)
    }

    /// The view at `distance` from the origin.
    pub fn pose(&self, distance: f32) -> Pose {
        let at = |position: Vec3| Pose::new(position, Vec3::ZERO);
        let corner = |az: f32, el: f32| {
            at(OrbitAngles {
                radius: distance,
                azimuth: az.to_radians(),
                elevation: el.to_radians(),
            }
            .to_offset())
        };
        match self {
            Self::Front => at(Vec3::Z * distance),
            Self::Top => Pose {
                up: Vec3::NEG_Z,
                ..at(Vec3::Y * distance)
            },
            Self::Side => at(Vec3::X * distance),
            Self::Iso => at(Vec3::ONE.normalize() * distance),
            Self::Focus => Pose {
                fov: FOCUS_FOV,
                ..at(Vec3::Z * distance * FOCUS_DISTANCE)
            },
            Self::TopLeft => corner(-CORNER_AZIMUTH_DEG, CORNER_ELEVATION_DEG),
            Self::TopRight => corner(CORNER_AZIMUTH_DEG, CORNER_ELEVATION_DEG),
            Self::BottomLeft => corner(-CORNER_AZIMUTH_DEG, -CORNER_ELEVATION_DEG),
            Self::BottomRight => corner(CORNER_AZIMUTH_DEG, -CORNER_ELEVATION_DEG),
        }
    }
}

/// Resolve a preset by name. Unknown names yield [`Pose::default`]: the
/// front view at distance 5 with a 50° fov.
pub fn resolve(name: &str, distance: f32) -> Pose {
    match Preset::from_name(name) {
        Some(preset) => preset.pose(distance),
        None => {
            log::warn!("unknown camera preset '{name}', using default pose");
            Pose::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::DEFAULT_FOV;

    #[test]
    fn every_preset_sits_at_the_requested_distance() {
        for preset in Preset::ALL {
            let pose = preset.pose(5.0);
            let expected = if preset == Preset::Focus { 3.0 } else { 5.0 };
            assert!((pose.distance() - expected).abs() < 1e-4, "{}", preset.name());
            assert_eq!(pose.target, Vec3::ZERO);
        }
        assert_eq!(Preset::Front.pose(5.0).fov, DEFAULT_FOV);
    }

    #[test]
    fn names_are_forgiving() {
        assert_eq!(Preset::from_name("top-left"), Some(Preset::TopLeft));
        assert_eq!(Preset::from_name("iso"), Some(Preset::Iso));
        assert_eq!(Preset::from_name("BottomRight"), Some(Preset::BottomRight));
        assert_eq!(Preset::from_name("diagonal"), None);
    }

    #[test]
    fn unknown_resolves_to_default_pose() {
        assert_eq!(resolve("UNKNOWN", 12.0), Pose::default());
    }
}
