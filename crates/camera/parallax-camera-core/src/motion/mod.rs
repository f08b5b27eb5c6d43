//! Procedural camera motion: path types, tunables, the stateless path
//! evaluator and the time → progress mapping.

pub mod engine;
pub mod params;
pub mod progress;

use serde::{Deserialize, Serialize};

pub use engine::{calculate_motion, MotionSample};
pub use params::{MotionParams, MotionParamsPatch};
pub use progress::{calculate_progress, progress_period_ms, BASE_RATE};

/// Named procedural camera path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionType {
    #[default]
    Static,
    Orbit,
    Arc,
    DollyZoom,
    FlyBy,
    Spiral,
    Tracking,
}

impl MotionType {
    pub const ALL: [MotionType; 7] = [
        Self::Static,
        Self::Orbit,
        Self::Arc,
        Self::DollyZoom,
        Self::FlyBy,
        Self::Spiral,
        Self::Tracking,
    ];

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "STATIC",
            Self::Orbit => "ORBIT",
            Self::Arc => "ARC",
            Self::DollyZoom => "DOLLY_ZOOM",
            Self::FlyBy => "FLY_BY",
            Self::Spiral => "SPIRAL",
            Self::Tracking => "TRACKING",
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static)
    }
}

impl From<&str> for MotionType {
    /// Accepts `DOLLY_ZOOM`, `dolly-zoom`, `dollyZoom` and friends. Unknown
    /// names resolve to `Static`.
    fn from(s: &str) -> Self {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_uppercase)
            .collect();
        match key.as_str() {
            "STATIC" | "NONE" => Self::Static,
            "ORBIT" => Self::Orbit,
            "ARC" => Self::Arc,
            "DOLLYZOOM" => Self::DollyZoom,
            "FLYBY" => Self::FlyBy,
            "SPIRAL" => Self::Spiral,
            "TRACKING" => Self::Tracking,
            _ => {
                log::warn!("unknown motion type '{s}', falling back to STATIC");
                Self::Static
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_spellings() {
        assert_eq!(MotionType::from("dolly-zoom"), MotionType::DollyZoom);
        assert_eq!(MotionType::from("flyBy"), MotionType::FlyBy);
        assert_eq!(MotionType::from("ORBIT"), MotionType::Orbit);
        assert_eq!(MotionType::from("corkscrew"), MotionType::Static);
    }

    #[test]
    fn serde_uses_screaming_names() {
        let json = serde_json::to_string(&MotionType::DollyZoom).unwrap();
        assert_eq!(json, "\"DOLLY_ZOOM\"");
        for t in MotionType::ALL {
            assert_eq!(
                serde_json::to_string(&t).unwrap(),
                format!("\"{}\"", t.name())
            );
        }
    }
}
