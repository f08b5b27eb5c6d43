//! Error types for the camera controller.

use thiserror::Error;

/// Errors surfaced by the public controller API.
///
/// Numeric degeneracies (zero distances, unknown preset names, unknown motion
/// types) are not errors: they resolve to documented fallbacks instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CameraError {
    /// The controller was disposed; every public entry point refuses work afterwards.
    #[error("camera controller has been disposed")]
    Disposed,

    /// Scene configuration failed validation.
    #[error("invalid camera configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A pose carried non-finite components or an impossible clip range.
    #[error("invalid pose: {reason}")]
    InvalidPose { reason: String },

    /// JSON (de)serialisation of config, snapshots or bus payloads failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CameraError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn invalid_pose(reason: impl Into<String>) -> Self {
        Self::InvalidPose {
            reason: reason.into(),
        }
    }

    /// Whether the controller can keep running after this error.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Disposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposed_is_terminal() {
        assert!(!CameraError::Disposed.is_recoverable());
        assert!(CameraError::invalid_pose("nan").is_recoverable());
        assert_eq!(
            CameraError::invalid_config("fovMin >= fovMax").to_string(),
            "invalid camera configuration: fovMin >= fovMax"
        );
    }
}
