//! Parallax Camera Core (engine-agnostic)
//!
//! Camera pose and motion control for pseudo-3D depth scenes: procedural motion
//! paths, pointer/touch/wheel interpretation, per-frame blending onto a bound
//! render target, eased transitions, and the lifecycle glue that pauses motion
//! around user interaction. Engine adapters own a [`CameraController`] and call
//! [`CameraController::update_frame`] from their render loop.

pub mod bus;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod driver;
pub mod easing;
pub mod error;
pub mod input;
pub mod motion;
pub mod pose;
pub mod presets;
pub mod snapshot;
pub mod store;
pub mod timer;
pub mod transition;

// Re-exports for consumers (adapters)
pub use glam;
pub use bus::{BusEvent, EventBus, PublisherId, Subscription, SubscriptionId, Topic};
pub use config::{SceneConfig, SceneKind};
pub use controller::{CameraController, Lifecycle};
pub use coordinator::{CoordinatorSettings, InteractionCoordinator};
pub use driver::{
    AnimationDriver, BlendMode, CameraRig, FrameReport, FrameSource, MotionContext, RenderTarget, SharedRig,
};
pub use easing::Easing;
pub use error::CameraError;
pub use input::{InputController, InputEvent, InputResponse, InputSettings, InputSignal, PointerButton};
pub use motion::{calculate_motion, calculate_progress, MotionParams, MotionParamsPatch, MotionSample, MotionType};
pub use pose::{Pose, PoseLimits, PosePatch, PoseSource};
pub use presets::Preset;
pub use snapshot::CameraSnapshot;
pub use store::{InteractionKind, InteractionState, MotionPhase, MotionState, MotionSwitch, PoseStore, StoreSnapshot};
pub use timer::{TaskHandle, TimerQueue};
pub use transition::{AnimationHandle, ProjectionFrame, ProjectionMode, TransitionFrame, TransitionService};
