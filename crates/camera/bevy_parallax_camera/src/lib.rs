//! Bevy plugin for the Parallax camera controller.
//!
//! The plugin owns a [`CameraController`] as a resource, forwards mouse input
//! to it, ticks it once per `Update` and copies the resulting pose onto every
//! entity tagged [`ParallaxCamera`].

use bevy::input::mouse::{MouseButtonInput, MouseWheel};
use bevy::prelude::*;
use bevy::window::CursorMoved;
use parallax_camera::{
    BlendMode, CameraController, EventBus, MotionType, ProjectionMode, SceneConfig, SharedRig,
};

pub mod components;
pub mod resources;
pub mod systems;

pub use components::ParallaxCamera;
pub use resources::{CameraBus, CameraControllerResource, CameraRigHandle, CursorPosition, LastFrame};

/// Commands for the controller, sent as Bevy events. Durations are in
/// milliseconds; 0 applies immediately.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum CameraCommand {
    MoveTo { position: Vec3, duration_ms: f64 },
    LookAt { target: Vec3, duration_ms: f64 },
    SetFov { fov: f32, duration_ms: f64 },
    ApplyPreset(String),
    StartMotion(MotionType),
    StopMotion,
    PauseMotion,
    ResumeMotion,
    SetBlendMode(BlendMode),
    TransitionProjection { mode: ProjectionMode, duration_ms: f64 },
    Reset,
}

#[derive(Default)]
pub struct ParallaxCameraPlugin {
    pub config: SceneConfig,
}

impl Plugin for ParallaxCameraPlugin {
    fn build(&self, app: &mut App) {
        let mut controller = CameraController::new(self.config.clone()).unwrap_or_else(|e| {
            warn!("{e}; falling back to the default camera configuration");
            CameraController::default()
        });
        let bus = EventBus::new();
        if let Err(e) = controller.initialize(bus.clone()) {
            error!("camera controller failed to initialize: {e}");
        }
        let rig = SharedRig::new(controller.get_current_pose().unwrap_or_default());
        if let Err(e) = controller.bind_target(Box::new(rig.clone())) {
            error!("camera rig could not be bound: {e}");
        }

        app.insert_resource(CameraControllerResource(controller))
            .insert_resource(CameraRigHandle(rig))
            .insert_resource(CameraBus(bus))
            .init_resource::<LastFrame>()
            .init_resource::<CursorPosition>()
            // MinimalPlugins registers no input events; add_event is a no-op when they exist.
            .add_event::<MouseButtonInput>()
            .add_event::<CursorMoved>()
            .add_event::<MouseWheel>()
            .add_event::<CameraCommand>()
            .add_systems(
                Update,
                (
                    systems::sync_viewport_system,
                    systems::forward_mouse_system,
                    systems::apply_commands_system,
                    systems::tick_controller_system,
                    systems::apply_rig_system,
                )
                    .chain(),
            )
            .add_systems(Last, systems::dispose_on_exit_system);
    }
}
