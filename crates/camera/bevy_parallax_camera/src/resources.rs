use bevy::prelude::*;
use parallax_camera::{CameraController, EventBus, FrameReport, SharedRig};

/// The engine-agnostic controller, owned by the ECS.
#[derive(Resource, Debug)]
pub struct CameraControllerResource(pub CameraController);

/// Rig the controller writes into; read by the apply system.
#[derive(Resource, Debug, Clone)]
pub struct CameraRigHandle(pub SharedRig);

/// Bus the controller is subscribed to. Clone it to publish or listen.
#[derive(Resource, Clone)]
pub struct CameraBus(pub EventBus);

/// Report of the most recent frame.
#[derive(Resource, Debug, Default)]
pub struct LastFrame(pub FrameReport);

/// Last cursor position in window pixels, needed because button events carry
/// no coordinates.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct CursorPosition(pub Option<Vec2>);
