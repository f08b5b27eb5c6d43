use bevy::prelude::*;

/// Marker for the camera entity the controller drives. Its `Transform` and
/// perspective `Projection` are overwritten every frame from the rig.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ParallaxCamera;
