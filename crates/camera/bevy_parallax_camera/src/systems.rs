use bevy::input::mouse::{MouseButtonInput, MouseScrollUnit, MouseWheel};
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use parallax_camera::{CameraError, InputEvent, PointerButton};

use crate::components::ParallaxCamera;
use crate::resources::{CameraControllerResource, CameraRigHandle, CursorPosition, LastFrame};
use crate::CameraCommand;

/// Wheel delta per scroll line, matching a browser's pixel-mode delta.
const PIXELS_PER_LINE: f32 = 100.0;

fn now_ms(time: &Time) -> f64 {
    time.elapsed_seconds_f64() * 1000.0
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn report(result: Result<(), CameraError>, what: &str) {
    match result {
        Ok(()) | Err(CameraError::Disposed) => {}
        Err(e) => warn!("camera {what} failed: {e}"),
    }
}

pub fn sync_viewport_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut ctl: ResMut<CameraControllerResource>,
) {
    if let Ok(window) = windows.get_single() {
        ctl.0.set_viewport(window.width(), window.height());
    }
}

/// Cursor moves are forwarded before presses and presses before releases;
/// ordering across event types within one frame is not preserved by Bevy.
pub fn forward_mouse_system(
    time: Res<Time>,
    mut cursor: ResMut<CursorPosition>,
    mut moves: EventReader<CursorMoved>,
    mut buttons: EventReader<MouseButtonInput>,
    mut wheel: EventReader<MouseWheel>,
    mut ctl: ResMut<CameraControllerResource>,
) {
    let now = now_ms(&time);
    let mut events = Vec::new();

    for ev in moves.read() {
        cursor.0 = Some(ev.position);
        events.push(InputEvent::PointerMove {
            x: ev.position.x,
            y: ev.position.y,
        });
    }

    let at = cursor.0.unwrap_or_default();
    let (pressed, released): (Vec<_>, Vec<_>) = buttons
        .read()
        .filter_map(|ev| pointer_button(ev.button).map(|b| (b, ev.state)))
        .partition(|(_, state)| *state == ButtonState::Pressed);
    events.extend(pressed.into_iter().map(|(button, _)| InputEvent::PointerDown {
        button,
        x: at.x,
        y: at.y,
    }));
    events.extend(released.into_iter().map(|(button, _)| InputEvent::PointerUp { button }));

    for ev in wheel.read() {
        let scale = match ev.unit {
            MouseScrollUnit::Line => PIXELS_PER_LINE,
            MouseScrollUnit::Pixel => 1.0,
        };
        // Bevy reports scroll-up as positive; the controller expects DOM deltaY.
        events.push(InputEvent::Wheel { delta_y: -ev.y * scale });
    }

    for event in &events {
        report(ctl.0.handle_input(event, now).map(|_| ()), "input");
    }
}

pub fn apply_commands_system(
    mut commands: EventReader<CameraCommand>,
    mut ctl: ResMut<CameraControllerResource>,
) {
    let c = &mut ctl.0;
    for cmd in commands.read() {
        let result = match cmd {
            CameraCommand::MoveTo { position, duration_ms } => c.move_to(*position, *duration_ms).map(|_| ()),
            CameraCommand::LookAt { target, duration_ms } => c.look_at(*target, *duration_ms).map(|_| ()),
            CameraCommand::SetFov { fov, duration_ms } => c.set_fov(*fov, *duration_ms).map(|_| ()),
            CameraCommand::ApplyPreset(name) => c.apply_preset(name).map(|_| ()),
            CameraCommand::StartMotion(kind) => c.start_motion(*kind),
            CameraCommand::StopMotion => c.stop_motion().map(|_| ()),
            CameraCommand::PauseMotion => c.pause_motion().map(|_| ()),
            CameraCommand::ResumeMotion => c.resume_motion().map(|_| ()),
            CameraCommand::SetBlendMode(blend) => c.set_blend_mode(*blend),
            CameraCommand::TransitionProjection { mode, duration_ms } => {
                c.transition_projection(*mode, *duration_ms).map(|_| ())
            }
            CameraCommand::Reset => c.reset(),
        };
        report(result, "command");
    }
}

pub fn tick_controller_system(
    time: Res<Time>,
    mut ctl: ResMut<CameraControllerResource>,
    mut last: ResMut<LastFrame>,
) {
    match ctl.0.update_frame(time.delta_seconds(), now_ms(&time)) {
        Ok(frame) => last.0 = frame,
        Err(CameraError::Disposed) => {}
        Err(e) => warn!("camera frame failed: {e}"),
    }
}

/// Copy the rig's pose onto tagged cameras. Perspective projections receive
/// fov (converted to radians) and clip planes; other projections keep theirs.
pub fn apply_rig_system(
    rig: Res<CameraRigHandle>,
    mut cameras: Query<(&mut Transform, Option<&mut Projection>), With<ParallaxCamera>>,
) {
    let pose = rig.0.pose();
    if !pose.is_finite() {
        return;
    }
    for (mut transform, projection) in &mut cameras {
        *transform = Transform::from_translation(pose.position).looking_at(pose.target, pose.up);
        if let Some(mut projection) = projection {
            if let Projection::Perspective(p) = projection.as_mut() {
                p.fov = pose.fov.to_radians();
                p.near = pose.near;
                p.far = pose.far;
            }
        }
    }
}

pub fn dispose_on_exit_system(mut exits: EventReader<AppExit>, mut ctl: ResMut<CameraControllerResource>) {
    if exits.read().next().is_some() && ctl.0.dispose() {
        debug!("camera controller disposed on app exit");
    }
}
