//! Pointer, touch and wheel interpretation.
//!
//! Gestures are measured against the pose captured when they started
//! (`InteractionState::base_pose_at_start`) using total deltas from the gesture
//! origin, so long drags never accumulate per-event drift. Wheel and pinch zoom
//! are the exception: they scale the current distance event by event.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::SceneConfig;
use crate::pose::{OrbitAngles, Pose, PoseSource};
use crate::store::{InteractionKind, PoseStore};

/// A wheel gesture ends once no wheel event arrived for this long.
pub const WHEEL_IDLE_MS: f64 = 150.0;
/// Screen pixels to world units for pan at sensitivity 1.
pub const PAN_SCALE: f32 = 0.01;
/// Wheel delta units to log-distance at sensitivity 1.
pub const WHEEL_SCALE: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Raw input in viewport pixels (origin top-left, y down).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown { button: PointerButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { button: PointerButton },
    #[serde(rename_all = "camelCase")]
    Wheel { delta_y: f32 },
    TouchStart { touches: Vec<[f32; 2]> },
    TouchMove { touches: Vec<[f32; 2]> },
    /// `touches` lists the contacts still down after the lift.
    TouchEnd { touches: Vec<[f32; 2]> },
    ContextMenu,
}

impl InputEvent {
    fn is_finite(&self) -> bool {
        match self {
            Self::PointerDown { x, y, .. } | Self::PointerMove { x, y } => x.is_finite() && y.is_finite(),
            Self::Wheel { delta_y } => delta_y.is_finite(),
            Self::TouchStart { touches } | Self::TouchMove { touches } | Self::TouchEnd { touches } => {
                touches.iter().flatten().all(|v| v.is_finite())
            }
            Self::PointerUp { .. } | Self::ContextMenu => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSignal {
    Started(InteractionKind),
    Ended,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputResponse {
    /// The host should suppress the platform default (context menu, page scroll).
    pub prevent_default: bool,
    pub signals: Vec<InputSignal>,
    /// Pose written to the store by this event.
    pub pose_changed: Option<Pose>,
}

/// Receives gesture boundaries. `interaction_started` runs before the store
/// captures the gesture's reference pose; `interaction_ended` after the store
/// cleared its interaction flag.
pub trait InteractionSink {
    fn interaction_started(&mut self, _kind: InteractionKind, _store: &mut PoseStore) {}
    fn interaction_ended(&mut self, _store: &mut PoseStore) {}
}

impl InteractionSink for () {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputSettings {
    pub rotate_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians.
    pub min_elevation: f32,
    pub max_elevation: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self::from(&SceneConfig::default())
    }
}

impl From<&SceneConfig> for InputSettings {
    fn from(cfg: &SceneConfig) -> Self {
        Self {
            rotate_sensitivity: cfg.rotate_sensitivity,
            pan_sensitivity: cfg.pan_sensitivity,
            zoom_sensitivity: cfg.zoom_sensitivity,
            min_distance: cfg.min_distance,
            max_distance: cfg.max_distance,
            min_elevation: cfg.min_elevation.to_radians(),
            max_elevation: cfg.max_elevation.to_radians(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Rotate { origin: Vec2 },
    Pan { origin: Vec2 },
    Touch { origin: Vec2 },
    Pinch { last_spread: f32 },
    Wheel { last_ms: f64 },
}

#[derive(Debug, Clone)]
pub struct InputController {
    settings: InputSettings,
    viewport: Vec2,
    gesture: Gesture,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(InputSettings::default())
    }
}

impl InputController {
    pub fn new(settings: InputSettings) -> Self {
        Self {
            settings,
            viewport: Vec2::new(800.0, 600.0),
            gesture: Gesture::Idle,
        }
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: InputSettings) {
        self.settings = settings;
    }

    /// Viewport size in pixels; deltas are normalised by its height.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.viewport = Vec2::new(width, height);
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Forget any gesture in progress without signalling (teardown, reset).
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn handle(
        &mut self,
        event: &InputEvent,
        now_ms: f64,
        store: &mut PoseStore,
        sink: &mut dyn InteractionSink,
    ) -> InputResponse {
        let mut out = InputResponse::default();
        if !event.is_finite() {
            log::warn!("ignoring input event with non-finite coordinates");
            return out;
        }

        match event {
            InputEvent::ContextMenu => out.prevent_default = true,

            InputEvent::PointerDown { button, x, y } => {
                let origin = Vec2::new(*x, *y);
                let (gesture, kind) = match button {
                    PointerButton::Primary => (Gesture::Rotate { origin }, InteractionKind::Rotate),
                    PointerButton::Middle | PointerButton::Secondary => {
                        (Gesture::Pan { origin }, InteractionKind::Pan)
                    }
                };
                self.end_gesture(store, sink, &mut out);
                self.begin(gesture, kind, store, sink, &mut out);
            }

            InputEvent::PointerMove { x, y } => {
                let at = Vec2::new(*x, *y);
                let pose = match self.gesture {
                    Gesture::Rotate { origin } | Gesture::Touch { origin } => Some(self.rotate(store, at - origin)),
                    Gesture::Pan { origin } => Some(self.pan(store, at - origin)),
                    _ => None,
                };
                if let Some(pose) = pose {
                    self.write(pose, store, &mut out);
                }
            }

            InputEvent::PointerUp { .. } => {
                if matches!(self.gesture, Gesture::Rotate { .. } | Gesture::Pan { .. }) {
                    self.end_gesture(store, sink, &mut out);
                }
            }

            InputEvent::Wheel { delta_y } => {
                out.prevent_default = true;
                match self.gesture {
                    Gesture::Wheel { .. } => self.gesture = Gesture::Wheel { last_ms: now_ms },
                    _ => {
                        self.end_gesture(store, sink, &mut out);
                        self.begin(Gesture::Wheel { last_ms: now_ms }, InteractionKind::Zoom, store, sink, &mut out);
                    }
                }
                let factor = (delta_y * self.settings.zoom_sensitivity * WHEEL_SCALE).exp();
                let pose = self.zoom(store.pose(), factor);
                self.write(pose, store, &mut out);
            }

            InputEvent::TouchStart { touches } => {
                out.prevent_default = true;
                match touches.as_slice() {
                    [] => {}
                    [one] => {
                        if !matches!(self.gesture, Gesture::Touch { .. }) {
                            self.end_gesture(store, sink, &mut out);
                            self.begin(Gesture::Touch { origin: Vec2::from(*one) }, InteractionKind::Touch, store, sink, &mut out);
                        }
                    }
                    [a, b, ..] => {
                        let last_spread = spread(a, b);
                        if matches!(self.gesture, Gesture::Touch { .. } | Gesture::Pinch { .. }) {
                            store.rebase_interaction(InteractionKind::Pinch);
                            self.gesture = Gesture::Pinch { last_spread };
                        } else {
                            self.end_gesture(store, sink, &mut out);
                            self.begin(Gesture::Pinch { last_spread }, InteractionKind::Pinch, store, sink, &mut out);
                        }
                    }
                }
            }

            InputEvent::TouchMove { touches } => {
                out.prevent_default = true;
                match (self.gesture, touches.as_slice()) {
                    (Gesture::Touch { origin }, [one, ..]) => {
                        let pose = self.rotate(store, Vec2::from(*one) - origin);
                        self.write(pose, store, &mut out);
                    }
                    (Gesture::Pinch { last_spread }, [a, b, ..]) => {
                        let current = spread(a, b);
                        if current > f32::EPSILON && last_spread > f32::EPSILON {
                            let pose = self.zoom(store.pose(), last_spread / current);
                            self.gesture = Gesture::Pinch { last_spread: current };
                            self.write(pose, store, &mut out);
                        }
                    }
                    _ => {}
                }
            }

            InputEvent::TouchEnd { touches } => {
                out.prevent_default = true;
                match (self.gesture, touches.as_slice()) {
                    (Gesture::Touch { .. } | Gesture::Pinch { .. }, []) => self.end_gesture(store, sink, &mut out),
                    (Gesture::Pinch { .. }, [one, ..]) => {
                        store.rebase_interaction(InteractionKind::Touch);
                        self.gesture = Gesture::Touch { origin: Vec2::from(*one) };
                    }
                    _ => {}
                }
            }
        }
        out
    }

    /// Close a wheel gesture that has gone idle.
    pub fn tick(&mut self, now_ms: f64, store: &mut PoseStore, sink: &mut dyn InteractionSink) -> InputResponse {
        let mut out = InputResponse::default();
        if let Gesture::Wheel { last_ms } = self.gesture {
            if now_ms - last_ms >= WHEEL_IDLE_MS {
                self.end_gesture(store, sink, &mut out);
            }
        }
        out
    }

    fn begin(
        &mut self,
        gesture: Gesture,
        kind: InteractionKind,
        store: &mut PoseStore,
        sink: &mut dyn InteractionSink,
        out: &mut InputResponse,
    ) {
        sink.interaction_started(kind, store);
        store.start_interaction(kind);
        self.gesture = gesture;
        out.signals.push(InputSignal::Started(kind));
    }

    fn end_gesture(&mut self, store: &mut PoseStore, sink: &mut dyn InteractionSink, out: &mut InputResponse) {
        if self.gesture == Gesture::Idle {
            return;
        }
        self.gesture = Gesture::Idle;
        if store.end_interaction() {
            sink.interaction_ended(store);
        }
        out.signals.push(InputSignal::Ended);
    }

    fn write(&self, pose: Pose, store: &mut PoseStore, out: &mut InputResponse) {
        match store.set_pose(pose, PoseSource::User) {
            Ok(true) => out.pose_changed = Some(store.pose()),
            Ok(false) => {}
            Err(e) => log::warn!("input produced an unusable pose: {e}"),
        }
    }

    fn rotate(&self, store: &PoseStore, delta: Vec2) -> Pose {
        let base = store.interaction().base_pose_at_start;
        let s = &self.settings;
        let h = self.viewport.y;
        let OrbitAngles {
            radius,
            azimuth,
            elevation,
        } = base.orbit_angles();
        let angles = OrbitAngles {
            radius: radius.clamp(s.min_distance, s.max_distance),
            azimuth: azimuth - TAU * delta.x / h * s.rotate_sensitivity,
            elevation: (elevation + PI * delta.y / h * s.rotate_sensitivity)
                .clamp(s.min_elevation, s.max_elevation),
        };
        Pose {
            position: base.target + angles.to_offset(),
            ..base
        }
    }

    fn pan(&self, store: &PoseStore, delta: Vec2) -> Pose {
        let base = store.interaction().base_pose_at_start;
        let forward = (-base.offset()).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(base.up).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        let shift = (-right * delta.x + up * delta.y) * self.settings.pan_sensitivity * PAN_SCALE;
        Pose {
            position: base.position + shift,
            target: base.target + shift,
            ..base
        }
    }

    fn zoom(&self, current: Pose, factor: f32) -> Pose {
        let distance = (current.distance() * factor).clamp(self.settings.min_distance, self.settings.max_distance);
        current.with_distance(distance)
    }
}

fn spread(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    Vec2::from(*a).distance(Vec2::from(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::PoseLimits;

    fn setup() -> (InputController, PoseStore) {
        (InputController::default(), PoseStore::new(Pose::default(), PoseLimits::default()))
    }

    #[test]
    fn primary_drag_rotates_around_target() {
        let (mut input, mut store) = setup();
        let r = input.handle(
            &InputEvent::PointerDown { button: PointerButton::Primary, x: 100.0, y: 100.0 },
            0.0,
            &mut store,
            &mut (),
        );
        assert_eq!(r.signals, vec![InputSignal::Started(InteractionKind::Rotate)]);
        assert!(store.interaction().is_interacting);

        let r = input.handle(&InputEvent::PointerMove { x: 250.0, y: 100.0 }, 16.0, &mut store, &mut ());
        let pose = r.pose_changed.unwrap();
        assert!((pose.distance() - 5.0).abs() < 1e-4);
        assert_eq!(pose.target, Vec3::ZERO);
        // dragging right swings the eye towards -X
        assert!(pose.position.x < 0.0);

        let r = input.handle(&InputEvent::PointerUp { button: PointerButton::Primary }, 32.0, &mut store, &mut ());
        assert_eq!(r.signals, vec![InputSignal::Ended]);
        assert!(!store.interaction().is_interacting);
    }

    #[test]
    fn vertical_rotation_is_clamped() {
        let (mut input, mut store) = setup();
        input.handle(&InputEvent::PointerDown { button: PointerButton::Primary, x: 0.0, y: 0.0 }, 0.0, &mut store, &mut ());
        input.handle(&InputEvent::PointerMove { x: 0.0, y: 10_000.0 }, 16.0, &mut store, &mut ());
        let el = store.pose().orbit_angles().elevation;
        assert!(el <= 85f32.to_radians() + 1e-4);
    }

    #[test]
    fn secondary_drag_pans_position_and_target_together() {
        let (mut input, mut store) = setup();
        let before = store.pose();
        input.handle(&InputEvent::PointerDown { button: PointerButton::Secondary, x: 0.0, y: 0.0 }, 0.0, &mut store, &mut ());
        input.handle(&InputEvent::PointerMove { x: 100.0, y: 0.0 }, 16.0, &mut store, &mut ());
        let after = store.pose();
        assert!((after.offset() - before.offset()).length() < 1e-5);
        assert!((after.target.x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn wheel_zoom_is_clamped_and_ends_after_idle() {
        let (mut input, mut store) = setup();
        let r = input.handle(&InputEvent::Wheel { delta_y: 100_000.0 }, 0.0, &mut store, &mut ());
        assert!(r.prevent_default);
        assert_eq!(r.signals, vec![InputSignal::Started(InteractionKind::Zoom)]);
        assert!((store.pose().distance() - 50.0).abs() < 1e-3);

        input.handle(&InputEvent::Wheel { delta_y: -100_000.0 }, 100.0, &mut store, &mut ());
        assert!((store.pose().distance() - 0.5).abs() < 1e-4);

        assert!(input.tick(200.0, &mut store, &mut ()).signals.is_empty());
        assert_eq!(input.tick(250.0, &mut store, &mut ()).signals, vec![InputSignal::Ended]);
        assert!(!store.interaction().is_interacting);
    }

    #[test]
    fn pinch_scales_by_spread_ratio() {
        let (mut input, mut store) = setup();
        input.handle(&InputEvent::TouchStart { touches: vec![[0.0, 0.0]] }, 0.0, &mut store, &mut ());
        input.handle(&InputEvent::TouchStart { touches: vec![[0.0, 0.0], [100.0, 0.0]] }, 5.0, &mut store, &mut ());
        assert_eq!(store.interaction().kind, InteractionKind::Pinch);
        input.handle(&InputEvent::TouchMove { touches: vec![[0.0, 0.0], [200.0, 0.0]] }, 16.0, &mut store, &mut ());
        assert!((store.pose().distance() - 2.5).abs() < 1e-4);
        let r = input.handle(&InputEvent::TouchEnd { touches: vec![] }, 32.0, &mut store, &mut ());
        assert_eq!(r.signals, vec![InputSignal::Ended]);
    }

    #[test]
    fn context_menu_is_suppressed() {
        let (mut input, mut store) = setup();
        assert!(input.handle(&InputEvent::ContextMenu, 0.0, &mut store, &mut ()).prevent_default);
    }
}
