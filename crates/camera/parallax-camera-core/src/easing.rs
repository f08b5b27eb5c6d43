//! Easing curves and scalar interpolation helpers.
//!
//! Every curve maps `t ∈ [0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`;
//! inputs outside the unit interval are clamped first.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInOutSine,
    /// CSS-style timing function with control points (x1, y1, x2, y2).
    CubicBezier([f32; 4]),
}

impl Default for Easing {
    fn default() -> Self {
        Self::EaseInOutCubic
    }
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => t * (2.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Self::EaseInOutCubic => ease_in_out_cubic(t),
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::CubicBezier([x1, y1, x2, y2]) => bezier_ease_t(t, *x1, *y1, *x2, *y2),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInQuad => "easeInQuad",
            Self::EaseOutQuad => "easeOutQuad",
            Self::EaseInOutQuad => "easeInOutQuad",
            Self::EaseInCubic => "easeInCubic",
            Self::EaseOutCubic => "easeOutCubic",
            Self::EaseInOutCubic => "easeInOutCubic",
            Self::EaseInOutSine => "easeInOutSine",
            Self::CubicBezier(_) => "cubicBezier",
        }
    }
}

impl From<&str> for Easing {
    fn from(s: &str) -> Self {
        match s {
            "linear" => Self::Linear,
            "easeInQuad" | "ease-in-quad" => Self::EaseInQuad,
            "easeOutQuad" | "ease-out-quad" => Self::EaseOutQuad,
            "easeInOutQuad" | "ease-in-out-quad" => Self::EaseInOutQuad,
            "easeInCubic" | "ease-in-cubic" => Self::EaseInCubic,
            "easeOutCubic" | "ease-out-cubic" => Self::EaseOutCubic,
            "easeInOutCubic" | "ease-in-out-cubic" => Self::EaseInOutCubic,
            "easeInOutSine" | "ease-in-out-sine" => Self::EaseInOutSine,
            "ease" => Self::CubicBezier([0.25, 0.1, 0.25, 1.0]),
            "ease-in" => Self::CubicBezier([0.42, 0.0, 1.0, 1.0]),
            "ease-out" => Self::CubicBezier([0.0, 0.0, 0.58, 1.0]),
            "ease-in-out" => Self::CubicBezier([0.42, 0.0, 0.58, 1.0]),
            other => {
                log::warn!("unknown easing '{other}', using easeInOutCubic");
                Self::EaseInOutCubic
            }
        }
    }
}

#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Cubic Bezier basis function.
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Invert the x curve by bisection, then evaluate y at the found parameter.
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x1 == y1 && x2 == y2 {
        return t;
    }
    // x is monotonic for x1, x2 in [0, 1]
    let x1 = x1.clamp(0.0, 1.0);
    let x2 = x2.clamp(0.0, 1.0);
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 9] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInOutSine,
        Easing::CubicBezier([0.42, 0.0, 0.58, 1.0]),
    ];

    #[test]
    fn curves_hit_endpoints() {
        for e in ALL {
            assert!(e.apply(0.0).abs() < 1e-5, "{} at 0", e.name());
            assert!((e.apply(1.0) - 1.0).abs() < 1e-5, "{} at 1", e.name());
        }
    }

    #[test]
    fn symmetric_curves_pass_through_midpoint() {
        for e in [
            Easing::Linear,
            Easing::EaseInOutQuad,
            Easing::EaseInOutCubic,
            Easing::EaseInOutSine,
            Easing::CubicBezier([0.42, 0.0, 0.58, 1.0]),
        ] {
            assert!((e.apply(0.5) - 0.5).abs() < 1e-3, "{}", e.name());
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Easing::EaseInCubic.apply(-3.0), 0.0);
        assert_eq!(Easing::EaseOutQuad.apply(7.0), 1.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 0.0);
    }

    #[test]
    fn unknown_name_falls_back() {
        assert_eq!(Easing::from("wobble"), Easing::EaseInOutCubic);
        assert_eq!(Easing::from("linear"), Easing::Linear);
    }
}
