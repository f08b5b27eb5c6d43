//! Wall-clock time → cyclic motion progress.

/// Loops per second at speed 1 (a ten second cycle).
pub const BASE_RATE: f64 = 0.1;

/// Euclidean remainder that tolerates a zero divisor.
fn fmod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Progress in `[0, 1)` after `elapsed_ms` at `speed`.
///
/// Depends only on elapsed wall-clock time, never on frame count, so a motion
/// can be resumed from any captured progress value by shifting its start time.
pub fn calculate_progress(elapsed_ms: f64, speed: f32) -> f32 {
    if !elapsed_ms.is_finite() || !speed.is_finite() {
        return 0.0;
    }
    let loops = elapsed_ms / 1000.0 * speed as f64 * BASE_RATE;
    let p = fmod(loops, 1.0) as f32;
    // f64 → f32 rounding can land exactly on 1.0
    if p >= 1.0 {
        0.0
    } else {
        p
    }
}

/// Length of one full cycle at `speed`, or `None` when the motion is frozen.
pub fn progress_period_ms(speed: f32) -> Option<f64> {
    if speed == 0.0 || !speed.is_finite() {
        return None;
    }
    Some(1000.0 / (speed.abs() as f64 * BASE_RATE))
}

/// Elapsed time that yields `progress` at `speed`; the inverse of [`calculate_progress`]
/// over a single cycle. Used to rebuild a virtual start time on resume.
pub fn elapsed_for_progress(progress: f32, speed: f32) -> f64 {
    match progress_period_ms(speed) {
        Some(period) => {
            let p = fmod(progress as f64, 1.0);
            if speed < 0.0 {
                fmod(-p * period, period)
            } else {
                p * period
            }
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_second_cycle_at_unit_speed() {
        assert_eq!(calculate_progress(0.0, 1.0), 0.0);
        assert!((calculate_progress(2_500.0, 1.0) - 0.25).abs() < 1e-6);
        assert!(calculate_progress(10_000.0, 1.0).abs() < 1e-6);
        assert_eq!(progress_period_ms(1.0), Some(10_000.0));
    }

    #[test]
    fn negative_speed_runs_backwards_inside_unit_interval() {
        let p = calculate_progress(2_500.0, -1.0);
        assert!((p - 0.75).abs() < 1e-6);
    }

    #[test]
    fn inverse_matches_forward_mapping() {
        for speed in [0.5f32, 1.0, 3.0, -2.0] {
            for p in [0.0f32, 0.1, 0.5, 0.9] {
                let elapsed = elapsed_for_progress(p, speed);
                assert!(
                    (calculate_progress(elapsed, speed) - p).abs() < 1e-5,
                    "speed={speed} p={p}"
                );
            }
        }
    }

    #[test]
    fn degenerate_inputs_yield_zero() {
        assert_eq!(calculate_progress(f64::NAN, 1.0), 0.0);
        assert_eq!(calculate_progress(1_000.0, 0.0), 0.0);
        assert_eq!(elapsed_for_progress(0.5, 0.0), 0.0);
    }
}
