use approx::assert_abs_diff_eq;
use parallax_camera::glam::Vec3;
use parallax_camera::motion::progress_period_ms;
use parallax_camera::{calculate_motion, calculate_progress, MotionParams, MotionType, Pose};

fn samples() -> impl Iterator<Item = f32> {
    (0..100).map(|i| i as f32 / 100.0)
}

/// it should keep ORBIT on a sphere of orbitRadius around the target for every progress
#[test]
fn orbit_radius_is_constant() {
    let base = Pose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, -1.0, 2.0));
    for radius in [1.0f32, 4.5, 9.0] {
        let params = MotionParams {
            orbit_radius: radius,
            ..MotionParams::default()
        };
        for p in samples() {
            let s = calculate_motion(MotionType::Orbit, p, &base, &params, None).unwrap();
            assert_abs_diff_eq!((s.position - s.target).length(), radius, epsilon = 1e-4);
            assert_eq!(s.target, base.target);
            assert_eq!(s.fov, base.fov);
        }
    }
}

/// it should place the ORBIT eye at (0, 2.33, 8.69) for radius 9, tilt 15° and progress 0
#[test]
fn orbit_scenario_at_progress_zero() {
    let base = Pose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
    let params = MotionParams {
        orbit_radius: 9.0,
        orbit_tilt: 15.0,
        ..MotionParams::default()
    };
    let s = calculate_motion(MotionType::Orbit, 0.0, &base, &params, None).unwrap();
    assert_abs_diff_eq!(s.position.x, 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(s.position.y, 2.33, epsilon = 0.01);
    assert_abs_diff_eq!(s.position.z, 8.69, epsilon = 0.01);
}

/// it should hold tan(fov/2)·distance for DOLLY_ZOOM at full intensity
#[test]
fn dolly_zoom_preserves_frame_width() {
    let base = Pose::new(Vec3::new(0.0, 1.0, 6.0), Vec3::ZERO);
    let params = MotionParams::default();
    let width0 = (base.fov.to_radians() * 0.5).tan() * base.distance();
    for p in samples() {
        let s = calculate_motion(MotionType::DollyZoom, p, &base, &params, None).unwrap();
        let width = (s.fov.to_radians() * 0.5).tan() * (s.position - s.target).length();
        assert_abs_diff_eq!(width, width0, epsilon = 1e-3);
    }
}

/// it should blend DOLLY_ZOOM fov between the base and vertigo fov by intensity
#[test]
fn dolly_zoom_intensity_scales_effect() {
    let base = Pose::new(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO);
    let full = MotionParams::default();
    let half = MotionParams {
        dolly_intensity: 0.5,
        ..MotionParams::default()
    };
    let a = calculate_motion(MotionType::DollyZoom, 0.25, &base, &full, None).unwrap();
    let b = calculate_motion(MotionType::DollyZoom, 0.25, &base, &half, None).unwrap();
    assert!((b.fov - base.fov).abs() < (a.fov - base.fov).abs());
    assert!((b.position - b.target).length() < (a.position - a.target).length());
    // the dolly never reaches the target
    let extreme = MotionParams {
        dolly_range: 100.0,
        ..MotionParams::default()
    };
    let c = calculate_motion(MotionType::DollyZoom, 0.75, &base, &extreme, None).unwrap();
    assert!((c.position - c.target).length() >= 0.1 - 1e-6);
    assert!(c.fov.is_finite());
}

/// it should return STATIC as no sample and leave degenerate bases untouched
#[test]
fn degenerate_inputs_fall_back() {
    let params = MotionParams::default();
    let base = Pose::default();
    assert!(calculate_motion(MotionType::Static, 0.5, &base, &params, None).is_none());

    let collapsed = Pose::new(Vec3::splat(2.0), Vec3::splat(2.0));
    for kind in [MotionType::DollyZoom, MotionType::FlyBy] {
        let s = calculate_motion(kind, 0.4, &collapsed, &params, None).unwrap();
        assert_eq!(s.position, collapsed.position);
        assert_eq!(s.fov, collapsed.fov);
    }
    assert_eq!(MotionType::from("WOBBLE"), MotionType::Static);
}

/// it should make SPIRAL a helix spanning spiralHeight over one cycle
#[test]
fn spiral_is_a_helix() {
    let base = Pose::default();
    let params = MotionParams::default();
    let mut last_y = f32::NEG_INFINITY;
    for p in samples() {
        let s = calculate_motion(MotionType::Spiral, p, &base, &params, None).unwrap();
        let offset = s.position - s.target;
        assert_abs_diff_eq!(Vec3::new(offset.x, 0.0, offset.z).length(), params.spiral_radius, epsilon = 1e-4);
        assert!(offset.y > last_y);
        last_y = offset.y;
    }
}

/// it should be periodic in elapsed time with period 1000 / (speed · BASE_RATE)
#[test]
fn progress_is_periodic() {
    for speed in [0.25f32, 1.0, 3.7] {
        let period = progress_period_ms(speed).unwrap();
        for t in [0.0f64, 123.0, 4_567.0, 98_765.0] {
            let a = calculate_progress(t, speed);
            let b = calculate_progress(t + period, speed);
            assert!((0.0..1.0).contains(&a));
            let diff = (a - b).abs();
            assert!(diff.min(1.0 - diff) < 1e-3, "speed={speed} t={t} a={a} b={b}");
        }
    }
}
