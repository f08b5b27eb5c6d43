use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parallax_camera::{CameraController, EventBus, MotionType, Pose, SharedRig};

fn controller_with(kind: MotionType) -> (CameraController, SharedRig) {
    let mut c = CameraController::default();
    c.initialize(EventBus::new()).expect("initialize");
    let rig = SharedRig::new(Pose::default());
    c.bind_target(Box::new(rig.clone())).expect("bind");
    c.start_motion(kind).expect("start motion");
    (c, rig)
}

fn bench_update_frame(c: &mut Criterion) {
    for kind in [MotionType::Orbit, MotionType::DollyZoom, MotionType::Spiral] {
        let (mut controller, rig) = controller_with(kind);
        let mut now = 0.0f64;
        c.bench_function(&format!("update_frame/{}", kind.name()), |b| {
            b.iter(|| {
                now += 16.0;
                let report = controller.update_frame(0.016, black_box(now)).expect("frame");
                black_box(report);
                black_box(rig.take_redraw());
            })
        });
    }
}

criterion_group!(benches, bench_update_frame);
criterion_main!(benches);
