//! Integration tests for orbit and zoom through the input event path.

use approx::assert_relative_eq;
use sketchforge_gui_lib::fixtures;
use sketchforge_gui_lib::harness::{TestHarness, HARNESS_VIEWPORT};
use sketchforge_gui_lib::viewport::navigation::{InputEvent, INCLINATION_EPSILON};

fn loaded() -> TestHarness {
    let mut h = TestHarness::new();
    h.load(fixtures::CUBE_10).unwrap();
    h
}

#[test]
fn test_orbit_back_and_forth_returns_to_start() {
    let mut h = loaded();
    let start = h.camera().unwrap();

    h.drag((80.0, 60.0), 40.0, 15.0);
    let moved = h.camera().unwrap();
    assert!((moved.position - start.position).length() > 1e-3);

    h.drag((80.0, 60.0), -40.0, -15.0);
    let back = h.camera().unwrap();
    assert!((back.position - start.position).length() < 1e-3);
    assert_eq!(back.target, start.target);
}

#[test]
fn test_orbit_keeps_radius() {
    let mut h = loaded();
    let r0 = h.camera().unwrap().radius();
    h.drag((10.0, 10.0), 120.0, 0.0);
    assert_relative_eq!(h.camera().unwrap().radius(), r0, epsilon = 1e-3);
}

#[test]
fn test_move_without_press_does_nothing() {
    let mut h = loaded();
    let start = h.camera().unwrap();
    h.send(InputEvent::PointerMove { x: 150.0, y: 100.0 });
    assert_eq!(h.camera().unwrap(), start);
}

#[test]
fn test_pointer_leave_ends_drag() {
    let mut h = loaded();
    h.send(InputEvent::PointerDown { x: 10.0, y: 10.0 });
    h.send(InputEvent::PointerLeave);
    let start = h.camera().unwrap();
    h.send(InputEvent::PointerMove { x: 90.0, y: 40.0 });
    assert_eq!(h.camera().unwrap(), start);
}

#[test]
fn test_inclination_clamped_at_poles() {
    let mut h = loaded();
    h.drag((0.0, 0.0), 0.0, -10_000.0);
    let top = h.camera().unwrap().spherical();
    assert!(top.inclination >= INCLINATION_EPSILON - 1e-5);

    h.drag((0.0, 0.0), 0.0, 20_000.0);
    let bottom = h.camera().unwrap().spherical();
    assert!(bottom.inclination <= std::f32::consts::PI - INCLINATION_EPSILON + 1e-5);

    // Still renders without NaNs near the pole
    assert!(h.render_frame().is_some());
    assert!(h.camera().unwrap().position.is_finite());
}

#[test]
fn test_zoom_is_monotonic() {
    let mut h = loaded();
    let mut last = h.camera().unwrap().radius();
    for _ in 0..5 {
        h.wheel(-1.0);
        let r = h.camera().unwrap().radius();
        assert!(r < last);
        last = r;
    }
    for _ in 0..5 {
        h.wheel(1.0);
        let r = h.camera().unwrap().radius();
        assert!(r > last);
        last = r;
    }
}

#[test]
fn test_zoom_in_then_out_restores_radius() {
    let mut h = loaded();
    let r0 = h.camera().unwrap().radius();
    h.wheel(-1.0);
    h.wheel(1.0);
    assert_relative_eq!(h.camera().unwrap().radius(), r0, max_relative = 1e-5);
}

#[test]
fn test_zoom_keeps_target() {
    let mut h = loaded();
    let target = h.camera().unwrap().target;
    h.wheel(-3.0);
    assert_eq!(h.camera().unwrap().target, target);
}

#[test]
fn test_resize_updates_projection_and_surface() {
    let mut h = loaded();
    h.resize(320, 80);
    let camera = h.camera().unwrap();
    assert_eq!((camera.projection.width, camera.projection.height), (320, 80));
    assert_eq!(camera.projection.aspect, 4.0);

    h.render_frame();
    let surface = h.viewer().session().unwrap().render_loop().surface();
    assert_eq!((surface.width(), surface.height()), (320, 80));
}

#[test]
fn test_reset_camera_restores_framing() {
    let mut h = loaded();
    let start = h.camera().unwrap();
    h.drag((0.0, 0.0), 50.0, 20.0);
    h.wheel(2.0);
    h.viewer_mut().reset_camera();
    let reset = h.camera().unwrap();
    assert!((reset.position - start.position).length() < 1e-4);
    assert_eq!(
        (reset.projection.width, reset.projection.height),
        HARNESS_VIEWPORT
    );
}
