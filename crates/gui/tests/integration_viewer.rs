//! Integration tests for the viewer lifecycle.
//!
//! Loading, re-loading, failing and tearing down sessions through the
//! headless harness.

use approx::assert_abs_diff_eq;
use sketchforge_gui_lib::fixtures;
use sketchforge_gui_lib::harness::TestHarness;
use sketchforge_gui_lib::session::ViewerError;
use sketchforge_gui_lib::viewport::render_loop::FrameOutcome;

#[test]
fn test_load_cube_frames_camera_on_center() {
    let mut h = TestHarness::new();
    h.load(fixtures::CUBE_10).unwrap();

    assert_eq!(h.solid_count(), 1);
    assert_eq!(h.listener_count(), 3);
    let camera = h.camera().unwrap();
    assert_abs_diff_eq!(camera.target.x, 5.0, epsilon = 1e-4);
    assert_abs_diff_eq!(camera.target.y, 5.0, epsilon = 1e-4);
    assert_abs_diff_eq!(camera.target.z, 5.0, epsilon = 1e-4);
    assert!(camera.radius() > 10.0);
}

#[test]
fn test_evaluation_is_deterministic() {
    let mut a = TestHarness::new();
    let mut b = TestHarness::new();
    a.load(fixtures::PHONE_STAND).unwrap();
    b.load(fixtures::PHONE_STAND).unwrap();

    assert_eq!(a.viewer().solids(), b.viewer().solids());
    let va = a.validate_mesh(0).unwrap();
    let vb = b.validate_mesh(0).unwrap();
    assert_eq!(va.triangle_count(), vb.triangle_count());
    assert_eq!(va.dimensions(), vb.dimensions());
}

#[test]
fn test_every_sample_evaluates_to_valid_meshes() {
    for (label, text) in fixtures::samples() {
        let mut h = TestHarness::new();
        h.load(text).unwrap_or_else(|e| panic!("{label}: {e}"));
        assert!(h.solid_count() > 0, "{label}: no solids");
        for i in 0..h.solid_count() {
            let v = h.validate_mesh(i).unwrap();
            assert!(v.triangle_count() > 0, "{label}[{i}]: empty mesh");
            assert!(v.is_stride_valid() && v.are_indices_in_range(), "{label}[{i}]: bad buffers");
            assert!(v.are_positions_finite(), "{label}[{i}]: non-finite positions");
        }
    }
}

#[test]
fn test_two_parts_are_separate_models() {
    let mut h = TestHarness::new();
    h.load(fixtures::TWO_PARTS).unwrap();
    assert_eq!(h.solid_count(), 2);
    // grid + axes + two models
    assert_eq!(h.entity_count(), 4);
}

#[test]
fn test_failed_reload_clears_previous_model() {
    let mut h = TestHarness::new();
    h.load(fixtures::CUBE_10).unwrap();
    let old_loop = h.viewer().session().unwrap().loop_handle();

    let err = h.load(fixtures::RUNTIME_ERROR).unwrap_err();
    assert!(matches!(err, ViewerError::Evaluation(_)));

    assert_eq!(h.solid_count(), 0);
    assert_eq!(h.listener_count(), 0);
    assert!(old_loop.is_cancelled());
    assert!(h.camera().is_none());
    assert_eq!(h.overlay_kind(), Some("evaluation"));
    assert_eq!(h.render_frame(), None);
}

#[test]
fn test_missing_entry_point_is_reported() {
    let mut h = TestHarness::new();
    let err = h.load(fixtures::NO_ENTRY_POINT).unwrap_err();
    assert!(err.to_string().contains("main"));
    assert_eq!(h.overlay_kind(), Some("evaluation"));
}

#[test]
fn test_runaway_script_is_stopped() {
    let mut h = TestHarness::new();
    let err = h.load(fixtures::RUNAWAY_LOOP).unwrap_err();
    assert!(matches!(err, ViewerError::Evaluation(_)));
    assert_eq!(h.solid_count(), 0);
}

#[test]
fn test_successful_load_after_error_clears_overlay() {
    let mut h = TestHarness::new();
    h.load(fixtures::RUNTIME_ERROR).unwrap_err();
    h.load(fixtures::CUBE_10).unwrap();
    assert_eq!(h.overlay_kind(), None);
    assert_eq!(h.solid_count(), 1);
}

#[test]
fn test_reload_replaces_session_and_listeners() {
    let mut h = TestHarness::new();
    h.load(fixtures::CUBE_10).unwrap();
    let first = h.viewer().session().unwrap().loop_handle();

    h.load(fixtures::CUP).unwrap();
    assert!(first.is_cancelled());
    assert_eq!(h.listener_count(), 3);
    assert_eq!(h.render_frame(), Some(FrameOutcome::Drawn { frame: 1 }));
}

#[test]
fn test_frame_numbers_unique_across_reloads_and_resizes() {
    let mut h = TestHarness::new();
    let mut frames = Vec::new();
    let mut draw = |h: &mut TestHarness| match h.render_frame() {
        Some(FrameOutcome::Drawn { frame }) => frames.push(frame),
        other => panic!("expected a drawn frame, got {other:?}"),
    };

    h.load(fixtures::CUBE_10).unwrap();
    draw(&mut h);
    h.load(fixtures::TWO_PARTS).unwrap();
    draw(&mut h);
    h.resize(320, 200);
    draw(&mut h);
    h.load(fixtures::CUBE_10).unwrap();
    draw(&mut h);
    draw(&mut h);

    assert_eq!(frames, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_teardown_is_idempotent() {
    let mut h = TestHarness::new();
    h.load(fixtures::CUBE_10).unwrap();
    let handle = h.viewer().session().unwrap().loop_handle();

    h.teardown();
    h.teardown();

    assert!(handle.is_cancelled());
    assert_eq!(h.listener_count(), 0);
    assert_eq!(h.solid_count(), 0);
    assert_eq!(h.render_frame(), None);
}

#[test]
fn test_input_without_session_is_not_delivered() {
    let mut h = TestHarness::new();
    assert!(!h.send(sketchforge_gui_lib::viewport::navigation::InputEvent::Wheel { notches: 1.0 }));
}
