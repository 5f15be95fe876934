//! Headless test harness driving the live viewer without a window.
//!
//! Input goes through the same `InputEvent` path the eframe host uses, and
//! frames are drawn into the software surface.

use crate::export::{ExportArtifact, Snapshot};
use crate::model::GeneratedSource;
use crate::session::{Viewer, ViewerError, ViewerSettings};
use crate::validation::MeshValidator;
use crate::viewport::camera::CameraState;
use crate::viewport::navigation::InputEvent;
use crate::viewport::render_loop::FrameOutcome;

pub const HARNESS_VIEWPORT: (u32, u32) = (160, 120);

/// Headless test harness: a viewer plus input helpers
pub struct TestHarness {
    viewer: Viewer,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(ViewerSettings::default())
    }

    pub fn with_settings(settings: ViewerSettings) -> Self {
        let mut viewer = Viewer::new(settings);
        let (width, height) = HARNESS_VIEWPORT;
        viewer.handle_input(InputEvent::Resize { width, height });
        Self { viewer }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        &mut self.viewer
    }

    // ── Model ─────────────────────────────────────────────────

    /// Load a model script (replaces the current session)
    pub fn load(&mut self, source: &str) -> Result<(), ViewerError> {
        self.viewer.load_source(GeneratedSource::new(source))
    }

    pub fn teardown(&mut self) {
        self.viewer.teardown();
    }

    // ── Input ─────────────────────────────────────────────────

    pub fn send(&mut self, event: InputEvent) -> bool {
        self.viewer.handle_input(event)
    }

    /// Press, move by `(dx, dy)` pixels and release.
    pub fn drag(&mut self, from: (f32, f32), dx: f32, dy: f32) {
        self.send(InputEvent::PointerDown { x: from.0, y: from.1 });
        self.send(InputEvent::PointerMove {
            x: from.0 + dx,
            y: from.1 + dy,
        });
        self.send(InputEvent::PointerUp);
    }

    pub fn wheel(&mut self, notches: f32) {
        self.send(InputEvent::Wheel { notches });
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.send(InputEvent::Resize { width, height });
    }

    // ── Drawing + inspection ──────────────────────────────────

    pub fn render_frame(&mut self) -> Option<FrameOutcome> {
        self.viewer.tick()
    }

    pub fn camera(&self) -> Option<CameraState> {
        self.viewer.camera().copied()
    }

    pub fn solid_count(&self) -> usize {
        self.viewer.solids().len()
    }

    pub fn entity_count(&self) -> usize {
        self.viewer.session().map_or(0, |s| s.scene().entities.len())
    }

    pub fn listener_count(&self) -> usize {
        self.viewer.listener_count()
    }

    /// Overlay label of the current error, if any
    pub fn overlay_kind(&self) -> Option<&'static str> {
        self.viewer.overlay().map(ViewerError::kind)
    }

    /// Validator for the mesh of the `index`-th solid
    pub fn validate_mesh(&self, index: usize) -> Option<MeshValidator<'_>> {
        let session = self.viewer.session()?;
        session.meshes().get(index).map(|m| MeshValidator::new(&m.mesh))
    }

    pub fn export(&mut self, identifier: &str) -> Result<ExportArtifact, ViewerError> {
        self.viewer.export_stl(identifier)
    }

    pub fn snapshot(&self) -> Result<Snapshot, ViewerError> {
        self.viewer.snapshot()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_new_harness_empty() {
        let h = TestHarness::new();
        assert_eq!(h.solid_count(), 0);
        assert_eq!(h.listener_count(), 0);
        assert!(h.camera().is_none());
    }

    #[test]
    fn test_load_and_render() {
        let mut h = TestHarness::new();
        h.load(fixtures::CUBE_10).unwrap();
        assert_eq!(h.solid_count(), 1);
        assert_eq!(h.entity_count(), 3);
        assert_eq!(h.render_frame(), Some(FrameOutcome::Drawn { frame: 1 }));
        let camera = h.camera().unwrap();
        assert_eq!((camera.projection.width, camera.projection.height), HARNESS_VIEWPORT);
    }

    #[test]
    fn test_validate_mesh() {
        let mut h = TestHarness::new();
        h.load(fixtures::CUBE_10).unwrap();
        let v = h.validate_mesh(0).unwrap();
        assert!(v.validate_all().is_empty());
        assert!(v.is_closed());
        assert!(v.assert_dimensions_approx([10.0, 10.0, 10.0], 1e-3));
        assert!(h.validate_mesh(1).is_none());
    }
}
