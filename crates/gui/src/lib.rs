// Library crate: the live model viewer and everything the desktop client
// needs to drive it, exposed for integration tests and headless use.
// Window-specific modules (app, ui panels) remain in the binary crate.

pub mod build;
pub mod evaluator;
pub mod export;
pub mod fixtures;
pub mod harness;
pub mod i18n;
pub mod model;
pub mod scene;
pub mod session;
pub mod state;
pub mod validation;

/// Camera, navigation and software rendering.
pub mod viewport {
    pub mod bounds;
    pub mod camera;
    pub mod mesh;
    pub mod navigation;
    pub mod raster;
    pub mod render_loop;
}
