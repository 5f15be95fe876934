//! Orbit/zoom navigation driven by input commands.
//!
//! Every pointer, wheel and resize event goes through
//! [`NavigationController::apply`]; nothing else mutates the camera.

use std::f32::consts::PI;

use super::camera::CameraState;

/// Minimum distance from the pole, keeps the view matrix well defined.
pub const INCLINATION_EPSILON: f32 = 0.01;
/// Default orbit sensitivity (radians per pixel).
pub const DEFAULT_ORBIT_SPEED: f32 = 0.01;
/// Radius factor per wheel notch towards the target.
pub const ZOOM_IN: f32 = 0.9;
/// Radius factor per wheel notch away from the target.
pub const ZOOM_OUT: f32 = 1.0 / ZOOM_IN;
/// Keeps `position != target` however far the user zooms in.
pub const MIN_RADIUS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    PointerLeave,
    /// Positive notches zoom out, negative zoom in.
    Wheel { notches: f32 },
    Resize { width: u32, height: u32 },
}

impl InputEvent {
    /// Listener channel the event is delivered on.
    pub fn kind(&self) -> InputKind {
        match self {
            InputEvent::PointerDown { .. }
            | InputEvent::PointerMove { .. }
            | InputEvent::PointerUp
            | InputEvent::PointerLeave => InputKind::Pointer,
            InputEvent::Wheel { .. } => InputKind::Wheel,
            InputEvent::Resize { .. } => InputKind::Resize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputKind {
    Pointer,
    Wheel,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { anchor: (f32, f32) },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationController {
    state: DragState,
    orbit_speed: f32,
    invert_wheel: bool,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(DEFAULT_ORBIT_SPEED)
    }
}

impl NavigationController {
    pub fn new(orbit_speed: f32) -> Self {
        Self {
            state: DragState::Idle,
            orbit_speed,
            invert_wheel: false,
        }
    }

    pub fn with_inverted_wheel(mut self, invert: bool) -> Self {
        self.invert_wheel = invert;
        self
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn orbit_speed(&self) -> f32 {
        self.orbit_speed
    }

    pub fn set_orbit_speed(&mut self, orbit_speed: f32) {
        self.orbit_speed = orbit_speed;
    }

    pub fn inverts_wheel(&self) -> bool {
        self.invert_wheel
    }

    pub fn set_inverted_wheel(&mut self, invert: bool) {
        self.invert_wheel = invert;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Apply one input event to the camera.
    pub fn apply(&mut self, camera: &mut CameraState, event: InputEvent) {
        match (self.state, event) {
            (_, InputEvent::PointerDown { x, y }) => {
                self.state = DragState::Dragging { anchor: (x, y) };
            }
            (DragState::Dragging { anchor }, InputEvent::PointerMove { x, y }) => {
                orbit(camera, (x - anchor.0) * self.orbit_speed, (y - anchor.1) * self.orbit_speed);
                self.state = DragState::Dragging { anchor: (x, y) };
            }
            (DragState::Idle, InputEvent::PointerMove { .. }) => {}
            (_, InputEvent::PointerUp | InputEvent::PointerLeave) => {
                self.state = DragState::Idle;
            }
            (_, InputEvent::Wheel { notches }) => {
                let notches = if self.invert_wheel { -notches } else { notches };
                zoom(camera, notches);
            }
            (_, InputEvent::Resize { width, height }) => {
                camera.projection.resize(width, height);
            }
        }
    }
}

/// Rotate the camera around its target. Angles are in radians.
pub fn orbit(camera: &mut CameraState, d_azimuth: f32, d_inclination: f32) {
    let mut s = camera.spherical();
    s.azimuth += d_azimuth;
    s.inclination = (s.inclination + d_inclination).clamp(INCLINATION_EPSILON, PI - INCLINATION_EPSILON);
    camera.set_spherical(s);
}

/// Scale the orbit radius by `ZOOM_OUT^notches` (or `ZOOM_IN^-notches`).
pub fn zoom(camera: &mut CameraState, notches: f32) {
    if notches == 0.0 || !notches.is_finite() {
        return;
    }
    let factor = if notches > 0.0 {
        ZOOM_OUT.powf(notches)
    } else {
        ZOOM_IN.powf(-notches)
    };
    let mut s = camera.spherical();
    s.radius = (s.radius * factor).max(MIN_RADIUS);
    camera.set_spherical(s);
}
