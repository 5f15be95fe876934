//! Per-frame drawing with cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::camera::CameraState;
use super::raster::RenderSurface;
use crate::scene::{Entity, Scene};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    cancelled: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn { frame: u64 },
    Cancelled,
}

pub struct RenderLoop {
    handle: LoopHandle,
    surface: RenderSurface,
    background: [u8; 3],
}

impl RenderLoop {
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        Self {
            handle: LoopHandle::default(),
            surface: RenderSurface::new(width, height),
            background,
        }
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_cancelled()
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn background(&self) -> [u8; 3] {
        self.background
    }

    /// Takes effect from the next frame.
    pub fn set_background(&mut self, background: [u8; 3]) {
        self.background = background;
    }

    /// Draw one frame unless the loop has been cancelled.
    pub fn tick(&mut self, scene: &Scene, camera: &CameraState) -> FrameOutcome {
        if self.handle.is_cancelled() {
            return FrameOutcome::Cancelled;
        }

        let projection = camera.projection;
        self.surface.resize(projection.width, projection.height);
        self.surface.begin_frame(self.background);

        // Lines leave the depth buffer untouched, so models drawn after them cover them
        for entity in &scene.entities {
            match entity {
                Entity::Grid(lines) | Entity::Axes(lines) => self.surface.draw_lines(lines, camera),
                Entity::Model { .. } => {}
            }
        }
        for entity in &scene.entities {
            if let Entity::Model { mesh, .. } = entity {
                self.surface.draw_mesh(mesh, camera);
            }
        }

        self.surface.end_frame();
        FrameOutcome::Drawn {
            frame: self.surface.frame_count(),
        }
    }
}
