//! Scene building: tessellated solids plus helper geometry, and camera framing.

use glam::Vec3;

use crate::build::SolidMesh;
use crate::viewport::bounds::Aabb;
use crate::viewport::camera::{CameraState, Projection, Spherical};
use crate::viewport::mesh::{self, LineMeshData, MeshData};

/// Default view direction for a freshly framed model.
pub const FRAME_AZIMUTH_DEG: f32 = 45.0;
pub const FRAME_INCLINATION_DEG: f32 = 60.0;
/// Orbit radius used when there is nothing to frame.
const EMPTY_SCENE_RADIUS: f32 = 10.0;

/// A renderable item. Derived from the solids, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Grid(LineMeshData),
    Axes(LineMeshData),
    Model { name: String, mesh: MeshData },
}

impl Entity {
    pub fn is_model(&self) -> bool {
        matches!(self, Entity::Model { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub show_grid: bool,
    pub show_axes: bool,
    pub grid_opacity: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_axes: true,
            grid_opacity: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Ordered `[Grid, Axes, Model...]`; hidden helpers are omitted.
    pub entities: Vec<Entity>,
    /// Bounds of the model entities only. `Aabb::EMPTY` without models.
    pub bounds: Aabb,
}

impl Scene {
    pub fn models(&self) -> impl Iterator<Item = (&str, &MeshData)> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Model { name, mesh } => Some((name.as_str(), mesh)),
            _ => None,
        })
    }

    pub fn model_count(&self) -> usize {
        self.models().count()
    }
}

/// Build the entity list for a set of tessellated solids.
///
/// Pure: the same meshes and settings always give the same scene.
pub fn build_scene(solids: &[SolidMesh], settings: &SceneSettings) -> Scene {
    let bounds = solids
        .iter()
        .fold(Aabb::EMPTY, |acc, s| acc.union(&s.bounds));

    let (center, extent) = if bounds.is_valid() {
        let size = bounds.size();
        ([bounds.center().x, bounds.center().y], size.x.max(size.y))
    } else {
        ([0.0, 0.0], EMPTY_SCENE_RADIUS * 2.0)
    };
    let cell = grid_step(extent);

    let mut entities = Vec::with_capacity(solids.len() + 2);
    if settings.show_grid {
        let snapped = center.map(|c| (c / cell).round() * cell);
        let range = ((extent * 0.5 / cell).ceil() as i32 + 2).max(5);
        entities.push(Entity::Grid(mesh::grid(snapped, range, cell, settings.grid_opacity)));
    }
    if settings.show_axes {
        entities.push(Entity::Axes(mesh::axes(cell * 2.0)));
    }
    entities.extend(solids.iter().map(|s| Entity::Model {
        name: s.name.clone(),
        mesh: s.mesh.clone(),
    }));

    Scene { entities, bounds }
}

/// Grid cell size from the 1-2-5 series, about a tenth of `extent`.
fn grid_step(extent: f32) -> f32 {
    let raw = (extent / 10.0).max(1e-3);
    let magnitude = 10f32.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let step = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * magnitude
}

/// Camera looking at the center of `bounds` from the default direction,
/// far enough back that the bounding sphere fits the field of view.
pub fn frame_camera(bounds: &Aabb, width: u32, height: u32) -> CameraState {
    let projection = Projection::new(width, height);
    let (target, radius) = if bounds.is_valid() {
        (bounds.center(), bounds.bounding_radius().max(1e-3))
    } else {
        (Vec3::ZERO, EMPTY_SCENE_RADIUS)
    };

    // Narrower of the vertical and horizontal fields of view
    let half_fov_y = projection.fov_y * 0.5;
    let half_fov_x = (half_fov_y.tan() * projection.aspect).atan();
    let half_fov = half_fov_y.min(half_fov_x);
    let distance = radius / half_fov.sin();

    let mut camera = CameraState::new(target + Vec3::Z * distance, target, projection);
    camera.set_spherical(Spherical {
        radius: distance,
        azimuth: FRAME_AZIMUTH_DEG.to_radians(),
        inclination: FRAME_INCLINATION_DEG.to_radians(),
    });
    camera.fit_depth_range(radius);
    camera
}
