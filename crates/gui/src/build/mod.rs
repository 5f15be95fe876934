//! Tessellation of evaluated solids through the CAD kernel.
//!
//! `Shape` trees are lowered to `vcad::Part` values (`primitives`), booleans are
//! resolved by the kernel, and the result is flattened into viewer meshes
//! (`mesh_extraction`).

mod mesh_extraction;
mod primitives;

pub use mesh_extraction::extract_mesh_data;
pub use primitives::{create_part, DEFAULT_SEGMENTS};

use crate::model::{Shape, Solid};
use crate::viewport::bounds::Aabb;
use crate::viewport::mesh::MeshData;

pub const DEFAULT_MODEL_COLOR: [f32; 3] = [0.6, 0.6, 0.65];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("solid '{0}' produced no geometry")]
    EmptyGeometry(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
}

/// Tessellated solid ready for scene building and export.
#[derive(Debug, Clone)]
pub struct SolidMesh {
    pub name: String,
    pub mesh: MeshData,
    pub bounds: Aabb,
}

/// Tessellate a bare shape (used by script-side measurements).
pub fn tessellate_shape(name: &str, shape: &Shape, color: [f32; 3]) -> Result<MeshData, KernelError> {
    let part = create_part(name, shape)?;
    extract_mesh_data(&part, color).ok_or_else(|| KernelError::EmptyGeometry(name.to_string()))
}

pub fn tessellate(solid: &Solid, color: [f32; 3]) -> Result<SolidMesh, KernelError> {
    let mesh = tessellate_shape(&solid.name, &solid.shape, color)?;
    let bounds = Aabb::from_mesh(&mesh);
    Ok(SolidMesh {
        name: solid.name.clone(),
        mesh,
        bounds,
    })
}

/// Tessellate every solid; the first failure aborts.
pub fn tessellate_all(solids: &[Solid], color: [f32; 3]) -> Result<Vec<SolidMesh>, KernelError> {
    solids.iter().map(|s| tessellate(s, color)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(size: f64) -> Shape {
        Shape::Cuboid {
            size: [size; 3],
            center: [size / 2.0; 3],
        }
    }

    #[test]
    fn test_corner_cube_bounds() {
        let mesh = tessellate(&Solid::new("c", cube(10.0)), DEFAULT_MODEL_COLOR).unwrap();
        assert!((mesh.bounds.min.x - 0.0).abs() < 1e-4);
        assert!((mesh.bounds.max.z - 10.0).abs() < 1e-4);
        assert!((mesh.mesh.volume() - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn test_cylinder_is_centered() {
        let shape = Shape::Cylinder {
            radius: 2.0,
            height: 8.0,
            segments: 32,
        };
        let mesh = tessellate(&Solid::new("cyl", shape), DEFAULT_MODEL_COLOR).unwrap();
        assert!((mesh.bounds.min.z + 4.0).abs() < 1e-4);
        assert!((mesh.bounds.max.z - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_difference_removes_volume() {
        let shape = Shape::Difference(vec![
            cube(10.0),
            Shape::Cuboid {
                size: [4.0, 4.0, 20.0],
                center: [5.0, 5.0, 5.0],
            },
        ]);
        let mesh = tessellate(&Solid::new("d", shape), DEFAULT_MODEL_COLOR).unwrap();
        assert!((mesh.mesh.volume() - (1000.0 - 160.0)).abs() < 1e-1);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let shape = Shape::Intersection(vec![cube(1.0), cube(1.0).translated([5.0, 0.0, 0.0])]);
        let result = tessellate(&Solid::new("empty", shape), DEFAULT_MODEL_COLOR);
        assert_eq!(result.unwrap_err(), KernelError::EmptyGeometry("empty".to_string()));
    }

    #[test]
    fn test_empty_boolean_rejected() {
        let result = tessellate(&Solid::new("u", Shape::Union(vec![])), DEFAULT_MODEL_COLOR);
        assert!(matches!(result, Err(KernelError::InvalidShape(_))));
    }
}
