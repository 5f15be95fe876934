//! Mesh validation utilities.
//!
//! `MeshValidator` checks tessellated output before it is shown or exported:
//! buffer strides, in-range indices, finite positions, unit normals, and
//! whether the surface is closed.

use std::collections::HashMap;

use crate::viewport::bounds::Aabb;
use crate::viewport::mesh::{MeshData, MESH_STRIDE};

/// Positions closer than this are treated as the same vertex when
/// checking closedness (flat-shaded meshes duplicate corners per face).
const WELD_SCALE: f32 = 1e4;

/// Validator for `MeshData` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a MeshData,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a MeshData) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Vertex buffer length is a multiple of the stride.
    pub fn is_stride_valid(&self) -> bool {
        self.mesh.vertices.len() % MESH_STRIDE == 0
    }

    pub fn is_index_stride_valid(&self) -> bool {
        self.mesh.indices.len() % 3 == 0
    }

    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.indices.iter().all(|&i| i < max_idx)
    }

    pub fn are_positions_finite(&self) -> bool {
        (0..self.vertex_count() as u32).all(|i| self.mesh.position(i).is_finite())
    }

    /// Check that all vertex normals have unit length (within epsilon).
    pub fn are_normals_normalized(&self, epsilon: f32) -> bool {
        (0..self.vertex_count() as u32).all(|i| (self.mesh.normal(i).length() - 1.0).abs() <= epsilon)
    }

    /// Every edge is shared by exactly two triangles.
    pub fn is_closed(&self) -> bool {
        if self.mesh.is_empty() {
            return false;
        }
        let key = |i: u32| {
            let p = self.mesh.position(i) * WELD_SCALE;
            [p.x.round() as i64, p.y.round() as i64, p.z.round() as i64]
        };
        let mut edges: HashMap<([i64; 3], [i64; 3]), u32> = HashMap::new();
        for tri in self.mesh.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let (ka, kb) = (key(a), key(b));
                let edge = if ka <= kb { (ka, kb) } else { (kb, ka) };
                *edges.entry(edge).or_default() += 1;
            }
        }
        edges.values().all(|&n| n == 2)
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_mesh(self.mesh)
    }

    /// Bounding box extents along X, Y, Z.
    pub fn dimensions(&self) -> [f32; 3] {
        self.aabb().size().to_array()
    }

    /// Check that the AABB dimensions are approximately equal to `expected`.
    pub fn assert_dimensions_approx(&self, expected: [f32; 3], tolerance: f32) -> bool {
        let dims = self.dimensions();
        dims.iter().zip(expected).all(|(d, e)| (d - e).abs() < tolerance)
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the mesh is valid.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.is_stride_valid() {
            errors.push(format!(
                "Vertex buffer length {} is not a multiple of {}",
                self.mesh.vertices.len(),
                MESH_STRIDE
            ));
            return errors;
        }

        if !self.is_index_stride_valid() {
            errors.push(format!(
                "Index buffer length {} is not a multiple of 3",
                self.mesh.indices.len()
            ));
        }

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self
                .mesh
                .indices
                .iter()
                .filter(|&&i| i >= max_idx)
                .take(5)
                .collect();
            errors.push(format!(
                "Indices out of range (vertex_count={}): {:?}",
                max_idx, out_of_range
            ));
            return errors;
        }

        if !self.are_positions_finite() {
            errors.push("Some positions are NaN or infinite".to_string());
        }

        if self.vertex_count() > 0 && !self.are_normals_normalized(0.1) {
            errors.push("Some normals are not unit-length (epsilon=0.1)".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_triangle() -> MeshData {
        MeshData {
            vertices: vec![
                // pos(0,0,0) normal(0,0,1) color(0.5,0.5,0.5)
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5,
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5,
                0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5,
            ],
            indices: vec![0, 1, 2],
        }
    }

    /// Tetrahedron with one vertex per face corner, like kernel output
    fn flat_tetrahedron() -> MeshData {
        let corners = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let faces = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
        let mut mesh = MeshData::default();
        for face in faces {
            for c in face {
                let p: [f32; 3] = corners[c];
                mesh.vertices.extend_from_slice(&[p[0], p[1], p[2], 0.0, 0.0, 1.0, 0.5, 0.5, 0.5]);
            }
            let base = mesh.indices.len() as u32;
            mesh.indices.extend([base, base + 1, base + 2]);
        }
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = simple_triangle();
        let v = MeshValidator::new(&mesh);
        assert_eq!(v.vertex_count(), 3);
        assert_eq!(v.triangle_count(), 1);
    }

    #[test]
    fn test_stride_invalid() {
        let bad = MeshData {
            vertices: vec![0.0; 10],
            indices: vec![],
        };
        let v = MeshValidator::new(&bad);
        assert!(!v.is_stride_valid());
        assert_eq!(v.validate_all().len(), 1);
    }

    #[test]
    fn test_indices_out_of_range() {
        let mut mesh = simple_triangle();
        mesh.indices = vec![0, 1, 5];
        let v = MeshValidator::new(&mesh);
        assert!(!v.are_indices_in_range());
        assert!(v.validate_all()[0].contains("out of range"));
    }

    #[test]
    fn test_non_finite_position() {
        let mut mesh = simple_triangle();
        mesh.vertices[0] = f32::INFINITY;
        assert!(!MeshValidator::new(&mesh).are_positions_finite());
    }

    #[test]
    fn test_dimensions() {
        let mesh = simple_triangle();
        let v = MeshValidator::new(&mesh);
        assert!(v.assert_dimensions_approx([1.0, 1.0, 0.0], 1e-6));
        assert!(v.validate_all().is_empty());
    }

    #[test]
    fn test_closedness() {
        assert!(!MeshValidator::new(&simple_triangle()).is_closed());
        assert!(MeshValidator::new(&flat_tetrahedron()).is_closed());
        assert!(!MeshValidator::new(&MeshData::default()).is_closed());
    }
}
