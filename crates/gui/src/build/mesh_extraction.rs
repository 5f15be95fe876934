//! Mesh extraction from kernel parts

use vcad::Part;

use crate::viewport::mesh::{push_vert, MeshData, MESH_STRIDE};

/// Extract flat-shaded MeshData from a vcad Part. `None` when the part is empty.
pub fn extract_mesh_data(part: &Part, color: [f32; 3]) -> Option<MeshData> {
    let mesh = part.to_mesh();
    let positions = mesh.vertices();
    let indices = mesh.indices();

    tracing::debug!(
        "extract_mesh_data: {} vertices, {} tris",
        positions.len() / 3,
        indices.len() / 3
    );

    if positions.is_empty() || indices.is_empty() {
        return None;
    }

    let corner = |i: u32| {
        let i = i as usize * 3;
        glam::Vec3::new(positions[i], positions[i + 1], positions[i + 2])
    };

    let tri_count = indices.len() / 3;
    let mut vertices = Vec::with_capacity(tri_count * 3 * MESH_STRIDE);
    let mut new_indices = Vec::with_capacity(tri_count * 3);

    for tri in indices.chunks_exact(3) {
        let (p0, p1, p2) = (corner(tri[0]), corner(tri[1]), corner(tri[2]));
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();

        let base = (vertices.len() / MESH_STRIDE) as u32;
        for p in [p0, p1, p2] {
            push_vert(&mut vertices, p, normal, color);
        }
        new_indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    Some(MeshData {
        vertices,
        indices: new_indices,
    })
}
