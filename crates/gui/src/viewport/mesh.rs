use glam::Vec3;

/// Floats per mesh vertex: position(3) + normal(3) + color(3)
pub const MESH_STRIDE: usize = 9;
/// Floats per line vertex: position(3) + color(4)
pub const LINE_STRIDE: usize = 7;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z, r, g, b]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / MESH_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, index: u32) -> Vec3 {
        let base = index as usize * MESH_STRIDE;
        Vec3::new(self.vertices[base], self.vertices[base + 1], self.vertices[base + 2])
    }

    pub fn normal(&self, index: u32) -> Vec3 {
        let base = index as usize * MESH_STRIDE + 3;
        Vec3::new(self.vertices[base], self.vertices[base + 1], self.vertices[base + 2])
    }

    pub fn color(&self, index: u32) -> [f32; 3] {
        let base = index as usize * MESH_STRIDE + 6;
        [self.vertices[base], self.vertices[base + 1], self.vertices[base + 2]]
    }

    /// Triangle corner positions in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [self.position(t[0]), self.position(t[1]), self.position(t[2])])
    }

    /// Enclosed volume via the divergence theorem. Meaningful for closed meshes only.
    pub fn volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| a.as_dvec3().dot(b.as_dvec3().cross(c.as_dvec3())) / 6.0)
            .sum::<f64>()
            .abs()
    }

    /// Recolor every vertex.
    pub fn set_color(&mut self, color: [f32; 3]) {
        for chunk in self.vertices.chunks_exact_mut(MESH_STRIDE) {
            chunk[6..9].copy_from_slice(&color);
        }
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

/// Lines mesh: interleaved [pos.x, pos.y, pos.z, r, g, b, a], two vertices per segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMeshData {
    pub vertices: Vec<f32>,
}

impl LineMeshData {
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / (LINE_STRIDE * 2)
    }

    /// Segment endpoints and the color of the first endpoint.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, [f32; 4])> + '_ {
        self.vertices.chunks_exact(LINE_STRIDE * 2).map(|s| {
            (
                Vec3::new(s[0], s[1], s[2]),
                Vec3::new(s[7], s[8], s[9]),
                [s[3], s[4], s[5], s[6]],
            )
        })
    }
}

// ── Grid and axes ────────────────────────────────────────────

/// Ground grid on the XY plane (Z up), centered on `center`.
pub fn grid(center: [f32; 2], range: i32, cell_size: f32, opacity: f32) -> LineMeshData {
    let mut vertices = Vec::new();
    let grid_color = [0.25_f32, 0.25, 0.25, opacity];
    let major_color = [0.35_f32, 0.35, 0.35, opacity];

    let extent = range as f32 * cell_size;
    let [cx, cy] = center;

    for i in -range..=range {
        let f = i as f32 * cell_size;
        let color = if i % 5 == 0 { major_color } else { grid_color };
        // Line along Y
        push_line_vert(&mut vertices, cx + f, cy - extent, 0.0, color);
        push_line_vert(&mut vertices, cx + f, cy + extent, 0.0, color);
        // Line along X
        push_line_vert(&mut vertices, cx - extent, cy + f, 0.0, color);
        push_line_vert(&mut vertices, cx + extent, cy + f, 0.0, color);
    }

    LineMeshData { vertices }
}

pub fn axes(length: f32) -> LineMeshData {
    let mut vertices = Vec::new();
    let r = [0.9_f32, 0.2, 0.2, 1.0];
    let g = [0.2_f32, 0.8, 0.2, 1.0];
    let b = [0.2_f32, 0.3, 0.9, 1.0];

    // X axis
    push_line_vert(&mut vertices, 0.0, 0.0, 0.0, r);
    push_line_vert(&mut vertices, length, 0.0, 0.0, r);
    // Y axis
    push_line_vert(&mut vertices, 0.0, 0.0, 0.0, g);
    push_line_vert(&mut vertices, 0.0, length, 0.0, g);
    // Z axis
    push_line_vert(&mut vertices, 0.0, 0.0, 0.0, b);
    push_line_vert(&mut vertices, 0.0, 0.0, length, b);

    LineMeshData { vertices }
}

// ── Helpers ──────────────────────────────────────────────────

pub(crate) fn push_vert(v: &mut Vec<f32>, p: Vec3, n: Vec3, c: [f32; 3]) {
    v.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, c[0], c[1], c[2]]);
}

fn push_line_vert(v: &mut Vec<f32>, px: f32, py: f32, pz: f32, c: [f32; 4]) {
    v.extend_from_slice(&[px, py, pz, c[0], c[1], c[2], c[3]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit right tetrahedron, outward winding
    fn tetrahedron() -> MeshData {
        let mut vertices = Vec::new();
        let color = [0.5, 0.5, 0.5];
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z] {
            push_vert(&mut vertices, p, Vec3::Z, color);
        }
        MeshData {
            vertices,
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        }
    }

    #[test]
    fn test_volume_of_tetrahedron() {
        assert!((tetrahedron().volume() - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_append_offsets_indices() {
        let mut a = tetrahedron();
        a.append(&tetrahedron());
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.triangle_count(), 8);
        assert_eq!(a.indices[12], 4);
        assert!((a.volume() - 2.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_color() {
        let mut m = tetrahedron();
        m.set_color([1.0, 0.0, 0.0]);
        assert_eq!(m.color(3), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_grid_lies_on_ground_plane() {
        let g = grid([5.0, 5.0], 4, 2.0, 0.5);
        assert_eq!(g.segment_count(), 18);
        assert!(g.segments().all(|(a, b, _)| a.z == 0.0 && b.z == 0.0));
        let max_x = g.segments().map(|(a, b, _)| a.x.max(b.x)).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 13.0);
    }

    #[test]
    fn test_axes_three_segments() {
        let a = axes(10.0);
        let segs: Vec<_> = a.segments().collect();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[2].1, Vec3::new(0.0, 0.0, 10.0));
    }
}
