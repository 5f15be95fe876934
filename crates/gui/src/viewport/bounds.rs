use glam::Vec3;

use super::mesh::{MeshData, MESH_STRIDE};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Compute AABB from MeshData (9 floats per vertex: pos+normal+color)
    pub fn from_mesh(data: &MeshData) -> Self {
        let mut aabb = Self::EMPTY;
        for chunk in data.vertices.chunks_exact(MESH_STRIDE) {
            aabb.include(Vec3::new(chunk[0], chunk[1], chunk[2]));
        }
        aabb
    }

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// False for the empty box (no points included).
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the sphere through the box corners.
    pub fn bounding_radius(&self) -> f32 {
        self.size().length() * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_invalid() {
        assert!(!Aabb::EMPTY.is_valid());
        assert!(!Aabb::from_mesh(&MeshData::default()).is_valid());
    }

    #[test]
    fn test_union_and_center() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        let b = Aabb::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(u.center(), Vec3::new(4.0, 5.0, 5.0));
        assert!((a.bounding_radius() - 75.0_f32.sqrt() ).abs() < 1e-4);
    }
}
