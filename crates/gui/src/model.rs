//! Procedural model data: source text and the solid construction tree.

use std::fmt;

/// Model source text as returned by the generation service.
///
/// Immutable once received; a new value replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource(String);

impl GeneratedSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GeneratedSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for GeneratedSource {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for GeneratedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Closed 2D polygon in the XY plane, counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub points: Vec<[f64; 2]>,
}

impl Profile {
    /// Build a profile, normalizing the winding to counter-clockwise.
    ///
    /// Returns `None` for fewer than three points or zero area.
    pub fn new(mut points: Vec<[f64; 2]>) -> Option<Self> {
        const MERGE: f64 = 1e-9;
        let near = |a: &[f64; 2], b: &[f64; 2]| (a[0] - b[0]).abs() < MERGE && (a[1] - b[1]).abs() < MERGE;

        points.dedup_by(|b, a| near(a, b));
        while points.len() > 1 && near(&points[0], &points[points.len() - 1]) {
            points.pop();
        }
        if points.len() < 3 {
            return None;
        }
        let area = signed_area(&points);
        if area.abs() < 1e-12 {
            return None;
        }
        if area < 0.0 {
            points.reverse();
        }
        Some(Self { points })
    }

    pub fn rectangle(width: f64, height: f64) -> Option<Self> {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(vec![[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]])
    }

    /// Circle approximated by flattening a `kurbo` circle path.
    pub fn circle(radius: f64, segments: u32) -> Option<Self> {
        use kurbo::Shape as _;

        if radius <= 0.0 {
            return None;
        }
        let segments = segments.max(3);
        // Sagitta of one segment: chord error at the requested resolution
        let tolerance = radius * (1.0 - (std::f64::consts::PI / segments as f64).cos());
        let circle = kurbo::Circle::new((0.0, 0.0), radius);
        let mut points = Vec::with_capacity(segments as usize);
        kurbo::flatten(circle.path_elements(tolerance * 0.25), tolerance.max(1e-6), |el| {
            match el {
                kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => points.push([p.x, p.y]),
                _ => {}
            }
        });
        Self::new(points)
    }

    /// Shift every point by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            points: self.points.iter().map(|p| [p[0] + dx, p[1] + dy]).collect(),
        }
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.points).abs()
    }

    /// Flat `[x0, y0, x1, y1, ...]` layout expected by the extrusion kernel.
    pub fn flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p[0], p[1]]).collect()
    }
}

fn signed_area(points: &[[f64; 2]]) -> f64 {
    let mut path = kurbo::BezPath::new();
    path.move_to((points[0][0], points[0][1]));
    for p in &points[1..] {
        path.line_to((p[0], p[1]));
    }
    path.close_path();
    kurbo::Shape::area(&path)
}

/// Construction tree of a solid. Primitives use millimeters, angles are degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Cuboid {
        size: [f64; 3],
        center: [f64; 3],
    },
    Sphere {
        radius: f64,
        segments: u32,
    },
    /// Centered at the origin, axis along Z
    Cylinder {
        radius: f64,
        height: f64,
        segments: u32,
    },
    /// Centered at the origin, axis along Z
    Cone {
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
        segments: u32,
    },
    LinearExtrude {
        profile: Profile,
        height: f64,
        twist: f64,
        scale_top: f64,
    },
    /// Profile X is the distance from the Z axis
    RotateExtrude {
        profile: Profile,
        angle: f64,
        segments: u32,
    },
    Translate {
        offset: [f64; 3],
        child: Box<Shape>,
    },
    Rotate {
        angles: [f64; 3],
        child: Box<Shape>,
    },
    Scale {
        factors: [f64; 3],
        child: Box<Shape>,
    },
    Mirror {
        axis: Axis,
        child: Box<Shape>,
    },
    Union(Vec<Shape>),
    Difference(Vec<Shape>),
    Intersection(Vec<Shape>),
}

impl Shape {
    pub fn translated(self, offset: [f64; 3]) -> Shape {
        Shape::Translate {
            offset,
            child: Box::new(self),
        }
    }

    pub fn rotated(self, angles: [f64; 3]) -> Shape {
        Shape::Rotate {
            angles,
            child: Box::new(self),
        }
    }

    pub fn scaled(self, factors: [f64; 3]) -> Shape {
        Shape::Scale {
            factors,
            child: Box::new(self),
        }
    }

    pub fn mirrored(self, axis: Axis) -> Shape {
        Shape::Mirror {
            axis,
            child: Box::new(self),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Shape::Translate { child, .. }
            | Shape::Rotate { child, .. }
            | Shape::Scale { child, .. }
            | Shape::Mirror { child, .. } => 1 + child.node_count(),
            Shape::Union(children) | Shape::Difference(children) | Shape::Intersection(children) => {
                1 + children.iter().map(Shape::node_count).sum::<usize>()
            }
            _ => 1,
        }
    }
}

/// A solid produced by evaluating a model source.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub name: String,
    pub shape: Shape,
}

impl Solid {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_winding_normalized() {
        let cw = Profile::new(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]).unwrap();
        assert!(signed_area(&cw.points) > 0.0);
        assert!((cw.area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_profile_rejects_degenerate() {
        assert!(Profile::new(vec![[0.0, 0.0], [1.0, 1.0]]).is_none());
        assert!(Profile::new(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_none());
        assert!(Profile::rectangle(0.0, 5.0).is_none());
    }

    #[test]
    fn test_profile_closing_point_dropped() {
        let p = Profile::new(vec![[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]).unwrap();
        assert_eq!(p.points.len(), 3);
    }

    #[test]
    fn test_circle_profile_area() {
        let c = Profile::circle(10.0, 64).unwrap();
        assert!(c.points.len() >= 16);
        let exact = std::f64::consts::PI * 100.0;
        assert!((c.area() - exact).abs() / exact < 0.02);
    }

    #[test]
    fn test_node_count() {
        let shape = Shape::Union(vec![
            Shape::Sphere { radius: 1.0, segments: 16 },
            Shape::Sphere { radius: 1.0, segments: 16 }.translated([1.0, 0.0, 0.0]),
        ]);
        assert_eq!(shape.node_count(), 4);
    }

    #[test]
    fn test_axis_parse() {
        assert_eq!(Axis::parse("X"), Some(Axis::X));
        assert_eq!(Axis::parse(" z "), Some(Axis::Z));
        assert_eq!(Axis::parse("w"), None);
    }
}
