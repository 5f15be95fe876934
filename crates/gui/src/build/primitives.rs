//! Lowering of `Shape` trees to kernel parts

use manifold_rs::Manifold;
use vcad::Part;

use super::KernelError;
use crate::model::{Axis, Profile, Shape};

pub const DEFAULT_SEGMENTS: u32 = 32;

/// Build a kernel Part for a construction tree.
pub fn create_part(name: &str, shape: &Shape) -> Result<Part, KernelError> {
    let part = match shape {
        Shape::Cuboid { size, center } => {
            let [x, y, z] = *size;
            check_positive(&[x, y, z], "cuboid size")?;
            // Kernel cubes are corner-aligned at the origin
            Part::cube(name, x, y, z).translate(center[0] - x / 2.0, center[1] - y / 2.0, center[2] - z / 2.0)
        }
        Shape::Sphere { radius, segments } => {
            check_positive(&[*radius], "sphere radius")?;
            Part::sphere(name, *radius, *segments)
        }
        Shape::Cylinder {
            radius,
            height,
            segments,
        } => {
            check_positive(&[*radius, *height], "cylinder dimensions")?;
            vcad::centered_cylinder(name, *radius, *height, *segments)
        }
        Shape::Cone {
            radius_bottom,
            radius_top,
            height,
            segments,
        } => {
            check_positive(&[*height, radius_bottom.max(*radius_top)], "cone dimensions")?;
            Part::cone(name, *radius_bottom, *radius_top, *height, *segments).translate(0.0, 0.0, -height / 2.0)
        }
        Shape::LinearExtrude {
            profile,
            height,
            twist,
            scale_top,
        } => linear_extrude(name, profile, *height, *twist, *scale_top)?,
        Shape::RotateExtrude {
            profile,
            angle,
            segments,
        } => rotate_extrude(name, profile, *angle, *segments)?,
        Shape::Translate { offset, child } => {
            create_part(name, child)?.translate(offset[0], offset[1], offset[2])
        }
        Shape::Rotate { angles, child } => create_part(name, child)?.rotate(angles[0], angles[1], angles[2]),
        Shape::Scale { factors, child } => {
            if factors.iter().any(|f| *f == 0.0 || !f.is_finite()) {
                return Err(KernelError::InvalidShape(format!("degenerate scale {:?}", factors)));
            }
            create_part(name, child)?.scale(factors[0], factors[1], factors[2])
        }
        Shape::Mirror { axis, child } => {
            let part = create_part(name, child)?;
            match axis {
                Axis::X => part.scale(-1.0, 1.0, 1.0),
                Axis::Y => part.scale(1.0, -1.0, 1.0),
                Axis::Z => part.scale(1.0, 1.0, -1.0),
            }
        }
        Shape::Union(children) => fold_boolean(name, children, "union", |a, b| a.union(&b))?,
        Shape::Difference(children) => fold_boolean(name, children, "subtract", |a, b| a.difference(&b))?,
        Shape::Intersection(children) => fold_boolean(name, children, "intersect", |a, b| a.intersection(&b))?,
    };
    Ok(part)
}

fn fold_boolean(
    name: &str,
    children: &[Shape],
    op: &str,
    combine: impl Fn(Part, Part) -> Part,
) -> Result<Part, KernelError> {
    let (first, rest) = children
        .split_first()
        .ok_or_else(|| KernelError::InvalidShape(format!("{} of nothing", op)))?;
    let mut acc = create_part(name, first)?;
    for child in rest {
        acc = combine(acc, create_part(name, child)?);
    }
    Ok(acc)
}

fn check_positive(values: &[f64], what: &str) -> Result<(), KernelError> {
    if values.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(KernelError::InvalidShape(format!("{} must be positive, got {:?}", what, values)))
    }
}

/// Extrude along +Z from z = 0 to `height`.
fn linear_extrude(name: &str, profile: &Profile, height: f64, twist: f64, scale_top: f64) -> Result<Part, KernelError> {
    check_positive(&[height], "extrusion height")?;
    let scale_top = scale_top.clamp(0.0, 10.0);
    // One division per 5 degrees of twist keeps twisted walls smooth
    let divisions = ((twist.abs() / 5.0).ceil() as u32).max(1);

    let polygon = profile.flat();
    let manifold = Manifold::extrude(&[polygon.as_slice()], height, divisions, twist, scale_top, scale_top);
    if manifold.is_empty() {
        tracing::warn!("Manifold::extrude returned empty geometry for '{}'", name);
        return Err(KernelError::EmptyGeometry(name.to_string()));
    }
    Ok(Part::new(name, manifold))
}

/// Revolve around the Z axis; profile X is the radius, profile Y becomes Z.
fn rotate_extrude(name: &str, profile: &Profile, angle: f64, segments: u32) -> Result<Part, KernelError> {
    if profile.points.iter().any(|p| p[0] < 0.0) {
        return Err(KernelError::InvalidShape(
            "revolve profile must lie at x >= 0".to_string(),
        ));
    }
    let angle = angle.clamp(0.0, 360.0);
    check_positive(&[angle], "revolve angle")?;

    let polygon = profile.flat();
    let manifold = Manifold::revolve(&[polygon.as_slice()], segments.max(3), angle);
    if manifold.is_empty() {
        tracing::warn!("Manifold::revolve returned empty geometry for '{}'", name);
        return Err(KernelError::EmptyGeometry(name.to_string()));
    }
    Ok(Part::new(name, manifold))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_size_rejected() {
        let shape = Shape::Cuboid {
            size: [1.0, -1.0, 1.0],
            center: [0.0; 3],
        };
        assert!(matches!(create_part("bad", &shape), Err(KernelError::InvalidShape(_))));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let shape = Shape::Sphere { radius: 1.0, segments: 8 }.scaled([1.0, 0.0, 1.0]);
        assert!(matches!(create_part("flat", &shape), Err(KernelError::InvalidShape(_))));
    }

    #[test]
    fn test_revolve_profile_left_of_axis_rejected() {
        let profile = Profile::rectangle(2.0, 2.0).unwrap();
        let shape = Shape::RotateExtrude {
            profile,
            angle: 360.0,
            segments: 16,
        };
        assert!(matches!(create_part("r", &shape), Err(KernelError::InvalidShape(_))));
    }
}
