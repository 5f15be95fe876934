//! Capability namespace exposed to model scripts.
//!
//! Everything a script can touch is registered here; the engine has no
//! file, network or module access.

use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, FLOAT, INT};

use crate::build::{self, DEFAULT_SEGMENTS};
use crate::model::{Axis, Profile, Shape};
use crate::viewport::bounds::Aabb;

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

const MAX_SEGMENTS: u32 = 512;

pub fn register(engine: &mut Engine) {
    engine.register_type_with_name::<Shape>("Solid");
    engine.register_type_with_name::<Profile>("Profile");

    register_primitives(engine);
    register_profiles(engine);
    register_transforms(engine);
    register_booleans(engine);
    register_extrusions(engine);
    register_measurements(engine);
}

// ── Argument conversion ──────────────────────────────────────

fn number(value: &Dynamic, what: &str) -> ScriptResult<f64> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f64);
    }
    Err(format!("{} must be a number, got {}", what, value.type_name()).into())
}

fn finite(value: &Dynamic, what: &str) -> ScriptResult<f64> {
    let v = number(value, what)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("{} must be finite", what).into())
    }
}

fn vector<const N: usize>(values: &Array, what: &str) -> ScriptResult<[f64; N]> {
    if values.len() != N {
        return Err(format!("{} needs {} numbers, got {}", what, N, values.len()).into());
    }
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = finite(value, what)?;
    }
    Ok(out)
}

/// A number `k` becomes `[k, k, k]`; an array must have three numbers.
fn vec3_or_scalar(value: &Dynamic, what: &str) -> ScriptResult<[f64; 3]> {
    if value.is_array() {
        let arr = value.clone().into_array().map_err(|t| format!("{}: {}", what, t))?;
        vector::<3>(&arr, what)
    } else {
        Ok([finite(value, what)?; 3])
    }
}

fn segments(value: &Dynamic) -> ScriptResult<u32> {
    let v = number(value, "segments")?;
    if !(3.0..=MAX_SEGMENTS as f64).contains(&v) {
        return Err(format!("segments must be between 3 and {}", MAX_SEGMENTS).into());
    }
    Ok(v as u32)
}

fn solids(values: Array, op: &str) -> ScriptResult<Vec<Shape>> {
    values
        .into_iter()
        .map(|v| {
            let type_name = v.type_name();
            v.try_cast::<Shape>()
                .ok_or_else(|| format!("{} expects solids, got {}", op, type_name).into())
        })
        .collect()
}

fn axis(name: &str) -> ScriptResult<Axis> {
    Axis::parse(name).ok_or_else(|| format!("unknown axis '{}', expected x, y or z", name).into())
}

// ── Primitives ───────────────────────────────────────────────

fn cube(size: &Dynamic) -> ScriptResult<Shape> {
    let size = vec3_or_scalar(size, "cube size")?;
    Ok(Shape::Cuboid {
        size,
        center: [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0],
    })
}

fn register_primitives(engine: &mut Engine) {
    engine.register_fn("cube", |size: Dynamic| cube(&size));
    engine.register_fn("cuboid", |size: Array| -> ScriptResult<Shape> {
        Ok(Shape::Cuboid {
            size: vector::<3>(&size, "cuboid size")?,
            center: [0.0; 3],
        })
    });
    engine.register_fn("cuboid", |size: Array, center: Array| -> ScriptResult<Shape> {
        Ok(Shape::Cuboid {
            size: vector::<3>(&size, "cuboid size")?,
            center: vector::<3>(&center, "cuboid center")?,
        })
    });
    engine.register_fn("sphere", |r: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::Sphere {
            radius: finite(&r, "sphere radius")?,
            segments: DEFAULT_SEGMENTS,
        })
    });
    engine.register_fn("sphere", |r: Dynamic, n: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::Sphere {
            radius: finite(&r, "sphere radius")?,
            segments: segments(&n)?,
        })
    });
    engine.register_fn("cylinder", |r: Dynamic, h: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::Cylinder {
            radius: finite(&r, "cylinder radius")?,
            height: finite(&h, "cylinder height")?,
            segments: DEFAULT_SEGMENTS,
        })
    });
    engine.register_fn("cylinder", |r: Dynamic, h: Dynamic, n: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::Cylinder {
            radius: finite(&r, "cylinder radius")?,
            height: finite(&h, "cylinder height")?,
            segments: segments(&n)?,
        })
    });
    engine.register_fn("cone", |r1: Dynamic, r2: Dynamic, h: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::Cone {
            radius_bottom: finite(&r1, "cone radius")?,
            radius_top: finite(&r2, "cone radius")?,
            height: finite(&h, "cone height")?,
            segments: DEFAULT_SEGMENTS,
        })
    });
    engine.register_fn("torus", |major: Dynamic, minor: Dynamic| -> ScriptResult<Shape> {
        let major = finite(&major, "torus radius")?;
        let minor = finite(&minor, "torus radius")?;
        if minor <= 0.0 || minor >= major {
            return Err("torus needs 0 < minor radius < major radius".into());
        }
        let ring = Profile::circle(minor, DEFAULT_SEGMENTS).ok_or("invalid torus section")?;
        Ok(Shape::RotateExtrude {
            profile: ring.offset(major, 0.0),
            angle: 360.0,
            segments: DEFAULT_SEGMENTS,
        })
    });
}

// ── 2D profiles ──────────────────────────────────────────────

fn register_profiles(engine: &mut Engine) {
    engine.register_fn("rectangle", |size: Array| -> ScriptResult<Profile> {
        let [w, h] = vector::<2>(&size, "rectangle size")?;
        Profile::rectangle(w, h).ok_or_else(|| "rectangle must have a positive size".into())
    });
    engine.register_fn("circle", |r: Dynamic| -> ScriptResult<Profile> {
        Profile::circle(finite(&r, "circle radius")?, DEFAULT_SEGMENTS)
            .ok_or_else(|| "circle radius must be positive".into())
    });
    engine.register_fn("circle", |r: Dynamic, n: Dynamic| -> ScriptResult<Profile> {
        Profile::circle(finite(&r, "circle radius")?, segments(&n)?)
            .ok_or_else(|| "circle radius must be positive".into())
    });
    engine.register_fn("polygon", |points: Array| -> ScriptResult<Profile> {
        let pts = points
            .into_iter()
            .map(|p| {
                let arr = p.into_array().map_err(|t| format!("polygon point must be [x, y], got {}", t))?;
                vector::<2>(&arr, "polygon point")
            })
            .collect::<ScriptResult<Vec<_>>>()?;
        Profile::new(pts).ok_or_else(|| "polygon needs at least three non-collinear points".into())
    });
    engine.register_fn("translate", |p: &mut Profile, offset: Array| -> ScriptResult<Profile> {
        let [dx, dy] = vector::<2>(&offset, "profile offset")?;
        Ok(p.offset(dx, dy))
    });
}

// ── Transforms ───────────────────────────────────────────────

fn register_transforms(engine: &mut Engine) {
    // translate([x, y, z], solid) and solid.translate([x, y, z])
    engine.register_fn("translate", |v: Array, s: Shape| -> ScriptResult<Shape> {
        Ok(s.translated(vector::<3>(&v, "translate")?))
    });
    engine.register_fn("translate", |s: &mut Shape, v: Array| -> ScriptResult<Shape> {
        Ok(s.clone().translated(vector::<3>(&v, "translate")?))
    });
    engine.register_fn("rotate", |v: Array, s: Shape| -> ScriptResult<Shape> {
        Ok(s.rotated(vector::<3>(&v, "rotate")?))
    });
    engine.register_fn("rotate", |s: &mut Shape, v: Array| -> ScriptResult<Shape> {
        Ok(s.clone().rotated(vector::<3>(&v, "rotate")?))
    });
    engine.register_fn("scale", |k: Dynamic, s: Shape| -> ScriptResult<Shape> {
        Ok(s.scaled(vec3_or_scalar(&k, "scale")?))
    });
    engine.register_fn("scale", |s: &mut Shape, k: Dynamic| -> ScriptResult<Shape> {
        Ok(s.clone().scaled(vec3_or_scalar(&k, "scale")?))
    });
    engine.register_fn("mirror", |a: ImmutableString, s: Shape| -> ScriptResult<Shape> {
        Ok(s.mirrored(axis(&a)?))
    });
    engine.register_fn("mirror", |s: &mut Shape, a: ImmutableString| -> ScriptResult<Shape> {
        Ok(s.clone().mirrored(axis(&a)?))
    });
}

// ── Booleans ─────────────────────────────────────────────────

fn register_booleans(engine: &mut Engine) {
    engine.register_fn("union", |a: Shape, b: Shape| Shape::Union(vec![a, b]));
    engine.register_fn("union", |all: Array| -> ScriptResult<Shape> {
        Ok(Shape::Union(non_empty(solids(all, "union")?, "union")?))
    });

    for name in ["subtract", "difference"] {
        engine.register_fn(name, |a: Shape, b: Shape| Shape::Difference(vec![a, b]));
        engine.register_fn(name, |all: Array| -> ScriptResult<Shape> {
            Ok(Shape::Difference(non_empty(solids(all, "subtract")?, "subtract")?))
        });
    }

    for name in ["intersect", "intersection"] {
        engine.register_fn(name, |a: Shape, b: Shape| Shape::Intersection(vec![a, b]));
        engine.register_fn(name, |all: Array| -> ScriptResult<Shape> {
            Ok(Shape::Intersection(non_empty(solids(all, "intersect")?, "intersect")?))
        });
    }
}

fn non_empty(shapes: Vec<Shape>, op: &str) -> ScriptResult<Vec<Shape>> {
    if shapes.is_empty() {
        Err(format!("{} needs at least one solid", op).into())
    } else {
        Ok(shapes)
    }
}

// ── Extrusions ───────────────────────────────────────────────

fn register_extrusions(engine: &mut Engine) {
    engine.register_fn("extrude_linear", |p: Profile, h: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::LinearExtrude {
            profile: p,
            height: finite(&h, "extrusion height")?,
            twist: 0.0,
            scale_top: 1.0,
        })
    });
    engine.register_fn(
        "extrude_linear",
        |p: Profile, h: Dynamic, twist: Dynamic, top: Dynamic| -> ScriptResult<Shape> {
            Ok(Shape::LinearExtrude {
                profile: p,
                height: finite(&h, "extrusion height")?,
                twist: finite(&twist, "twist")?,
                scale_top: finite(&top, "top scale")?,
            })
        },
    );
    engine.register_fn("extrude_rotate", |p: Profile, angle: Dynamic, n: Dynamic| -> ScriptResult<Shape> {
        Ok(Shape::RotateExtrude {
            profile: p,
            angle: finite(&angle, "revolve angle")?,
            segments: segments(&n)?,
        })
    });
}

// ── Measurements ─────────────────────────────────────────────

fn measure(shape: &Shape) -> ScriptResult<(f64, Aabb)> {
    let mesh = build::tessellate_shape("measure", shape, build::DEFAULT_MODEL_COLOR)
        .map_err(|e| e.to_string())?;
    Ok((mesh.volume(), Aabb::from_mesh(&mesh)))
}

fn float_array(values: [f32; 3]) -> Array {
    values.iter().map(|v| Dynamic::from_float(*v as FLOAT)).collect()
}

fn register_measurements(engine: &mut Engine) {
    engine.register_fn("volume", |s: &mut Shape| -> ScriptResult<FLOAT> { Ok(measure(s)?.0) });
    engine.register_fn("bounding_box", |s: &mut Shape| -> ScriptResult<Array> {
        let (_, b) = measure(s)?;
        Ok(vec![
            Dynamic::from_array(float_array(b.min.to_array())),
            Dynamic::from_array(float_array(b.max.to_array())),
        ])
    });
    engine.register_fn("dimensions", |s: &mut Shape| -> ScriptResult<Array> {
        let (_, b) = measure(s)?;
        Ok(float_array(b.size().to_array()))
    });
    engine.register_fn("node_count", |s: &mut Shape| s.node_count() as INT);
}
