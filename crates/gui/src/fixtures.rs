//! Sample model scripts for tests, demos and the "load sample" menu.
//!
//! Each fixture is a complete script as the generation service would return it.

use crate::model::GeneratedSource;

/// 10×10×10 cube with its corner at the origin.
pub const CUBE_10: &str = "fn main() { cube(10) }";

/// Parametric phone stand: base plate, tilted back rest and a cable slot.
pub const PHONE_STAND: &str = r#"
fn parameter_definitions() {
    [
        #{ name: "width", initial: 70.0, caption: "Width" },
        #{ name: "depth", initial: 60.0, caption: "Base depth" },
        #{ name: "thickness", initial: 4.0, caption: "Wall thickness" },
        #{ name: "angle", initial: 20.0, caption: "Back tilt" }
    ]
}

fn main(params) {
    let w = params.width;
    let d = params.depth;
    let t = params.thickness;

    let base = cuboid([w, d, t], [0.0, 0.0, t / 2.0]);
    let back = cuboid([w, t, 80.0], [0.0, 0.0, 40.0])
        .rotate([-params.angle, 0.0, 0.0])
        .translate([0.0, d / 2.0 - t, t]);
    let lip = cuboid([w, t, 12.0], [0.0, -d / 2.0 + t / 2.0, t + 6.0]);
    let slot = cuboid([14.0, d, t * 4.0], [0.0, 0.0, t]);

    subtract(union([base, back, lip]), slot)
}
"#;

/// Cup built from a revolved profile.
pub const CUP: &str = r#"
fn parameter_definitions() {
    [
        #{ name: "radius", initial: 35.0 },
        #{ name: "height", initial: 90.0 },
        #{ name: "wall", initial: 3.0 }
    ]
}

fn main(params) {
    let r = params.radius;
    let h = params.height;
    let t = params.wall;
    let outline = polygon([[0.0, 0.0], [r, 0.0], [r, h], [r - t, h], [r - t, t], [0.0, t]]);
    extrude_rotate(outline, 360.0, 64)
}
"#;

/// Two separate solids returned as an array.
pub const TWO_PARTS: &str = r#"
fn main() {
    [
        cylinder(5.0, 20.0).translate([0.0, 0.0, 10.0]),
        sphere(6.0).translate([20.0, 0.0, 6.0])
    ]
}
"#;

/// Twisted star column from a linear extrusion.
pub const TWISTED_STAR: &str = r#"
fn main() {
    let pts = [];
    for i in 0..10 {
        let a = i.to_float() * 36.0 * PI() / 180.0;
        let r = if i % 2 == 0 { 20.0 } else { 9.0 };
        pts.push([r * a.cos(), r * a.sin()]);
    }
    extrude_linear(polygon(pts), 60.0, 90.0, 0.6)
}
"#;

/// Valid syntax, no entry point.
pub const NO_ENTRY_POINT: &str = "fn helper() { cube(1) }";

/// Fails at runtime inside the entry point.
pub const RUNTIME_ERROR: &str = r#"fn main() { cube(1).explode() }"#;

/// Never terminates without the operation limit.
pub const RUNAWAY_LOOP: &str = "fn main() { let n = 0; loop { n += 1; } }";

/// All well-formed samples, with a short label.
pub fn samples() -> [(&'static str, &'static str); 5] {
    [
        ("Cube", CUBE_10),
        ("Phone stand", PHONE_STAND),
        ("Cup", CUP),
        ("Two parts", TWO_PARTS),
        ("Twisted star", TWISTED_STAR),
    ]
}

pub fn source(text: &str) -> GeneratedSource {
    GeneratedSource::new(text)
}
