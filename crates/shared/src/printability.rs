//! Эвристическая проверка печатаемости по тексту модели.
//!
//! Геометрия не строится: отчёт получается из литералов в исходном коде
//! (размеры примитивов, толщины, углы поворота).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Минимальная толщина стенки для FDM-печати, мм
pub const MIN_WALL_MM: f64 = 0.8;
/// Максимальный угол нависания без поддержек, градусы
pub const MAX_OVERHANG_DEG: f64 = 45.0;
/// Толщина, сообщаемая, когда в коде не найдено ни одного размера
pub const NOMINAL_WALL_MM: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterOfGravity {
    pub stable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallThickness {
    pub min: f64,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverhangAngle {
    pub max: f64,
    pub ok: bool,
}

/// Отчёт о печатаемости (формат фиксирован для клиента)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintabilityReport {
    pub center_of_gravity: CenterOfGravity,
    pub wall_thickness: WallThickness,
    pub overhang_angle: OverhangAngle,
}

impl PrintabilityReport {
    pub fn is_printable(&self) -> bool {
        self.center_of_gravity.stable && self.wall_thickness.ok && self.overhang_angle.ok
    }
}

struct Patterns {
    thickness: Regex,
    cube_call: Regex,
    radius_call: Regex,
    rotate_call: Regex,
    number: Regex,
    solid_call: Regex,
    tip_cone: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // `wall = 1.5`, `thickness: 2`, `shell_thickness = .6`
        thickness: Regex::new(r"(?i)\b\w*(?:thickness|wall|shell)\w*\s*[:=]\s*(\d*\.?\d+)")
            .expect("valid regex"),
        // cube(10) / cube([10, 2, 3]) / cuboid([...])
        cube_call: Regex::new(r"\bcub(?:e|oid)\s*\(\s*(\[[^\]]*\]|[\d.]+)").expect("valid regex"),
        // sphere(r ...) / cylinder(r, ...) / cone(r1, r2, ...)
        radius_call: Regex::new(r"\b(?:sphere|cylinder|torus)\s*\(\s*(\d*\.?\d+)")
            .expect("valid regex"),
        rotate_call: Regex::new(r"\brotate\s*\(\s*\[([^\]]*)\]").expect("valid regex"),
        number: Regex::new(r"-?\d*\.?\d+").expect("valid regex"),
        solid_call: Regex::new(r"\b(cube|cuboid|sphere|cylinder|cone|torus|extrude_linear|extrude_rotate)\s*\(")
            .expect("valid regex"),
        tip_cone: Regex::new(r"\bcone\s*\(\s*0(?:\.0+)?\s*,").expect("valid regex"),
    })
}

/// Проверить исходный код модели.
pub fn check(source: &str) -> PrintabilityReport {
    let min = min_wall_thickness(source);
    let max = max_overhang_angle(source);

    PrintabilityReport {
        center_of_gravity: CenterOfGravity {
            stable: is_stable(source),
        },
        wall_thickness: WallThickness {
            min,
            ok: min >= MIN_WALL_MM,
        },
        overhang_angle: OverhangAngle {
            max,
            ok: max <= MAX_OVERHANG_DEG,
        },
    }
}

fn positive_numbers(text: &str) -> impl Iterator<Item = f64> + '_ {
    patterns()
        .number
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| *v > 0.0)
}

fn min_wall_thickness(source: &str) -> f64 {
    let p = patterns();
    let mut candidates: Vec<f64> = Vec::new();

    for cap in p.thickness.captures_iter(source) {
        candidates.extend(positive_numbers(&cap[1]));
    }
    for cap in p.cube_call.captures_iter(source) {
        candidates.extend(positive_numbers(&cap[1]));
    }
    // Радиус → диаметр
    for cap in p.radius_call.captures_iter(source) {
        candidates.extend(positive_numbers(&cap[1]).map(|r| r * 2.0));
    }

    candidates
        .into_iter()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
        .unwrap_or(NOMINAL_WALL_MM)
}

fn max_overhang_angle(source: &str) -> f64 {
    let p = patterns();
    let mut max: f64 = 0.0;
    for cap in p.rotate_call.captures_iter(source) {
        let angles: Vec<f64> = p
            .number
            .find_iter(&cap[1])
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .collect();
        // Нависание создаёт только наклон вокруг X или Y
        for angle in angles.iter().take(2) {
            max = max.max(fold_tilt(*angle));
        }
    }
    max
}

/// Наклон детали относительно стола: 0..=90 градусов
fn fold_tilt(angle: f64) -> f64 {
    let a = angle.abs() % 180.0;
    if a > 90.0 {
        180.0 - a
    } else {
        a
    }
}

fn is_stable(source: &str) -> bool {
    let p = patterns();
    if p.tip_cone.is_match(source) {
        return false;
    }
    let solids: Vec<&str> = p
        .solid_call
        .captures_iter(source)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    // Одиночный шар касается стола в одной точке
    !(solids.len() == 1 && solids[0] == "sphere")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_cube_is_printable() {
        let report = check("fn main() { cube(20) }");
        assert!(report.is_printable());
        assert_eq!(report.wall_thickness.min, 20.0);
        assert_eq!(report.overhang_angle.max, 0.0);
    }

    #[test]
    fn test_thin_wall_detected() {
        let src = r#"
            fn main() {
                let wall = 0.4;
                subtract(cuboid([30, 30, 30]), cuboid([29.2, 29.2, 31]))
            }
        "#;
        let report = check(src);
        assert_eq!(report.wall_thickness.min, 0.4);
        assert!(!report.wall_thickness.ok);
    }

    #[test]
    fn test_radius_counts_as_diameter() {
        let report = check("fn main() { cylinder(0.3, 10) }");
        assert!((report.wall_thickness.min - 0.6).abs() < 1e-9);
        assert!(!report.wall_thickness.ok);
    }

    #[test]
    fn test_overhang_from_rotation() {
        let report = check("fn main() { rotate([60, 0, 0], cube(10)) }");
        assert_eq!(report.overhang_angle.max, 60.0);
        assert!(!report.overhang_angle.ok);
    }

    #[test]
    fn test_rotation_about_z_is_not_overhang() {
        let report = check("fn main() { rotate([0, 0, 75], cube(10)) }");
        assert_eq!(report.overhang_angle.max, 0.0);
        assert!(report.overhang_angle.ok);
    }

    #[test]
    fn test_tilt_folding() {
        assert_eq!(fold_tilt(180.0), 0.0);
        assert_eq!(fold_tilt(-135.0), 45.0);
        assert_eq!(fold_tilt(90.0), 90.0);
    }

    #[test]
    fn test_lone_sphere_unstable() {
        assert!(!check("fn main() { sphere(10) }").center_of_gravity.stable);
        assert!(check("fn main() { union(sphere(10), cube(5)) }").center_of_gravity.stable);
    }

    #[test]
    fn test_cone_on_tip_unstable() {
        assert!(!check("fn main() { cone(0, 10, 20) }").center_of_gravity.stable);
        assert!(check("fn main() { cone(10, 0, 20) }").center_of_gravity.stable);
    }

    #[test]
    fn test_no_sizes_reports_nominal() {
        let report = check("fn main() { extrude_linear(profile, h) }");
        assert_eq!(report.wall_thickness.min, NOMINAL_WALL_MM);
        assert!(report.wall_thickness.ok);
    }

    #[test]
    fn test_report_wire_shape() {
        let json = serde_json::to_value(check("fn main() { cube(1) }")).unwrap();
        assert!(json["centerOfGravity"]["stable"].is_boolean());
        assert!(json["wallThickness"]["min"].is_number());
        assert!(json["overhangAngle"]["ok"].is_boolean());
    }
}
