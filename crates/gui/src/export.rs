//! Export of the current model: binary STL files and PNG snapshots.

use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use chrono::NaiveDateTime;
use glam::Vec3;

use crate::build::SolidMesh;
use crate::viewport::raster::RenderSurface;

/// Binary STL header size
const STL_HEADER_LEN: usize = 80;
/// normal(12) + 3 vertices(36) + attribute byte count(2)
const STL_TRIANGLE_LEN: usize = 50;
const STL_HEADER_TEXT: &[u8] = b"SketchForge binary STL";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the model has no geometry")]
    NoGeometry,
    #[error("STL serialization failed: {message}")]
    Serialization { message: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("no model is loaded")]
    NoModel,
    #[error("the viewport has not rendered a frame yet")]
    SurfaceNotReady,
    #[error("PNG encoding failed: {0}")]
    Encoding(String),
}

/// A serialized STL file waiting to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub triangle_count: u32,
}

impl ExportArtifact {
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Serialize every solid into one binary STL.
///
/// `seq` distinguishes exports made within the same second.
pub fn export_stl(meshes: &[SolidMesh], identifier: &str, seq: u64) -> Result<ExportArtifact, ExportError> {
    export_stl_at(meshes, identifier, seq, chrono::Local::now().naive_local())
}

pub fn export_stl_at(
    meshes: &[SolidMesh],
    identifier: &str,
    seq: u64,
    timestamp: NaiveDateTime,
) -> Result<ExportArtifact, ExportError> {
    let total: usize = meshes.iter().map(|m| m.mesh.triangle_count()).sum();
    if total == 0 {
        return Err(ExportError::NoGeometry);
    }
    let triangle_count = u32::try_from(total).map_err(|_| ExportError::Serialization {
        message: format!("{} triangles exceed the STL limit", total),
    })?;

    let mut bytes = Vec::with_capacity(STL_HEADER_LEN + 4 + total * STL_TRIANGLE_LEN);
    let mut header = [0u8; STL_HEADER_LEN];
    header[..STL_HEADER_TEXT.len()].copy_from_slice(STL_HEADER_TEXT);
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&triangle_count.to_le_bytes());

    for solid in meshes {
        for [a, b, c] in solid.mesh.triangles() {
            if !(a.is_finite() && b.is_finite() && c.is_finite()) {
                return Err(ExportError::Serialization {
                    message: format!("solid '{}' contains non-finite coordinates", solid.name),
                });
            }
            let normal = (b - a).cross(c - a).normalize_or_zero();
            for v in [normal, a, b, c] {
                push_vec3(&mut bytes, v);
            }
            bytes.extend_from_slice(&0u16.to_le_bytes());
        }
    }

    let filename = format!(
        "{}_{}_{}.stl",
        sanitize_identifier(identifier),
        timestamp.format("%Y%m%d_%H%M%S"),
        seq
    );
    tracing::info!(%filename, triangles = triangle_count, "Exported STL");

    Ok(ExportArtifact {
        filename,
        bytes,
        triangle_count,
    })
}

fn push_vec3(out: &mut Vec<u8>, v: Vec3) {
    for c in v.to_array() {
        out.extend_from_slice(&c.to_le_bytes());
    }
}

/// Keep filenames portable: ASCII alphanumerics, `-` and `_`.
fn sanitize_identifier(identifier: &str) -> String {
    let cleaned: String = identifier
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "model".to_string()
    } else {
        cleaned
    }
}

// ── Snapshot ─────────────────────────────────────────────────

/// PNG image of the last rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Snapshot {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }

    /// Decode back to RGBA8 pixels.
    pub fn to_rgba(&self) -> Result<image::RgbaImage, SnapshotError> {
        image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
            .map(|img| img.to_rgba8())
            .map_err(|e| SnapshotError::Encoding(e.to_string()))
    }
}

pub fn snapshot(surface: &RenderSurface) -> Result<Snapshot, SnapshotError> {
    if !surface.has_frame() {
        return Err(SnapshotError::SurfaceNotReady);
    }
    let (width, height) = (surface.width(), surface.height());
    let img = image::RgbaImage::from_raw(width, height, surface.pixels().to_vec())
        .ok_or_else(|| SnapshotError::Encoding("pixel buffer does not match surface size".into()))?;
    let png = encode_png(&img)?;
    tracing::debug!(width, height, png_bytes = png.len(), "Captured snapshot");
    Ok(Snapshot { width, height, png })
}

pub(crate) fn encode_png(img: &image::RgbaImage) -> Result<Vec<u8>, SnapshotError> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| SnapshotError::Encoding(e.to_string()))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::bounds::Aabb;
    use crate::viewport::mesh::{push_vert, MeshData};
    use chrono::NaiveDate;

    fn triangle_mesh(name: &str, triangles: usize) -> SolidMesh {
        let mut mesh = MeshData::default();
        for i in 0..triangles {
            let base = mesh.vertex_count() as u32;
            let x = i as f32;
            for p in [Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0), Vec3::new(x, 1.0, 0.0)] {
                push_vert(&mut mesh.vertices, p, Vec3::Z, [0.5; 3]);
            }
            mesh.indices.extend([base, base + 1, base + 2]);
        }
        let bounds = Aabb::from_mesh(&mesh);
        SolidMesh {
            name: name.to_string(),
            mesh,
            bounds,
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 7))
            .unwrap()
    }

    #[test]
    fn test_stl_layout() {
        let artifact = export_stl_at(&[triangle_mesh("a", 2), triangle_mesh("b", 1)], "cup", 0, at()).unwrap();
        assert_eq!(artifact.triangle_count, 3);
        assert_eq!(artifact.bytes.len(), 84 + 3 * 50);
        assert_eq!(&artifact.bytes[80..84], &3u32.to_le_bytes());
        assert!(artifact.bytes.starts_with(STL_HEADER_TEXT));
        // First normal points along +Z
        let nz = f32::from_le_bytes(artifact.bytes[92..96].try_into().unwrap());
        assert_eq!(nz, 1.0);
    }

    #[test]
    fn test_filename_format() {
        let artifact = export_stl_at(&[triangle_mesh("a", 1)], "my cup!", 4, at()).unwrap();
        assert_eq!(artifact.filename, "my_cup__20240309_140507_4.stl");
        let unnamed = export_stl_at(&[triangle_mesh("a", 1)], "  ", 0, at()).unwrap();
        assert!(unnamed.filename.starts_with("model_"));
    }

    #[test]
    fn test_empty_export_rejected() {
        assert_eq!(export_stl(&[], "x", 0), Err(ExportError::NoGeometry));
        assert_eq!(export_stl(&[triangle_mesh("a", 0)], "x", 0), Err(ExportError::NoGeometry));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut bad = triangle_mesh("bad", 1);
        bad.mesh.vertices[0] = f32::NAN;
        assert!(matches!(
            export_stl(&[bad], "x", 0),
            Err(ExportError::Serialization { .. })
        ));
    }

    #[test]
    fn test_snapshot_requires_frame() {
        let surface = RenderSurface::new(8, 8);
        assert_eq!(snapshot(&surface), Err(SnapshotError::SurfaceNotReady));
    }

    #[test]
    fn test_snapshot_png() {
        let mut surface = RenderSurface::new(6, 4);
        surface.begin_frame([200, 100, 50]);
        surface.end_frame();
        let snap = snapshot(&surface).unwrap();
        assert!(snap.png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert!(!snap.to_base64().is_empty());
        let decoded = snap.to_rgba().unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.get_pixel(5, 3).0, [200, 100, 50, 255]);
    }
}
