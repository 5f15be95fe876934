//! Software rasterizer backing the viewport.
//!
//! Triangles are depth-tested and shaded with the same ambient + Lambert
//! model the desktop shader used; line entities are drawn on top with
//! alpha blending.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use super::camera::CameraState;
use super::mesh::{LineMeshData, MeshData};

const AMBIENT: f32 = 0.25;
const DIFFUSE: f32 = 0.75;
/// Clip-space `w` below which geometry counts as behind the eye.
const MIN_W: f32 = 1e-5;

/// RGBA8 color buffer plus a depth buffer.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    width: u32,
    height: u32,
    color: Vec<u8>,
    depth: Vec<f32>,
    frames: u64,
    light_dir: Vec3,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let n = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![0; n * 4],
            depth: vec![f32::INFINITY; n],
            frames: 0,
            light_dir: Vec3::new(0.3, 0.5, 0.8).normalize(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8, row-major, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.color
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y * self.width + x) as usize * 4;
        [self.color[i], self.color[i + 1], self.color[i + 2], self.color[i + 3]]
    }

    /// Frames completed since creation.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn has_frame(&self) -> bool {
        self.frames > 0
    }

    /// Reallocate when the size changes. Drops the current frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }
        *self = Self {
            light_dir: self.light_dir,
            ..Self::new(width, height)
        };
    }

    pub fn begin_frame(&mut self, background: [u8; 3]) {
        for px in self.color.chunks_exact_mut(4) {
            px.copy_from_slice(&[background[0], background[1], background[2], 255]);
        }
        self.depth.fill(f32::INFINITY);
    }

    pub fn end_frame(&mut self) {
        self.frames += 1;
    }

    // ── Triangles ────────────────────────────────────────────

    pub fn draw_mesh(&mut self, mesh: &MeshData, camera: &CameraState) {
        let vp = camera.view_projection();
        for tri in mesh.indices.chunks_exact(3) {
            let clip = [
                clip_space(&vp, mesh.position(tri[0])),
                clip_space(&vp, mesh.position(tri[1])),
                clip_space(&vp, mesh.position(tri[2])),
            ];
            if clip.iter().any(|c| c.w <= MIN_W) {
                continue;
            }
            let screen = clip.map(|c| self.to_screen(c));

            let n = mesh.normal(tri[0]).normalize_or_zero();
            let light = AMBIENT + DIFFUSE * n.dot(self.light_dir).max(0.0);
            let c = mesh.color(tri[0]);
            let rgb = [to_u8(c[0] * light), to_u8(c[1] * light), to_u8(c[2] * light)];

            self.fill_triangle(screen, rgb);
        }
    }

    fn fill_triangle(&mut self, [a, b, c]: [Vec3; 3], rgb: [u8; 3]) {
        let area = edge(a, b, c);
        if area.abs() < f32::EPSILON {
            return;
        }
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i64;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(self.width as f32 - 1.0) as i64;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i64;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(self.height as f32 - 1.0) as i64;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                if z < -1.0 || z > 1.0 {
                    continue;
                }
                let i = y as usize * self.width as usize + x as usize;
                if z < self.depth[i] {
                    self.depth[i] = z;
                    self.color[i * 4..i * 4 + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
                }
            }
        }
    }

    // ── Lines ────────────────────────────────────────────────

    pub fn draw_lines(&mut self, lines: &LineMeshData, camera: &CameraState) {
        let vp = camera.view_projection();
        for (a, b, color) in lines.segments() {
            let (mut ca, mut cb) = (clip_space(&vp, a), clip_space(&vp, b));
            if ca.w <= MIN_W && cb.w <= MIN_W {
                continue;
            }
            // Clip against the eye plane
            if ca.w <= MIN_W {
                ca = cb.lerp(ca, (cb.w - MIN_W) / (cb.w - ca.w));
            } else if cb.w <= MIN_W {
                cb = ca.lerp(cb, (ca.w - MIN_W) / (ca.w - cb.w));
            }
            let (sa, sb) = (self.to_screen(ca), self.to_screen(cb));
            self.draw_segment(sa, sb, color);
        }
    }

    fn draw_segment(&mut self, a: Vec3, b: Vec3, color: [f32; 4]) {
        let d = b - a;
        let steps = d.x.abs().max(d.y.abs()).ceil();
        // Off-screen segments can project to huge coordinates
        if !steps.is_finite() || steps > 8.0 * (self.width + self.height) as f32 {
            return;
        }
        let steps = steps.max(1.0) as u32;
        let alpha = color[3].clamp(0.0, 1.0);
        let src = [color[0], color[1], color[2]].map(|c| c.clamp(0.0, 1.0) * 255.0);

        for s in 0..=steps {
            let p = a + d * (s as f32 / steps as f32);
            if p.x < 0.0 || p.y < 0.0 {
                continue;
            }
            let (x, y) = (p.x as u32, p.y as u32);
            if x >= self.width || y >= self.height {
                continue;
            }
            let i = (y * self.width + x) as usize;
            // Slight bias so edges lying on a face stay visible
            if p.z > self.depth[i] + 1e-4 {
                continue;
            }
            let px = &mut self.color[i * 4..i * 4 + 3];
            for (dst, s) in px.iter_mut().zip(src) {
                *dst = (s * alpha + *dst as f32 * (1.0 - alpha)).round() as u8;
            }
        }
    }

    fn to_screen(&self, clip: Vec4) -> Vec3 {
        let ndc = clip.xyz() / clip.w;
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            ndc.z,
        )
    }
}

fn clip_space(vp: &Mat4, p: Vec3) -> Vec4 {
    *vp * p.extend(1.0)
}

fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
