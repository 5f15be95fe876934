use base64::Engine as _;
use image::{imageops, Rgba, RgbaImage};

use crate::export::{encode_png, Snapshot, SnapshotError};

pub const DEFAULT_CANVAS_SIZE: u32 = 512;
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: [u8; 4] = [20, 20, 20, 255];

// ============================================================================
// Штрихи
// ============================================================================

/// Один непрерывный штрих кистью
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Точки в пикселях холста
    pub points: Vec<[f32; 2]>,
    /// Толщина кисти в пикселях
    pub width: f32,
    pub color: [u8; 4],
}

// ============================================================================
// Холст эскиза
// ============================================================================

/// Квадратный холст для рисования эскиза от руки
#[derive(Debug, Clone)]
pub struct SketchPad {
    size: u32,
    strokes: Vec<Stroke>,
    active: Option<Stroke>,
    /// Подложка (снимок модели), поверх неё рисуются штрихи
    background: Option<RgbaImage>,
    pub brush_size: f32,
    /// Счётчик изменений (для обновления текстуры в UI)
    version: u64,
}

impl Default for SketchPad {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE)
    }
}

impl SketchPad {
    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1),
            strokes: Vec::new(),
            active: None,
            background: None,
            brush_size: 4.0,
            version: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Пустой холст: ни штрихов, ни подложки
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.active.is_none() && self.background.is_none()
    }

    // ── Рисование ────────────────────────────────────────────

    pub fn begin_stroke(&mut self, point: [f32; 2]) {
        self.end_stroke();
        self.active = Some(Stroke {
            points: vec![self.clamp(point)],
            width: self.brush_size,
            color: INK,
        });
        self.version += 1;
    }

    pub fn extend_stroke(&mut self, point: [f32; 2]) {
        let point = self.clamp(point);
        if let Some(stroke) = self.active.as_mut() {
            if stroke.points.last() != Some(&point) {
                stroke.points.push(point);
                self.version += 1;
            }
        }
    }

    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.strokes.push(stroke);
            self.version += 1;
        }
    }

    /// Удалить последний штрих. Возвращает false, если удалять нечего
    pub fn undo_stroke(&mut self) -> bool {
        self.end_stroke();
        let removed = self.strokes.pop().is_some();
        if removed {
            self.version += 1;
        }
        removed
    }

    /// Очистить штрихи и подложку
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
        self.background = None;
        self.version += 1;
    }

    /// Снимок модели становится подложкой; штрихи удаляются
    pub fn seed_from_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let image = snapshot.to_rgba()?;
        let resized = imageops::resize(&image, self.size, self.size, imageops::FilterType::Triangle);
        self.strokes.clear();
        self.active = None;
        self.background = Some(resized);
        self.version += 1;
        Ok(())
    }

    // ── Растеризация ─────────────────────────────────────────

    pub fn to_image(&self) -> RgbaImage {
        let mut image = self
            .background
            .clone()
            .unwrap_or_else(|| RgbaImage::from_pixel(self.size, self.size, PAPER));
        for stroke in self.strokes.iter().chain(self.active.as_ref()) {
            draw_stroke(&mut image, stroke);
        }
        image
    }

    /// PNG в base64 для запроса генерации
    pub fn to_png_base64(&self) -> Result<String, SnapshotError> {
        let png = encode_png(&self.to_image())?;
        Ok(base64::engine::general_purpose::STANDARD.encode(png))
    }

    fn clamp(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let max = (self.size - 1) as f32;
        [x.clamp(0.0, max), y.clamp(0.0, max)]
    }
}

/// Штрих как цепочка круглых отпечатков кисти
fn draw_stroke(image: &mut RgbaImage, stroke: &Stroke) {
    let radius = (stroke.width * 0.5).max(0.5);
    let step = (radius * 0.5).max(0.5);
    let mut stamp = |p: [f32; 2]| stamp_disc(image, p, radius, stroke.color);

    match stroke.points.as_slice() {
        [] => {}
        [single] => stamp(*single),
        points => {
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let len = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
                let n = (len / step).ceil().max(1.0) as u32;
                for i in 0..=n {
                    let t = i as f32 / n as f32;
                    stamp([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]);
                }
            }
        }
    }
}

fn stamp_disc(image: &mut RgbaImage, [cx, cy]: [f32; 2], radius: f32, color: [u8; 4]) {
    let (w, h) = image.dimensions();
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(w - 1);
    let y1 = ((cy + radius).ceil() as u32).min(h - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x, y, Rgba(color));
            }
        }
    }
}
