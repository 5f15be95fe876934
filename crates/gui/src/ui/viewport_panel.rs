//! Central viewport: feeds pointer input to the viewer, drives the render
//! loop once per display refresh and shows the last drawn frame.

use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Ui};

use sketchforge_gui_lib::i18n::t;
use sketchforge_gui_lib::session::Viewer;
use sketchforge_gui_lib::state::AppState;
use sketchforge_gui_lib::viewport::navigation::InputEvent;
use sketchforge_gui_lib::viewport::render_loop::FrameOutcome;

use crate::app::styles::{OVERLAY_FILL, OVERLAY_STROKE};

/// Scroll points per wheel notch
const POINTS_PER_NOTCH: f32 = 50.0;

#[derive(Default)]
pub struct ViewportPanel {
    texture: Option<TextureHandle>,
    /// Frame number currently uploaded to `texture`
    uploaded_frame: Option<u64>,
    hovered: bool,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let ppp = ui.ctx().pixels_per_point();
        let viewer = &mut state.viewer;

        // ── Input ────────────────────────────────────────────
        let size = (
            (rect.width() * ppp).round().max(1.0) as u32,
            (rect.height() * ppp).round().max(1.0) as u32,
        );
        if size != viewer.viewport() {
            viewer.handle_input(InputEvent::Resize {
                width: size.0,
                height: size.1,
            });
        }

        let to_pixels = |pos: Pos2| ((pos.x - rect.min.x) * ppp, (pos.y - rect.min.y) * ppp);
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = to_pixels(pos);
                viewer.handle_input(InputEvent::PointerDown { x, y });
            }
        } else if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = to_pixels(pos);
                viewer.handle_input(InputEvent::PointerMove { x, y });
            }
        }
        if response.drag_stopped() {
            viewer.handle_input(InputEvent::PointerUp);
        }

        let hovered = ui.rect_contains_pointer(rect);
        if self.hovered && !hovered {
            viewer.handle_input(InputEvent::PointerLeave);
        }
        self.hovered = hovered;

        if hovered {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                // Scrolling up moves the camera closer
                viewer.handle_input(InputEvent::Wheel {
                    notches: -scroll / POINTS_PER_NOTCH,
                });
            }
        }

        // ── Frame ────────────────────────────────────────────
        if let Some(FrameOutcome::Drawn { frame }) = viewer.tick() {
            self.upload(ui.ctx(), viewer, frame);
        }

        let painter = ui.painter_at(rect);
        match (&self.texture, viewer.session()) {
            (Some(texture), Some(_)) => {
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.image(texture.id(), rect, uv, Color32::WHITE);
            }
            _ => {
                let [r, g, b] = viewer.settings().background_color;
                painter.rect_filled(rect, 0.0, Color32::from_rgb(r, g, b));
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    t("viewport.empty"),
                    egui::FontId::proportional(16.0),
                    Color32::from_gray(140),
                );
            }
        }

        if viewer.session().is_some() {
            ui.ctx().request_repaint();
        }

        show_overlay(ui, rect, viewer);
    }

    fn upload(&mut self, ctx: &egui::Context, viewer: &Viewer, frame: u64) {
        if self.uploaded_frame == Some(frame) {
            return;
        }
        let Some(session) = viewer.session() else {
            return;
        };
        let surface = session.render_loop().surface();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [surface.width() as usize, surface.height() as usize],
            surface.pixels(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("viewport_frame", image, TextureOptions::LINEAR));
            }
        }
        self.uploaded_frame = Some(frame);
    }
}

/// Error panel in the top-left corner of the viewport.
fn show_overlay(ui: &mut Ui, rect: Rect, viewer: &mut Viewer) {
    let Some(error) = viewer.overlay() else {
        return;
    };
    let title = t(&format!("overlay.{}", error.kind()));
    let message = error.to_string();

    let mut dismiss = false;
    egui::Area::new(egui::Id::new("viewport_error_overlay"))
        .fixed_pos(rect.left_top() + egui::vec2(12.0, 12.0))
        .order(egui::Order::Foreground)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style())
                .fill(OVERLAY_FILL)
                .stroke(egui::Stroke::new(1.0, OVERLAY_STROKE))
                .show(ui, |ui| {
                    ui.set_max_width((rect.width() - 24.0).clamp(120.0, 520.0));
                    ui.colored_label(OVERLAY_STROKE, egui::RichText::new(title).strong());
                    ui.label(message);
                    if ui.small_button(t("overlay.dismiss")).clicked() {
                        dismiss = true;
                    }
                });
        });
    if dismiss {
        viewer.dismiss_overlay();
    }
}
