use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Ui};

use sketchforge_gui_lib::i18n::t;
use sketchforge_gui_lib::state::{AppState, ChatRole};

/// Sketch canvas, prompt field and generation history.
#[derive(Default)]
pub struct SketchPanel {
    texture: Option<TextureHandle>,
    uploaded_version: Option<u64>,
}

impl SketchPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        ui.heading(t("sketch.title"));
        ui.separator();

        self.show_canvas(ui, state);
        show_canvas_tools(ui, state);

        ui.add_space(6.0);
        ui.separator();
        show_prompt(ui, state);

        ui.add_space(4.0);
        show_history(ui, state);
    }

    fn show_canvas(&mut self, ui: &mut Ui, state: &mut AppState) {
        let side = ui.available_width().clamp(120.0, 360.0);
        let (rect, response) = ui.allocate_exact_size(egui::vec2(side, side), Sense::drag());

        let scale = state.sketch.size() as f32 / side;
        let to_canvas = |pos: Pos2| [(pos.x - rect.min.x) * scale, (pos.y - rect.min.y) * scale];
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                state.sketch.begin_stroke(to_canvas(pos));
            }
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                state.sketch.extend_stroke(to_canvas(pos));
            }
        }
        if response.drag_stopped() {
            state.sketch.end_stroke();
        }

        let version = state.sketch.version();
        if self.uploaded_version != Some(version) {
            let image = state.sketch.to_image();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as usize, image.height() as usize],
                image.as_raw(),
            );
            match &mut self.texture {
                Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ui.ctx().load_texture("sketch_canvas", color_image, TextureOptions::LINEAR));
                }
            }
            self.uploaded_version = Some(version);
        }

        let painter = ui.painter_at(rect);
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, Color32::from_gray(90)), egui::StrokeKind::Inside);
    }
}

fn show_canvas_tools(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        let has_strokes = !state.sketch.strokes().is_empty();
        if ui.add_enabled(has_strokes, egui::Button::new(t("sketch.undo"))).clicked() {
            state.sketch.undo_stroke();
        }
        if ui.add_enabled(!state.sketch.is_empty(), egui::Button::new(t("sketch.clear"))).clicked() {
            state.sketch.clear();
        }
        let has_model = state.viewer.session().is_some();
        if ui.add_enabled(has_model, egui::Button::new(t("sketch.from_view"))).clicked() {
            let _ = state.snapshot_to_sketch();
        }
    });
    ui.horizontal(|ui| {
        ui.label(t("sketch.brush"));
        ui.add(egui::Slider::new(&mut state.sketch.brush_size, 1.0..=24.0));
    });
}

fn show_prompt(ui: &mut Ui, state: &mut AppState) {
    ui.add(
        egui::TextEdit::multiline(&mut state.prompt)
            .hint_text(t("prompt.hint"))
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );

    ui.horizontal(|ui| {
        let generating = state.is_generating();
        let label = if generating { t("prompt.generating") } else { t("prompt.generate") };
        if ui.add_enabled(!generating, egui::Button::new(label)).clicked() {
            state.submit_generation();
        }
        if generating {
            ui.spinner();
        }
        if state.can_retry_generation() && ui.button(t("prompt.retry")).clicked() {
            state.retry_generation();
        }
    });
}

fn show_history(ui: &mut Ui, state: &AppState) {
    let Some(client) = &state.generation else {
        return;
    };
    egui::ScrollArea::vertical()
        .id_salt("generation_history")
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for msg in &client.messages {
                let color = match (&msg.role, msg.is_error) {
                    (_, true) => Color32::from_rgb(230, 110, 110),
                    (ChatRole::User, _) => Color32::from_rgb(150, 190, 255),
                    (ChatRole::Assistant, _) => Color32::from_gray(200),
                };
                ui.colored_label(color, &msg.text);
            }
        });
}
