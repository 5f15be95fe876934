use egui::Ui;

use sketchforge_gui_lib::i18n::t;
use sketchforge_gui_lib::state::AppState;

/// Transient message shown after an action (export path and similar).
#[derive(Default)]
pub struct StatusLine {
    message: Option<String>,
}

impl StatusLine {
    pub fn set(&mut self, message: String) {
        tracing::info!("{message}");
        self.message = Some(message);
    }
}

pub fn show(ui: &mut Ui, state: &AppState, status: &StatusLine) {
    ui.horizontal(|ui| {
        let solids = state.viewer.solids().len();
        ui.weak(format!("{}: {solids}", t("status.solids")));
        ui.separator();

        if let Some(session) = state.viewer.session() {
            let triangles: usize = session.meshes().iter().map(|m| m.mesh.triangle_count()).sum();
            ui.weak(format!("{}: {triangles}", t("status.triangles")));
            ui.separator();
            let frame = session.render_loop().surface().frame_count();
            ui.weak(format!("{}: {frame}", t("status.frame")));
            ui.separator();
        }

        match &status.message {
            Some(message) => {
                ui.label(message);
            }
            None => {
                ui.weak(t("status.ready"));
            }
        }

        if state.is_generating() {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(255, 200, 100), t("status.generating"));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak("SketchForge v0.1");
        });
    });
}
