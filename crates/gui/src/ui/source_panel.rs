use egui::Ui;

use sketchforge_gui_lib::i18n::t;
use sketchforge_gui_lib::model::GeneratedSource;
use sketchforge_gui_lib::state::AppState;

/// Editable model script. Running it goes through the same path as a
/// generated model.
pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.heading(t("source.title"));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let can_run = !state.source_text.trim().is_empty();
            if ui.add_enabled(can_run, egui::Button::new(t("source.run"))).clicked() {
                let text = state.source_text.clone();
                let _ = state.apply_source(GeneratedSource::new(text));
            }
        });
    });
    ui.separator();

    egui::ScrollArea::vertical().id_salt("source_scroll").show(ui, |ui| {
        ui.add(
            egui::TextEdit::multiline(&mut state.source_text)
                .code_editor()
                .desired_rows(16)
                .desired_width(f32::INFINITY),
        );
    });
}
