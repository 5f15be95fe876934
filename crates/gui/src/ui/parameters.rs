//! Parameter override panel
//!
//! One text field per declared parameter. A number replaces the value, any
//! other text is evaluated as a formula over the other parameters.

use egui::{TextEdit, Ui};

use sketchforge_gui_lib::i18n::t;
use sketchforge_gui_lib::state::AppState;

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading(t("params.title"));
    ui.separator();

    let Some(session) = state.viewer.session() else {
        ui.weak(t("report.none"));
        return;
    };
    if session.parameters().is_empty() {
        ui.weak(t("params.none"));
        return;
    }

    let rows: Vec<(String, String, f64)> = session
        .parameters()
        .iter()
        .map(|def| {
            let value = session.values().get(&def.name).copied().unwrap_or(def.initial);
            (def.name.clone(), def.label().to_string(), value)
        })
        .collect();

    let mut submit = false;
    egui::Grid::new("parameter_grid")
        .num_columns(3)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            for (name, label, value) in &rows {
                ui.label(label);
                let text = state.override_inputs.entry(name.clone()).or_default();
                let response = ui.add(
                    TextEdit::singleline(text)
                        .hint_text(t("params.formula_hint"))
                        .desired_width(110.0),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.weak(format!("= {value:.3}"));
                ui.end_row();
            }
        });

    ui.add_space(4.0);
    ui.horizontal(|ui| {
        if ui.button(t("params.apply")).clicked() {
            submit = true;
        }
        if ui.button(t("params.reset")).clicked() {
            let _ = state.reset_overrides();
        }
    });

    if submit {
        let _ = state.apply_overrides();
    }
}
