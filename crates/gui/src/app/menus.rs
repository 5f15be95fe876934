//! Application menu bar and settings window

use eframe::egui;

use sketchforge_gui_lib::fixtures;
use sketchforge_gui_lib::i18n::{t, Lang};
use sketchforge_gui_lib::model::GeneratedSource;
use sketchforge_gui_lib::session::ViewerSettings;
use sketchforge_gui_lib::state::AppState;

use crate::ui::status_bar::StatusLine;

/// Show the file menu
pub fn file_menu(ui: &mut egui::Ui, state: &mut AppState, status: &mut StatusLine) {
    ui.menu_button(t("menu.file"), |ui| {
        if ui.button(t("menu.open_source")).clicked() {
            ui.close_menu();
            if let Some(path) = rfd::FileDialog::new()
                .set_title(t("menu.open_source_title"))
                .add_filter("Rhai", &["rhai"])
                .pick_file()
            {
                match std::fs::read_to_string(&path) {
                    Ok(text) => {
                        tracing::info!("Loaded script from {}", path.display());
                        let _ = state.apply_source(GeneratedSource::new(text));
                    }
                    Err(e) => tracing::error!("Failed to read file: {e}"),
                }
            }
        }
        let has_source = state.viewer.source().is_some();
        if ui.add_enabled(has_source, egui::Button::new(t("menu.save_source"))).clicked() {
            ui.close_menu();
            save_source(state);
        }
        ui.menu_button(t("menu.samples"), |ui| {
            for (label, text) in fixtures::samples() {
                if ui.button(label).clicked() {
                    ui.close_menu();
                    let _ = state.apply_source(GeneratedSource::new(text));
                }
            }
        });
        ui.separator();
        let has_model = state.viewer.session().is_some();
        if ui.add_enabled(has_model, egui::Button::new(t("menu.export_stl"))).clicked() {
            ui.close_menu();
            export_stl(state, status);
        }
        if ui.add_enabled(has_model, egui::Button::new(t("menu.save_snapshot"))).clicked() {
            ui.close_menu();
            save_snapshot(state, status);
        }
        ui.separator();
        if ui.button(t("menu.quit")).clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

fn save_source(state: &AppState) {
    let Some(source) = state.viewer.source() else {
        return;
    };
    if let Some(path) = rfd::FileDialog::new()
        .set_title(t("menu.save_source_title"))
        .add_filter("Rhai", &["rhai"])
        .set_file_name(format!("{}.rhai", state.model_identifier()))
        .save_file()
    {
        if let Err(e) = std::fs::write(&path, source.as_str()) {
            tracing::error!("Failed to write script: {e}");
        }
    }
}

/// Serialize the model and ask where to put it.
pub fn export_stl(state: &mut AppState, status: &mut StatusLine) {
    let Ok(artifact) = state.export_stl() else {
        return;
    };
    if let Some(path) = rfd::FileDialog::new()
        .set_title(t("menu.export_stl_title"))
        .add_filter("STL", &["stl"])
        .set_file_name(&artifact.filename)
        .save_file()
    {
        match artifact.save(&path) {
            Ok(()) => status.set(format!("{}: {}", t("status.exported"), path.display())),
            Err(e) => tracing::error!("Failed to write STL: {e}"),
        }
    }
}

fn save_snapshot(state: &mut AppState, status: &mut StatusLine) {
    let snapshot = match state.viewer.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            state.viewer.set_overlay(e);
            return;
        }
    };
    if let Some(path) = rfd::FileDialog::new()
        .add_filter("PNG", &["png"])
        .set_file_name(format!("{}.png", state.model_identifier()))
        .save_file()
    {
        match std::fs::write(&path, &snapshot.png) {
            Ok(()) => status.set(format!("{}: {}", t("status.exported"), path.display())),
            Err(e) => tracing::error!("Failed to write snapshot: {e}"),
        }
    }
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.view"), |ui| {
        ui.checkbox(&mut state.panels.sketch, t("menu.sketch_panel"));
        ui.checkbox(&mut state.panels.parameters, t("menu.parameters"));
        ui.checkbox(&mut state.panels.report, t("menu.report"));
        ui.checkbox(&mut state.panels.source, t("menu.source"));
        ui.separator();
        if ui.button(t("menu.reset_camera")).clicked() {
            state.viewer.reset_camera();
            ui.close_menu();
        }
        ui.separator();
        ui.menu_button(t("menu.language"), |ui| {
            for (lang, label) in [(Lang::Ru, "Русский"), (Lang::En, "English")] {
                if ui.radio(state.settings.ui.language == lang, label).clicked() {
                    state.settings.ui.language = lang;
                    state.apply_settings();
                    ui.close_menu();
                }
            }
        });
        if ui.button(t("menu.settings")).clicked() {
            state.show_settings_window = true;
            ui.close_menu();
        }
    });
}

pub fn settings_window(ctx: &egui::Context, state: &mut AppState) {
    let mut open = state.show_settings_window;
    egui::Window::new(t("settings.title"))
        .open(&mut open)
        .resizable(true)
        .default_width(380.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                show_service_settings(ui, state);
                show_viewer_settings(ui, &mut state.settings.viewer);
                show_ui_settings(ui, state);
                show_settings_buttons(ui, state);
            });
        });
    state.show_settings_window = open;
}

fn show_service_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.service"));
    ui.horizontal(|ui| {
        ui.label(t("settings.service_url"));
        ui.text_edit_singleline(&mut state.settings.service.url);
    });
    ui.checkbox(&mut state.settings.service.report_errors, t("settings.report_errors"));
    ui.add_space(10.0);
}

fn show_viewer_settings(ui: &mut egui::Ui, viewer: &mut ViewerSettings) {
    ui.heading(t("settings.viewer"));
    ui.horizontal(|ui| {
        ui.label(t("settings.background"));
        ui.color_edit_button_srgb(&mut viewer.background_color);
    });
    ui.horizontal(|ui| {
        ui.label(t("settings.model_color"));
        ui.color_edit_button_rgb(&mut viewer.model_color);
    });
    ui.checkbox(&mut viewer.show_grid, t("settings.grid"));
    ui.checkbox(&mut viewer.show_axes, t("settings.axes"));
    ui.horizontal(|ui| {
        ui.label(t("settings.orbit_speed"));
        ui.add(egui::Slider::new(&mut viewer.orbit_speed, 0.001..=0.05).logarithmic(true));
    });
    ui.checkbox(&mut viewer.invert_wheel, t("settings.invert_wheel"));
    ui.horizontal(|ui| {
        ui.label(t("settings.max_operations"));
        ui.add(
            egui::DragValue::new(&mut viewer.max_operations)
                .speed(10_000)
                .range(10_000..=100_000_000),
        );
    });
    ui.add_space(10.0);
}

fn show_ui_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.ui"));
    ui.horizontal(|ui| {
        ui.label(t("settings.font_size"));
        ui.add(egui::Slider::new(&mut state.settings.ui.font_size, 10.0..=24.0).step_by(1.0));
    });
    ui.horizontal(|ui| {
        ui.label(t("settings.brush_size"));
        ui.add(egui::Slider::new(&mut state.settings.sketch.brush_size, 1.0..=24.0));
    });
    ui.add_space(10.0);
}

fn show_settings_buttons(ui: &mut egui::Ui, state: &mut AppState) {
    ui.separator();
    ui.horizontal(|ui| {
        if ui.button(t("settings.apply")).clicked() {
            state.apply_settings();
        }
        if ui.button(t("settings.reset")).clicked() {
            state.settings = Default::default();
            state.apply_settings();
        }
        if ui.button(t("settings.close")).clicked() {
            state.show_settings_window = false;
        }
    });
}
