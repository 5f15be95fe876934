//! Keyboard shortcut handling

use eframe::egui;

use sketchforge_gui_lib::state::AppState;

use crate::ui::status_bar::StatusLine;

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState, status: &mut StatusLine) {
    // Ctrl+Enter works from the prompt field too
    if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Enter)) && !state.is_generating() {
        state.submit_generation();
    }

    // Don't handle the rest when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return;
    }

    let (undo, reset, export, dismiss) = ctx.input(|i| {
        (
            i.modifiers.command && i.key_pressed(egui::Key::Z),
            i.key_pressed(egui::Key::Home),
            i.modifiers.command && i.key_pressed(egui::Key::E),
            i.key_pressed(egui::Key::Escape),
        )
    });

    if undo {
        state.sketch.undo_stroke();
    }
    if reset {
        state.viewer.reset_camera();
    }
    if export && state.viewer.session().is_some() {
        super::menus::export_stl(state, status);
    }
    if dismiss {
        state.viewer.dismiss_overlay();
    }
}
