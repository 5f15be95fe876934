use egui::Ui;

use shared::printability::{MAX_OVERHANG_DEG, MIN_WALL_MM};
use sketchforge_gui_lib::i18n::t;
use sketchforge_gui_lib::state::AppState;

use crate::app::styles::{OK_COLOR, WARN_COLOR};

pub fn show(ui: &mut Ui, state: &AppState) {
    ui.heading(t("report.title"));
    ui.separator();

    let Some(report) = &state.report else {
        ui.weak(t("report.none"));
        return;
    };

    let color = |ok: bool| if ok { OK_COLOR } else { WARN_COLOR };

    egui::Grid::new("printability_grid").num_columns(2).show(ui, |ui| {
        ui.label(t("report.wall"));
        ui.colored_label(
            color(report.wall_thickness.ok),
            format!("{:.2} mm (≥ {MIN_WALL_MM})", report.wall_thickness.min),
        );
        ui.end_row();

        ui.label(t("report.overhang"));
        ui.colored_label(
            color(report.overhang_angle.ok),
            format!("{:.0}° (≤ {MAX_OVERHANG_DEG})", report.overhang_angle.max),
        );
        ui.end_row();

        ui.label(t("report.stability"));
        let stable = report.center_of_gravity.stable;
        let text = if stable { t("report.stable") } else { t("report.unstable") };
        ui.colored_label(color(stable), text);
        ui.end_row();
    });

    ui.add_space(4.0);
    if report.is_printable() {
        ui.colored_label(OK_COLOR, t("report.printable"));
    } else {
        ui.colored_label(WARN_COLOR, t("report.not_printable"));
    }
}
