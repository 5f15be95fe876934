//! Main application module

mod keyboard;
mod menus;
pub mod styles;

use eframe::egui;

use sketchforge_gui_lib::state::AppState;

use crate::ui::sketch_panel::SketchPanel;
use crate::ui::status_bar::{self, StatusLine};
use crate::ui::viewport_panel::ViewportPanel;
use crate::ui::{parameters, report_panel, source_panel};

/// Main application
pub struct SketchForgeApp {
    state: AppState,
    viewport: ViewportPanel,
    sketch: SketchPanel,
    status: StatusLine,
    /// Last applied font size (to detect changes)
    last_font_size: f32,
}

impl SketchForgeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_source: Option<String>) -> Self {
        let mut state = AppState::default();
        sketchforge_gui_lib::i18n::set_lang(state.settings.ui.language);

        if let Some(text) = initial_source {
            // Failures land in the viewport overlay
            let _ = state.apply_source(text.into());
        }

        styles::configure_styles(&cc.egui_ctx, state.settings.ui.font_size);
        let last_font_size = state.settings.ui.font_size;

        Self {
            state,
            viewport: ViewportPanel::new(),
            sketch: SketchPanel::new(),
            status: StatusLine::default(),
            last_font_size,
        }
    }
}

impl eframe::App for SketchForgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.settings.ui.font_size != self.last_font_size {
            styles::apply_font_size(ctx, self.state.settings.ui.font_size);
            self.last_font_size = self.state.settings.ui.font_size;
        }

        self.state.poll_generation();
        if self.state.is_generating() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        keyboard::handle_keyboard(ctx, &mut self.state, &mut self.status);

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.state, &mut self.status);
                menus::view_menu(ui, &mut self.state);
            });
        });

        menus::settings_window(ctx, &mut self.state);

        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.state, &self.status);
            });

        // ── Left panel: sketch + prompt ──────────────────────
        if self.state.panels.sketch {
            egui::SidePanel::left("sketch_panel")
                .default_width(320.0)
                .width_range(220.0..=480.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    self.sketch.show(ui, &mut self.state);
                });
        }

        self.show_right_panel(ctx);

        // ── Bottom panel: source editor ──────────────────────
        if self.state.panels.source {
            egui::TopBottomPanel::bottom("source_panel")
                .default_height(220.0)
                .resizable(true)
                .show(ctx, |ui| {
                    source_panel::show(ui, &mut self.state);
                });
        }

        // ── Central panel: live viewer ───────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state);
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.viewer.teardown();
        self.state.settings.save();
    }
}

impl SketchForgeApp {
    fn show_right_panel(&mut self, ctx: &egui::Context) {
        let show_params = self.state.panels.parameters;
        let show_report = self.state.panels.report;
        if !show_params && !show_report {
            return;
        }

        egui::SidePanel::right("right_panel")
            .default_width(280.0)
            .width_range(200.0..=460.0)
            .resizable(true)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().id_salt("right_scroll").show(ui, |ui| {
                    if show_params {
                        parameters::show(ui, &mut self.state);
                    }
                    if show_params && show_report {
                        ui.add_space(8.0);
                        ui.separator();
                    }
                    if show_report {
                        report_panel::show(ui, &self.state);
                    }
                });
            });
    }
}
