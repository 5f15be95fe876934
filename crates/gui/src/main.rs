mod app;
mod ui;

use eframe::egui;

use app::SketchForgeApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchforge_gui=info,sketchforge_gui_lib=info".into()),
        )
        .init();

    // Parse --source <path> argument
    let initial_source = parse_source_arg();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SketchForge")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "sketchforge-gui",
        native_options,
        Box::new(move |cc| Ok(Box::new(SketchForgeApp::new(cc, initial_source)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_source_arg() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--source" && i + 1 < args.len() {
            let path = &args[i + 1];
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    tracing::info!("Loaded model script from {path}");
                    return Some(text);
                }
                Err(e) => tracing::error!("Failed to read model script {path}: {e}"),
            }
            break;
        }
        i += 1;
    }
    None
}
