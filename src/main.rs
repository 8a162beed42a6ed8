use std::path::Path;
use std::sync::Arc;

use eframe::egui;
use predictscore_viewer::app::ScoreViewerApp;
use predictscore_viewer::config::{AppConfig, CONFIG_FILE};

fn main() -> eframe::Result {
    env_logger::init();

    let config = Arc::new(AppConfig::load_or_default(Path::new(CONFIG_FILE)));
    log::info!("Prediction service at {}", config.scorer.base_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 450.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "PredictScore – Batch Results Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(ScoreViewerApp::new(config)))),
    )
}
