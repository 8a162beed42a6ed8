use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::config::AppConfig;
use crate::scorer::ScorerClient;
use crate::state::AppState;
use crate::ui::{panels, student_form, summary, table};

/// How often to check on a running request.
const POLL_INTERVAL: Duration = Duration::from_millis(150);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ScoreViewerApp {
    pub state: AppState,
    /// `None` when the HTTP client could not be built; scoring is disabled.
    scorer: Option<Arc<ScorerClient>>,
    show_student_form: bool,
}

impl ScoreViewerApp {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let scorer = match ScorerClient::new(&config.scorer) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                log::error!("Prediction service client unavailable: {e}");
                None
            }
        };
        Self {
            state: AppState::new(config),
            scorer,
            show_student_form: false,
        }
    }

    /// Load the first file dropped onto the window. Validation reports
    /// anything that is not a `.csv`.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(path) = &file.path {
            self.state.load_results_file(path);
        } else if let Some(bytes) = &file.bytes {
            self.state.load_results_bytes(&file.name, bytes);
        }
    }
}

impl eframe::App for ScoreViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_pending();
        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(
                ui,
                &mut self.state,
                self.scorer.as_ref(),
                &mut self.show_student_form,
            );
        });

        // ---- Left side panel: statistics ----
        egui::SidePanel::left("summary_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                summary::summary_panel(ui, &self.state);
            });

        // ---- Central panel: results table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.loaded().is_some() {
                table::results_table(ui, &mut self.state);
            } else {
                panels::empty_view(ui, &self.state);
            }
        });

        if self.show_student_form {
            student_form::student_window(
                ctx,
                &mut self.state,
                self.scorer.as_ref(),
                &mut self.show_student_form,
            );
        }

        if self.state.is_busy() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}
