use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::scorer::ScorerClient;
use crate::state::{AppState, DatasetState};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(
    ui: &mut Ui,
    state: &mut AppState,
    scorer: Option<&Arc<ScorerClient>>,
    show_student_form: &mut bool,
) {
    let busy = state.is_busy();
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.add_enabled(!busy, egui::Button::new("Open results…")).clicked() {
                open_results_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let can_score = !busy && scorer.is_some();
            if ui.add_enabled(can_score, egui::Button::new("Score dataset…")).clicked() {
                if let Some(client) = scorer {
                    score_dataset_dialog(state, client);
                }
                ui.close_menu();
            }
            if ui
                .add_enabled(can_score, egui::Button::new("Score student batch…"))
                .clicked()
            {
                if let Some(client) = scorer {
                    score_students_dialog(state, client);
                }
                ui.close_menu();
            }
            ui.separator();
            let can_export = state.loaded().is_some();
            if ui.add_enabled(can_export, egui::Button::new("Export view…")).clicked() {
                export_dialog(state);
                ui.close_menu();
            }
            if ui.add_enabled(!busy, egui::Button::new("Reset")).clicked() {
                state.reset();
                ui.close_menu();
            }
        });

        if ui
            .selectable_label(*show_student_form, "Single student")
            .clicked()
        {
            *show_student_form = !*show_student_form;
        }

        ui.separator();

        if let Some(loaded) = state.loaded() {
            let ds = &loaded.dataset;
            ui.label(format!("{}: {} records", ds.summary.filename, ds.len()));
            if let Some(model) = &ds.model_used {
                ui.label(RichText::new(format!("model {model}")).weak());
            }
            if let Some(secs) = ds.processing_time_secs {
                ui.label(RichText::new(format!("{secs:.2}s")).weak());
            }
            ui.separator();
        }

        if busy {
            ui.spinner();
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

/// Placeholder for the central panel when there is no table to show.
pub fn empty_view(ui: &mut Ui, state: &AppState) {
    ui.centered_and_justified(|ui: &mut Ui| match &state.dataset {
        DatasetState::NoData => {
            ui.heading("Open a results file or drop a .csv here  (File → Open results…)");
        }
        DatasetState::Loading { filename } => {
            ui.heading(format!("Scoring {filename}…"));
        }
        DatasetState::Error { message } => {
            ui.heading(RichText::new(message).color(Color32::RED));
        }
        DatasetState::Loaded(_) => {}
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn csv_dialog(title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("CSV", &["csv"])
}

pub fn open_results_dialog(state: &mut AppState) {
    if let Some(path) = csv_dialog("Open prediction results").pick_file() {
        state.load_results_file(&path);
    }
}

pub fn score_dataset_dialog(state: &mut AppState, client: &Arc<ScorerClient>) {
    if let Some(path) = csv_dialog("Score a student dataset").pick_file() {
        state.score_dataset_file(client, &path);
    }
}

pub fn score_students_dialog(state: &mut AppState, client: &Arc<ScorerClient>) {
    if let Some(path) = csv_dialog("Score a student batch").pick_file() {
        state.score_student_file(client, &path);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let today = chrono::Local::now().date_naive();
    let Some(name) = state.export_file_name(today) else {
        return;
    };
    let Some(path) = csv_dialog("Export current view")
        .set_file_name(name)
        .save_file()
    else {
        return;
    };
    if let Err(e) = state.export_to(&path) {
        log::error!("Export failed: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}
