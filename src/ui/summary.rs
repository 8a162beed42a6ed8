use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::color::{grade_color, tier_color, urgency_color};
use crate::data::model::Grade;
use crate::state::AppState;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Left side panel – batch statistics
// ---------------------------------------------------------------------------

/// Render the statistics panel for the loaded dataset.
pub fn summary_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Summary");
    ui.separator();

    let Some(loaded) = state.loaded() else {
        ui.label("No dataset loaded.");
        return;
    };
    let summary = &loaded.dataset.summary;
    ui.label(RichText::new(&summary.filename).strong());
    ui.label(format!(
        "{} of {} rows processed",
        summary.processed_successfully, summary.total_records
    ));

    let Some(stats) = &loaded.statistics else {
        ui.add_space(8.0);
        ui.label("The dataset has no valid records.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Cards ----
            egui::Grid::new("summary_cards")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Mean (0-100)");
                    ui.strong(format!("{:.2}", stats.mean_100));
                    ui.end_row();
                    ui.label("Mean (0-20)");
                    ui.strong(format!("{:.2}", stats.mean_20));
                    ui.end_row();
                    ui.label("Min / Max");
                    ui.label(format!("{:.2} / {:.2}", stats.min_100, stats.max_100));
                    ui.end_row();
                    ui.label("Std. deviation");
                    ui.label(format!("{:.2}", stats.std_100));
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.strong("Distribution");
            egui::Grid::new("quartiles")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    let q = &stats.quartiles;
                    ui.label("Q1");
                    ui.label(format!("{:.2}", q.q1));
                    ui.end_row();
                    ui.label("Median");
                    ui.label(format!("{:.2}", q.median));
                    ui.end_row();
                    ui.label("Q3");
                    ui.label(format!("{:.2}", q.q3));
                    ui.end_row();
                    ui.label("Range");
                    ui.label(format!("{:.2}", stats.range()));
                    ui.end_row();
                });

            // ---- Grades ----
            ui.add_space(6.0);
            ui.strong("Grades");
            for grade in Grade::ALL {
                let share = stats.grade_share(grade);
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new(grade.as_str()).strong().color(grade_color(grade)));
                    ui.label(format!("{} ({:.1}%)", share.count, share.percentage));
                });
            }
            plot::grade_chart(ui, stats);

            // ---- Tiers ----
            ui.add_space(6.0);
            ui.strong("Performance (0-20)");
            for category in state.categories.iter().rev() {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new(category.label).color(tier_color(category.tier)));
                    ui.label(stats.tier_count(category.tier).to_string());
                });
            }

            // ---- Assessment ----
            ui.add_space(6.0);
            ui.separator();
            let assessment = stats.assessment();
            ui.label(RichText::new(assessment.message()).color(urgency_color(assessment.urgency())));
            for advisory in stats.advisories() {
                ui.label(RichText::new(format!("• {}", advisory.message)).color(urgency_color(advisory.urgency)));
            }
        });
}
