use std::sync::Arc;

use eframe::egui::{self, RichText, Ui};

use crate::color::{grade_color, urgency_color};
use crate::data::student::{DISTANCE, EDUCATION, LEVELS, PEER, YES_NO};
use crate::scorer::ScorerClient;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Single-student prediction window
// ---------------------------------------------------------------------------

pub fn student_window(
    ctx: &egui::Context,
    state: &mut AppState,
    scorer: Option<&Arc<ScorerClient>>,
    open: &mut bool,
) {
    egui::Window::new("Single student")
        .open(open)
        .resizable(false)
        .default_width(360.0)
        .show(ctx, |ui: &mut Ui| {
            form(ui, state);
            ui.separator();

            let can_submit = scorer.is_some() && !state.is_busy();
            ui.horizontal(|ui: &mut Ui| {
                if ui.add_enabled(can_submit, egui::Button::new("Predict")).clicked() {
                    if let Some(client) = scorer {
                        state.predict_student(client);
                    }
                }
                if scorer.is_none() {
                    ui.label(RichText::new("prediction service unavailable").weak());
                }
            });

            outcome(ui, state);
        });
}

fn form(ui: &mut Ui, state: &mut AppState) {
    let p = &mut state.student_form;
    egui::Grid::new("student_form")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.label("Hours studied / week");
            ui.add(egui::DragValue::new(&mut p.hours_studied).range(0.0..=60.0).speed(0.5));
            ui.end_row();
            ui.label("Attendance (%)");
            ui.add(egui::DragValue::new(&mut p.attendance).range(0.0..=100.0).speed(0.5));
            ui.end_row();
            ui.label("Previous scores");
            ui.add(egui::DragValue::new(&mut p.previous_scores).range(0.0..=100.0).speed(0.5));
            ui.end_row();
            ui.label("Tutoring sessions");
            ui.add(egui::DragValue::new(&mut p.tutoring_sessions).range(0.0..=20.0).speed(0.1));
            ui.end_row();

            choice(ui, "Parental involvement", &mut p.parental_involvement, LEVELS);
            choice(ui, "Access to resources", &mut p.access_to_resources, LEVELS);
            choice(ui, "Extracurricular activities", &mut p.extracurricular_activities, YES_NO);
            choice(ui, "Motivation level", &mut p.motivation_level, LEVELS);
            choice(ui, "Family income", &mut p.family_income, LEVELS);
            choice(ui, "Teacher quality", &mut p.teacher_quality, LEVELS);
            choice(ui, "Peer influence", &mut p.peer_influence, PEER);
            choice(ui, "Learning disabilities", &mut p.learning_disabilities, YES_NO);
            choice(ui, "Parental education", &mut p.parental_education_level, EDUCATION);
            choice(ui, "Distance from home", &mut p.distance_from_home, DISTANCE);
        });
}

fn choice(ui: &mut Ui, label: &str, value: &mut String, options: &[&str]) {
    ui.label(label);
    egui::ComboBox::from_id_salt(label)
        .selected_text(value.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                ui.selectable_value(value, option.to_string(), *option);
            }
        });
    ui.end_row();
}

fn outcome(ui: &mut Ui, state: &AppState) {
    let Some(outcome) = &state.student_outcome else {
        return;
    };
    let p = &outcome.prediction;
    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(p.grade.as_str()).heading().color(grade_color(p.grade)));
        ui.label(format!("{:.2}/100 · {:.2}/20", p.score_100, p.score_20));
    });
    let mut details = Vec::new();
    if let Some(model) = &p.model_used {
        details.push(format!("model {model}"));
    }
    if let Some(confidence) = &p.confidence {
        details.push(format!("confidence {confidence}"));
    }
    if let Some(secs) = p.processing_time_secs {
        details.push(format!("{secs:.3}s"));
    }
    if !details.is_empty() {
        ui.label(RichText::new(details.join(" · ")).weak());
    }

    let rec = &outcome.recommendation;
    ui.label(
        RichText::new(format!("{} ({})", rec.urgency.as_str(), rec.source))
            .color(urgency_color(rec.urgency)),
    );
    for s in &rec.suggestions {
        ui.label(format!("• {s}"));
    }
}
