use eframe::egui::{self, Align, Layout, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{grade_color, urgency_color};
use crate::data::model::Grade;
use crate::data::view::SortKey;
use crate::state::AppState;

/// User input gathered while the table is drawn and applied afterwards,
/// once the borrowed page is gone.
enum TableAction {
    Search(String),
    GradeFilter(Option<Grade>),
    PageSize(usize),
    Page(usize),
    Sort(SortKey),
    Select(Option<usize>),
}

// ---------------------------------------------------------------------------
// Results table (central panel)
// ---------------------------------------------------------------------------

pub fn results_table(ui: &mut Ui, state: &mut AppState) {
    let mut actions = Vec::new();
    draw(ui, state, &mut actions);
    for action in actions {
        match action {
            TableAction::Search(s) => state.set_search(&s),
            TableAction::GradeFilter(g) => state.set_grade_filter(g),
            TableAction::PageSize(n) => state.set_page_size(n),
            TableAction::Page(p) => state.set_page(p),
            TableAction::Sort(k) => state.toggle_sort(k),
            TableAction::Select(position) => state.select_record(position),
        }
    }
}

fn draw(ui: &mut Ui, state: &AppState, actions: &mut Vec<TableAction>) {
    let (Some(loaded), Some(page)) = (state.loaded(), state.current_page()) else {
        return;
    };
    let view = &loaded.view;

    // ---- Controls ----
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Search");
        let mut search = view.search.clone();
        if ui
            .add(egui::TextEdit::singleline(&mut search).hint_text("id or score").desired_width(140.0))
            .changed()
        {
            actions.push(TableAction::Search(search));
        }

        ui.separator();
        ui.label("Grade");
        let selected_text = view
            .grade_filter
            .map(|g| format!("{g} ({})", g.description()))
            .unwrap_or_else(|| "All".to_string());
        egui::ComboBox::from_id_salt("grade_filter")
            .selected_text(selected_text)
            .show_ui(ui, |ui: &mut Ui| {
                if ui.selectable_label(view.grade_filter.is_none(), "All").clicked() {
                    actions.push(TableAction::GradeFilter(None));
                }
                for grade in Grade::ALL {
                    let text = RichText::new(format!("{grade} ({})", grade.description()))
                        .color(grade_color(grade));
                    if ui
                        .selectable_label(view.grade_filter == Some(grade), text)
                        .clicked()
                    {
                        actions.push(TableAction::GradeFilter(Some(grade)));
                    }
                }
            });

        ui.separator();
        ui.label("Rows per page");
        egui::ComboBox::from_id_salt("page_size")
            .selected_text(view.page_size.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for &size in &state.config.view.page_sizes {
                    if ui
                        .selectable_label(view.page_size == size, size.to_string())
                        .clicked()
                    {
                        actions.push(TableAction::PageSize(size));
                    }
                }
            });
    });
    ui.separator();

    // ---- Pagination ----
    ui.horizontal(|ui: &mut Ui| {
        let last = page.page_count.max(1);
        if ui.add_enabled(page.page > 1, egui::Button::new("⏮")).clicked() {
            actions.push(TableAction::Page(1));
        }
        if ui.add_enabled(page.page > 1, egui::Button::new("◀")).clicked() {
            actions.push(TableAction::Page(page.page - 1));
        }
        ui.label(format!("Page {} of {last}", page.page));
        if ui.add_enabled(page.page < last, egui::Button::new("▶")).clicked() {
            actions.push(TableAction::Page(page.page + 1));
        }
        if ui.add_enabled(page.page < last, egui::Button::new("⏭")).clicked() {
            actions.push(TableAction::Page(last));
        }
        ui.separator();
        let first = page.first_row_number();
        let shown_to = if first == 0 { 0 } else { first + page.rows.len() - 1 };
        ui.label(format!(
            "Showing {first}–{shown_to} of {} ({} total)",
            page.total_filtered,
            loaded.dataset.len()
        ));
    });

    // ---- Table ----
    let available = ui.available_height();
    let recommendation_height = if loaded.selected.is_some() { 170.0 } else { 0.0 };

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .sense(egui::Sense::click())
        .cell_layout(Layout::left_to_right(Align::Center))
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::remainder())
        .max_scroll_height((available - recommendation_height).max(120.0))
        .header(22.0, |mut header| {
            for key in SortKey::ALL {
                header.col(|ui: &mut Ui| {
                    let mut label = key.label().to_string();
                    if view.sort_key == key {
                        label = format!("{label} {}", view.direction.arrow());
                    }
                    if ui.button(RichText::new(label).strong()).clicked() {
                        actions.push(TableAction::Sort(key));
                    }
                });
            }
        })
        .body(|mut body| {
            for rec in &page.rows {
                body.row(20.0, |mut row| {
                    let is_selected = loaded.is_selected(rec);
                    row.set_selected(is_selected);
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.id.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.2}", rec.score_100));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(format!("{:.2}", rec.score_20));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(RichText::new(rec.grade.as_str()).strong().color(grade_color(rec.grade)));
                    });
                    if row.response().clicked() {
                        let next = if is_selected { None } else { loaded.position_of(rec) };
                        actions.push(TableAction::Select(next));
                    }
                });
            }
        });

    if page.rows.is_empty() {
        ui.label(RichText::new("No records match the current filter.").italics());
    }

    recommendation_panel(ui, state);
}

// ---------------------------------------------------------------------------
// Recommendations for the selected row
// ---------------------------------------------------------------------------

fn recommendation_panel(ui: &mut Ui, state: &AppState) {
    let Some((record, rec)) = state.selected_recommendation() else {
        return;
    };
    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("Student {}", record.id));
        ui.label(format!(
            "{:.2}/100 · {:.2}/20 · {}",
            record.score_100, record.score_20, record.grade
        ));
        ui.label(
            RichText::new(rec.urgency.as_str())
                .strong()
                .color(urgency_color(rec.urgency)),
        );
        ui.label(RichText::new(format!("({})", rec.source)).weak());
    });
    let category = state.categories.classify(record.score_20);
    ui.label(RichText::new(format!("{}: {}", category.label, category.description)).weak());

    ui.columns(3, |cols: &mut [Ui]| {
        cols[0].strong("Suggestions");
        for s in &rec.suggestions {
            cols[0].label(format!("• {s}"));
        }
        cols[1].strong("Risk factors");
        if rec.risk_factors.is_empty() {
            cols[1].label(RichText::new("none found").weak());
        }
        for s in &rec.risk_factors {
            cols[1].label(format!("• {s}"));
        }
        cols[2].strong("Strengths");
        if rec.strengths.is_empty() {
            cols[2].label(RichText::new("none found").weak());
        }
        for s in &rec.strengths {
            cols[2].label(format!("• {s}"));
        }
    });
}
