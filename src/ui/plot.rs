use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Plot};

use crate::color::grade_color;
use crate::data::model::Grade;
use crate::data::stats::AggregateStatistics;

// ---------------------------------------------------------------------------
// Grade distribution chart (side panel)
// ---------------------------------------------------------------------------

/// Bar per grade, lowest grade on the left, height = record count.
pub fn grade_chart(ui: &mut Ui, stats: &AggregateStatistics) {
    let mut grades = Grade::ALL;
    grades.reverse();

    let bars: Vec<Bar> = grades
        .iter()
        .enumerate()
        .map(|(i, grade)| {
            let share = stats.grade_share(*grade);
            Bar::new(i as f64, share.count as f64)
                .name(format!("{grade}: {} ({:.1}%)", share.count, share.percentage))
                .fill(grade_color(*grade))
                .width(0.7)
        })
        .collect();

    let labels: Vec<String> = grades.iter().map(|g| g.to_string()).collect();

    Plot::new("grade_distribution")
        .height(160.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show_grid(false)
        .y_axis_label("Students")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
