use std::sync::Arc;

use predictscore_viewer::config::AppConfig;
use predictscore_viewer::data::category::CategoryTable;
use predictscore_viewer::data::export;
use predictscore_viewer::data::loader;
use predictscore_viewer::data::model::Grade;
use predictscore_viewer::data::stats::{AggregateStatistics, Quartiles};
use predictscore_viewer::data::view::{self, SortKey, ViewState};
use predictscore_viewer::state::AppState;

const THREE_ROWS: &[u8] = b"id,score_100,Hours_Studied\n\
2,59,8\n\
3,91,22\n\
1,73,\"14\"\n";

#[test]
fn three_row_upload_end_to_end() {
    let limits = AppConfig::default().upload;
    let ds = loader::load_bytes("class.csv", THREE_ROWS, &limits).unwrap();
    assert_eq!(ds.summary.total_records, 3);
    assert_eq!(ds.summary.processed_successfully, 3);

    let stats = AggregateStatistics::compute(&ds.records, &CategoryTable::standard()).unwrap();
    assert!((stats.mean_100 - 74.33).abs() < 0.005);
    let counted: usize = stats.grades.values().map(|s| s.count).sum();
    assert_eq!(counted, 3);
    assert_eq!(stats.grade_share(Grade::AD).count, 1);
    assert_eq!(stats.grade_share(Grade::B).count, 1);
    assert_eq!(stats.grade_share(Grade::C).count, 1);

    let rows = view::sorted_view(&ds.records, &ViewState::new(50));
    let text = String::from_utf8(export::to_csv_bytes(&rows).unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "id,score_100,score_20,letter_grade");
    assert!(lines[1].starts_with("1,73,"));
    assert!(lines[2].starts_with("2,59,"));
    assert!(lines[3].starts_with("3,91,"));
}

#[test]
fn state_machine_export_follows_the_view() {
    let mut state = AppState::new(Arc::new(AppConfig::default()));
    state.load_results_bytes("class.csv", THREE_ROWS);
    state.toggle_sort(SortKey::Score100);
    state.toggle_sort(SortKey::Score100);
    let ids: Vec<i64> = state.export_rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);

    state.set_grade_filter(Some(Grade::AD));
    let ids: Vec<i64> = state.export_rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3]);

    let path = std::env::temp_dir().join(format!("predictscore_it_{}.csv", std::process::id()));
    state.export_to(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 2);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn quartile_seed() {
    let scores: Vec<f64> = (1..=10).map(|i| f64::from(i) * 10.0).collect();
    let q = Quartiles::from_scores(&scores).unwrap();
    assert_eq!((q.q1, q.median, q.q3), (30.0, 60.0, 80.0));
}

#[test]
fn pagination_of_95_records() {
    let mut csv = String::from("id,score\n");
    for i in 1..=95 {
        csv.push_str(&format!("{i},{}\n", 40 + i % 60));
    }
    let mut state = AppState::new(Arc::new(AppConfig::default()));
    state.load_results_bytes("big.csv", csv.as_bytes());

    let page = state.current_page().unwrap();
    assert_eq!(page.rows.len(), 50);
    assert_eq!(page.page_count, 2);

    state.set_page(2);
    assert_eq!(state.current_page().unwrap().rows.len(), 45);

    let loaded = state.loaded().unwrap();
    let rows = view::sorted_view(&loaded.dataset.records, &loaded.view);
    let third = view::paginate(&rows, 3, 50);
    assert!(third.rows.is_empty());
    assert_eq!(third.total_filtered, 95);
}

#[test]
fn stable_sort_under_toggle() {
    let csv = b"id,score\n5,70\n9,85\n2,70\n7,85\n";
    let mut state = AppState::new(Arc::new(AppConfig::default()));
    state.load_results_bytes("ties.csv", csv);

    state.toggle_sort(SortKey::Grade);
    let asc: Vec<i64> = state.export_rows().iter().map(|r| r.id).collect();
    assert_eq!(asc, vec![5, 2, 9, 7]);

    state.toggle_sort(SortKey::Grade);
    let desc: Vec<i64> = state.export_rows().iter().map(|r| r.id).collect();
    assert_eq!(desc, vec![9, 7, 5, 2]);
}

#[test]
fn oversized_and_empty_uploads_are_rejected() {
    let mut limits = AppConfig::default().upload;
    limits.dataset_max_bytes = 16;
    let err = loader::load_bytes("big.csv", THREE_ROWS, &limits).unwrap_err();
    assert!(err.to_string().starts_with("File too large"));

    let err = loader::load_bytes("empty.csv", b"", &AppConfig::default().upload).unwrap_err();
    assert!(err.to_string().starts_with("Empty file"));
}
