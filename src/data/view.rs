use std::cmp::Ordering;

use super::filter::{filtered_indices, RecordFilter};
use super::model::{Grade, PredictionRecord};

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Id,
    Score100,
    Score20,
    Grade,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Id, SortKey::Score100, SortKey::Score20, SortKey::Grade];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Id => "ID",
            SortKey::Score100 => "Score (0-100)",
            SortKey::Score20 => "Score (0-20)",
            SortKey::Grade => "Grade",
        }
    }

    fn compare(self, a: &PredictionRecord, b: &PredictionRecord) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Score100 => a.score_100.total_cmp(&b.score_100),
            SortKey::Score20 => a.score_20.total_cmp(&b.score_20),
            SortKey::Grade => a.grade.cmp(&b.grade),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "⏶",
            SortDirection::Descending => "⏷",
        }
    }
}

/// Per-dataset table state. Replaced with defaults on every new load.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub grade_filter: Option<Grade>,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search: String::new(),
            grade_filter: None,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
        }
    }

    pub fn filter(&self) -> RecordFilter<'_> {
        RecordFilter::new(&self.search, self.grade_filter)
    }

    /// Changing the filter always returns to page 1.
    pub fn set_search(&mut self, search: &str) {
        if self.search != search {
            self.search = search.to_string();
            self.page = 1;
        }
    }

    pub fn set_grade_filter(&mut self, grade: Option<Grade>) {
        if self.grade_filter != grade {
            self.grade_filter = grade;
            self.page = 1;
        }
    }

    /// Clicking the active column flips the direction; clicking another
    /// column sorts by it ascending. The page is left alone.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.toggled();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Move to `page`, clamped into `1..=page_count` (page 1 when there are
    /// no pages at all).
    pub fn set_page(&mut self, page: usize, page_count: usize) {
        self.page = page.clamp(1, page_count.max(1));
    }
}

// ---------------------------------------------------------------------------
// Filter → sort → paginate
// ---------------------------------------------------------------------------

/// Filter then stably sort. Descending flips the comparison rather than
/// reversing the output, so equal keys keep their original relative order in
/// both directions.
pub fn sorted_view<'a>(records: &'a [PredictionRecord], view: &ViewState) -> Vec<&'a PredictionRecord> {
    let mut rows: Vec<&PredictionRecord> = filtered_indices(records, &view.filter())
        .into_iter()
        .map(|i| &records[i])
        .collect();

    let key = view.sort_key;
    match view.direction {
        SortDirection::Ascending => rows.sort_by(|a, b| key.compare(a, b)),
        SortDirection::Descending => rows.sort_by(|a, b| key.compare(b, a)),
    }
    rows
}

/// `ceil(count / page_size)`; zero rows means zero pages.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// One window of the filtered, sorted rows.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub rows: Vec<&'a PredictionRecord>,
    /// 1-based page that was requested.
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Rows passing the filter, across all pages.
    pub total_filtered: usize,
}

impl Page<'_> {
    /// 1-based position of the first row on this page, for "showing x–y of n".
    pub fn first_row_number(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }
}

/// Slice `[(page-1)*size, page*size)` clamped to the available rows. A page
/// past the end is an empty page, not an error.
pub fn paginate<'a>(rows: &[&'a PredictionRecord], page: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(rows.len());
    let end = page.saturating_mul(page_size).min(rows.len());
    Page {
        rows: rows[start..end].to_vec(),
        page,
        page_size,
        page_count: page_count(rows.len(), page_size),
        total_filtered: rows.len(),
    }
}

/// The page of records to render for `view`.
pub fn render_page<'a>(records: &'a [PredictionRecord], view: &ViewState) -> Page<'a> {
    let rows = sorted_view(records, view);
    paginate(&rows, view.page, view.page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::OriginalData;

    fn rec(id: i64, score: f64) -> PredictionRecord {
        PredictionRecord::new(id, score, OriginalData::new())
    }

    fn ids(rows: &[&PredictionRecord]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn default_view_is_id_ascending() {
        let records = vec![rec(3, 70.0), rec(1, 80.0), rec(2, 60.0)];
        let view = ViewState::new(50);
        assert_eq!(ids(&sorted_view(&records, &view)), vec![1, 2, 3]);
    }

    #[test]
    fn ties_keep_original_order_in_both_directions() {
        // ids 7 and 4 tie on score; 7 comes first in the source
        let records = vec![rec(7, 80.0), rec(2, 95.0), rec(4, 80.0), rec(9, 60.0)];
        let mut view = ViewState::new(50);
        view.toggle_sort(SortKey::Score100);
        assert_eq!(ids(&sorted_view(&records, &view)), vec![9, 7, 4, 2]);

        view.toggle_sort(SortKey::Score100);
        assert_eq!(view.direction, SortDirection::Descending);
        assert_eq!(ids(&sorted_view(&records, &view)), vec![2, 7, 4, 9]);
    }

    #[test]
    fn grade_sort_follows_achievement_order() {
        let records = vec![rec(1, 95.0), rec(2, 50.0), rec(3, 80.0), rec(4, 65.0)];
        let mut view = ViewState::new(50);
        view.toggle_sort(SortKey::Grade);
        assert_eq!(ids(&sorted_view(&records, &view)), vec![2, 4, 3, 1]);
    }

    #[test]
    fn switching_column_resets_direction() {
        let mut view = ViewState::new(50);
        view.toggle_sort(SortKey::Id);
        assert_eq!(view.direction, SortDirection::Descending);
        view.toggle_sort(SortKey::Score20);
        assert_eq!(view.sort_key, SortKey::Score20);
        assert_eq!(view.direction, SortDirection::Ascending);
    }

    #[test]
    fn pagination_clamps_past_the_end() {
        let records: Vec<_> = (1..=95).map(|i| rec(i, 50.0 + (i % 40) as f64)).collect();
        let rows = sorted_view(&records, &ViewState::new(50));

        let first = paginate(&rows, 1, 50);
        assert_eq!(first.rows.len(), 50);
        assert_eq!(first.rows[0].id, 1);
        assert_eq!(first.page_count, 2);

        let second = paginate(&rows, 2, 50);
        assert_eq!(second.rows.len(), 45);
        assert_eq!(second.rows[0].id, 51);
        assert_eq!(second.rows[44].id, 95);
        assert_eq!(second.first_row_number(), 51);

        let third = paginate(&rows, 3, 50);
        assert!(third.rows.is_empty());
        assert_eq!(third.total_filtered, 95);
        assert_eq!(third.page_count, 2);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 50), 0);
        assert_eq!(page_count(50, 50), 1);
        assert_eq!(page_count(51, 50), 2);
    }

    #[test]
    fn page_size_and_filter_changes_return_to_first_page() {
        let mut view = ViewState::new(25);
        view.set_page(3, 4);
        assert_eq!(view.page, 3);
        view.set_page_size(100);
        assert_eq!(view.page, 1);

        view.set_page(2, 4);
        view.set_search("12");
        assert_eq!(view.page, 1);

        view.set_page(2, 4);
        view.set_grade_filter(Some(Grade::A));
        assert_eq!(view.page, 1);

        view.set_page(2, 4);
        view.toggle_sort(SortKey::Score100);
        assert_eq!(view.page, 2);
    }

    #[test]
    fn set_page_clamps_into_range() {
        let mut view = ViewState::new(50);
        view.set_page(9, 2);
        assert_eq!(view.page, 2);
        view.set_page(0, 2);
        assert_eq!(view.page, 1);
        view.set_page(4, 0);
        assert_eq!(view.page, 1);
    }

    #[test]
    fn filtering_to_nothing_gives_an_empty_first_page() {
        let records = vec![rec(1, 80.0), rec(2, 90.0)];
        let mut view = ViewState::new(50);
        view.set_search("zzz");
        let page = render_page(&records, &view);
        assert!(page.rows.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.page_count, 0);
        assert_eq!(page.first_row_number(), 0);
    }

    #[test]
    fn huge_page_number_is_an_empty_page() {
        let records = vec![rec(1, 80.0), rec(2, 90.0)];
        let rows: Vec<&PredictionRecord> = records.iter().collect();
        let page = paginate(&rows, usize::MAX, 50);
        assert!(page.rows.is_empty());
        assert_eq!(page.page, usize::MAX);
        assert_eq!(page.total_filtered, 2);
    }
}
