use super::model::{Grade, PredictionRecord};

// ---------------------------------------------------------------------------
// Filter predicate: free-text search AND optional grade
// ---------------------------------------------------------------------------

/// Row predicate built from the view's search box and grade selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter<'a> {
    /// Case-sensitive substring; empty means "no constraint".
    pub search: &'a str,
    pub grade: Option<Grade>,
}

impl<'a> RecordFilter<'a> {
    pub fn new(search: &'a str, grade: Option<Grade>) -> Self {
        Self { search, grade }
    }

    /// A record passes when:
    /// * the search term is empty, or is a substring of the id's text or of
    ///   the 0–100 score's rendered decimal text (`73.5`, `80`), and
    /// * no grade is selected, or the record carries exactly that grade.
    pub fn matches(&self, record: &PredictionRecord) -> bool {
        let search_ok = self.search.is_empty()
            || record.id.to_string().contains(self.search)
            || record.score_100.to_string().contains(self.search);
        let grade_ok = self.grade.map_or(true, |g| record.grade == g);
        search_ok && grade_ok
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.grade.is_some()
    }
}

/// Return indices of records that pass the filter, in original order.
pub fn filtered_indices(records: &[PredictionRecord], filter: &RecordFilter<'_>) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, rec)| filter.matches(rec))
        .map(|(i, _)| i)
        .collect()
}
