use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::{AppConfig, UploadKind};
use crate::data::category::CategoryTable;
use crate::data::export;
use crate::data::loader;
use crate::data::model::{BatchDataset, Grade, PredictionRecord};
use crate::data::stats::AggregateStatistics;
use crate::data::student::StudentProfile;
use crate::data::view::{self, Page, SortKey, ViewState};
use crate::recommend::{self, Recommendation};
use crate::scorer::{self, PendingPrediction, PendingScore, ScorerClient, SinglePrediction};

// ---------------------------------------------------------------------------
// Dataset lifecycle
// ---------------------------------------------------------------------------

/// What the main view is showing.
pub enum DatasetState {
    NoData,
    Loading { filename: String },
    Loaded(Box<LoadedDataset>),
    Error { message: String },
}

/// A dataset together with everything derived from it.
pub struct LoadedDataset {
    pub dataset: BatchDataset,
    /// `None` for a dataset without records.
    pub statistics: Option<AggregateStatistics>,
    pub view: ViewState,
    /// Position in `dataset.records` of the row whose recommendations are
    /// shown. Ids may repeat, so the row is tracked by position.
    pub selected: Option<usize>,
}

impl LoadedDataset {
    /// Position of `record` in this dataset, if it is one of its rows.
    pub fn position_of(&self, record: &PredictionRecord) -> Option<usize> {
        self.dataset
            .records
            .iter()
            .position(|r| std::ptr::eq(r, record))
    }

    pub fn is_selected(&self, record: &PredictionRecord) -> bool {
        self.selected
            .and_then(|i| self.dataset.records.get(i))
            .is_some_and(|r| std::ptr::eq(r, record))
    }

    fn page_count(&self) -> usize {
        let rows = view::sorted_view(&self.dataset.records, &self.view);
        view::page_count(rows.len(), self.view.page_size)
    }
}

/// Result of the single-student form.
pub struct StudentOutcome {
    pub prediction: SinglePrediction,
    pub recommendation: Recommendation,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub categories: Arc<CategoryTable>,

    pub dataset: DatasetState,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Inputs of the single-student form.
    pub student_form: StudentProfile,
    pub student_outcome: Option<StudentOutcome>,

    pending_dataset: Option<PendingScore>,
    pending_prediction: Option<PendingPrediction>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            categories: Arc::new(CategoryTable::standard()),
            dataset: DatasetState::NoData,
            status_message: None,
            student_form: StudentProfile::default(),
            student_outcome: None,
            pending_dataset: None,
            pending_prediction: None,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedDataset> {
        match &self.dataset {
            DatasetState::Loaded(loaded) => Some(&**loaded),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut LoadedDataset> {
        match &mut self.dataset {
            DatasetState::Loaded(loaded) => Some(&mut **loaded),
            _ => None,
        }
    }

    /// Replace whatever is shown with a freshly loaded dataset. Statistics
    /// are computed here once; the view starts from its defaults.
    pub fn set_dataset(&mut self, dataset: BatchDataset) {
        let statistics = AggregateStatistics::compute(&dataset.records, &self.categories);
        let summary = &dataset.summary;
        log::info!(
            "Loaded {} of {} records from {}",
            summary.processed_successfully,
            summary.total_records,
            summary.filename
        );
        self.status_message = Some(format!(
            "{}: {} of {} records processed",
            summary.filename, summary.processed_successfully, summary.total_records
        ));
        self.dataset = DatasetState::Loaded(Box::new(LoadedDataset {
            dataset,
            statistics,
            view: ViewState::new(self.config.view.default_page_size),
            selected: None,
        }));
    }

    pub fn set_error(&mut self, message: String) {
        log::error!("{message}");
        self.status_message = Some(format!("Error: {message}"));
        self.dataset = DatasetState::Error { message };
    }

    /// Drop the dataset and the form result. Refused while a request is in
    /// flight, since its worker cannot be cancelled.
    pub fn reset(&mut self) {
        if self.refuse_if_busy() {
            return;
        }
        self.dataset = DatasetState::NoData;
        self.student_outcome = None;
        self.status_message = None;
    }

    // -- Loading --

    /// Load an already-scored results file from disk.
    pub fn load_results_file(&mut self, path: &Path) {
        if self.refuse_if_busy() {
            return;
        }
        match loader::load_file(path, &self.config.upload) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub fn load_results_bytes(&mut self, filename: &str, bytes: &[u8]) {
        if self.refuse_if_busy() {
            return;
        }
        match loader::load_bytes(filename, bytes, &self.config.upload) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    // -- Scoring jobs --

    /// Whether a request to the prediction service is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending_dataset.is_some() || self.pending_prediction.is_some()
    }

    fn refuse_if_busy(&mut self) -> bool {
        if self.is_busy() {
            self.status_message = Some("A request is already in progress".to_string());
        }
        self.is_busy()
    }

    /// Track a dataset scoring job. Refused while another request runs.
    pub fn start_job(&mut self, pending: PendingScore) -> bool {
        if self.refuse_if_busy() {
            return false;
        }
        log::info!("Scoring {}", pending.label);
        self.status_message = Some(format!("Scoring {}…", pending.label));
        self.dataset = DatasetState::Loading {
            filename: pending.label.clone(),
        };
        self.pending_dataset = Some(pending);
        true
    }

    /// Send a raw dataset file to the prediction service.
    pub fn score_dataset_file(&mut self, client: &Arc<ScorerClient>, path: &Path) {
        if self.refuse_if_busy() {
            return;
        }
        match loader::read_upload(path, &self.config.upload, UploadKind::Dataset) {
            Ok((filename, bytes)) => {
                self.start_job(scorer::spawn_dataset_scoring(Arc::clone(client), filename, bytes));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Clean a student-attribute file locally, then send the surviving rows
    /// for scoring.
    pub fn score_student_file(&mut self, client: &Arc<ScorerClient>, path: &Path) {
        if self.refuse_if_busy() {
            return;
        }
        let batch = match loader::load_student_file(path, &self.config.upload) {
            Ok(batch) => batch,
            Err(e) => return self.set_error(e.to_string()),
        };
        if batch.profiles.is_empty() {
            return self.set_error(format!("{}: no rows with study hours", batch.filename));
        }
        log::info!(
            "{}: {} of {} rows kept for scoring",
            batch.filename,
            batch.profiles.len(),
            batch.total_rows
        );
        match batch.to_csv() {
            Ok(bytes) => {
                self.start_job(scorer::spawn_dataset_scoring(Arc::clone(client), batch.filename, bytes));
            }
            Err(e) => self.set_error(format!("Cannot encode {}: {e}", batch.filename)),
        }
    }

    /// Score the single-student form.
    pub fn predict_student(&mut self, client: &Arc<ScorerClient>) {
        if self.refuse_if_busy() {
            return;
        }
        if !self.student_form.is_valid() {
            self.status_message = Some("Error: study hours must be greater than zero".to_string());
            return;
        }
        self.student_outcome = None;
        self.status_message = Some("Predicting…".to_string());
        self.pending_prediction = Some(scorer::spawn_student_prediction(
            Arc::clone(client),
            self.student_form.clone(),
        ));
    }

    /// Collect finished jobs. Returns `true` when the state changed.
    pub fn poll_pending(&mut self) -> bool {
        let mut changed = false;

        let finished = self.pending_dataset.as_ref().and_then(|p| p.poll());
        if let Some(result) = finished {
            self.pending_dataset = None;
            changed = true;
            match result {
                Ok(dataset) => self.set_dataset(dataset),
                Err(e) => self.set_error(e.to_string()),
            }
        }

        let finished = self.pending_prediction.as_ref().and_then(|p| p.poll());
        if let Some(result) = finished {
            self.pending_prediction = None;
            changed = true;
            match result {
                Ok(prediction) => {
                    let recommendation =
                        recommend::recommend(prediction.score_20, &self.student_form.study_inputs());
                    self.status_message = Some(format!(
                        "Predicted {:.2}/100 ({})",
                        prediction.score_100, prediction.grade
                    ));
                    self.student_outcome = Some(StudentOutcome {
                        prediction,
                        recommendation,
                    });
                }
                Err(e) => {
                    log::error!("Prediction failed: {e}");
                    self.status_message = Some(format!("Error: {e}"));
                }
            }
        }

        changed
    }

    // -- View actions --

    pub fn set_search(&mut self, search: &str) {
        if let Some(loaded) = self.loaded_mut() {
            loaded.view.set_search(search);
        }
    }

    pub fn set_grade_filter(&mut self, grade: Option<Grade>) {
        if let Some(loaded) = self.loaded_mut() {
            loaded.view.set_grade_filter(grade);
        }
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        if let Some(loaded) = self.loaded_mut() {
            loaded.view.toggle_sort(key);
        }
    }

    /// Only the configured page sizes are accepted.
    pub fn set_page_size(&mut self, page_size: usize) {
        if !self.config.view.allows(page_size) {
            log::warn!("Ignoring page size {page_size}: not one of {:?}", self.config.view.page_sizes);
            return;
        }
        if let Some(loaded) = self.loaded_mut() {
            loaded.view.set_page_size(page_size);
        }
    }

    /// Jump to `page`, clamped to the pages the current filter produces.
    pub fn set_page(&mut self, page: usize) {
        if let Some(loaded) = self.loaded_mut() {
            let count = loaded.page_count();
            loaded.view.set_page(page, count);
        }
    }

    /// Select the row at `position` in the dataset; out of range clears.
    pub fn select_record(&mut self, position: Option<usize>) {
        if let Some(loaded) = self.loaded_mut() {
            loaded.selected = position.filter(|&i| i < loaded.dataset.records.len());
        }
    }

    pub fn current_page(&self) -> Option<Page<'_>> {
        self.loaded()
            .map(|l| view::render_page(&l.dataset.records, &l.view))
    }

    pub fn selected_recommendation(&self) -> Option<(&PredictionRecord, Recommendation)> {
        let loaded = self.loaded()?;
        let record = loaded.dataset.records.get(loaded.selected?)?;
        Some((record, recommend::recommend_for_record(record)))
    }

    // -- Export --

    /// Filtered and sorted rows, across all pages.
    pub fn export_rows(&self) -> Vec<&PredictionRecord> {
        self.loaded()
            .map(|l| view::sorted_view(&l.dataset.records, &l.view))
            .unwrap_or_default()
    }

    pub fn export_file_name(&self, date: NaiveDate) -> Option<String> {
        self.loaded().map(|l| {
            export::export_file_name(&self.config.export.prefix, &l.dataset.summary.filename, date)
        })
    }

    pub fn export_to(&mut self, path: &Path) -> Result<()> {
        if self.loaded().is_none() {
            anyhow::bail!("No dataset loaded");
        }
        let rows = self.export_rows();
        let count = rows.len();
        export::save_view(path, &rows).context("Export failed")?;
        self.status_message = Some(format!("Exported {count} rows to {}", path.display()));
        Ok(())
    }
}
