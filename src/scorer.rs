//! Client for the external prediction service.
//!
//! Requests run on a worker thread with a blocking `reqwest` client; the
//! result comes back over an `mpsc` channel that the UI polls each frame.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ScorerConfig;
use crate::data::loader::IngestError;
use crate::data::model::{
    to_scale_20, BatchDataset, DatasetSummary, FieldValue, Grade, OriginalData, PredictionRecord,
};
use crate::data::student::StudentProfile;

/// Largest accepted gap between a reported 0–20 score and `score_100 * 0.2`.
/// The service rounds both scales to two decimals independently.
pub const SCALE_TOLERANCE: f64 = 0.05;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure classes of a scoring request. The messages are user-facing.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("The prediction service did not answer in time. Try again with a smaller file.")]
    Timeout,

    #[error("Cannot reach the prediction service: {0}")]
    Connection(String),

    #[error("Invalid data format: check that the file has the expected columns")]
    InvalidFormat,

    #[error("Internal error in the prediction service")]
    ServerFailure,

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Prediction service returned HTTP {status}")]
    Http { status: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response from the prediction service: {0}")]
    Decode(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("The scoring job stopped without a result")]
    WorkerLost,
}

impl ScorerError {
    /// Map a non-success response. A server-provided `detail` or `message`
    /// string wins over the status-keyed text.
    pub fn from_status(status: u16, body: &str) -> Self {
        if let Some(message) = server_message(body) {
            return ScorerError::Server { status, message };
        }
        match status {
            422 => ScorerError::InvalidFormat,
            500 => ScorerError::ServerFailure,
            _ => ScorerError::Http { status },
        }
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScorerError::Timeout
        } else if err.is_connect() {
            ScorerError::Connection(err.without_url().to_string())
        } else if err.is_decode() {
            ScorerError::Decode(err.to_string())
        } else {
            ScorerError::Transport(err.to_string())
        }
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    pub filename: Option<String>,
    pub total_students: Option<usize>,
    pub processed_successfully: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "estudiante_id")]
    pub student_id: i64,
    pub prediction_100: f64,
    pub prediction_20: Option<f64>,
    pub letter_grade: Option<String>,
    #[serde(default)]
    pub original_data: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceInfo {
    pub model_used: Option<String>,
    pub processing_time_seconds: Option<f64>,
}

/// Batch scoring response. Older service builds put the model name and
/// timing at the top level instead of under `performance`.
/// Aggregate `statistics` are ignored and recomputed locally.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetResponse {
    pub dataset_info: Option<DatasetInfo>,
    pub total_students: Option<usize>,
    pub results: Vec<ResultRow>,
    pub performance: Option<PerformanceInfo>,
    pub model_used: Option<String>,
    pub processing_time: Option<f64>,
}

impl DatasetResponse {
    /// Convert into a dataset, deriving the 0–20 score and grade locally.
    ///
    /// A reported 0–20 score that disagrees with the 0–100 score is an error;
    /// a disagreeing letter grade is logged and replaced.
    pub fn into_dataset(self, upload_name: &str) -> Result<BatchDataset, IngestError> {
        let mut records = Vec::with_capacity(self.results.len());
        for row in self.results {
            check_scale(row.student_id, row.prediction_100, row.prediction_20)?;
            let original_data: OriginalData = row
                .original_data
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                .collect();
            let record = PredictionRecord::new(row.student_id, row.prediction_100, original_data);
            warn_on_grade_mismatch(record.id, record.grade, row.letter_grade.as_deref());
            records.push(record);
        }

        let info = self.dataset_info;
        let summary = DatasetSummary {
            filename: info
                .as_ref()
                .and_then(|i| i.filename.clone())
                .unwrap_or_else(|| upload_name.to_string()),
            total_records: info
                .as_ref()
                .and_then(|i| i.total_students)
                .or(self.total_students)
                .unwrap_or(records.len()),
            processed_successfully: info
                .as_ref()
                .and_then(|i| i.processed_successfully)
                .unwrap_or(records.len()),
        };

        let mut dataset = BatchDataset::new(summary, records);
        let (model, time) = match self.performance {
            Some(p) => (p.model_used, p.processing_time_seconds),
            None => (None, None),
        };
        dataset.model_used = model.or(self.model_used);
        dataset.processing_time_secs = time.or(self.processing_time);
        Ok(dataset)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleResponse {
    pub prediction_100: f64,
    pub prediction_20: Option<f64>,
    pub letter_grade: Option<String>,
    pub confidence: Option<String>,
    pub model_used: Option<String>,
    pub processing_time: Option<f64>,
}

/// One student's prediction, canonical on the 0–100 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SinglePrediction {
    pub score_100: f64,
    pub score_20: f64,
    pub grade: Grade,
    pub confidence: Option<String>,
    pub model_used: Option<String>,
    pub processing_time_secs: Option<f64>,
}

impl SingleResponse {
    pub fn into_prediction(self) -> Result<SinglePrediction, IngestError> {
        check_scale(0, self.prediction_100, self.prediction_20)?;
        let grade = Grade::from_score_100(self.prediction_100);
        warn_on_grade_mismatch(0, grade, self.letter_grade.as_deref());
        Ok(SinglePrediction {
            score_100: self.prediction_100,
            score_20: to_scale_20(self.prediction_100),
            grade,
            confidence: self.confidence,
            model_used: self.model_used,
            processing_time_secs: self.processing_time,
        })
    }
}

fn check_scale(id: i64, score_100: f64, reported_20: Option<f64>) -> Result<(), IngestError> {
    match reported_20 {
        Some(score_20) if (score_20 - to_scale_20(score_100)).abs() > SCALE_TOLERANCE => {
            Err(IngestError::ScaleMismatch { id, score_100, score_20 })
        }
        _ => Ok(()),
    }
}

fn warn_on_grade_mismatch(id: i64, derived: Grade, reported: Option<&str>) {
    match reported.map(str::parse::<Grade>) {
        Some(Ok(grade)) if grade != derived => {
            log::warn!("Record {id}: service grade {grade} differs from derived grade {derived}");
        }
        Some(Err(e)) => log::warn!("Record {id}: {e}, using derived grade {derived}"),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ScorerClient {
    http: reqwest::blocking::Client,
    predict_url: String,
    dataset_url: String,
}

impl ScorerClient {
    pub fn new(config: &ScorerConfig) -> Result<Self, ScorerError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ScorerError::from_transport)?;
        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            predict_url: format!("{base}{}", config.predict_path),
            dataset_url: format!("{base}{}", config.dataset_path),
        })
    }

    /// Upload a CSV file as multipart field `file` and adapt the response.
    pub fn score_dataset(&self, filename: &str, bytes: Vec<u8>) -> Result<BatchDataset, ScorerError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .map_err(ScorerError::from_transport)?;
        let form = Form::new().part("file", part);

        log::info!("Submitting {filename} to {}", self.dataset_url);
        let response = self
            .http
            .post(&self.dataset_url)
            .multipart(form)
            .send()
            .map_err(ScorerError::from_transport)?;
        let body: DatasetResponse = read_json(response)?;
        Ok(body.into_dataset(filename)?)
    }

    pub fn predict_student(&self, profile: &StudentProfile) -> Result<SinglePrediction, ScorerError> {
        let response = self
            .http
            .post(&self.predict_url)
            .json(profile)
            .send()
            .map_err(ScorerError::from_transport)?;
        let body: SingleResponse = read_json(response)?;
        Ok(body.into_prediction()?)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, ScorerError> {
    let status = response.status();
    let body = response.text().map_err(ScorerError::from_transport)?;
    if !status.is_success() {
        return Err(ScorerError::from_status(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| ScorerError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Background job
// ---------------------------------------------------------------------------

/// An in-flight request running on a worker thread.
pub struct Pending<T> {
    /// What is being scored, for the status line.
    pub label: String,
    rx: Receiver<Result<T, ScorerError>>,
}

pub type PendingScore = Pending<BatchDataset>;
pub type PendingPrediction = Pending<SinglePrediction>;

impl<T> Pending<T> {
    /// `None` while the worker is still running.
    pub fn poll(&self) -> Option<Result<T, ScorerError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ScorerError::WorkerLost)),
        }
    }

    /// Wrap an existing receiver. Lets the state machine be driven without
    /// a network.
    pub fn from_receiver(label: &str, rx: Receiver<Result<T, ScorerError>>) -> Self {
        Self {
            label: label.to_string(),
            rx,
        }
    }
}

fn spawn_job<T, F>(label: String, job: F) -> Pending<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ScorerError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let name = label.clone();
    std::thread::spawn(move || {
        let result = job();
        if let Err(e) = &result {
            log::error!("Scoring {name} failed: {e:#}");
        }
        // The receiver is gone if the app was reset or closed meanwhile.
        let _ = tx.send(result);
    });
    Pending { label, rx }
}

/// Score `bytes` on a worker thread. No retry; the caller decides.
pub fn spawn_dataset_scoring(client: Arc<ScorerClient>, filename: String, bytes: Vec<u8>) -> PendingScore {
    let name = filename.clone();
    spawn_job(filename, move || client.score_dataset(&name, bytes))
}

pub fn spawn_student_prediction(client: Arc<ScorerClient>, profile: StudentProfile) -> PendingPrediction {
    spawn_job("student profile".to_string(), move || client.predict_student(&profile))
}
