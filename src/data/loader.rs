use std::path::Path;

use thiserror::Error;

use super::model::{BatchDataset, DatasetSummary, FieldValue, OriginalData, PredictionRecord};
use super::student::{StudentProfile, NUMERIC_FALLBACK};
use crate::config::{UploadKind, UploadLimits};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can stop a file from becoming a dataset. The messages are
/// shown to the user as-is.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid file type: '{filename}' is not a .{expected} file")]
    InvalidFileType { filename: String, expected: String },

    #[error("File too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Empty file: '{filename}' contains no data")]
    EmptyFile { filename: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Record {id}: 0-20 score {score_20} does not match 0-100 score {score_100}")]
    ScaleMismatch { id: i64, score_100: f64, score_20: f64 },
}

// ---------------------------------------------------------------------------
// Upload validation
// ---------------------------------------------------------------------------

/// Check the name and size of an upload before its content is touched.
///
/// Order matters: the extension is checked first, then the ceiling for the
/// given upload path, then emptiness.
pub fn validate_upload(
    filename: &str,
    size: u64,
    limits: &UploadLimits,
    kind: UploadKind,
) -> Result<(), IngestError> {
    if !has_extension(filename, &limits.extension) {
        return Err(IngestError::InvalidFileType {
            filename: filename.to_string(),
            expected: limits.extension.clone(),
        });
    }
    let max = limits.max_bytes(kind);
    if size > max {
        return Err(IngestError::FileTooLarge { size, max });
    }
    if size == 0 {
        return Err(IngestError::EmptyFile {
            filename: filename.to_string(),
        });
    }
    Ok(())
}

fn has_extension(filename: &str, expected: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(expected))
}

fn ensure_not_blank(filename: &str, bytes: &[u8]) -> Result<(), IngestError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::EmptyFile {
            filename: filename.to_string(),
        });
    }
    Ok(())
}

/// Display name of a path (its final component).
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validate and read a file from disk. The size is checked from metadata so
/// oversized files are never read into memory.
pub fn read_upload(
    path: &Path,
    limits: &UploadLimits,
    kind: UploadKind,
) -> Result<(String, Vec<u8>), IngestError> {
    let filename = display_name(path);
    let io_err = |source| IngestError::Io {
        path: path.display().to_string(),
        source,
    };
    let size = std::fs::metadata(path).map_err(io_err)?.len();
    validate_upload(&filename, size, limits, kind)?;
    let bytes = std::fs::read(path).map_err(io_err)?;
    ensure_not_blank(&filename, &bytes)?;
    Ok((filename, bytes))
}

// ---------------------------------------------------------------------------
// Results CSV
// ---------------------------------------------------------------------------

/// Load a results file from disk.
pub fn load_file(path: &Path, limits: &UploadLimits) -> Result<BatchDataset, IngestError> {
    let (filename, bytes) = read_upload(path, limits, UploadKind::Dataset)?;
    parse_results(&filename, &bytes)
}

/// Load a results file already held in memory (e.g. dropped onto the window).
pub fn load_bytes(
    filename: &str,
    bytes: &[u8],
    limits: &UploadLimits,
) -> Result<BatchDataset, IngestError> {
    validate_upload(filename, bytes.len() as u64, limits, UploadKind::Dataset)?;
    ensure_not_blank(filename, bytes)?;
    parse_results(filename, bytes)
}

/// Parse results content.
///
/// Layout: one header row (names only, not validated), then positional
/// columns `id, score_100, ...`. Columns after the score are kept as the
/// record's original data, keyed by header name. Quoted cells may contain
/// the delimiter. Blank lines are skipped.
///
/// Coercion never rejects a row: an unparsable id becomes the row's 1-based
/// ordinal and an unparsable score becomes 0. Rows whose score ends up ≤ 0
/// are then dropped.
pub fn parse_results(filename: &str, bytes: &[u8]) -> Result<BatchDataset, IngestError> {
    let (headers, rows) = read_rows(bytes)?;

    let mut records = Vec::new();
    let mut total = 0usize;

    for fields in rows {
        total += 1;

        let id = coerce_id(fields.first().map(String::as_str), total);
        let score_100 = coerce_score(fields.get(1).map(String::as_str), total);
        if score_100 <= 0.0 {
            log::warn!("Row {total} of {filename}: dropped, score {score_100} is not positive");
            continue;
        }

        let mut original_data = OriginalData::new();
        for (idx, value) in fields.iter().enumerate().skip(2) {
            let key = headers
                .get(idx)
                .filter(|h| !h.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("column_{}", idx + 1));
            original_data.insert(key, FieldValue::guess(value));
        }

        records.push(PredictionRecord::new(id, score_100, original_data));
    }

    let summary = DatasetSummary {
        filename: filename.to_string(),
        total_records: total,
        processed_successfully: records.len(),
    };
    Ok(BatchDataset::new(summary, records))
}

/// Split content into a header and data rows. Records whose cells are all
/// blank are discarded first, so the header is the first non-blank line even
/// when whitespace-only lines precede it.
fn read_rows(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let fields = decode_fields(&result?);
        if is_blank(&fields) {
            continue;
        }
        match headers {
            None => headers = Some(header_names(fields)),
            Some(_) => rows.push(fields),
        }
    }
    Ok((headers.unwrap_or_default(), rows))
}

fn header_names(mut fields: Vec<String>) -> Vec<String> {
    if let Some(first) = fields.first_mut() {
        *first = first.trim_start_matches('\u{feff}').trim().to_string();
    }
    fields
}

/// Cells are decoded lossily so one bad byte sequence degrades a single
/// cell instead of failing the file.
fn decode_fields(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|f| String::from_utf8_lossy(f).trim().to_string())
        .collect()
}

fn is_blank(fields: &[String]) -> bool {
    fields.iter().all(|f| f.is_empty())
}

fn coerce_id(raw: Option<&str>, ordinal: usize) -> i64 {
    let raw = raw.unwrap_or("");
    if let Ok(id) = raw.parse::<i64>() {
        return id;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
        _ => {
            log::debug!("Row {ordinal}: id '{raw}' is not an integer, using {ordinal}");
            ordinal as i64
        }
    }
}

fn coerce_score(raw: Option<&str>, ordinal: usize) -> f64 {
    let raw = raw.unwrap_or("");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            log::debug!("Row {ordinal}: score '{raw}' is not a number, using {NUMERIC_FALLBACK}");
            NUMERIC_FALLBACK
        }
    }
}

// ---------------------------------------------------------------------------
// Student-attribute CSV (form-assisted batch upload)
// ---------------------------------------------------------------------------

/// Cleaned student rows ready to be sent for scoring.
#[derive(Debug, Clone)]
pub struct StudentBatch {
    pub filename: String,
    /// Data rows seen, before invalid rows were dropped.
    pub total_rows: usize,
    pub profiles: Vec<StudentProfile>,
}

impl StudentBatch {
    /// Re-serialise the cleaned rows with the service's column names.
    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for profile in &self.profiles {
            writer.serialize(profile)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Load a student-attribute file from disk under the form-batch size limit.
pub fn load_student_file(path: &Path, limits: &UploadLimits) -> Result<StudentBatch, IngestError> {
    let (filename, bytes) = read_upload(path, limits, UploadKind::FormBatch)?;
    parse_students(&filename, &bytes)
}

/// Parse student attributes positionally (see [`StudentProfile::from_fields`]).
/// Rows without study hours are dropped.
pub fn parse_students(filename: &str, bytes: &[u8]) -> Result<StudentBatch, IngestError> {
    let (_, rows) = read_rows(bytes)?;

    let mut profiles = Vec::new();
    let mut total_rows = 0usize;
    for fields in rows {
        total_rows += 1;
        let profile = StudentProfile::from_fields(&fields);
        if !profile.is_valid() {
            log::warn!("Row {total_rows} of {filename}: dropped, no study hours");
            continue;
        }
        profiles.push(profile);
    }

    Ok(StudentBatch {
        filename: filename.to_string(),
        total_rows,
        profiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Grade;

    fn limits() -> UploadLimits {
        UploadLimits::default()
    }

    #[test]
    fn rejects_wrong_extension() {
        let err = load_bytes("scores.xlsx", b"id,score\n1,80\n", &limits()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidFileType { .. }));
        assert!(err.to_string().starts_with("Invalid file type"));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(load_bytes("SCORES.CSV", b"id,score\n1,80\n", &limits()).is_ok());
    }

    #[test]
    fn rejects_oversized_file_per_upload_path() {
        let limits = UploadLimits {
            dataset_max_bytes: 100,
            form_batch_max_bytes: 10,
            ..UploadLimits::default()
        };
        let err = validate_upload("a.csv", 101, &limits, UploadKind::Dataset).unwrap_err();
        assert!(matches!(err, IngestError::FileTooLarge { size: 101, max: 100 }));
        assert!(validate_upload("a.csv", 50, &limits, UploadKind::Dataset).is_ok());
        assert!(validate_upload("a.csv", 50, &limits, UploadKind::FormBatch).is_err());
    }

    #[test]
    fn rejects_empty_and_whitespace_only_files() {
        assert!(matches!(
            load_bytes("a.csv", b"", &limits()),
            Err(IngestError::EmptyFile { .. })
        ));
        assert!(matches!(
            load_bytes("a.csv", b"\n  \r\n", &limits()),
            Err(IngestError::EmptyFile { .. })
        ));
    }

    #[test]
    fn respects_quoted_delimiters() {
        let csv = "id,score,name,school\n1,80,\"Doe, Jane\",North\n2,65.5,\"Roe, Rick\",South\n";
        let ds = parse_results("q.csv", csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.records[0].original_data.get("name"),
            Some(&FieldValue::String("Doe, Jane".into()))
        );
        assert_eq!(
            ds.records[1].original_data.get("school"),
            Some(&FieldValue::String("South".into()))
        );
        assert_eq!(ds.records[1].score_100, 65.5);
    }

    #[test]
    fn skips_blank_lines_and_header() {
        let csv = "\nid,score\n\n1,91\n   \n2,73\r\n\n";
        let ds = parse_results("b.csv", csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.summary.total_records, 2);
        assert_eq!(ds.records[0].grade, Grade::AD);
    }

    #[test]
    fn whitespace_line_before_header_is_not_the_header() {
        let csv = "   \nid,score,Hours_Studied\n1,80,12\n";
        let ds = parse_results("w.csv", csv.as_bytes()).unwrap();
        assert_eq!(ds.summary.total_records, 1);
        assert_eq!(ds.summary.processed_successfully, 1);
        let keys: Vec<&str> = ds.records[0].original_data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Hours_Studied"]);

        let batch = parse_students("s.csv", b" \t \nHours_Studied,Attendance\n10,90\n").unwrap();
        assert_eq!(batch.total_rows, 1);
        assert_eq!(batch.profiles.len(), 1);
    }

    #[test]
    fn coerces_instead_of_rejecting() {
        let csv = "id,score,hours\nabc,77,x\n4.0,81,\n";
        let ds = parse_results("c.csv", csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].id, 1);
        assert_eq!(ds.records[0].original_data.get("hours"), Some(&FieldValue::String("x".into())));
        assert_eq!(ds.records[1].id, 4);
        assert_eq!(ds.records[1].original_data.get("hours"), Some(&FieldValue::Null));
    }

    #[test]
    fn drops_rows_without_positive_score() {
        let csv = "id,score\n1,80\n2,not-a-number\n3,0\n4,-5\n5,\n6,55\n";
        let ds = parse_results("d.csv", csv.as_bytes()).unwrap();
        let ids: Vec<i64> = ds.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 6]);
        assert_eq!(ds.summary.total_records, 6);
        assert_eq!(ds.summary.processed_successfully, 2);
    }

    #[test]
    fn extra_cells_without_header_get_positional_names() {
        let csv = "id,score\n1,80,extra\n";
        let ds = parse_results("e.csv", csv.as_bytes()).unwrap();
        assert_eq!(
            ds.records[0].original_data.get("column_3"),
            Some(&FieldValue::String("extra".into()))
        );
    }

    #[test]
    fn header_only_file_yields_empty_dataset() {
        let ds = load_bytes("h.csv", b"id,score\n", &limits()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.summary.filename, "h.csv");
    }

    #[test]
    fn student_rows_are_cleaned_and_reserialised() {
        let csv = "Hours_Studied,Attendance,Previous_Scores,Tutoring_Sessions\n\
                   12,90,80,2\n\
                   0,85,70,1\n\
                   \"7\",bad,65,0\n";
        let batch = parse_students("s.csv", csv.as_bytes()).unwrap();
        assert_eq!(batch.total_rows, 3);
        assert_eq!(batch.profiles.len(), 2);
        assert_eq!(batch.profiles[1].attendance, 0.0);
        assert_eq!(batch.profiles[1].motivation_level, "Medium");

        let out = String::from_utf8(batch.to_csv().unwrap()).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("Hours_Studied,Attendance,"));
        assert_eq!(lines.count(), 2);
    }
}
