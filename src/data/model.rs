use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Scales
// ---------------------------------------------------------------------------

/// Factor converting the 0–100 scale into the 0–20 scale.
pub const SCALE_20_FACTOR: f64 = 0.2;

/// Convert a 0–100 score into the 0–20 scale.
pub fn to_scale_20(score_100: f64) -> f64 {
    score_100 * SCALE_20_FACTOR
}

// ---------------------------------------------------------------------------
// Grade – the closed set of letter grades
// ---------------------------------------------------------------------------

/// Letter grade derived from the 0–100 score.
///
/// Declaration order is achievement order, so `Grade::C < Grade::AD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    C,
    B,
    A,
    AD,
}

impl Grade {
    /// All grades in display order (best first).
    pub const ALL: [Grade; 4] = [Grade::AD, Grade::A, Grade::B, Grade::C];

    /// Threshold the 0–100 score: AD ≥ 90, A ≥ 75, B ≥ 60, otherwise C.
    pub fn from_score_100(score: f64) -> Self {
        if score >= 90.0 {
            Grade::AD
        } else if score >= 75.0 {
            Grade::A
        } else if score >= 60.0 {
            Grade::B
        } else {
            Grade::C
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::AD => "AD",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
        }
    }

    /// Short qualitative name shown next to the letter in filter menus.
    pub fn description(self) -> &'static str {
        match self {
            Grade::AD => "Outstanding",
            Grade::A => "Good",
            Grade::B => "Satisfactory",
            Grade::C => "In progress",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown letter grade '{0}'")]
pub struct UnknownGrade(pub String);

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AD" => Ok(Grade::AD),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            _ => Err(UnknownGrade(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldValue – one cell of the original input data
// ---------------------------------------------------------------------------

/// A dynamically-typed value from a record's original input columns.
/// The analytics never interpret these; they are carried for display and for
/// the recommendation lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so FieldValue can live in ordered collections --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::String(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Numeric view of the value. Numeric-looking strings count too, since
    /// upstream payloads are not consistent about quoting numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Infer the type of a raw text cell.
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return FieldValue::Float(f);
        }
        if s == "true" || s == "false" {
            return FieldValue::Bool(s == "true");
        }
        FieldValue::String(s.to_string())
    }

    pub fn from_json(val: &serde_json::Value) -> Self {
        use serde_json::Value as JsonValue;
        match val {
            JsonValue::String(s) => FieldValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Null => FieldValue::Null,
            other => FieldValue::String(other.to_string()),
        }
    }
}

/// Original input columns of one record: column name → value.
pub type OriginalData = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// PredictionRecord – one row of a processed batch
// ---------------------------------------------------------------------------

/// One scored student. Constructed through [`PredictionRecord::new`], which
/// derives the 20-point score and the grade so the two scales never drift.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub id: i64,
    /// Predicted score, 0–100.
    pub score_100: f64,
    /// `score_100 * 0.2`.
    pub score_20: f64,
    pub grade: Grade,
    pub original_data: OriginalData,
}

impl PredictionRecord {
    pub fn new(id: i64, score_100: f64, original_data: OriginalData) -> Self {
        Self {
            id,
            score_100,
            score_20: to_scale_20(score_100),
            grade: Grade::from_score_100(score_100),
            original_data,
        }
    }

    /// Look up an original column by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.original_data
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

// ---------------------------------------------------------------------------
// BatchDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub filename: String,
    /// Data rows seen in the source, before invalid rows were dropped.
    pub total_records: usize,
    pub processed_successfully: usize,
}

/// An immutable snapshot of one loaded batch. Cloning shares the records.
#[derive(Debug, Clone)]
pub struct BatchDataset {
    pub summary: DatasetSummary,
    pub records: Arc<[PredictionRecord]>,
    /// Model reported by the prediction service, when the batch came from it.
    pub model_used: Option<String>,
    pub processing_time_secs: Option<f64>,
}

impl BatchDataset {
    pub fn new(summary: DatasetSummary, records: Vec<PredictionRecord>) -> Self {
        Self {
            summary,
            records: records.into(),
            model_used: None,
            processing_time_secs: None,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn secondary_scale_tracks_primary(id in any::<i64>(), score in 0.0f64..=100.0) {
            let rec = PredictionRecord::new(id, score, OriginalData::new());
            prop_assert!((rec.score_20 - score * 0.2).abs() <= 1e-9);
            prop_assert!(rec.score_20 >= 0.0 && rec.score_20 <= 20.0);
        }

        #[test]
        fn grade_is_monotonic(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Grade::from_score_100(lo) <= Grade::from_score_100(hi));
        }
    }
}
