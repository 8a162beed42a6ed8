use serde::{Deserialize, Serialize};

use crate::recommend::StudyInputs;

// Allowed values per categorical column. Anything else is replaced by the
// column's neutral default.
pub const LEVELS: &[&str] = &["Low", "Medium", "High"];
pub const YES_NO: &[&str] = &["Yes", "No"];
pub const PEER: &[&str] = &["Negative", "Neutral", "Positive"];
pub const EDUCATION: &[&str] = &[
    "High School",
    "College",
    "Bachelor",
    "Master",
    "Postgraduate",
    "PhD",
];
pub const DISTANCE: &[&str] = &["Near", "Moderate", "Far"];

/// Value substituted for numeric cells that do not parse.
pub const NUMERIC_FALLBACK: f64 = 0.0;

/// Student attributes in the column order and naming the prediction service
/// expects. Serialises to both the JSON request body and the CSV upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(rename = "Hours_Studied")]
    pub hours_studied: f64,
    #[serde(rename = "Attendance")]
    pub attendance: f64,
    #[serde(rename = "Previous_Scores")]
    pub previous_scores: f64,
    #[serde(rename = "Tutoring_Sessions")]
    pub tutoring_sessions: f64,
    #[serde(rename = "Parental_Involvement")]
    pub parental_involvement: String,
    #[serde(rename = "Access_to_Resources")]
    pub access_to_resources: String,
    #[serde(rename = "Extracurricular_Activities")]
    pub extracurricular_activities: String,
    #[serde(rename = "Motivation_Level")]
    pub motivation_level: String,
    #[serde(rename = "Family_Income")]
    pub family_income: String,
    #[serde(rename = "Teacher_Quality")]
    pub teacher_quality: String,
    #[serde(rename = "Peer_Influence")]
    pub peer_influence: String,
    #[serde(rename = "Learning_Disabilities")]
    pub learning_disabilities: String,
    #[serde(rename = "Parental_Education_Level")]
    pub parental_education_level: String,
    #[serde(rename = "Distance_from_Home")]
    pub distance_from_home: String,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self::from_fields(&[])
    }
}

impl StudentProfile {
    /// Build a profile from positional cells, coercing each column and
    /// substituting its default instead of rejecting the row.
    pub fn from_fields(fields: &[String]) -> Self {
        Self {
            hours_studied: numeric(fields, 0),
            attendance: numeric(fields, 1),
            previous_scores: numeric(fields, 2),
            tutoring_sessions: numeric(fields, 3),
            parental_involvement: category(fields, 4, LEVELS, "Medium"),
            access_to_resources: category(fields, 5, LEVELS, "Medium"),
            extracurricular_activities: category(fields, 6, YES_NO, "No"),
            motivation_level: category(fields, 7, LEVELS, "Medium"),
            family_income: category(fields, 8, LEVELS, "Medium"),
            teacher_quality: category(fields, 9, LEVELS, "Medium"),
            peer_influence: category(fields, 10, PEER, "Neutral"),
            learning_disabilities: category(fields, 11, YES_NO, "No"),
            parental_education_level: category(fields, 12, EDUCATION, "College"),
            distance_from_home: category(fields, 13, DISTANCE, "Moderate"),
        }
    }

    /// Study hours are the primary field; a student without any is not scorable.
    pub fn is_valid(&self) -> bool {
        self.hours_studied > 0.0
    }

    pub fn study_inputs(&self) -> StudyInputs {
        StudyInputs {
            study_hours: Some(self.hours_studied),
            attendance: Some(self.attendance),
            tutoring_sessions: Some(self.tutoring_sessions),
        }
    }
}

fn numeric(fields: &[String], idx: usize) -> f64 {
    fields
        .get(idx)
        .and_then(|f| f.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(NUMERIC_FALLBACK)
}

fn category(fields: &[String], idx: usize, allowed: &[&str], default: &str) -> String {
    let raw = fields.get(idx).map(|f| f.trim()).unwrap_or("");
    allowed
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(raw))
        .unwrap_or(&default)
        .to_string()
}
