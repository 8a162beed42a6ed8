//! Rule-based recommendation classifier.
//!
//! A pure function of a 20-point score and a handful of study habits. The
//! thresholds are fixed so the same inputs always yield the same advice.

use crate::data::model::{FieldValue, PredictionRecord};

/// Upper bound on suggestions returned for one student.
pub const MAX_SUGGESTIONS: usize = 5;

/// Provenance tag carried by every [`Recommendation`] built here.
pub const RULE_BASED: &str = "rule-based";

/// Original-data columns read by [`StudyInputs::from_record`].
const HOURS_KEY: &str = "Hours_Studied";
const ATTENDANCE_KEY: &str = "Attendance";
const TUTORING_KEY: &str = "Tutoring_Sessions";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Raw habits that feed the classifier. A missing value skips every rule
/// that depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StudyInputs {
    /// Weekly study hours.
    pub study_hours: Option<f64>,
    /// Attendance percentage, 0–100.
    pub attendance: Option<f64>,
    pub tutoring_sessions: Option<f64>,
}

impl StudyInputs {
    /// Pull the habit columns out of a record's original data, if present.
    pub fn from_record(record: &PredictionRecord) -> Self {
        let numeric = |key: &str| record.field(key).and_then(FieldValue::as_f64);
        Self {
            study_hours: numeric(HOURS_KEY),
            attendance: numeric(ATTENDANCE_KEY),
            tutoring_sessions: numeric(TUTORING_KEY),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Success,
    Warning,
    Error,
}

impl Urgency {
    /// ≥ 14 success, ≥ 11 warning, otherwise error.
    pub fn from_score_20(score_20: f64) -> Self {
        if score_20 >= 14.0 {
            Urgency::Success
        } else if score_20 >= 11.0 {
            Urgency::Warning
        } else {
            Urgency::Error
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Success => "success",
            Urgency::Warning => "warning",
            Urgency::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Ordered, most specific first.
    pub suggestions: Vec<String>,
    pub risk_factors: Vec<String>,
    pub strengths: Vec<String>,
    pub urgency: Urgency,
    pub source: &'static str,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Build the advice for one student.
///
/// Habit-specific suggestions come first, followed by the generic advice for
/// the score's tier; the combined list is cut to [`MAX_SUGGESTIONS`].
pub fn recommend(score_20: f64, inputs: &StudyInputs) -> Recommendation {
    let mut suggestions: Vec<String> = habit_suggestions(score_20, inputs)
        .into_iter()
        .chain(tier_suggestions(score_20).iter().copied())
        .map(str::to_string)
        .collect();
    dedup_preserving_order(&mut suggestions);
    suggestions.truncate(MAX_SUGGESTIONS);

    Recommendation {
        suggestions,
        risk_factors: risk_factors(score_20, inputs),
        strengths: strengths(score_20, inputs),
        urgency: Urgency::from_score_20(score_20),
        source: RULE_BASED,
    }
}

/// Convenience wrapper for a table row.
pub fn recommend_for_record(record: &PredictionRecord) -> Recommendation {
    recommend(record.score_20, &StudyInputs::from_record(record))
}

fn habit_suggestions(score_20: f64, inputs: &StudyInputs) -> Vec<&'static str> {
    let mut out = Vec::new();
    if inputs.study_hours.is_some_and(|h| h < 10.0) {
        out.push("Raise weekly study time to at least 10 hours");
    }
    if inputs.attendance.is_some_and(|a| a < 70.0) {
        out.push("Improve class attendance above 70%");
    }
    if inputs.tutoring_sessions.is_some_and(|t| t == 0.0) && score_20 < 14.0 {
        out.push("Book tutoring sessions for the weakest subjects");
    }
    out
}

fn tier_suggestions(score_20: f64) -> &'static [&'static str] {
    if score_20 >= 18.0 {
        &[
            "Keep up the excellent performance with regular study",
            "Consider leading study groups to help classmates",
            "Explore advanced topics related to your subjects",
        ]
    } else if score_20 >= 14.0 {
        &[
            "Increase study hours slightly",
            "Review and reinforce fundamental concepts",
            "Consider tutoring sessions for specific topics",
        ]
    } else if score_20 >= 11.0 {
        &[
            "Increase study time significantly",
            "Adopt more effective study techniques",
            "Look for additional academic support",
            "Set up a structured study schedule",
        ]
    } else {
        &[
            "Increase study hours urgently",
            "Seek specialised academic tutoring",
            "Review your study methods from the ground up",
            "Consider educational psychology support",
            "Set specific daily study goals",
        ]
    }
}

fn risk_factors(score_20: f64, inputs: &StudyInputs) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.study_hours.is_some_and(|h| h < 10.0) {
        out.push("Insufficient study hours (under 10 per week)".to_string());
    }
    if inputs.attendance.is_some_and(|a| a < 70.0) {
        out.push("Low attendance (under 70%)".to_string());
    }
    if inputs.tutoring_sessions.is_some_and(|t| t == 0.0) && score_20 < 14.0 {
        out.push("No additional academic support".to_string());
    }
    out
}

fn strengths(score_20: f64, inputs: &StudyInputs) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.study_hours.is_some_and(|h| h >= 15.0) {
        out.push("Strong dedication to study".to_string());
    }
    if inputs.attendance.is_some_and(|a| a >= 90.0) {
        out.push("Consistent attendance".to_string());
    }
    if inputs.tutoring_sessions.is_some_and(|t| t > 2.0) {
        out.push("Proactively seeks academic support".to_string());
    }
    if score_20 >= 14.0 {
        out.push("Favourable performance prediction".to_string());
    }
    out
}

fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::OriginalData;

    fn inputs(hours: f64, attendance: f64, tutoring: f64) -> StudyInputs {
        StudyInputs {
            study_hours: Some(hours),
            attendance: Some(attendance),
            tutoring_sessions: Some(tutoring),
        }
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::from_score_20(19.0), Urgency::Success);
        assert_eq!(Urgency::from_score_20(14.0), Urgency::Success);
        assert_eq!(Urgency::from_score_20(13.9), Urgency::Warning);
        assert_eq!(Urgency::from_score_20(11.0), Urgency::Warning);
        assert_eq!(Urgency::from_score_20(10.9), Urgency::Error);
    }

    #[test]
    fn strong_student_gets_tier_advice_only() {
        let rec = recommend(18.5, &inputs(20.0, 95.0, 3.0));
        assert_eq!(rec.urgency, Urgency::Success);
        assert_eq!(rec.suggestions.len(), 3);
        assert!(rec.suggestions[0].starts_with("Keep up"));
        assert!(rec.risk_factors.is_empty());
        assert_eq!(rec.strengths.len(), 4);
        assert_eq!(rec.source, RULE_BASED);
    }

    #[test]
    fn habits_come_first_and_list_is_capped() {
        let rec = recommend(8.0, &inputs(4.0, 60.0, 0.0));
        assert_eq!(rec.urgency, Urgency::Error);
        assert_eq!(rec.suggestions.len(), MAX_SUGGESTIONS);
        assert!(rec.suggestions[0].contains("10 hours"));
        assert!(rec.suggestions[1].contains("attendance"));
        assert!(rec.suggestions[2].contains("tutoring"));
        assert_eq!(rec.suggestions[3], "Increase study hours urgently");
        assert_eq!(rec.risk_factors.len(), 3);
    }

    #[test]
    fn tutoring_rule_only_applies_below_14() {
        let high = recommend(15.0, &inputs(12.0, 80.0, 0.0));
        assert!(high.suggestions.iter().all(|s| !s.contains("Book tutoring")));
        let low = recommend(12.0, &inputs(12.0, 80.0, 0.0));
        assert!(low.suggestions[0].contains("Book tutoring"));
    }

    #[test]
    fn missing_inputs_skip_habit_rules() {
        let rec = recommend(12.0, &StudyInputs::default());
        assert_eq!(rec.urgency, Urgency::Warning);
        assert_eq!(rec.suggestions.len(), 4);
        assert!(rec.risk_factors.is_empty());
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let a = recommend(11.4, &inputs(9.0, 71.0, 1.0));
        let b = recommend(11.4, &inputs(9.0, 71.0, 1.0));
        assert_eq!(a, b);
    }

    #[test]
    fn reads_habits_from_original_data() {
        let mut data = OriginalData::new();
        data.insert("hours_studied".into(), FieldValue::Integer(6));
        data.insert("Attendance".into(), FieldValue::String("88".into()));
        let record = PredictionRecord::new(1, 55.0, data);
        let found = StudyInputs::from_record(&record);
        assert_eq!(found.study_hours, Some(6.0));
        assert_eq!(found.attendance, Some(88.0));
        assert_eq!(found.tutoring_sessions, None);

        let rec = recommend_for_record(&record);
        assert!(rec.suggestions[0].contains("10 hours"));
    }
}
