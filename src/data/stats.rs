use std::collections::BTreeMap;

use super::category::{CategoryTable, PerformanceTier};
use super::model::{Grade, PredictionRecord};
use crate::recommend::Urgency;

// ---------------------------------------------------------------------------
// Quartiles
// ---------------------------------------------------------------------------

/// Median and quartiles read straight out of a sorted copy of the scores,
/// at indices `n/2`, `n/4` and `3n/4` (floored, no interpolation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    /// `None` for an empty slice.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        Some(Self {
            q1: sorted[n / 4],
            median: sorted[n / 2],
            q3: sorted[(n * 3) / 4],
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

// ---------------------------------------------------------------------------
// AggregateStatistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GradeShare {
    pub count: usize,
    /// Share of the whole dataset, 0–100.
    pub percentage: f64,
}

/// Overall verdict on a batch, keyed on the 0–100 mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAssessment {
    Good,
    NeedsSupport,
    NeedsIntervention,
}

impl GroupAssessment {
    pub fn from_mean_100(mean: f64) -> Self {
        if mean >= 75.0 {
            GroupAssessment::Good
        } else if mean >= 65.0 {
            GroupAssessment::NeedsSupport
        } else {
            GroupAssessment::NeedsIntervention
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            GroupAssessment::Good => "The group shows good overall academic performance.",
            GroupAssessment::NeedsSupport => {
                "The group shows moderate performance; some students need additional support."
            }
            GroupAssessment::NeedsIntervention => {
                "The group needs significant academic intervention."
            }
        }
    }

    pub fn urgency(self) -> Urgency {
        match self {
            GroupAssessment::Good => Urgency::Success,
            GroupAssessment::NeedsSupport => Urgency::Warning,
            GroupAssessment::NeedsIntervention => Urgency::Error,
        }
    }
}

/// Batch-level advice derived from the tier counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub urgency: Urgency,
    pub message: String,
}

/// Summary figures over the full, unfiltered dataset.
///
/// Computed once per load; filtering and paging never touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStatistics {
    pub total: usize,
    pub mean_100: f64,
    pub mean_20: f64,
    pub min_100: f64,
    pub max_100: f64,
    /// Population standard deviation of the 0–100 scores.
    pub std_100: f64,
    pub quartiles: Quartiles,
    /// Every grade is present, with a zero share when unused.
    pub grades: BTreeMap<Grade, GradeShare>,
    /// Every tier is present, with a zero count when unused.
    pub tiers: BTreeMap<PerformanceTier, usize>,
}

impl AggregateStatistics {
    /// `None` when there are no records; there is nothing to summarise.
    pub fn compute(records: &[PredictionRecord], categories: &CategoryTable) -> Option<Self> {
        let scores: Vec<f64> = records.iter().map(|r| r.score_100).collect();
        let quartiles = Quartiles::from_scores(&scores)?;

        let n = records.len() as f64;
        let mean_100 = scores.iter().sum::<f64>() / n;
        let mean_20 = records.iter().map(|r| r.score_20).sum::<f64>() / n;
        let min_100 = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max_100 = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = scores.iter().map(|s| (s - mean_100).powi(2)).sum::<f64>() / n;

        let mut grades: BTreeMap<Grade, GradeShare> =
            Grade::ALL.iter().map(|g| (*g, GradeShare::default())).collect();
        let mut tiers: BTreeMap<PerformanceTier, usize> =
            categories.iter().map(|c| (c.tier, 0)).collect();
        for rec in records {
            if let Some(share) = grades.get_mut(&rec.grade) {
                share.count += 1;
            }
            *tiers.entry(categories.classify(rec.score_20).tier).or_default() += 1;
        }
        for share in grades.values_mut() {
            share.percentage = share.count as f64 / n * 100.0;
        }

        Some(Self {
            total: records.len(),
            mean_100,
            mean_20,
            min_100,
            max_100,
            std_100: variance.sqrt(),
            quartiles,
            grades,
            tiers,
        })
    }

    /// `max - min` on the 0–100 scale.
    pub fn range(&self) -> f64 {
        self.max_100 - self.min_100
    }

    pub fn grade_share(&self, grade: Grade) -> GradeShare {
        self.grades.get(&grade).copied().unwrap_or_default()
    }

    pub fn tier_count(&self, tier: PerformanceTier) -> usize {
        self.tiers.get(&tier).copied().unwrap_or(0)
    }

    pub fn assessment(&self) -> GroupAssessment {
        GroupAssessment::from_mean_100(self.mean_100)
    }

    /// One advisory per non-empty at-risk, follow-up or excellent tier.
    pub fn advisories(&self) -> Vec<Advisory> {
        let mut out = Vec::new();
        let at_risk = self.tier_count(PerformanceTier::Regular);
        if at_risk > 0 {
            out.push(Advisory {
                urgency: Urgency::Error,
                message: format!("{at_risk} student(s) need immediate academic attention"),
            });
        }
        let follow_up = self.tier_count(PerformanceTier::Good);
        if follow_up > 0 {
            out.push(Advisory {
                urgency: Urgency::Warning,
                message: format!("{follow_up} student(s) would benefit from close follow-up"),
            });
        }
        let excellent = self.tier_count(PerformanceTier::Excellent);
        if excellent > 0 {
            out.push(Advisory {
                urgency: Urgency::Success,
                message: format!("{excellent} student(s) with excellent results could tutor their peers"),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::OriginalData;

    fn records(scores: &[f64]) -> Vec<PredictionRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| PredictionRecord::new(i as i64 + 1, *s, OriginalData::new()))
            .collect()
    }

    #[test]
    fn quartiles_use_floored_indices() {
        let scores: Vec<f64> = (1..=10).map(|i| (i * 10) as f64).collect();
        let q = Quartiles::from_scores(&scores).unwrap();
        assert_eq!(q.median, 60.0);
        assert_eq!(q.q1, 30.0);
        assert_eq!(q.q3, 80.0);
        assert_eq!(q.iqr(), 50.0);
    }

    #[test]
    fn quartiles_ignore_input_order() {
        let q = Quartiles::from_scores(&[80.0, 20.0, 50.0]).unwrap();
        assert_eq!(q.median, 50.0);
        assert_eq!(q.q1, 20.0);
        assert_eq!(q.q3, 80.0);
        assert!(Quartiles::from_scores(&[]).is_none());
    }

    #[test]
    fn basic_figures() {
        let table = CategoryTable::standard();
        let stats = AggregateStatistics::compute(&records(&[73.0, 59.0, 91.0]), &table).unwrap();
        assert_eq!(stats.total, 3);
        assert!((stats.mean_100 - 74.333_333).abs() < 1e-4);
        assert!((stats.mean_20 - stats.mean_100 * 0.2).abs() < 1e-9);
        assert_eq!(stats.min_100, 59.0);
        assert_eq!(stats.max_100, 91.0);
        assert_eq!(stats.range(), 32.0);
        // population std of {73, 59, 91}
        assert!((stats.std_100 - 13.097_921).abs() < 1e-4);
    }

    #[test]
    fn grade_shares_cover_all_grades() {
        let table = CategoryTable::standard();
        let stats =
            AggregateStatistics::compute(&records(&[95.0, 91.0, 80.0, 40.0]), &table).unwrap();
        assert_eq!(stats.grades.len(), 4);
        assert_eq!(stats.grade_share(Grade::AD).count, 2);
        assert_eq!(stats.grade_share(Grade::AD).percentage, 50.0);
        assert_eq!(stats.grade_share(Grade::B).count, 0);
        let total: usize = stats.grades.values().map(|s| s.count).sum();
        assert_eq!(total, 4);
        let pct: f64 = stats.grades.values().map(|s| s.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn tiers_and_advisories() {
        let table = CategoryTable::standard();
        // 20-scale: 19, 12, 8, 15
        let stats =
            AggregateStatistics::compute(&records(&[95.0, 60.0, 40.0, 75.0]), &table).unwrap();
        assert_eq!(stats.tier_count(PerformanceTier::Excellent), 1);
        assert_eq!(stats.tier_count(PerformanceTier::VeryGood), 1);
        assert_eq!(stats.tier_count(PerformanceTier::Good), 1);
        assert_eq!(stats.tier_count(PerformanceTier::Regular), 1);

        let advisories = stats.advisories();
        let urgencies: Vec<_> = advisories.iter().map(|a| a.urgency).collect();
        assert_eq!(urgencies, vec![Urgency::Error, Urgency::Warning, Urgency::Success]);
        assert!(advisories[0].message.starts_with('1'));
    }

    #[test]
    fn group_assessment_thresholds() {
        assert_eq!(GroupAssessment::from_mean_100(75.0), GroupAssessment::Good);
        assert_eq!(GroupAssessment::from_mean_100(70.0), GroupAssessment::NeedsSupport);
        assert_eq!(GroupAssessment::from_mean_100(64.9), GroupAssessment::NeedsIntervention);
    }

    #[test]
    fn empty_dataset_has_no_statistics() {
        assert!(AggregateStatistics::compute(&[], &CategoryTable::standard()).is_none());
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let table = CategoryTable::standard();
        let recs = records(&[12.5, 99.9, 61.3, 77.7, 45.05, 90.0]);
        let a = AggregateStatistics::compute(&recs, &table).unwrap();
        let b = AggregateStatistics::compute(&recs, &table).unwrap();
        assert_eq!(a.mean_100.to_bits(), b.mean_100.to_bits());
        assert_eq!(a.std_100.to_bits(), b.std_100.to_bits());
        assert_eq!(a, b);
    }
}
