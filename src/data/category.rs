use std::fmt;

// ---------------------------------------------------------------------------
// Performance tiers on the 20-point scale
// ---------------------------------------------------------------------------

/// The four performance tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerformanceTier {
    Regular,
    Good,
    VeryGood,
    Excellent,
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PerformanceTier::Regular => "regular",
            PerformanceTier::Good => "good",
            PerformanceTier::VeryGood => "very good",
            PerformanceTier::Excellent => "excellent",
        };
        f.write_str(name)
    }
}

/// One row of the category table: a half-open range `[min, max)` on the
/// 20-point scale plus its display text.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceCategory {
    pub tier: PerformanceTier,
    pub min: f64,
    pub max: f64,
    pub label: &'static str,
    pub description: &'static str,
}

impl PerformanceCategory {
    pub fn contains(&self, score_20: f64) -> bool {
        score_20 >= self.min && score_20 < self.max
    }
}

/// Immutable lookup table, built once at start-up and shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    /// Sorted by `min`, ascending, covering `[0, ∞)` without gaps.
    categories: Vec<PerformanceCategory>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CategoryTable {
    /// The grading table used by the prediction service. The top tier is
    /// open-ended so a perfect 20 still lands in it.
    pub fn standard() -> Self {
        Self {
            categories: vec![
                PerformanceCategory {
                    tier: PerformanceTier::Regular,
                    min: 0.0,
                    max: 10.0,
                    label: "C - Regular",
                    description: "Regular performance. Needs attention and additional support.",
                },
                PerformanceCategory {
                    tier: PerformanceTier::Good,
                    min: 10.0,
                    max: 14.0,
                    label: "B - Good",
                    description: "Good performance. Meets the expected standards.",
                },
                PerformanceCategory {
                    tier: PerformanceTier::VeryGood,
                    min: 14.0,
                    max: 18.0,
                    label: "A - Very good",
                    description: "Very good academic performance. Exceeds expectations.",
                },
                PerformanceCategory {
                    tier: PerformanceTier::Excellent,
                    min: 18.0,
                    max: f64::INFINITY,
                    label: "AD - Excellent",
                    description: "Outstanding performance. An exceptional, high-achieving student.",
                },
            ],
        }
    }

    /// Category for a 20-point score. Anything below the lowest range
    /// (negative or NaN scores) falls into the lowest tier.
    pub fn classify(&self, score_20: f64) -> &PerformanceCategory {
        self.categories
            .iter()
            .rev()
            .find(|c| c.contains(score_20))
            .unwrap_or(&self.categories[0])
    }

    pub fn get(&self, tier: PerformanceTier) -> &PerformanceCategory {
        self.categories
            .iter()
            .find(|c| c.tier == tier)
            .unwrap_or(&self.categories[0])
    }

    /// Categories, lowest tier first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PerformanceCategory> {
        self.categories.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_half_open() {
        let table = CategoryTable::standard();
        assert_eq!(table.classify(9.99).tier, PerformanceTier::Regular);
        assert_eq!(table.classify(10.0).tier, PerformanceTier::Good);
        assert_eq!(table.classify(13.99).tier, PerformanceTier::Good);
        assert_eq!(table.classify(14.0).tier, PerformanceTier::VeryGood);
        assert_eq!(table.classify(18.0).tier, PerformanceTier::Excellent);
        assert_eq!(table.classify(20.0).tier, PerformanceTier::Excellent);
    }

    #[test]
    fn out_of_range_scores_fall_to_lowest_tier() {
        let table = CategoryTable::standard();
        assert_eq!(table.classify(-3.0).tier, PerformanceTier::Regular);
        assert_eq!(table.classify(f64::NAN).tier, PerformanceTier::Regular);
    }

    #[test]
    fn table_is_ordered_and_gapless() {
        let table = CategoryTable::standard();
        let cats: Vec<_> = table.iter().collect();
        assert_eq!(cats.len(), 4);
        for pair in cats.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
            assert!(pair[0].tier < pair[1].tier);
        }
        assert_eq!(table.get(PerformanceTier::VeryGood).label, "A - Very good");
    }
}
