//! Slab buckets for ageing values.
//!
//! Each label names the lower bound of its interval, not the upper one:
//! `>60` covers `(60, 90]`, `>90` covers `(90, 180]` and so on. Downstream
//! reports key on these exact strings.

use serde::Serialize;
use std::fmt;

/// Ordered slab buckets. `NoSlab` is the fallback for an undefined ageing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Slab {
    UpTo60,
    Over60,
    Over90,
    Over180,
    Over365,
    NoSlab,
}

/// One classification rule: ageing in `(lower, upper]`, open ends as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabRule {
    pub lower_exclusive: Option<i64>,
    pub upper_inclusive: Option<i64>,
    pub slab: Slab,
}

impl SlabRule {
    const fn new(lower_exclusive: Option<i64>, upper_inclusive: Option<i64>, slab: Slab) -> Self {
        Self {
            lower_exclusive,
            upper_inclusive,
            slab,
        }
    }

    pub fn matches(&self, ageing: i64) -> bool {
        self.lower_exclusive.map_or(true, |lo| ageing > lo)
            && self.upper_inclusive.map_or(true, |hi| ageing <= hi)
    }

    /// Human-readable condition, e.g. `60 < x <= 90`.
    pub fn condition(&self) -> String {
        match (self.lower_exclusive, self.upper_inclusive) {
            (None, Some(hi)) => format!("x <= {}", hi),
            (Some(lo), Some(hi)) => format!("{} < x <= {}", lo, hi),
            (Some(lo), None) => format!("x > {}", lo),
            (None, None) => "any".to_string(),
        }
    }
}

/// Evaluated in order, first match wins.
pub const SLAB_RULES: [SlabRule; 5] = [
    SlabRule::new(None, Some(60), Slab::UpTo60),
    SlabRule::new(Some(60), Some(90), Slab::Over60),
    SlabRule::new(Some(90), Some(180), Slab::Over90),
    SlabRule::new(Some(180), Some(365), Slab::Over180),
    SlabRule::new(Some(365), None, Slab::Over365),
];

impl Slab {
    /// All buckets in report order, fallback last.
    pub const ALL: [Slab; 6] = [
        Slab::UpTo60,
        Slab::Over60,
        Slab::Over90,
        Slab::Over180,
        Slab::Over365,
        Slab::NoSlab,
    ];

    /// Classify an ageing value; `None` (undefined ageing) is `NoSlab`.
    pub fn classify(ageing: Option<i64>) -> Slab {
        ageing
            .and_then(|days| SLAB_RULES.iter().find(|rule| rule.matches(days)))
            .map_or(Slab::NoSlab, |rule| rule.slab)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Slab::UpTo60 => "<=60",
            Slab::Over60 => ">60",
            Slab::Over90 => ">90",
            Slab::Over180 => ">180",
            Slab::Over365 => ">365",
            Slab::NoSlab => "No Slab",
        }
    }

    pub fn from_label(label: &str) -> Option<Slab> {
        Slab::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for Slab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Slab::classify(Some(60)), Slab::UpTo60);
        assert_eq!(Slab::classify(Some(61)), Slab::Over60);
        assert_eq!(Slab::classify(Some(90)), Slab::Over60);
        assert_eq!(Slab::classify(Some(91)), Slab::Over90);
        assert_eq!(Slab::classify(Some(180)), Slab::Over90);
        assert_eq!(Slab::classify(Some(181)), Slab::Over180);
        assert_eq!(Slab::classify(Some(365)), Slab::Over180);
        assert_eq!(Slab::classify(Some(366)), Slab::Over365);
    }

    #[test]
    fn test_negative_and_zero_ageing() {
        assert_eq!(Slab::classify(Some(0)), Slab::UpTo60);
        assert_eq!(Slab::classify(Some(-45)), Slab::UpTo60);
        assert_eq!(Slab::classify(Some(i64::MIN)), Slab::UpTo60);
        assert_eq!(Slab::classify(Some(i64::MAX)), Slab::Over365);
    }

    #[test]
    fn test_undefined_is_no_slab() {
        assert_eq!(Slab::classify(None), Slab::NoSlab);
        assert_eq!(Slab::NoSlab.label(), "No Slab");
    }

    #[test]
    fn test_labels_keep_lower_bound_names() {
        let labels: Vec<&str> = Slab::ALL.iter().map(Slab::label).collect();
        assert_eq!(labels, vec!["<=60", ">60", ">90", ">180", ">365", "No Slab"]);
        assert_eq!(Slab::from_label(">180"), Some(Slab::Over180));
        assert_eq!(Slab::from_label(">30"), None);
    }

    #[test]
    fn test_rules_are_exclusive() {
        for days in -10..=400 {
            let hits = SLAB_RULES.iter().filter(|r| r.matches(days)).count();
            assert_eq!(hits, 1, "ageing {} matched {} rules", days, hits);
        }
    }

    #[test]
    fn test_rule_condition_text() {
        assert_eq!(SLAB_RULES[0].condition(), "x <= 60");
        assert_eq!(SLAB_RULES[1].condition(), "60 < x <= 90");
        assert_eq!(SLAB_RULES[4].condition(), "x > 365");
    }
}
