//! Personalization fact keys and values.
//!
//! A fact is an additive `(visits, visitors, value)` triple stored under a
//! [`PersonalizationKey`]. Sinks sum values that share an equal key.

use std::ops::AddAssign;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{RuleId, RuleSetId, TestId};

/// Aggregation bucket for personalization facts.
///
/// Equality covers all six fields. The date is truncated to the day, so
/// same-day visits with otherwise equal keys collapse into one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonalizationKey {
    /// Experiment identifier
    pub test_set_id: TestId,
    /// Chosen value combination of the experiment
    pub test_values: Vec<u8>,
    /// Day of the visit (UTC)
    pub date: NaiveDate,
    /// Rule group (rendering) the rule belongs to
    pub rule_set_id: RuleSetId,
    pub rule_id: RuleId,
    /// Whether the visitor saw the default content
    pub is_default: bool,
}

/// Additive metrics stored under a [`PersonalizationKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationValue {
    pub visits: i64,
    pub visitors: i64,
    pub value: i64,
}

impl PersonalizationValue {
    /// Value of a single page view.
    #[must_use]
    pub fn single_visit(is_first_visit: bool, value: i64) -> Self {
        Self {
            visits: 1,
            visitors: i64::from(is_first_visit),
            value,
        }
    }
}

/// Field-wise sum, saturating at the `i64` bounds.
impl AddAssign for PersonalizationValue {
    fn add_assign(&mut self, other: Self) {
        self.visits = self.visits.saturating_add(other.visits);
        self.visitors = self.visitors.saturating_add(other.visitors);
        self.value = self.value.saturating_add(other.value);
    }
}
