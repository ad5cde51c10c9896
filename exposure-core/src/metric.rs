//! Experiment metric calculation

use crate::session::{PageVisit, Session};

/// Computes the experiment value attributable to a test page.
pub trait MetricCalculator: Send + Sync {
    fn test_value(&self, session: &Session, page: &PageVisit) -> i64;
}

/// Engagement value earned from the test page to the end of the session.
///
/// A page that does not belong to the session contributes only its own value.
/// The sum saturates at the `i64` bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementValueCalculator;

impl MetricCalculator for EngagementValueCalculator {
    fn test_value(&self, session: &Session, page: &PageVisit) -> i64 {
        match session.pages.iter().position(|p| std::ptr::eq(p, page)) {
            Some(index) => session.pages[index..]
                .iter()
                .fold(0, |total, p| total.saturating_add(p.engagement_value)),
            None => page.engagement_value,
        }
    }
}
