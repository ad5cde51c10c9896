//! First-time test page selection

use std::collections::HashSet;

use crate::session::PageVisit;

/// Picks the pages of a session that count as first-time experiment exposures.
pub trait TestPageSelector: Send + Sync {
    /// Selected pages, in recorded order.
    fn first_time_pages<'a>(&self, pages: &'a [PageVisit]) -> Vec<&'a PageVisit>;
}

/// Keeps the first page of each experiment within a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstTimeTestPages;

impl TestPageSelector for FirstTimeTestPages {
    fn first_time_pages<'a>(&self, pages: &'a [PageVisit]) -> Vec<&'a PageVisit> {
        let mut seen = HashSet::new();
        pages
            .iter()
            .filter(|page| page.mv_test.as_ref().is_some_and(|test| seen.insert(test.id)))
            .collect()
    }
}
