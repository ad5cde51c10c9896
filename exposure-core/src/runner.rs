//! Parallel batch aggregation
//!
//! Sessions are independent, so each one is processed on its own blocking
//! task. Facts meet only in the shared sink.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::info;

use crate::aggregator::PersonalizationAggregator;
use crate::error::Result;
use crate::session::Session;

/// Outcome of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Sessions handed to the aggregator
    pub sessions: usize,
    /// Page visits across those sessions
    pub pages: usize,
}

/// Process every session in parallel and wait for all of them.
///
/// A task that panics fails the batch with [`crate::ExposureError::Join`];
/// facts emitted by other sessions stay in the sink.
pub async fn aggregate_sessions(
    aggregator: Arc<PersonalizationAggregator>,
    sessions: Vec<Session>,
) -> Result<RunSummary> {
    let mut tasks = JoinSet::new();
    for session in sessions {
        let aggregator = Arc::clone(&aggregator);
        tasks.spawn_blocking(move || {
            aggregator.process(&session);
            session.pages.len()
        });
    }

    let mut summary = RunSummary::default();
    while let Some(result) = tasks.join_next().await {
        summary.pages += result?;
        summary.sessions += 1;
    }

    info!(
        sessions = summary.sessions,
        pages = summary.pages,
        "Aggregated personalization facts"
    );
    Ok(summary)
}
