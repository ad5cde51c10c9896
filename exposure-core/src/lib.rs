//! exposure-core: personalization experiment facts from recorded sessions
//!
//! For each first-time test page of a visitor session, the aggregator works
//! out which personalization rules of which experiment were eligible or
//! exposed, and emits an additive fact under a day-bucketed key:
//!
//! - **Sessions** - [`Session`] and [`PageVisit`], read-only inputs
//! - **Aggregation** - [`PersonalizationAggregator`], one `process` call per session
//! - **Facts** - [`PersonalizationKey`] and [`PersonalizationValue`]
//! - **Sinks** - [`FactSink`] trait and [`MemoryFactSink`]
//! - **Collaborators** - [`ContentRepository`], [`TestPageSelector`],
//!   [`MetricCalculator`], [`TestValueInspector`] and [`SessionExtractor`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use exposure_core::{
//!     AggregationConfig, InMemoryContentRepository, MemoryFactSink, PersonalizationAggregator,
//!     Session,
//! };
//!
//! let sink = Arc::new(MemoryFactSink::new());
//! let aggregator = PersonalizationAggregator::new(
//!     AggregationConfig::default(),
//!     Arc::new(InMemoryContentRepository::new()),
//!     sink.clone(),
//! );
//! aggregator.process(&Session::default());
//! for (key, value) in sink.snapshot() {
//!     println!("{} {} {}", key.rule_id, value.visits, value.value);
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod extract;
pub mod fact;
pub mod metric;
pub mod repository;
pub mod runner;
pub mod selector;
pub mod session;
pub mod sink;
pub mod types;

pub use aggregator::{PersonalizationAggregator, build_key, drop_null_rule};
pub use config::AggregationConfig;
pub use error::{ExposureError, Result};
pub use extract::{JsonSessionExtractor, SessionExtractor};
pub use fact::{PersonalizationKey, PersonalizationValue};
pub use metric::{EngagementValueCalculator, MetricCalculator};
pub use repository::{
    ContentItem, ContentRepository, Device, InMemoryContentRepository, LayoutFixture,
    OriginalValueInspector, Rendering, RenderingRule, RepositoryFixture, TestCombination,
    TestDefinition, TestSet, TestValue, TestValueInspector, TestVariable,
};
pub use runner::{RunSummary, aggregate_sessions};
pub use selector::{FirstTimeTestPages, TestPageSelector};
pub use session::{
    DeviceRef, ExposedRule, ExposureEncoding, ItemRef, MvTestAssignment, PageVisit,
    PersonalizationData, Session, TestExposure, TestPage,
};
pub use sink::{FactSink, MemoryFactSink};
pub use types::{DeviceId, ItemId, RenderingId, RuleId, RuleSetId, TestId};
