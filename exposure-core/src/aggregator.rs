//! Personalization fact aggregation
//!
//! [`PersonalizationAggregator`] turns the first-time test pages of a
//! session into personalization facts. Each page is dispatched once on its
//! [`ExposureEncoding`]:
//!
//! - **Side channel**: the session carries [`TestExposure`] records for the
//!   experiment; facts come straight from those records.
//! - **Legacy**: exposures are reconstructed from the item's personalized
//!   renderings and the recorded value combination. When the item itself
//!   can no longer be resolved, the exposure descriptors recorded at visit
//!   time are used verbatim.
//!
//! Unresolvable references only reduce the facts emitted; `process` never
//! fails.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AggregationConfig;
use crate::fact::{PersonalizationKey, PersonalizationValue};
use crate::metric::{EngagementValueCalculator, MetricCalculator};
use crate::repository::{
    ContentRepository, OriginalValueInspector, Rendering, TestCombination, TestValueInspector,
};
use crate::selector::{FirstTimeTestPages, TestPageSelector};
use crate::session::{ExposureEncoding, Session, TestExposure, TestPage};
use crate::sink::FactSink;
use crate::types::{DeviceId, RuleId, RuleSetId};

/// Derives personalization facts from sessions and emits them to a sink.
pub struct PersonalizationAggregator {
    config: AggregationConfig,
    repository: Arc<dyn ContentRepository>,
    sink: Arc<dyn FactSink>,
    selector: Arc<dyn TestPageSelector>,
    metric: Arc<dyn MetricCalculator>,
    inspector: Arc<dyn TestValueInspector>,
}

impl PersonalizationAggregator {
    /// Create an aggregator with the default selector, metric and inspector.
    pub fn new(
        config: AggregationConfig,
        repository: Arc<dyn ContentRepository>,
        sink: Arc<dyn FactSink>,
    ) -> Self {
        Self {
            config,
            repository,
            sink,
            selector: Arc::new(FirstTimeTestPages),
            metric: Arc::new(EngagementValueCalculator),
            inspector: Arc::new(OriginalValueInspector),
        }
    }

    /// Replace the first-time test page selector
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn TestPageSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Replace the metric calculator
    #[must_use]
    pub fn with_metric(mut self, metric: Arc<dyn MetricCalculator>) -> Self {
        self.metric = metric;
        self
    }

    /// Replace the test value inspector
    #[must_use]
    pub fn with_inspector(mut self, inspector: Arc<dyn TestValueInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Emit the personalization facts of one session.
    pub fn process(&self, session: &Session) {
        if !self.config.enabled {
            return;
        }
        if session.pages.is_empty() {
            return;
        }

        for visit in self.selector.first_time_pages(&session.pages) {
            let Some(page) = visit.as_test_page() else {
                debug!(session = %session.id, "Skipping page without complete test data");
                continue;
            };
            match session.exposure_encoding(page.test.id) {
                ExposureEncoding::Legacy => self.process_legacy(session, &page),
                ExposureEncoding::SideChannel(data) => {
                    self.process_side_channel(session, &page, data)
                }
            }
        }
    }

    /// Value of one emission for `page`.
    ///
    /// The visitor counts when the page is flagged as a first exposure, or,
    /// without a flag, when this is the contact's first visit.
    pub fn build_value(&self, page: &TestPage<'_>, session: &Session) -> PersonalizationValue {
        let is_first_visit = page
            .test
            .first_exposure
            .unwrap_or(session.contact_visit_index == 1);
        PersonalizationValue::single_visit(
            is_first_visit,
            self.metric.test_value(session, page.visit),
        )
    }

    fn emit(
        &self,
        session: &Session,
        page: &TestPage<'_>,
        rule_set_id: RuleSetId,
        rule_id: RuleId,
        is_default: bool,
    ) {
        let key = build_key(page, rule_set_id, rule_id, is_default);
        self.sink.emit(key, self.build_value(page, session));
    }

    fn process_side_channel(
        &self,
        session: &Session,
        page: &TestPage<'_>,
        data: &serde_json::Value,
    ) {
        let exposures = match Option::<Vec<TestExposure>>::deserialize(data) {
            Ok(Some(exposures)) => exposures,
            Ok(None) => return,
            Err(e) => {
                warn!(
                    session = %session.id,
                    test = %page.test.id,
                    "Skipping undecodable personalization test data: {}",
                    e
                );
                return;
            }
        };

        for exposure in exposures {
            let rule_set_id = RuleSetId::from(exposure.rendering_id);
            if exposure.is_original_exposure && !exposure.eligible_rules.is_empty() {
                for rule_id in drop_null_rule(exposure.eligible_rules) {
                    self.emit(session, page, rule_set_id, rule_id, true);
                }
            } else {
                self.emit(
                    session,
                    page,
                    rule_set_id,
                    exposure.exposed_rule,
                    exposure.is_original_exposure,
                );
            }
        }
    }

    fn process_legacy(&self, session: &Session, page: &TestPage<'_>) {
        let Some(item) = self
            .repository
            .get_item(page.item.id, page.language, page.item.version)
        else {
            self.process_recorded_exposures(session, page);
            return;
        };
        let Some(definition) = self.repository.get_test_definition(page.test.id) else {
            debug!(test = %page.test.id, "Test definition not found");
            return;
        };
        let device_id = page
            .visit
            .device
            .map_or(DeviceId::NULL, |device| device.id);
        if device_id.is_null() {
            return;
        }
        let Some(device) = self.repository.get_device(device_id) else {
            debug!(device = %device_id, "Device not found");
            return;
        };

        let renderings: Vec<_> = self
            .repository
            .renderings(&item, &device)
            .into_iter()
            .filter(|rendering| rendering.is_personalized())
            .collect();
        if renderings.is_empty() {
            return;
        }

        let test_set =
            self.repository
                .build_test_set(std::slice::from_ref(&definition), &item, &device);
        let combination = TestCombination::new(&page.test.combination, &test_set);

        for rendering in &renderings {
            let Some(variable) = test_set.variable(rendering.unique_id) else {
                warn!(
                    rendering = %rendering.unique_id,
                    test = %page.test.id,
                    "Rendering is not a variable of the test set"
                );
                continue;
            };
            let Some(value) = combination.value_for(rendering.unique_id) else {
                continue;
            };

            let rule_set_id = RuleSetId::from(rendering.unique_id);
            let eligible = intersect_rules(page.eligible_rules, rendering);
            let is_default = self.inspector.is_original_value(variable, value);

            if is_default && !eligible.is_empty() {
                for rule_id in drop_null_rule(eligible) {
                    self.emit(session, page, rule_set_id, rule_id, true);
                }
            } else {
                self.emit(session, page, rule_set_id, value.id, is_default);
            }
        }
    }

    /// Oldest encoding: facts mirror the descriptors recorded at visit time.
    fn process_recorded_exposures(&self, session: &Session, page: &TestPage<'_>) {
        for exposed in &page.visit.personalization.exposed_rules {
            self.emit(
                session,
                page,
                exposed.rule_set_id,
                exposed.rule_id,
                exposed.is_original,
            );
        }
    }
}

/// Fact key for a rule exposure on `page`, bucketed by UTC day.
#[must_use]
pub fn build_key(
    page: &TestPage<'_>,
    rule_set_id: RuleSetId,
    rule_id: RuleId,
    is_default: bool,
) -> PersonalizationKey {
    PersonalizationKey {
        test_set_id: page.test.id,
        test_values: page.test.combination.clone(),
        date: page.visit.date_time.date_naive(),
        rule_set_id,
        rule_id,
        is_default,
    }
}

/// Remove the null rule from a list of eligible rules.
///
/// The null rule is a placeholder that can sit next to real rules when
/// several rule groups apply. It is only removed when other rules are
/// present; a list holding nothing but the null rule is returned unchanged.
#[must_use]
pub fn drop_null_rule(mut rules: Vec<RuleId>) -> Vec<RuleId> {
    if rules.len() > 1 {
        rules.retain(|rule| !rule.is_null());
    }
    rules
}

/// Distinct eligible rules that are attached to the rendering, in eligible order.
fn intersect_rules(eligible: &[RuleId], rendering: &Rendering) -> Vec<RuleId> {
    let attached: HashSet<RuleId> = rendering.rule_ids().collect();
    let mut seen = HashSet::new();
    eligible
        .iter()
        .copied()
        .filter(|rule| attached.contains(rule) && seen.insert(*rule))
        .collect()
}
