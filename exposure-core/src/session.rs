//! Recorded visitor sessions and the page visits they contain.
//!
//! Sessions are read-only inputs. Two historical encodings describe which
//! personalization rules a page was eligible for:
//!
//! - **Legacy**: only the page's own `mv_test.eligible_rules` (plus, in the
//!   oldest sessions, the raw `personalization.exposed_rules` descriptors).
//!   Rule exposure has to be reconstructed from content metadata.
//! - **Side channel**: the session's `custom_values` carries a list of
//!   [`TestExposure`] records keyed by the experiment id string.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DeviceId, ItemId, RenderingId, RuleId, RuleSetId, TestId};

/// One recorded visitor session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Interaction identifier, used for diagnostics only
    #[serde(default)]
    pub id: String,

    /// Page visits in recorded order
    #[serde(default)]
    pub pages: Vec<PageVisit>,

    /// Per-test side-channel data keyed by experiment id string
    #[serde(default)]
    pub custom_values: HashMap<String, serde_json::Value>,

    /// Sequential index of this visit for the contact (1 = first visit)
    #[serde(default)]
    pub contact_visit_index: u32,
}

/// How exposure data for an experiment is encoded in a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExposureEncoding<'a> {
    /// No side-channel entry; exposures are resolved from content metadata
    Legacy,
    /// Raw side-channel entry for the experiment (may be JSON `null`)
    SideChannel(&'a serde_json::Value),
}

impl Session {
    /// Classify how exposures for `test` are encoded in this session.
    #[must_use]
    pub fn exposure_encoding(&self, test: TestId) -> ExposureEncoding<'_> {
        match self.custom_values.get(&test.to_string()) {
            Some(data) => ExposureEncoding::SideChannel(data),
            None => ExposureEncoding::Legacy,
        }
    }
}

/// A single page view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVisit {
    /// Content item that was viewed
    #[serde(default)]
    pub item: Option<ItemRef>,

    /// Device (channel) context of the visit
    #[serde(default)]
    pub device: Option<DeviceRef>,

    /// When the page was viewed
    pub date_time: DateTime<Utc>,

    /// Experiment assigned to this page view
    #[serde(default)]
    pub mv_test: Option<MvTestAssignment>,

    /// Exposure descriptors recorded at visit time (oldest encoding)
    #[serde(default)]
    pub personalization: PersonalizationData,

    /// Engagement value points earned on this page
    #[serde(default)]
    pub engagement_value: i64,
}

/// Reference to a specific version of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

/// Reference to the device used for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    pub id: DeviceId,
}

/// Experiment assignment of a page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvTestAssignment {
    /// Experiment identifier
    pub id: TestId,

    /// Chosen value index per test variable
    #[serde(default)]
    pub combination: Vec<u8>,

    /// Explicit first-exposure flag, when the recorder knew it
    #[serde(default)]
    pub first_exposure: Option<bool>,

    /// Rules the visitor was eligible for on this page
    #[serde(default)]
    pub eligible_rules: Option<Vec<RuleId>>,
}

/// Legacy personalization descriptors of a page view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationData {
    #[serde(default)]
    pub exposed_rules: Vec<ExposedRule>,
}

/// A rule exposure exactly as it was recorded at visit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedRule {
    pub rule_set_id: RuleSetId,
    pub rule_id: RuleId,
    #[serde(default)]
    pub is_original: bool,
}

/// Side-channel exposure record for one rendering of an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestExposure {
    /// Rendering the experiment personalizes
    pub rendering_id: RenderingId,

    /// Whether the visitor saw the original (default) content
    #[serde(default)]
    pub is_original_exposure: bool,

    /// Rules the visitor was eligible for on this rendering
    #[serde(default)]
    pub eligible_rules: Vec<RuleId>,

    /// Rule that was actually applied (meaningful for non-original exposures)
    #[serde(default)]
    pub exposed_rule: RuleId,
}

/// A page view that carries everything fact derivation needs.
#[derive(Debug, Clone, Copy)]
pub struct TestPage<'a> {
    pub visit: &'a PageVisit,
    pub test: &'a MvTestAssignment,
    pub item: &'a ItemRef,
    pub language: &'a str,
    pub eligible_rules: &'a [RuleId],
}

impl PageVisit {
    /// View this visit as a test page.
    ///
    /// Returns `None` unless the visit has an experiment, an item with a
    /// language, and at least one eligible rule.
    #[must_use]
    pub fn as_test_page(&self) -> Option<TestPage<'_>> {
        let test = self.mv_test.as_ref()?;
        let item = self.item.as_ref()?;
        let language = item.language.as_deref()?;
        let eligible_rules = test.eligible_rules.as_deref()?;
        if eligible_rules.is_empty() {
            return None;
        }
        Some(TestPage {
            visit: self,
            test,
            item,
            language,
            eligible_rules,
        })
    }
}
