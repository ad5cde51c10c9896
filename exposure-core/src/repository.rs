//! Content repository collaborators for legacy exposure resolution.
//!
//! Sessions recorded before the per-test side channel existed only carry
//! the page's eligible rules. Which rules were exposed has to be
//! reconstructed from the content item's renderings, the experiment's test
//! set, and the value combination the visitor was assigned.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExposureError, Result};
use crate::types::{DeviceId, ItemId, RenderingId, RuleId, TestId};

/// A resolved content item version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub language: String,
    pub version: u32,
    #[serde(default)]
    pub name: String,
}

/// Definition of a personalization experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: TestId,
    #[serde(default)]
    pub name: String,
    /// Variables the experiment can vary, one per personalized rendering
    #[serde(default)]
    pub variables: Vec<TestVariable>,
}

/// A device (channel) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: String,
}

/// A rendering placed on a content item for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendering {
    pub unique_id: RenderingId,
    /// Personalization test setting; empty or absent when not personalized
    #[serde(default)]
    pub personalization_test: Option<String>,
    /// Personalization rules attached to the rendering, in authored order
    #[serde(default)]
    pub rules: Vec<RenderingRule>,
}

impl Rendering {
    /// Whether the rendering carries a personalization test setting.
    #[must_use]
    pub fn is_personalized(&self) -> bool {
        self.personalization_test
            .as_deref()
            .is_some_and(|setting| !setting.is_empty())
    }

    /// Rule ids of the rendering, in authored order.
    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(|rule| rule.unique_id)
    }
}

/// A personalization rule attached to a rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderingRule {
    pub unique_id: RuleId,
    #[serde(default)]
    pub name: String,
}

/// Variables of one or more experiments on a content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSet {
    pub variables: Vec<TestVariable>,
}

impl TestSet {
    /// Variable personalizing the given rendering.
    #[must_use]
    pub fn variable(&self, id: RenderingId) -> Option<&TestVariable> {
        self.variables.iter().find(|variable| variable.id == id)
    }
}

/// A test variable: the candidate values for one rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestVariable {
    pub id: RenderingId,
    pub values: Vec<TestValue>,
}

/// One candidate value of a test variable, identified by its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestValue {
    pub id: RuleId,
    /// Marks the baseline value explicitly
    #[serde(default)]
    pub is_original: bool,
}

/// A recorded value combination applied to a test set.
///
/// Byte `i` of the combination selects the value of variable `i`.
#[derive(Debug, Clone, Copy)]
pub struct TestCombination<'a> {
    combination: &'a [u8],
    test_set: &'a TestSet,
}

impl<'a> TestCombination<'a> {
    #[must_use]
    pub fn new(combination: &'a [u8], test_set: &'a TestSet) -> Self {
        Self {
            combination,
            test_set,
        }
    }

    /// Value chosen for the variable personalizing `rendering`.
    #[must_use]
    pub fn value_for(&self, rendering: RenderingId) -> Option<&'a TestValue> {
        let index = self
            .test_set
            .variables
            .iter()
            .position(|variable| variable.id == rendering)?;
        let choice = usize::from(*self.combination.get(index)?);
        self.test_set.variables[index].values.get(choice)
    }
}

/// Read access to the content definitions legacy sessions refer to.
pub trait ContentRepository: Send + Sync {
    /// Resolve a content item version.
    fn get_item(&self, id: ItemId, language: &str, version: u32) -> Option<ContentItem>;

    /// Resolve an experiment definition.
    fn get_test_definition(&self, id: TestId) -> Option<TestDefinition>;

    /// Resolve a device definition.
    fn get_device(&self, id: DeviceId) -> Option<Device>;

    /// Renderings of `item` for `device`, in layout order.
    fn renderings(&self, item: &ContentItem, device: &Device) -> Vec<Rendering>;

    /// Build the test set of `definitions` as laid out on `item` for `device`.
    fn build_test_set(
        &self,
        definitions: &[TestDefinition],
        item: &ContentItem,
        device: &Device,
    ) -> TestSet;
}

/// Decides whether a resolved value is the variable's baseline.
pub trait TestValueInspector: Send + Sync {
    fn is_original_value(&self, variable: &TestVariable, value: &TestValue) -> bool;
}

/// Treats the first value of a variable, or any value flagged
/// `is_original`, as the baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalValueInspector;

impl TestValueInspector for OriginalValueInspector {
    fn is_original_value(&self, variable: &TestVariable, value: &TestValue) -> bool {
        value.is_original || variable.values.first().is_some_and(|first| first.id == value.id)
    }
}

/// Serialized form of an [`InMemoryContentRepository`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryFixture {
    #[serde(default)]
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub test_definitions: Vec<TestDefinition>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub layouts: Vec<LayoutFixture>,
}

/// Renderings of one item for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFixture {
    pub item: ItemId,
    pub device: DeviceId,
    pub renderings: Vec<Rendering>,
}

/// Content repository backed by in-memory maps.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    items: HashMap<(ItemId, String, u32), ContentItem>,
    definitions: HashMap<TestId, TestDefinition>,
    devices: HashMap<DeviceId, Device>,
    layouts: HashMap<(ItemId, DeviceId), Vec<Rendering>>,
}

impl InMemoryContentRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from a fixture, rejecting duplicate entries.
    pub fn from_fixture(fixture: RepositoryFixture) -> Result<Self> {
        let mut repository = Self::new();

        for item in fixture.items {
            let key = (item.id, item.language.clone(), item.version);
            if repository.items.insert(key, item).is_some() {
                return Err(ExposureError::Fixture("duplicate item version".into()));
            }
        }
        for definition in fixture.test_definitions {
            let id = definition.id;
            if repository.definitions.insert(id, definition).is_some() {
                return Err(ExposureError::Fixture(format!(
                    "duplicate test definition {id}"
                )));
            }
        }
        for device in fixture.devices {
            let id = device.id;
            if repository.devices.insert(id, device).is_some() {
                return Err(ExposureError::Fixture(format!("duplicate device {id}")));
            }
        }
        for layout in fixture.layouts {
            let key = (layout.item, layout.device);
            if repository.layouts.insert(key, layout.renderings).is_some() {
                return Err(ExposureError::Fixture(format!(
                    "duplicate layout for item {} on device {}",
                    layout.item, layout.device
                )));
            }
        }

        Ok(repository)
    }

    /// Load a repository from a JSON fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let fixture: RepositoryFixture = serde_json::from_str(&contents)?;
        Self::from_fixture(fixture)
    }

    pub fn insert_item(&mut self, item: ContentItem) {
        self.items
            .insert((item.id, item.language.clone(), item.version), item);
    }

    pub fn insert_test_definition(&mut self, definition: TestDefinition) {
        self.definitions.insert(definition.id, definition);
    }

    pub fn insert_device(&mut self, device: Device) {
        self.devices.insert(device.id, device);
    }

    pub fn insert_layout(&mut self, item: ItemId, device: DeviceId, renderings: Vec<Rendering>) {
        self.layouts.insert((item, device), renderings);
    }
}

impl ContentRepository for InMemoryContentRepository {
    fn get_item(&self, id: ItemId, language: &str, version: u32) -> Option<ContentItem> {
        self.items
            .get(&(id, language.to_string(), version))
            .cloned()
    }

    fn get_test_definition(&self, id: TestId) -> Option<TestDefinition> {
        self.definitions.get(&id).cloned()
    }

    fn get_device(&self, id: DeviceId) -> Option<Device> {
        self.devices.get(&id).cloned()
    }

    fn renderings(&self, item: &ContentItem, device: &Device) -> Vec<Rendering> {
        self.layouts
            .get(&(item.id, device.id))
            .cloned()
            .unwrap_or_default()
    }

    fn build_test_set(
        &self,
        definitions: &[TestDefinition],
        item: &ContentItem,
        device: &Device,
    ) -> TestSet {
        let renderings = self.renderings(item, device);
        let variables = definitions
            .iter()
            .flat_map(|definition| definition.variables.iter())
            .filter(|variable| {
                renderings
                    .iter()
                    .any(|rendering| rendering.unique_id == variable.id)
            })
            .cloned()
            .collect();
        TestSet { variables }
    }
}
