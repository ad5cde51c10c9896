//! Identifier types shared across the aggregation pipeline.
//!
//! Every identifier wraps a [`Uuid`]. The nil UUID doubles as the "null"
//! sentinel that content repositories use as a placeholder in rule lists.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// The nil identifier.
            pub const NULL: Self = Self(Uuid::nil());

            /// Whether this is the nil identifier.
            #[must_use]
            pub fn is_null(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a personalization rule.
    RuleId
);

uuid_id!(
    /// Identifier of a rule group (rule set) in a fact key.
    RuleSetId
);

uuid_id!(
    /// Unique identifier of a rendering placed on a content item.
    ///
    /// Test variables are keyed by the rendering they personalize.
    RenderingId
);

uuid_id!(
    /// Identifier of a multivariate/personalization test.
    TestId
);

uuid_id!(
    /// Identifier of a content item.
    ItemId
);

uuid_id!(
    /// Identifier of a device (channel) definition.
    DeviceId
);

impl From<RenderingId> for RuleSetId {
    fn from(id: RenderingId) -> Self {
        Self(id.0)
    }
}
