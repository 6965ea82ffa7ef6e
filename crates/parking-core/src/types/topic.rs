//! Topic addressing for slot and space notifications.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::SpaceId;

/// Typed topic identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Every slot-level lifecycle event, across all spaces.
    AllSlots,
    /// Slot-level lifecycle events for one space.
    Space(SpaceId),
    /// Availability summaries for one space.
    SpaceAggregate(SpaceId),
}

impl Topic {
    /// Parses a topic string into a typed topic.
    pub fn parse(topic: &str) -> Option<Self> {
        let parts: Vec<&str> = topic.splitn(2, '/').collect();
        match parts.as_slice() {
            ["all-slots"] => Some(Topic::AllSlots),
            ["space", id] => id.parse().ok().map(Topic::Space),
            ["space-aggregate", id] => id.parse().ok().map(Topic::SpaceAggregate),
            _ => None,
        }
    }

    /// The space this topic is scoped to, if any.
    pub fn space_id(&self) -> Option<SpaceId> {
        match self {
            Topic::AllSlots => None,
            Topic::Space(id) | Topic::SpaceAggregate(id) => Some(*id),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::AllSlots => write!(f, "all-slots"),
            Topic::Space(id) => write!(f, "space/{id}"),
            Topic::SpaceAggregate(id) => write!(f, "space-aggregate/{id}"),
        }
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Topic::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown topic '{raw}'")))
    }
}
