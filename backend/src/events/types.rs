//! Entity event names and payloads

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named event an entity can emit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityEvent {
    /// Mesh and body were attached to the collaborators
    Create,
    /// Mesh transform was refreshed from the body (once per tick)
    Update,
    /// Entity is about to be detached
    Destroy,
    /// Die came to rest during a visible pass
    Settled,
    /// Application-defined event
    Custom(String),
}

impl EntityEvent {
    pub fn custom(name: impl Into<String>) -> Self {
        EntityEvent::Custom(name.into())
    }
}

impl fmt::Display for EntityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityEvent::Create => f.write_str("create"),
            EntityEvent::Update => f.write_str("update"),
            EntityEvent::Destroy => f.write_str("destroy"),
            EntityEvent::Settled => f.write_str("settled"),
            EntityEvent::Custom(name) => f.write_str(name),
        }
    }
}

/// Data passed to handlers alongside the event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EventPayload {
    #[default]
    None,
    /// Tick index the event belongs to
    Tick(usize),
    /// Face value (settle notifications)
    Value { tick: usize, value: u32 },
    Text(String),
}
