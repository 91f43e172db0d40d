//! Core type definitions used throughout the crate

use serde::{Deserialize, Serialize};

/// Unique identifier for indexed entities.
///
/// The index never generates ids: callers supply a stable, unique id per
/// entity for the entity's lifetime (ship registry handle, asteroid field
/// slot, anomaly number). The index does not interpret the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
