//! Voidgrid - uniform-grid spatial index for 3D space games
//!
//! Broad-phase proximity queries over a moving entity population: collision
//! candidate sets, sensor/radar range checks, nearest-minable-asteroid
//! searches. The index answers "what might be near this volume" at cell
//! granularity; exact distance filtering stays with the caller, who owns the
//! authoritative positions.

pub mod core;
pub mod spatial;

pub use crate::core::config::{GridConfig, DEFAULT_CELL_SIZE};
pub use crate::core::error::{GridError, Result};
pub use crate::core::types::EntityId;
pub use crate::spatial::{CellKey, SpatialIndex};
