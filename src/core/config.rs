//! Grid configuration with documented constants
//!
//! The one tunable of the index is the cell size. It is collected here with
//! an explanation of how it interacts with query cost.

use crate::core::error::{GridError, Result};

/// Default cell edge length in world units.
///
/// Chosen for a space-game scale where ships and asteroids have radii in the
/// tens of units and sensor/mining queries reach a few hundred units. At this
/// size a typical query touches a handful of cells.
pub const DEFAULT_CELL_SIZE: f32 = 200.0;

/// Configuration for a spatial index
///
/// Cell size is fixed for the lifetime of an index: cell keys computed under
/// one size are meaningless under another. Re-keying means constructing a new
/// index and calling `rebuild` with the live entity population.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Smaller = more cells per entity and per query, higher memory,
    /// fewer entities per cell.
    /// Larger = fewer cells, lower memory, more candidates to narrow-phase
    /// filter per query.
    ///
    /// A good starting point is the typical query radius divided by 3-5, so
    /// a query spans a small block of cells rather than one overcrowded one.
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl GridConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(GridError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }
}
