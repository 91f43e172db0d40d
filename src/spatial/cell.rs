//! Grid cell keying: world positions to discrete cell coordinates

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Discrete 3D grid coordinate identifying one cell of the uniform grid.
///
/// Each axis is `floor(coordinate / cell_size)`, so negative coordinates
/// floor toward negative infinity rather than truncating toward zero. Two
/// positions share a key iff their floored-divided coordinates match on all
/// three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellKey {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Key of the cell containing `position`
    #[inline]
    pub fn from_position(position: Vec3, cell_size: f32) -> Self {
        Self {
            x: (position.x / cell_size).floor() as i32,
            y: (position.y / cell_size).floor() as i32,
            z: (position.z / cell_size).floor() as i32,
        }
    }
}

/// Inclusive block of cell keys covering an axis-aligned bounding box.
///
/// Insert and query both reduce to the same computation: the cells overlapped
/// by `[center - radius, center + radius]` on each axis. An entity large
/// relative to the cell size covers many cells; that trades write cost for
/// cheap reads, and is what lets a uniform grid serve mixed entity sizes
/// without a hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct CellRange {
    min: CellKey,
    max: CellKey,
}

impl CellRange {
    /// Cells overlapped by the bounding box of a sphere at `center`.
    ///
    /// A radius <= 0 degenerates to the single cell containing `center`.
    pub fn covering(center: Vec3, radius: f32, cell_size: f32) -> Self {
        let r = radius.max(0.0);
        Self {
            min: CellKey::from_position(center - Vec3::splat(r), cell_size),
            max: CellKey::from_position(center + Vec3::splat(r), cell_size),
        }
    }

    /// Number of cells in the block (saturating, for degenerate huge ranges)
    pub fn cell_count(&self) -> usize {
        let nx = (self.max.x as i64 - self.min.x as i64 + 1) as usize;
        let ny = (self.max.y as i64 - self.min.y as i64 + 1) as usize;
        let nz = (self.max.z as i64 - self.min.z as i64 + 1) as usize;
        nx.saturating_mul(ny).saturating_mul(nz)
    }

    /// Whether a key falls inside the block
    #[inline]
    pub fn contains(&self, key: CellKey) -> bool {
        (self.min.x..=self.max.x).contains(&key.x)
            && (self.min.y..=self.max.y).contains(&key.y)
            && (self.min.z..=self.max.z).contains(&key.z)
    }

    /// Iterate the full cross-product of per-axis cell indices
    pub fn iter(&self) -> impl Iterator<Item = CellKey> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| {
                (min.z..=max.z).map(move |z| CellKey::new(x, y, z))
            })
        })
    }
}
