//! Sparse uniform-grid spatial index for broad-phase proximity queries
//!
//! Maps 3D space to buckets of entity ids so "what is near this point" is
//! answered by scanning a handful of cells instead of every entity. Query
//! results are broad-phase candidates bounded at cell granularity; callers
//! needing exact containment post-filter against their own position data
//! (the index retains no positions, only cell membership).

use ahash::{AHashMap, AHashSet};
use glam::Vec3;

use super::cell::{CellKey, CellRange};
use crate::core::config::{GridConfig, DEFAULT_CELL_SIZE};
use crate::core::error::{GridError, Result};
use crate::core::types::EntityId;

/// Sparse hash grid over 3D space.
///
/// Cells are created lazily on first occupant and deleted eagerly on last
/// removal, so memory is bounded by active occupancy. Per entity, the index
/// keeps only the list of cells its bounding box covered at last
/// insert/update, making removal O(cells occupied).
///
/// Single-owner structure: one subsystem constructs it and performs all
/// mutations; concurrent access from multiple threads needs external
/// synchronization.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    /// cell key -> ids of entities whose bounding box overlaps that cell
    cells: AHashMap<CellKey, AHashSet<EntityId>>,
    /// entity id -> cells it currently occupies, for cheap removal
    membership: AHashMap<EntityId, Vec<CellKey>>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            cells: AHashMap::new(),
            membership: AHashMap::new(),
        }
    }
}

impl SpatialIndex {
    /// Create an index with the given cell edge length (world units).
    ///
    /// Fails with [`GridError::InvalidCellSize`] on a non-finite or
    /// non-positive size. The size is fixed for the index's lifetime; to
    /// re-key under a different size, construct a new index and `rebuild`.
    pub fn new(cell_size: f32) -> Result<Self> {
        GridConfig { cell_size }.validate()?;
        Ok(Self {
            cell_size,
            cells: AHashMap::new(),
            membership: AHashMap::new(),
        })
    }

    /// Create an index from a validated config
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        Self::new(config.cell_size)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Index an entity's bounding sphere.
    ///
    /// The sphere is approximated by its axis-aligned bounding box for cell
    /// coverage; a radius <= 0 indexes the single cell containing `position`.
    /// Re-inserting an id already present is rejected with
    /// [`GridError::DuplicateEntity`] and leaves the index untouched; use
    /// [`update`](Self::update) to move an entity.
    pub fn insert(&mut self, id: EntityId, position: Vec3, radius: f32) -> Result<()> {
        if self.membership.contains_key(&id) {
            return Err(GridError::DuplicateEntity(id));
        }
        check_finite(id, position, radius)?;
        self.insert_unchecked(id, position, radius);
        Ok(())
    }

    /// Move an entity to a new position/radius.
    ///
    /// Equivalent to `remove` followed by `insert`, replacing the membership
    /// record wholesale. An unknown id degrades to a plain insert. Geometry
    /// is validated before the removal step, so a failed update leaves the
    /// entity's previous coverage intact.
    pub fn update(&mut self, id: EntityId, position: Vec3, radius: f32) -> Result<()> {
        check_finite(id, position, radius)?;
        self.remove(id);
        self.insert_unchecked(id, position, radius);
        Ok(())
    }

    /// Remove an entity from the index.
    ///
    /// Returns `false` (not an error) for ids that were never inserted or
    /// were already removed. Cells left empty are deleted.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let keys = match self.membership.remove(&id) {
            Some(keys) => keys,
            None => return false,
        };
        for key in keys {
            if let Some(cell) = self.cells.get_mut(&key) {
                cell.remove(&id);
                if cell.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
        true
    }

    /// Broad-phase query: ids whose indexed bounding box may overlap the
    /// given sphere.
    ///
    /// Unions every occupied cell in the coverage range of the query's
    /// bounding box. The result overestimates at cell granularity and each id
    /// appears once regardless of how many cells it spans. Cost is bounded by
    /// the smaller of cells-spanned and cells-occupied, times average
    /// occupancy, never by total entity count.
    pub fn query_sphere(&self, center: Vec3, radius: f32) -> AHashSet<EntityId> {
        if !center.is_finite() || !radius.is_finite() {
            // A NaN cast saturates to cell index 0, which would silently
            // alias the query to the origin cell.
            tracing::warn!(
                "non-finite query geometry: center {:?} radius {}",
                center,
                radius
            );
            return AHashSet::new();
        }
        let range = CellRange::covering(center, radius, self.cell_size());
        let mut result = AHashSet::new();
        if range.cell_count() > self.cells.len() {
            // Query volume spans more cells than are occupied: walk the
            // occupied cells instead of the candidate block.
            for (key, cell) in &self.cells {
                if range.contains(*key) {
                    result.extend(cell.iter().copied());
                }
            }
        } else {
            for key in range.iter() {
                if let Some(cell) = self.cells.get(&key) {
                    result.extend(cell.iter().copied());
                }
            }
        }
        result
    }

    /// Broad-phase query at a single point
    pub fn query_point(&self, center: Vec3) -> AHashSet<EntityId> {
        self.query_sphere(center, 0.0)
    }

    /// Drop all entities and cells
    pub fn clear(&mut self) {
        self.cells.clear();
        self.membership.clear();
    }

    /// Clear and re-index a whole entity population.
    ///
    /// This is the supported path for wholesale repopulation, including
    /// re-keying under a different cell size (construct a fresh index, then
    /// rebuild with the live population). Duplicate ids in the input are
    /// rejected the same way `insert` rejects them.
    pub fn rebuild<I>(&mut self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = (EntityId, Vec3, f32)>,
    {
        self.clear();
        for (id, position, radius) in entities {
            self.insert(id, position, radius)?;
        }
        tracing::debug!(
            "rebuilt spatial index: {} entities across {} cells",
            self.membership.len(),
            self.cells.len()
        );
        Ok(())
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.membership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    /// Whether an id is currently indexed
    pub fn contains(&self, id: EntityId) -> bool {
        self.membership.contains_key(&id)
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn insert_unchecked(&mut self, id: EntityId, position: Vec3, radius: f32) {
        let range = CellRange::covering(position, radius, self.cell_size());
        let mut keys = Vec::with_capacity(range.cell_count());
        for key in range.iter() {
            self.cells.entry(key).or_default().insert(id);
            keys.push(key);
        }
        self.membership.insert(id, keys);
    }
}

fn check_finite(id: EntityId, position: Vec3, radius: f32) -> Result<()> {
    if !position.is_finite() || !radius.is_finite() {
        return Err(GridError::NonFiniteGeometry(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    impl SpatialIndex {
        /// Check the structural invariants: membership and cells agree both
        /// ways, and no cell is empty.
        fn assert_consistent(&self) {
            for (id, keys) in &self.membership {
                for key in keys {
                    let cell = self
                        .cells
                        .get(key)
                        .unwrap_or_else(|| panic!("missing cell {key:?} for {id:?}"));
                    assert!(cell.contains(id), "{id:?} absent from cell {key:?}");
                }
            }
            for (key, cell) in &self.cells {
                assert!(!cell.is_empty(), "orphan cell at {key:?}");
                for id in cell {
                    let keys = &self.membership[id];
                    assert!(keys.contains(key), "{id:?} in cell {key:?} but not in record");
                }
            }
        }
    }

    #[test]
    fn test_insert_then_point_query_finds_entity() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(1);
        index.insert(id, Vec3::new(150.0, -40.0, 900.0), 10.0).unwrap();

        let hits = index.query_point(Vec3::new(150.0, -40.0, 900.0));
        assert!(hits.contains(&id));
        index.assert_consistent();
    }

    #[test]
    fn test_duplicate_insert_rejected_and_state_untouched() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(7);
        index.insert(id, Vec3::ZERO, 5.0).unwrap();
        let cells_before = index.cell_count();

        let err = index.insert(id, Vec3::new(5000.0, 0.0, 0.0), 5.0);
        assert_eq!(err, Err(GridError::DuplicateEntity(id)));
        assert_eq!(index.cell_count(), cells_before);
        assert!(index.query_point(Vec3::ZERO).contains(&id));
        assert!(!index.query_point(Vec3::new(5000.0, 0.0, 0.0)).contains(&id));
        index.assert_consistent();
    }

    #[test]
    fn test_remove_deletes_emptied_cells() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        index.insert(EntityId::new(1), Vec3::ZERO, 500.0).unwrap();
        assert!(index.cell_count() > 1);

        assert!(index.remove(EntityId::new(1)));
        assert_eq!(index.cell_count(), 0);
        assert!(index.is_empty());
        index.assert_consistent();
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        assert!(!index.remove(EntityId::new(42)));
        index.insert(EntityId::new(1), Vec3::ZERO, 1.0).unwrap();
        assert!(!index.remove(EntityId::new(42)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_update_unknown_acts_as_insert() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(3);
        index.update(id, Vec3::new(100.0, 100.0, 100.0), 1.0).unwrap();
        assert!(index.contains(id));
        assert!(index.query_point(Vec3::new(100.0, 100.0, 100.0)).contains(&id));
    }

    #[test]
    fn test_update_moves_entity() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(9);
        index.insert(id, Vec3::ZERO, 1.0).unwrap();
        index.update(id, Vec3::new(1000.0, 0.0, 0.0), 1.0).unwrap();

        assert!(!index.query_point(Vec3::ZERO).contains(&id));
        assert!(index.query_point(Vec3::new(1000.0, 0.0, 0.0)).contains(&id));
        index.assert_consistent();
    }

    #[test]
    fn test_non_finite_insert_rejected() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(1);
        assert_eq!(
            index.insert(id, Vec3::new(f32::NAN, 0.0, 0.0), 1.0),
            Err(GridError::NonFiniteGeometry(id))
        );
        assert_eq!(
            index.insert(id, Vec3::ZERO, f32::INFINITY),
            Err(GridError::NonFiniteGeometry(id))
        );
        assert!(index.is_empty());
    }

    #[test]
    fn test_failed_update_keeps_previous_coverage() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(2);
        index.insert(id, Vec3::new(50.0, 50.0, 50.0), 5.0).unwrap();

        let err = index.update(id, Vec3::new(f32::NAN, 0.0, 0.0), 5.0);
        assert_eq!(err, Err(GridError::NonFiniteGeometry(id)));
        assert!(index.query_point(Vec3::new(50.0, 50.0, 50.0)).contains(&id));
        index.assert_consistent();
    }

    #[test]
    fn test_non_finite_query_returns_empty() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        index.insert(EntityId::new(1), Vec3::ZERO, 10.0).unwrap();
        // Unguarded, NaN would cast to cell 0 and match the origin cell
        assert!(index.query_sphere(Vec3::new(f32::NAN, 0.0, 0.0), 10.0).is_empty());
        assert!(index.query_sphere(Vec3::ZERO, f32::NAN).is_empty());
    }

    #[test]
    fn test_zero_radius_entity_occupies_single_cell() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        index.insert(EntityId::new(1), Vec3::new(10.0, 10.0, 10.0), 0.0).unwrap();
        assert_eq!(index.cell_count(), 1);
        index.insert(EntityId::new(2), Vec3::new(20.0, 20.0, 20.0), -5.0).unwrap();
        assert_eq!(index.cell_count(), 1, "negative radius clamps to a point");
        index.assert_consistent();
    }

    #[test]
    fn test_negative_coordinates_indexed_correctly() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let id = EntityId::new(5);
        index.insert(id, Vec3::new(-150.0, -350.0, -0.5), 1.0).unwrap();
        assert!(index.query_point(Vec3::new(-150.0, -350.0, -0.5)).contains(&id));
        index.assert_consistent();
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        for i in 0..10 {
            index.insert(EntityId::new(i), Vec3::splat(i as f32 * 100.0), 50.0).unwrap();
        }
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.cell_count(), 0);
        assert!(index.query_sphere(Vec3::ZERO, 10_000.0).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_population() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        index.insert(EntityId::new(1), Vec3::ZERO, 10.0).unwrap();

        index
            .rebuild([
                (EntityId::new(2), Vec3::new(500.0, 0.0, 0.0), 10.0),
                (EntityId::new(3), Vec3::new(-500.0, 0.0, 0.0), 10.0),
            ])
            .unwrap();

        assert_eq!(index.len(), 2);
        assert!(!index.contains(EntityId::new(1)));
        index.assert_consistent();
    }

    #[test]
    fn test_rebuild_rejects_duplicate_ids() {
        let mut index = SpatialIndex::new(200.0).unwrap();
        let err = index.rebuild([
            (EntityId::new(1), Vec3::ZERO, 1.0),
            (EntityId::new(1), Vec3::new(300.0, 0.0, 0.0), 1.0),
        ]);
        assert_eq!(err, Err(GridError::DuplicateEntity(EntityId::new(1))));
    }

    #[test]
    fn test_invalid_cell_size_rejected() {
        assert!(matches!(
            SpatialIndex::new(0.0),
            Err(GridError::InvalidCellSize(_))
        ));
        assert!(matches!(
            SpatialIndex::new(-200.0),
            Err(GridError::InvalidCellSize(_))
        ));
        assert!(matches!(
            SpatialIndex::new(f32::NAN),
            Err(GridError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn test_default_uses_default_cell_size() {
        let mut index = SpatialIndex::default();
        assert_eq!(index.cell_size(), crate::core::config::DEFAULT_CELL_SIZE);
        let id = EntityId::new(1);
        index.insert(id, Vec3::new(1000.0, 0.0, 1000.0), 50.0).unwrap();
        assert!(index.query_point(Vec3::new(1000.0, 0.0, 1000.0)).contains(&id));
    }
}
