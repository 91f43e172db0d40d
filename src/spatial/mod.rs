pub mod cell;
pub mod index;

pub use cell::{CellKey, CellRange};
pub use index::SpatialIndex;
