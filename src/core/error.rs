use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GridError {
    #[error("Invalid cell size: {0} (must be finite and > 0)")]
    InvalidCellSize(f32),

    #[error("Entity already indexed: {0:?}")]
    DuplicateEntity(EntityId),

    #[error("Non-finite position or radius for entity: {0:?}")]
    NonFiniteGeometry(EntityId),
}

pub type Result<T> = std::result::Result<T, GridError>;
