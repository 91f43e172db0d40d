pub mod config;
pub mod error;
pub mod types;

pub use config::{GridConfig, DEFAULT_CELL_SIZE};
pub use error::{GridError, Result};
pub use types::EntityId;
