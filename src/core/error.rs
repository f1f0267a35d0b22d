use thiserror::Error;

use crate::core::types::Vector;

#[derive(Error, Debug)]
pub enum PlacerError {
    #[error("Position {position} outside grid of size {size}")]
    OutOfBounds { position: Vector, size: Vector },

    #[error("Cell already occupied: {0}")]
    Occupied(Vector),

    #[error("Position not tracked by stock: {0}")]
    NotFound(Vector),

    #[error("Invalid grid size: {width}x{height}")]
    InvalidSize { width: i32, height: i32 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PlacerError {
    /// True for the only failure a placement retry may absorb
    pub fn is_occupied(&self) -> bool {
        matches!(self, PlacerError::Occupied(_))
    }
}

pub type Result<T> = std::result::Result<T, PlacerError>;
