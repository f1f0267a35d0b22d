pub mod config;
pub mod error;
pub mod types;

pub use error::{PlacerError, Result};
pub use types::{Matrix, Vector};
