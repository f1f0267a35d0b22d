//! Pixel Placer - hookable 2D grid with a randomized stock controller

pub mod core;
pub mod render;
pub mod spatial;
pub mod stock;

pub use crate::core::{Matrix, PlacerError, Result, Vector};
pub use crate::spatial::{Grid, GridView};
pub use crate::stock::StockController;
