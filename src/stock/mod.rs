pub mod controller;

pub use controller::{StockController, TendReport};
