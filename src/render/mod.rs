//! Pixel surface that grid writes are painted onto
//!
//! Nothing here is needed by the grid or the stock controller; a surface
//! attaches itself as a hook or view observer and reacts to every write.

pub mod canvas;
pub mod colors;
pub mod terminal;

pub use canvas::{Canvas, FramePacer, Rect};
pub use colors::Color;
