//! Grid storage and views over it

pub mod grid;
pub mod view;

pub use grid::{AllPositions, Grid, Hook};
pub use view::{GridView, ViewHook};
