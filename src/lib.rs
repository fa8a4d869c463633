//! Two-dimensional grids of lazily computed, memoized values.
//!
//! A [`Grid`] is built from its dimensions and a function of the cell coordinates. Nothing is
//! computed up front: each cell is a [`Memo`] that runs its computation on the first force and
//! caches the result. Grids and cells can be mapped lazily, and out-of-range lookups return
//! `None`.
//!
//! ```
//! use memogrid::{Grid, Memo};
//!
//! let grid = Grid::new(3, 2, |i, j| i * 10 + j);
//! let scaled = grid.map(|v| v * 100);
//! assert_eq!(scaled.get(2, 1).map(Memo::get), Some(2100));
//! assert!(grid.get(3, 0).is_none());
//! assert_eq!(grid.forced_count(), 1);
//! ```
//!
//! Computations that fail (by returning `Err` or panicking) are not cached; the next force tries
//! again.

extern crate self as memogrid;

mod error;
mod forceable;
mod grid;
mod memo;
mod state;
#[cfg(feature = "sync")]
pub mod sync;

pub use error::ShapeError;
pub use forceable::Forceable;
pub use grid::Grid;
pub use memo::Memo;
pub use memogrid_macros::map;
