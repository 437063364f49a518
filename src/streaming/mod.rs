//! Asynchronous cell loading and caching

pub mod cache;
mod loader;
pub mod poll;

pub use cache::{CellFuture, CellLoadResult, PlacementsCache};
pub use poll::{poll_for, poll_until};
