//! Core types and utilities

pub mod types;
pub mod error;
pub mod hash;
pub mod logging;

pub use types::*;
pub use error::Error;
pub use hash::{hash64, hash64_seeded};
