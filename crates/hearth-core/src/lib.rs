//! `hearth-core` — shared configuration, domain enums and calendar helpers.
//!
//! Everything here is dependency-light so the store, recurrence and gateway
//! crates can all pull from it without cycles.

pub mod config;
pub mod error;
pub mod types;
pub mod week;

pub use error::{HearthError, Result};
