//! `hearth-store` — SQLite persistence for the household board.
//!
//! One idempotent [`db::init_db`] migrates the whole schema. Each store
//! manager wraps its own `Connection` in a `Mutex`; the free functions in
//! [`tasks`] and [`state`] operate on a borrowed `&Connection` so the
//! recurrence spawner can compose them inside a single transaction.

pub mod db;
pub mod error;
pub mod shopping;
pub mod state;
pub mod tasks;
pub mod types;
pub mod users;

pub use error::{Result, StoreError};
pub use shopping::ShoppingStore;
pub use tasks::TaskStore;
pub use users::UserStore;
