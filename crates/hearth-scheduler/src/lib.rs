//! `hearth-scheduler` — small tokio-based job loop.
//!
//! Jobs are plain closures registered on an explicitly constructed
//! [`engine::SchedulerEngine`] owned by the process startup sequence; there
//! is no global registry. Each job owns whatever store handle it needs.
//! Jobs flagged *eager* run once when the loop starts, which is how the
//! recurrence spawn catches up after downtime. A failing job is logged and
//! never stops the loop.

pub mod engine;
pub mod schedule;

pub use engine::SchedulerEngine;
pub use schedule::Schedule;
