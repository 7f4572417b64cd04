//! `hearth-recurrence` — weekly materialization of recurring tasks.
//!
//! # Overview
//!
//! Template tasks (a recurrence rule, no parent) describe a pattern; this
//! crate turns them into concrete task rows, one run per calendar week.
//! [`occurrence::week_occurrences`] is the pure calendar math;
//! [`spawner::RecurrenceSpawner`] wraps it in a claim protocol so any number
//! of worker processes sharing one database spawn each week exactly once.
//!
//! # Claim protocol
//!
//! The `app_state` watermark row records the Monday of the last processed
//! week. A run opens one immediate transaction, conditionally advances the
//! watermark (`value < monday`), and only on success inserts the week's
//! missing instances — then commits claim and inserts together. Losing the
//! claim is a normal outcome, not an error; a crashed run rolls the claim
//! back with its inserts, so the watermark never runs ahead of the data.

pub mod error;
pub mod occurrence;
pub mod spawner;

pub use error::{Result, SpawnError};
pub use spawner::{RecurrenceSpawner, SpawnOutcome};
