use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, instrument};

use hearth_core::config::LAST_RECURRENCE_MONDAY;
use hearth_core::week::week_monday;
use hearth_store::db::spawn_schema_ready;
use hearth_store::{state, tasks};

use crate::error::Result;
use crate::occurrence::week_occurrences;

/// How long a run waits on a write-locked database before giving up and
/// leaving the retry to the next scheduled tick.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// What a spawn run did. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// This process won the claim and inserted the missing instances.
    Spawned { monday: NaiveDate, created: usize },
    /// The week was already processed (by this or a peer process).
    AlreadyClaimed { monday: NaiveDate },
    /// Required tables are not migrated yet; retried on the next tick.
    SchemaNotReady,
}

/// Materializes recurring task instances, one successful run per week
/// system-wide.
///
/// Owns its SQLite connection, like the scheduler engine does: the claim
/// and the instance inserts must share a single transaction, which rules
/// out splitting the work across store managers with their own connections.
pub struct RecurrenceSpawner {
    db: Mutex<Connection>,
}

impl RecurrenceSpawner {
    pub fn new(conn: Connection) -> Result<Self> {
        // A contended claim should wait briefly instead of failing busy.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Spawn instances for the current week. Idempotent; safe to call on
    /// every scheduler tick and from any number of concurrent processes.
    pub fn spawn_due_instances(&self) -> Result<SpawnOutcome> {
        let monday = week_monday(Utc::now().date_naive());
        self.spawn_for_week(monday)
    }

    /// Spawn instances for the week starting at `monday`.
    ///
    /// One immediate transaction spans the watermark claim and all inserts:
    /// either the week's claim commits together with its instances, or an
    /// insert failure rolls the claim back and the week stays unclaimed.
    #[instrument(skip(self), fields(%monday))]
    pub fn spawn_for_week(&self, monday: NaiveDate) -> Result<SpawnOutcome> {
        let mut db = self.db.lock().unwrap();

        if !spawn_schema_ready(&db)? {
            info!("spawn schema not migrated yet, skipping run");
            return Ok(SpawnOutcome::SchemaNotReady);
        }

        // Immediate: take the write lock up front so the conditional claim
        // below is serialized across processes.
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !state::claim_week(&tx, LAST_RECURRENCE_MONDAY, monday)? {
            info!("week already claimed, nothing to do");
            return Ok(SpawnOutcome::AlreadyClaimed { monday });
        }

        let templates = tasks::list_templates(&tx)?;
        let mut created = 0usize;
        for template in &templates {
            // Rows with an unrecognized stored rule parse to None and are
            // skipped — malformed data never fails the run.
            let Some(rule) = template.recurrence_rule else {
                continue;
            };
            for date in week_occurrences(rule, template.due_date, monday) {
                if tasks::find_instance(&tx, template.id, date)?.is_some() {
                    continue;
                }
                let id = tasks::insert_instance(&tx, template, date)?;
                debug!(
                    template_id = template.id,
                    task_id = id,
                    %date,
                    title = %template.title,
                    "instance spawned"
                );
                created += 1;
            }
        }

        tx.commit()?;
        info!(
            created,
            templates = templates.len(),
            "recurrence spawn complete"
        );
        Ok(SpawnOutcome::Spawned { monday, created })
    }
}
