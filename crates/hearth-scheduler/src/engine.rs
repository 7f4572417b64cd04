use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info};

use crate::schedule::{compute_next_run, Schedule};

type JobFn = Box<dyn Fn() -> anyhow::Result<()> + Send>;

struct ScheduledJob {
    name: String,
    schedule: Schedule,
    /// Run once when the loop starts, before any tick (downtime recovery).
    eager: bool,
    next_run: Option<DateTime<Utc>>,
    run: JobFn,
}

/// Drives registered jobs at ±1 s precision until shutdown.
///
/// Constructed explicitly in `main` and handed its jobs as closures — each
/// closure owns its own store handle, so nothing here reaches into process
/// globals. Job results are logged; an `Err` never stops the loop.
pub struct SchedulerEngine {
    jobs: Vec<ScheduledJob>,
}

impl Default for SchedulerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerEngine {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register a job. `eager` jobs additionally run once at loop start.
    pub fn add_job(
        &mut self,
        name: &str,
        schedule: Schedule,
        eager: bool,
        run: impl Fn() -> anyhow::Result<()> + Send + 'static,
    ) {
        self.jobs.push(ScheduledJob {
            name: name.to_string(),
            schedule,
            eager,
            next_run: None,
            run: Box::new(run),
        });
    }

    /// Main event loop. Polls every second until `shutdown` broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(jobs = self.jobs.len(), "scheduler engine started");

        let now = Utc::now();
        for job in &mut self.jobs {
            job.next_run = compute_next_run(&job.schedule, now);
            if job.eager {
                info!(job = %job.name, "running eager startup job");
                fire(job);
            }
        }

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Utc::now());
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire every job whose next_run has arrived and reschedule it.
    fn tick(&mut self, now: DateTime<Utc>) {
        for job in &mut self.jobs {
            let due = job.next_run.is_some_and(|t| t <= now);
            if !due {
                continue;
            }
            fire(job);
            job.next_run = compute_next_run(&job.schedule, now);
        }
    }
}

fn fire(job: &ScheduledJob) {
    if let Err(e) = (job.run)() {
        // The loop must survive any single job failure.
        error!(job = %job.name, "job failed: {e:#}");
    }
}
