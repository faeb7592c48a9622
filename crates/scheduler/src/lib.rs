//! `scheduler` crate — cron-triggered re-execution of stored workflows.
//!
//! Each job owns a tick task that sleeps until the next cron boundary and
//! then tries to fire. `max_instances = 1`: a fire that arrives while the
//! prior run is still in flight is dropped, never queued. The engine is
//! reached through the [`WorkflowRunner`] trait so this crate stays a leaf.

pub mod error;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::Serialize;
use tracing::{info, warn};

pub use error::ScheduleError;

/// Callback the scheduler fires into; implemented over the engine at wiring
/// time.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Execute the stored workflow with this id. Failures are the runner's
    /// to log; the scheduler only cares about completion.
    async fn run_scheduled(&self, workflow_id: &str);
}

/// Outcome of a single fire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The run was started and has completed.
    Completed,
    /// A prior run of the same job was still in flight; this fire was dropped.
    DroppedOverlap,
    /// No job is registered under that id.
    UnknownJob,
}

/// Listing entry for one scheduled job.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub workflow_id: String,
    pub next_run: Option<DateTime<Utc>>,
    pub trigger: String,
}

struct Job {
    expression: String,
    schedule: Schedule,
    /// Overlap guard: held for the duration of a fire.
    guard: Arc<tokio::sync::Mutex<()>>,
    tick_task: tokio::task::JoinHandle<()>,
}

/// Process-wide cron job registry.
pub struct Scheduler {
    jobs: Mutex<HashMap<String, Job>>,
    runner: OnceLock<Arc<dyn WorkflowRunner>>,
    /// Handed to tick tasks so they never keep the registry alive.
    self_weak: Weak<Scheduler>,
}

impl Scheduler {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            jobs: Mutex::new(HashMap::new()),
            runner: OnceLock::new(),
            self_weak: weak.clone(),
        })
    }

    /// Wire the runner once at startup. Fires before this is set are dropped
    /// with a warning.
    pub fn set_runner(&self, runner: Arc<dyn WorkflowRunner>) {
        if self.runner.set(runner).is_err() {
            warn!("scheduler runner was already set");
        }
    }

    /// Register (or replace) a cron trigger for `workflow_id`.
    pub fn add(&self, workflow_id: &str, cron_expr: &str) -> Result<(), ScheduleError> {
        let schedule = parse_cron(cron_expr)?;

        let tick_task = spawn_tick_loop(
            self.self_weak.clone(),
            workflow_id.to_owned(),
            schedule.clone(),
        );

        let job = Job {
            expression: cron_expr.to_owned(),
            schedule,
            guard: Arc::new(tokio::sync::Mutex::new(())),
            tick_task,
        };

        let mut jobs = self.jobs.lock().unwrap();
        if let Some(previous) = jobs.insert(workflow_id.to_owned(), job) {
            previous.tick_task.abort();
            info!(workflow_id, "replaced existing schedule");
        } else {
            info!(workflow_id, cron = cron_expr, "registered schedule");
        }
        Ok(())
    }

    /// Remove a scheduled job. An in-flight fire is not cancelled.
    pub fn remove(&self, workflow_id: &str) -> Result<(), ScheduleError> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.remove(workflow_id) {
            Some(job) => {
                job.tick_task.abort();
                info!(workflow_id, "removed schedule");
                Ok(())
            }
            None => Err(ScheduleError::NotFound(workflow_id.to_owned())),
        }
    }

    pub fn contains(&self, workflow_id: &str) -> bool {
        self.jobs.lock().unwrap().contains_key(workflow_id)
    }

    pub fn list(&self) -> Vec<JobInfo> {
        let now = Utc::now();
        let jobs = self.jobs.lock().unwrap();
        let mut infos: Vec<JobInfo> = jobs
            .iter()
            .map(|(id, job)| JobInfo {
                workflow_id: id.clone(),
                next_run: job.schedule.after(&now).next(),
                trigger: format!("cron[{}]", job.expression),
            })
            .collect();
        infos.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
        infos
    }

    /// Attempt one fire of `workflow_id`, honouring the overlap guard.
    pub async fn try_fire(&self, workflow_id: &str) -> FireOutcome {
        let guard = {
            let jobs = self.jobs.lock().unwrap();
            match jobs.get(workflow_id) {
                Some(job) => job.guard.clone(),
                None => return FireOutcome::UnknownJob,
            }
        };

        let Ok(_held) = guard.try_lock() else {
            warn!(workflow_id, "previous scheduled run still in flight, dropping fire");
            return FireOutcome::DroppedOverlap;
        };

        match self.runner.get() {
            Some(runner) => {
                info!(workflow_id, "scheduled fire");
                runner.run_scheduled(workflow_id).await;
                FireOutcome::Completed
            }
            None => {
                warn!(workflow_id, "no workflow runner wired, dropping fire");
                FireOutcome::DroppedOverlap
            }
        }
    }
}

fn spawn_tick_loop(
    scheduler: Weak<Scheduler>,
    workflow_id: String,
    schedule: Schedule,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(next) = schedule.after(&now).next() else {
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let Some(scheduler) = scheduler.upgrade() else {
                break;
            };
            scheduler.try_fire(&workflow_id).await;
        }
    })
}

/// Parse a classic five-field cron expression (minute, hour, day-of-month,
/// month, day-of-week). The seconds field required by the underlying parser
/// is pinned to zero.
pub fn parse_cron(expr: &str) -> Result<Schedule, ScheduleError> {
    let fields = expr.split_whitespace().count();
    if fields != 5 {
        return Err(ScheduleError::InvalidExpression(format!(
            "expected 5 fields, got {fields}: '{expr}'"
        )));
    }
    Schedule::from_str(&format!("0 {expr}"))
        .map_err(|e| ScheduleError::InvalidExpression(format!("'{expr}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingRunner {
        runs: AtomicUsize,
        delay: Duration,
    }

    impl CountingRunner {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self { runs: AtomicUsize::new(0), delay })
        }
    }

    #[async_trait]
    impl WorkflowRunner for CountingRunner {
        async fn run_scheduled(&self, _workflow_id: &str) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
        }
    }

    #[test]
    fn five_field_expressions_parse() {
        assert!(parse_cron("*/1 * * * *").is_ok());
        assert!(parse_cron("0 9 * * 1-5").is_ok());
        assert!(parse_cron("bad").is_err());
        assert!(parse_cron("0 0 * * * *").is_err()); // six fields
    }

    #[test]
    fn next_fire_lands_on_the_minute_boundary() {
        let schedule = parse_cron("*/1 * * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 30).unwrap();
        let next = schedule.after(&after).next().unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap());
    }

    #[tokio::test]
    async fn add_list_remove_round_trip() {
        let scheduler = Scheduler::new();
        scheduler.add("wf-1", "*/5 * * * *").unwrap();

        let listing = scheduler.list();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].workflow_id, "wf-1");
        assert_eq!(listing[0].trigger, "cron[*/5 * * * *]");
        assert!(listing[0].next_run.unwrap() > Utc::now());

        scheduler.remove("wf-1").unwrap();
        assert!(scheduler.list().is_empty());

        // Second removal is the not-found error, with no side effect.
        assert!(matches!(
            scheduler.remove("wf-1"),
            Err(ScheduleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn re_registering_replaces_the_previous_trigger() {
        let scheduler = Scheduler::new();
        scheduler.add("wf-1", "*/5 * * * *").unwrap();
        scheduler.add("wf-1", "0 12 * * *").unwrap();

        let listing = scheduler.list();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].trigger, "cron[0 12 * * *]");
    }

    #[tokio::test]
    async fn overlapping_fires_are_dropped_not_queued() {
        let scheduler = Scheduler::new();
        let runner = CountingRunner::new(Duration::from_millis(200));
        scheduler.set_runner(runner.clone());
        scheduler.add("wf-1", "*/1 * * * *").unwrap();

        // First fire holds the guard for 200 ms.
        let first = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.try_fire("wf-1").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Second fire while the first is in flight: dropped.
        assert_eq!(scheduler.try_fire("wf-1").await, FireOutcome::DroppedOverlap);
        assert_eq!(first.await.unwrap(), FireOutcome::Completed);
        assert_eq!(runner.runs.load(Ordering::SeqCst), 1);

        // After completion the next fire starts normally.
        assert_eq!(scheduler.try_fire("wf-1").await, FireOutcome::Completed);
        assert_eq!(runner.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn firing_an_unknown_job_is_reported() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.try_fire("ghost").await, FireOutcome::UnknownJob);
    }
}
