//! # Scheduler - The Merged Tick Loop
//!
//! Drives a set of plans until every one of them is done: each round ticks
//! every plan once, then rests for the tick interval. The rest is the only
//! point where the loop yields, and how it yields is injected through
//! [`Rest`], so the blocking and the cooperative loop share [`drive`]:
//!
//! - [`merged_loop`] / [`Scheduler::run`] rest with `std::thread::sleep`. Each
//!   plan's executor must run on its own thread
//!   ([`Plan::spawn_executor_thread`]).
//! - [`merged_loop_async`] / [`Scheduler::run_async`] rest with
//!   `tokio::time::sleep`, letting executor tasks
//!   ([`Plan::spawn_executor`]) run on the same runtime between rounds.
//!
//! There is no way to stop early for a subset of plans. A plan whose action
//! never finishes keeps the loop going unless `max_rounds` is set.

use crate::config::SchedulerConfig;
use crate::plan::{Plan, are_all_done};
use crate::{PlanError, PlanResult};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

/// How the scheduler waits between rounds.
#[async_trait]
pub trait Rest: Send {
    async fn rest(&mut self, interval: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRest;

#[async_trait]
impl Rest for ThreadRest {
    async fn rest(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Suspends the current task on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRest;

#[async_trait]
impl Rest for TokioRest {
    async fn rest(&mut self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Summary of a finished scheduler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Rounds performed; every plan not yet done was ticked once per round
    pub rounds: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Tick `plans` round by round until all are done.
///
/// Any tick error ends the run immediately.
pub async fn drive<R>(
    plans: &mut [Plan],
    config: &SchedulerConfig,
    rest: &mut R,
) -> PlanResult<SchedulerReport>
where
    R: Rest + ?Sized,
{
    let started = Instant::now();
    let mut rounds = 0;

    while !are_all_done(plans) {
        if let Some(max_rounds) = config.max_rounds {
            if rounds >= max_rounds {
                return Err(PlanError::RoundLimitExceeded(max_rounds));
            }
        }

        for plan in plans.iter_mut() {
            plan.tick_once()?;
        }
        rounds += 1;
        debug!(round = rounds, "scheduler round complete");

        rest.rest(config.tick_interval).await;
    }

    Ok(SchedulerReport {
        rounds,
        elapsed: started.elapsed(),
    })
}

/// Runs plans with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Blocking run; the calling thread sleeps between rounds.
    ///
    /// Executors must run on their own threads
    /// ([`Plan::spawn_executor_thread`]). Calling this on a current-thread
    /// tokio runtime whose executor tasks were spawned there ([`Plan::spawn_executor`])
    /// deadlocks: the sleeping thread is the only one that could run them.
    /// Use [`Scheduler::run_async`] in that setup.
    pub fn run(&self, plans: &mut [Plan]) -> PlanResult<SchedulerReport> {
        futures::executor::block_on(drive(plans, &self.config, &mut ThreadRest))
    }

    /// Cooperative run; yields to the runtime between rounds
    pub async fn run_async(&self, plans: &mut [Plan]) -> PlanResult<SchedulerReport> {
        drive(plans, &self.config, &mut TokioRest).await
    }
}

/// Blocking merged loop with a fixed rest between rounds.
///
/// Same constraint as [`Scheduler::run`]: executors on their own threads,
/// never as tasks on the runtime of the calling thread.
pub fn merged_loop(plans: &mut [Plan], rest: Duration) -> PlanResult<SchedulerReport> {
    Scheduler::new(SchedulerConfig::new(rest)).run(plans)
}

/// Cooperative merged loop with a fixed rest between rounds
pub async fn merged_loop_async(plans: &mut [Plan], rest: Duration) -> PlanResult<SchedulerReport> {
    Scheduler::new(SchedulerConfig::new(rest)).run_async(plans).await
}
