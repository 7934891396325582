//! The single consumer of a plan's work queue.
//!
//! [`CommandExecutor::run`] loops until its plan is done: take one queued
//! [`WorkItem`] if there is one, await its action, mark the node `Complete`,
//! then rest for the poll interval. Completion is never pushed to the tree;
//! the command node sees it on its next tick.
//!
//! The loop only suspends while awaiting an action or sleeping, so it can run
//! as a task next to the tick loop on a single-threaded runtime, or on a
//! thread of its own (see [`Plan::spawn_executor_thread`](crate::plan::Plan::spawn_executor_thread)).

use crate::plan::PlanSignal;
use crate::queue::{WorkItem, WorkReceiver};
use crate::status::StatusMap;
use crate::{BoxError, PlanError, PlanResult};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error};

/// Runs the actions queued by one plan's command nodes.
#[derive(Debug)]
pub struct CommandExecutor {
    plan: String,
    receiver: WorkReceiver,
    status: StatusMap,
    signal: Arc<PlanSignal>,
}

impl CommandExecutor {
    pub(crate) fn new(
        plan: String,
        receiver: WorkReceiver,
        status: StatusMap,
        signal: Arc<PlanSignal>,
    ) -> Self {
        Self {
            plan,
            receiver,
            status,
            signal,
        }
    }

    /// Name of the plan this executor serves
    pub fn plan_name(&self) -> &str {
        &self.plan
    }

    /// Drain the queue until the plan is done.
    ///
    /// Returns `Ok(())` when the plan finishes or when the plan (and with it
    /// every producer) has been dropped. A failing or panicking action ends
    /// the loop with [`PlanError::ActionFailed`] and poisons the plan, whose
    /// next tick reports [`PlanError::ExecutorFailed`]. An action that never
    /// finishes keeps this future pending forever.
    pub async fn run(mut self, poll_interval: Duration) -> PlanResult<()> {
        debug!(plan = %self.plan, ?poll_interval, "executor started");

        while !self.signal.is_done() {
            match self.receiver.try_next() {
                Ok(item) => execute(&self.plan, &self.status, &self.signal, item).await?,
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    debug!(plan = %self.plan, "work queue disconnected, executor exiting");
                    return Ok(());
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        debug!(plan = %self.plan, "plan done, executor exiting");
        Ok(())
    }
}

async fn execute(
    plan: &str,
    status: &StatusMap,
    signal: &PlanSignal,
    item: WorkItem,
) -> PlanResult<()> {
    debug!(
        plan,
        node = %item.node,
        dispatch_id = %item.id,
        action = item.action.name(),
        "executing command"
    );

    // A panicking action counts as a failed one
    let outcome = AssertUnwindSafe(item.action.call(&item.args))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(panic_error(panic)));

    if let Err(source) = outcome {
        error!(plan, node = %item.node, dispatch_id = %item.id, "command failed: {}", source);
        signal.fail(format!("command '{}' failed: {}", item.node, source));
        return Err(PlanError::ActionFailed {
            node: item.node,
            source,
        });
    }

    status.mark_complete(&item.node);
    debug!(plan, node = %item.node, dispatch_id = %item.id, "command finished");
    Ok(())
}

fn panic_error(panic: Box<dyn Any + Send>) -> BoxError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("action panicked: {}", message).into()
}
