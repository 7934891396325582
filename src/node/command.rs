use super::{Behavior, NodeError, NodeKind, NodeResult, Status};
use crate::action::{Action, ActionArgs};
use crate::queue::{WorkItem, WorkQueue};
use crate::status::{CommandLifecycle, StatusMap};
use std::sync::Arc;
use tracing::info;

/// Leaf that hands an action to the plan's executor and waits for it.
///
/// The work queue decides *when* the action runs, the status map records
/// *whether* it has finished. Per activation the node:
///
/// 1. resets its status entry to `Inactive` (`on_activate`),
/// 2. on the first tick, queues one [`WorkItem`] and flips the entry to `Running`,
/// 3. reports `Running` until the executor writes `Complete`, then `Success`.
///
/// The node name is the status-map key, so it must be unique among the command
/// nodes of one plan. [`Plan`](crate::plan::Plan) rejects duplicates.
///
/// Re-activating the node while its earlier work item is still in flight
/// resets the entry and queues a second item; the earlier completion then
/// counts for the newer activation.
pub struct CommandNode {
    name: String,
    queue: WorkQueue,
    status: StatusMap,
    action: Arc<dyn Action>,
    args: ActionArgs,
    verbose: bool,
}

impl CommandNode {
    /// Create a command node bound to a plan's queue and status map
    pub fn new(
        name: impl Into<String>,
        queue: WorkQueue,
        status: StatusMap,
        action: Arc<dyn Action>,
        args: ActionArgs,
    ) -> Self {
        Self {
            name: name.into(),
            queue,
            status,
            action,
            args,
            verbose: true,
        }
    }

    /// Set whether dispatch and completion are logged
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the bound arguments
    pub fn args(&self) -> &ActionArgs {
        &self.args
    }

    fn dispatch(&mut self) -> NodeResult<()> {
        let item = WorkItem::new(self.name.clone(), self.action.clone(), self.args.clone());
        let id = item.id;
        self.queue.push(item).map_err(|_| NodeError::QueueClosed {
            node: self.name.clone(),
        })?;
        self.status.mark_running(&self.name);

        if self.verbose {
            info!(
                node = %self.name,
                dispatch_id = %id,
                action = self.action.name(),
                "command sent -> {}",
                self.args
            );
        }
        Ok(())
    }
}

impl Behavior for CommandNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Command
    }

    fn on_activate(&mut self) -> NodeResult<()> {
        self.status.reset(&self.name);
        Ok(())
    }

    fn evaluate(&mut self) -> NodeResult<Status> {
        match self.status.get(&self.name).unwrap_or_default() {
            CommandLifecycle::Inactive => {
                self.dispatch()?;
                Ok(Status::Running)
            }
            CommandLifecycle::Complete => {
                if self.verbose {
                    info!(node = %self.name, "command complete -> success");
                }
                Ok(Status::Success)
            }
            CommandLifecycle::Running => Ok(Status::Running),
        }
    }
}
