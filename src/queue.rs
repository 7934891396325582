//! The FIFO between a plan's command nodes and its executor.
//!
//! Any number of [`CommandNode`](crate::node::CommandNode)s push through cloned
//! [`WorkQueue`] handles; exactly one [`WorkReceiver`] drains it. Pushing never
//! blocks, so a tick stays synchronous in both execution models.

use crate::action::{Action, ActionArgs};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use uuid::Uuid;

/// One dispatch of a command node's action.
pub struct WorkItem {
    /// Unique id of this dispatch, for log correlation
    pub id: Uuid,
    /// Name of the command node that queued it
    pub node: String,
    /// The action to run
    pub action: Arc<dyn Action>,
    /// Arguments bound to the action
    pub args: ActionArgs,
}

impl WorkItem {
    pub fn new(node: impl Into<String>, action: Arc<dyn Action>, args: ActionArgs) -> Self {
        Self {
            id: Uuid::new_v4(),
            node: node.into(),
            action,
            args,
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("action", &self.action.name())
            .field("args", &self.args)
            .finish()
    }
}

/// Producer half, cloned into every command node of a plan.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    sender: UnboundedSender<WorkItem>,
}

impl WorkQueue {
    /// Queue an item. Hands the item back if the receiver is gone.
    pub fn push(&self, item: WorkItem) -> Result<(), WorkItem> {
        self.sender.send(item).map_err(|err| err.0)
    }

    /// Check if the receiving half has been dropped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer half, owned by the plan's single executor.
#[derive(Debug)]
pub struct WorkReceiver {
    receiver: UnboundedReceiver<WorkItem>,
}

impl WorkReceiver {
    /// Take the oldest queued item without waiting.
    ///
    /// `Err(TryRecvError::Disconnected)` means the queue is empty and every
    /// producer is gone.
    pub fn try_next(&mut self) -> Result<WorkItem, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Create a connected queue pair
pub fn work_queue() -> (WorkQueue, WorkReceiver) {
    let (sender, receiver) = unbounded_channel();
    (WorkQueue { sender }, WorkReceiver { receiver })
}
