//! Command lifecycle tracking shared between the tick loop and the executor.
//!
//! Every [`CommandNode`](crate::node::CommandNode) owns exactly one entry in the
//! [`StatusMap`] of its plan, keyed by the node name. The entry moves through
//! three states per activation:
//!
//! ```text
//! Inactive --(node, first tick)--> Running --(executor, action done)--> Complete
//! ```
//!
//! The only backwards edge is [`StatusMap::reset`], which the node performs
//! when the tree re-activates it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Progress marker for one command node's asynchronous action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandLifecycle {
    /// Activated but not dispatched yet
    #[default]
    Inactive,
    /// Work item queued or in flight
    Running,
    /// The executor finished the action
    Complete,
}

impl fmt::Display for CommandLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandLifecycle::Inactive => write!(f, "inactive"),
            CommandLifecycle::Running => write!(f, "running"),
            CommandLifecycle::Complete => write!(f, "complete"),
        }
    }
}

/// Concurrency-safe map from node name to [`CommandLifecycle`].
///
/// Cloning is cheap and every clone refers to the same underlying map, so the
/// tick thread and the executor (task or thread) can each hold one. Reads and
/// writes of distinct keys never interfere.
#[derive(Debug, Clone, Default)]
pub struct StatusMap {
    entries: Arc<RwLock<HashMap<String, CommandLifecycle>>>,
}

impl StatusMap {
    /// Creates an empty status map
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the lifecycle of a node, if the node has ever been activated.
    pub fn get(&self, name: &str) -> Option<CommandLifecycle> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Resets a node to [`CommandLifecycle::Inactive`], creating the entry if
    /// needed. Called on every activation of the node.
    pub fn reset(&self, name: &str) {
        self.write(name, CommandLifecycle::Inactive);
    }

    /// Marks a node as dispatched. Returns `false` and leaves the entry alone
    /// unless it is currently `Inactive` (or absent).
    pub fn mark_running(&self, name: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(name.to_string()).or_default();
        if *entry != CommandLifecycle::Inactive {
            return false;
        }
        *entry = CommandLifecycle::Running;
        true
    }

    /// Marks a node's action as finished and returns the state it replaced.
    ///
    /// The write happens whatever the previous state was. A previous state
    /// other than `Running` means the node was re-activated while its earlier
    /// work item was still in flight, and that completion now lands on the
    /// newer activation.
    pub fn mark_complete(&self, name: &str) -> Option<CommandLifecycle> {
        let previous = self.write(name, CommandLifecycle::Complete);
        if previous != Some(CommandLifecycle::Running) {
            tracing::warn!(
                node = name,
                previous = ?previous,
                "completion recorded for a command that was not running"
            );
        }
        previous
    }

    /// Checks if a node has an entry.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Gets all node names with an entry.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Gets the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Checks if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the current state of every entry, for diagnostics.
    pub fn snapshot(&self) -> HashMap<String, CommandLifecycle> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self, name: &str, lifecycle: CommandLifecycle) -> Option<CommandLifecycle> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), lifecycle)
    }
}
