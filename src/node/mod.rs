//! # Node System - Leaves and Composites of a Plan's Behavior Tree
//!
//! A behavior tree is ticked from the root once per scheduler round. Every node
//! is a [`Behavior`] wrapped in a [`TreeNode`], which remembers the status the
//! node returned last and drives its hooks:
//!
//! ### 1. Activation (`on_activate`)
//! Called whenever the node is ticked while it is not already `Running`: the
//! first tick ever, and every re-entry after it finished or was stopped.
//!
//! ### 2. Evaluation (`evaluate`)
//! Called on every tick, right after activation if there was one. Returns the
//! node's new [`Status`]. Evaluation must not block: long work belongs to an
//! [`Action`](crate::action::Action) run by the plan's executor.
//!
//! ### 3. Stop (`on_stop`)
//! Called when the node finishes or when a parent interrupts it while running.
//!
//! ## Node Types
//!
//! - [`ConditionNode`]: wraps a predicate; `Success` once it holds, `Running`
//!   until then. Never fails.
//! - [`CommandNode`]: dispatches a work item once per activation and reports
//!   `Success` after the executor marks it complete. Never fails.
//! - [`Sequence`] / [`Selector`]: the two composites plans are built from.
//!
//! ## Built-in Helpers (feature: `builtin-nodes`)
//! - **DelayAction**: sleeps, for simulated motion and tests
//! - **LogAction**: emits a tracing event
//! - **Flag**: a shared boolean with a predicate and a setter action

use crate::BoxError;
use std::fmt;

pub mod command;
pub mod composite;
pub mod condition;

pub use command::CommandNode;
pub use composite::{Selector, Sequence};
pub use condition::ConditionNode;

/// Result type for tree-level operations
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors raised while ticking a tree. Any of them aborts the current tick.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Predicate of condition '{node}' failed: {source}")]
    PredicateFailed { node: String, source: BoxError },
    #[error("Work queue closed, command '{node}' cannot be dispatched")]
    QueueClosed { node: String },
}

/// Status of a node after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    Success,
    Failure,
    Running,
    /// Not ticked since construction or since it was last stopped
    #[default]
    Invalid,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Failure => write!(f, "failure"),
            Status::Running => write!(f, "running"),
            Status::Invalid => write!(f, "-"),
        }
    }
}

/// What a node is, for rendering and plan validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Condition,
    Command,
    Sequence,
    Selector,
    /// Any other user-supplied behavior
    Custom,
}

impl NodeKind {
    /// Prefix used by the tree renderer
    pub fn glyph(self) -> &'static str {
        match self {
            NodeKind::Sequence => "[-]",
            NodeKind::Selector => "[o]",
            NodeKind::Condition | NodeKind::Command | NodeKind::Custom => "-->",
        }
    }
}

/// Core trait for everything that can sit in a plan's tree.
pub trait Behavior: Send {
    /// Get the node's name
    fn name(&self) -> &str;

    /// Get the node's kind
    fn kind(&self) -> NodeKind {
        NodeKind::Custom
    }

    /// Called on each not-running to running transition, before `evaluate`
    fn on_activate(&mut self) -> NodeResult<()> {
        Ok(())
    }

    /// Called once per tick
    fn evaluate(&mut self) -> NodeResult<Status>;

    /// Called when the node finishes or is interrupted
    fn on_stop(&mut self) {}

    /// Child nodes, empty for leaves
    fn children(&self) -> &[TreeNode] {
        &[]
    }
}

/// A [`Behavior`] together with the status it last reported.
pub struct TreeNode {
    behavior: Box<dyn Behavior>,
    status: Status,
}

impl TreeNode {
    /// Wrap a behavior; its status starts out `Invalid`
    pub fn new(behavior: impl Behavior + 'static) -> Self {
        Self::from_boxed(Box::new(behavior))
    }

    /// Wrap an already boxed behavior
    pub fn from_boxed(behavior: Box<dyn Behavior>) -> Self {
        Self {
            behavior,
            status: Status::Invalid,
        }
    }

    /// Tick this node once.
    ///
    /// On error the recorded status is left as it was before the tick.
    pub fn tick(&mut self) -> NodeResult<Status> {
        if self.status != Status::Running {
            self.behavior.on_activate()?;
        }

        let status = self.behavior.evaluate()?;
        self.status = status;
        if status != Status::Running {
            self.behavior.on_stop();
        }
        Ok(status)
    }

    /// Interrupt the node and reset its status to `Invalid`.
    pub fn stop(&mut self) {
        if self.status == Status::Running {
            self.behavior.on_stop();
        }
        self.status = Status::Invalid;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn kind(&self) -> NodeKind {
        self.behavior.kind()
    }

    pub fn children(&self) -> &[TreeNode] {
        self.behavior.children()
    }
}

impl<B: Behavior + 'static> From<B> for TreeNode {
    fn from(behavior: B) -> Self {
        TreeNode::new(behavior)
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("status", &self.status)
            .field("children", &self.children())
            .finish()
    }
}

#[cfg(feature = "builtin-nodes")]
pub mod builtin;
