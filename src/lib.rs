//! # behavior-plan
//!
//! Behavior-tree plans whose leaves can start long-running asynchronous work
//! without ever blocking a tick.
//!
//! A plan is a tree that is ticked over and over until its root succeeds:
//! - **ConditionNode**: reports `Success` once its predicate holds, `Running`
//!   until then
//! - **CommandNode**: queues its action once per activation, reports `Running`
//!   until the plan's executor has finished it
//! - **CommandExecutor**: drains the plan's work queue and records completions
//!   in the shared **StatusMap**
//! - **Scheduler**: ticks one or more plans at a fixed interval until all are done
//!
//! ## Execution Models
//!
//! - **Threads**: blocking [`merged_loop`] on one thread, every executor on a
//!   thread of its own ([`Plan::spawn_executor_thread`])
//! - **Cooperative**: [`merged_loop_async`] and the executor tasks
//!   ([`Plan::spawn_executor`]) share one single-threaded tokio runtime
//!
//! ## Example
//!
//! ```rust
//! use behavior_plan::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> PlanResult<()> {
//! let mut plan = Plan::from_fn("wave", |ctx: &PlanContext| {
//!     let wave = FnAction::new("wave", |_args: ActionArgs| async {
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!         Ok::<(), BoxError>(())
//!     });
//!     Ok(ctx.command("wave", wave, ActionArgs::new()).into())
//! })?;
//!
//! let executor = plan.spawn_executor(Duration::from_millis(1))?;
//! let mut plans = [plan];
//! merged_loop_async(&mut plans, Duration::from_millis(2)).await?;
//! assert!(plans[0].is_done());
//! executor.await.unwrap()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// CORE MODULES
// ============================================================================

pub mod action;
pub mod config;
pub mod executor;
pub mod logging;
pub mod node;
pub mod plan;
pub mod queue;
pub mod scheduler;
pub mod status;
pub mod tree;

// ============================================================================
// CORE RE-EXPORTS
// ============================================================================

pub use action::{Action, ActionArgs, FnAction};
pub use config::{EngineConfig, SchedulerConfig};
pub use executor::CommandExecutor;
pub use node::{
    Behavior, CommandNode, ConditionNode, NodeError, NodeKind, NodeResult, Selector, Sequence,
    Status, TreeNode,
};
pub use plan::{Plan, PlanContext, TreeFactory, are_all_done};
pub use queue::{WorkItem, WorkQueue, WorkReceiver, work_queue};
pub use scheduler::{
    Rest, Scheduler, SchedulerReport, ThreadRest, TokioRest, drive, merged_loop,
    merged_loop_async,
};
pub use status::{CommandLifecycle, StatusMap};
pub use tree::BehaviorTree;

/// Built-in actions and helpers
#[cfg(feature = "builtin-nodes")]
pub use node::builtin::{DelayAction, Flag, LogAction, SetFlagAction};

/// Convenient re-exports for common types and traits
pub mod prelude {
    pub use crate::{
        Action, ActionArgs, Behavior, BoxError, CommandLifecycle, CommandNode, ConditionNode,
        EngineConfig, FnAction, Plan, PlanContext, PlanError, PlanResult, Scheduler,
        SchedulerConfig, Selector, Sequence, Status, StatusMap, TreeFactory, TreeNode,
        are_all_done, merged_loop, merged_loop_async,
    };

    #[cfg(feature = "builtin-nodes")]
    pub use crate::node::builtin::{DelayAction, Flag, LogAction};
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Boxed error returned by predicates and actions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for plan operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors surfaced by plans, executors and the scheduler
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A node failed during a tick
    #[error("Node error: {0}")]
    NodeError(#[from] NodeError),

    /// An action returned an error inside the executor
    #[error("Command '{node}' failed: {source}")]
    ActionFailed { node: String, source: BoxError },

    /// The plan's executor failed before this tick
    #[error("Executor of plan '{plan}' failed: {message}")]
    ExecutorFailed { plan: String, message: String },

    /// The executor was already taken out of the plan
    #[error("Executor of plan '{0}' was already taken")]
    ExecutorTaken(String),

    /// Two command nodes of one plan share a name
    #[error("Duplicate command node '{name}' in plan '{plan}'")]
    DuplicateNodeName { plan: String, name: String },

    /// The scheduler hit its configured round limit
    #[error("Plans not done after {0} rounds")]
    RoundLimitExceeded(usize),

    /// No usable async runtime
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error while reading config or starting threads
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
