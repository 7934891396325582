//! # Plans - One Tree, One Queue, One Status Map
//!
//! A [`Plan`] is a behavior tree tickable to completion on its own. At
//! construction it creates a private work queue and [`StatusMap`], then asks a
//! [`TreeFactory`] to build the tree from nodes wired to that pair through a
//! [`PlanContext`]:
//!
//! ```rust
//! use behavior_plan::prelude::*;
//! use serde_json::json;
//!
//! let plan = Plan::from_fn("pick", |ctx: &PlanContext| {
//!     let grasp = FnAction::new("grasp", |_args: ActionArgs| async { Ok::<(), BoxError>(()) });
//!     Ok(Sequence::new(
//!         "pick",
//!         vec![
//!             ctx.condition("part_visible", || true).into(),
//!             ctx.command("grasp", grasp, ActionArgs::new().arg(json!(0.4))).into(),
//!         ],
//!     )
//!     .into())
//! })
//! .unwrap();
//! assert!(!plan.is_done());
//! ```
//!
//! The plan is done once its root reports `Success` after a tick. Its
//! executor is taken out once with [`Plan::executor`] (or one of the spawn
//! helpers) and runs next to the tick loop until then.

use crate::action::{Action, ActionArgs};
use crate::config::EngineConfig;
use crate::executor::CommandExecutor;
use crate::node::{CommandNode, ConditionNode, NodeKind, Status, TreeNode};
use crate::queue::{WorkQueue, WorkReceiver, work_queue};
use crate::status::StatusMap;
use crate::tree::BehaviorTree;
use crate::{BoxError, PlanError, PlanResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

/// State a plan shares with its executor.
#[derive(Debug, Default)]
pub(crate) struct PlanSignal {
    done: AtomicBool,
    fault: OnceLock<String>,
}

impl PlanSignal {
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Record the first executor failure; later ones are dropped
    pub(crate) fn fail(&self, message: String) {
        let _ = self.fault.set(message);
    }

    fn fault(&self) -> Option<&str> {
        self.fault.get().map(String::as_str)
    }
}

/// Builds the tree of a plan.
pub trait TreeFactory {
    fn create_tree(&self, ctx: &PlanContext) -> PlanResult<TreeNode>;
}

impl<F> TreeFactory for F
where
    F: Fn(&PlanContext) -> PlanResult<TreeNode>,
{
    fn create_tree(&self, ctx: &PlanContext) -> PlanResult<TreeNode> {
        self(ctx)
    }
}

/// Hands a plan's queue and status map to the nodes of its tree.
#[derive(Debug, Clone)]
pub struct PlanContext {
    plan: String,
    queue: WorkQueue,
    status: StatusMap,
    verbose: bool,
}

impl PlanContext {
    /// Name of the plan being built
    pub fn plan_name(&self) -> &str {
        &self.plan
    }

    /// Build a condition node
    pub fn condition<F>(&self, name: impl Into<String>, predicate: F) -> ConditionNode
    where
        F: FnMut() -> bool + Send + 'static,
    {
        ConditionNode::new(name, predicate).verbose(self.verbose)
    }

    /// Build a condition node from a predicate that may fail
    pub fn fallible_condition<F>(&self, name: impl Into<String>, predicate: F) -> ConditionNode
    where
        F: FnMut() -> Result<bool, BoxError> + Send + 'static,
    {
        ConditionNode::fallible(name, predicate).verbose(self.verbose)
    }

    /// Build a command node running `action` with `args`
    pub fn command<A>(&self, name: impl Into<String>, action: A, args: ActionArgs) -> CommandNode
    where
        A: Action + 'static,
    {
        self.command_shared(name, Arc::new(action), args)
    }

    /// Build a command node from an action shared with other nodes
    pub fn command_shared(
        &self,
        name: impl Into<String>,
        action: Arc<dyn Action>,
        args: ActionArgs,
    ) -> CommandNode {
        CommandNode::new(name, self.queue.clone(), self.status.clone(), action, args)
            .verbose(self.verbose)
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn status_map(&self) -> &StatusMap {
        &self.status
    }
}

/// A behavior tree plus its private work queue and status map.
#[derive(Debug)]
pub struct Plan {
    name: String,
    tree: BehaviorTree,
    status: StatusMap,
    receiver: Option<WorkReceiver>,
    signal: Arc<PlanSignal>,
}

impl Plan {
    /// Create a plan with the default config
    pub fn new(name: impl Into<String>, factory: impl TreeFactory) -> PlanResult<Self> {
        Self::with_config(name, factory, &EngineConfig::default())
    }

    /// Create a plan from a tree-building closure
    pub fn from_fn<F>(name: impl Into<String>, factory: F) -> PlanResult<Self>
    where
        F: Fn(&PlanContext) -> PlanResult<TreeNode>,
    {
        Self::new(name, factory)
    }

    /// Create a plan, building its tree once.
    ///
    /// Fails with [`PlanError::DuplicateNodeName`] if two command nodes share
    /// a name, since they would share one status entry.
    pub fn with_config(
        name: impl Into<String>,
        factory: impl TreeFactory,
        config: &EngineConfig,
    ) -> PlanResult<Self> {
        let name = name.into();
        let (queue, receiver) = work_queue();
        let status = StatusMap::new();
        let ctx = PlanContext {
            plan: name.clone(),
            queue,
            status: status.clone(),
            verbose: config.verbose,
        };

        let root = factory.create_tree(&ctx)?;
        check_command_names(&name, &root, &mut HashSet::new())?;
        debug!(plan = %name, root = root.name(), "plan created");

        Ok(Self {
            name,
            tree: BehaviorTree::new(root),
            status,
            receiver: Some(receiver),
            signal: Arc::new(PlanSignal::default()),
        })
    }

    /// Tick the tree once unless the plan is already done.
    ///
    /// Marks the plan done when the root reports `Success`. Fails if a node
    /// fails or if the executor has failed since the last tick.
    pub fn tick_once(&mut self) -> PlanResult<()> {
        if self.is_done() {
            return Ok(());
        }
        if let Some(fault) = self.signal.fault() {
            return Err(PlanError::ExecutorFailed {
                plan: self.name.clone(),
                message: fault.to_string(),
            });
        }

        let status = self.tree.tick()?;
        debug!(plan = %self.name, tick = self.tree.count(), %status, "tick");
        if status == Status::Success {
            self.signal.mark_done();
            info!(plan = %self.name, ticks = self.tree.count(), "plan complete");
        }
        Ok(())
    }

    /// Take the executor for this plan. Only the first call succeeds.
    pub fn executor(&mut self) -> PlanResult<CommandExecutor> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| PlanError::ExecutorTaken(self.name.clone()))?;
        Ok(CommandExecutor::new(
            self.name.clone(),
            receiver,
            self.status.clone(),
            self.signal.clone(),
        ))
    }

    /// Run the executor as a task on the current tokio runtime.
    ///
    /// On a current-thread runtime this is the cooperative model: the
    /// executor only runs while the tick loop is suspended.
    pub fn spawn_executor(
        &mut self,
        poll_interval: Duration,
    ) -> PlanResult<tokio::task::JoinHandle<PlanResult<()>>> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| PlanError::RuntimeError(e.to_string()))?;
        let executor = self.executor()?;
        Ok(handle.spawn(executor.run(poll_interval)))
    }

    /// Run the executor on a dedicated OS thread with its own runtime.
    ///
    /// The runtime has I/O and timers enabled. If it cannot be built, the
    /// failure is recorded on the plan like an action failure.
    pub fn spawn_executor_thread(
        &mut self,
        poll_interval: Duration,
    ) -> PlanResult<std::thread::JoinHandle<PlanResult<()>>> {
        let executor = self.executor()?;
        let signal = self.signal.clone();
        let handle = std::thread::Builder::new()
            .name(format!("{}-executor", self.name))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| {
                        signal.fail(format!("executor runtime failed to start: {}", e));
                        PlanError::IoError(e)
                    })?;
                runtime.block_on(executor.run(poll_interval))
            })?;
        Ok(handle)
    }

    pub fn is_done(&self) -> bool {
        self.signal.is_done()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status the root reported on the last tick
    pub fn root_status(&self) -> Status {
        self.tree.root_status()
    }

    /// Number of ticks performed
    pub fn tick_count(&self) -> u64 {
        self.tree.count()
    }

    pub fn status_map(&self) -> &StatusMap {
        &self.status
    }

    /// Structural dump of the tree, for logs
    pub fn render(&self) -> String {
        self.tree.render()
    }
}

fn check_command_names(
    plan: &str,
    node: &TreeNode,
    seen: &mut HashSet<String>,
) -> PlanResult<()> {
    if node.kind() == NodeKind::Command && !seen.insert(node.name().to_string()) {
        return Err(PlanError::DuplicateNodeName {
            plan: plan.to_string(),
            name: node.name().to_string(),
        });
    }
    for child in node.children() {
        check_command_names(plan, child, seen)?;
    }
    Ok(())
}

/// Check whether every plan is done. An empty set is done.
pub fn are_all_done(plans: &[Plan]) -> bool {
    plans.iter().all(Plan::is_done)
}
