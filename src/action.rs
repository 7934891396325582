//! # Actions - Long-Running Work Behind Command Nodes
//!
//! An [`Action`] is the external unit of work a
//! [`CommandNode`](crate::node::CommandNode) hands to the
//! [`CommandExecutor`](crate::executor::CommandExecutor): drive an arm to a
//! pose, wait for a gripper, call a planner service. The core only cares that
//! the call eventually finishes; any return value is the action's own business.
//!
//! Arguments are bound when the node is built and travel with the work item:
//! positional values and named values, both as `serde_json::Value`.
//!
//! ```rust
//! use behavior_plan::prelude::*;
//! use serde_json::json;
//!
//! let args = ActionArgs::new()
//!     .arg(json!("left_arm"))
//!     .named("speed", json!(0.25));
//!
//! let move_arm = FnAction::new("move_arm", |args: ActionArgs| async move {
//!     let _arm = args.get(0).and_then(|v| v.as_str()).unwrap_or("right_arm");
//!     Ok::<(), BoxError>(())
//! });
//! # let _ = (args, move_arm);
//! ```

use crate::BoxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;

/// Positional and named arguments bound to an action at node construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionArgs {
    /// Positional arguments, in call order
    #[serde(default)]
    pub positional: Vec<Value>,
    /// Named arguments
    #[serde(default)]
    pub named: Map<String, Value>,
}

impl ActionArgs {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    /// Add or replace a named argument
    pub fn named(mut self, key: impl Into<String>, value: Value) -> Self {
        self.named.insert(key.into(), value);
        self
    }

    /// Get a positional argument by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Get a named argument by key
    pub fn get_named(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    /// Check if there are no arguments at all
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl fmt::Display for ActionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "args={}, kwargs={}",
            Value::Array(self.positional.clone()),
            Value::Object(self.named.clone())
        )
    }
}

/// An asynchronously invokable unit of work.
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action to completion with the bound arguments.
    ///
    /// An error is fatal to the executor that awaited it.
    async fn call(&self, args: &ActionArgs) -> Result<(), BoxError>;

    /// Get the action's name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapts an async closure into an [`Action`].
///
/// The closure receives its own copy of the arguments, so the future it
/// returns does not borrow from the work item.
pub struct FnAction<F> {
    name: String,
    func: F,
}

impl<F, Fut> FnAction<F>
where
    F: Fn(ActionArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    /// Create a new function-based action
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> Action for FnAction<F>
where
    F: Fn(ActionArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    async fn call(&self, args: &ActionArgs) -> Result<(), BoxError> {
        (self.func)(args.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
