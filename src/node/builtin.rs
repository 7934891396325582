//! Built-in actions and condition helpers (feature: `builtin-nodes`).
//!
//! - [`DelayAction`]: sleeps, standing in for motion that takes time
//! - [`LogAction`]: emits a tracing event and finishes
//! - [`Flag`]: a shared boolean that one branch waits on and another sets

use crate::BoxError;
use crate::action::{Action, ActionArgs};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// An action that sleeps, then finishes.
///
/// A named `ms` argument overrides the configured duration for one call.
#[derive(Debug, Clone)]
pub struct DelayAction {
    duration: Duration,
}

impl DelayAction {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    fn duration_for(&self, args: &ActionArgs) -> Duration {
        args.get_named("ms")
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis)
            .unwrap_or(self.duration)
    }
}

#[async_trait]
impl Action for DelayAction {
    async fn call(&self, args: &ActionArgs) -> Result<(), BoxError> {
        tokio::time::sleep(self.duration_for(args)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "DelayAction"
    }
}

/// An action that logs a message, followed by its arguments.
#[derive(Debug, Clone)]
pub struct LogAction {
    message: String,
}

impl LogAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Action for LogAction {
    async fn call(&self, args: &ActionArgs) -> Result<(), BoxError> {
        info!("{} ({})", self.message, args);
        Ok(())
    }

    fn name(&self) -> &str {
        "LogAction"
    }
}

/// A boolean shared between predicates and actions.
#[derive(Debug, Clone, Default)]
pub struct Flag {
    inner: Arc<AtomicBool>,
}

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.inner.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.inner.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Predicate for a condition node that waits for the flag
    pub fn predicate(&self) -> impl FnMut() -> bool + Send + 'static {
        let flag = self.clone();
        move || flag.is_set()
    }

    /// Action that sets the flag when run
    pub fn set_action(&self) -> SetFlagAction {
        SetFlagAction { flag: self.clone() }
    }
}

/// Sets a [`Flag`].
#[derive(Debug, Clone)]
pub struct SetFlagAction {
    flag: Flag,
}

#[async_trait]
impl Action for SetFlagAction {
    async fn call(&self, _args: &ActionArgs) -> Result<(), BoxError> {
        self.flag.set();
        Ok(())
    }

    fn name(&self) -> &str {
        "SetFlagAction"
    }
}
