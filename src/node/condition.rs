use super::{Behavior, NodeError, NodeKind, NodeResult, Status};
use crate::BoxError;
use tracing::info;

type PredicateFn = Box<dyn FnMut() -> Result<bool, BoxError> + Send>;

/// Leaf that turns a predicate into tree status.
///
/// A predicate that does not hold yet means "not yet", so the node reports
/// `Running` and keeps its branch waiting instead of failing it. Arguments the
/// predicate needs are captured by the closure when the node is built.
pub struct ConditionNode {
    name: String,
    predicate: PredicateFn,
    verbose: bool,
}

impl ConditionNode {
    /// Create a condition from an infallible predicate
    pub fn new<F>(name: impl Into<String>, mut predicate: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self::fallible(name, move || Ok(predicate()))
    }

    /// Create a condition from a predicate that may fail.
    ///
    /// A failing predicate aborts the tick with [`NodeError::PredicateFailed`].
    pub fn fallible<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: FnMut() -> Result<bool, BoxError> + Send + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            verbose: true,
        }
    }

    /// Set whether a satisfied condition is logged
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Behavior for ConditionNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Condition
    }

    fn evaluate(&mut self) -> NodeResult<Status> {
        let holds = (self.predicate)().map_err(|source| NodeError::PredicateFailed {
            node: self.name.clone(),
            source,
        })?;

        if !holds {
            return Ok(Status::Running);
        }
        if self.verbose {
            info!(node = %self.name, "condition ok -> success");
        }
        Ok(Status::Success)
    }
}
