use super::{Behavior, NodeKind, NodeResult, Status, TreeNode};

/// Runs children in order and succeeds when all of them have.
///
/// The sequence remembers which child is running and resumes there on the
/// next tick, so children that already succeeded are not re-evaluated until
/// the sequence itself is re-activated. An empty sequence succeeds.
pub struct Sequence {
    name: String,
    children: Vec<TreeNode>,
    current: usize,
}

impl Sequence {
    pub fn new(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            children,
            current: 0,
        }
    }
}

impl Behavior for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Sequence
    }

    fn on_activate(&mut self) -> NodeResult<()> {
        self.current = 0;
        Ok(())
    }

    fn evaluate(&mut self) -> NodeResult<Status> {
        while self.current < self.children.len() {
            match self.children[self.current].tick()? {
                Status::Success => self.current += 1,
                Status::Running => return Ok(Status::Running),
                // Invalid never comes out of a tick
                Status::Failure | Status::Invalid => return Ok(Status::Failure),
            }
        }
        Ok(Status::Success)
    }

    fn on_stop(&mut self) {
        for child in self.children.iter_mut() {
            if child.status() == Status::Running {
                child.stop();
            }
        }
    }

    fn children(&self) -> &[TreeNode] {
        &self.children
    }
}

/// Tries children in priority order and reports the first that does not fail.
///
/// Every tick starts again from the first child. When a higher-priority child
/// starts running or succeeds, lower-priority children that were running are
/// stopped. An empty selector fails.
pub struct Selector {
    name: String,
    children: Vec<TreeNode>,
}

impl Selector {
    pub fn new(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl Behavior for Selector {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Selector
    }

    fn evaluate(&mut self) -> NodeResult<Status> {
        for i in 0..self.children.len() {
            let status = self.children[i].tick()?;
            if status == Status::Failure {
                continue;
            }
            for lower in self.children[i + 1..].iter_mut() {
                if lower.status() == Status::Running {
                    lower.stop();
                }
            }
            return Ok(status);
        }
        Ok(Status::Failure)
    }

    fn on_stop(&mut self) {
        for child in self.children.iter_mut() {
            if child.status() == Status::Running {
                child.stop();
            }
        }
    }

    fn children(&self) -> &[TreeNode] {
        &self.children
    }
}
