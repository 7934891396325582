//! A rooted behavior tree with a tick counter and a text renderer.

use crate::node::{NodeResult, Status, TreeNode};
use std::fmt::Write;

/// Owns the root of a plan's tree.
#[derive(Debug)]
pub struct BehaviorTree {
    root: TreeNode,
    count: u64,
}

impl BehaviorTree {
    pub fn new(root: TreeNode) -> Self {
        Self { root, count: 0 }
    }

    /// Tick the whole tree once from the root
    pub fn tick(&mut self) -> NodeResult<Status> {
        self.count += 1;
        self.root.tick()
    }

    /// Status the root reported on the last tick
    pub fn root_status(&self) -> Status {
        self.root.status()
    }

    /// Number of ticks started so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Render the tree structure, one node per line.
    ///
    /// ```text
    /// [-] pick [running]
    ///     --> part_visible [success]
    ///     --> grasp [running]
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_node(&self.root, 0, &mut out);
        out
    }
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    // Writing into a String cannot fail
    let _ = writeln!(
        out,
        "{}{} {} [{}]",
        "    ".repeat(depth),
        node.kind().glyph(),
        node.name(),
        node.status()
    );
    for child in node.children() {
        render_node(child, depth + 1, out);
    }
}
