//! Compressed radix tree, one instance per HTTP method.
//!
//! Nodes carry multi-character edge labels. `indices` mirrors `children`:
//! its i-th byte is the first byte of the i-th child's label, so child
//! dispatch is a linear byte scan biased toward high-priority (hot)
//! branches. Parameter children hang off `wild_child`; catch-all children
//! are indexed under `/` and terminate their branch.

mod find;
mod insert;

#[cfg(test)]
mod find_test;
#[cfg(test)]
mod insert_test;

use crate::context::Handler;
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Root,
    #[default]
    Static,
    Param,
    CatchAll,
}

#[derive(Default)]
pub(crate) struct Node {
    pub(crate) path: String,
    pub(crate) indices: Vec<u8>,
    pub(crate) wild_child: bool,
    pub(crate) kind: NodeKind,
    pub(crate) priority: u32,
    pub(crate) children: Vec<Node>,
    pub(crate) handler: Option<Handler>,
    pub(crate) params: Vec<String>,
}

impl Node {
    /// Bump a child's priority and bubble it toward the front of the
    /// child list, permuting `indices` in lock-step. Returns the child's
    /// new position.
    pub(crate) fn increment_child_priority(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let priority = self.children[pos].priority;
        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < priority {
            self.children.swap(new_pos - 1, new_pos);
            self.indices.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }
        new_pos
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("indices", &String::from_utf8_lossy(&self.indices))
            .field("wild_child", &self.wild_child)
            .field("priority", &self.priority)
            .field("handler", &self.handler.is_some())
            .field("params", &self.params)
            .field("children", &self.children)
            .finish()
    }
}
