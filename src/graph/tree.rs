//! Hierarchy tree with first-child/next-sibling links over a dense arena.
//!
//! Shape is unknown up front and grows incrementally, so nodes link to
//! each other by [`NodeId`] instead of living in nested containers.
//! Traversal is iterative with an explicit stack; depth never touches the
//! call stack.

use crate::error::{GraphError, GraphResult};
use crate::types::{FileId, NodeId, StringId};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: StringId,
    pub file: FileId,
    pub parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyTree {
    nodes: Vec<TreeNode>,
    root: Option<NodeId>,
}

impl HierarchyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `parent`. `None` inserts the root, which fails
    /// if a root already exists; a missing parent fails without mutating
    /// the tree.
    pub fn add_node(
        &mut self,
        name: StringId,
        file: FileId,
        parent: Option<NodeId>,
    ) -> GraphResult<NodeId> {
        match parent {
            None => {
                if self.root.is_some() {
                    return Err(GraphError::RootExists);
                }
                let id = self.push_node(name, file, None);
                self.root = Some(id);
                Ok(id)
            }
            Some(parent_id) => {
                if parent_id.slot() >= self.nodes.len() {
                    return Err(GraphError::ParentNotFound(parent_id));
                }
                let id = self.push_node(name, file, Some(parent_id));

                // Link as the parent's new first child.
                let old_first = self.nodes[parent_id.slot()].first_child;
                if let Some(old) = old_first {
                    self.nodes[old.slot()].prev_sibling = Some(id);
                }
                self.nodes[id.slot()].next_sibling = old_first;
                self.nodes[parent_id.slot()].first_child = Some(id);
                Ok(id)
            }
        }
    }

    fn push_node(&mut self, name: StringId, file: FileId, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_slot(self.nodes.len());
        self.nodes.push(TreeNode {
            name,
            file,
            parent,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.slot())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Direct children of `id`, in most-recently-added-first order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut next = self.get(id).and_then(|n| n.first_child);
        while let Some(child) = next {
            out.push(child);
            next = self.nodes[child.slot()].next_sibling;
        }
        out
    }

    /// Depth-first walk from the root, explicit stack, children before
    /// siblings.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };

        let mut stack = vec![root];
        let mut visited = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut visited[id.slot()], true) {
                continue;
            }
            order.push(id);
            // Push siblings first so children are visited before them.
            let node = &self.nodes[id.slot()];
            if let Some(sibling) = node.next_sibling {
                stack.push(sibling);
            }
            if let Some(child) = node.first_child {
                stack.push(child);
            }
        }
        order
    }

    /// Find the first node whose name matches, in [`walk`](Self::walk)
    /// order.
    pub fn find_by_name(&self, name: StringId) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.nodes[id.slot()].name == name)
    }

    /// Structural integrity: one root, consistent sibling back-links, and
    /// every node reachable from the root exactly once. A link cycle
    /// would make the reachable count disagree with the arena length.
    pub fn validate(&self) -> bool {
        match self.root {
            None => self.nodes.is_empty(),
            Some(root) => {
                if self.get(root).is_none_or(|n| n.parent.is_some()) {
                    return false;
                }
                for (slot, node) in self.nodes.iter().enumerate() {
                    let id = NodeId::from_slot(slot);
                    if node.parent.is_none() && id != root {
                        return false;
                    }
                    if let Some(next) = node.next_sibling {
                        match self.get(next) {
                            Some(n) if n.prev_sibling == Some(id) => {}
                            _ => return false,
                        }
                    }
                    if let Some(child) = node.first_child {
                        match self.get(child) {
                            Some(c) if c.parent == Some(id) && c.prev_sibling.is_none() => {}
                            _ => return false,
                        }
                    }
                }
                self.walk().len() == self.nodes.len()
            }
        }
    }
}
