//! Dependency structures layered over the project arenas.
//!
//! Three flat dependency lists (include, function-call, type), one
//! hierarchy tree, and one call graph. Everything references project
//! entities by index; the graph holds no entity data of its own.

pub mod calls;
pub mod deps;
pub mod tree;

pub use calls::{CallEdge, CallGraph};
pub use deps::{DependencyList, DependencyNode};
pub use tree::{HierarchyTree, TreeNode};

use crate::types::DependencyKind;

/// The combined dependency structure owned by a
/// [`Project`](crate::Project).
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub includes: DependencyList<()>,
    pub function_calls: DependencyList<()>,
    pub types: DependencyList<()>,
    pub hierarchy: HierarchyTree,
    pub call_graph: CallGraph,
}

impl DependencyGraph {
    /// `call_nodes` is the fixed upper bound on call-graph node count,
    /// supplied by the project at init time.
    pub fn new(call_nodes: usize) -> Self {
        Self {
            includes: DependencyList::new(DependencyKind::Include),
            function_calls: DependencyList::new(DependencyKind::FunctionCall),
            types: DependencyList::new(DependencyKind::Type),
            hierarchy: HierarchyTree::new(),
            call_graph: CallGraph::new(call_nodes),
        }
    }

    pub fn list(&self, kind: DependencyKind) -> &DependencyList<()> {
        match kind {
            DependencyKind::Include => &self.includes,
            DependencyKind::FunctionCall => &self.function_calls,
            DependencyKind::Type => &self.types,
        }
    }

    pub fn list_mut(&mut self, kind: DependencyKind) -> &mut DependencyList<()> {
        match kind {
            DependencyKind::Include => &mut self.includes,
            DependencyKind::FunctionCall => &mut self.function_calls,
            DependencyKind::Type => &mut self.types,
        }
    }

    /// Logical AND of every sub-structure's validation.
    pub fn validate(&self) -> bool {
        self.includes.validate()
            && self.function_calls.validate()
            && self.types.validate()
            && self.hierarchy.validate()
            && self.call_graph.validate()
    }
}
