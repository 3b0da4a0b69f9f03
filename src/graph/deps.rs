//! Flat dependency lists for include, function-call, and type edges.
//!
//! Cardinality stays small relative to total entities, so lookups and
//! removals are linear scans over a dense arena rather than anything
//! indexed. Ids are caller-assigned and unique within a list.

use crate::error::{GraphError, GraphResult};
use crate::types::{DependencyKind, FileId, StringId};

/// One recorded dependency. `payload` is whatever the instantiating layer
/// attaches; the list stores it but never interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyNode<P> {
    pub id: u32,
    pub name: StringId,
    pub file: FileId,
    pub payload: P,
}

#[derive(Debug, Clone)]
pub struct DependencyList<P> {
    kind: DependencyKind,
    nodes: Vec<DependencyNode<P>>,
}

impl<P> DependencyList<P> {
    pub fn new(kind: DependencyKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
        }
    }

    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    /// Append a dependency. Fails when `id` is already present; nothing
    /// is committed in that case.
    pub fn add(&mut self, id: u32, name: StringId, file: FileId, payload: P) -> GraphResult<()> {
        if self.nodes.iter().any(|n| n.id == id) {
            return Err(GraphError::DuplicateId {
                kind: self.kind,
                id,
            });
        }
        self.nodes.push(DependencyNode {
            id,
            name,
            file,
            payload,
        });
        Ok(())
    }

    pub fn find(&self, id: u32) -> Option<&DependencyNode<P>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Remove and return the node with `id`, preserving list order.
    pub fn remove(&mut self, id: u32) -> GraphResult<DependencyNode<P>> {
        match self.nodes.iter().position(|n| n.id == id) {
            Some(position) => Ok(self.nodes.remove(position)),
            None => Err(GraphError::DependencyNotFound {
                kind: self.kind,
                id,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyNode<P>> {
        self.nodes.iter()
    }

    /// Ids must be unique; duplicates can only appear if the arena was
    /// mutated outside `add`.
    pub fn validate(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.nodes.len());
        self.nodes.iter().all(|n| seen.insert(n.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> DependencyList<&'static str> {
        DependencyList::new(DependencyKind::Include)
    }

    #[test]
    fn test_add_and_find() {
        let mut deps = list();
        deps.add(1, StringId::new(0), FileId::new(0), "stdio.h")
            .unwrap();
        deps.add(2, StringId::new(1), FileId::new(0), "vector")
            .unwrap();

        let node = deps.find(2).unwrap();
        assert_eq!(node.payload, "vector");
        assert!(deps.find(3).is_none());
    }

    #[test]
    fn test_duplicate_id_refused() {
        let mut deps = list();
        deps.add(7, StringId::new(0), FileId::new(0), "a").unwrap();
        let err = deps
            .add(7, StringId::new(1), FileId::new(1), "b")
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateId {
                kind: DependencyKind::Include,
                id: 7
            }
        );
        // The failed add committed nothing.
        assert_eq!(deps.len(), 1);
        assert_eq!(deps.find(7).unwrap().payload, "a");
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut deps = list();
        for id in [1, 2, 3] {
            deps.add(id, StringId::new(id), FileId::new(0), "x").unwrap();
        }
        deps.remove(2).unwrap();
        let ids: Vec<u32> = deps.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(deps.remove(2).is_err());
    }

    #[test]
    fn test_validate_detects_duplicates() {
        let mut deps = list();
        deps.add(1, StringId::new(0), FileId::new(0), "x").unwrap();
        assert!(deps.validate());
        deps.nodes.push(DependencyNode {
            id: 1,
            name: StringId::new(0),
            file: FileId::new(0),
            payload: "dup",
        });
        assert!(!deps.validate());
    }
}
