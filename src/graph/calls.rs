//! Function call graph: adjacency lists with per-edge call counts.
//!
//! The node table is fixed-size at construction, sized from the caller's
//! upper bound on function count. Re-adding an edge bumps its count
//! instead of duplicating it, so `edge_count` tracks distinct pairs.

use crate::error::{GraphError, GraphResult};
use crate::model::ArenaIndex;
use crate::types::FunctionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub callee: FunctionId,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct CallGraph {
    /// One adjacency list per caller index.
    adjacency: Vec<Vec<CallEdge>>,
    edge_count: usize,
}

impl CallGraph {
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            edge_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Distinct (caller, callee) pairs.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn check_node(&self, index: FunctionId) -> GraphResult<usize> {
        let slot = index.index();
        if slot >= self.adjacency.len() {
            return Err(GraphError::NodeOutOfRange {
                index: index.value(),
                node_count: self.adjacency.len() as u32,
            });
        }
        Ok(slot)
    }

    /// Record one call from `caller` to `callee`. Repeated calls
    /// increment the existing edge's count.
    pub fn add_edge(&mut self, caller: FunctionId, callee: FunctionId) -> GraphResult<()> {
        let caller_slot = self.check_node(caller)?;
        self.check_node(callee)?;

        match self.adjacency[caller_slot]
            .iter_mut()
            .find(|e| e.callee == callee)
        {
            Some(edge) => edge.count += 1,
            None => {
                self.adjacency[caller_slot].push(CallEdge { callee, count: 1 });
                self.edge_count += 1;
            }
        }
        Ok(())
    }

    /// Recorded call count for the edge, 0 when absent.
    pub fn get_call_count(&self, caller: FunctionId, callee: FunctionId) -> u32 {
        self.adjacency
            .get(caller.index())
            .and_then(|edges| edges.iter().find(|e| e.callee == callee))
            .map_or(0, |e| e.count)
    }

    /// Functions `caller` calls directly.
    pub fn get_callees(&self, caller: FunctionId) -> Vec<FunctionId> {
        self.adjacency
            .get(caller.index())
            .map(|edges| edges.iter().map(|e| e.callee).collect())
            .unwrap_or_default()
    }

    /// Functions calling `callee` directly. There is no reverse index,
    /// so this scans every adjacency list: O(V + E).
    pub fn get_callers(&self, callee: FunctionId) -> Vec<FunctionId> {
        self.adjacency
            .iter()
            .enumerate()
            .filter(|(_, edges)| edges.iter().any(|e| e.callee == callee))
            .map(|(slot, _)| FunctionId::new(slot as u32))
            .collect()
    }

    /// Every function reachable from `seed` by following call edges,
    /// excluding `seed` itself unless it is on a cycle. Breadth-first.
    pub fn reachable_from(&self, seed: FunctionId) -> Vec<FunctionId> {
        let mut reached = Vec::new();
        if seed.index() >= self.adjacency.len() {
            return reached;
        }

        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = std::collections::VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            for edge in &self.adjacency[current.index()] {
                let slot = edge.callee.index();
                if !std::mem::replace(&mut visited[slot], true) {
                    reached.push(edge.callee);
                    queue.push_back(edge.callee);
                }
            }
        }
        reached
    }

    /// All elementary cycles found by an iterative three-color DFS; each
    /// back edge reports the call chain that closes it.
    pub fn find_cycles(&self) -> Vec<Vec<FunctionId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let node_count = self.adjacency.len();
        let mut color = vec![Color::White; node_count];
        let mut cycles = Vec::new();

        for start in 0..node_count {
            if color[start] != Color::White {
                continue;
            }

            // (slot, next edge offset); doubles as the current gray path.
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            color[start] = Color::Gray;

            while let Some(&(slot, offset)) = stack.last() {
                if let Some(edge) = self.adjacency[slot].get(offset) {
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                    let next = edge.callee.index();
                    match color[next] {
                        Color::White => {
                            color[next] = Color::Gray;
                            stack.push((next, 0));
                        }
                        Color::Gray => {
                            // Back edge: the path from `next` down to
                            // `slot` is a cycle.
                            let from = stack
                                .iter()
                                .position(|&(s, _)| s == next)
                                .expect("gray node is on the stack");
                            cycles.push(
                                stack[from..]
                                    .iter()
                                    .map(|&(s, _)| FunctionId::new(s as u32))
                                    .collect(),
                            );
                        }
                        Color::Black => {}
                    }
                } else {
                    color[slot] = Color::Black;
                    stack.pop();
                }
            }
        }
        cycles
    }

    /// Edge bookkeeping: cached `edge_count` matches the lists, every
    /// callee index is in range, and no adjacency list holds a duplicate
    /// callee.
    pub fn validate(&self) -> bool {
        let mut counted = 0;
        for edges in &self.adjacency {
            let mut seen = std::collections::HashSet::with_capacity(edges.len());
            for edge in edges {
                if edge.callee.index() >= self.adjacency.len() || edge.count == 0 {
                    return false;
                }
                if !seen.insert(edge.callee) {
                    return false;
                }
            }
            counted += edges.len();
        }
        counted == self.edge_count
    }
}
