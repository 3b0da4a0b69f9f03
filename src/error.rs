//! Error taxonomy for the source-model store.
//!
//! Every mutating operation returns a `Result`; there is no panic-based
//! abort path outside of tests. Hard failures (`LimitExceeded`, phase
//! violations) commit nothing; soft failures (symbol registration) are
//! reported through [`Added`](crate::project::Added) instead of an `Err`.

use thiserror::Error;

use crate::types::{DependencyKind, NodeId, Phase};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectError {
    #[error("{what} index {index} out of bounds (len {len})")]
    OutOfBounds {
        what: &'static str,
        index: u32,
        len: u32,
    },

    #[error("project is {phase:?}; writes are only allowed while Building")]
    Sealed { phase: Phase },

    #[error("project failed validation with {issues} issue(s); first: {first}")]
    Corrupt { issues: usize, first: String },

    #[error("project is already sealed; build a fresh project to mutate")]
    AlreadySealed,

    #[error("{what} limit of {limit} reached")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("metric '{name}' is not a finite number")]
    NonFiniteMetric { name: String },

    #[error("entity range [{start}, {end}) exceeds {what} array of len {len}")]
    RangeOutOfBounds {
        what: &'static str,
        start: u32,
        end: u64,
        len: u32,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("duplicate id {id} in {kind:?} dependency list")]
    DuplicateId { kind: DependencyKind, id: u32 },

    #[error("dependency id {id} not found in {kind:?} list")]
    DependencyNotFound { kind: DependencyKind, id: u32 },

    #[error("hierarchy tree already has a root")]
    RootExists,

    #[error("parent node {0} does not exist")]
    ParentNotFound(NodeId),

    #[error("call-graph node {index} out of range (node count {node_count})")]
    NodeOutOfRange { index: u32, node_count: u32 },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Symbol-table registration failure. Deliberately soft at the project
/// level: the entity append that preceded it stays committed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolTableError {
    #[error("symbol table entry limit of {limit} reached")]
    LimitExceeded { limit: usize },
}
