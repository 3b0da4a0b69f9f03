//! In-memory source-model store for code analysis and visualization.
//!
//! A [`Project`] owns a string pool, a symbol table, four entity arenas,
//! and a dependency graph. Parsers populate it through `add_*` calls
//! during a single Building phase; [`Project::seal`] validates and
//! freezes it for concurrent read-only consumption by analyzers and
//! visualizers. Snapshots of the file table round-trip through a
//! versioned binary layout in [`storage`].

pub mod config;
pub mod error;
pub mod graph;
pub mod interner;
pub mod logging;
pub mod model;
pub mod project;
pub mod storage;
pub mod symbol;
pub mod types;
pub mod validate;

pub use config::Settings;
pub use error::{GraphError, ProjectError, ProjectResult, SymbolTableError};
pub use graph::{CallGraph, DependencyGraph, DependencyList, HierarchyTree};
pub use interner::StringPool;
pub use model::{Class, EntityArena, EntityRange, Function, Metric, SourceFile, Variable};
pub use project::{Added, Project, Totals};
pub use storage::{SnapshotError, SnapshotLimits, read_snapshot, write_snapshot};
pub use symbol::SymbolTable;
pub use types::{
    ClassId, DependencyKind, FileId, FunctionId, Language, NodeId, Phase, StringId, VariableId,
};
pub use validate::{ValidationIssue, ValidationReport, Validator};
