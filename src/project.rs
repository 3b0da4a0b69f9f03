//! The project arena: single owner of the string pool, symbol table,
//! entity arenas, and dependency graph.
//!
//! A project is built in one parse pass (Building phase), validated and
//! sealed exactly once, then read concurrently. Entities are append-only;
//! teardown frees everything together when the project drops.

use tracing::{debug, warn};

use crate::error::{ProjectError, ProjectResult};
use crate::graph::DependencyGraph;
use crate::interner::StringPool;
use crate::model::{Class, EntityArena, EntityRange, Function, Metric, SourceFile, Variable};
use crate::symbol::SymbolTable;
use crate::types::{ClassId, FileId, FunctionId, Language, Phase, StringId, VariableId};
use crate::validate::{ValidationReport, Validator};

/// Aggregate entity counters, maintained by the `add_*` operations and
/// cross-checked against arena lengths by the validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Totals {
    pub files: u32,
    pub functions: u32,
    pub classes: u32,
    pub variables: u32,
}

/// Outcome of an insert that also registers a symbol.
///
/// The entity append is hard: if it fails, nothing is committed. Symbol
/// registration is soft: on failure the entity stays added and
/// `symbol_registered` is false. Callers that care about lookup coverage
/// check the flag; most ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Added<I> {
    pub id: I,
    pub symbol_registered: bool,
}

/// Functions outnumber files in real codebases roughly 4:1, variables
/// roughly 8:1. Tuning heuristics, not contracts.
const FUNCTION_CAPACITY_FACTOR: usize = 4;
const VARIABLE_CAPACITY_FACTOR: usize = 8;
const SYMBOL_CAPACITY_FACTOR: usize = 4;
const CALL_NODE_FACTOR: usize = 4;

#[derive(Debug, Clone)]
pub struct Project {
    pub(crate) root_path: StringId,
    pub(crate) pool: StringPool,
    pub(crate) symbols: SymbolTable,
    pub(crate) files: EntityArena<FileId, SourceFile>,
    pub(crate) functions: EntityArena<FunctionId, Function>,
    pub(crate) classes: EntityArena<ClassId, Class>,
    pub(crate) variables: EntityArena<VariableId, Variable>,
    pub(crate) graph: DependencyGraph,
    pub(crate) totals: Totals,
    phase: Phase,
}

impl Project {
    /// Create an empty project rooted at `root_path`, with arenas sized
    /// from `initial_capacity` (see the capacity factors above). All
    /// allocations happen here; a failure cannot leak a partial project
    /// because every component is owned by the value being constructed.
    pub fn init(root_path: &str, initial_capacity: usize) -> Self {
        let mut pool = StringPool::with_capacity(initial_capacity);
        let root = pool.intern(root_path);
        debug!(target: "project", "init root={root_path} capacity={initial_capacity}");

        Self {
            root_path: root,
            pool,
            symbols: SymbolTable::with_capacity(initial_capacity * SYMBOL_CAPACITY_FACTOR),
            files: EntityArena::with_capacity(initial_capacity),
            functions: EntityArena::with_capacity(initial_capacity * FUNCTION_CAPACITY_FACTOR),
            classes: EntityArena::with_capacity(initial_capacity),
            variables: EntityArena::with_capacity(initial_capacity * VARIABLE_CAPACITY_FACTOR),
            graph: DependencyGraph::new(initial_capacity * CALL_NODE_FACTOR),
            totals: Totals::default(),
            phase: Phase::Building,
        }
    }

    /// As [`init`](Self::init), but with a symbol-table entry ceiling.
    pub fn init_with_symbol_limit(
        root_path: &str,
        initial_capacity: usize,
        symbol_limit: usize,
    ) -> Self {
        let mut project = Self::init(root_path, initial_capacity);
        project.symbols =
            SymbolTable::with_limit(initial_capacity * SYMBOL_CAPACITY_FACTOR, symbol_limit);
        project
    }

    fn ensure_building(&self) -> ProjectResult<()> {
        match self.phase {
            Phase::Building => Ok(()),
            phase => Err(ProjectError::Sealed { phase }),
        }
    }

    fn check_file(&self, file: FileId) -> ProjectResult<()> {
        if self.files.contains(file) {
            Ok(())
        } else {
            Err(ProjectError::OutOfBounds {
                what: "file",
                index: file.value(),
                len: self.files.len() as u32,
            })
        }
    }

    fn check_class(&self, class: ClassId) -> ProjectResult<()> {
        if self.classes.contains(class) {
            Ok(())
        } else {
            Err(ProjectError::OutOfBounds {
                what: "class",
                index: class.value(),
                len: self.classes.len() as u32,
            })
        }
    }

    fn check_function(&self, function: FunctionId) -> ProjectResult<()> {
        if self.functions.contains(function) {
            Ok(())
        } else {
            Err(ProjectError::OutOfBounds {
                what: "function",
                index: function.value(),
                len: self.functions.len() as u32,
            })
        }
    }

    /// Soft-path symbol registration shared by functions and classes.
    fn register_symbol(&mut self, name: StringId, file: FileId) -> bool {
        match self.symbols.add(name, file) {
            Ok(()) => true,
            Err(e) => {
                let text = self.pool.get(name).unwrap_or("<unresolved>");
                warn!(target: "project", "symbol '{text}' not registered: {e}");
                false
            }
        }
    }

    /// Intern arbitrary text, e.g. a dependency name the graph will
    /// reference. Writes to the pool, so Building-phase only.
    pub fn intern(&mut self, text: &str) -> ProjectResult<StringId> {
        self.ensure_building()?;
        Ok(self.pool.intern(text))
    }

    pub fn add_file(&mut self, path: &str, language: Language) -> ProjectResult<FileId> {
        self.ensure_building()?;
        let path = self.pool.intern(path);
        let id = self.files.push(SourceFile::new(path, language));
        self.totals.files += 1;
        Ok(id)
    }

    pub fn add_function(
        &mut self,
        name: &str,
        signature: &str,
        file: FileId,
        class: Option<ClassId>,
    ) -> ProjectResult<Added<FunctionId>> {
        self.ensure_building()?;
        self.check_file(file)?;
        if let Some(class) = class {
            self.check_class(class)?;
        }

        let name = self.pool.intern(name);
        let signature = self.pool.intern(signature);
        let id = self.functions.push(Function {
            name,
            signature,
            file,
            class,
        });
        self.totals.functions += 1;

        // Methods also appear in their owner's method list.
        if let Some(class) = class {
            if let Some(record) = self.classes.get_mut(class) {
                record.methods.push(id);
            }
        }

        let symbol_registered = self.register_symbol(name, file);
        Ok(Added {
            id,
            symbol_registered,
        })
    }

    /// `methods` is copied into the class record; the caller keeps its
    /// buffer.
    pub fn add_class(
        &mut self,
        name: &str,
        file: FileId,
        methods: &[FunctionId],
    ) -> ProjectResult<Added<ClassId>> {
        self.ensure_building()?;
        self.check_file(file)?;
        for &method in methods {
            self.check_function(method)?;
        }

        let name = self.pool.intern(name);
        let id = self.classes.push(Class {
            name,
            file,
            methods: methods.to_vec(),
        });
        self.totals.classes += 1;

        let symbol_registered = self.register_symbol(name, file);
        Ok(Added {
            id,
            symbol_registered,
        })
    }

    pub fn add_variable(
        &mut self,
        name: &str,
        type_name: &str,
        file: FileId,
        scope: Option<FunctionId>,
    ) -> ProjectResult<VariableId> {
        self.ensure_building()?;
        self.check_file(file)?;
        if let Some(scope) = scope {
            self.check_function(scope)?;
        }

        let name = self.pool.intern(name);
        let type_name = self.pool.intern(type_name);
        let id = self.variables.push(Variable {
            name,
            type_name,
            file,
            scope,
        });
        self.totals.variables += 1;
        Ok(id)
    }

    /// Record which slices of the entity arenas `file` declares. Ranges
    /// must fit the arenas as they stand.
    pub fn set_file_ranges(
        &mut self,
        file: FileId,
        functions: EntityRange,
        classes: EntityRange,
        variables: EntityRange,
    ) -> ProjectResult<()> {
        self.ensure_building()?;
        self.check_file(file)?;

        for (what, range, len) in [
            ("function", functions, self.functions.len()),
            ("class", classes, self.classes.len()),
            ("variable", variables, self.variables.len()),
        ] {
            if !range.fits(len) {
                return Err(ProjectError::RangeOutOfBounds {
                    what,
                    start: range.start,
                    end: range.end(),
                    len: len as u32,
                });
            }
        }

        let record = self
            .files
            .get_mut(file)
            .expect("checked by check_file above");
        record.functions = functions;
        record.classes = classes;
        record.variables = variables;
        Ok(())
    }

    /// Attach a named metric to a file. Values must be finite; NaN and
    /// infinities are rejected here so the snapshot writer never sees
    /// them.
    pub fn add_file_metric(&mut self, file: FileId, name: &str, value: f64) -> ProjectResult<()> {
        self.ensure_building()?;
        self.check_file(file)?;
        if !value.is_finite() {
            return Err(ProjectError::NonFiniteMetric {
                name: name.to_string(),
            });
        }

        let name = self.pool.intern(name);
        let record = self
            .files
            .get_mut(file)
            .expect("checked by check_file above");
        record.metrics.push(Metric { name, value });
        Ok(())
    }

    /// Name-based lookup through the symbol table. Last-writer-wins on
    /// duplicate names.
    pub fn find_symbol(&self, name: &str) -> Option<FileId> {
        let id = self.pool.find(name)?;
        self.symbols.find(id)
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id)
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id)
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id)
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files.iter()
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Mutable graph access, gated on the Building phase like every
    /// other write.
    pub fn graph_mut(&mut self) -> ProjectResult<&mut DependencyGraph> {
        self.ensure_building()?;
        Ok(&mut self.graph)
    }

    pub fn root_path(&self) -> &str {
        self.pool.get(self.root_path).unwrap_or("")
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Read-only validation pass; does not change phase.
    pub fn validate(&self) -> ValidationReport {
        Validator::run(self)
    }

    /// Validate and transition Building -> Sealed. On failure the
    /// project becomes Corrupt and every further operation fails; there
    /// is no way back to Building either way.
    pub fn seal(&mut self) -> ProjectResult<ValidationReport> {
        match self.phase {
            Phase::Building => {}
            Phase::Sealed => return Err(ProjectError::AlreadySealed),
            Phase::Corrupt => {
                return Err(ProjectError::Sealed {
                    phase: Phase::Corrupt,
                });
            }
        }

        let report = self.validate();
        if report.is_ok() {
            self.phase = Phase::Sealed;
            debug!(
                target: "project",
                "sealed: {} files, {} functions, {} classes, {} variables",
                report.totals.files,
                report.totals.functions,
                report.totals.classes,
                report.totals.variables
            );
            Ok(report)
        } else {
            self.phase = Phase::Corrupt;
            let first = report.issues[0].to_string();
            warn!(target: "project", "validation failed: {first}");
            Err(ProjectError::Corrupt {
                issues: report.issues.len(),
                first,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DependencyKind;
    use crate::validate::ValidationIssue;

    fn small_project() -> Project {
        Project::init("/repo", 4)
    }

    #[test]
    fn test_add_file_interns_path() {
        let mut project = small_project();
        let file = project.add_file("src/a.c", Language::C).unwrap();
        let record = project.file(file).unwrap();
        assert_eq!(project.pool().get(record.path), Some("src/a.c"));
        assert_eq!(project.totals().files, 1);
    }

    #[test]
    fn test_add_function_registers_symbol() {
        let mut project = small_project();
        let file = project.add_file("src/a.c", Language::C).unwrap();
        let added = project
            .add_function("parse", "int parse(void)", file, None)
            .unwrap();
        assert!(added.symbol_registered);
        assert_eq!(project.find_symbol("parse"), Some(file));
        assert_eq!(project.totals().functions, 1);
    }

    #[test]
    fn test_symbol_failure_is_soft() {
        let mut project = Project::init_with_symbol_limit("/repo", 4, 1);
        let file = project.add_file("src/a.c", Language::C).unwrap();
        let first = project.add_function("f1", "void f1()", file, None).unwrap();
        assert!(first.symbol_registered);

        // Table is full: the entity is still committed, the symbol is not.
        let second = project.add_function("f2", "void f2()", file, None).unwrap();
        assert!(!second.symbol_registered);
        assert_eq!(project.totals().functions, 2);
        assert!(project.function(second.id).is_some());
        assert_eq!(project.find_symbol("f2"), None);
    }

    #[test]
    fn test_dangling_references_rejected() {
        let mut project = small_project();
        let err = project
            .add_function("f", "void f()", FileId::new(0), None)
            .unwrap_err();
        assert!(matches!(err, ProjectError::OutOfBounds { what: "file", .. }));

        let file = project.add_file("a.c", Language::C).unwrap();
        let err = project
            .add_variable("x", "int", file, Some(FunctionId::new(9)))
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::OutOfBounds {
                what: "function",
                ..
            }
        ));
    }

    #[test]
    fn test_method_joins_owning_class() {
        let mut project = small_project();
        let file = project.add_file("a.cpp", Language::Cpp).unwrap();
        let class = project.add_class("Widget", file, &[]).unwrap().id;
        let method = project
            .add_function("draw", "void draw()", file, Some(class))
            .unwrap()
            .id;
        assert_eq!(project.class(class).unwrap().methods, vec![method]);
    }

    #[test]
    fn test_class_methods_deep_copied() {
        let mut project = small_project();
        let file = project.add_file("a.cpp", Language::Cpp).unwrap();
        let m = project
            .add_function("m", "void m()", file, None)
            .unwrap()
            .id;

        let mut buffer = vec![m];
        let class = project.add_class("Widget", file, &buffer).unwrap().id;
        buffer.clear();
        buffer.push(FunctionId::new(999));

        // The class kept its own copy, unaffected by the caller's buffer.
        assert_eq!(project.class(class).unwrap().methods, vec![m]);
    }

    #[test]
    fn test_set_file_ranges_bounds_checked() {
        let mut project = small_project();
        let file = project.add_file("a.c", Language::C).unwrap();
        project.add_function("f", "void f()", file, None).unwrap();

        let err = project
            .set_file_ranges(
                file,
                EntityRange::new(0, 2),
                EntityRange::default(),
                EntityRange::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::RangeOutOfBounds {
                what: "function",
                ..
            }
        ));

        project
            .set_file_ranges(
                file,
                EntityRange::new(0, 1),
                EntityRange::default(),
                EntityRange::default(),
            )
            .unwrap();
        assert_eq!(project.file(file).unwrap().functions, EntityRange::new(0, 1));
    }

    #[test]
    fn test_set_file_ranges_rejects_overflowing_range() {
        let mut project = small_project();
        let file = project.add_file("a.c", Language::C).unwrap();

        // start + count exceeds u32::MAX; must be rejected, not wrapped
        // into a small in-bounds value.
        let err = project
            .set_file_ranges(
                file,
                EntityRange::new(u32::MAX, 2),
                EntityRange::default(),
                EntityRange::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::RangeOutOfBounds {
                what: "function",
                end,
                ..
            } if end == u32::MAX as u64 + 2
        ));
    }

    #[test]
    fn test_non_finite_metric_rejected() {
        let mut project = small_project();
        let file = project.add_file("a.c", Language::C).unwrap();
        assert!(project.add_file_metric(file, "loc", 10.0).is_ok());
        assert!(project.add_file_metric(file, "bad", f64::NAN).is_err());
        assert!(
            project
                .add_file_metric(file, "bad", f64::INFINITY)
                .is_err()
        );
        assert_eq!(project.file(file).unwrap().metrics.len(), 1);
    }

    #[test]
    fn test_seal_blocks_further_writes() {
        let mut project = small_project();
        let file = project.add_file("a.c", Language::C).unwrap();
        project.add_function("f", "void f()", file, None).unwrap();

        let report = project.seal().unwrap();
        assert_eq!(report.totals.functions, 1);
        assert_eq!(project.phase(), Phase::Sealed);

        let err = project.add_file("b.c", Language::C).unwrap_err();
        assert_eq!(
            err,
            ProjectError::Sealed {
                phase: Phase::Sealed
            }
        );
        assert!(project.graph_mut().is_err());
        assert!(matches!(project.seal(), Err(ProjectError::AlreadySealed)));

        // Reads still work.
        assert_eq!(project.find_symbol("f"), Some(file));
    }

    #[test]
    fn test_fresh_project_validates() {
        let mut project = small_project();
        let file = project.add_file("a.c", Language::C).unwrap();
        for i in 0..5 {
            project
                .add_function(&format!("f{i}"), "void()", file, None)
                .unwrap();
        }
        let report = project.validate();
        assert!(report.is_ok());
        assert_eq!(report.totals.functions, 5);
        assert_eq!(report.totals.files, 1);
    }

    #[test]
    fn test_corrupted_totals_fail_validation() {
        let mut project = small_project();
        project.add_file("a.c", Language::C).unwrap();
        project.totals.functions = 3; // hand-corrupted counter

        let report = project.validate();
        assert!(!report.is_ok());
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            ValidationIssue::TotalsMismatch {
                what: "functions",
                cached: 3,
                actual: 0
            }
        )));

        // Sealing a corrupted project poisons it for good.
        let err = project.seal().unwrap_err();
        assert!(matches!(err, ProjectError::Corrupt { .. }));
        assert_eq!(project.phase(), Phase::Corrupt);
        assert!(project.add_file("b.c", Language::C).is_err());
        assert!(project.seal().is_err());
    }

    #[test]
    fn test_graph_writes_through_project() {
        let mut project = small_project();
        let file = project.add_file("a.c", Language::C).unwrap();
        let f = project.add_function("main", "int main()", file, None).unwrap().id;
        let g = project.add_function("help", "void help()", file, None).unwrap().id;

        {
            let graph = project.graph_mut().unwrap();
            graph
                .list_mut(DependencyKind::Include)
                .add(1, StringId::new(0), file, ())
                .unwrap();
            graph.call_graph.add_edge(f, g).unwrap();
            graph.call_graph.add_edge(f, g).unwrap();
        }

        assert_eq!(project.graph().call_graph.get_call_count(f, g), 2);
        assert_eq!(project.graph().includes.len(), 1);
    }
}
