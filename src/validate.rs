//! Read-only integrity validation over a whole project.
//!
//! Run on demand, before sealing and after snapshot load. Every
//! cross-reference must resolve, every cached counter must match its
//! arena, and every graph sub-structure must pass its own checks. A
//! non-empty issue list is corruption: the project must not accept
//! further writes.

use thiserror::Error;

use crate::project::{Project, Totals};
use crate::types::{DependencyKind, NodeId, StringId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("string id {id} in {context} does not resolve")]
    DanglingString { context: &'static str, id: StringId },

    #[error("{context} references file index {index}, but only {len} files exist")]
    DanglingFile {
        context: &'static str,
        index: u32,
        len: u32,
    },

    #[error("{context} references {what} index {index}, but only {len} exist")]
    DanglingEntity {
        context: &'static str,
        what: &'static str,
        index: u32,
        len: u32,
    },

    #[error("file {file} declares {what} range [{start}, {end}) outside arena of len {len}")]
    RangeOutOfBounds {
        file: u32,
        what: &'static str,
        start: u32,
        end: u64,
        len: u32,
    },

    #[error("cached {what} total is {cached} but arena holds {actual}")]
    TotalsMismatch {
        what: &'static str,
        cached: u32,
        actual: u32,
    },

    #[error("string pool hash mismatch at id {id}")]
    HashMismatch { id: StringId },

    #[error("{kind:?} dependency list failed structural validation")]
    DependencyListInvalid { kind: DependencyKind },

    #[error("hierarchy tree failed structural validation")]
    TreeInvalid,

    #[error("tree node {node} has a dangling reference")]
    TreeNodeDangling { node: NodeId },

    #[error("call graph failed structural validation")]
    CallGraphInvalid,

    #[error("call graph edge references function {index}, but only {len} functions exist")]
    CallEdgeDangling { index: u32, len: u32 },
}

/// Result of a validation pass: the recomputed totals plus every issue
/// found. Empty issues means the project is internally consistent.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub totals: Totals,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

pub struct Validator;

impl Validator {
    /// Full pass. Never mutates; safe to call in any phase.
    pub fn run(project: &Project) -> ValidationReport {
        let mut issues = Vec::new();

        Self::check_pool(project, &mut issues);
        Self::check_totals(project, &mut issues);
        Self::check_entities(project, &mut issues);
        Self::check_symbols(project, &mut issues);
        Self::check_graph(project, &mut issues);

        ValidationReport {
            totals: Totals {
                files: project.files.len() as u32,
                functions: project.functions.len() as u32,
                classes: project.classes.len() as u32,
                variables: project.variables.len() as u32,
            },
            issues,
        }
    }

    fn check_pool(project: &Project, issues: &mut Vec<ValidationIssue>) {
        if let Some(id) = project.pool.verify_hashes() {
            issues.push(ValidationIssue::HashMismatch { id });
        }
        if !project.pool.contains(project.root_path) {
            issues.push(ValidationIssue::DanglingString {
                context: "project root",
                id: project.root_path,
            });
        }
    }

    fn check_totals(project: &Project, issues: &mut Vec<ValidationIssue>) {
        for (what, cached, actual) in [
            ("files", project.totals.files, project.files.len()),
            (
                "functions",
                project.totals.functions,
                project.functions.len(),
            ),
            ("classes", project.totals.classes, project.classes.len()),
            (
                "variables",
                project.totals.variables,
                project.variables.len(),
            ),
        ] {
            if cached as usize != actual {
                issues.push(ValidationIssue::TotalsMismatch {
                    what,
                    cached,
                    actual: actual as u32,
                });
            }
        }
    }

    fn string(
        project: &Project,
        context: &'static str,
        id: StringId,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if !project.pool.contains(id) {
            issues.push(ValidationIssue::DanglingString { context, id });
        }
    }

    fn file_ref(
        project: &Project,
        context: &'static str,
        index: u32,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if index as usize >= project.files.len() {
            issues.push(ValidationIssue::DanglingFile {
                context,
                index,
                len: project.files.len() as u32,
            });
        }
    }

    fn check_entities(project: &Project, issues: &mut Vec<ValidationIssue>) {
        let function_len = project.functions.len();
        let class_len = project.classes.len();
        let variable_len = project.variables.len();

        for (id, file) in project.files.iter() {
            Self::string(project, "file path", file.path, issues);
            for metric in &file.metrics {
                Self::string(project, "metric name", metric.name, issues);
            }
            for (what, range, len) in [
                ("function", file.functions, function_len),
                ("class", file.classes, class_len),
                ("variable", file.variables, variable_len),
            ] {
                if !range.fits(len) {
                    issues.push(ValidationIssue::RangeOutOfBounds {
                        file: id.value(),
                        what,
                        start: range.start,
                        end: range.end(),
                        len: len as u32,
                    });
                }
            }
        }

        for (_, function) in project.functions.iter() {
            Self::string(project, "function name", function.name, issues);
            Self::string(project, "function signature", function.signature, issues);
            Self::file_ref(project, "function", function.file.value(), issues);
            if let Some(class) = function.class {
                if class.value() as usize >= class_len {
                    issues.push(ValidationIssue::DanglingEntity {
                        context: "function",
                        what: "class",
                        index: class.value(),
                        len: class_len as u32,
                    });
                }
            }
        }

        for (_, class) in project.classes.iter() {
            Self::string(project, "class name", class.name, issues);
            Self::file_ref(project, "class", class.file.value(), issues);
            for &method in &class.methods {
                if method.value() as usize >= function_len {
                    issues.push(ValidationIssue::DanglingEntity {
                        context: "class method list",
                        what: "function",
                        index: method.value(),
                        len: function_len as u32,
                    });
                }
            }
        }

        for (_, variable) in project.variables.iter() {
            Self::string(project, "variable name", variable.name, issues);
            Self::string(project, "variable type", variable.type_name, issues);
            Self::file_ref(project, "variable", variable.file.value(), issues);
            if let Some(scope) = variable.scope {
                if scope.value() as usize >= function_len {
                    issues.push(ValidationIssue::DanglingEntity {
                        context: "variable",
                        what: "function",
                        index: scope.value(),
                        len: function_len as u32,
                    });
                }
            }
        }
    }

    fn check_symbols(project: &Project, issues: &mut Vec<ValidationIssue>) {
        for (name, file) in project.symbols.iter() {
            Self::string(project, "symbol table", name, issues);
            Self::file_ref(project, "symbol table", file.value(), issues);
        }
    }

    fn check_graph(project: &Project, issues: &mut Vec<ValidationIssue>) {
        let graph = &project.graph;

        for kind in [
            DependencyKind::Include,
            DependencyKind::FunctionCall,
            DependencyKind::Type,
        ] {
            let list = graph.list(kind);
            if !list.validate() {
                issues.push(ValidationIssue::DependencyListInvalid { kind });
            }
            for node in list.iter() {
                Self::string(project, "dependency node", node.name, issues);
                Self::file_ref(project, "dependency node", node.file.value(), issues);
            }
        }

        if !graph.hierarchy.validate() {
            issues.push(ValidationIssue::TreeInvalid);
        }
        for id in graph.hierarchy.walk() {
            let Some(node) = graph.hierarchy.get(id) else {
                continue;
            };
            if !project.pool.contains(node.name)
                || node.file.value() as usize >= project.files.len()
            {
                issues.push(ValidationIssue::TreeNodeDangling { node: id });
            }
        }

        if !graph.call_graph.validate() {
            issues.push(ValidationIssue::CallGraphInvalid);
        }
        // Edges must point at real functions, not just in-range graph
        // slots (the graph is sized to an upper bound).
        let function_len = project.functions.len();
        for slot in 0..graph.call_graph.node_count() {
            let caller = crate::types::FunctionId::new(slot as u32);
            let callees = graph.call_graph.get_callees(caller);
            if callees.is_empty() {
                continue;
            }
            if slot >= function_len {
                issues.push(ValidationIssue::CallEdgeDangling {
                    index: slot as u32,
                    len: function_len as u32,
                });
            }
            for callee in callees {
                if callee.value() as usize >= function_len {
                    issues.push(ValidationIssue::CallEdgeDangling {
                        index: callee.value(),
                        len: function_len as u32,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FunctionId, Language};

    #[test]
    fn test_empty_project_validates() {
        let project = Project::init("/repo", 2);
        let report = Validator::run(&project);
        assert!(report.is_ok());
        assert_eq!(report.totals, Totals::default());
    }

    #[test]
    fn test_built_project_reports_totals() {
        let mut project = Project::init("/repo", 2);
        let file_a = project.add_file("a.c", Language::C).unwrap();
        let file_b = project.add_file("b.c", Language::C).unwrap();
        let f = project
            .add_function("f", "void f()", file_a, None)
            .unwrap()
            .id;
        let g = project
            .add_function("g", "void g()", file_b, None)
            .unwrap()
            .id;
        project.add_variable("x", "int", file_a, Some(f)).unwrap();

        project
            .graph_mut()
            .unwrap()
            .call_graph
            .add_edge(f, g)
            .unwrap();

        let report = Validator::run(&project);
        assert!(report.is_ok(), "unexpected issues: {:?}", report.issues);
        assert_eq!(report.totals.files, 2);
        assert_eq!(report.totals.functions, 2);
        assert_eq!(report.totals.variables, 1);
    }

    #[test]
    fn test_call_edge_to_nonexistent_function_flagged() {
        let mut project = Project::init("/repo", 2);
        let file = project.add_file("a.c", Language::C).unwrap();
        let f = project
            .add_function("f", "void f()", file, None)
            .unwrap()
            .id;

        // Edge target is within graph bounds (sized 4x) but beyond the
        // one real function.
        project
            .graph_mut()
            .unwrap()
            .call_graph
            .add_edge(f, FunctionId::new(5))
            .unwrap();

        let report = Validator::run(&project);
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            ValidationIssue::CallEdgeDangling { index: 5, len: 1 }
        )));
    }
}
