//! Finalization checks over the complete fixture graph.
//!
//! All checks here are read-only and independent of each other. Shadow
//! warnings are never re-emitted at this stage: an unused shadowed
//! definition is fully covered by the liveness check.

use suitelint_core::diagnostics::DiagnosticSink;
use suitelint_core::rules::Rule;

use crate::parsers::types::ReturnShape;

use super::graph::FixtureGraph;
use super::types::{FixtureScope, TestUsage};

/// Builtin constructor names that produce freshly constructed mutable
/// aggregates.
const MUTABLE_CONSTRUCTORS: &[&str] = &["list", "dict", "set"];

/// Three-valued verdict of best-effort type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    Immutable,
    Unknown,
}

/// Injected best-effort inference over call return types. Inference
/// failure is `Unknown`, never an error; `Unknown` never flags.
pub trait TypeInference {
    fn infer_call(&self, qualname: &str) -> Mutability;
}

/// Default inference: recognizes common Python constructor names.
#[derive(Debug, Default)]
pub struct BuiltinInference;

impl TypeInference for BuiltinInference {
    fn infer_call(&self, qualname: &str) -> Mutability {
        let name = qualname.rsplit('.').next().unwrap_or(qualname);
        match name {
            "list" | "dict" | "set" | "defaultdict" | "OrderedDict" | "Counter" | "deque"
            | "bytearray" => Mutability::Mutable,
            "tuple" | "frozenset" | "str" | "int" | "float" | "bool" | "bytes" => {
                Mutability::Immutable
            }
            _ => Mutability::Unknown,
        }
    }
}

/// Inference that never concludes anything, for hosts without an
/// inference engine.
#[derive(Debug, Default)]
pub struct NoInference;

impl TypeInference for NoInference {
    fn infer_call(&self, _qualname: &str) -> Mutability {
        Mutability::Unknown
    }
}

/// Scope compatibility: a definition must not depend on a definition
/// with a strictly narrower scope. Dependencies resolve against the
/// first definition of their name; unresolvable names are framework
/// builtins and are silently skipped.
pub fn check_scope_dependencies(graph: &FixtureGraph, sink: &mut dyn DiagnosticSink) {
    let mut violations = Vec::new();

    for (name, defs) in graph.iter() {
        for def in defs {
            for dep_name in &def.dependencies {
                let Some(dep) = graph.first(dep_name) else {
                    continue;
                };
                if def.scope.rank() > dep.scope.rank() {
                    violations.push((
                        def.file.clone(),
                        def.line,
                        format!(
                            "fixture '{name}' (scope='{}') cannot depend on \
                             narrower-scoped fixture '{dep_name}' (scope='{}')",
                            def.scope, dep.scope
                        ),
                    ));
                }
            }
        }
    }

    for (file, line, message) in violations {
        sink.emit(Rule::InvalidScopeDependency, &file, line, message);
    }
}

/// Liveness: a definition is used iff it is autouse, has consumers, or
/// appears in another definition's dependency list.
pub fn check_unused(graph: &FixtureGraph, sink: &mut dyn DiagnosticSink) {
    for (name, defs) in graph.iter() {
        for def in defs {
            if def.autouse {
                continue;
            }
            if !def.consumers.is_empty() {
                continue;
            }
            if graph.is_dependency(name) {
                continue;
            }
            sink.emit(
                Rule::UnusedFixture,
                &def.file,
                def.line,
                format!("fixture '{name}' is defined but never used by any test or fixture"),
            );
        }
    }
}

/// Stateful broad scope: a session-scoped definition returning a freshly
/// constructed mutable aggregate. One report per definition; the first
/// qualifying return suffices. Narrower scopes are exempt, their
/// lifetime is bounded to a single consumer.
pub fn check_stateful_session(
    graph: &FixtureGraph,
    inference: &dyn TypeInference,
    sink: &mut dyn DiagnosticSink,
) {
    for (name, defs) in graph.iter() {
        for def in defs {
            if def.scope != FixtureScope::Session {
                continue;
            }
            let stateful = def
                .returns
                .iter()
                .any(|shape| is_mutable_return(shape, inference));
            if stateful {
                sink.emit(
                    Rule::StatefulSessionFixture,
                    &def.file,
                    def.line,
                    format!(
                        "session-scoped fixture '{name}' returns a mutable object \
                         that function-scoped tests may mutate"
                    ),
                );
            }
        }
    }
}

fn is_mutable_return(shape: &ReturnShape, inference: &dyn TypeInference) -> bool {
    match shape {
        ReturnShape::ListLiteral | ReturnShape::DictLiteral | ReturnShape::SetLiteral => true,
        ReturnShape::Call(qualname) => {
            let name = qualname.rsplit('.').next().unwrap_or(qualname);
            if MUTABLE_CONSTRUCTORS.contains(&name) {
                return true;
            }
            inference.infer_call(qualname) == Mutability::Mutable
        }
        _ => false,
    }
}

/// Scope narrowing: a broad-scoped definition whose observed usage fits
/// a narrower scope.
pub fn check_overly_broad_scopes(
    graph: &FixtureGraph,
    usage: &TestUsage,
    sink: &mut dyn DiagnosticSink,
) {
    for (name, defs) in graph.iter() {
        for def in defs {
            if def.scope == FixtureScope::Function {
                continue;
            }
            if usage.files_using(name) == 0 {
                continue;
            }

            let suggestion = match def.scope {
                FixtureScope::Session if usage.files_using(name) == 1 => {
                    Some(("one module", FixtureScope::Module))
                }
                FixtureScope::Module | FixtureScope::Class if def.consumers.len() == 1 => {
                    Some(("one test", FixtureScope::Function))
                }
                _ => None,
            };

            if let Some((context, narrower)) = suggestion {
                sink.emit(
                    Rule::OverlyBroadScope,
                    &def.file,
                    def.line,
                    format!(
                        "fixture '{name}' has scope='{}' but is only used by \
                         {context}; scope='{narrower}' would suffice",
                        def.scope
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::types::FixtureDef;
    use suitelint_core::diagnostics::DiagnosticCollector;

    fn def(name: &str, scope: FixtureScope) -> FixtureDef {
        // Each fabricated definition needs a distinct source identity; the
        // graph dedups on (file, line), so a shared line would silently drop
        // all but the first fixture built here.
        static LINE: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(1);
        FixtureDef {
            name: name.to_string(),
            scope,
            autouse: false,
            dependencies: Default::default(),
            file: "conftest.py".to_string(),
            line: LINE.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            returns: Vec::new(),
            body_calls: Vec::new(),
            consumers: Default::default(),
        }
    }

    #[test]
    fn test_scope_violation_detected() {
        let mut graph = FixtureGraph::new();
        let mut db = def("db", FixtureScope::Session);
        db.dependencies.push("req".to_string());
        graph.insert(db);
        graph.insert(def("req", FixtureScope::Function));

        let mut sink = DiagnosticCollector::new();
        check_scope_dependencies(&graph, &mut sink);

        assert_eq!(sink.len(), 1);
        let d = &sink.diagnostics()[0];
        assert_eq!(d.rule, Rule::InvalidScopeDependency);
        assert!(d.message.contains("'db'"));
        assert!(d.message.contains("session"));
        assert!(d.message.contains("'req'"));
        assert!(d.message.contains("function"));
    }

    #[test]
    fn test_equal_or_broader_dependency_ok() {
        let mut graph = FixtureGraph::new();
        let mut conn = def("conn", FixtureScope::Function);
        conn.dependencies.push("engine".to_string());
        graph.insert(conn);
        graph.insert(def("engine", FixtureScope::Session));

        let mut sink = DiagnosticCollector::new();
        check_scope_dependencies(&graph, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unresolvable_dependency_skipped() {
        let mut graph = FixtureGraph::new();
        let mut db = def("db", FixtureScope::Session);
        db.dependencies.push("tmp_path_factory".to_string());
        graph.insert(db);

        let mut sink = DiagnosticCollector::new();
        check_scope_dependencies(&graph, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_scope_resolution_uses_first_definition() {
        let mut graph = FixtureGraph::new();
        let mut db = def("db", FixtureScope::Session);
        db.dependencies.push("cfg".to_string());
        graph.insert(db);

        // First cfg definition is session-scoped: no violation.
        let cfg_broad = FixtureDef {
            file: "conftest_root.py".to_string(),
            ..def("cfg", FixtureScope::Session)
        };
        graph.insert(cfg_broad);
        // A later, narrower shadow must not change the verdict.
        let cfg_narrow = FixtureDef {
            file: "sub/conftest.py".to_string(),
            ..def("cfg", FixtureScope::Function)
        };
        graph.insert(cfg_narrow);

        let mut sink = DiagnosticCollector::new();
        check_scope_dependencies(&graph, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unused_fixture_detected() {
        let mut graph = FixtureGraph::new();
        graph.insert(def("cfg", FixtureScope::Function));

        let mut sink = DiagnosticCollector::new();
        check_unused(&graph, &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].rule, Rule::UnusedFixture);
    }

    #[test]
    fn test_autouse_never_unused() {
        let mut graph = FixtureGraph::new();
        let mut setup = def("setup", FixtureScope::Function);
        setup.autouse = true;
        graph.insert(setup);

        let mut sink = DiagnosticCollector::new();
        check_unused(&graph, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_dependency_of_other_fixture_counts_as_used() {
        let mut graph = FixtureGraph::new();
        graph.insert(def("engine", FixtureScope::Session));
        let mut conn = def("conn", FixtureScope::Session);
        conn.dependencies.push("engine".to_string());
        conn.consumers.insert("t.py::test_x".to_string());
        graph.insert(conn);

        let mut sink = DiagnosticCollector::new();
        check_unused(&graph, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_stateful_session_literal_list() {
        let mut graph = FixtureGraph::new();
        let mut cache = def("cache", FixtureScope::Session);
        cache.returns.push(ReturnShape::ListLiteral);
        cache.consumers.insert("t.py::test_x".to_string());
        graph.insert(cache);

        let mut sink = DiagnosticCollector::new();
        check_stateful_session(&graph, &BuiltinInference, &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].rule, Rule::StatefulSessionFixture);
    }

    #[test]
    fn test_stateful_reported_once_per_definition() {
        let mut graph = FixtureGraph::new();
        let mut cache = def("cache", FixtureScope::Session);
        cache.returns.push(ReturnShape::DictLiteral);
        cache.returns.push(ReturnShape::ListLiteral);
        graph.insert(cache);

        let mut sink = DiagnosticCollector::new();
        check_stateful_session(&graph, &BuiltinInference, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_function_scope_mutable_return_exempt() {
        let mut graph = FixtureGraph::new();
        let mut items = def("items", FixtureScope::Function);
        items.returns.push(ReturnShape::ListLiteral);
        graph.insert(items);

        let mut sink = DiagnosticCollector::new();
        check_stateful_session(&graph, &BuiltinInference, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_immutable_session_return_ok() {
        let mut graph = FixtureGraph::new();
        let mut value = def("value", FixtureScope::Session);
        value.returns.push(ReturnShape::TupleLiteral);
        graph.insert(value);

        let mut sink = DiagnosticCollector::new();
        check_stateful_session(&graph, &BuiltinInference, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_inferred_mutable_constructor() {
        let mut graph = FixtureGraph::new();
        let mut registry = def("registry", FixtureScope::Session);
        registry
            .returns
            .push(ReturnShape::Call("collections.defaultdict".to_string()));
        graph.insert(registry);

        let mut sink = DiagnosticCollector::new();
        check_stateful_session(&graph, &BuiltinInference, &mut sink);
        assert_eq!(sink.len(), 1);

        // Without inference, the same call is Unknown and never flags.
        let mut graph2 = FixtureGraph::new();
        let mut registry2 = def("registry", FixtureScope::Session);
        registry2
            .returns
            .push(ReturnShape::Call("collections.defaultdict".to_string()));
        graph2.insert(registry2);

        let mut sink2 = DiagnosticCollector::new();
        check_stateful_session(&graph2, &NoInference, &mut sink2);
        assert!(sink2.is_empty());
    }

    #[test]
    fn test_overly_broad_session_scope() {
        let mut graph = FixtureGraph::new();
        let mut db = def("db", FixtureScope::Session);
        db.consumers.insert("t.py::test_x".to_string());
        graph.insert(db);

        let mut usage = TestUsage::new();
        usage.record_location("db", "t.py");

        let mut sink = DiagnosticCollector::new();
        check_overly_broad_scopes(&graph, &usage, &mut sink);
        assert_eq!(sink.len(), 1);
        assert!(sink.diagnostics()[0].message.contains("scope='module'"));
    }
}
