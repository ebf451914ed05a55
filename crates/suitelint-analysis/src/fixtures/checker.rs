//! The fixture checker state machine.
//!
//! The checker is a passive visitor with exactly three states: collecting
//! (both passes run per file as the traversal feeds it), validating, and
//! done. The transition out of collecting is `finalize(self)`: it takes
//! the collector by value, so validating twice, or growing the graph
//! after validation, does not compile.

use serde::Serialize;
use suitelint_core::config::LintConfig;
use suitelint_core::diagnostics::DiagnosticSink;

use crate::parsers::types::ParseResult;

use super::builder::collect_declarations;
use super::graph::FixtureGraph;
use super::types::TestUsage;
use super::usage::collect_usage;
use super::validator::{
    check_overly_broad_scopes, check_scope_dependencies, check_stateful_session, check_unused,
    TypeInference,
};

/// The collecting state: owns the growing graph and usage tables.
pub struct Collector {
    config: LintConfig,
    graph: FixtureGraph,
    usage: TestUsage,
    files_visited: usize,
}

impl Collector {
    pub fn new(config: LintConfig) -> Self {
        Self {
            config,
            graph: FixtureGraph::new(),
            usage: TestUsage::new(),
            files_visited: 0,
        }
    }

    /// Run both collection passes over one parsed file, in order:
    /// declaration discovery, then test usage.
    pub fn visit_file(&mut self, parse: &ParseResult, sink: &mut dyn DiagnosticSink) {
        collect_declarations(parse, &mut self.graph, &self.config, sink);
        collect_usage(
            parse,
            &mut self.graph,
            &mut self.usage,
            &self.config.test_prefix,
            sink,
        );
        self.files_visited += 1;
    }

    /// The graph as collected so far. Read-only; insertion happens only
    /// through `visit_file`.
    pub fn graph(&self) -> &FixtureGraph {
        &self.graph
    }

    pub fn usage(&self) -> &TestUsage {
        &self.usage
    }

    /// Leave the collecting state and run every whole-graph check.
    ///
    /// Consumes the collector: the graph can never again be mutated, and
    /// a second finalization is unrepresentable.
    pub fn finalize(
        self,
        inference: &dyn TypeInference,
        sink: &mut dyn DiagnosticSink,
    ) -> FixtureReport {
        check_scope_dependencies(&self.graph, sink);
        check_unused(&self.graph, sink);
        check_stateful_session(&self.graph, inference, sink);
        check_overly_broad_scopes(&self.graph, &self.usage, sink);

        FixtureReport {
            fixture_names: self.graph.name_count(),
            fixture_defs: self.graph.def_count(),
            tests_seen: self.usage.len(),
            files_visited: self.files_visited,
        }
    }
}

/// Summary of a finalized run. The graph itself is discarded; nothing
/// persists across runs.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureReport {
    pub fixture_names: usize,
    pub fixture_defs: usize,
    pub tests_seen: usize,
    pub files_visited: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::validator::BuiltinInference;
    use crate::parsers::python::PythonParser;
    use suitelint_core::diagnostics::DiagnosticCollector;
    use suitelint_core::rules::Rule;

    fn visit(collector: &mut Collector, sink: &mut DiagnosticCollector, file: &str, source: &str) {
        let mut parser = PythonParser::new().unwrap();
        let parse = parser.parse(file, source);
        collector.visit_file(&parse, sink);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut collector = Collector::new(LintConfig::default());
        let mut sink = DiagnosticCollector::new();

        visit(
            &mut collector,
            &mut sink,
            "a.py",
            "@pytest.fixture(scope=\"session\")\ndef db(req):\n    return connect()\n\n@pytest.fixture\ndef req():\n    return make_request()\n\ndef test_db(db):\n    assert db\n",
        );

        let report = collector.finalize(&BuiltinInference, &mut sink);
        assert_eq!(report.fixture_names, 2);
        assert_eq!(report.tests_seen, 1);
        assert_eq!(report.files_visited, 1);

        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.rule == Rule::InvalidScopeDependency));
    }

    #[test]
    fn test_empty_run_finalizes_cleanly() {
        let collector = Collector::new(LintConfig::default());
        let mut sink = DiagnosticCollector::new();
        let report = collector.finalize(&BuiltinInference, &mut sink);
        assert_eq!(report.fixture_defs, 0);
        assert!(sink.is_empty());
    }
}
