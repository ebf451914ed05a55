//! Pass 1: fixture discovery and graph building.
//!
//! Runs once per file, in file-open order. Only module-level functions
//! are fixture candidates; class-nested and inner declarations are
//! skipped to avoid false positives from helpers. Checks that need no
//! cross-file state are emitted here, eagerly, so their diagnostics
//! interleave with the file that caused them.

use suitelint_core::config::LintConfig;
use suitelint_core::diagnostics::DiagnosticSink;
use suitelint_core::rules::Rule;

use crate::parsers::types::{FunctionInfo, Nesting, ParseResult};

use super::classifier::{dependency_names, fixture_marker};
use super::graph::FixtureGraph;
use super::types::FixtureDef;

/// Fixtures that provide isolated filesystem resources.
const TMP_PATH_FIXTURES: &[&str] = &["tmp_path", "tmp_path_factory", "tmpdir", "tmpdir_factory"];

/// Dotted call targets that open files or paths directly.
const FILE_IO_CALLS: &[&str] = &["open", "Path", "pathlib.Path"];

/// File-like method names indicating I/O.
const FILE_IO_METHODS: &[&str] = &["read", "write", "mkdir", "touch", "unlink"];

/// Discover fixture declarations in one parsed file and insert them into
/// the graph.
pub fn collect_declarations(
    parse: &ParseResult,
    graph: &mut FixtureGraph,
    config: &LintConfig,
    sink: &mut dyn DiagnosticSink,
) {
    for func in &parse.functions {
        if func.nesting != Nesting::Module {
            continue;
        }
        let Some(marker) = fixture_marker(func) else {
            continue;
        };

        let returns = parse
            .returns_in(&func.body_range)
            .map(|r| r.shape.clone())
            .collect();
        let body_calls: Vec<String> = parse
            .calls_in(&func.body_range)
            .map(|c| c.qualname.clone())
            .collect();

        let def = FixtureDef {
            name: func.name.clone(),
            scope: marker.scope,
            autouse: marker.autouse,
            dependencies: dependency_names(func),
            file: parse.file.clone(),
            line: func.line(),
            returns,
            body_calls,
            consumers: Default::default(),
        };

        // A declaration must never enter the graph twice even if the
        // traversal revisits it.
        if !graph.insert(def) {
            continue;
        }

        if marker.autouse {
            sink.emit(
                Rule::AutouseFixture,
                &parse.file,
                func.line(),
                format!(
                    "fixture '{}' is applied to every test via autouse=True; \
                     make the dependency explicit in test signatures",
                    func.name
                ),
            );
        }

        check_db_commit_cleanup(parse, func, config, sink);
        check_fixture_io(parse, func, sink);
    }
}

/// A fixture that commits to a database without rollback or
/// post-yield teardown leaks state between tests.
fn check_db_commit_cleanup(
    parse: &ParseResult,
    func: &FunctionInfo,
    config: &LintConfig,
    sink: &mut dyn DiagnosticSink,
) {
    let mut has_commit = false;
    let mut has_rollback = false;

    for call in parse.calls_in(&func.body_range) {
        let method = call.method_name();
        if config.db_commit_methods.iter().any(|m| m == method) {
            has_commit = true;
        } else if config.db_rollback_methods.iter().any(|m| m == method) {
            has_rollback = true;
        }
    }

    if has_commit && !has_rollback && !(func.has_yield && func.has_post_yield_cleanup) {
        sink.emit(
            Rule::DbCommitWithoutCleanup,
            &parse.file,
            func.line(),
            format!(
                "fixture '{}' commits database state without rollback or teardown",
                func.name
            ),
        );
    }
}

/// A fixture doing file I/O without a tmp_path-family dependency can
/// collide with itself when tests run in parallel.
fn check_fixture_io(parse: &ParseResult, func: &FunctionInfo, sink: &mut dyn DiagnosticSink) {
    let has_file_io = parse.calls_in(&func.body_range).any(|call| {
        FILE_IO_CALLS.contains(&call.qualname.as_str())
            || FILE_IO_METHODS.contains(&call.method_name())
    });
    if !has_file_io {
        return;
    }

    let has_tmp_path = func
        .params
        .iter()
        .any(|p| TMP_PATH_FIXTURES.contains(&p.as_str()));
    if !has_tmp_path {
        sink.emit(
            Rule::FixtureIoWithoutTmpPath,
            &parse.file,
            func.line(),
            format!(
                "fixture '{}' performs file I/O without tmp_path; \
                 parallel runs may conflict",
                func.name
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::types::FixtureScope;
    use crate::parsers::python::PythonParser;
    use suitelint_core::diagnostics::DiagnosticCollector;

    fn run_pass1(source: &str) -> (FixtureGraph, DiagnosticCollector) {
        let mut parser = PythonParser::new().unwrap();
        let parse = parser.parse("conftest.py", source);
        let mut graph = FixtureGraph::new();
        let mut sink = DiagnosticCollector::new();
        let config = LintConfig::default();
        collect_declarations(&parse, &mut graph, &config, &mut sink);
        (graph, sink)
    }

    #[test]
    fn test_module_level_fixture_discovered() {
        let (graph, _) = run_pass1(
            "@pytest.fixture(scope=\"module\")\ndef db(engine):\n    return engine.connect()\n",
        );
        let def = graph.first("db").unwrap();
        assert_eq!(def.scope, FixtureScope::Module);
        assert_eq!(def.dependencies.as_slice(), ["engine"]);
        assert_eq!(def.line, 2);
    }

    #[test]
    fn test_nested_and_class_functions_skipped() {
        let (graph, _) = run_pass1(
            "class Helpers:\n    @pytest.fixture\n    def inner(self):\n        pass\n\ndef outer():\n    @pytest.fixture\n    def deep():\n        pass\n",
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_autouse_emitted_eagerly() {
        let (_, sink) = run_pass1("@pytest.fixture(autouse=True)\ndef setup():\n    pass\n");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].rule, Rule::AutouseFixture);
    }

    #[test]
    fn test_db_commit_without_cleanup() {
        let (_, sink) = run_pass1(
            "@pytest.fixture\ndef seeded(session):\n    session.add(row)\n    session.commit()\n    return session\n",
        );
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.rule == Rule::DbCommitWithoutCleanup));
    }

    #[test]
    fn test_db_commit_with_yield_cleanup_ok() {
        let (_, sink) = run_pass1(
            "@pytest.fixture\ndef seeded(session):\n    session.commit()\n    yield session\n    session.rollback()\n",
        );
        assert!(!sink
            .diagnostics()
            .iter()
            .any(|d| d.rule == Rule::DbCommitWithoutCleanup));
    }

    #[test]
    fn test_fixture_io_without_tmp_path() {
        let (_, sink) = run_pass1(
            "@pytest.fixture\ndef data_file():\n    return open(\"data.json\")\n",
        );
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.rule == Rule::FixtureIoWithoutTmpPath));
    }

    #[test]
    fn test_fixture_io_with_tmp_path_ok() {
        let (_, sink) = run_pass1(
            "@pytest.fixture\ndef data_file(tmp_path):\n    return open(tmp_path / \"data.json\")\n",
        );
        assert!(!sink
            .diagnostics()
            .iter()
            .any(|d| d.rule == Rule::FixtureIoWithoutTmpPath));
    }
}
