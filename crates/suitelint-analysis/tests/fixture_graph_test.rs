//! Tests for the fixture dependency graph engine: discovery, shadowing,
//! scope validation, liveness, and stateful-session detection.

use suitelint_analysis::fixtures::{BuiltinInference, Collector};
use suitelint_analysis::parsers::PythonParser;
use suitelint_core::config::LintConfig;
use suitelint_core::diagnostics::{Diagnostic, DiagnosticCollector};
use suitelint_core::rules::Rule;

/// Run both collection passes over the given (file, source) pairs in
/// order, then finalize. Returns every emitted diagnostic.
fn run(files: &[(&str, &str)]) -> Vec<Diagnostic> {
    let mut parser = PythonParser::new().unwrap();
    let mut collector = Collector::new(LintConfig::default());
    let mut sink = DiagnosticCollector::new();

    for (file, source) in files {
        let parse = parser.parse(file, source);
        assert!(parse.errors.is_empty(), "fixture source must parse: {file}");
        collector.visit_file(&parse, &mut sink);
    }

    collector.finalize(&BuiltinInference, &mut sink);
    sink.into_diagnostics()
}

fn count(diags: &[Diagnostic], rule: Rule) -> usize {
    diags.iter().filter(|d| d.rule == rule).count()
}

#[test]
fn session_fixture_depending_on_function_fixture() {
    // Scenario: db (session) depends on req (function), same file.
    let diags = run(&[(
        "a.py",
        "@pytest.fixture(scope=\"session\")\ndef db(req):\n    return connect(req)\n\n@pytest.fixture\ndef req():\n    return make()\n\ndef test_db(db, req):\n    assert db\n",
    )]);

    let scope_diags: Vec<_> = diags
        .iter()
        .filter(|d| d.rule == Rule::InvalidScopeDependency)
        .collect();
    assert_eq!(scope_diags.len(), 1);

    let message = &scope_diags[0].message;
    assert!(message.contains("'db'"));
    assert!(message.contains("session"));
    assert!(message.contains("'req'"));
    assert!(message.contains("function"));
}

#[test]
fn no_violation_when_dependency_scope_is_equal_or_broader() {
    let diags = run(&[(
        "a.py",
        "@pytest.fixture(scope=\"session\")\ndef engine():\n    return make_engine()\n\n@pytest.fixture\ndef conn(engine):\n    return engine.connect()\n\ndef test_conn(conn, engine):\n    assert conn\n",
    )]);
    assert_eq!(count(&diags, Rule::InvalidScopeDependency), 0);
}

#[test]
fn unused_fixture_reported_exactly_once() {
    // Scenario: cfg never appears as a test parameter or dependency.
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture\ndef cfg():\n    return load()\n\ndef test_other():\n    assert True\n",
    )]);
    assert_eq!(count(&diags, Rule::UnusedFixture), 1);
    assert!(diags
        .iter()
        .find(|d| d.rule == Rule::UnusedFixture)
        .unwrap()
        .message
        .contains("'cfg'"));
}

#[test]
fn autouse_fixture_never_reported_unused() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(autouse=True)\ndef configure_logging():\n    setup()\n",
    )]);
    assert_eq!(count(&diags, Rule::UnusedFixture), 0);
    // The autouse smell itself fires, eagerly during collection.
    assert_eq!(count(&diags, Rule::AutouseFixture), 1);
}

#[test]
fn fixture_used_only_as_dependency_is_live() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture\ndef engine():\n    return make_engine()\n\n@pytest.fixture\ndef conn(engine):\n    return engine.connect()\n\ndef test_conn(conn):\n    assert conn\n",
    )]);
    assert_eq!(count(&diags, Rule::UnusedFixture), 0);
}

#[test]
fn shadowed_fixture_across_files_cites_both_locations() {
    // Scenario: shared defined in two conftest files, consumed in a
    // subdirectory test.
    let diags = run(&[
        (
            "conftest_root.py",
            "@pytest.fixture\ndef shared():\n    return 1\n",
        ),
        (
            "sub/conftest_sub.py",
            "@pytest.fixture\ndef shared():\n    return 2\n",
        ),
        (
            "sub/test_shared.py",
            "def test_uses_shared(shared):\n    assert shared\n",
        ),
    ]);

    let shadows: Vec<_> = diags
        .iter()
        .filter(|d| d.rule == Rule::ShadowedFixture)
        .collect();
    assert_eq!(shadows.len(), 1);
    assert!(shadows[0].message.contains("conftest_root.py"));
    assert!(shadows[0].message.contains("sub/conftest_sub.py"));
}

#[test]
fn shadowed_but_never_referenced_is_only_reported_unused() {
    // Finalization must not re-emit shadow warnings for names no test
    // referenced; the two dead definitions get liveness reports instead.
    let diags = run(&[
        (
            "conftest_root.py",
            "@pytest.fixture\ndef orphan():\n    return 1\n",
        ),
        (
            "sub/conftest_sub.py",
            "@pytest.fixture\ndef orphan():\n    return 2\n",
        ),
    ]);
    assert_eq!(count(&diags, Rule::ShadowedFixture), 0);
    assert_eq!(count(&diags, Rule::UnusedFixture), 2);
}

#[test]
fn consumer_marking_covers_every_shadowed_definition() {
    let mut parser = PythonParser::new().unwrap();
    let mut collector = Collector::new(LintConfig::default());
    let mut sink = DiagnosticCollector::new();

    for (file, source) in [
        (
            "conftest_root.py",
            "@pytest.fixture\ndef shared():\n    return 1\n",
        ),
        (
            "sub/conftest_sub.py",
            "@pytest.fixture\ndef shared():\n    return 2\n",
        ),
        (
            "sub/test_shared.py",
            "def test_uses_shared(shared):\n    assert shared\n",
        ),
    ] {
        let parse = parser.parse(file, source);
        collector.visit_file(&parse, &mut sink);
    }

    let defs = collector.graph().get("shared").unwrap();
    assert_eq!(defs.len(), 2);
    for def in defs {
        assert!(def
            .consumers
            .contains("sub/test_shared.py::test_uses_shared"));
    }

    // Neither definition is unused: all same-named definitions are
    // marked, since resolution order is unknowable statically.
    collector.finalize(&BuiltinInference, &mut sink);
    assert_eq!(
        sink.diagnostics()
            .iter()
            .filter(|d| d.rule == Rule::UnusedFixture)
            .count(),
        0
    );
}

#[test]
fn stateful_session_fixture_literal_dict() {
    // Scenario: cache (session) returns {} and value (session) returns
    // an immutable tuple.
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(scope=\"session\")\ndef cache():\n    return {}\n\n@pytest.fixture(scope=\"session\")\ndef value():\n    return (1, 2)\n\ndef test_both(cache, value):\n    assert value\n",
    )]);

    let stateful: Vec<_> = diags
        .iter()
        .filter(|d| d.rule == Rule::StatefulSessionFixture)
        .collect();
    assert_eq!(stateful.len(), 1);
    assert!(stateful[0].message.contains("'cache'"));
}

#[test]
fn stateful_session_fixture_empty_list_vs_function_scope() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(scope=\"session\")\ndef broad():\n    return []\n\n@pytest.fixture\ndef narrow():\n    return []\n\ndef test_both(broad, narrow):\n    assert True\n",
    )]);

    let stateful: Vec<_> = diags
        .iter()
        .filter(|d| d.rule == Rule::StatefulSessionFixture)
        .collect();
    assert_eq!(stateful.len(), 1);
    assert!(stateful[0].message.contains("'broad'"));
}

#[test]
fn stateful_session_fixture_reported_once_despite_many_returns() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(scope=\"session\")\ndef cache(flag):\n    if flag:\n        return {}\n    return []\n\ndef test_cache(cache):\n    assert cache is not None\n",
    )]);
    assert_eq!(count(&diags, Rule::StatefulSessionFixture), 1);
}

#[test]
fn nested_return_inside_control_flow_is_reachable() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(scope=\"session\")\ndef cache(flag):\n    if flag:\n        return {}\n    return (1,)\n\ndef test_cache(cache):\n    assert cache is not None\n",
    )]);
    assert_eq!(count(&diags, Rule::StatefulSessionFixture), 1);
}

#[test]
fn mutable_constructor_call_flags_session_fixture() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(scope=\"session\")\ndef cache():\n    return dict()\n\ndef test_cache(cache):\n    assert cache is not None\n",
    )]);
    assert_eq!(count(&diags, Rule::StatefulSessionFixture), 1);
}

#[test]
fn unknown_call_shape_never_flags() {
    let diags = run(&[(
        "conftest.py",
        "@pytest.fixture(scope=\"session\")\ndef client():\n    return make_client()\n\ndef test_client(client):\n    assert client\n",
    )]);
    assert_eq!(count(&diags, Rule::StatefulSessionFixture), 0);
}

#[test]
fn duplicate_visit_of_same_file_inserts_nothing() {
    let mut parser = PythonParser::new().unwrap();
    let mut collector = Collector::new(LintConfig::default());
    let mut sink = DiagnosticCollector::new();

    let source = "@pytest.fixture(autouse=True)\ndef setup():\n    configure()\n";
    let parse = parser.parse("conftest.py", source);
    collector.visit_file(&parse, &mut sink);
    collector.visit_file(&parse, &mut sink);

    assert_eq!(collector.graph().def_count(), 1);
    // The eager autouse diagnostic must not double-fire either.
    assert_eq!(
        sink.diagnostics()
            .iter()
            .filter(|d| d.rule == Rule::AutouseFixture)
            .count(),
        1
    );
}

#[test]
fn collection_order_decides_effective_definition() {
    // The first-seen definition wins scope resolution, regardless of
    // which file the dependent fixture sits in.
    let diags = run(&[
        (
            "conftest_a.py",
            "@pytest.fixture(scope=\"session\")\ndef cfg():\n    return (1,)\n",
        ),
        (
            "conftest_b.py",
            "@pytest.fixture\ndef cfg():\n    return (2,)\n\n@pytest.fixture(scope=\"session\")\ndef db(cfg):\n    return connect(cfg)\n\ndef test_db(db, cfg):\n    assert db\n",
        ),
    ]);
    // First cfg is session-scoped, so db(session) -> cfg resolves fine.
    assert_eq!(count(&diags, Rule::InvalidScopeDependency), 0);
}

#[test]
fn idempotence_two_fresh_runs_identical() {
    let files: &[(&str, &str)] = &[
        (
            "conftest.py",
            "@pytest.fixture(scope=\"session\")\ndef db(req):\n    return {}\n\n@pytest.fixture\ndef req():\n    return object()\n\n@pytest.fixture\ndef unused_one():\n    return 3\n",
        ),
        (
            "tests/test_api.py",
            "def test_db(db):\n    assert db is not None\n",
        ),
    ];

    let first = run(files);
    let second = run(files);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}
