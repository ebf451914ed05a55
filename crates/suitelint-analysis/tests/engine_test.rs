//! End-to-end engine tests over real temp-dir project trees.

use std::fs;
use std::path::Path;

use suitelint_analysis::SuiteAnalyzer;
use suitelint_core::config::LintConfig;
use suitelint_core::rules::Rule;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn full_run_over_project_tree() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "conftest.py",
        "import pytest\n\n@pytest.fixture(scope=\"session\")\ndef db(req):\n    return {}\n\n@pytest.fixture\ndef req():\n    return object()\n\n@pytest.fixture\ndef never_used():\n    return 1\n",
    );
    write(
        dir.path(),
        "tests/test_api.py",
        "import time\n\ndef test_db(db):\n    \"\"\"Given a db, when queried, then it responds.\"\"\"\n    time.sleep(1)\n    assert db is not None\n",
    );

    let mut analyzer = SuiteAnalyzer::new(LintConfig::default()).unwrap();
    let result = analyzer.analyze(dir.path());

    assert_eq!(result.stats.files_scanned, 2);
    assert_eq!(result.stats.files_analyzed, 2);
    assert_eq!(result.stats.parse_failures, 0);
    assert_eq!(result.stats.fixture_names, 3);
    assert_eq!(result.stats.tests_seen, 1);

    let rules: Vec<Rule> = result.diagnostics.iter().map(|d| d.rule).collect();
    assert!(rules.contains(&Rule::InvalidScopeDependency));
    assert!(rules.contains(&Rule::UnusedFixture));
    assert!(rules.contains(&Rule::StatefulSessionFixture));
    assert!(rules.contains(&Rule::TimeSleep));

    // Cross-file keys use the relative-path::name format.
    let unused = result
        .diagnostics
        .iter()
        .find(|d| d.rule == Rule::UnusedFixture)
        .unwrap();
    assert_eq!(unused.file, "conftest.py");
}

#[test]
fn unparseable_file_is_skipped_and_run_continues() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "tests/test_broken.py", "def broken(:\n");
    write(
        dir.path(),
        "tests/test_ok.py",
        "def test_ok():\n    assert True\n",
    );

    let mut analyzer = SuiteAnalyzer::new(LintConfig::default()).unwrap();
    let result = analyzer.analyze(dir.path());

    assert_eq!(result.stats.parse_failures, 1);
    assert_eq!(result.stats.files_analyzed, 1);
    assert_eq!(result.stats.tests_seen, 1);
}

#[test]
fn shadowing_scenario_across_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "conftest.py",
        "import pytest\n\n@pytest.fixture\ndef shared():\n    return \"root\"\n",
    );
    write(
        dir.path(),
        "sub/conftest.py",
        "import pytest\n\n@pytest.fixture\ndef shared():\n    return \"sub\"\n",
    );
    write(
        dir.path(),
        "sub/test_override.py",
        "def test_shared(shared):\n    assert shared\n",
    );

    let mut analyzer = SuiteAnalyzer::new(LintConfig::default()).unwrap();
    let result = analyzer.analyze(dir.path());

    let shadows: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.rule == Rule::ShadowedFixture)
        .collect();
    assert_eq!(shadows.len(), 1);
    assert!(shadows[0].message.contains("conftest.py"));
    assert!(shadows[0].message.contains("sub/conftest.py"));
}

#[test]
fn disabled_rules_are_suppressed_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "suitelint.toml",
        "disabled-rules = [\"missing-bdd-scenario\", \"unused-fixture\"]\n",
    );
    write(
        dir.path(),
        "tests/conftest.py",
        "import pytest\n\n@pytest.fixture\ndef lonely():\n    return 1\n",
    );
    write(
        dir.path(),
        "tests/test_plain.py",
        "def test_plain():\n    assert True\n",
    );

    let mut analyzer = SuiteAnalyzer::for_project(dir.path()).unwrap();
    let result = analyzer.analyze(dir.path());

    assert!(!result
        .diagnostics
        .iter()
        .any(|d| d.rule == Rule::MissingBddScenario));
    assert!(!result
        .diagnostics
        .iter()
        .any(|d| d.rule == Rule::UnusedFixture));
}

#[test]
fn validation_cache_suppresses_semantic_hints() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        ".suitelint_cache.json",
        r#"{"tests_with_semantic_validation": {"tests/test_api.py::test_checked": {"bdd": {"validated": true}}}}"#,
    );
    write(
        dir.path(),
        "tests/test_api.py",
        "def test_checked():\n    assert True\n\ndef test_unchecked():\n    assert True\n",
    );

    let mut analyzer = SuiteAnalyzer::new(LintConfig::default()).unwrap();
    let result = analyzer.analyze(dir.path());

    let bdd_files: Vec<&str> = result
        .diagnostics
        .iter()
        .filter(|d| d.rule == Rule::MissingBddScenario)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(bdd_files.len(), 1);
    assert!(bdd_files[0].contains("test_unchecked"));
}

#[test]
fn corrupt_cache_degrades_without_aborting() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), ".suitelint_cache.json", "{ corrupt");
    write(
        dir.path(),
        "tests/test_a.py",
        "def test_a():\n    assert True\n",
    );

    let mut analyzer = SuiteAnalyzer::new(LintConfig::default()).unwrap();
    let result = analyzer.analyze(dir.path());
    assert_eq!(result.stats.files_analyzed, 1);
}

#[test]
fn idempotence_two_runs_byte_identical() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "conftest.py",
        "import pytest\n\n@pytest.fixture(scope=\"session\")\ndef cache():\n    return {}\n\n@pytest.fixture\ndef helper(cache):\n    return cache\n",
    );
    write(
        dir.path(),
        "tests/test_one.py",
        "def test_cache(cache):\n    assert cache is not None\n",
    );
    write(
        dir.path(),
        "tests/test_two.py",
        "COUNT = 3\n\ndef test_helper(helper):\n    assert helper is not None\n    assert COUNT == 3\n",
    );

    let run = |root: &Path| {
        let mut analyzer = SuiteAnalyzer::new(LintConfig::default()).unwrap();
        let result = analyzer.analyze(root);
        serde_json::to_string(&result.diagnostics).unwrap()
    };

    let first = run(dir.path());
    let second = run(dir.path());
    assert_eq!(first, second);
}
