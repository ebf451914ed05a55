//! Test body analyzer.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

use suitelint_core::cache::ValidationCache;
use suitelint_core::config::LintConfig;
use suitelint_core::diagnostics::DiagnosticSink;
use suitelint_core::rules::Rule;

use crate::fixtures::classifier::{is_test_entry, test_fixture_params};
use crate::fixtures::graph::FixtureGraph;
use crate::fixtures::types::FixtureScope;
use crate::parsers::types::{
    ControlFlowKind, DecoratorInfo, FunctionInfo, LiteralValue, MutationKind, ParseResult,
};

/// Modules whose import makes a test network-dependent.
static NETWORK_MODULES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["requests", "socket", "httpx", "aiohttp", "urllib3"]
        .into_iter()
        .collect()
});

/// Calls sensitive to the current working directory.
static CWD_FUNCTIONS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "os.getcwd",
        "os.chdir",
        "pathlib.Path.cwd",
        "Path.cwd",
        "getcwd",
        "chdir",
    ]
    .into_iter()
    .collect()
});

/// Mock verification methods.
static MOCK_VERIFY_METHODS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "assert_called",
        "assert_called_once",
        "assert_called_with",
        "assert_called_once_with",
        "assert_any_call",
        "assert_has_calls",
        "assert_not_called",
    ]
    .into_iter()
    .collect()
});

/// Fixtures that provide isolated filesystem resources.
static RESOURCE_FIXTURES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["tmp_path", "tmp_path_factory", "tmpdir", "tmpdir_factory"]
        .into_iter()
        .collect()
});

/// Gherkin markers in docstrings.
static GHERKIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(given|when|then)\b|scenario:|feature:").expect("static pattern")
});

/// File-local smell detection over test bodies.
pub struct TestBodyAnalyzer<'a> {
    config: &'a LintConfig,
    cache: &'a ValidationCache,
}

impl<'a> TestBodyAnalyzer<'a> {
    pub fn new(config: &'a LintConfig, cache: &'a ValidationCache) -> Self {
        Self { config, cache }
    }

    /// Analyze every test entry point in one parsed file.
    pub fn analyze_file(
        &self,
        parse: &ParseResult,
        graph: &FixtureGraph,
        sink: &mut dyn DiagnosticSink,
    ) {
        self.check_network_imports(parse, sink);

        for func in &parse.functions {
            if !is_test_entry(func, &self.config.test_prefix) {
                continue;
            }
            self.check_test(parse, func, graph, sink);
        }
    }

    fn check_network_imports(&self, parse: &ParseResult, sink: &mut dyn DiagnosticSink) {
        for import in &parse.imports {
            if NETWORK_MODULES.contains(import.base_module()) {
                sink.emit(
                    Rule::NetworkImport,
                    &parse.file,
                    import.range.display_line(),
                    format!(
                        "network module '{}' imported in test file",
                        import.base_module()
                    ),
                );
            }
        }
    }

    fn check_test(
        &self,
        parse: &ParseResult,
        func: &FunctionInfo,
        graph: &FixtureGraph,
        sink: &mut dyn DiagnosticSink,
    ) {
        let body = &func.body_range;
        let test_id = format!("{}::{}", parse.file, func.name);
        let params = test_fixture_params(func);

        let mut has_mock_verification = false;
        let has_resource_fixture = params
            .iter()
            .any(|p| RESOURCE_FIXTURES.contains(p.as_str()));

        for call in parse.calls_in(body) {
            if call.receiver.is_some() && MOCK_VERIFY_METHODS.contains(call.callee.as_str()) {
                has_mock_verification = true;
            }

            match call.qualname.as_str() {
                "time.sleep" | "sleep" => {
                    sink.emit(
                        Rule::TimeSleep,
                        &parse.file,
                        call.range.display_line(),
                        "time.sleep() in test body; wait for the actual condition instead"
                            .to_string(),
                    );
                }
                "open" => {
                    if has_resource_fixture {
                        sink.emit(
                            Rule::RawFileIo,
                            &parse.file,
                            call.range.display_line(),
                            "open() in test body; route file access through tmp_path"
                                .to_string(),
                        );
                    } else {
                        sink.emit(
                            Rule::MysteryGuest,
                            &parse.file,
                            call.range.display_line(),
                            "file I/O without a resource fixture hides this test's inputs"
                                .to_string(),
                        );
                    }
                }
                qualname if CWD_FUNCTIONS.contains(qualname) => {
                    sink.emit(
                        Rule::CwdDependency,
                        &parse.file,
                        call.range.display_line(),
                        format!("'{qualname}' makes the test depend on the working directory"),
                    );
                }
                _ => {}
            }
        }

        for flow in parse.control_flow.iter().filter(|c| body.contains(&c.range)) {
            match flow.kind {
                ControlFlowKind::If | ControlFlowKind::For | ControlFlowKind::While => {
                    sink.emit(
                        Rule::TestLogic,
                        &parse.file,
                        flow.range.display_line(),
                        "conditional logic in test body; split into separate cases".to_string(),
                    );
                }
                ControlFlowKind::TryExcept => {
                    if !parse.inside_raises_block(&flow.range) {
                        sink.emit(
                            Rule::RawExceptionHandling,
                            &parse.file,
                            flow.range.display_line(),
                            "raw try/except in test body; use pytest.raises".to_string(),
                        );
                    }
                }
            }
        }

        let asserts: Vec<_> = parse.asserts_in(body).collect();
        for assertion in &asserts {
            if assertion
                .literal_operands
                .iter()
                .any(|value| self.is_magic(value))
            {
                sink.emit(
                    Rule::MagicAssert,
                    &parse.file,
                    assertion.range.display_line(),
                    "magic constant in assertion; extract it to a named value".to_string(),
                );
            }
            if assertion.wraps_comparison_helper {
                sink.emit(
                    Rule::SuboptimalAssert,
                    &parse.file,
                    assertion.range.display_line(),
                    "use a direct comparison assert for rich failure diffs".to_string(),
                );
            }
        }

        let has_raises = parse.has_raises_in(body);
        if asserts.is_empty() && !has_raises {
            sink.emit(
                Rule::MissingAssertion,
                &parse.file,
                func.line(),
                format!("test '{}' has no assertions", func.name),
            );
        }

        if has_mock_verification && asserts.is_empty() {
            sink.emit(
                Rule::MockOnlyVerification,
                &parse.file,
                func.line(),
                format!(
                    "test '{}' only verifies mock interactions, not observable state",
                    func.name
                ),
            );
        }

        let parametrize: Vec<&DecoratorInfo> = func
            .decorators
            .iter()
            .filter(|d| is_parametrize(d))
            .collect();

        if asserts.len() > self.config.max_assertions && parametrize.is_empty() {
            sink.emit(
                Rule::AssertionRoulette,
                &parse.file,
                func.line(),
                format!(
                    "test '{}' has {} assertions (max {})",
                    func.name,
                    asserts.len(),
                    self.config.max_assertions
                ),
            );
        }

        if !has_bdd_traceability(func) && !self.cache.is_validated(&test_id, "bdd") {
            sink.emit(
                Rule::MissingBddScenario,
                &parse.file,
                func.line(),
                format!("test '{}' has no scenario marker or Given/When/Then docstring", func.name),
            );
        }

        if should_suggest_pbt(func, &parametrize) && !self.cache.is_validated(&test_id, "pbt") {
            sink.emit(
                Rule::PropertyTestHint,
                &parse.file,
                func.line(),
                format!(
                    "test '{}' enumerates many parameter sets; a property-based test may cover more",
                    func.name
                ),
            );
        }

        self.check_parametrize_antipatterns(parse, func, &parametrize, sink);
        self.check_shared_state(parse, func, &params, graph, sink);
    }

    fn is_magic(&self, value: &LiteralValue) -> bool {
        match value {
            LiteralValue::Int(i) => self.config.is_magic_number(*i as f64),
            LiteralValue::Float(f) => self.config.is_magic_number(*f),
            LiteralValue::Str(s) => self.config.is_magic_string(s),
            LiteralValue::Bool(_) | LiteralValue::None => false,
        }
    }

    fn check_parametrize_antipatterns(
        &self,
        parse: &ParseResult,
        func: &FunctionInfo,
        parametrize: &[&DecoratorInfo],
        sink: &mut dyn DiagnosticSink,
    ) {
        if parametrize.is_empty() {
            return;
        }

        // Stacked decorators multiply into a cartesian product.
        if parametrize.len() > 1 {
            let mut combinations: usize = 1;
            for dec in parametrize {
                if let Some(len) = value_set_len(dec) {
                    combinations = combinations.saturating_mul(len.max(1));
                }
            }
            if combinations > self.config.max_parametrize_combinations {
                sink.emit(
                    Rule::ParametrizeExplosion,
                    &parse.file,
                    parametrize[0].range.display_line(),
                    format!(
                        "stacked parametrize decorators on '{}' produce {} combinations",
                        func.name, combinations
                    ),
                );
            }
        }

        for dec in parametrize {
            let Some(call) = &dec.call else { continue };
            if call.args.len() < 2 {
                continue;
            }
            let Some(elements) = &call.args[1].list_elements else {
                continue;
            };

            if elements.len() <= 1 {
                sink.emit(
                    Rule::ParametrizeEmpty,
                    &parse.file,
                    dec.range.display_line(),
                    format!(
                        "parametrize on '{}' has {} value set(s); inline the case instead",
                        func.name,
                        elements.len()
                    ),
                );
            }

            let mut seen = FxHashSet::default();
            for element in elements {
                if !seen.insert(element.as_str()) {
                    sink.emit(
                        Rule::ParametrizeDuplicate,
                        &parse.file,
                        dec.range.display_line(),
                        format!(
                            "duplicate value set for parameters {} on '{}'",
                            call.args[0].text, func.name
                        ),
                    );
                    break;
                }
            }
        }
    }

    /// Shared-state access: reads of module/class-level names, attribute
    /// writes on classes, or in-place mutation of a fixture value whose
    /// scope outlives the test.
    fn check_shared_state(
        &self,
        parse: &ParseResult,
        func: &FunctionInfo,
        params: &[String],
        graph: &FixtureGraph,
        sink: &mut dyn DiagnosticSink,
    ) {
        let body = &func.body_range;

        let locals: FxHashSet<&str> = parse
            .assigned_names
            .iter()
            .filter(|n| body.contains(&n.range))
            .map(|n| n.name.as_str())
            .collect();

        let reads_shared_name = parse
            .name_refs
            .iter()
            .filter(|r| body.contains(&r.range))
            .any(|r| {
                (parse.module_names.contains(&r.name) || parse.class_level_names.contains(&r.name))
                    && !params.iter().any(|p| *p == r.name)
                    && !locals.contains(r.name.as_str())
            });

        let mutations: Vec<_> = parse
            .mutations
            .iter()
            .filter(|m| body.contains(&m.range))
            .collect();

        let writes_class_attr = mutations.iter().any(|m| {
            m.kind == MutationKind::AttributeAssign
                && (m.target == "self" || m.target == "cls" || parse.class_defs.contains(&m.target))
        });

        let mutates_broad_fixture = mutations.iter().any(|m| {
            params.iter().any(|p| *p == m.target)
                && graph
                    .get(&m.target)
                    .is_some_and(|defs| defs.iter().any(|d| d.scope != FixtureScope::Function))
        });

        if reads_shared_name || writes_class_attr || mutates_broad_fixture {
            sink.emit(
                Rule::SharedStateAccess,
                &parse.file,
                func.line(),
                format!(
                    "test '{}' touches shared state and may break under parallel execution",
                    func.name
                ),
            );
        }
    }
}

fn is_parametrize(decorator: &DecoratorInfo) -> bool {
    decorator.qualname == "parametrize" || decorator.qualname.ends_with("mark.parametrize")
}

/// Element count of a parametrize decorator's value list, if literal.
fn value_set_len(decorator: &DecoratorInfo) -> Option<usize> {
    let call = decorator.call.as_ref()?;
    call.args.get(1)?.list_elements.as_ref().map(|e| e.len())
}

fn has_bdd_traceability(func: &FunctionInfo) -> bool {
    for decorator in &func.decorators {
        if decorator.qualname.contains("scenario") || decorator.qualname.contains("feature") {
            return true;
        }
    }
    func.docstring
        .as_deref()
        .is_some_and(|doc| GHERKIN_PATTERN.is_match(doc))
}

fn should_suggest_pbt(func: &FunctionInfo, parametrize: &[&DecoratorInfo]) -> bool {
    if parametrize.is_empty() {
        return false;
    }
    // Already property-based: hypothesis decorators coexist with
    // parametrize in hybrid suites.
    let uses_hypothesis = func
        .decorators
        .iter()
        .any(|d| d.text.contains("hypothesis") || d.qualname.ends_with("given"));
    if uses_hypothesis {
        return false;
    }
    parametrize
        .iter()
        .any(|d| value_set_len(d).is_some_and(|len| len > 3))
}
