//! Pass 2: test traversal and fixture usage collection.
//!
//! Every test entry point's parameters are treated as fixture
//! references. Shadowing is detected here, at the point of use, because
//! an unused shadowed fixture is covered by the liveness check instead.

use suitelint_core::diagnostics::DiagnosticSink;
use suitelint_core::rules::Rule;

use crate::parsers::types::ParseResult;

use super::classifier::{is_test_entry, test_fixture_params};
use super::graph::FixtureGraph;
use super::types::TestUsage;

/// Collect fixture usage from every test entry point in one parsed file.
pub fn collect_usage(
    parse: &ParseResult,
    graph: &mut FixtureGraph,
    usage: &mut TestUsage,
    test_prefix: &str,
    sink: &mut dyn DiagnosticSink,
) {
    for func in &parse.functions {
        if !is_test_entry(func, test_prefix) {
            continue;
        }

        let test_id = format!("{}::{}", parse.file, func.name);
        let fixtures_used = test_fixture_params(func);

        for name in &fixtures_used {
            // Every definition sharing the name is marked consumed; the
            // analysis cannot know which one nearest-scope resolution
            // would actually pick.
            graph.mark_consumed(name, &test_id);
            usage.record_location(name, &parse.file);

            check_shadowed(graph, name, parse, func.line(), sink);
        }

        usage.record(&test_id, fixtures_used);
    }
}

/// Emit a shadowing diagnostic when more than one definition shares the
/// referenced name. Same-file redeclaration and cross-file override are
/// reported identically, citing the first and last declaring files.
fn check_shadowed(
    graph: &FixtureGraph,
    name: &str,
    parse: &ParseResult,
    line: u32,
    sink: &mut dyn DiagnosticSink,
) {
    let Some(defs) = graph.get(name) else {
        return;
    };
    if defs.len() < 2 {
        return;
    }

    let files: Vec<&str> = defs.iter().map(|d| d.file.as_str()).collect();
    let mut unique_files = files.clone();
    unique_files.dedup();

    let first = files[0];
    let last = if unique_files.len() > 1 {
        *files.last().expect("non-empty definition list")
    } else {
        first
    };

    sink.emit(
        Rule::ShadowedFixture,
        &parse.file,
        line,
        format!("fixture '{name}' is defined in both '{first}' and '{last}'"),
    );
}
