//! Declaration classification.
//!
//! Pure functions over one parsed function record: is it a test entry
//! point, is it fixture-like, and what does its marker declare.

use smallvec::SmallVec;

use crate::parsers::types::{DecoratorInfo, FunctionInfo};

use super::types::FixtureScope;

/// Receiver-like parameter names, never fixture references.
const RECEIVER_PARAMS: &[&str] = &["self", "cls"];

/// Framework-builtin parameter that is not a resolvable fixture.
const FRAMEWORK_REQUEST_PARAM: &str = "request";

/// The marker name that makes a declaration fixture-like.
const FIXTURE_MARKER: &str = "fixture";

/// The three syntactic shapes a fixture marker can take. Anything else
/// is not a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerShape {
    /// `@fixture`
    Bare,
    /// `@pytest.fixture`
    Qualified,
    /// `@fixture(...)` or `@pytest.fixture(...)`
    Call,
}

fn marker_shape(decorator: &DecoratorInfo) -> Option<MarkerShape> {
    let is_marker_name = decorator.qualname == FIXTURE_MARKER
        || decorator
            .qualname
            .ends_with(&format!(".{FIXTURE_MARKER}"));
    if !is_marker_name {
        return None;
    }
    match (&decorator.call, decorator.qualname.contains('.')) {
        (Some(_), _) => Some(MarkerShape::Call),
        (None, true) => Some(MarkerShape::Qualified),
        (None, false) => Some(MarkerShape::Bare),
    }
}

/// What a fixture marker declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureMarker {
    pub scope: FixtureScope,
    pub autouse: bool,
}

/// Whether a function is a test entry point. Deliberately a plain name
/// prefix check; differently named test methods are not recognized.
pub fn is_test_entry(func: &FunctionInfo, test_prefix: &str) -> bool {
    func.name.starts_with(test_prefix)
}

/// Classify a function's fixture marker, if it carries one.
///
/// Scope comes from a literal `scope=` keyword, defaulting to function
/// scope; auto-apply from a literal `autouse=` keyword, defaulting to
/// false. Non-literal keyword values are ignored.
pub fn fixture_marker(func: &FunctionInfo) -> Option<FixtureMarker> {
    let mut marker: Option<FixtureMarker> = None;

    for decorator in &func.decorators {
        let shape = match marker_shape(decorator) {
            Some(shape) => shape,
            None => continue,
        };

        let mut scope = FixtureScope::Function;
        let mut autouse = false;

        if shape == MarkerShape::Call {
            if let Some(call) = &decorator.call {
                if let Some(value) = call.kwarg("scope").and_then(|v| v.as_str()) {
                    scope = FixtureScope::from_keyword(value);
                }
                if let Some(value) = call.kwarg("autouse").and_then(|v| v.as_bool()) {
                    autouse = value;
                }
            }
        }

        marker = Some(FixtureMarker { scope, autouse });
    }

    marker
}

/// The fixture names a declaration itself requires: its parameters minus
/// receiver-like names and the framework-builtin request parameter.
pub fn dependency_names(func: &FunctionInfo) -> SmallVec<[String; 4]> {
    func.params
        .iter()
        .filter(|p| {
            !RECEIVER_PARAMS.contains(&p.as_str()) && p.as_str() != FRAMEWORK_REQUEST_PARAM
        })
        .cloned()
        .collect()
}

/// Parameters of a test that count as fixture references: everything but
/// receiver-like names. Unlike fixture dependencies, `request` counts,
/// since a test may legitimately take it.
pub fn test_fixture_params(func: &FunctionInfo) -> Vec<String> {
    func.params
        .iter()
        .filter(|p| !RECEIVER_PARAMS.contains(&p.as_str()))
        .cloned()
        .collect()
}
