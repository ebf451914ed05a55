//! Fixture engine types.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::parsers::types::ReturnShape;

/// Declared lifetime of a fixture, narrowest to broadest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureScope {
    Function,
    Class,
    Module,
    Package,
    Session,
}

impl FixtureScope {
    /// Total order over scopes: function(1) < class(2) < module(3) <
    /// package(4) < session(5).
    pub fn rank(&self) -> u8 {
        match self {
            FixtureScope::Function => 1,
            FixtureScope::Class => 2,
            FixtureScope::Module => 3,
            FixtureScope::Package => 4,
            FixtureScope::Session => 5,
        }
    }

    /// Parse a scope keyword; anything unrecognized resolves to the
    /// default `function` scope.
    pub fn from_keyword(value: &str) -> Self {
        match value {
            "class" => FixtureScope::Class,
            "module" => FixtureScope::Module,
            "package" => FixtureScope::Package,
            "session" => FixtureScope::Session,
            _ => FixtureScope::Function,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureScope::Function => "function",
            FixtureScope::Class => "class",
            FixtureScope::Module => "module",
            FixtureScope::Package => "package",
            FixtureScope::Session => "session",
        }
    }
}

impl Default for FixtureScope {
    fn default() -> Self {
        FixtureScope::Function
    }
}

impl std::fmt::Display for FixtureScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed fixture definition.
///
/// Immutable after insertion except for `consumers`, which only grows
/// while tests are being collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDef {
    pub name: String,
    pub scope: FixtureScope,
    pub autouse: bool,
    /// Parameter names this fixture itself requires (receiver-like and
    /// framework-builtin names already removed)
    pub dependencies: SmallVec<[String; 4]>,
    /// File that declared the fixture
    pub file: String,
    /// 1-based line of the `def`
    pub line: u32,
    /// Classified shapes of every return expression in the body
    pub returns: Vec<ReturnShape>,
    /// Dotted call targets observed inside the body
    pub body_calls: Vec<String>,
    /// Test identifiers observed to use this fixture
    pub consumers: FxHashSet<String>,
}

/// Which tests reference which fixture names, plus where each name is
/// used, accumulated while tests are collected.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TestUsage {
    entries: FxHashMap<String, Vec<String>>,
    order: Vec<String>,
    locations: FxHashMap<String, FxHashSet<String>>,
}

impl TestUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fixture names a test references, in parameter order.
    pub fn record(&mut self, test_id: &str, fixtures: Vec<String>) {
        if !self.entries.contains_key(test_id) {
            self.order.push(test_id.to_string());
        }
        self.entries.insert(test_id.to_string(), fixtures);
    }

    /// Record that `fixture` is referenced from `file`.
    pub fn record_location(&mut self, fixture: &str, file: &str) {
        self.locations
            .entry(fixture.to_string())
            .or_default()
            .insert(file.to_string());
    }

    pub fn fixtures_of(&self, test_id: &str) -> Option<&[String]> {
        self.entries.get(test_id).map(|v| v.as_slice())
    }

    /// Files in which a fixture name is referenced.
    pub fn files_using(&self, fixture: &str) -> usize {
        self.locations.get(fixture).map_or(0, |s| s.len())
    }

    /// Test ids in first-seen order.
    pub fn test_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_ordering() {
        assert!(FixtureScope::Function.rank() < FixtureScope::Class.rank());
        assert!(FixtureScope::Class.rank() < FixtureScope::Module.rank());
        assert!(FixtureScope::Module.rank() < FixtureScope::Package.rank());
        assert!(FixtureScope::Package.rank() < FixtureScope::Session.rank());
    }

    #[test]
    fn test_scope_from_keyword_defaults_to_function() {
        assert_eq!(FixtureScope::from_keyword("session"), FixtureScope::Session);
        assert_eq!(FixtureScope::from_keyword("bogus"), FixtureScope::Function);
        assert_eq!(FixtureScope::from_keyword(""), FixtureScope::Function);
    }

    #[test]
    fn test_usage_preserves_order() {
        let mut usage = TestUsage::new();
        usage.record("a.py::test_b", vec!["db".to_string()]);
        usage.record("a.py::test_a", vec![]);
        let ids: Vec<&str> = usage.test_ids().collect();
        assert_eq!(ids, ["a.py::test_b", "a.py::test_a"]);
    }

    #[test]
    fn test_usage_locations() {
        let mut usage = TestUsage::new();
        usage.record_location("db", "a.py");
        usage.record_location("db", "a.py");
        usage.record_location("db", "b.py");
        assert_eq!(usage.files_using("db"), 2);
        assert_eq!(usage.files_using("missing"), 0);
    }
}
