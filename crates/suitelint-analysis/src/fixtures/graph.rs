//! The fixture dependency graph.
//!
//! Maps each fixture name to the ordered list of its definitions. More
//! than one definition per name is legal (conftest shadowing); the first
//! definition is the effective one under the resolution policy used by
//! the validator. The graph is owned by exactly one checker instance per
//! run and is never reachable through globals.

use rustc_hash::{FxHashMap, FxHashSet};

use super::types::FixtureDef;

#[derive(Debug, Default)]
pub struct FixtureGraph {
    defs: FxHashMap<String, Vec<FixtureDef>>,
    /// Names in first-insertion order, for deterministic iteration
    order: Vec<String>,
    /// Definition identities already inserted, keyed by (file, line)
    seen: FxHashSet<(String, u32)>,
}

impl FixtureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, preserving visitation order. Returns false if
    /// this exact definition (same file and line) was already inserted.
    pub fn insert(&mut self, def: FixtureDef) -> bool {
        if !self.seen.insert((def.file.clone(), def.line)) {
            return false;
        }
        let entry = self.defs.entry(def.name.clone()).or_default();
        if entry.is_empty() {
            self.order.push(def.name.clone());
        }
        entry.push(def);
        true
    }

    /// All definitions sharing `name`, in insertion order.
    pub fn get(&self, name: &str) -> Option<&[FixtureDef]> {
        self.defs.get(name).map(|v| v.as_slice())
    }

    /// The effective (first-inserted) definition of `name`.
    pub fn first(&self, name: &str) -> Option<&FixtureDef> {
        self.defs.get(name).and_then(|v| v.first())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Add `test_id` to the consumer set of every definition of `name`.
    ///
    /// All same-named definitions are marked: static analysis cannot know
    /// which one the framework's nearest-scope resolution would pick.
    pub fn mark_consumed(&mut self, name: &str, test_id: &str) {
        if let Some(defs) = self.defs.get_mut(name) {
            for def in defs.iter_mut() {
                def.consumers.insert(test_id.to_string());
            }
        }
    }

    /// Fixture names in first-insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// (name, definitions) pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FixtureDef])> {
        self.order
            .iter()
            .filter_map(|name| self.defs.get(name).map(|v| (name.as_str(), v.as_slice())))
    }

    /// Whether any definition lists `name` as a dependency.
    pub fn is_dependency(&self, name: &str) -> bool {
        self.defs
            .values()
            .flatten()
            .any(|def| def.dependencies.iter().any(|d| d == name))
    }

    /// Number of distinct fixture names.
    pub fn name_count(&self) -> usize {
        self.order.len()
    }

    /// Total number of definitions.
    pub fn def_count(&self) -> usize {
        self.defs.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
