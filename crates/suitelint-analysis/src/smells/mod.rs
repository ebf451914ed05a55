//! Test-body smell detection.
//!
//! File-local pattern checks over each test entry point: flakiness
//! sources, maintenance smells, and semantic-quality hints. These share
//! the classifier primitives with the fixture engine but involve no
//! cross-file graph state beyond fixture scope lookups.

mod analyzer;

pub use analyzer::TestBodyAnalyzer;
