//! suitelint-analysis: static analysis for pytest-style test suites
//!
//! This crate provides the analysis pipeline:
//! - Scanner: deterministic file discovery with ignore patterns
//! - Parsers: native tree-sitter parsing of Python test files
//! - Fixtures: the cross-file fixture dependency graph engine
//! - Smells: file-local test body checks
//! - Engine: scan/parse/collect/finalize orchestration

pub mod engine;
pub mod fixtures;
pub mod parsers;
pub mod scanner;
pub mod smells;

// Re-exports for convenience
pub use engine::{AnalysisResult, AnalysisStats, SuiteAnalyzer};
pub use fixtures::{
    BuiltinInference, Collector, FixtureDef, FixtureGraph, FixtureReport, FixtureScope,
    Mutability, NoInference, TestUsage, TypeInference,
};
pub use parsers::{ParseResult, ParserManager, PythonParser};
pub use scanner::{FileInfo, ScanConfig, ScanResult, Scanner};
pub use smells::TestBodyAnalyzer;
