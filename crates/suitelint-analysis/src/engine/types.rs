//! Engine result types.

use serde::Serialize;

use suitelint_core::diagnostics::Diagnostic;

/// Counters for one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    /// Files the scanner found
    pub files_scanned: usize,
    /// Files that parsed and went through both collection passes
    pub files_analyzed: usize,
    /// Files skipped for parse or read failures
    pub parse_failures: usize,
    /// Distinct fixture names in the final graph
    pub fixture_names: usize,
    /// Total fixture definitions (shadowed names count once each)
    pub fixture_defs: usize,
    /// Test entry points observed
    pub tests_seen: usize,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

/// Result of one full analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Root directory analyzed
    pub root: String,
    /// Every finding, in emission order
    pub diagnostics: Vec<Diagnostic>,
    pub stats: AnalysisStats,
}
