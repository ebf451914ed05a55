//! Analysis orchestration.

mod analyzer;
mod types;

pub use analyzer::SuiteAnalyzer;
pub use types::{AnalysisResult, AnalysisStats};
