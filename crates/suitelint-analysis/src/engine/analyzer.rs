//! The analysis engine: owns the traversal the checker is driven by.
//!
//! One run is scan, then per file (in scan order) parse and feed both
//! collection passes plus the smell analyzer, then a single finalize.
//! The fixture graph lives inside the run and is discarded with it.

use std::fs;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use suitelint_core::cache::ValidationCache;
use suitelint_core::config::LintConfig;
use suitelint_core::diagnostics::DiagnosticCollector;
use suitelint_core::errors::ParseError;

use crate::fixtures::{BuiltinInference, Collector};
use crate::parsers::ParserManager;
use crate::scanner::{ScanConfig, Scanner};
use crate::smells::TestBodyAnalyzer;

use super::types::{AnalysisResult, AnalysisStats};

/// Whole-suite analyzer.
pub struct SuiteAnalyzer {
    config: LintConfig,
    parser: ParserManager,
}

impl SuiteAnalyzer {
    pub fn new(config: LintConfig) -> Result<Self, ParseError> {
        Ok(Self {
            config,
            parser: ParserManager::new()?,
        })
    }

    /// Analyzer with configuration loaded from `root`, falling back to
    /// defaults when no project config exists.
    pub fn for_project(root: &Path) -> Result<Self, ParseError> {
        let config = LintConfig::load(root).unwrap_or_else(|e| {
            warn!("failed to load config, using defaults: {e}");
            LintConfig::default()
        });
        Self::new(config)
    }

    /// Run the full analysis over a project tree.
    pub fn analyze(&mut self, root: &Path) -> AnalysisResult {
        let start = Instant::now();
        let Self { config, parser } = self;

        let cache = ValidationCache::load(&root.join(&config.cache_path));
        if !cache.is_empty() {
            debug!("validation cache loaded");
        }

        let scan = Scanner::new(ScanConfig {
            root: root.to_path_buf(),
            ..Default::default()
        })
        .scan();
        for error in &scan.errors {
            warn!("scan error: {error}");
        }

        let mut sink = DiagnosticCollector::with_disabled_rules(config.disabled_rules.clone());
        let mut collector = Collector::new(config.clone());
        let smells = TestBodyAnalyzer::new(config, &cache);

        let mut parse_failures = 0usize;
        let mut files_analyzed = 0usize;

        for file in &scan.files {
            let full_path = root.join(&file.path);
            let source = match fs::read_to_string(&full_path) {
                Ok(source) => source,
                Err(e) => {
                    warn!("skipping unreadable file {}: {e}", file.path);
                    parse_failures += 1;
                    continue;
                }
            };

            let Some(parse) = parser.parse_file(&file.path, &source) else {
                continue;
            };
            if !parse.errors.is_empty() {
                warn!("skipping unparseable file {}", file.path);
                parse_failures += 1;
                continue;
            }

            collector.visit_file(&parse, &mut sink);
            smells.analyze_file(&parse, collector.graph(), &mut sink);
            files_analyzed += 1;
        }

        let report = collector.finalize(&BuiltinInference, &mut sink);

        AnalysisResult {
            root: scan.root,
            diagnostics: sink.into_diagnostics(),
            stats: AnalysisStats {
                files_scanned: scan.stats.total_files,
                files_analyzed,
                parse_failures,
                fixture_names: report.fixture_names,
                fixture_defs: report.fixture_defs,
                tests_seen: report.tests_seen,
                duration_ms: start.elapsed().as_millis() as u64,
            },
        }
    }
}
