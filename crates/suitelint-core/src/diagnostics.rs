//! Diagnostic records and the emit/collect sink.
//!
//! Checkers never format output themselves; they hand findings to a
//! `DiagnosticSink` and move on. The default collector keeps emission
//! order, which together with deterministic file ordering makes two runs
//! over the same tree produce identical diagnostic sequences.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::rules::Rule;

/// A single reported finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The rule that fired
    pub rule: Rule,
    /// Stable message id (e.g. "W9033")
    pub code: String,
    /// File the finding is anchored to
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// Fully rendered message
    pub message: String,
}

impl Diagnostic {
    pub fn new(rule: Rule, file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            rule,
            code: rule.id().to_string(),
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file,
            self.line,
            self.code,
            self.rule.symbol(),
            self.message
        )
    }
}

/// Fire-and-forget sink for findings. Implementations must not fail.
pub trait DiagnosticSink {
    fn emit(&mut self, rule: Rule, file: &str, line: u32, message: String);
}

/// The default sink: accumulates diagnostics in emission order, dropping
/// rules the configuration disabled.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    disabled: FxHashSet<String>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector that silently drops findings for the given rule symbols.
    pub fn with_disabled_rules<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            diagnostics: Vec::new(),
            disabled: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&mut self, rule: Rule, file: &str, line: u32, message: String) {
        if self.disabled.contains(rule.symbol()) {
            return;
        }
        self.diagnostics.push(Diagnostic::new(rule, file, line, message));
    }
}
