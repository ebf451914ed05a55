//! suitelint-core: shared foundation for the suitelint analysis engine
//!
//! This crate provides the pieces every analysis pass depends on:
//! - Rules: the closed catalog of diagnostic codes
//! - Diagnostics: the emit/collect sink used by all checkers
//! - Config: layered TOML configuration with env overrides
//! - Cache: the read-only external validation cache
//! - Errors: one error enum per subsystem

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod rules;
pub mod trace;

// Re-exports for convenience
pub use cache::ValidationCache;
pub use config::LintConfig;
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticSink};
pub use errors::{CacheError, ConfigError, ParseError};
pub use rules::Rule;
