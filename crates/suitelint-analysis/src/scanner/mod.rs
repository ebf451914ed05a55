//! Scanner module - deterministic file discovery.
//!
//! Walks the project tree sequentially with directory entries sorted by
//! name, so every run visits files in the same order. Collection order
//! matters downstream: the fixture graph preserves it, and diagnostics
//! must come out byte-identical across runs over an unchanged tree.

mod ignores;
mod types;
mod walker;

pub use ignores::{IgnorePatterns, DEFAULT_IGNORE_DIRS};
pub use types::{FileInfo, ScanConfig, ScanResult, ScanStats};
pub use walker::Scanner;
