//! Scanner types - configuration and results for file discovery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// Glob patterns to include
    pub patterns: Vec<String>,
    /// Additional patterns to ignore (beyond defaults)
    pub extra_ignores: Vec<String>,
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            patterns: vec![
                "**/test_*.py".to_string(),
                "**/*_test.py".to_string(),
                "**/conftest.py".to_string(),
            ],
            extra_ignores: vec![],
            max_file_size: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// Information about a discovered file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Relative path from scan root, forward slashes
    pub path: String,
    /// File size in bytes
    pub size: u64,
}

/// Statistics about the scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total files found
    pub total_files: usize,
    /// Total bytes across found files
    pub total_bytes: u64,
    /// Files skipped (too large)
    pub files_skipped: usize,
    /// Scan duration in milliseconds
    pub duration_ms: u64,
}

/// Result of a scan operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root directory that was scanned
    pub root: String,
    /// Files found, in deterministic walk order
    pub files: Vec<FileInfo>,
    /// Scan statistics
    pub stats: ScanStats,
    /// Any errors encountered (non-fatal)
    pub errors: Vec<String>,
}
