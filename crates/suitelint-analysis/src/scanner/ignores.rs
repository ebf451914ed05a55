//! Ignore patterns for project scanning.
//!
//! These exclude dependency trees, caches, and build output so large
//! repositories scan quickly and virtualenv-vendored test suites do not
//! pollute the fixture graph.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Default directories to always ignore
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    // Python
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
    "virtualenv",
    ".virtualenv",
    "site-packages",
    ".eggs",
    "*.egg-info",
    ".tox",
    ".nox",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    // Version control
    ".git",
    ".svn",
    ".hg",
    // IDE/Editor
    ".idea",
    ".vscode",
    // Build outputs
    "build",
    "dist",
    "out",
    "_build",
    // Coverage
    ".coverage",
    "htmlcov",
    // Caches
    ".cache",
    // Node, for mixed repos
    "node_modules",
];

/// Compiled ignore matcher built from defaults plus per-project extras.
pub struct IgnorePatterns {
    gitignore: Gitignore,
}

impl IgnorePatterns {
    /// Create ignore patterns from defaults + custom patterns
    pub fn new(root: &Path, extra_patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        for pattern in DEFAULT_IGNORE_DIRS {
            let _ = builder.add_line(None, pattern);
        }
        for pattern in extra_patterns {
            let _ = builder.add_line(None, pattern);
        }

        let gitignore = builder.build().unwrap_or_else(|_| Gitignore::empty());
        Self { gitignore }
    }

    /// Whether a path (relative to the scan root) should be skipped.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}
