//! Sequential file walker.
//!
//! Directory entries are sorted by name before descent, giving a stable
//! file-open order: the fixture graph's shadowing semantics depend on
//! which definition is seen first, so the walk must be reproducible.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};

use super::ignores::IgnorePatterns;
use super::types::{FileInfo, ScanConfig, ScanResult, ScanStats};

/// Deterministic project scanner
pub struct Scanner {
    config: ScanConfig,
    ignores: IgnorePatterns,
    include_globs: GlobSet,
}

impl Scanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let ignores = IgnorePatterns::new(&config.root, &config.extra_ignores);

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.patterns {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }
        let include_globs = builder
            .build()
            .unwrap_or_else(|_| GlobSet::empty());

        Self {
            config,
            ignores,
            include_globs,
        }
    }

    /// Scan the filesystem and return results
    pub fn scan(&self) -> ScanResult {
        let start = Instant::now();

        let mut paths = Vec::new();
        let mut errors = Vec::new();
        self.walk_dir(&self.config.root, &mut paths, &mut errors);

        let mut files = Vec::new();
        let mut files_skipped = 0usize;
        let mut total_bytes = 0u64;

        for path in paths {
            match self.process_file(&path) {
                Ok(Some(info)) => {
                    total_bytes += info.size;
                    files.push(info);
                }
                Ok(None) => files_skipped += 1,
                Err(e) => errors.push(format!("{}: {}", path.display(), e)),
            }
        }

        let stats = ScanStats {
            total_files: files.len(),
            total_bytes,
            files_skipped,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        ScanResult {
            root: self.config.root.display().to_string(),
            files,
            stats,
            errors,
        }
    }

    /// Recursively walk a directory in sorted entry order
    fn walk_dir(&self, dir: &Path, files: &mut Vec<PathBuf>, errors: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                errors.push(format!("{}: {}", dir.display(), e));
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            let relative = path.strip_prefix(&self.config.root).unwrap_or(&path);

            if path.is_dir() {
                if !self.ignores.is_ignored(relative, true) {
                    self.walk_dir(&path, files, errors);
                }
            } else if path.is_file()
                && !self.ignores.is_ignored(relative, false)
                && (self.include_globs.is_empty() || self.include_globs.is_match(relative))
            {
                files.push(path);
            }
        }
    }

    /// Process a single file
    fn process_file(&self, path: &Path) -> Result<Option<FileInfo>, std::io::Error> {
        let metadata = fs::metadata(path)?;
        let size = metadata.len();

        if size > self.config.max_file_size {
            return Ok(None);
        }

        let relative = path
            .strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        Ok(Some(FileInfo {
            path: relative,
            size,
        }))
    }
}
