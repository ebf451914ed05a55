//! Validation cache errors.

/// Errors that can occur while reading the external validation cache.
///
/// These are absorbed at the load site: a failed cache read degrades to an
/// empty cache, it never aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to read cache file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache file {path}: {message}")]
    Malformed { path: String, message: String },
}
