//! Parsing errors.

/// Errors that can occur while setting up or running the source parser.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to load grammar: {0}")]
    Grammar(String),

    #[error("Query compilation failed: {0}")]
    QueryCompilationFailed(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}")]
    Unparseable { path: String },
}
