//! Parser subsystem - tree-sitter based source extraction.

pub mod python;
pub mod types;

use std::path::Path;

use suitelint_core::errors::ParseError;

pub use python::PythonParser;
pub use types::{
    AssertInfo, CallSite, ControlFlowInfo, ControlFlowKind, DecoratorArg, DecoratorCall,
    DecoratorInfo, FunctionInfo, ImportInfo, LiteralValue, MutationInfo, MutationKind, NameRef,
    Nesting, ParseIssue, ParseResult, Position, Range, ReturnInfo, ReturnShape,
};

/// Dispatches files to the right language parser by extension.
pub struct ParserManager {
    python: PythonParser,
}

impl ParserManager {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            python: PythonParser::new()?,
        })
    }

    /// Parse a file's source. Returns None for unsupported languages.
    pub fn parse_file(&mut self, path: &str, source: &str) -> Option<ParseResult> {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("py") | Some("pyi") => Some(self.python.parse(path, source)),
            _ => None,
        }
    }
}
