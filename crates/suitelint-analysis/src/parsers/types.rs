//! Parser types - syntactic facts extracted from one source file.
//!
//! The parser flattens the tree into per-concern fact lists (functions,
//! calls, asserts, returns, ...) carrying source ranges; later passes
//! attribute facts to functions by range containment, so nothing here
//! borrows from the parse tree.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A position in source (0-indexed, as tree-sitter reports it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start: Position {
                line: start_line,
                column: start_column,
            },
            end: Position {
                line: end_line,
                column: end_column,
            },
        }
    }

    /// Whether `other` lies entirely within this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// 1-based line for diagnostics.
    pub fn display_line(&self) -> u32 {
        self.start.line + 1
    }
}

/// Where a function sits in the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nesting {
    /// Directly at module level
    Module,
    /// A method in a class body
    Class,
    /// Inside another function
    Nested,
}

/// A literal constant value observed in source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LiteralValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One positional argument of a decorator call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratorArg {
    /// Source text of the argument
    pub text: String,
    /// Element texts, when the argument is a list/tuple literal
    pub list_elements: Option<Vec<String>>,
}

/// Call portion of a call-style decorator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoratorCall {
    /// Keyword arguments with literal values
    pub kwargs: Vec<(String, LiteralValue)>,
    /// Positional arguments in order
    pub args: Vec<DecoratorArg>,
}

impl DecoratorCall {
    pub fn kwarg(&self, name: &str) -> Option<&LiteralValue> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// A decorator attached to a function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratorInfo {
    /// Dotted name of the decorator expression (e.g. "pytest.fixture")
    pub qualname: String,
    /// Present when the decorator is a call (`@fixture(...)`)
    pub call: Option<DecoratorCall>,
    /// Full source text, including arguments
    pub text: String,
    pub range: Range,
}

impl DecoratorInfo {
    /// Last segment of the dotted name.
    pub fn name(&self) -> &str {
        self.qualname.rsplit('.').next().unwrap_or(&self.qualname)
    }
}

/// A function or method definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Formal parameter names, in order
    pub params: SmallVec<[String; 4]>,
    pub decorators: Vec<DecoratorInfo>,
    pub is_async: bool,
    pub nesting: Nesting,
    /// Whether the body contains a yield (generator/teardown fixture)
    pub has_yield: bool,
    /// Whether statements follow the yielding statement (teardown code)
    pub has_post_yield_cleanup: bool,
    /// Raw docstring text, quotes included
    pub docstring: Option<String>,
    /// Range of the `def` itself
    pub range: Range,
    /// Range of the body block
    pub body_range: Range,
}

impl FunctionInfo {
    /// 1-based line of the `def` for diagnostics.
    pub fn line(&self) -> u32 {
        self.range.display_line()
    }
}

/// An import statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportInfo {
    /// Dotted module path
    pub module: String,
    /// Imported names, for from-imports
    pub names: Vec<String>,
    pub range: Range,
}

impl ImportInfo {
    /// Leading segment of the module path.
    pub fn base_module(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

/// A call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    /// Called name (last segment)
    pub callee: String,
    /// Receiver expression text, for method calls
    pub receiver: Option<String>,
    /// Dotted call target (e.g. "time.sleep")
    pub qualname: String,
    pub arg_count: usize,
    pub range: Range,
}

impl CallSite {
    /// Last segment of the dotted call target.
    pub fn method_name(&self) -> &str {
        self.qualname.rsplit('.').next().unwrap_or(&self.qualname)
    }
}

/// An assert statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertInfo {
    /// Literal operands appearing in a top-level comparison
    pub literal_operands: Vec<LiteralValue>,
    /// True for unittest-style wrappers around a comparison,
    /// e.g. `assert self.assertTrue(x == y)`
    pub wraps_comparison_helper: bool,
    pub range: Range,
}

/// Shape of a returned expression, classified for mutability analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnShape {
    ListLiteral,
    DictLiteral,
    SetLiteral,
    TupleLiteral,
    /// A call, with its dotted target
    Call(String),
    /// A plain name reference
    Name(String),
    /// String/number/bool/None literal
    ImmutableLiteral,
    /// `return` with no value
    Bare,
    Other,
}

/// A return statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnInfo {
    pub shape: ReturnShape,
    pub range: Range,
}

/// Control flow statement kinds tracked inside test bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlFlowKind {
    If,
    For,
    While,
    TryExcept,
}

/// A control flow statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowInfo {
    pub kind: ControlFlowKind,
    pub range: Range,
}

/// Kinds of in-place mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// `x += ...`
    AugmentedAssign,
    /// `x[k] = ...`
    SubscriptAssign,
    /// `x.attr = ...`
    AttributeAssign,
    /// `x.append(...)` and friends
    MutatingCall,
}

/// An observed in-place mutation, with the base name being mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationInfo {
    pub kind: MutationKind,
    /// Leftmost identifier of the mutated expression
    pub target: String,
    pub range: Range,
}

/// A read (or write) reference to a plain name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
    pub range: Range,
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseIssue {
    pub message: String,
    pub range: Range,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    /// Path of the parsed file, as given to the parser
    pub file: String,
    pub functions: Vec<FunctionInfo>,
    pub imports: Vec<ImportInfo>,
    pub calls: Vec<CallSite>,
    pub asserts: Vec<AssertInfo>,
    pub returns: Vec<ReturnInfo>,
    pub mutations: Vec<MutationInfo>,
    pub control_flow: Vec<ControlFlowInfo>,
    /// Ranges of `with pytest.raises(...)` blocks
    pub raises_blocks: Vec<Range>,
    /// Name reads inside expressions
    pub name_refs: Vec<NameRef>,
    /// Plain identifiers assigned anywhere (used for local-shadow checks)
    pub assigned_names: Vec<NameRef>,
    /// Names assigned at module level
    pub module_names: FxHashSet<String>,
    /// Names of classes defined in this file
    pub class_defs: FxHashSet<String>,
    /// Names assigned directly in class bodies
    pub class_level_names: FxHashSet<String>,
    pub errors: Vec<ParseIssue>,
    pub parse_time_us: u64,
}

impl ParseResult {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            functions: Vec::new(),
            imports: Vec::new(),
            calls: Vec::new(),
            asserts: Vec::new(),
            returns: Vec::new(),
            mutations: Vec::new(),
            control_flow: Vec::new(),
            raises_blocks: Vec::new(),
            name_refs: Vec::new(),
            assigned_names: Vec::new(),
            module_names: FxHashSet::default(),
            class_defs: FxHashSet::default(),
            class_level_names: FxHashSet::default(),
            errors: Vec::new(),
            parse_time_us: 0,
        }
    }

    /// Calls whose range falls inside `range`.
    pub fn calls_in<'a>(&'a self, range: &'a Range) -> impl Iterator<Item = &'a CallSite> {
        self.calls.iter().filter(move |c| range.contains(&c.range))
    }

    /// Asserts whose range falls inside `range`.
    pub fn asserts_in<'a>(&'a self, range: &'a Range) -> impl Iterator<Item = &'a AssertInfo> {
        self.asserts.iter().filter(move |a| range.contains(&a.range))
    }

    /// Return statements whose range falls inside `range`.
    pub fn returns_in<'a>(&'a self, range: &'a Range) -> impl Iterator<Item = &'a ReturnInfo> {
        self.returns.iter().filter(move |r| range.contains(&r.range))
    }

    /// Whether a `pytest.raises` block overlaps `range`.
    pub fn has_raises_in(&self, range: &Range) -> bool {
        self.raises_blocks.iter().any(|r| range.contains(r))
    }

    /// Whether `inner` sits inside any `pytest.raises` block.
    pub fn inside_raises_block(&self, inner: &Range) -> bool {
        self.raises_blocks.iter().any(|r| r.contains(inner))
    }
}
