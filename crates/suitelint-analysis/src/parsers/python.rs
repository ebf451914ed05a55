//! Python parser using native tree-sitter.
//!
//! Extracts functions, imports, and call sites via tree-sitter queries,
//! plus statement-level facts (asserts, returns, control flow, mutations,
//! name references) via a single recursive walk.

use std::time::Instant;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use suitelint_core::errors::ParseError;

use super::types::*;

/// Method names whose call mutates the receiver in place.
const MUTATING_METHODS: &[&str] = &[
    "append",
    "extend",
    "insert",
    "remove",
    "pop",
    "clear",
    "update",
    "add",
    "discard",
    "setdefault",
];

/// Scope flags carried down the statement walk.
#[derive(Debug, Clone, Copy, Default)]
struct ScopeCtx {
    in_function: bool,
    in_class: bool,
}

/// Python parser
pub struct PythonParser {
    parser: Parser,
    import_query: Query,
    call_query: Query,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| ParseError::Grammar(e.to_string()))?;

        // Query for imports
        let import_query = Query::new(
            &language.into(),
            r#"
            (import_statement
                name: (dotted_name) @module
            ) @import

            (import_statement
                name: (aliased_import name: (dotted_name) @module)
            ) @import

            (import_from_statement
                module_name: (dotted_name) @module
                name: [
                    (dotted_name) @name
                    (aliased_import name: (dotted_name) @name)
                ]*
            ) @from_import
            "#,
        )
        .map_err(|e| ParseError::QueryCompilationFailed(e.to_string()))?;

        // Query for function calls
        let call_query = Query::new(
            &language.into(),
            r#"
            (call
                function: [
                    (identifier) @callee
                    (attribute
                        object: (_) @receiver
                        attribute: (identifier) @callee
                    )
                ]
                arguments: (argument_list) @args
            ) @call
            "#,
        )
        .map_err(|e| ParseError::QueryCompilationFailed(e.to_string()))?;

        Ok(Self {
            parser,
            import_query,
            call_query,
        })
    }

    /// Parse Python source code
    pub fn parse(&mut self, file: &str, source: &str) -> ParseResult {
        let start = Instant::now();

        let mut result = ParseResult::new(file);

        let tree = match self.parser.parse(source, None) {
            Some(t) => t,
            None => {
                result.errors.push(ParseIssue {
                    message: "failed to parse source".to_string(),
                    range: Range::new(0, 0, 0, 0),
                });
                return result;
            }
        };

        let root = tree.root_node();
        let source_bytes = source.as_bytes();

        if root.has_error() {
            result.errors.push(ParseIssue {
                message: "syntax errors present".to_string(),
                range: node_range(&root),
            });
        }

        self.extract_imports(&root, source_bytes, &mut result);
        self.extract_calls(&root, source_bytes, &mut result);
        self.walk(root, source_bytes, ScopeCtx::default(), &mut result);

        result.parse_time_us = start.elapsed().as_micros() as u64;
        result
    }

    fn extract_imports(&self, root: &Node, source: &[u8], result: &mut ParseResult) {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.import_query, *root, source);

        while let Some(m) = matches.next() {
            let mut module = String::new();
            let mut names = Vec::new();
            let mut range = Range::new(0, 0, 0, 0);

            for capture in m.captures {
                let node = capture.node;
                let capture_name = self.import_query.capture_names()[capture.index as usize];

                match capture_name {
                    "module" => {
                        module = node_text(&node, source);
                    }
                    "name" => {
                        names.push(node_text(&node, source));
                    }
                    "import" | "from_import" => {
                        range = node_range(&node);
                    }
                    _ => {}
                }
            }

            if !module.is_empty() {
                result.imports.push(ImportInfo {
                    module,
                    names,
                    range,
                });
            }
        }
    }

    fn extract_calls(&self, root: &Node, source: &[u8], result: &mut ParseResult) {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.call_query, *root, source);

        while let Some(m) = matches.next() {
            let mut callee = String::new();
            let mut receiver = None;
            let mut arg_count = 0;
            let mut range = Range::new(0, 0, 0, 0);

            for capture in m.captures {
                let node = capture.node;
                let capture_name = self.call_query.capture_names()[capture.index as usize];

                match capture_name {
                    "callee" => {
                        callee = node_text(&node, source);
                    }
                    "receiver" => {
                        receiver = Some(compact_text(&node, source));
                    }
                    "args" => {
                        arg_count = node.named_child_count();
                    }
                    "call" => {
                        range = node_range(&node);
                    }
                    _ => {}
                }
            }

            if !callee.is_empty() {
                let qualname = match &receiver {
                    Some(r) => format!("{r}.{callee}"),
                    None => callee.clone(),
                };
                result.calls.push(CallSite {
                    callee,
                    receiver,
                    qualname,
                    arg_count,
                    range,
                });
            }
        }
    }

    /// Recursive statement walk: functions, asserts, returns, control flow,
    /// mutations, assignments, and name references.
    fn walk(&self, node: Node, source: &[u8], ctx: ScopeCtx, result: &mut ParseResult) {
        match node.kind() {
            "function_definition" => {
                self.extract_function(&node, source, ctx, result);
                let child_ctx = ScopeCtx {
                    in_function: true,
                    in_class: ctx.in_class,
                };
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, source, child_ctx, result);
                }
                return;
            }
            "class_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    result.class_defs.insert(node_text(&name, source));
                }
                let child_ctx = ScopeCtx {
                    in_function: ctx.in_function,
                    in_class: true,
                };
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, source, child_ctx, result);
                }
                return;
            }
            // Imports are handled by query; nothing inside is a name read.
            "import_statement" | "import_from_statement" | "global_statement"
            | "nonlocal_statement" => return,
            // Decorators are handled during function extraction.
            "decorator" => return,
            "assert_statement" => {
                result.asserts.push(self.extract_assert(&node, source));
            }
            "return_statement" => {
                let shape = match node.named_child(0) {
                    Some(expr) => classify_return_shape(&expr, source),
                    None => ReturnShape::Bare,
                };
                result.returns.push(ReturnInfo {
                    shape,
                    range: node_range(&node),
                });
            }
            "if_statement" => {
                result.control_flow.push(ControlFlowInfo {
                    kind: ControlFlowKind::If,
                    range: node_range(&node),
                });
            }
            "for_statement" => {
                result.control_flow.push(ControlFlowInfo {
                    kind: ControlFlowKind::For,
                    range: node_range(&node),
                });
            }
            "while_statement" => {
                result.control_flow.push(ControlFlowInfo {
                    kind: ControlFlowKind::While,
                    range: node_range(&node),
                });
            }
            "try_statement" => {
                let mut cursor = node.walk();
                let has_handler = node
                    .children(&mut cursor)
                    .any(|c| c.kind() == "except_clause");
                if has_handler {
                    result.control_flow.push(ControlFlowInfo {
                        kind: ControlFlowKind::TryExcept,
                        range: node_range(&node),
                    });
                }
            }
            "with_statement" => {
                if with_statement_is_raises(&node, source) {
                    result.raises_blocks.push(node_range(&node));
                }
            }
            "assignment" => {
                self.extract_assignment(&node, source, ctx, result);
            }
            "augmented_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    let (kind, target) = match left.kind() {
                        "subscript" => (
                            MutationKind::SubscriptAssign,
                            left.child_by_field_name("value")
                                .and_then(|v| leftmost_identifier(&v, source)),
                        ),
                        "attribute" => (
                            MutationKind::AttributeAssign,
                            left.child_by_field_name("object")
                                .and_then(|o| leftmost_identifier(&o, source)),
                        ),
                        _ => (
                            MutationKind::AugmentedAssign,
                            leftmost_identifier(&left, source),
                        ),
                    };
                    if let Some(target) = target {
                        result.mutations.push(MutationInfo {
                            kind,
                            target,
                            range: node_range(&node),
                        });
                    }
                }
            }
            "call" => {
                // Mutating method calls like value.append(...)
                if let Some(func) = node.child_by_field_name("function") {
                    if func.kind() == "attribute" {
                        if let Some(attr) = func.child_by_field_name("attribute") {
                            let method = node_text(&attr, source);
                            if MUTATING_METHODS.contains(&method.as_str()) {
                                if let Some(target) = func
                                    .child_by_field_name("object")
                                    .and_then(|o| leftmost_identifier(&o, source))
                                {
                                    result.mutations.push(MutationInfo {
                                        kind: MutationKind::MutatingCall,
                                        target,
                                        range: node_range(&node),
                                    });
                                }
                            }
                        }
                    }
                }
            }
            "identifier" => {
                if is_name_read(&node) {
                    result.name_refs.push(NameRef {
                        name: node_text(&node, source),
                        range: node_range(&node),
                    });
                }
                return;
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, source, ctx, result);
        }
    }

    fn extract_function(
        &self,
        node: &Node,
        source: &[u8],
        ctx: ScopeCtx,
        result: &mut ParseResult,
    ) {
        let name = match node.child_by_field_name("name") {
            Some(n) => node_text(&n, source),
            None => return,
        };

        let mut cursor = node.walk();
        let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

        let mut params = smallvec::SmallVec::new();
        if let Some(parameters) = node.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            for child in parameters.named_children(&mut cursor) {
                match child.kind() {
                    "identifier" => params.push(node_text(&child, source)),
                    "typed_parameter" => {
                        if let Some(inner) = child.named_child(0) {
                            if inner.kind() == "identifier" {
                                params.push(node_text(&inner, source));
                            }
                        }
                    }
                    "default_parameter" | "typed_default_parameter" => {
                        if let Some(inner) = child.child_by_field_name("name") {
                            if inner.kind() == "identifier" {
                                params.push(node_text(&inner, source));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        // Decorators live on the wrapping decorated_definition node.
        let mut decorators = Vec::new();
        if let Some(parent) = node.parent() {
            if parent.kind() == "decorated_definition" {
                let mut cursor = parent.walk();
                for child in parent.children(&mut cursor) {
                    if child.kind() == "decorator" {
                        decorators.push(parse_decorator(&child, source));
                    }
                }
            }
        }

        let nesting = if ctx.in_function {
            Nesting::Nested
        } else if ctx.in_class {
            Nesting::Class
        } else {
            Nesting::Module
        };

        let body = node.child_by_field_name("body");
        let body_range = body.map(|b| node_range(&b)).unwrap_or_else(|| node_range(node));

        let docstring = body.and_then(|b| {
            let first = b.named_child(0)?;
            if first.kind() != "expression_statement" {
                return None;
            }
            let inner = first.named_child(0)?;
            if inner.kind() == "string" {
                Some(node_text(&inner, source))
            } else {
                None
            }
        });

        let mut has_yield = false;
        let mut has_post_yield_cleanup = false;
        if let Some(body) = body {
            let count = body.named_child_count();
            for idx in 0..count {
                if let Some(stmt) = body.named_child(idx) {
                    if contains_yield(&stmt) {
                        has_yield = true;
                        if idx + 1 < count {
                            has_post_yield_cleanup = true;
                        }
                        break;
                    }
                }
            }
        }

        result.functions.push(FunctionInfo {
            name,
            params,
            decorators,
            is_async,
            nesting,
            has_yield,
            has_post_yield_cleanup,
            docstring,
            range: node_range(node),
            body_range,
        });
    }

    fn extract_assert(&self, node: &Node, source: &[u8]) -> AssertInfo {
        let mut literal_operands = Vec::new();
        let mut wraps_comparison_helper = false;

        if let Some(expr) = node.named_child(0) {
            match expr.kind() {
                "comparison_operator" => {
                    let mut cursor = expr.walk();
                    for operand in expr.named_children(&mut cursor) {
                        if let Some(value) = literal_value(&operand, source) {
                            literal_operands.push(value);
                        }
                    }
                }
                "call" => {
                    // assert self.assertTrue(x == y) style wrappers
                    if let Some(func) = expr.child_by_field_name("function") {
                        if func.kind() == "attribute" {
                            if let Some(attr) = func.child_by_field_name("attribute") {
                                let name = node_text(&attr, source);
                                if matches!(
                                    name.as_str(),
                                    "assertTrue" | "assertFalse" | "assertEqual"
                                ) {
                                    if let Some(args) = expr.child_by_field_name("arguments") {
                                        if let Some(first) = args.named_child(0) {
                                            if matches!(
                                                first.kind(),
                                                "comparison_operator"
                                                    | "binary_operator"
                                                    | "boolean_operator"
                                            ) {
                                                wraps_comparison_helper = true;
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        AssertInfo {
            literal_operands,
            wraps_comparison_helper,
            range: node_range(node),
        }
    }

    fn extract_assignment(
        &self,
        node: &Node,
        source: &[u8],
        ctx: ScopeCtx,
        result: &mut ParseResult,
    ) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };

        match left.kind() {
            "identifier" => {
                self.record_assigned_name(&left, source, ctx, result);
            }
            "pattern_list" | "tuple_pattern" => {
                let mut cursor = left.walk();
                for target in left.named_children(&mut cursor) {
                    if target.kind() == "identifier" {
                        self.record_assigned_name(&target, source, ctx, result);
                    }
                }
            }
            "subscript" => {
                if let Some(target) = left
                    .child_by_field_name("value")
                    .and_then(|v| leftmost_identifier(&v, source))
                {
                    result.mutations.push(MutationInfo {
                        kind: MutationKind::SubscriptAssign,
                        target,
                        range: node_range(node),
                    });
                }
            }
            "attribute" => {
                if let Some(target) = left
                    .child_by_field_name("object")
                    .and_then(|o| leftmost_identifier(&o, source))
                {
                    result.mutations.push(MutationInfo {
                        kind: MutationKind::AttributeAssign,
                        target,
                        range: node_range(node),
                    });
                }
            }
            _ => {}
        }
    }

    fn record_assigned_name(
        &self,
        node: &Node,
        source: &[u8],
        ctx: ScopeCtx,
        result: &mut ParseResult,
    ) {
        let name = node_text(node, source);
        result.assigned_names.push(NameRef {
            name: name.clone(),
            range: node_range(node),
        });
        if !ctx.in_function {
            if ctx.in_class {
                result.class_level_names.insert(name);
            } else {
                result.module_names.insert(name);
            }
        }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new().expect("Failed to create Python parser")
    }
}

/// Parse a decorator node into a structured record.
fn parse_decorator(node: &Node, source: &[u8]) -> DecoratorInfo {
    let text = node_text(node, source);
    let range = node_range(node);

    let Some(expr) = node.named_child(0) else {
        return DecoratorInfo {
            qualname: text.trim_start_matches('@').to_string(),
            call: None,
            text,
            range,
        };
    };

    match expr.kind() {
        "identifier" | "attribute" => DecoratorInfo {
            qualname: compact_text(&expr, source),
            call: None,
            text,
            range,
        },
        "call" => {
            let qualname = expr
                .child_by_field_name("function")
                .map(|f| compact_text(&f, source))
                .unwrap_or_default();

            let mut call = DecoratorCall::default();
            if let Some(args) = expr.child_by_field_name("arguments") {
                let mut cursor = args.walk();
                for arg in args.named_children(&mut cursor) {
                    if arg.kind() == "keyword_argument" {
                        let name = arg
                            .child_by_field_name("name")
                            .map(|n| node_text(&n, source));
                        let value = arg
                            .child_by_field_name("value")
                            .and_then(|v| literal_value(&v, source));
                        if let (Some(name), Some(value)) = (name, value) {
                            call.kwargs.push((name, value));
                        }
                    } else {
                        let list_elements = if matches!(arg.kind(), "list" | "tuple") {
                            let mut cursor = arg.walk();
                            Some(
                                arg.named_children(&mut cursor)
                                    .map(|e| compact_text(&e, source))
                                    .collect(),
                            )
                        } else {
                            None
                        };
                        call.args.push(DecoratorArg {
                            text: node_text(&arg, source),
                            list_elements,
                        });
                    }
                }
            }

            DecoratorInfo {
                qualname,
                call: Some(call),
                text,
                range,
            }
        }
        _ => DecoratorInfo {
            qualname: compact_text(&expr, source),
            call: None,
            text,
            range,
        },
    }
}

/// Classify a returned expression for mutability analysis.
fn classify_return_shape(expr: &Node, source: &[u8]) -> ReturnShape {
    match expr.kind() {
        "list" | "list_comprehension" => ReturnShape::ListLiteral,
        "dictionary" | "dictionary_comprehension" => ReturnShape::DictLiteral,
        "set" | "set_comprehension" => ReturnShape::SetLiteral,
        "tuple" => ReturnShape::TupleLiteral,
        "call" => {
            let qualname = expr
                .child_by_field_name("function")
                .map(|f| compact_text(&f, source))
                .unwrap_or_default();
            ReturnShape::Call(qualname)
        }
        "identifier" => ReturnShape::Name(node_text(expr, source)),
        "string" | "concatenated_string" | "integer" | "float" | "true" | "false" | "none" => {
            ReturnShape::ImmutableLiteral
        }
        "parenthesized_expression" => match expr.named_child(0) {
            Some(inner) => classify_return_shape(&inner, source),
            None => ReturnShape::Other,
        },
        _ => ReturnShape::Other,
    }
}

/// Whether a with-statement opens a `pytest.raises`-style block.
fn with_statement_is_raises(node: &Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    for clause in node.children(&mut cursor) {
        if clause.kind() != "with_clause" {
            continue;
        }
        let mut item_cursor = clause.walk();
        for item in clause.named_children(&mut item_cursor) {
            let Some(mut value) = item.child_by_field_name("value") else {
                continue;
            };
            if value.kind() == "as_pattern" {
                match value.named_child(0) {
                    Some(inner) => value = inner,
                    None => continue,
                }
            }
            if value.kind() == "call" {
                if let Some(func) = value.child_by_field_name("function") {
                    if compact_text(&func, source).ends_with("raises") {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Whether a statement subtree contains a yield, without descending into
/// nested function definitions.
fn contains_yield(node: &Node) -> bool {
    if node.kind() == "yield" {
        return true;
    }
    if node.kind() == "function_definition" {
        return false;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if contains_yield(&child) {
            return true;
        }
    }
    false
}

/// Whether an identifier node is a plain name read (not a binding
/// position, attribute name, or keyword-argument name).
fn is_name_read(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    match parent.kind() {
        "function_definition" | "class_definition" => {
            parent.child_by_field_name("name").map(|n| n.id()) != Some(node.id())
        }
        "parameters" | "typed_parameter" | "lambda_parameters" => false,
        "default_parameter" | "typed_default_parameter" => {
            parent.child_by_field_name("name").map(|n| n.id()) != Some(node.id())
        }
        "keyword_argument" => {
            parent.child_by_field_name("name").map(|n| n.id()) != Some(node.id())
        }
        "attribute" => {
            parent.child_by_field_name("attribute").map(|n| n.id()) != Some(node.id())
        }
        "dotted_name" | "aliased_import" | "as_pattern_target" => false,
        _ => true,
    }
}

/// Leftmost identifier of an attribute/subscript/call chain.
fn leftmost_identifier(node: &Node, source: &[u8]) -> Option<String> {
    let mut current = *node;
    loop {
        match current.kind() {
            "identifier" => return Some(node_text(&current, source)),
            "attribute" => current = current.child_by_field_name("object")?,
            "subscript" => current = current.child_by_field_name("value")?,
            "call" => current = current.child_by_field_name("function")?,
            "parenthesized_expression" => current = current.named_child(0)?,
            _ => return None,
        }
    }
}

/// Extract a literal constant, if the node is one.
fn literal_value(node: &Node, source: &[u8]) -> Option<LiteralValue> {
    match node.kind() {
        "string" => Some(LiteralValue::Str(string_inner(node, source))),
        "integer" => node_text(node, source)
            .parse::<i64>()
            .ok()
            .map(LiteralValue::Int),
        "float" => node_text(node, source)
            .parse::<f64>()
            .ok()
            .map(LiteralValue::Float),
        "true" => Some(LiteralValue::Bool(true)),
        "false" => Some(LiteralValue::Bool(false)),
        "none" => Some(LiteralValue::None),
        "unary_operator" => {
            // Negative number literals parse as unary minus
            let text = node_text(node, source);
            if let Ok(value) = text.parse::<i64>() {
                return Some(LiteralValue::Int(value));
            }
            text.parse::<f64>().ok().map(LiteralValue::Float)
        }
        _ => None,
    }
}

/// Content of a string literal, without quotes.
fn string_inner(node: &Node, source: &[u8]) -> String {
    let mut content = String::new();
    let mut cursor = node.walk();
    let mut found = false;
    for child in node.children(&mut cursor) {
        if child.kind() == "string_content" {
            content.push_str(&node_text(&child, source));
            found = true;
        }
    }
    if found {
        content
    } else {
        node_text(node, source)
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string()
    }
}

fn node_text(node: &Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Node text with whitespace stripped, for dotted expressions.
fn compact_text(node: &Node, source: &[u8]) -> String {
    node.utf8_text(source)
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn node_range(node: &Node) -> Range {
    Range {
        start: Position {
            line: node.start_position().row as u32,
            column: node.start_position().column as u32,
        },
        end: Position {
            line: node.end_position().row as u32,
            column: node.end_position().column as u32,
        },
    }
}
