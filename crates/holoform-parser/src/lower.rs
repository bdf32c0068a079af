// ABOUTME: Lowers a tree-sitter Python syntax tree into the closed ast types
// ABOUTME: Unknown node kinds become Expr::Unsupported / Stmt::Other carrying the kind name

use crate::ast::{
    AssignTarget, BinaryOp, BoolOp, ClassDef, CmpOp, ConstantKind, ExceptClause, Expr,
    FunctionDef, Keyword, Statement, Stmt, UnaryOp,
};
use crate::node_utils::{all_children, child_text_by_field, field_children, named_children, node_text};
use tree_sitter::Node;

pub struct Lowerer<'a> {
    source: &'a str,
}

impl<'a> Lowerer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn lower_module(&self, root: Node) -> Vec<Statement> {
        self.lower_block(root)
    }

    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.source)
    }

    /// One `Statement` per non-comment named child, in source order.
    fn lower_block(&self, block: Node) -> Vec<Statement> {
        named_children(&block)
            .into_iter()
            .map(|child| self.lower_statement(child))
            .collect()
    }

    fn lower_suite(&self, suite: Option<Node>) -> Vec<Statement> {
        match suite {
            Some(node) if node.kind() == "block" => self.lower_block(node),
            _ => Vec::new(),
        }
    }

    fn lower_statement(&self, node: Node) -> Statement {
        let line = node.start_position().row;
        let stmt = match node.kind() {
            "expression_statement" => self.lower_expression_statement(node),
            "return_statement" => {
                Stmt::Return(named_children(&node).first().map(|value| self.lower_expr(*value)))
            }
            "if_statement" => self.lower_if(node),
            "while_statement" => Stmt::While {
                test: self.lower_field(node, "condition"),
                body: self.lower_suite(node.child_by_field_name("body")),
                orelse: self.lower_else(node.child_by_field_name("alternative")),
            },
            "for_statement" => Stmt::For {
                target: self.lower_field(node, "left"),
                iter: self.lower_field(node, "right"),
                body: self.lower_suite(node.child_by_field_name("body")),
                orelse: self.lower_else(node.child_by_field_name("alternative")),
            },
            "try_statement" => self.lower_try(node),
            "function_definition" => Stmt::FunctionDef(self.lower_function(node, line)),
            "class_definition" => Stmt::ClassDef(self.lower_class(node, line)),
            "decorated_definition" => match node.child_by_field_name("definition") {
                Some(def) if def.kind() == "function_definition" => {
                    Stmt::FunctionDef(self.lower_function(def, line))
                }
                Some(def) if def.kind() == "class_definition" => {
                    Stmt::ClassDef(self.lower_class(def, line))
                }
                _ => Stmt::Other("decorated_definition".to_string()),
            },
            other => Stmt::Other(other.to_string()),
        };
        Statement { line, node: stmt }
    }

    fn lower_expression_statement(&self, node: Node) -> Stmt {
        let children = named_children(&node);
        let [child] = children.as_slice() else {
            return Stmt::Other("expression_list".to_string());
        };
        match child.kind() {
            "assignment" => self.lower_assignment(*child),
            "augmented_assignment" => self.lower_augmented_assignment(*child),
            _ => Stmt::Expr(self.lower_expr(*child)),
        }
    }

    fn lower_assignment(&self, node: Node) -> Stmt {
        match (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            (Some(_), Some(right)) if right.kind() == "assignment" => {
                Stmt::Other("chained_assignment".to_string())
            }
            (Some(left), Some(right)) => Stmt::Assign {
                target: self.lower_target(left),
                value: self.lower_expr(right),
            },
            // `x: int` without a value
            _ => Stmt::Other("annotation".to_string()),
        }
    }

    fn lower_augmented_assignment(&self, node: Node) -> Stmt {
        let op = node
            .child_by_field_name("operator")
            .and_then(|op| BinaryOp::from_token(op.kind().trim_end_matches('=')));
        match (
            node.child_by_field_name("left"),
            op,
            node.child_by_field_name("right"),
        ) {
            (Some(left), Some(op), Some(right)) => Stmt::AugAssign {
                target: self.lower_target(left),
                op,
                value: self.lower_expr(right),
            },
            _ => Stmt::Other("augmented_assignment".to_string()),
        }
    }

    fn lower_target(&self, node: Node) -> AssignTarget {
        match node.kind() {
            "identifier" => AssignTarget::Name(self.text(&node).to_string()),
            "attribute" => AssignTarget::Attribute {
                object: self.lower_field(node, "object"),
                attr: child_text_by_field(&node, "attribute", self.source).unwrap_or_default(),
            },
            "subscript" => AssignTarget::Subscript {
                value: self.lower_field(node, "value"),
                slice: self.lower_subscript_slice(node),
            },
            other => AssignTarget::Other(other.to_string()),
        }
    }

    fn lower_if(&self, node: Node) -> Stmt {
        let alternatives = field_children(&node, "alternative");
        Stmt::If {
            test: self.lower_field(node, "condition"),
            body: self.lower_suite(node.child_by_field_name("consequence")),
            orelse: self.lower_alternatives(&alternatives),
        }
    }

    /// `elif` chains nest as an `If` inside the previous branch's `orelse`.
    fn lower_alternatives(&self, alternatives: &[Node]) -> Vec<Statement> {
        let Some((first, rest)) = alternatives.split_first() else {
            return Vec::new();
        };
        match first.kind() {
            "elif_clause" => vec![Statement {
                line: first.start_position().row,
                node: Stmt::If {
                    test: self.lower_field(*first, "condition"),
                    body: self.lower_suite(first.child_by_field_name("consequence")),
                    orelse: self.lower_alternatives(rest),
                },
            }],
            "else_clause" => self.lower_suite(first.child_by_field_name("body")),
            _ => Vec::new(),
        }
    }

    fn lower_else(&self, clause: Option<Node>) -> Vec<Statement> {
        match clause {
            Some(clause) if clause.kind() == "else_clause" => {
                self.lower_suite(clause.child_by_field_name("body"))
            }
            _ => Vec::new(),
        }
    }

    fn lower_try(&self, node: Node) -> Stmt {
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();

        for child in named_children(&node) {
            match child.kind() {
                "except_clause" | "except_group_clause" => handlers.push(self.lower_except(child)),
                "else_clause" => orelse = self.lower_suite(child.child_by_field_name("body")),
                "finally_clause" => {
                    let block = named_children(&child).into_iter().find(|c| c.kind() == "block");
                    finalbody = self.lower_suite(block);
                }
                _ => {}
            }
        }

        Stmt::Try {
            body: self.lower_suite(node.child_by_field_name("body")),
            handlers,
            orelse,
            finalbody,
        }
    }

    fn lower_except(&self, clause: Node) -> ExceptClause {
        let mut headers = Vec::new();
        let mut body = Vec::new();
        for child in named_children(&clause) {
            if child.kind() == "block" {
                body = self.lower_block(child);
            } else {
                headers.push(child);
            }
        }

        let (exception_type, name) = match headers.as_slice() {
            [] => (None, None),
            [pattern] if pattern.kind() == "as_pattern" => {
                let parts = named_children(pattern);
                (
                    parts.first().map(|ty| self.lower_expr(*ty)),
                    parts.get(1).map(|alias| self.text(alias).to_string()),
                )
            }
            [ty] => (Some(self.lower_expr(*ty)), None),
            [ty, alias, ..] => (
                Some(self.lower_expr(*ty)),
                Some(self.text(alias).to_string()),
            ),
        };

        ExceptClause {
            exception_type,
            name,
            body,
        }
    }

    fn lower_function(&self, node: Node, line: usize) -> FunctionDef {
        let params = node
            .child_by_field_name("parameters")
            .map(|params| self.lower_parameters(params))
            .unwrap_or_default();
        let (docstring, body) = self.lower_definition_body(node.child_by_field_name("body"));

        FunctionDef {
            name: child_text_by_field(&node, "name", self.source).unwrap_or_default(),
            params,
            docstring,
            body,
            line,
        }
    }

    fn lower_class(&self, node: Node, line: usize) -> ClassDef {
        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                named_children(&args)
                    .into_iter()
                    .filter(|arg| arg.kind() != "keyword_argument")
                    .map(|arg| self.lower_expr(arg))
                    .collect()
            })
            .unwrap_or_default();
        let (docstring, body) = self.lower_definition_body(node.child_by_field_name("body"));

        ClassDef {
            name: child_text_by_field(&node, "name", self.source).unwrap_or_default(),
            bases,
            docstring,
            body,
            line,
        }
    }

    /// Splits a leading docstring off a def/class body.
    fn lower_definition_body(&self, body: Option<Node>) -> (Option<String>, Vec<Statement>) {
        let Some(body) = body.filter(|b| b.kind() == "block") else {
            return (None, Vec::new());
        };
        let docstring = self.docstring(body);
        let mut statements = self.lower_block(body);
        if docstring.is_some() && !statements.is_empty() {
            statements.remove(0);
        }
        (docstring, statements)
    }

    fn docstring(&self, body: Node) -> Option<String> {
        let first = named_children(&body).into_iter().next()?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let children = named_children(&first);
        let [literal] = children.as_slice() else {
            return None;
        };
        let parts = match literal.kind() {
            "string" => vec![*literal],
            "concatenated_string" => named_children(literal),
            _ => return None,
        };
        let mut doc = String::new();
        for part in parts {
            doc.push_str(&string_value(self.text(&part))?);
        }
        Some(doc)
    }

    fn lower_parameters(&self, params: Node) -> Vec<String> {
        let mut names = Vec::new();
        for param in named_children(&params) {
            match param.kind() {
                "identifier" => names.push(self.text(&param).to_string()),
                "typed_parameter" => match named_children(&param).first() {
                    Some(inner) if inner.kind() == "identifier" => {
                        names.push(self.text(inner).to_string())
                    }
                    // `*args: T` / `**kw: T`
                    _ => break,
                },
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = child_text_by_field(&param, "name", self.source) {
                        names.push(name);
                    }
                }
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                _ => {}
            }
        }
        names
    }

    fn lower_field(&self, node: Node, field: &str) -> Expr {
        match node.child_by_field_name(field) {
            Some(child) => self.lower_expr(child),
            None => Expr::Unsupported(format!("missing_{}", field)),
        }
    }

    pub fn lower_expr(&self, node: Node) -> Expr {
        match node.kind() {
            "identifier" => Expr::Name(self.text(&node).to_string()),
            "integer" | "float" => Expr::Constant(ConstantKind::Number),
            "string" | "concatenated_string" => Expr::Constant(string_kind(self.text(&node))),
            "true" | "false" => Expr::Constant(ConstantKind::Bool),
            "none" => Expr::Constant(ConstantKind::None),
            "ellipsis" => Expr::Constant(ConstantKind::Ellipsis),
            "list" => Expr::List(
                named_children(&node)
                    .into_iter()
                    .map(|elt| self.lower_expr(elt))
                    .collect(),
            ),
            "parenthesized_expression" => match named_children(&node).as_slice() {
                [inner] => self.lower_expr(*inner),
                _ => Expr::Unsupported("parenthesized_expression".to_string()),
            },
            "binary_operator" => self.lower_binary(node),
            "unary_operator" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|op| UnaryOp::from_token(op.kind()));
                match op {
                    Some(op) => Expr::UnaryOp {
                        op,
                        operand: Box::new(self.lower_field(node, "argument")),
                    },
                    None => Expr::Unsupported("unary_operator".to_string()),
                }
            }
            "not_operator" => Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(self.lower_field(node, "argument")),
            },
            "boolean_operator" => self.lower_boolean(node),
            "comparison_operator" => self.lower_comparison(node),
            "call" => self.lower_call(node),
            "attribute" => Expr::Attribute {
                value: Box::new(self.lower_field(node, "object")),
                attr: child_text_by_field(&node, "attribute", self.source).unwrap_or_default(),
            },
            "subscript" => Expr::Subscript {
                value: Box::new(self.lower_field(node, "value")),
                slice: Box::new(self.lower_subscript_slice(node)),
            },
            other => Expr::Unsupported(other.to_string()),
        }
    }

    fn lower_binary(&self, node: Node) -> Expr {
        let op = node
            .child_by_field_name("operator")
            .and_then(|op| BinaryOp::from_token(op.kind()));
        match op {
            Some(op) => Expr::BinOp {
                left: Box::new(self.lower_field(node, "left")),
                op,
                right: Box::new(self.lower_field(node, "right")),
            },
            None => Expr::Unsupported("binary_operator".to_string()),
        }
    }

    fn lower_boolean(&self, node: Node) -> Expr {
        let Some(op) = node
            .child_by_field_name("operator")
            .and_then(|op| BoolOp::from_token(op.kind()))
        else {
            return Expr::Unsupported("boolean_operator".to_string());
        };
        let mut values = Vec::new();
        self.collect_bool_operands(node, op, &mut values);
        Expr::BoolOp { op, values }
    }

    /// `a and b and c` parses left-nested; flatten runs of the same operator.
    fn collect_bool_operands(&self, node: Node, op: BoolOp, values: &mut Vec<Expr>) {
        for field in ["left", "right"] {
            let Some(side) = node.child_by_field_name(field) else {
                values.push(Expr::Unsupported(format!("missing_{}", field)));
                continue;
            };
            let same_op = side.kind() == "boolean_operator"
                && side
                    .child_by_field_name("operator")
                    .and_then(|o| BoolOp::from_token(o.kind()))
                    == Some(op);
            if same_op {
                self.collect_bool_operands(side, op, values);
            } else {
                values.push(self.lower_expr(side));
            }
        }
    }

    fn lower_comparison(&self, node: Node) -> Expr {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for child in all_children(&node) {
            if child.is_named() {
                if !pending.is_empty() {
                    ops.push(CmpOp::from_token(&pending.join(" ")));
                    pending.clear();
                }
                operands.push(self.lower_expr(child));
            } else {
                pending.push(child.kind());
            }
        }

        let ops: Option<Vec<CmpOp>> = ops.into_iter().collect();
        match ops {
            Some(ops) if !ops.is_empty() && operands.len() == ops.len() + 1 => {
                let mut operands = operands.into_iter();
                match operands.next() {
                    Some(left) => Expr::Compare {
                        left: Box::new(left),
                        ops,
                        comparators: operands.collect(),
                    },
                    None => Expr::Unsupported("comparison_operator".to_string()),
                }
            }
            _ => Expr::Unsupported("comparison_operator".to_string()),
        }
    }

    fn lower_call(&self, node: Node) -> Expr {
        let func = self.lower_field(node, "function");
        let (args, keywords) = match node.child_by_field_name("arguments") {
            Some(arguments) if arguments.kind() == "argument_list" => {
                self.lower_arguments(arguments)
            }
            Some(other) => (vec![self.lower_expr(other)], Vec::new()),
            None => (Vec::new(), Vec::new()),
        };
        Expr::Call {
            func: Box::new(func),
            args,
            keywords,
        }
    }

    fn lower_arguments(&self, arguments: Node) -> (Vec<Expr>, Vec<Keyword>) {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        for arg in named_children(&arguments) {
            if arg.kind() == "keyword_argument" {
                keywords.push(Keyword {
                    name: child_text_by_field(&arg, "name", self.source).unwrap_or_default(),
                    value: self.lower_field(arg, "value"),
                });
            } else {
                args.push(self.lower_expr(arg));
            }
        }
        (args, keywords)
    }

    fn lower_subscript_slice(&self, node: Node) -> Expr {
        match field_children(&node, "subscript").as_slice() {
            [single] => self.lower_expr(*single),
            [] => Expr::Unsupported("missing_subscript".to_string()),
            _ => Expr::Unsupported("tuple".to_string()),
        }
    }
}

fn string_kind(literal: &str) -> ConstantKind {
    let prefix: String = literal
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if prefix.contains(['b', 'B']) {
        ConstantKind::Bytes
    } else {
        ConstantKind::Str
    }
}

/// Runtime value of a `str` literal. f-strings and bytes have no constant
/// `str` value and yield `None`.
pub fn string_value(literal: &str) -> Option<String> {
    let prefix = literal
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    if prefix.contains(['f', 'b']) {
        return None;
    }
    let body = strip_string_quotes(literal);
    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

/// Decodes backslash escapes. Unknown or malformed escapes are kept as written.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos + 1..];
        let mut chars = escape.chars();
        let Some(kind) = chars.next() else {
            out.push('\\');
            return out;
        };
        let consumed = match decode_escape(kind, chars.as_str()) {
            Some((decoded, used)) => {
                out.extend(decoded);
                used
            }
            None => {
                out.push('\\');
                out.push(kind);
                0
            }
        };
        rest = &escape[kind.len_utf8() + consumed..];
    }
    out.push_str(rest);
    out
}

/// Decoded character (`None` for a line continuation) and the bytes of `tail` used.
fn decode_escape(kind: char, tail: &str) -> Option<(Option<char>, usize)> {
    let simple = |c: char| Some((Some(c), 0));
    match kind {
        '\n' => Some((None, 0)),
        '\r' if tail.starts_with('\n') => Some((None, 1)),
        '\r' => Some((None, 0)),
        '\\' | '\'' | '"' => simple(kind),
        'a' => simple('\u{07}'),
        'b' => simple('\u{08}'),
        'f' => simple('\u{0C}'),
        'n' => simple('\n'),
        'r' => simple('\r'),
        't' => simple('\t'),
        'v' => simple('\u{0B}'),
        '0'..='7' => {
            let extra = tail
                .chars()
                .take(2)
                .take_while(|c| c.is_digit(8))
                .count();
            let digits = format!("{}{}", kind, &tail[..extra]);
            let value = u32::from_str_radix(&digits, 8).ok()?;
            Some((Some(char::from_u32(value)?), extra))
        }
        'x' | 'u' | 'U' => {
            let width = match kind {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            let digits = tail
                .get(..width)
                .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))?;
            let value = u32::from_str_radix(digits, 16).ok()?;
            Some((Some(char::from_u32(value)?), width))
        }
        _ => None,
    }
}

/// Removes any string prefix and the surrounding quotes, leaving the body verbatim.
pub fn strip_string_quotes(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return &body[quote.len()..body.len() - quote.len()];
        }
    }
    body
}
