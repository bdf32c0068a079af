// ABOUTME: Deterministic, structure-only string forms of expressions
// ABOUTME: Literal values never reach the output; only their type does

use crate::ast::{Expr, Keyword};
use holoform_core::schema::UNSUPPORTED_NODE_PREFIX;
use holoform_core::{ExpressionType, ParameterMapping, ParameterSource};

/// Canonical string for an expression.
///
/// Two literals of the same type format identically, so the result
/// captures shape rather than value.
pub fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::Name(id) => format!("Name(id='{}')", id),
        Expr::Constant(kind) => format!("Constant(value_type='{}')", kind.type_name()),
        Expr::List(elts) => format!("List(elts=[{}])", join(elts)),
        Expr::BinOp { left, op, right } => format!(
            "BinOp({}, {}, {})",
            format_expr(left),
            op.name(),
            format_expr(right)
        ),
        Expr::UnaryOp { op, operand } => format!("UnaryOp({}, {})", op.name(), format_expr(operand)),
        Expr::BoolOp { op, values } => format!("BoolOp({}, [{}])", op.name(), join(values)),
        Expr::Compare {
            left,
            ops,
            comparators,
        } => {
            let mut parts = vec![format_expr(left)];
            for (op, comparator) in ops.iter().zip(comparators) {
                parts.push(op.name().to_string());
                parts.push(format_expr(comparator));
            }
            format!("Compare({})", parts.join(", "))
        }
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            let mut out = format!("Call(func={}, args=[{}]", format_expr(func), join(args));
            if !keywords.is_empty() {
                out.push_str(&format!(", keywords={{{}}}", format_keywords(keywords)));
            }
            out.push(')');
            out
        }
        Expr::Attribute { value, attr } => {
            format!("Attribute(value={}, attr='{}')", format_expr(value), attr)
        }
        Expr::Subscript { value, slice } => format!(
            "Subscript(value={}, slice={})",
            format_expr(value),
            format_expr(slice)
        ),
        Expr::Unsupported(kind) => format!("{}({})", UNSUPPORTED_NODE_PREFIX, kind),
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs.iter().map(format_expr).collect::<Vec<_>>().join(", ")
}

fn format_keywords(keywords: &[Keyword]) -> String {
    let mut sorted: Vec<&Keyword> = keywords.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
        .iter()
        .map(|k| format!("{}: {}", k.name, format_expr(&k.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Classification stored on assignment operations.
pub fn expression_type(expr: &Expr) -> ExpressionType {
    match expr {
        Expr::List(_) => ExpressionType::ListLiteral,
        Expr::BinOp { .. } | Expr::UnaryOp { .. } => ExpressionType::Arithmetic,
        Expr::Compare { .. } | Expr::BoolOp { .. } => ExpressionType::Comparison,
        _ => ExpressionType::Value,
    }
}

pub fn parameter_source(expr: &Expr) -> ParameterSource {
    match expr {
        Expr::Name(name) => ParameterSource::Variable { name: name.clone() },
        Expr::Constant(_) => ParameterSource::Constant {
            repr: format_expr(expr),
        },
        _ => ParameterSource::Expression {
            repr: format_expr(expr),
        },
    }
}

/// Positional arguments map as `arg0`, `arg1`, ...; keywords by name.
pub fn parameter_mapping(args: &[Expr], keywords: &[Keyword]) -> ParameterMapping {
    let mut mapping = ParameterMapping::new();
    for (idx, arg) in args.iter().enumerate() {
        mapping.insert(format!("arg{}", idx), parameter_source(arg));
    }
    for keyword in keywords {
        mapping.insert(keyword.name.clone(), parameter_source(&keyword.value));
    }
    mapping
}

/// Short human label for an expression, used in fallback purposes.
pub fn describe_target(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        Expr::Attribute { value, attr } => format!("{}.{}", describe_target(value), attr),
        Expr::Subscript { value, .. } => format!("{}[...]", describe_target(value)),
        Expr::Call { func, .. } => format!("{}()", describe_target(func)),
        Expr::Constant(kind) => format!("{} literal", kind.type_name()),
        Expr::List(_) => "list literal".to_string(),
        _ => "expression".to_string(),
    }
}
