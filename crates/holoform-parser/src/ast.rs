// ABOUTME: Closed syntax tree the generator works on, lowered from tree-sitter nodes
// ABOUTME: Anything outside the supported subset lands in an Unsupported/Other arm

/// Expression subset understood by the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Constant(ConstantKind),
    List(Vec<Expr>),
    BinOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
    },
    /// Tree-sitter kind of a node the lowering does not model.
    Unsupported(String),
}

impl Expr {
    /// True if this expression or any sub-expression is `Unsupported`.
    pub fn has_unsupported(&self) -> bool {
        match self {
            Expr::Unsupported(_) => true,
            Expr::Name(_) | Expr::Constant(_) => false,
            Expr::List(elts) => elts.iter().any(Expr::has_unsupported),
            Expr::BinOp { left, right, .. } => left.has_unsupported() || right.has_unsupported(),
            Expr::UnaryOp { operand, .. } => operand.has_unsupported(),
            Expr::BoolOp { values, .. } => values.iter().any(Expr::has_unsupported),
            Expr::Compare {
                left, comparators, ..
            } => left.has_unsupported() || comparators.iter().any(Expr::has_unsupported),
            Expr::Call {
                func,
                args,
                keywords,
            } => {
                func.has_unsupported()
                    || args.iter().any(Expr::has_unsupported)
                    || keywords.iter().any(|k| k.value.has_unsupported())
            }
            Expr::Attribute { value, .. } => value.has_unsupported(),
            Expr::Subscript { value, slice } => value.has_unsupported() || slice.has_unsupported(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    Number,
    Str,
    Bytes,
    Bool,
    None,
    Ellipsis,
}

impl ConstantKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ConstantKind::Number => "number",
            ConstantKind::Str => "str",
            ConstantKind::Bytes => "bytes",
            ConstantKind::Bool => "bool",
            ConstantKind::None => "NoneType",
            ConstantKind::Ellipsis => "ellipsis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMult,
    BitOr,
    BitAnd,
    BitXor,
    LShift,
    RShift,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mult,
            "/" => BinaryOp::Div,
            "//" => BinaryOp::FloorDiv,
            "%" => BinaryOp::Mod,
            "**" => BinaryOp::Pow,
            "@" => BinaryOp::MatMult,
            "|" => BinaryOp::BitOr,
            "&" => BinaryOp::BitAnd,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::LShift,
            ">>" => BinaryOp::RShift,
            _ => return None,
        };
        Some(op)
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mult => "Mult",
            BinaryOp::Div => "Div",
            BinaryOp::FloorDiv => "FloorDiv",
            BinaryOp::Mod => "Mod",
            BinaryOp::Pow => "Pow",
            BinaryOp::MatMult => "MatMult",
            BinaryOp::BitOr => "BitOr",
            BinaryOp::BitAnd => "BitAnd",
            BinaryOp::BitXor => "BitXor",
            BinaryOp::LShift => "LShift",
            BinaryOp::RShift => "RShift",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    USub,
    UAdd,
    Invert,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "not" => Some(UnaryOp::Not),
            "-" => Some(UnaryOp::USub),
            "+" => Some(UnaryOp::UAdd),
            "~" => Some(UnaryOp::Invert),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Not => "Not",
            UnaryOp::USub => "USub",
            UnaryOp::UAdd => "UAdd",
            UnaryOp::Invert => "Invert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "and" => Some(BoolOp::And),
            "or" => Some(BoolOp::Or),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BoolOp::And => "And",
            BoolOp::Or => "Or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "==" => CmpOp::Eq,
            "!=" | "<>" => CmpOp::NotEq,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::LtE,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::GtE,
            "in" => CmpOp::In,
            "not in" => CmpOp::NotIn,
            "is" => CmpOp::Is,
            "is not" => CmpOp::IsNot,
            _ => return None,
        };
        Some(op)
    }

    pub fn name(self) -> &'static str {
        match self {
            CmpOp::Eq => "Eq",
            CmpOp::NotEq => "NotEq",
            CmpOp::Lt => "Lt",
            CmpOp::LtE => "LtE",
            CmpOp::Gt => "Gt",
            CmpOp::GtE => "GtE",
            CmpOp::In => "In",
            CmpOp::NotIn => "NotIn",
            CmpOp::Is => "Is",
            CmpOp::IsNot => "IsNot",
        }
    }
}

/// Left-hand side of a single-target assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Attribute { object: Expr, attr: String },
    Subscript { value: Expr, slice: Expr },
    Other(String),
}

impl AssignTarget {
    /// The target read back as an expression, as used by `x op= v`.
    pub fn to_expr(&self) -> Expr {
        match self {
            AssignTarget::Name(name) => Expr::Name(name.clone()),
            AssignTarget::Attribute { object, attr } => Expr::Attribute {
                value: Box::new(object.clone()),
                attr: attr.clone(),
            },
            AssignTarget::Subscript { value, slice } => Expr::Subscript {
                value: Box::new(value.clone()),
                slice: Box::new(slice.clone()),
            },
            AssignTarget::Other(kind) => Expr::Unsupported(kind.clone()),
        }
    }
}

/// A statement plus the 0-based source row it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub node: Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        target: AssignTarget,
        value: Expr,
    },
    AugAssign {
        target: AssignTarget,
        op: BinaryOp,
        value: Expr,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    While {
        test: Expr,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    Try {
        body: Vec<Statement>,
        handlers: Vec<ExceptClause>,
        orelse: Vec<Statement>,
        finalbody: Vec<Statement>,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptClause {
    pub exception_type: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    /// Positional parameter names, up to the first `*`, `*args` or `**kwargs`.
    pub params: Vec<String>,
    /// Raw docstring text between the quotes, if the body opens with one.
    pub docstring: Option<String>,
    /// Body without the docstring statement.
    pub body: Vec<Statement>,
    /// Row of the definition, or of its first decorator.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub docstring: Option<String>,
    pub body: Vec<Statement>,
    pub line: usize,
}
