//! Replacement nodes built by rules.
//!
//! Rules describe new code structurally. A node either copies text that
//! already exists in the current source (`Source`, `SourceStmt`) or is
//! synthetic and gets unparsed.

use super::precedence::Precedence;
use compact_str::CompactString;
use ruff_python_ast::{BoolOp, CmpOp, Expr, Number, Operator, Stmt, UnaryOp};
use ruff_text_size::{Ranged, TextRange};

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// `None`
    None,
    /// `True` / `False`
    Bool(bool),
    /// An integer that fits in 64 bits.
    Int(i64),
    /// A float.
    Float(f64),
    /// A text string.
    Str(String),
    /// `...`
    Ellipsis,
}

impl Constant {
    /// Reads a literal expression. Returns `None` for anything else,
    /// including integers beyond 64 bits, bytes, f-strings and complex numbers.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::NoneLiteral(_) => Some(Self::None),
            Expr::BooleanLiteral(node) => Some(Self::Bool(node.value)),
            Expr::EllipsisLiteral(_) => Some(Self::Ellipsis),
            Expr::StringLiteral(node) => Some(Self::Str(node.value.to_string())),
            Expr::NumberLiteral(node) => match &node.value {
                Number::Int(int) => int.to_string().parse().ok().map(Self::Int),
                Number::Float(value) => Some(Self::Float(*value)),
                Number::Complex { .. } => None,
            },
            _ => None,
        }
    }

    /// Precedence of the rendered literal; negative numbers read as unary
    /// minus.
    #[must_use]
    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Int(value) if *value < 0 => Precedence::Factor,
            Self::Float(value) if value.is_sign_negative() => Precedence::Factor,
            _ => Precedence::Atom,
        }
    }
}

/// A node to splice in place of a match.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementNode {
    /// Copy of an existing expression, rendered by slicing the source.
    Source {
        /// Range of the copied expression.
        range: TextRange,
        /// Its precedence as written.
        precedence: Precedence,
    },
    /// Copy of an existing statement, re-indented to its new position.
    SourceStmt {
        /// Range of the copied statement.
        range: TextRange,
    },
    /// A literal.
    Constant(Constant),
    /// A name reference.
    Name(CompactString),
    /// `value.attr`
    Attribute {
        /// Object expression.
        value: Box<ReplacementNode>,
        /// Attribute name.
        attr: CompactString,
    },
    /// `left op right`
    BinOp {
        /// Left operand.
        left: Box<ReplacementNode>,
        /// Operator.
        op: Operator,
        /// Right operand.
        right: Box<ReplacementNode>,
    },
    /// `op operand`
    UnaryOp {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<ReplacementNode>,
    },
    /// `a and b and c`
    BoolOp {
        /// Operator.
        op: BoolOp,
        /// At least two operands.
        values: Vec<ReplacementNode>,
    },
    /// `a < b <= c`
    Compare {
        /// Leftmost operand.
        left: Box<ReplacementNode>,
        /// One operator per comparator.
        ops: Vec<CmpOp>,
        /// Right-hand operands.
        comparators: Vec<ReplacementNode>,
    },
    /// `func(args, name=value)`
    Call {
        /// Callee.
        func: Box<ReplacementNode>,
        /// Positional arguments.
        args: Vec<ReplacementNode>,
        /// Keyword arguments.
        keywords: Vec<(CompactString, ReplacementNode)>,
    },
    /// `value[index]`
    Subscript {
        /// Subscripted expression.
        value: Box<ReplacementNode>,
        /// Index expression.
        index: Box<ReplacementNode>,
    },
    /// A tuple display, always parenthesized.
    Tuple(Vec<ReplacementNode>),
    /// A list display.
    List(Vec<ReplacementNode>),
    /// `a = b = value`
    Assign {
        /// Targets, left to right.
        targets: Vec<ReplacementNode>,
        /// Assigned value.
        value: Box<ReplacementNode>,
    },
    /// `target op= value`
    AugAssign {
        /// Target.
        target: Box<ReplacementNode>,
        /// Operator.
        op: Operator,
        /// Value.
        value: Box<ReplacementNode>,
    },
    /// `return` with an optional value.
    Return(Option<Box<ReplacementNode>>),
    /// An expression used as a statement.
    ExprStmt(Box<ReplacementNode>),
    /// `pass`
    Pass,
}

impl ReplacementNode {
    /// Copy of an existing expression.
    #[must_use]
    pub fn copy_of(expr: &Expr) -> Self {
        Self::Source {
            range: expr.range(),
            precedence: Precedence::of(expr),
        }
    }

    /// Copy of an existing statement.
    #[must_use]
    pub fn copy_of_stmt(stmt: &Stmt) -> Self {
        Self::SourceStmt {
            range: stmt.range(),
        }
    }

    /// A name reference.
    #[must_use]
    pub fn name(id: impl Into<CompactString>) -> Self {
        Self::Name(id.into())
    }

    /// An integer literal.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Constant(Constant::Int(value))
    }

    /// `left op right`
    #[must_use]
    pub fn bin_op(left: Self, op: Operator, right: Self) -> Self {
        Self::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// `func(args)`
    #[must_use]
    pub fn call(func: Self, args: Vec<Self>) -> Self {
        Self::Call {
            func: Box::new(func),
            args,
            keywords: Vec::new(),
        }
    }

    /// `target = value`
    #[must_use]
    pub fn assign(target: Self, value: Self) -> Self {
        Self::Assign {
            targets: vec![target],
            value: Box::new(value),
        }
    }
}

impl From<Constant> for ReplacementNode {
    fn from(constant: Constant) -> Self {
        Self::Constant(constant)
    }
}
