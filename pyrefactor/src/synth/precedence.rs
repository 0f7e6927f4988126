//! Python operator precedence, lowest first.
//!
//! Levels follow the reference unparser. A rendered expression needs
//! parentheses when its own level is below the level its position requires.

use crate::syntax::NodeRef;
use ruff_python_ast::{BoolOp, Expr, Operator, Stmt, UnaryOp};

/// Binding strength of an expression position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// `x := y`
    NamedExpr,
    /// `a, b`
    Tuple,
    /// `yield x`
    Yield,
    /// `lambda`, `x if c else y`
    Test,
    /// `or`
    Or,
    /// `and`
    And,
    /// `not x`
    Not,
    /// Comparisons, `in`, `is`
    Cmp,
    /// `|`, also starred expressions
    BOr,
    /// `^`
    BXor,
    /// `&`
    BAnd,
    /// `<<`, `>>`
    Shift,
    /// `+`, `-`
    Arith,
    /// `*`, `@`, `/`, `//`, `%`
    Term,
    /// Unary `+`, `-`, `~`
    Factor,
    /// `**`
    Power,
    /// `await x`
    Await,
    /// Names, literals, calls, attribute access, displays
    Atom,
}

impl Precedence {
    /// The next tighter level.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::NamedExpr => Self::Tuple,
            Self::Tuple => Self::Yield,
            Self::Yield => Self::Test,
            Self::Test => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Not,
            Self::Not => Self::Cmp,
            Self::Cmp => Self::BOr,
            Self::BOr => Self::BXor,
            Self::BXor => Self::BAnd,
            Self::BAnd => Self::Shift,
            Self::Shift => Self::Arith,
            Self::Arith => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Power,
            Self::Power => Self::Await,
            Self::Await | Self::Atom => Self::Atom,
        }
    }

    /// Level of a binary operator.
    #[must_use]
    pub fn of_operator(op: Operator) -> Self {
        match op {
            Operator::BitOr => Self::BOr,
            Operator::BitXor => Self::BXor,
            Operator::BitAnd => Self::BAnd,
            Operator::LShift | Operator::RShift => Self::Shift,
            Operator::Add | Operator::Sub => Self::Arith,
            Operator::Mult
            | Operator::MatMult
            | Operator::Div
            | Operator::FloorDiv
            | Operator::Mod => Self::Term,
            Operator::Pow => Self::Power,
        }
    }

    /// Level of a boolean operator.
    #[must_use]
    pub fn of_bool_op(op: BoolOp) -> Self {
        match op {
            BoolOp::And => Self::And,
            BoolOp::Or => Self::Or,
        }
    }

    /// Level of a unary operator.
    #[must_use]
    pub fn of_unary_op(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Not => Self::Not,
            UnaryOp::Invert | UnaryOp::UAdd | UnaryOp::USub => Self::Factor,
        }
    }

    /// Level of an expression as written in the source.
    #[must_use]
    pub fn of(expr: &Expr) -> Self {
        match expr {
            Expr::Named(_) => Self::NamedExpr,
            Expr::Tuple(tuple) if !tuple.parenthesized => Self::Tuple,
            Expr::Generator(generator) if !generator.parenthesized => Self::Tuple,
            Expr::Yield(_) | Expr::YieldFrom(_) => Self::Yield,
            Expr::Lambda(_) | Expr::If(_) => Self::Test,
            Expr::BoolOp(node) => Self::of_bool_op(node.op),
            Expr::UnaryOp(node) => Self::of_unary_op(node.op),
            Expr::Compare(_) => Self::Cmp,
            Expr::Starred(_) => Self::BOr,
            Expr::BinOp(node) => Self::of_operator(node.op),
            Expr::Await(_) => Self::Await,
            _ => Self::Atom,
        }
    }

    /// Level required of `child` in its position under `parent`.
    #[must_use]
    pub fn required_by(parent: Option<NodeRef<'_>>, child: &Expr) -> Self {
        match parent {
            None => Self::Test,
            Some(NodeRef::Stmt(stmt)) => Self::required_in_stmt(stmt, child),
            Some(NodeRef::Expr(expr)) => Self::required_in_expr(expr, child),
        }
    }

    fn required_in_stmt(stmt: &Stmt, child: &Expr) -> Self {
        match stmt {
            Stmt::Expr(_) => Self::Yield,
            Stmt::Assign(node) if std::ptr::eq(&*node.value, child) => Self::Yield,
            Stmt::AugAssign(node) if std::ptr::eq(&*node.value, child) => Self::Yield,
            Stmt::AnnAssign(node) if is_slot(node.value.as_deref(), child) => Self::Yield,
            Stmt::Assign(_) | Stmt::AugAssign(_) | Stmt::Return(_) | Stmt::For(_) => Self::Tuple,
            Stmt::If(_) | Stmt::While(_) | Stmt::FunctionDef(_) | Stmt::ClassDef(_) => {
                Self::NamedExpr
            }
            Stmt::Match(node) if std::ptr::eq(&*node.subject, child) => Self::NamedExpr,
            _ => Self::Test,
        }
    }

    fn required_in_expr(parent: &Expr, child: &Expr) -> Self {
        match parent {
            Expr::BinOp(node) => {
                let level = Self::of_operator(node.op);
                let is_left = std::ptr::eq(&*node.left, child);
                // `**` is right-associative.
                if (node.op == Operator::Pow) == is_left {
                    level.next()
                } else {
                    level
                }
            }
            Expr::UnaryOp(node) => Self::of_unary_op(node.op),
            Expr::BoolOp(node) => Self::of_bool_op(node.op).next(),
            Expr::Compare(_) => Self::Cmp.next(),
            Expr::Named(_) | Expr::Lambda(_) | Expr::Dict(_) => Self::Test,
            Expr::If(node) if std::ptr::eq(&*node.orelse, child) => Self::Test,
            Expr::If(_) => Self::Or,
            Expr::ListComp(_) | Expr::SetComp(_) | Expr::Generator(_) | Expr::DictComp(_) => {
                Self::required_in_comprehension(parent, child)
            }
            Expr::Await(_) | Expr::Attribute(_) => Self::Atom,
            Expr::Call(node) if std::ptr::eq(&*node.func, child) => Self::Atom,
            Expr::Subscript(node) if std::ptr::eq(&*node.value, child) => Self::Atom,
            Expr::Subscript(_) | Expr::Yield(_) => Self::Tuple,
            Expr::Starred(_) => Self::BOr,
            _ => Self::Test,
        }
    }

    fn required_in_comprehension(parent: &Expr, child: &Expr) -> Self {
        let generators = match parent {
            Expr::ListComp(node) => &node.generators,
            Expr::SetComp(node) => &node.generators,
            Expr::Generator(node) => &node.generators,
            Expr::DictComp(node) => &node.generators,
            _ => return Self::Test,
        };
        for generator in generators {
            if std::ptr::eq(&generator.target, child) {
                return Self::Tuple;
            }
            if std::ptr::eq(&generator.iter, child)
                || generator.ifs.iter().any(|c| std::ptr::eq(c, child))
            {
                return Self::Or;
            }
        }
        Self::Test
    }
}

fn is_slot(slot: Option<&Expr>, child: &Expr) -> bool {
    slot.is_some_and(|expr| std::ptr::eq(expr, child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTree;
    use crate::walker::for_each_node;
    use ruff_text_size::Ranged;

    /// Required level for every `1` literal in `source`.
    fn required_for_ones(source: &str) -> Vec<Precedence> {
        let tree = SyntaxTree::parse(source).unwrap();
        let mut out = Vec::new();
        for_each_node(tree.body(), |node, parent| {
            if let NodeRef::Expr(expr) = node {
                if tree.slice(node.range()) == "1" {
                    out.push(Precedence::required_by(parent, expr));
                }
            }
        });
        out
    }

    #[test]
    fn test_ordering() {
        assert!(Precedence::NamedExpr < Precedence::Tuple);
        assert!(Precedence::Arith < Precedence::Term);
        assert!(Precedence::Factor < Precedence::Power);
        assert_eq!(Precedence::Atom.next(), Precedence::Atom);
    }

    #[test]
    fn test_binary_operand_positions() {
        assert_eq!(
            required_for_ones("x = 1 - 1\n"),
            vec![Precedence::Arith, Precedence::Term]
        );
        assert_eq!(
            required_for_ones("x = 1 ** 1\n"),
            vec![Precedence::Await, Precedence::Power]
        );
    }

    #[test]
    fn test_statement_positions() {
        assert_eq!(required_for_ones("x = 1\n"), vec![Precedence::Yield]);
        assert_eq!(required_for_ones("if 1:\n    pass\n"), vec![Precedence::NamedExpr]);
        assert_eq!(required_for_ones("1 .real\n"), vec![Precedence::Atom]);
    }
}
