//! Renders replacement nodes as Python source.

use super::node::{Constant, ReplacementNode};
use super::precedence::Precedence;
use crate::constants::{get_identifier_re, get_python_keywords};
use crate::error::UnparseError;
use crate::utils::indentation_at;
use ruff_python_ast::{BoolOp, CmpOp, Operator, UnaryOp};
use ruff_text_size::TextRange;
use std::fmt::Write as _;

/// Whether `name` can be written as a Python identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    get_identifier_re().is_match(name) && !get_python_keywords().contains(name)
}

fn identifier(name: &str) -> Result<&str, UnparseError> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(UnparseError::InvalidIdentifier(name.to_owned()))
    }
}

/// Source text of a binary operator.
#[must_use]
pub fn operator_symbol(op: Operator) -> &'static str {
    match op {
        Operator::Add => "+",
        Operator::Sub => "-",
        Operator::Mult => "*",
        Operator::MatMult => "@",
        Operator::Div => "/",
        Operator::Mod => "%",
        Operator::Pow => "**",
        Operator::LShift => "<<",
        Operator::RShift => ">>",
        Operator::BitOr => "|",
        Operator::BitXor => "^",
        Operator::BitAnd => "&",
        Operator::FloorDiv => "//",
    }
}

fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Invert => "~",
        UnaryOp::Not => "not ",
        UnaryOp::UAdd => "+",
        UnaryOp::USub => "-",
    }
}

fn compare_symbol(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "==",
        CmpOp::NotEq => "!=",
        CmpOp::Lt => "<",
        CmpOp::LtE => "<=",
        CmpOp::Gt => ">",
        CmpOp::GtE => ">=",
        CmpOp::Is => "is",
        CmpOp::IsNot => "is not",
        CmpOp::In => "in",
        CmpOp::NotIn => "not in",
    }
}

/// Renders a literal the way Python's `repr` does.
///
/// # Errors
/// Non-finite floats have no literal form.
pub fn render_constant(constant: &Constant) -> Result<String, UnparseError> {
    Ok(match constant {
        Constant::None => "None".to_owned(),
        Constant::Bool(true) => "True".to_owned(),
        Constant::Bool(false) => "False".to_owned(),
        Constant::Ellipsis => "...".to_owned(),
        Constant::Int(value) => value.to_string(),
        Constant::Float(value) => {
            if !value.is_finite() {
                return Err(UnparseError::NonFiniteFloat(*value));
            }
            // Debug output keeps a `.0` or an exponent on every value.
            format!("{value:?}")
        }
        Constant::Str(value) => quote(value),
    })
}

/// Quotes a string like `repr`: single quotes unless the text contains a
/// single quote and no double quote.
fn quote(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = u32::from(c);
                if code <= 0xff {
                    let _ = write!(out, "\\x{code:02x}");
                } else {
                    let _ = write!(out, "\\u{code:04x}");
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Renders replacement nodes against the text they were built from.
pub struct Unparser<'s> {
    source: &'s str,
}

impl<'s> Unparser<'s> {
    /// Creates an unparser over the current source text.
    #[must_use]
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn slice(&self, range: TextRange) -> Result<&'s str, UnparseError> {
        let (start, end) = (range.start().to_usize(), range.end().to_usize());
        self.source
            .get(start..end)
            .ok_or(UnparseError::OutOfBounds {
                start,
                end,
                len: self.source.len(),
            })
    }

    /// Precedence `node` renders at, before any parentheses are added.
    #[must_use]
    pub fn precedence(&self, node: &ReplacementNode) -> Precedence {
        match node {
            ReplacementNode::Source { precedence, .. } => *precedence,
            ReplacementNode::Constant(constant) => constant.precedence(),
            ReplacementNode::BinOp { op, .. } => Precedence::of_operator(*op),
            ReplacementNode::UnaryOp { op, .. } => Precedence::of_unary_op(*op),
            ReplacementNode::BoolOp { op, .. } => Precedence::of_bool_op(*op),
            ReplacementNode::Compare { .. } => Precedence::Cmp,
            _ => Precedence::Atom,
        }
    }

    /// Whether `node` renders as a decimal integer literal, which cannot be
    /// followed directly by `.attr`.
    #[must_use]
    pub fn is_int_literal(&self, node: &ReplacementNode) -> bool {
        match node {
            ReplacementNode::Constant(Constant::Int(value)) => *value >= 0,
            ReplacementNode::Source { range, .. } => self.slice(*range).is_ok_and(|text| {
                !text.is_empty() && text.chars().all(|c| c.is_ascii_digit() || c == '_')
            }),
            _ => false,
        }
    }

    /// Renders an expression, parenthesized if its precedence is below
    /// `required`.
    ///
    /// # Errors
    /// Returns an [`UnparseError`] for malformed nodes and statement nodes.
    pub fn expr(&self, node: &ReplacementNode, required: Precedence) -> Result<String, UnparseError> {
        let text = self.expr_unparenthesized(node)?;
        if self.precedence(node) < required {
            Ok(format!("({text})"))
        } else {
            Ok(text)
        }
    }

    fn exprs(&self, nodes: &[ReplacementNode], required: Precedence) -> Result<Vec<String>, UnparseError> {
        nodes.iter().map(|node| self.expr(node, required)).collect()
    }

    fn expr_unparenthesized(&self, node: &ReplacementNode) -> Result<String, UnparseError> {
        Ok(match node {
            ReplacementNode::Source { range, .. } => self.slice(*range)?.to_owned(),
            ReplacementNode::Constant(constant) => render_constant(constant)?,
            ReplacementNode::Name(id) => identifier(id)?.to_owned(),
            ReplacementNode::Attribute { value, attr } => {
                let attr = identifier(attr)?;
                let mut object = self.expr(value, Precedence::Atom)?;
                if self.is_int_literal(value) {
                    object = format!("({object})");
                }
                format!("{object}.{attr}")
            }
            ReplacementNode::BinOp { left, op, right } => {
                let level = Precedence::of_operator(*op);
                // `**` is right-associative.
                let (left_level, right_level) = if *op == Operator::Pow {
                    (level.next(), level)
                } else {
                    (level, level.next())
                };
                format!(
                    "{} {} {}",
                    self.expr(left, left_level)?,
                    operator_symbol(*op),
                    self.expr(right, right_level)?
                )
            }
            ReplacementNode::UnaryOp { op, operand } => {
                let operand = self.expr(operand, Precedence::of_unary_op(*op))?;
                format!("{}{operand}", unary_symbol(*op))
            }
            ReplacementNode::BoolOp { op, values } => {
                if values.len() < 2 {
                    return Err(UnparseError::EmptyOperands("BoolOp"));
                }
                let separator = match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                };
                self.exprs(values, Precedence::of_bool_op(*op).next())?
                    .join(separator)
            }
            ReplacementNode::Compare {
                left,
                ops,
                comparators,
            } => {
                if ops.is_empty() || ops.len() != comparators.len() {
                    return Err(UnparseError::EmptyOperands("Compare"));
                }
                let operand = Precedence::Cmp.next();
                let mut out = self.expr(left, operand)?;
                for (op, comparator) in ops.iter().zip(comparators) {
                    let _ = write!(
                        out,
                        " {} {}",
                        compare_symbol(*op),
                        self.expr(comparator, operand)?
                    );
                }
                out
            }
            ReplacementNode::Call {
                func,
                args,
                keywords,
            } => {
                let mut parts = self.exprs(args, Precedence::Test)?;
                for (name, value) in keywords {
                    parts.push(format!(
                        "{}={}",
                        identifier(name)?,
                        self.expr(value, Precedence::Test)?
                    ));
                }
                format!("{}({})", self.expr(func, Precedence::Atom)?, parts.join(", "))
            }
            ReplacementNode::Subscript { value, index } => format!(
                "{}[{}]",
                self.expr(value, Precedence::Atom)?,
                self.expr(index, Precedence::Tuple)?
            ),
            ReplacementNode::Tuple(elts) => match elts.as_slice() {
                [] => "()".to_owned(),
                [only] => format!("({},)", self.expr(only, Precedence::Test)?),
                _ => format!("({})", self.exprs(elts, Precedence::Test)?.join(", ")),
            },
            ReplacementNode::List(elts) => {
                format!("[{}]", self.exprs(elts, Precedence::Test)?.join(", "))
            }
            ReplacementNode::SourceStmt { .. }
            | ReplacementNode::Assign { .. }
            | ReplacementNode::AugAssign { .. }
            | ReplacementNode::Return(_)
            | ReplacementNode::ExprStmt(_)
            | ReplacementNode::Pass => return Err(UnparseError::StatementInExpression),
        })
    }

    fn target(&self, node: &ReplacementNode) -> Result<String, UnparseError> {
        match node {
            ReplacementNode::Name(_)
            | ReplacementNode::Attribute { .. }
            | ReplacementNode::Subscript { .. }
            | ReplacementNode::Source { .. } => self.expr(node, Precedence::Tuple),
            ReplacementNode::Tuple(elts) | ReplacementNode::List(elts) => {
                for elt in elts {
                    self.target(elt)?;
                }
                self.expr(node, Precedence::Tuple)
            }
            ReplacementNode::Constant(_) => Err(UnparseError::InvalidTarget("Constant")),
            ReplacementNode::BinOp { .. } => Err(UnparseError::InvalidTarget("BinOp")),
            ReplacementNode::UnaryOp { .. } => Err(UnparseError::InvalidTarget("UnaryOp")),
            ReplacementNode::BoolOp { .. } => Err(UnparseError::InvalidTarget("BoolOp")),
            ReplacementNode::Compare { .. } => Err(UnparseError::InvalidTarget("Compare")),
            ReplacementNode::Call { .. } => Err(UnparseError::InvalidTarget("Call")),
            _ => Err(UnparseError::StatementInExpression),
        }
    }

    /// Renders a statement whose first line starts at `indent`. Expression
    /// nodes become expression statements. The result has no leading
    /// indentation and no trailing newline.
    ///
    /// # Errors
    /// Returns an [`UnparseError`] for malformed nodes.
    pub fn stmt(&self, node: &ReplacementNode, indent: &str) -> Result<String, UnparseError> {
        match node {
            ReplacementNode::SourceStmt { range } => Ok(self.reindent(*range, indent)?),
            ReplacementNode::Assign { targets, value } => {
                if targets.is_empty() {
                    return Err(UnparseError::EmptyOperands("Assign"));
                }
                let mut out = String::new();
                for target in targets {
                    out.push_str(&self.target(target)?);
                    out.push_str(" = ");
                }
                out.push_str(&self.expr(value, Precedence::Yield)?);
                Ok(out)
            }
            ReplacementNode::AugAssign { target, op, value } => {
                if matches!(**target, ReplacementNode::Tuple(_) | ReplacementNode::List(_)) {
                    return Err(UnparseError::InvalidTarget("Tuple"));
                }
                Ok(format!(
                    "{} {}= {}",
                    self.target(target)?,
                    operator_symbol(*op),
                    self.expr(value, Precedence::Yield)?
                ))
            }
            ReplacementNode::Return(None) => Ok("return".to_owned()),
            ReplacementNode::Return(Some(value)) => {
                Ok(format!("return {}", self.expr(value, Precedence::Tuple)?))
            }
            ReplacementNode::Pass => Ok("pass".to_owned()),
            ReplacementNode::ExprStmt(value) => self.expr(value, Precedence::Yield),
            expr => self.expr(expr, Precedence::Yield),
        }
    }

    /// Copies a statement and moves its continuation lines from the
    /// statement's own indentation to `indent`.
    fn reindent(&self, range: TextRange, indent: &str) -> Result<String, UnparseError> {
        let text = self.slice(range)?;
        let original = indentation_at(self.source, range.start().to_usize());
        if original == indent || !text.contains('\n') {
            return Ok(text.to_owned());
        }
        let mut lines = text.split('\n');
        let mut out = lines.next().unwrap_or_default().to_owned();
        for line in lines {
            out.push('\n');
            match line.strip_prefix(original) {
                Some(rest) if !line.trim().is_empty() => {
                    out.push_str(indent);
                    out.push_str(rest);
                }
                _ => out.push_str(line),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(node: &ReplacementNode) -> String {
        Unparser::new("").expr(node, Precedence::Test).unwrap()
    }

    #[test]
    fn test_constant_repr() {
        assert_eq!(render_constant(&Constant::Float(6.28)).unwrap(), "6.28");
        assert_eq!(render_constant(&Constant::Float(3.0)).unwrap(), "3.0");
        assert_eq!(render_constant(&Constant::Int(-7)).unwrap(), "-7");
        assert_eq!(render_constant(&Constant::Bool(true)).unwrap(), "True");
        assert_eq!(render_constant(&Constant::Str("it's".into())).unwrap(), "\"it's\"");
        assert_eq!(
            render_constant(&Constant::Str("a'b\"\n".into())).unwrap(),
            "'a\\'b\"\\n'"
        );
        assert!(matches!(
            render_constant(&Constant::Float(f64::NAN)),
            Err(UnparseError::NonFiniteFloat(_))
        ));
    }

    #[test]
    fn test_parenthesizes_by_precedence() {
        let sum = ReplacementNode::bin_op(
            ReplacementNode::name("a"),
            Operator::Add,
            ReplacementNode::name("b"),
        );
        let product = ReplacementNode::bin_op(sum.clone(), Operator::Mult, ReplacementNode::int(2));
        assert_eq!(render(&product), "(a + b) * 2");

        let right_nested =
            ReplacementNode::bin_op(ReplacementNode::name("c"), Operator::Sub, sum.clone());
        assert_eq!(render(&right_nested), "c - (a + b)");

        let left_nested = ReplacementNode::bin_op(sum, Operator::Sub, ReplacementNode::name("c"));
        assert_eq!(render(&left_nested), "a + b - c");

        let power = ReplacementNode::bin_op(
            ReplacementNode::int(-2),
            Operator::Pow,
            ReplacementNode::int(2),
        );
        assert_eq!(render(&power), "(-2) ** 2");
    }

    #[test]
    fn test_attribute_on_int() {
        let node = ReplacementNode::Attribute {
            value: Box::new(ReplacementNode::int(1)),
            attr: "real".into(),
        };
        assert_eq!(render(&node), "(1).real");
    }

    #[test]
    fn test_invalid_identifiers() {
        let unparser = Unparser::new("");
        for bad in ["class", "1x", "a-b", ""] {
            assert_eq!(
                unparser.expr(&ReplacementNode::name(bad), Precedence::Test),
                Err(UnparseError::InvalidIdentifier(bad.to_owned()))
            );
        }
        assert!(is_identifier("match"));
        assert!(is_identifier("_private"));
    }

    #[test]
    fn test_statements() {
        let unparser = Unparser::new("");
        let assign = ReplacementNode::assign(
            ReplacementNode::Tuple(vec![ReplacementNode::name("a"), ReplacementNode::name("b")]),
            ReplacementNode::Tuple(vec![ReplacementNode::int(1)]),
        );
        assert_eq!(unparser.stmt(&assign, "").unwrap(), "(a, b) = (1,)");

        let bad = ReplacementNode::assign(ReplacementNode::int(1), ReplacementNode::int(2));
        assert_eq!(
            unparser.stmt(&bad, ""),
            Err(UnparseError::InvalidTarget("Constant"))
        );

        assert_eq!(
            unparser.expr(&ReplacementNode::Pass, Precedence::Test),
            Err(UnparseError::StatementInExpression)
        );
        assert_eq!(
            unparser
                .stmt(&ReplacementNode::Return(Some(Box::new(ReplacementNode::int(0)))), "")
                .unwrap(),
            "return 0"
        );
    }

    #[test]
    fn test_source_statement_reindented() {
        let source = "if a:\n    b()\n    c()\n";
        let unparser = Unparser::new(source);
        let range = TextRange::new(0.into(), 21.into());
        assert_eq!(
            unparser.stmt(&ReplacementNode::SourceStmt { range }, "  ").unwrap(),
            "if a:\n      b()\n      c()"
        );
    }
}
