//! Parsed source and node references.
//!
//! The Python parser is an external collaborator: we hand it text and get a
//! tree whose nodes carry byte ranges. `SyntaxTree` keeps the text and the tree
//! together for exactly one session iteration.

use crate::error::ParseError;
use crate::utils::LineIndex;
use ruff_python_ast::{Expr, ModModule, Stmt};
use ruff_python_parser::{parse_module, Parsed};
use ruff_text_size::{Ranged, TextRange};

/// An immutable parse of one version of the source text.
pub struct SyntaxTree {
    source: String,
    parsed: Parsed<ModModule>,
}

impl SyntaxTree {
    /// Parses `source` as a Python module.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the text is not valid Python.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        match parse_module(source) {
            Ok(parsed) => Ok(Self {
                source: source.to_owned(),
                parsed,
            }),
            Err(err) => {
                let index = LineIndex::new(source);
                let start = err.location.start();
                Err(ParseError {
                    message: err.error.to_string(),
                    range: err.location,
                    line: index.line_index(start),
                    column: index.column(start),
                })
            }
        }
    }

    /// The text this tree was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level statements of the module.
    #[must_use]
    pub fn body(&self) -> &[Stmt] {
        &self.parsed.syntax().body
    }

    /// Range covering the whole module.
    #[must_use]
    pub fn range(&self) -> TextRange {
        self.parsed.syntax().range()
    }

    /// Number of statement and expression nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        crate::walker::for_each_node(self.body(), |_, _| count += 1);
        count
    }

    /// Source text covered by `range`.
    #[must_use]
    pub fn slice(&self, range: TextRange) -> &str {
        &self.source[range]
    }
}

/// A borrowed syntax node: one tag per grammar category the walker offers to
/// rules. The concrete construct is the ruff variant inside.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// A statement.
    Stmt(&'a Stmt),
    /// An expression.
    Expr(&'a Expr),
}

impl<'a> NodeRef<'a> {
    /// The statement, if this is one.
    #[must_use]
    pub fn as_stmt(self) -> Option<&'a Stmt> {
        match self {
            Self::Stmt(stmt) => Some(stmt),
            Self::Expr(_) => None,
        }
    }

    /// The expression, if this is one.
    #[must_use]
    pub fn as_expr(self) -> Option<&'a Expr> {
        match self {
            Self::Expr(expr) => Some(expr),
            Self::Stmt(_) => None,
        }
    }

    /// Whether this is a statement.
    #[must_use]
    pub fn is_stmt(self) -> bool {
        matches!(self, Self::Stmt(_))
    }

    /// Pointer identity. Two refs are the same node only within one tree.
    #[must_use]
    pub fn ptr_eq(self, other: NodeRef<'_>) -> bool {
        match (self, other) {
            (Self::Stmt(a), NodeRef::Stmt(b)) => std::ptr::eq(a, b),
            (Self::Expr(a), NodeRef::Expr(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }

    /// Short name of the grammar construct, used in logs.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Stmt(stmt) => stmt_kind(stmt),
            Self::Expr(expr) => expr_kind(expr),
        }
    }
}

impl Ranged for NodeRef<'_> {
    fn range(&self) -> TextRange {
        match self {
            Self::Stmt(stmt) => stmt.range(),
            Self::Expr(expr) => expr.range(),
        }
    }
}

impl<'a> From<&'a Stmt> for NodeRef<'a> {
    fn from(stmt: &'a Stmt) -> Self {
        Self::Stmt(stmt)
    }
}

impl<'a> From<&'a Expr> for NodeRef<'a> {
    fn from(expr: &'a Expr) -> Self {
        Self::Expr(expr)
    }
}

fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::FunctionDef(_) => "FunctionDef",
        Stmt::ClassDef(_) => "ClassDef",
        Stmt::Return(_) => "Return",
        Stmt::Delete(_) => "Delete",
        Stmt::Assign(_) => "Assign",
        Stmt::AugAssign(_) => "AugAssign",
        Stmt::AnnAssign(_) => "AnnAssign",
        Stmt::TypeAlias(_) => "TypeAlias",
        Stmt::For(_) => "For",
        Stmt::While(_) => "While",
        Stmt::If(_) => "If",
        Stmt::With(_) => "With",
        Stmt::Match(_) => "Match",
        Stmt::Raise(_) => "Raise",
        Stmt::Try(_) => "Try",
        Stmt::Assert(_) => "Assert",
        Stmt::Import(_) => "Import",
        Stmt::ImportFrom(_) => "ImportFrom",
        Stmt::Global(_) => "Global",
        Stmt::Nonlocal(_) => "Nonlocal",
        Stmt::Expr(_) => "Expr",
        Stmt::Pass(_) => "Pass",
        Stmt::Break(_) => "Break",
        Stmt::Continue(_) => "Continue",
        Stmt::IpyEscapeCommand(_) => "IpyEscapeCommand",
    }
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::BoolOp(_) => "BoolOp",
        Expr::Named(_) => "NamedExpr",
        Expr::BinOp(_) => "BinOp",
        Expr::UnaryOp(_) => "UnaryOp",
        Expr::Lambda(_) => "Lambda",
        Expr::If(_) => "IfExp",
        Expr::Dict(_) => "Dict",
        Expr::Set(_) => "Set",
        Expr::ListComp(_) => "ListComp",
        Expr::SetComp(_) => "SetComp",
        Expr::DictComp(_) => "DictComp",
        Expr::Generator(_) => "GeneratorExp",
        Expr::Await(_) => "Await",
        Expr::Yield(_) => "Yield",
        Expr::YieldFrom(_) => "YieldFrom",
        Expr::Compare(_) => "Compare",
        Expr::Call(_) => "Call",
        Expr::FString(_) => "JoinedStr",
        Expr::TString(_) => "TemplateStr",
        Expr::StringLiteral(_)
        | Expr::BytesLiteral(_)
        | Expr::NumberLiteral(_)
        | Expr::BooleanLiteral(_)
        | Expr::NoneLiteral(_)
        | Expr::EllipsisLiteral(_) => "Constant",
        Expr::Attribute(_) => "Attribute",
        Expr::Subscript(_) => "Subscript",
        Expr::Starred(_) => "Starred",
        Expr::Name(_) => "Name",
        Expr::List(_) => "List",
        Expr::Tuple(_) => "Tuple",
        Expr::Slice(_) => "Slice",
        Expr::IpyEscapeCommand(_) => "IpyEscapeCommand",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_module() {
        let tree = SyntaxTree::parse("x = 1\ny = x + 2\n").unwrap();
        assert_eq!(tree.body().len(), 2);
        assert_eq!(tree.source(), "x = 1\ny = x + 2\n");
        // 2 statements, 2 targets, `1`, `x + 2`, `x`, `2`
        assert_eq!(tree.node_count(), 8);
    }

    #[test]
    fn test_parse_error_location() {
        let err = SyntaxTree::parse("x = 1\ny = (\n").err().unwrap();
        assert!(err.line >= 2);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_node_ref_kind_and_identity() {
        let tree = SyntaxTree::parse("a = b\n").unwrap();
        let stmt = NodeRef::from(&tree.body()[0]);
        assert_eq!(stmt.kind(), "Assign");
        assert!(stmt.is_stmt());
        assert!(stmt.ptr_eq(NodeRef::from(&tree.body()[0])));
        let Stmt::Assign(assign) = &tree.body()[0] else {
            unreachable!()
        };
        let value = NodeRef::from(&*assign.value);
        assert_eq!(value.kind(), "Name");
        assert!(!stmt.ptr_eq(value));
        assert_eq!(tree.slice(value.range()), "b");
    }
}
