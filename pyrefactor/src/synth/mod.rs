//! Text synthesis: turns a rule's [`Action`] into an [`Edit`] on the current
//! source.
//!
//! Copied nodes are sliced from the text, synthetic nodes are unparsed with
//! the precedence their position requires, and the result is spliced into
//! exactly the target range. Statement actions work on whole physical lines
//! so indentation and attached comments stay intact.

mod node;
mod precedence;
mod splice;
mod unparse;

pub use node::{Constant, ReplacementNode};
pub use precedence::Precedence;
pub use splice::{splice, Edit};
pub use unparse::{is_identifier, operator_symbol, render_constant, Unparser};

use crate::error::UnparseError;
use crate::rules::{Action, Replacement};
use crate::span::SpanTracker;
use crate::syntax::{NodeRef, SyntaxTree};
use crate::utils::{indentation_at, line_end, starts_line};
use crate::walker::{bodies, locate, Located};
use ruff_python_ast::{Expr, Stmt};
use ruff_text_size::TextRange;
use std::cell::OnceCell;

/// Renders actions against one parsed version of the source.
pub struct Synthesizer<'t> {
    tree: &'t SyntaxTree,
    unparser: Unparser<'t>,
    spans: OnceCell<SpanTracker<'t>>,
}

impl<'t> Synthesizer<'t> {
    /// Creates a synthesizer for `tree`.
    #[must_use]
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            unparser: Unparser::new(tree.source()),
            spans: OnceCell::new(),
        }
    }

    fn source(&self) -> &'t str {
        self.tree.source()
    }

    fn spans(&self) -> &SpanTracker<'t> {
        self.spans.get_or_init(|| SpanTracker::new(self.tree.source()))
    }

    /// Line terminator used by the source.
    fn newline(&self) -> &'static str {
        if self.source().contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Applies `action` and returns the new text.
    ///
    /// # Errors
    /// Returns an [`UnparseError`] if the replacement cannot be rendered or
    /// the action does not fit the current tree.
    pub fn apply(&self, action: &Action) -> Result<String, UnparseError> {
        self.edit(action)?.apply(self.source())
    }

    /// Computes the edit for `action`.
    ///
    /// # Errors
    /// Returns an [`UnparseError`] if the replacement cannot be rendered or
    /// the action does not fit the current tree.
    pub fn edit(&self, action: &Action) -> Result<Edit, UnparseError> {
        match action {
            Action::Replace { target, with } => {
                let text = match with {
                    Replacement::Text(text) => text.clone(),
                    Replacement::Node(node) if target.statement => {
                        let indent = indentation_at(self.source(), target.range.start().to_usize());
                        self.unparser.stmt(node, indent)?
                    }
                    Replacement::Node(node) => self.render_expr(target.range, node)?,
                };
                Ok(Edit::replace(target.range, text))
            }
            Action::InsertBefore { anchor, node } => self.insert_before(*anchor, node),
            Action::InsertAfter { anchor, node } => self.insert_after(*anchor, node),
            Action::Erase { target } => self.erase(*target),
        }
    }

    /// Renders `node` for the expression position at `range`.
    fn render_expr(&self, range: TextRange, node: &ReplacementNode) -> Result<String, UnparseError> {
        let own = self.unparser.precedence(node);
        if own >= Precedence::Test && is_parenthesized(self.source(), range) {
            return self.unparser.expr(node, Precedence::NamedExpr);
        }

        let located = locate(self.tree.body(), range, false);
        let (required, attribute_value) = match located {
            Some(Located {
                node: NodeRef::Expr(expr),
                parent,
            }) => (
                Precedence::required_by(parent, expr),
                matches!(parent, Some(NodeRef::Expr(Expr::Attribute(_)))),
            ),
            _ => (Precedence::Test, false),
        };

        let text = self.unparser.expr(node, required)?;
        if attribute_value && self.unparser.is_int_literal(node) && !text.starts_with('(') {
            return Ok(format!("({text})"));
        }
        Ok(text)
    }

    fn locate_stmt(&self, range: TextRange, action: &'static str) -> Result<Located<'t>, UnparseError> {
        locate(self.tree.body(), range, true).ok_or(UnparseError::NotAStatement(action))
    }

    fn insert_before(&self, anchor: TextRange, node: &ReplacementNode) -> Result<Edit, UnparseError> {
        let located = self.locate_stmt(anchor, "InsertBefore")?;
        let source = self.source();
        let start = anchor.start().to_usize();
        let indent = indentation_at(source, start);
        let text = self.unparser.stmt(node, indent)?;

        if !starts_line(source, start) {
            return Ok(Edit::insert(start, format!("{text}; ")));
        }
        let block_start = self.spans().span(located.node).full().start().to_usize();
        let line_start = block_start - indentation_at(source, block_start).len();
        Ok(Edit::insert(
            line_start,
            format!("{indent}{text}{}", self.newline()),
        ))
    }

    fn insert_after(&self, anchor: TextRange, node: &ReplacementNode) -> Result<Edit, UnparseError> {
        self.locate_stmt(anchor, "InsertAfter")?;
        let source = self.source();
        let start = anchor.start().to_usize();
        let end = anchor.end().to_usize();
        let indent = indentation_at(source, start);
        let text = self.unparser.stmt(node, indent)?;

        if !starts_line(source, start) {
            return Ok(Edit::insert(end, format!("; {text}")));
        }
        let eol = line_end(source, end);
        let newline = self.newline();
        match next_line(source, eol) {
            Some(next) => Ok(Edit::insert(next, format!("{indent}{text}{newline}"))),
            None => Ok(Edit::insert(eol, format!("{newline}{indent}{text}"))),
        }
    }

    fn erase(&self, target: TextRange) -> Result<Edit, UnparseError> {
        let located = self.locate_stmt(target, "Erase")?;
        let source = self.source();
        let (start, end) = (target.start().to_usize(), target.end().to_usize());

        if let Some(NodeRef::Stmt(parent)) = located.parent {
            let siblings = containing_body(parent, located.node);
            if siblings.is_some_and(|body| body.len() == 1) {
                return Ok(Edit::replace(target, "pass"));
            }
        }

        let eol = line_end(source, end);
        let rest = source[end..eol].trim_start();
        if rest.starts_with(';') {
            // `a; b` erasing `a`: drop the separator and the space after it.
            let semicolon = end + (source[end..eol].len() - rest.len());
            let after = &source[semicolon + 1..eol];
            let stop = semicolon + 1 + (after.len() - after.trim_start().len());
            return Ok(Edit::delete(start, stop));
        }
        if starts_line(source, start) {
            let line_start = start - indentation_at(source, start).len();
            let stop = next_line(source, eol).unwrap_or(eol);
            return Ok(Edit::delete(line_start, stop));
        }
        // `a; b` erasing `b`: drop the separator before it.
        let before = source[..start].trim_end_matches([' ', '\t']);
        let from = before.strip_suffix(';').map_or(start, str::len);
        Ok(Edit::delete(from, end))
    }
}

/// Offset just past the line terminator at `eol`, if there is one.
fn next_line(source: &str, eol: usize) -> Option<usize> {
    let rest = &source[eol..];
    if rest.starts_with("\r\n") {
        Some(eol + 2)
    } else if rest.starts_with('\n') || rest.starts_with('\r') {
        Some(eol + 1)
    } else {
        None
    }
}

/// The statement list of `parent` that holds `child`.
fn containing_body<'a>(parent: &'a Stmt, child: NodeRef<'_>) -> Option<&'a [Stmt]> {
    let child = child.as_stmt()?;
    bodies(parent)
        .into_iter()
        .find(|body| body.iter().any(|stmt| std::ptr::eq(stmt, child)))
}

/// Whether the source already wraps `range` in parentheses, allowing
/// whitespace and comments inside them.
#[must_use]
pub fn is_parenthesized(source: &str, range: TextRange) -> bool {
    let before = source[..range.start().to_usize()].trim_end();
    if !before.ends_with('(') {
        return false;
    }
    let mut rest = &source[range.end().to_usize()..];
    loop {
        rest = rest.trim_start();
        if rest.starts_with('#') {
            rest = rest.find('\n').map_or("", |pos| &rest[pos..]);
        } else {
            return rest.starts_with(')');
        }
    }
}
