//! Concrete syntax tree support.
//!
//! The ruff AST drops comments, so comments are located with Tree-sitter.
//! All semantic decisions still use the AST; the CST only contributes byte
//! ranges of `comment` nodes, which the span tracker attaches to statements.

mod comments;
mod parser;

pub use comments::{extract_comments, Comment};
pub use parser::{CstError, CstParser, CstTree};
