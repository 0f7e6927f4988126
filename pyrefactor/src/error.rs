//! Error types shared by the refactoring engine.
//!
//! Everything here is returned as data: the session never panics on bad input
//! and never swallows a failure. The embedding caller decides how to present
//! each kind.

use ruff_text_size::TextRange;
use serde::Serialize;

/// The input text is not valid Python.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    /// Parser message.
    pub message: String,
    /// Byte range the parser blamed.
    #[serde(skip)]
    pub range: TextRange,
    /// 1-indexed line of the error start.
    pub line: usize,
    /// 1-indexed column (in bytes) of the error start.
    pub column: usize,
}

/// A replacement could not be turned into valid source text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnparseError {
    /// A synthetic name is not a Python identifier (or is a keyword).
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),
    /// `inf` and `nan` have no literal form.
    #[error("float constant {0} has no literal representation")]
    NonFiniteFloat(f64),
    /// A node that needs operands (bool op, comparison, assignment) lacks them.
    #[error("{0} node is missing operands")]
    EmptyOperands(&'static str),
    /// The node cannot appear on the left-hand side of an assignment.
    #[error("{0} is not an assignable target")]
    InvalidTarget(&'static str),
    /// A statement node was used where an expression is required.
    #[error("statement node cannot replace an expression")]
    StatementInExpression,
    /// The action refers to a range outside the current text.
    #[error("range {start}..{end} is out of bounds for source of length {len}")]
    OutOfBounds {
        /// Start byte of the range.
        start: usize,
        /// End byte of the range.
        end: usize,
        /// Length of the text.
        len: usize,
    },
    /// The action range splits a UTF-8 code point.
    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
    /// The action targets something that is not a statement.
    #[error("{0} requires a statement target")]
    NotAStatement(&'static str),
    /// The rewritten text no longer parses.
    #[error("rewrite produced invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// Rule selection problems. These are advisories, not failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum RuleLoadError {
    /// A requested rule name did not match any registered rule.
    #[error("unknown rule `{0}`")]
    UnknownRule(String),
    /// The selection resolved to zero rules.
    #[error("no rules found")]
    NoRules,
}

/// Why a session stopped before reaching a fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NonTerminationReason {
    /// A rule matched but its rewrite left the text unchanged.
    NoProgress,
    /// The rewrite reproduced a text seen earlier in the run.
    Cycle,
    /// The iteration cap was reached.
    IterationLimit,
}

/// The session gave up before reaching a fixed point.
///
/// This is reported next to the best-effort output, never instead of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("no fixed point after {iterations} iteration(s) ({reason:?}, last rule: {rule})")]
pub struct NonTerminationError {
    /// What tripped the guard.
    pub reason: NonTerminationReason,
    /// Rule whose match tripped the guard.
    pub rule: String,
    /// Rewrites applied before stopping.
    pub iterations: usize,
}

/// Fatal outcome of a session run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefactorError {
    /// The input did not parse; no rule ran.
    #[error("failed to parse source: {0}")]
    Parse(#[from] ParseError),
    /// A match could not be rendered. `partial` holds the text produced by
    /// the iterations that completed before it.
    #[error("rule `{rule}` produced an unusable replacement: {error}")]
    Unparse {
        /// Rule that produced the match.
        rule: String,
        /// What went wrong.
        error: UnparseError,
        /// Last valid text.
        partial: String,
    },
}
