use crate::scope::ScopeTree;
use crate::synth::ReplacementNode;
use crate::syntax::{NodeRef, SyntaxTree};
use crate::walker::Ancestry;
use ruff_python_ast::Stmt;
use ruff_text_size::{Ranged, TextRange};
use serde::Serialize;

/// Optional analyses a rule can ask for.
///
/// The session builds each provider once per iteration, and only when at
/// least one active rule declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Lexical scopes and name definitions.
    Scope,
    /// Parent links and sibling lists.
    Ancestry,
}

/// Everything a rule can inspect besides the node itself.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    tree: &'a SyntaxTree,
    scope: Option<&'a ScopeTree<'a>>,
    ancestry: Option<&'a Ancestry<'a>>,
}

impl<'a> Context<'a> {
    /// Bundles the current tree with the providers that were built for it.
    #[must_use]
    pub fn new(
        tree: &'a SyntaxTree,
        scope: Option<&'a ScopeTree<'a>>,
        ancestry: Option<&'a Ancestry<'a>>,
    ) -> Self {
        Self {
            tree,
            scope,
            ancestry,
        }
    }

    /// The tree being matched.
    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    /// Source text of `node`.
    #[must_use]
    pub fn text(&self, node: &impl Ranged) -> &'a str {
        self.tree.slice(node.range())
    }

    /// Scope tree, if some rule declared [`Provider::Scope`].
    #[must_use]
    pub fn scope(&self) -> Option<&'a ScopeTree<'a>> {
        self.scope
    }

    /// Parent links, if some rule declared [`Provider::Ancestry`].
    #[must_use]
    pub fn ancestry(&self) -> Option<&'a Ancestry<'a>> {
        self.ancestry
    }
}

/// The node an action replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Byte range of the node.
    pub range: TextRange,
    /// Whether the node is a statement.
    pub statement: bool,
}

impl Target {
    /// Target covering `node`.
    #[must_use]
    pub fn of(node: NodeRef<'_>) -> Self {
        Self {
            range: node.range(),
            statement: node.is_stmt(),
        }
    }
}

/// What to put in place of a target.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// A node, rendered by the synthesizer.
    Node(ReplacementNode),
    /// Verbatim text.
    Text(String),
}

/// A rewrite requested by a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace a node.
    Replace {
        /// Node to replace.
        target: Target,
        /// Its replacement.
        with: Replacement,
    },
    /// Insert a statement before `anchor` and its leading comments.
    InsertBefore {
        /// Range of the anchor statement.
        anchor: TextRange,
        /// Statement to insert.
        node: ReplacementNode,
    },
    /// Insert a statement on the line after `anchor`.
    InsertAfter {
        /// Range of the anchor statement.
        anchor: TextRange,
        /// Statement to insert.
        node: ReplacementNode,
    },
    /// Remove a statement.
    Erase {
        /// Range of the statement.
        target: TextRange,
    },
}

impl Action {
    /// Replace `node` with a rendered node.
    #[must_use]
    pub fn replace(node: NodeRef<'_>, with: ReplacementNode) -> Self {
        Self::Replace {
            target: Target::of(node),
            with: Replacement::Node(with),
        }
    }

    /// Replace `node` with verbatim text.
    #[must_use]
    pub fn replace_text(node: NodeRef<'_>, text: impl Into<String>) -> Self {
        Self::Replace {
            target: Target::of(node),
            with: Replacement::Text(text.into()),
        }
    }

    /// Insert `node` before `anchor`.
    #[must_use]
    pub fn insert_before(anchor: &Stmt, node: ReplacementNode) -> Self {
        Self::InsertBefore {
            anchor: anchor.range(),
            node,
        }
    }

    /// Insert `node` after `anchor`.
    #[must_use]
    pub fn insert_after(anchor: &Stmt, node: ReplacementNode) -> Self {
        Self::InsertAfter {
            anchor: anchor.range(),
            node,
        }
    }

    /// Remove `stmt`.
    #[must_use]
    pub fn erase(stmt: &Stmt) -> Self {
        Self::Erase {
            target: stmt.range(),
        }
    }

    /// Short name of the action kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Replace { .. } => "replace",
            Self::InsertBefore { .. } => "insert_before",
            Self::InsertAfter { .. } => "insert_after",
            Self::Erase { .. } => "erase",
        }
    }

    /// Range of the node the action is anchored on.
    #[must_use]
    pub fn range(&self) -> TextRange {
        match self {
            Self::Replace { target, .. } => target.range,
            Self::InsertBefore { anchor, .. } | Self::InsertAfter { anchor, .. } => *anchor,
            Self::Erase { target } => *target,
        }
    }
}

/// A match/replace strategy.
///
/// Rules are stateless. Declining is `None`, whatever the reason; write
/// guards with `?` and `let ... else` and return early on the first one that
/// fails.
pub trait Rule: Send + Sync {
    /// Unique name, used for selection and reporting.
    fn name(&self) -> &'static str;
    /// One-line summary for `--list-rules`.
    fn description(&self) -> &'static str;
    /// Providers this rule reads from its [`Context`].
    fn context_providers(&self) -> &'static [Provider] {
        &[]
    }
    /// Returns the rewrite for `node`, or `None` to decline.
    fn match_node(&self, node: NodeRef<'_>, context: &Context<'_>) -> Option<Action>;
}

/// Constant folding and propagation.
pub mod constants;
/// Removal of `pass` statements that have siblings.
pub mod redundant_pass;
/// Built-in rule lookup by name.
pub mod registry;
