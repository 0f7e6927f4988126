//! The fixed-point rewrite loop.
//!
//! Each iteration parses the current text, builds the providers the active
//! rules declared, applies the first match in traversal order and starts
//! over. The loop ends when nothing matches, or when a guard trips: a rewrite
//! that changes nothing, a text seen before, or the iteration cap.

use crate::constants::{DEFAULT_ITERATIONS_PER_NODE, DEFAULT_MIN_ITERATIONS};
use crate::error::{NonTerminationError, NonTerminationReason, RefactorError, UnparseError};
use crate::rules::{Context, Provider, Rule};
use crate::scope::ScopeTree;
use crate::syntax::SyntaxTree;
use crate::synth::{Edit, Synthesizer};
use crate::utils::LineIndex;
use crate::walker::{Ancestry, Walker};
use ruff_text_size::Ranged;
use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::{Deserialize, Serialize};
use std::hash::BuildHasher;
use tracing::{debug, warn};

/// Texts produced during one run, bucketed by hash. A hash hit is only a
/// repeat when the stored text is equal.
#[derive(Default)]
struct SeenTexts {
    buckets: FxHashMap<u64, Vec<String>>,
}

impl SeenTexts {
    /// Records `text`; false if it was already recorded.
    fn insert(&mut self, text: &str) -> bool {
        self.insert_hashed(FxBuildHasher.hash_one(text), text)
    }

    fn insert_hashed(&mut self, hash: u64, text: &str) -> bool {
        let bucket = self.buckets.entry(hash).or_default();
        if bucket.iter().any(|seen| seen == text) {
            return false;
        }
        bucket.push(text.to_owned());
        true
    }
}

/// Loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed cap. Overrides the size-based cap when set.
    pub max_iterations: Option<usize>,
    /// Lower bound of the size-based cap.
    pub min_iterations: usize,
    /// Rewrites allowed per node of the first parse.
    pub iterations_per_node: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            min_iterations: DEFAULT_MIN_ITERATIONS,
            iterations_per_node: DEFAULT_ITERATIONS_PER_NODE,
        }
    }
}

impl SessionConfig {
    /// Number of rewrites allowed for a tree of `node_count` nodes.
    #[must_use]
    pub fn iteration_cap(&self, node_count: usize) -> usize {
        self.max_iterations.unwrap_or_else(|| {
            self.min_iterations
                .max(node_count.saturating_mul(self.iterations_per_node))
        })
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No rule matched the final text.
    Converged,
    /// A guard stopped the loop early.
    NonTerminated,
}

/// One rewrite the session applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    /// Rule that produced it.
    pub rule: String,
    /// 1-based iteration number.
    pub iteration: usize,
    /// Action kind (`replace`, `insert_before`, `insert_after`, `erase`).
    pub action: &'static str,
    /// 1-based line of the edit in the text it was applied to.
    pub line: usize,
    /// Start byte of the edit.
    pub start: usize,
    /// End byte of the edit.
    pub end: usize,
    /// Text that was removed.
    pub replaced: String,
    /// Text that was inserted.
    pub replacement: String,
}

/// Result of [`Session::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Final text.
    pub source: String,
    /// Number of rewrites applied.
    pub iterations: usize,
    /// Every rewrite, in order.
    pub applied: Vec<AppliedChange>,
    /// Set when the loop stopped before a fixed point.
    pub non_termination: Option<NonTerminationError>,
}

impl RunOutcome {
    /// Whether the loop reached a fixed point.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.non_termination.is_some() {
            RunStatus::NonTerminated
        } else {
            RunStatus::Converged
        }
    }

    /// Whether any rewrite was applied.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// A match found by [`Session::pending`], not yet applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMatch {
    /// Rule that matched.
    pub rule: &'static str,
    /// Action kind the rule requested.
    pub action: &'static str,
    /// 1-based line of the matched node.
    pub line: usize,
    /// 1-based column of the matched node.
    pub column: usize,
    /// Source text of the matched node.
    pub text: String,
}

/// A rendered match, detached from the tree it was found in.
struct Rewrite {
    rule: &'static str,
    action: &'static str,
    line: usize,
    edit: Result<Edit, UnparseError>,
}

/// An ordered rule list plus loop limits.
pub struct Session {
    rules: Vec<Box<dyn Rule>>,
    config: SessionConfig,
    needs_scope: bool,
    needs_ancestry: bool,
}

impl Session {
    /// Creates a session. Rules are offered each node in this order.
    #[must_use]
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        let declares = |provider: Provider| {
            rules
                .iter()
                .any(|rule| rule.context_providers().contains(&provider))
        };
        let needs_scope = declares(Provider::Scope);
        let needs_ancestry = declares(Provider::Ancestry);
        Self {
            rules,
            config: SessionConfig::default(),
            needs_scope,
            needs_ancestry,
        }
    }

    /// Replaces the loop limits.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The active rules.
    #[must_use]
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// The loop limits.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Rewrites `source` until no rule matches.
    ///
    /// A guard stopping the loop is not an error: the outcome carries the
    /// best-effort text and a [`NonTerminationError`].
    ///
    /// # Errors
    /// [`RefactorError::Parse`] if `source` is not valid Python, and
    /// [`RefactorError::Unparse`] if a match cannot be rendered or its result
    /// does not parse. The latter carries the last valid text.
    pub fn run(&self, source: &str) -> Result<RunOutcome, RefactorError> {
        let mut tree = SyntaxTree::parse(source)?;
        let cap = self.config.iteration_cap(tree.node_count());
        let walker = Walker::new(&self.rules);
        let mut seen = SeenTexts::default();
        seen.insert(source);
        let mut applied: Vec<AppliedChange> = Vec::new();

        debug!(rules = self.rules.len(), cap, "starting session");
        let non_termination = loop {
            let Some(rewrite) = self.next_rewrite(&walker, &tree) else {
                break None;
            };
            let rule = rewrite.rule;
            let stop = |reason| {
                Some(NonTerminationError {
                    reason,
                    rule: rule.to_owned(),
                    iterations: applied.len(),
                })
            };
            if applied.len() >= cap {
                break stop(NonTerminationReason::IterationLimit);
            }

            let unparse = |error: UnparseError| RefactorError::Unparse {
                rule: rule.to_owned(),
                error,
                partial: tree.source().to_owned(),
            };
            let edit = rewrite.edit.map_err(unparse)?;
            let text = edit.apply(tree.source()).map_err(unparse)?;
            debug!(
                iteration = applied.len() + 1,
                rule,
                action = rewrite.action,
                start = edit.start_byte,
                end = edit.end_byte,
                "applying match"
            );

            if text == tree.source() {
                break stop(NonTerminationReason::NoProgress);
            }
            if !seen.insert(&text) {
                break stop(NonTerminationReason::Cycle);
            }
            let next = SyntaxTree::parse(&text)
                .map_err(|error| unparse(UnparseError::InvalidSyntax(error.to_string())))?;

            applied.push(AppliedChange {
                rule: rule.to_owned(),
                iteration: applied.len() + 1,
                action: rewrite.action,
                line: rewrite.line,
                start: edit.start_byte,
                end: edit.end_byte,
                replaced: tree.source()[edit.start_byte..edit.end_byte].to_owned(),
                replacement: edit.replacement,
            });
            tree = next;
        };

        if let Some(error) = &non_termination {
            warn!(%error, "stopped before reaching a fixed point");
        } else {
            debug!(iterations = applied.len(), "converged");
        }
        Ok(RunOutcome {
            source: tree.source().to_owned(),
            iterations: applied.len(),
            applied,
            non_termination,
        })
    }

    /// Finds the first match in `tree` and renders it.
    fn next_rewrite(&self, walker: &Walker<'_>, tree: &SyntaxTree) -> Option<Rewrite> {
        let scope = self.needs_scope.then(|| ScopeTree::build(tree));
        let ancestry = self.needs_ancestry.then(|| Ancestry::build(tree));
        let context = Context::new(tree, scope.as_ref(), ancestry.as_ref());

        let found = walker.first_match(tree, &context)?;
        let line = LineIndex::new(tree.source()).line_index(found.node.range().start());
        Some(Rewrite {
            rule: found.rule,
            action: found.action.kind(),
            line,
            edit: Synthesizer::new(tree).edit(&found.action),
        })
    }

    /// Every node some rule would rewrite in `source`, one match per node,
    /// without applying any of them.
    ///
    /// # Errors
    /// Returns [`RefactorError::Parse`] if `source` is not valid Python.
    pub fn pending(&self, source: &str) -> Result<Vec<PendingMatch>, RefactorError> {
        let tree = SyntaxTree::parse(source)?;
        let scope = self.needs_scope.then(|| ScopeTree::build(&tree));
        let ancestry = self.needs_ancestry.then(|| Ancestry::build(&tree));
        let context = Context::new(&tree, scope.as_ref(), ancestry.as_ref());
        let index = LineIndex::new(source);

        Ok(Walker::new(&self.rules)
            .collect_matches(&tree, &context)
            .into_iter()
            .map(|found| {
                let start = found.node.range().start();
                PendingMatch {
                    rule: found.rule,
                    action: found.action.kind(),
                    line: index.line_index(start),
                    column: index.column(start),
                    text: tree.slice(found.node.range()).to_owned(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Action;
    use crate::synth::ReplacementNode;
    use crate::syntax::NodeRef;
    use ruff_python_ast::{Expr, Stmt};

    /// Rewrites every integer literal to itself.
    struct Identity;

    impl Rule for Identity {
        fn name(&self) -> &'static str {
            "Identity"
        }
        fn description(&self) -> &'static str {
            "no-op"
        }
        fn match_node(&self, node: NodeRef<'_>, context: &Context<'_>) -> Option<Action> {
            let NodeRef::Expr(expr @ Expr::NumberLiteral(_)) = node else {
                return None;
            };
            Some(Action::replace_text(node, context.text(expr)))
        }
    }

    /// Swaps `a` and `b` forever.
    struct Flip;

    impl Rule for Flip {
        fn name(&self) -> &'static str {
            "Flip"
        }
        fn description(&self) -> &'static str {
            "a <-> b"
        }
        fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
            let NodeRef::Expr(Expr::Name(name)) = node else {
                return None;
            };
            let other = match name.id.as_str() {
                "a" => "b",
                "b" => "a",
                _ => return None,
            };
            Some(Action::replace(node, ReplacementNode::name(other)))
        }
    }

    /// Wraps every call in another call, growing without bound.
    struct Grow;

    impl Rule for Grow {
        fn name(&self) -> &'static str {
            "Grow"
        }
        fn description(&self) -> &'static str {
            "f(x) -> f(f(x))"
        }
        fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
            let NodeRef::Stmt(Stmt::Expr(stmt)) = node else {
                return None;
            };
            let wrapped = ReplacementNode::call(
                ReplacementNode::name("f"),
                vec![ReplacementNode::copy_of(&stmt.value)],
            );
            Some(Action::replace(NodeRef::Expr(&stmt.value), wrapped))
        }
    }

    /// Produces a name that is not an identifier.
    struct Broken;

    impl Rule for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }
        fn description(&self) -> &'static str {
            "bad identifier"
        }
        fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
            let NodeRef::Expr(Expr::Name(name)) = node else {
                return None;
            };
            (name.id.as_str() == "x").then(|| Action::replace(node, ReplacementNode::name("not valid")))
        }
    }

    fn session(rule: impl Rule + 'static) -> Session {
        Session::new(vec![Box::new(rule)])
    }

    #[test]
    fn test_no_rules_is_identity() {
        let source = "x  =  1   # spaced\n\n\ndef f( a ):\n    return a\n";
        let outcome = Session::new(Vec::new()).run(source).unwrap();
        assert_eq!(outcome.source, source);
        assert_eq!(outcome.status(), RunStatus::Converged);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_no_progress_is_reported() {
        let outcome = session(Identity).run("x = 1\n").unwrap();
        assert_eq!(outcome.source, "x = 1\n");
        let error = outcome.non_termination.unwrap();
        assert_eq!(error.reason, NonTerminationReason::NoProgress);
        assert_eq!(error.rule, "Identity");
        assert_eq!(error.iterations, 0);
    }

    #[test]
    fn test_cycle_is_reported() {
        let outcome = session(Flip).run("print(a)\n").unwrap();
        let error = outcome.non_termination.unwrap();
        assert_eq!(error.reason, NonTerminationReason::Cycle);
        assert_eq!(outcome.source, "print(b)\n");
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn test_iteration_cap() {
        let config = SessionConfig {
            max_iterations: Some(3),
            ..SessionConfig::default()
        };
        let outcome = session(Grow).with_config(config).run("f(x)\n").unwrap();
        assert_eq!(outcome.source, "f(f(f(f(x))))\n");
        assert_eq!(outcome.iterations, 3);
        let error = outcome.non_termination.unwrap();
        assert_eq!(error.reason, NonTerminationReason::IterationLimit);
        assert_eq!(error.iterations, 3);
    }

    #[test]
    fn test_default_cap_scales_with_size() {
        let config = SessionConfig::default();
        assert_eq!(config.iteration_cap(1), 64);
        assert_eq!(config.iteration_cap(100), 400);
    }

    #[test]
    fn test_parse_error_runs_nothing() {
        let result = session(Identity).run("def (:\n");
        assert!(matches!(result, Err(RefactorError::Parse(_))));
    }

    #[test]
    fn test_unparse_error_keeps_partial() {
        let result = session(Broken).run("y = x\n");
        let Err(RefactorError::Unparse {
            rule,
            error,
            partial,
        }) = result
        else {
            panic!("expected an unparse error");
        };
        assert_eq!(rule, "Broken");
        assert_eq!(error, UnparseError::InvalidIdentifier("not valid".to_owned()));
        assert_eq!(partial, "y = x\n");
    }

    #[test]
    fn test_applied_changes_are_recorded() {
        let outcome = session(Flip).with_config(SessionConfig {
            max_iterations: Some(10),
            ..SessionConfig::default()
        });
        let outcome = outcome.run("x = 1\nprint(a)\n").unwrap();
        let change = &outcome.applied[0];
        assert_eq!(change.rule, "Flip");
        assert_eq!(change.iteration, 1);
        assert_eq!(change.action, "replace");
        assert_eq!(change.line, 2);
        assert_eq!((change.replaced.as_str(), change.replacement.as_str()), ("a", "b"));
    }

    #[test]
    fn test_pending_lists_every_match() {
        let pending = session(Flip).pending("a\nf(b, a)\n").unwrap();
        let found: Vec<_> = pending.iter().map(|m| (m.line, m.column, m.text.as_str())).collect();
        assert_eq!(found, vec![(1, 1, "a"), (2, 3, "b"), (2, 6, "a")]);
    }

    #[test]
    fn test_hash_collision_is_not_a_repeat() {
        let mut seen = SeenTexts::default();
        assert!(seen.insert_hashed(7, "x = 1\n"));
        assert!(seen.insert_hashed(7, "x = 2\n"));
        assert!(!seen.insert_hashed(7, "x = 1\n"));
        assert!(seen.insert("y = 1\n"));
        assert!(!seen.insert("y = 1\n"));
    }
}
