use crate::rules::{Action, Context, Provider, Rule};
use crate::syntax::NodeRef;
use ruff_python_ast::Stmt;

/// Erases `pass` when its block has other statements.
pub struct RemoveRedundantPass;

impl Rule for RemoveRedundantPass {
    fn name(&self) -> &'static str {
        "RemoveRedundantPass"
    }

    fn description(&self) -> &'static str {
        "Remove `pass` from blocks that have other statements"
    }

    fn context_providers(&self) -> &'static [Provider] {
        &[Provider::Ancestry]
    }

    fn match_node(&self, node: NodeRef<'_>, context: &Context<'_>) -> Option<Action> {
        let NodeRef::Stmt(stmt @ Stmt::Pass(_)) = node else {
            return None;
        };
        let siblings = context.ancestry()?.siblings(stmt)?;
        if siblings.len() < 2 {
            return None;
        }
        Some(Action::erase(stmt))
    }
}
