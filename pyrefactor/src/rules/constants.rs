use crate::rules::{Action, Context, Provider, Rule};
use crate::scope::Binding;
use crate::synth::{Constant, ReplacementNode};
use crate::syntax::NodeRef;
use ruff_python_ast::{Expr, ExprContext, Operator};
use ruff_text_size::Ranged;

/// Folds `constant + constant` and `constant - constant`.
///
/// Integers, floats and booleans fold numerically (booleans count as 0 and
/// 1); strings concatenate. Overflowing integers and non-finite floats are
/// left alone.
pub struct FoldConstants;

impl Rule for FoldConstants {
    fn name(&self) -> &'static str {
        "FoldConstants"
    }

    fn description(&self) -> &'static str {
        "Fold `+` and `-` between literal constants"
    }

    fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
        let NodeRef::Expr(Expr::BinOp(binop)) = node else {
            return None;
        };
        let left = Constant::from_expr(&binop.left)?;
        let right = Constant::from_expr(&binop.right)?;
        let folded = fold(binop.op, left, right)?;
        Some(Action::replace(node, folded.into()))
    }
}

/// A numeric view of a constant.
enum Numeric {
    Int(i64),
    Float(f64),
}

fn numeric(constant: &Constant) -> Option<Numeric> {
    match constant {
        Constant::Bool(value) => Some(Numeric::Int(i64::from(*value))),
        Constant::Int(value) => Some(Numeric::Int(*value)),
        Constant::Float(value) => Some(Numeric::Float(*value)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_float(value: &Numeric) -> f64 {
    match value {
        Numeric::Int(value) => *value as f64,
        Numeric::Float(value) => *value,
    }
}

fn fold(op: Operator, left: Constant, right: Constant) -> Option<Constant> {
    if let (Constant::Str(left), Constant::Str(right)) = (&left, &right) {
        return (op == Operator::Add).then(|| Constant::Str(format!("{left}{right}")));
    }
    let (left, right) = (numeric(&left)?, numeric(&right)?);
    match (op, &left, &right) {
        (Operator::Add, Numeric::Int(a), Numeric::Int(b)) => a.checked_add(*b).map(Constant::Int),
        (Operator::Sub, Numeric::Int(a), Numeric::Int(b)) => a.checked_sub(*b).map(Constant::Int),
        (Operator::Add | Operator::Sub, _, _) => {
            let (a, b) = (as_float(&left), as_float(&right));
            let value = if op == Operator::Add { a + b } else { a - b };
            value.is_finite().then_some(Constant::Float(value))
        }
        _ => None,
    }
}

/// Replaces a loaded name with its value when the name has exactly one
/// definition and that definition assigns a literal.
pub struct PropagateConstants;

impl Rule for PropagateConstants {
    fn name(&self) -> &'static str {
        "PropagateConstants"
    }

    fn description(&self) -> &'static str {
        "Inline names bound once to a literal"
    }

    fn context_providers(&self) -> &'static [Provider] {
        &[Provider::Scope]
    }

    fn match_node(&self, node: NodeRef<'_>, context: &Context<'_>) -> Option<Action> {
        let NodeRef::Expr(Expr::Name(name)) = node else {
            return None;
        };
        if !matches!(name.ctx, ExprContext::Load) {
            return None;
        }
        let scope = context.scope()?.resolve(node);
        let [definition] = scope.get_definitions(name.id.as_str()) else {
            return None;
        };
        let Binding::Assign(assign) = definition.binding else {
            return None;
        };
        // Plain `name = literal`; unpacking targets are skipped.
        let plain = assign
            .targets
            .iter()
            .any(|target| matches!(target, Expr::Name(_)) && target.range() == definition.name_range);
        if !plain {
            return None;
        }
        // A load that runs before its own scope's assignment stays a name.
        let same_scope = !scope.scope().local(name.id.as_str()).is_empty();
        if same_scope && assign.start() > name.start() {
            return None;
        }
        Constant::from_expr(&assign.value)?;
        Some(Action::replace(node, ReplacementNode::copy_of(&assign.value)))
    }
}
