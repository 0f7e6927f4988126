//! End-to-end properties of the rewrite loop.
#![allow(clippy::unwrap_used)]

use pyrefactor::error::{NonTerminationReason, RefactorError};
use pyrefactor::rules::registry::get_builtin_rules;
use pyrefactor::rules::{Action, Context, Provider, Rule};
use pyrefactor::session::{RunStatus, Session, SessionConfig};
use pyrefactor::synth::{Constant, ReplacementNode};
use pyrefactor::syntax::NodeRef;
use ruff_python_ast::{Expr, Operator, Stmt};

fn builtin() -> Session {
    Session::new(get_builtin_rules())
}

/// Inserts `trace()` before every `return` that is not already preceded by it.
struct TraceReturns;

impl Rule for TraceReturns {
    fn name(&self) -> &'static str {
        "TraceReturns"
    }
    fn description(&self) -> &'static str {
        "call trace() before returning"
    }
    fn context_providers(&self) -> &'static [Provider] {
        &[Provider::Ancestry]
    }
    fn match_node(&self, node: NodeRef<'_>, context: &Context<'_>) -> Option<Action> {
        let NodeRef::Stmt(stmt @ Stmt::Return(_)) = node else {
            return None;
        };
        let siblings = context.ancestry()?.siblings(stmt)?;
        let position = siblings.iter().position(|s| std::ptr::eq(s, stmt))?;
        if let Some(Stmt::Expr(previous)) = position.checked_sub(1).map(|i| &siblings[i]) {
            if context.text(&*previous.value) == "trace()" {
                return None;
            }
        }
        let call = ReplacementNode::call(ReplacementNode::name("trace"), Vec::new());
        Some(Action::insert_before(stmt, call))
    }
}

/// Inserts `<name>_seen = True` after every plain assignment to `<name>`.
struct MarkAssignments;

impl Rule for MarkAssignments {
    fn name(&self) -> &'static str {
        "MarkAssignments"
    }
    fn description(&self) -> &'static str {
        "flag assignments"
    }
    fn context_providers(&self) -> &'static [Provider] {
        &[Provider::Ancestry]
    }
    fn match_node(&self, node: NodeRef<'_>, context: &Context<'_>) -> Option<Action> {
        let NodeRef::Stmt(stmt @ Stmt::Assign(assign)) = node else {
            return None;
        };
        let [Expr::Name(target)] = assign.targets.as_slice() else {
            return None;
        };
        let name = target.id.as_str();
        if name.ends_with("_seen") {
            return None;
        }
        let flag = format!("{name}_seen");
        let siblings = context.ancestry()?.siblings(stmt)?;
        let position = siblings.iter().position(|s| std::ptr::eq(s, stmt))?;
        if let Some(Stmt::Assign(next)) = siblings.get(position + 1) {
            if matches!(next.targets.as_slice(), [Expr::Name(n)] if n.id.as_str() == flag) {
                return None;
            }
        }
        Some(Action::insert_after(
            stmt,
            ReplacementNode::assign(
                ReplacementNode::name(flag),
                Constant::Bool(true).into(),
            ),
        ))
    }
}

/// Erases every call to `debug(...)` used as a statement.
struct DropDebugCalls;

impl Rule for DropDebugCalls {
    fn name(&self) -> &'static str {
        "DropDebugCalls"
    }
    fn description(&self) -> &'static str {
        "remove debug() statements"
    }
    fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
        let NodeRef::Stmt(stmt @ Stmt::Expr(expr)) = node else {
            return None;
        };
        let Expr::Call(call) = &*expr.value else {
            return None;
        };
        let Expr::Name(func) = &*call.func else {
            return None;
        };
        (func.id.as_str() == "debug").then(|| Action::erase(stmt))
    }
}

/// Rewrites `x` to `x + 0` forever.
struct AddZero;

impl Rule for AddZero {
    fn name(&self) -> &'static str {
        "AddZero"
    }
    fn description(&self) -> &'static str {
        "x -> x + 0"
    }
    fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
        let NodeRef::Stmt(Stmt::Return(ret)) = node else {
            return None;
        };
        let value = ret.value.as_deref()?;
        Some(Action::replace(
            NodeRef::Expr(value),
            ReplacementNode::bin_op(
                ReplacementNode::copy_of(value),
                Operator::Add,
                ReplacementNode::int(0),
            ),
        ))
    }
}

/// Replaces `if True:` around a single statement with that statement.
struct UnwrapIfTrue;

impl Rule for UnwrapIfTrue {
    fn name(&self) -> &'static str {
        "UnwrapIfTrue"
    }
    fn description(&self) -> &'static str {
        "if True: x -> x"
    }
    fn match_node(&self, node: NodeRef<'_>, _context: &Context<'_>) -> Option<Action> {
        let NodeRef::Stmt(stmt @ Stmt::If(branch)) = node else {
            return None;
        };
        if !branch.elif_else_clauses.is_empty() {
            return None;
        }
        let Expr::BooleanLiteral(test) = &*branch.test else {
            return None;
        };
        let [only] = branch.body.as_slice() else {
            return None;
        };
        test.value
            .then(|| Action::replace(NodeRef::Stmt(stmt), ReplacementNode::copy_of_stmt(only)))
    }
}

#[test]
fn test_no_match_returns_input_verbatim() {
    let source = "import os\n\n\n# comment\ndef  f( a ,b ):\n    return a*b   # product\n";
    let outcome = builtin().run(source).unwrap();
    assert_eq!(outcome.source, source);
    assert_eq!(outcome.status(), RunStatus::Converged);
    assert_eq!(outcome.iterations, 0);
}

#[test]
fn test_tau_example() {
    let outcome = builtin().run("TAU = 3.14 + 3.14").unwrap();
    assert_eq!(outcome.source, "TAU = 6.28");
}

#[test]
fn test_bytes_outside_match_are_preserved() {
    let source = "# header\nx = [1,2,  3]  # odd spacing\ny = 10 - 4   # fold me\n\n\nz = 'é'\n";
    let outcome = builtin().run(source).unwrap();
    assert_eq!(
        outcome.source,
        "# header\nx = [1,2,  3]  # odd spacing\ny = 6   # fold me\n\n\nz = 'é'\n"
    );
    let change = &outcome.applied[0];
    assert_eq!(&source[..change.start], &outcome.source[..change.start]);
}

#[test]
fn test_output_is_a_fixed_point() {
    let source = "\
BASE = 10
OFFSET = 2

class Config:
    \"\"\"Settings.\"\"\"
    pass

def limit():
    # upper bound
    return BASE + OFFSET - 1
";
    let first = builtin().run(source).unwrap();
    assert_eq!(
        first.source,
        "\
BASE = 10
OFFSET = 2

class Config:
    \"\"\"Settings.\"\"\"

def limit():
    # upper bound
    return 11
"
    );
    let second = builtin().run(&first.source).unwrap();
    assert_eq!(second.source, first.source);
    assert_eq!(second.iterations, 0);
}

#[test]
fn test_insert_before_goes_above_comments() {
    let source = "def f(x):\n    y = x\n    # done\n    return y\n";
    let outcome = Session::new(vec![Box::new(TraceReturns)]).run(source).unwrap();
    assert_eq!(
        outcome.source,
        "def f(x):\n    y = x\n    trace()\n    # done\n    return y\n"
    );
    assert_eq!(outcome.applied[0].action, "insert_before");
}

#[test]
fn test_insert_after_keeps_trailing_comment() {
    let source = "a = 1  # first\nif a:\n    b = 2\n";
    let outcome = Session::new(vec![Box::new(MarkAssignments)]).run(source).unwrap();
    assert_eq!(
        outcome.source,
        "a = 1  # first\na_seen = True\nif a:\n    b = 2\n    b_seen = True\n"
    );
    assert_eq!(outcome.status(), RunStatus::Converged);
}

#[test]
fn test_erase_statements() {
    let source = "\
def f():
    debug('start')
    work()
    debug('end')

def g():
    debug('only')
";
    let outcome = Session::new(vec![Box::new(DropDebugCalls)]).run(source).unwrap();
    assert_eq!(
        outcome.source,
        "\
def f():
    work()

def g():
    pass
"
    );
}

#[test]
fn test_erase_on_shared_line() {
    let outcome = Session::new(vec![Box::new(DropDebugCalls)])
        .run("x = 1; debug(x); y = 2\n")
        .unwrap();
    assert_eq!(outcome.source, "x = 1; y = 2\n");
}

#[test]
fn test_runaway_rule_hits_the_cap() {
    let session = Session::new(vec![Box::new(AddZero)]).with_config(SessionConfig {
        max_iterations: Some(5),
        ..SessionConfig::default()
    });
    let outcome = session.run("def f(x):\n    return x\n").unwrap();
    assert_eq!(outcome.source, "def f(x):\n    return x + 0 + 0 + 0 + 0 + 0\n");
    let error = outcome.non_termination.unwrap();
    assert_eq!(error.reason, NonTerminationReason::IterationLimit);
    assert_eq!(error.rule, "AddZero");
    assert_eq!(outcome.applied.len(), 5);
}

#[test]
fn test_default_cap_is_size_based() {
    let outcome = Session::new(vec![Box::new(AddZero)])
        .run("def f(x):\n    return x\n")
        .unwrap();
    let error = outcome.non_termination.unwrap();
    assert_eq!(error.reason, NonTerminationReason::IterationLimit);
    assert_eq!(error.iterations, 64);
}

#[test]
fn test_invalid_input_is_a_parse_error() {
    let Err(RefactorError::Parse(error)) = builtin().run("x = 1\ny = = 2\n") else {
        panic!("expected a parse error");
    };
    assert_eq!(error.line, 2);
}

#[test]
fn test_crlf_line_endings() {
    let outcome = Session::new(vec![Box::new(MarkAssignments)])
        .run("x = 1\r\ny = x\r\n")
        .unwrap();
    assert_eq!(outcome.source, "x = 1\r\nx_seen = True\r\ny = x\r\ny_seen = True\r\n");
}

#[test]
fn test_statement_copy_is_reindented() {
    let source = "def f(x):\n    if True:\n        if x:\n            return 1  # one\n    return 0\n";
    let outcome = Session::new(vec![Box::new(UnwrapIfTrue)]).run(source).unwrap();
    assert_eq!(
        outcome.source,
        "def f(x):\n    if x:\n        return 1  # one\n    return 0\n"
    );
    assert_eq!(outcome.iterations, 1);
}
