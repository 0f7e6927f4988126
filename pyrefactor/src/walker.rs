//! Deterministic tree traversal and rule dispatch.
//!
//! Every statement and expression is visited in pre-order: a parent before its
//! children, children in source order. The same traversal backs the matcher,
//! node location and the ancestry provider, so they always agree on order.

use crate::rules::{Action, Context, Rule};
use crate::syntax::{NodeRef, SyntaxTree};
use ruff_python_ast::{self as ast, ExceptHandler, Expr, Stmt};
use ruff_text_size::{Ranged, TextRange};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::ops::ControlFlow;

/// Direct children of a node, in source order.
///
/// Only statements and expressions are returned; parameters, keywords,
/// aliases and handlers are looked through, so their expressions and bodies
/// are still reached.
#[must_use]
pub fn children(node: NodeRef<'_>) -> SmallVec<[NodeRef<'_>; 8]> {
    let mut out = SmallVec::new();
    match node {
        NodeRef::Stmt(stmt) => stmt_children(stmt, &mut out),
        NodeRef::Expr(expr) => expr_children(expr, &mut out),
    }
    out
}

fn push_body<'a>(body: &'a [Stmt], out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    out.extend(body.iter().map(NodeRef::Stmt));
}

fn push_opt<'a>(expr: Option<&'a Expr>, out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    if let Some(expr) = expr {
        out.push(NodeRef::Expr(expr));
    }
}

fn push_parameters<'a>(parameters: &'a ast::Parameters, out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    let with_defaults = parameters
        .posonlyargs
        .iter()
        .chain(&parameters.args)
        .map(|p| (&p.parameter, p.default.as_deref()));
    for (parameter, default) in with_defaults {
        push_opt(parameter.annotation.as_deref(), out);
        push_opt(default, out);
    }
    if let Some(vararg) = &parameters.vararg {
        push_opt(vararg.annotation.as_deref(), out);
    }
    for p in &parameters.kwonlyargs {
        push_opt(p.parameter.annotation.as_deref(), out);
        push_opt(p.default.as_deref(), out);
    }
    if let Some(kwarg) = &parameters.kwarg {
        push_opt(kwarg.annotation.as_deref(), out);
    }
}

fn push_arguments<'a>(arguments: &'a ast::Arguments, out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    out.extend(arguments.args.iter().map(NodeRef::Expr));
    out.extend(arguments.keywords.iter().map(|k| NodeRef::Expr(&k.value)));
}

fn push_pattern<'a>(pattern: &'a ast::Pattern, out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    match pattern {
        ast::Pattern::MatchValue(node) => out.push(NodeRef::Expr(&node.value)),
        ast::Pattern::MatchSequence(node) => {
            for pattern in &node.patterns {
                push_pattern(pattern, out);
            }
        }
        ast::Pattern::MatchOr(node) => {
            for pattern in &node.patterns {
                push_pattern(pattern, out);
            }
        }
        ast::Pattern::MatchMapping(node) => {
            for (key, pattern) in node.keys.iter().zip(&node.patterns) {
                out.push(NodeRef::Expr(key));
                push_pattern(pattern, out);
            }
        }
        ast::Pattern::MatchClass(node) => {
            out.push(NodeRef::Expr(&node.cls));
            for pattern in &node.arguments.patterns {
                push_pattern(pattern, out);
            }
            for keyword in &node.arguments.keywords {
                push_pattern(&keyword.pattern, out);
            }
        }
        ast::Pattern::MatchAs(node) => {
            if let Some(pattern) = &node.pattern {
                push_pattern(pattern, out);
            }
        }
        ast::Pattern::MatchSingleton(_) | ast::Pattern::MatchStar(_) => {}
    }
}

fn push_interpolations<'a>(
    elements: &'a ast::InterpolatedStringElements,
    out: &mut SmallVec<[NodeRef<'a>; 8]>,
) {
    for element in elements {
        if let ast::InterpolatedStringElement::Interpolation(interpolation) = element {
            out.push(NodeRef::Expr(&interpolation.expression));
            if let Some(spec) = &interpolation.format_spec {
                push_interpolations(&spec.elements, out);
            }
        }
    }
}

fn push_generators<'a>(
    generators: &'a [ast::Comprehension],
    out: &mut SmallVec<[NodeRef<'a>; 8]>,
) {
    for generator in generators {
        out.push(NodeRef::Expr(&generator.target));
        out.push(NodeRef::Expr(&generator.iter));
        out.extend(generator.ifs.iter().map(NodeRef::Expr));
    }
}

fn stmt_children<'a>(stmt: &'a Stmt, out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    match stmt {
        Stmt::FunctionDef(node) => {
            out.extend(node.decorator_list.iter().map(|d| NodeRef::Expr(&d.expression)));
            push_parameters(&node.parameters, out);
            push_opt(node.returns.as_deref(), out);
            push_body(&node.body, out);
        }
        Stmt::ClassDef(node) => {
            out.extend(node.decorator_list.iter().map(|d| NodeRef::Expr(&d.expression)));
            if let Some(arguments) = &node.arguments {
                push_arguments(arguments, out);
            }
            push_body(&node.body, out);
        }
        Stmt::Return(node) => push_opt(node.value.as_deref(), out),
        Stmt::Delete(node) => out.extend(node.targets.iter().map(NodeRef::Expr)),
        Stmt::Assign(node) => {
            out.extend(node.targets.iter().map(NodeRef::Expr));
            out.push(NodeRef::Expr(&node.value));
        }
        Stmt::AugAssign(node) => {
            out.push(NodeRef::Expr(&node.target));
            out.push(NodeRef::Expr(&node.value));
        }
        Stmt::AnnAssign(node) => {
            out.push(NodeRef::Expr(&node.target));
            out.push(NodeRef::Expr(&node.annotation));
            push_opt(node.value.as_deref(), out);
        }
        Stmt::TypeAlias(node) => {
            out.push(NodeRef::Expr(&node.name));
            out.push(NodeRef::Expr(&node.value));
        }
        Stmt::For(node) => {
            out.push(NodeRef::Expr(&node.target));
            out.push(NodeRef::Expr(&node.iter));
            push_body(&node.body, out);
            push_body(&node.orelse, out);
        }
        Stmt::While(node) => {
            out.push(NodeRef::Expr(&node.test));
            push_body(&node.body, out);
            push_body(&node.orelse, out);
        }
        Stmt::If(node) => {
            out.push(NodeRef::Expr(&node.test));
            push_body(&node.body, out);
            for clause in &node.elif_else_clauses {
                push_opt(clause.test.as_ref(), out);
                push_body(&clause.body, out);
            }
        }
        Stmt::With(node) => {
            for item in &node.items {
                out.push(NodeRef::Expr(&item.context_expr));
                push_opt(item.optional_vars.as_deref(), out);
            }
            push_body(&node.body, out);
        }
        Stmt::Match(node) => {
            out.push(NodeRef::Expr(&node.subject));
            for case in &node.cases {
                push_pattern(&case.pattern, out);
                push_opt(case.guard.as_deref(), out);
                push_body(&case.body, out);
            }
        }
        Stmt::Raise(node) => {
            push_opt(node.exc.as_deref(), out);
            push_opt(node.cause.as_deref(), out);
        }
        Stmt::Try(node) => {
            push_body(&node.body, out);
            for handler in &node.handlers {
                let ExceptHandler::ExceptHandler(handler) = handler;
                push_opt(handler.type_.as_deref(), out);
                push_body(&handler.body, out);
            }
            push_body(&node.orelse, out);
            push_body(&node.finalbody, out);
        }
        Stmt::Assert(node) => {
            out.push(NodeRef::Expr(&node.test));
            push_opt(node.msg.as_deref(), out);
        }
        Stmt::Expr(node) => out.push(NodeRef::Expr(&node.value)),
        Stmt::Import(_)
        | Stmt::ImportFrom(_)
        | Stmt::Global(_)
        | Stmt::Nonlocal(_)
        | Stmt::Pass(_)
        | Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::IpyEscapeCommand(_) => {}
    }
}

fn expr_children<'a>(expr: &'a Expr, out: &mut SmallVec<[NodeRef<'a>; 8]>) {
    match expr {
        Expr::BoolOp(node) => out.extend(node.values.iter().map(NodeRef::Expr)),
        Expr::Named(node) => {
            out.push(NodeRef::Expr(&node.target));
            out.push(NodeRef::Expr(&node.value));
        }
        Expr::BinOp(node) => {
            out.push(NodeRef::Expr(&node.left));
            out.push(NodeRef::Expr(&node.right));
        }
        Expr::UnaryOp(node) => out.push(NodeRef::Expr(&node.operand)),
        Expr::Lambda(node) => {
            if let Some(parameters) = &node.parameters {
                push_parameters(parameters, out);
            }
            out.push(NodeRef::Expr(&node.body));
        }
        Expr::If(node) => {
            out.push(NodeRef::Expr(&node.body));
            out.push(NodeRef::Expr(&node.test));
            out.push(NodeRef::Expr(&node.orelse));
        }
        Expr::Dict(node) => {
            for item in &node.items {
                push_opt(item.key.as_ref(), out);
                out.push(NodeRef::Expr(&item.value));
            }
        }
        Expr::Set(node) => out.extend(node.elts.iter().map(NodeRef::Expr)),
        Expr::List(node) => out.extend(node.elts.iter().map(NodeRef::Expr)),
        Expr::Tuple(node) => out.extend(node.elts.iter().map(NodeRef::Expr)),
        Expr::ListComp(node) => {
            out.push(NodeRef::Expr(&node.elt));
            push_generators(&node.generators, out);
        }
        Expr::SetComp(node) => {
            out.push(NodeRef::Expr(&node.elt));
            push_generators(&node.generators, out);
        }
        Expr::Generator(node) => {
            out.push(NodeRef::Expr(&node.elt));
            push_generators(&node.generators, out);
        }
        Expr::DictComp(node) => {
            out.push(NodeRef::Expr(&node.key));
            out.push(NodeRef::Expr(&node.value));
            push_generators(&node.generators, out);
        }
        Expr::Await(node) => out.push(NodeRef::Expr(&node.value)),
        Expr::Yield(node) => push_opt(node.value.as_deref(), out),
        Expr::YieldFrom(node) => out.push(NodeRef::Expr(&node.value)),
        Expr::Compare(node) => {
            out.push(NodeRef::Expr(&node.left));
            out.extend(node.comparators.iter().map(NodeRef::Expr));
        }
        Expr::Call(node) => {
            out.push(NodeRef::Expr(&node.func));
            push_arguments(&node.arguments, out);
        }
        Expr::Attribute(node) => out.push(NodeRef::Expr(&node.value)),
        Expr::Subscript(node) => {
            out.push(NodeRef::Expr(&node.value));
            out.push(NodeRef::Expr(&node.slice));
        }
        Expr::Starred(node) => out.push(NodeRef::Expr(&node.value)),
        Expr::Slice(node) => {
            push_opt(node.lower.as_deref(), out);
            push_opt(node.upper.as_deref(), out);
            push_opt(node.step.as_deref(), out);
        }
        Expr::FString(node) => {
            for part in &node.value {
                if let ast::FStringPart::FString(fstring) = part {
                    push_interpolations(&fstring.elements, out);
                }
            }
        }
        // t-string internals are kept opaque.
        Expr::TString(_)
        | Expr::StringLiteral(_)
        | Expr::BytesLiteral(_)
        | Expr::NumberLiteral(_)
        | Expr::BooleanLiteral(_)
        | Expr::NoneLiteral(_)
        | Expr::EllipsisLiteral(_)
        | Expr::Name(_)
        | Expr::IpyEscapeCommand(_) => {}
    }
}

/// Pre-order walk of `node` and its descendants. `f` receives each node and
/// its parent, and can stop the walk by breaking.
pub fn walk<'a, B>(
    node: NodeRef<'a>,
    parent: Option<NodeRef<'a>>,
    f: &mut impl FnMut(NodeRef<'a>, Option<NodeRef<'a>>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    f(node, parent)?;
    for child in children(node) {
        walk(child, Some(node), f)?;
    }
    ControlFlow::Continue(())
}

/// Pre-order walk over a statement list (top-level statements have no parent).
pub fn walk_body<'a, B>(
    body: &'a [Stmt],
    f: &mut impl FnMut(NodeRef<'a>, Option<NodeRef<'a>>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    for stmt in body {
        walk(NodeRef::Stmt(stmt), None, f)?;
    }
    ControlFlow::Continue(())
}

/// Visits every node under `body` without early exit.
pub fn for_each_node<'a>(body: &'a [Stmt], mut f: impl FnMut(NodeRef<'a>, Option<NodeRef<'a>>)) {
    let _ = walk_body::<()>(body, &mut |node, parent| {
        f(node, parent);
        ControlFlow::Continue(())
    });
}

/// A node located by range, with its parent.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    /// The node.
    pub node: NodeRef<'a>,
    /// Its parent, `None` for top-level statements.
    pub parent: Option<NodeRef<'a>>,
}

/// Finds the outermost node of the requested category whose range is exactly
/// `range`.
#[must_use]
pub fn locate(body: &[Stmt], range: TextRange, statement: bool) -> Option<Located<'_>> {
    let flow = walk_body(body, &mut |node, parent| {
        if node.range() == range && node.is_stmt() == statement {
            ControlFlow::Break(Located { node, parent })
        } else {
            ControlFlow::Continue(())
        }
    });
    match flow {
        ControlFlow::Break(located) => Some(located),
        ControlFlow::Continue(()) => None,
    }
}

/// Statement lists directly owned by `stmt`.
#[must_use]
pub fn bodies(stmt: &Stmt) -> SmallVec<[&[Stmt]; 4]> {
    let mut out: SmallVec<[&[Stmt]; 4]> = SmallVec::new();
    match stmt {
        Stmt::FunctionDef(node) => out.push(&node.body),
        Stmt::ClassDef(node) => out.push(&node.body),
        Stmt::For(node) => {
            out.push(&node.body);
            out.push(&node.orelse);
        }
        Stmt::While(node) => {
            out.push(&node.body);
            out.push(&node.orelse);
        }
        Stmt::If(node) => {
            out.push(&node.body);
            out.extend(node.elif_else_clauses.iter().map(|c| c.body.as_slice()));
        }
        Stmt::With(node) => out.push(&node.body),
        Stmt::Match(node) => out.extend(node.cases.iter().map(|c| c.body.as_slice())),
        Stmt::Try(node) => {
            out.push(&node.body);
            for handler in &node.handlers {
                let ExceptHandler::ExceptHandler(handler) = handler;
                out.push(&handler.body);
            }
            out.push(&node.orelse);
            out.push(&node.finalbody);
        }
        _ => {}
    }
    out
}

/// Identity key for a node within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey(usize, bool);

impl NodeKey {
    fn of(node: NodeRef<'_>) -> Self {
        match node {
            NodeRef::Stmt(stmt) => Self(std::ptr::from_ref(stmt) as usize, true),
            NodeRef::Expr(expr) => Self(std::ptr::from_ref(expr) as usize, false),
        }
    }
}

/// Parent links for every node of one tree.
pub struct Ancestry<'a> {
    module: &'a [Stmt],
    parents: FxHashMap<NodeKey, NodeRef<'a>>,
}

impl<'a> Ancestry<'a> {
    /// Records the parent of every node in `tree`.
    #[must_use]
    pub fn build(tree: &'a SyntaxTree) -> Self {
        let mut parents = FxHashMap::default();
        for_each_node(tree.body(), |node, parent| {
            if let Some(parent) = parent {
                parents.insert(NodeKey::of(node), parent);
            }
        });
        Self {
            module: tree.body(),
            parents,
        }
    }

    /// Parent of `node`; `None` for top-level statements.
    #[must_use]
    pub fn parent(&self, node: NodeRef<'_>) -> Option<NodeRef<'a>> {
        self.parents.get(&NodeKey::of(node)).copied()
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors<'s>(&'s self, node: NodeRef<'_>) -> impl Iterator<Item = NodeRef<'a>> + 's {
        std::iter::successors(self.parent(node), move |current| self.parent(*current))
    }

    /// The statement list that holds `stmt`.
    #[must_use]
    pub fn siblings(&self, stmt: &Stmt) -> Option<&'a [Stmt]> {
        match self.parent(NodeRef::Stmt(stmt)) {
            None => self
                .module
                .iter()
                .any(|s| std::ptr::eq(s, stmt))
                .then_some(self.module),
            Some(NodeRef::Stmt(parent)) => bodies(parent)
                .into_iter()
                .find(|body| body.iter().any(|s| std::ptr::eq(s, stmt))),
            Some(NodeRef::Expr(_)) => None,
        }
    }
}

/// One rule match: which rule matched which node, and what it wants done.
#[derive(Debug)]
pub struct Match<'a> {
    /// Name of the matching rule.
    pub rule: &'static str,
    /// The node the rule accepted.
    pub node: NodeRef<'a>,
    /// The requested rewrite.
    pub action: Action,
}

/// Offers nodes to rules in registration order.
pub struct Walker<'r> {
    rules: &'r [Box<dyn Rule>],
}

impl<'r> Walker<'r> {
    /// Creates a walker over an ordered rule list.
    #[must_use]
    pub fn new(rules: &'r [Box<dyn Rule>]) -> Self {
        Self { rules }
    }

    /// The first rule (in registration order) that accepts `node`.
    fn offer<'a>(&self, node: NodeRef<'a>, context: &Context<'_>) -> Option<Match<'a>> {
        self.rules.iter().find_map(|rule| {
            rule.match_node(node, context).map(|action| Match {
                rule: rule.name(),
                node,
                action,
            })
        })
    }

    /// First match in traversal order.
    #[must_use]
    pub fn first_match<'a>(&self, tree: &'a SyntaxTree, context: &Context<'_>) -> Option<Match<'a>> {
        let flow = walk_body(tree.body(), &mut |node, _| match self.offer(node, context) {
            Some(found) => ControlFlow::Break(found),
            None => ControlFlow::Continue(()),
        });
        match flow {
            ControlFlow::Break(found) => Some(found),
            ControlFlow::Continue(()) => None,
        }
    }

    /// One match per node, for every node some rule accepts.
    #[must_use]
    pub fn collect_matches<'a>(&self, tree: &'a SyntaxTree, context: &Context<'_>) -> Vec<Match<'a>> {
        let mut found = Vec::new();
        for_each_node(tree.body(), |node, _| {
            if let Some(m) = self.offer(node, context) {
                found.push(m);
            }
        });
        found
    }
}
