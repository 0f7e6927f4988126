//! Lexical scope resolution.
//!
//! One pass over the tree builds an arena of scopes mirroring module, class,
//! function, lambda and comprehension nesting. Each scope maps names to the
//! constructs that bind them. Lookups walk outward through parents the way
//! Python resolves a load: class bodies are only visible from inside the
//! class itself.

use crate::syntax::{NodeRef, SyntaxTree};
use crate::walker::children;
use compact_str::CompactString;
use ruff_python_ast::{self as ast, ExceptHandler, Expr, Stmt};
use ruff_text_size::{Ranged, TextRange};
use rustc_hash::{FxHashMap, FxHashSet};

/// Index of a scope inside its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The module scope; always the first one built.
    pub const MODULE: Self = Self(0);
}

/// The construct that opened a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// The module itself.
    Module,
    /// A class body.
    Class(CompactString),
    /// A function body.
    Function(CompactString),
    /// A lambda body.
    Lambda,
    /// A list/set/dict comprehension or generator expression.
    Comprehension,
}

/// A binding construct, borrowed from the tree it was built from.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    /// `x = ...`, including unpacking targets.
    Assign(&'a ast::StmtAssign),
    /// `x: T = ...`
    AnnAssign(&'a ast::StmtAnnAssign),
    /// `x += ...`
    AugAssign(&'a ast::StmtAugAssign),
    /// `type X = ...`
    TypeAlias(&'a ast::StmtTypeAlias),
    /// `for x in ...`
    For(&'a ast::StmtFor),
    /// `with ... as x`
    With(&'a ast::WithItem),
    /// `def x(...)`
    Function(&'a ast::StmtFunctionDef),
    /// `class X`
    Class(&'a ast::StmtClassDef),
    /// A function or lambda parameter.
    Parameter(&'a ast::Parameter),
    /// `import x` / `from m import x`
    Import(&'a ast::Alias),
    /// `except E as x`
    ExceptHandler(&'a ast::ExceptHandlerExceptHandler),
    /// `(x := ...)`
    NamedExpr(&'a ast::ExprNamed),
    /// `for x in ...` inside a comprehension.
    Comprehension(&'a ast::Comprehension),
}

/// One binding of a name.
#[derive(Debug, Clone, Copy)]
pub struct Definition<'a> {
    /// What bound the name.
    pub binding: Binding<'a>,
    /// Range of the bound identifier.
    pub name_range: TextRange,
}

impl Definition<'_> {
    /// Short construct name, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.binding {
            Binding::Assign(_) => "assignment",
            Binding::AnnAssign(_) => "annotated assignment",
            Binding::AugAssign(_) => "augmented assignment",
            Binding::TypeAlias(_) => "type alias",
            Binding::For(_) => "for target",
            Binding::With(_) => "with item",
            Binding::Function(_) => "function",
            Binding::Class(_) => "class",
            Binding::Parameter(_) => "parameter",
            Binding::Import(_) => "import",
            Binding::ExceptHandler(_) => "except handler",
            Binding::NamedExpr(_) => "named expression",
            Binding::Comprehension(_) => "comprehension target",
        }
    }
}

/// A lexical scope.
#[derive(Debug)]
pub struct Scope<'a> {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    region: TextRange,
    /// Part of `region` that is evaluated in the parent scope.
    excluded: Option<TextRange>,
    children: Vec<ScopeId>,
    bindings: FxHashMap<CompactString, Vec<Definition<'a>>>,
    globals: FxHashSet<CompactString>,
    nonlocals: FxHashSet<CompactString>,
}

impl<'a> Scope<'a> {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, region: TextRange) -> Self {
        Self {
            kind,
            parent,
            region,
            excluded: None,
            children: Vec::new(),
            bindings: FxHashMap::default(),
            globals: FxHashSet::default(),
            nonlocals: FxHashSet::default(),
        }
    }

    /// What opened this scope.
    #[must_use]
    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    /// Source region whose names resolve here first.
    #[must_use]
    pub fn region(&self) -> TextRange {
        self.region
    }

    /// Bindings of `name` made directly in this scope.
    #[must_use]
    pub fn local(&self, name: &str) -> &[Definition<'a>] {
        self.bindings.get(name).map_or(&[], Vec::as_slice)
    }

    fn covers(&self, range: TextRange) -> bool {
        self.region.contains_range(range)
            && !self
                .excluded
                .is_some_and(|excluded| excluded.contains_range(range))
    }
}

/// All scopes of one syntax tree.
#[derive(Debug)]
pub struct ScopeTree<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> ScopeTree<'a> {
    /// Builds the scope tree for `tree` in a single pass.
    #[must_use]
    pub fn build(tree: &'a SyntaxTree) -> Self {
        let mut builder = Builder {
            scopes: vec![Scope::new(ScopeKind::Module, None, tree.range())],
            stack: vec![ScopeId::MODULE],
        };
        builder.visit_body(tree.body());
        let mut scopes = builder.scopes;
        for scope in &mut scopes {
            for definitions in scope.bindings.values_mut() {
                definitions.sort_by_key(|d| d.name_range.start());
            }
        }
        Self { scopes }
    }

    /// Number of scopes, the module included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Always false: the module scope exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The scope with index `id`.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> ScopeRef<'_, 'a> {
        ScopeRef { tree: self, id }
    }

    /// The module scope.
    #[must_use]
    pub fn module(&self) -> ScopeRef<'_, 'a> {
        self.scope(ScopeId::MODULE)
    }

    /// Innermost scope whose region contains `node`.
    ///
    /// The first iterable of a comprehension lies inside the comprehension's
    /// region but resolves in the enclosing scope.
    #[must_use]
    pub fn resolve(&self, node: NodeRef<'_>) -> ScopeRef<'_, 'a> {
        let range = node.range();
        let mut current = ScopeId::MODULE;
        while let Some(&child) = self.scopes[current.0]
            .children
            .iter()
            .find(|child| self.scopes[child.0].covers(range))
        {
            current = child;
        }
        self.scope(current)
    }
}

/// A scope together with the tree it belongs to.
#[derive(Clone, Copy)]
pub struct ScopeRef<'t, 'a> {
    tree: &'t ScopeTree<'a>,
    id: ScopeId,
}

impl<'t, 'a> ScopeRef<'t, 'a> {
    /// Index of this scope.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The scope data.
    #[must_use]
    pub fn scope(&self) -> &'t Scope<'a> {
        &self.tree.scopes[self.id.0]
    }

    /// Enclosing scope, `None` for the module.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.scope().parent.map(|id| self.tree.scope(id))
    }

    /// Definitions visible for a load of `name` from this scope.
    ///
    /// The nearest scope that binds the name wins and all of its bindings are
    /// returned in source order. Unresolved names give an empty slice.
    #[must_use]
    pub fn get_definitions(&self, name: &str) -> &'t [Definition<'a>] {
        let mut current = Some(self.id);
        while let Some(id) = current {
            let scope = &self.tree.scopes[id.0];
            if scope.globals.contains(name) {
                return self.tree.scopes[ScopeId::MODULE.0].local(name);
            }
            let hidden = matches!(scope.kind, ScopeKind::Class(_)) && id != self.id;
            if !hidden {
                let local = scope.local(name);
                if !local.is_empty() {
                    return local;
                }
            }
            current = scope.parent;
        }
        &[]
    }
}

impl std::fmt::Debug for ScopeRef<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRef")
            .field("id", &self.id)
            .field("kind", &self.scope().kind)
            .finish()
    }
}

struct Builder<'a> {
    scopes: Vec<Scope<'a>>,
    stack: Vec<ScopeId>,
}

fn body_range(body: &[Stmt]) -> Option<TextRange> {
    Some(TextRange::new(body.first()?.start(), body.last()?.end()))
}

impl<'a> Builder<'a> {
    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId::MODULE)
    }

    fn push(&mut self, kind: ScopeKind, region: TextRange) {
        let parent = self.current();
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(kind, Some(parent), region));
        self.scopes[parent.0].children.push(id);
        self.stack.push(id);
    }

    fn exclude(&mut self, range: TextRange) {
        let id = self.current();
        self.scopes[id.0].excluded = Some(range);
    }

    fn pop(&mut self) {
        self.stack.pop();
    }

    /// Scope that receives a binding of `name` made in `from`.
    fn target_scope(&self, from: ScopeId, name: &str) -> ScopeId {
        let scope = &self.scopes[from.0];
        if scope.globals.contains(name) {
            return ScopeId::MODULE;
        }
        if scope.nonlocals.contains(name) {
            let mut parent = scope.parent;
            while let Some(id) = parent {
                if matches!(self.scopes[id.0].kind, ScopeKind::Function(_)) {
                    return id;
                }
                parent = self.scopes[id.0].parent;
            }
        }
        from
    }

    fn bind_from(&mut self, from: ScopeId, name: &str, binding: Binding<'a>, name_range: TextRange) {
        let scope = self.target_scope(from, name);
        self.scopes[scope.0]
            .bindings
            .entry(CompactString::from(name))
            .or_default()
            .push(Definition {
                binding,
                name_range,
            });
    }

    fn bind(&mut self, name: &str, binding: Binding<'a>, name_range: TextRange) {
        self.bind_from(self.current(), name, binding, name_range);
    }

    /// Binds every name in an assignment target, looking through tuple,
    /// list and starred unpacking.
    fn bind_target(&mut self, target: &'a Expr, binding: Binding<'a>) {
        match target {
            Expr::Name(name) => self.bind(name.id.as_str(), binding, name.range()),
            Expr::Tuple(tuple) => {
                for elt in &tuple.elts {
                    self.bind_target(elt, binding);
                }
            }
            Expr::List(list) => {
                for elt in &list.elts {
                    self.bind_target(elt, binding);
                }
            }
            Expr::Starred(starred) => self.bind_target(&starred.value, binding),
            _ => {}
        }
    }

    fn bind_parameters(&mut self, parameters: &'a ast::Parameters) {
        let all = parameters
            .posonlyargs
            .iter()
            .chain(&parameters.args)
            .chain(&parameters.kwonlyargs)
            .map(|p| &p.parameter)
            .chain(parameters.vararg.as_deref())
            .chain(parameters.kwarg.as_deref());
        for parameter in all {
            self.bind(
                parameter.name.as_str(),
                Binding::Parameter(parameter),
                parameter.name.range(),
            );
        }
    }

    fn visit_body(&mut self, body: &'a [Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    /// Visits the children of `node` in the current scope.
    fn visit_children(&mut self, node: NodeRef<'a>) {
        for child in children(node) {
            match child {
                NodeRef::Stmt(stmt) => self.visit_stmt(stmt),
                NodeRef::Expr(expr) => self.visit_expr(expr),
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::FunctionDef(func) => {
                for decorator in &func.decorator_list {
                    self.visit_expr(&decorator.expression);
                }
                self.visit_parameter_exprs(&func.parameters);
                if let Some(returns) = &func.returns {
                    self.visit_expr(returns);
                }
                self.bind(func.name.as_str(), Binding::Function(func), func.name.range());
                let region = body_range(&func.body).unwrap_or(func.range());
                self.push(ScopeKind::Function(func.name.as_str().into()), region);
                self.bind_parameters(&func.parameters);
                self.visit_body(&func.body);
                self.pop();
            }
            Stmt::ClassDef(class) => {
                for decorator in &class.decorator_list {
                    self.visit_expr(&decorator.expression);
                }
                if let Some(arguments) = &class.arguments {
                    for arg in &arguments.args {
                        self.visit_expr(arg);
                    }
                    for keyword in &arguments.keywords {
                        self.visit_expr(&keyword.value);
                    }
                }
                self.bind(class.name.as_str(), Binding::Class(class), class.name.range());
                let region = body_range(&class.body).unwrap_or(class.range());
                self.push(ScopeKind::Class(class.name.as_str().into()), region);
                self.visit_body(&class.body);
                self.pop();
            }
            Stmt::Global(global) => {
                let current = self.current();
                for name in &global.names {
                    self.scopes[current.0].globals.insert(name.as_str().into());
                }
            }
            Stmt::Nonlocal(nonlocal) => {
                let current = self.current();
                for name in &nonlocal.names {
                    self.scopes[current.0].nonlocals.insert(name.as_str().into());
                }
            }
            Stmt::Import(import) => {
                for alias in &import.names {
                    self.bind_alias(alias, true);
                }
            }
            Stmt::ImportFrom(import) => {
                for alias in &import.names {
                    self.bind_alias(alias, false);
                }
            }
            _ => {
                self.bind_stmt_targets(stmt);
                self.visit_children(NodeRef::Stmt(stmt));
            }
        }
    }

    fn bind_stmt_targets(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Assign(assign) => {
                for target in &assign.targets {
                    self.bind_target(target, Binding::Assign(assign));
                }
            }
            Stmt::AnnAssign(assign) => self.bind_target(&assign.target, Binding::AnnAssign(assign)),
            Stmt::AugAssign(assign) => self.bind_target(&assign.target, Binding::AugAssign(assign)),
            Stmt::TypeAlias(alias) => self.bind_target(&alias.name, Binding::TypeAlias(alias)),
            Stmt::For(for_stmt) => self.bind_target(&for_stmt.target, Binding::For(for_stmt)),
            Stmt::With(with) => {
                for item in &with.items {
                    if let Some(vars) = &item.optional_vars {
                        self.bind_target(vars, Binding::With(item));
                    }
                }
            }
            Stmt::Try(try_stmt) => {
                for handler in &try_stmt.handlers {
                    let ExceptHandler::ExceptHandler(handler) = handler;
                    if let Some(name) = &handler.name {
                        self.bind(name.as_str(), Binding::ExceptHandler(handler), name.range());
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_alias(&mut self, alias: &'a ast::Alias, dotted: bool) {
        if let Some(asname) = &alias.asname {
            self.bind(asname.as_str(), Binding::Import(alias), asname.range());
            return;
        }
        let name = alias.name.as_str();
        if name == "*" {
            return;
        }
        // `import a.b` binds `a`.
        let bound = if dotted {
            name.split('.').next().unwrap_or(name)
        } else {
            name
        };
        self.bind(bound, Binding::Import(alias), alias.name.range());
    }

    fn visit_parameter_exprs(&mut self, parameters: &'a ast::Parameters) {
        let with_defaults = parameters
            .posonlyargs
            .iter()
            .chain(&parameters.args)
            .chain(&parameters.kwonlyargs);
        for p in with_defaults {
            if let Some(annotation) = &p.parameter.annotation {
                self.visit_expr(annotation);
            }
            if let Some(default) = &p.default {
                self.visit_expr(default);
            }
        }
        for p in parameters.vararg.iter().chain(&parameters.kwarg) {
            if let Some(annotation) = &p.annotation {
                self.visit_expr(annotation);
            }
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Named(named) => {
                self.visit_expr(&named.value);
                // Walrus targets escape comprehension scopes.
                let mut from = self.current();
                while matches!(self.scopes[from.0].kind, ScopeKind::Comprehension) {
                    match self.scopes[from.0].parent {
                        Some(parent) => from = parent,
                        None => break,
                    }
                }
                if let Expr::Name(name) = &*named.target {
                    self.bind_from(from, name.id.as_str(), Binding::NamedExpr(named), name.range());
                }
            }
            Expr::Lambda(lambda) => {
                if let Some(parameters) = &lambda.parameters {
                    self.visit_parameter_exprs(parameters);
                }
                self.push(ScopeKind::Lambda, lambda.body.range());
                if let Some(parameters) = &lambda.parameters {
                    self.bind_parameters(parameters);
                }
                self.visit_expr(&lambda.body);
                self.pop();
            }
            Expr::ListComp(comp) => {
                self.visit_comprehension(expr, &comp.generators, &[&*comp.elt]);
            }
            Expr::SetComp(comp) => {
                self.visit_comprehension(expr, &comp.generators, &[&*comp.elt]);
            }
            Expr::Generator(comp) => {
                self.visit_comprehension(expr, &comp.generators, &[&*comp.elt]);
            }
            Expr::DictComp(comp) => {
                self.visit_comprehension(expr, &comp.generators, &[&*comp.key, &*comp.value]);
            }
            _ => self.visit_children(NodeRef::Expr(expr)),
        }
    }

    fn visit_comprehension(
        &mut self,
        expr: &'a Expr,
        generators: &'a [ast::Comprehension],
        elements: &[&'a Expr],
    ) {
        // The first iterable is evaluated in the enclosing scope.
        if let Some(first) = generators.first() {
            self.visit_expr(&first.iter);
        }
        self.push(ScopeKind::Comprehension, expr.range());
        if let Some(first) = generators.first() {
            self.exclude(first.iter.range());
        }
        for (index, generator) in generators.iter().enumerate() {
            if index > 0 {
                self.visit_expr(&generator.iter);
            }
            self.bind_target(&generator.target, Binding::Comprehension(generator));
            for condition in &generator.ifs {
                self.visit_expr(condition);
            }
        }
        for element in elements {
            self.visit_expr(element);
        }
        self.pop();
    }
}
