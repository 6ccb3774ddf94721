//! The resolution and typing pass.
//!
//! Runs after collection, against the frozen symbol table. One traversal
//! per compilation unit annotates every expression node with a `TypeId`
//! and every statement with a reachability flag, both in side tables
//! keyed by `NodeId`. A failed node gets the error type, which converts
//! to everything, so one root cause produces one diagnostic instead of a
//! cascade.

mod expr;
mod stmt;

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{
    CompilationUnit, Item, Member, MethodDecl, MethodKind, Modifiers, NamespaceDecl, ParsedType,
    ParsedTypeKind, Stmt, StmtKind, TypeDecl, TypeDeclKind,
};
use csf_ir::{Name, NodeId, Span, StringInterner};
use csf_types::{
    classify_conversion, ConversionContext, TypeData, TypeDefId, TypeId, TypePool,
};
use rustc_hash::FxHashMap;

use crate::collect::{flag_bounds, ImportScope};
use crate::context::CheckContext;
use crate::dynamic::DynamicCallSite;
use crate::external::MetadataProvider;
use crate::resolve::{join_path, TypeResolver};
use crate::scope::{Local, LocalKind, LocalScopes};
use crate::symbol::GlobalSymbols;

/// Checker configuration, from the compilation options.
#[derive(Clone, Debug, Default)]
pub struct SemaOptions {
    /// `--unsafe`: permits `unsafe` blocks, pointers, `sizeof`.
    pub unsafe_allowed: bool,
    /// Whether arithmetic outside `checked`/`unchecked` is checked.
    pub checked_by_default: bool,
}

/// Everything the checker produced for one compilation unit.
pub struct UnitAnalysis {
    /// Expression type per `NodeId`; `TypeId::NONE` for ids that are not
    /// expressions.
    pub expr_types: Vec<TypeId>,
    /// Statement reachability per `NodeId`; statements never visited
    /// stay `true`.
    pub reachable: Vec<bool>,
    /// Deferred-binding descriptors for `dynamic` operations.
    pub dynamic_sites: Vec<(NodeId, DynamicCallSite)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitAnalysis {
    /// The resolved type of an expression node.
    pub fn type_of(&self, id: NodeId) -> TypeId {
        self.expr_types
            .get(id.raw() as usize)
            .copied()
            .unwrap_or(TypeId::NONE)
    }

    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.reachable.get(id.raw() as usize).copied().unwrap_or(true)
    }
}

/// Resolve and type one compilation unit against the frozen symbols.
#[tracing::instrument(level = "debug", skip_all)]
pub fn check_unit(
    unit: &CompilationUnit,
    symbols: &GlobalSymbols,
    pool: &TypePool,
    interner: &StringInterner,
    metadata: &dyn MetadataProvider,
    options: &SemaOptions,
) -> UnitAnalysis {
    let mut checker = Checker {
        pool,
        interner,
        symbols,
        metadata,
        options: options.clone(),
        diagnostics: Vec::new(),
        expr_types: vec![TypeId::NONE; unit.node_count as usize],
        reachable: vec![true; unit.node_count as usize],
        dynamic_sites: Vec::new(),
        scopes: LocalScopes::new(),
        overflow_spans: Vec::new(),
        names: WellKnown::new(interner),
        method: MethodEnv::none(),
        resolver: None,
    };
    let scope = ImportScope::from_usings(interner, &unit.usings);
    checker.check_items(&unit.items, &[], &scope);
    UnitAnalysis {
        expr_types: checker.expr_types,
        reachable: checker.reachable,
        dynamic_sites: checker.dynamic_sites,
        diagnostics: checker.diagnostics,
    }
}

/// Interned names the checker looks up by shape.
pub(crate) struct WellKnown {
    pub(crate) ctor: Name,
    pub(crate) indexer: Name,
    pub(crate) length: Name,
    pub(crate) get_enumerator: Name,
    pub(crate) current: Name,
    pub(crate) move_next: Name,
    pub(crate) value: Name,
    pub(crate) system_type: Name,
}

impl WellKnown {
    fn new(interner: &StringInterner) -> Self {
        WellKnown {
            ctor: interner.intern(".ctor"),
            indexer: interner.intern("this"),
            length: interner.intern("Length"),
            get_enumerator: interner.intern("GetEnumerator"),
            current: interner.intern("Current"),
            move_next: interner.intern("MoveNext"),
            value: interner.intern("value"),
            system_type: interner.intern("System.Type"),
        }
    }
}

/// The member body being checked.
pub(crate) struct MethodEnv {
    pub(crate) def: Option<TypeDefId>,
    pub(crate) this_ty: TypeId,
    pub(crate) ret: TypeId,
    pub(crate) is_static: bool,
    /// Iterator bodies skip the return-type conversion check; their
    /// declared type describes the sequence, not the yielded element.
    pub(crate) has_yield: bool,
    pub(crate) is_async: bool,
}

impl MethodEnv {
    fn none() -> Self {
        MethodEnv {
            def: None,
            this_ty: TypeId::ERROR,
            ret: TypeId::VOID,
            is_static: true,
            has_yield: false,
            is_async: false,
        }
    }
}

pub(crate) struct Checker<'a> {
    pub(crate) pool: &'a TypePool,
    pub(crate) interner: &'a StringInterner,
    pub(crate) symbols: &'a GlobalSymbols,
    pub(crate) metadata: &'a dyn MetadataProvider,
    pub(crate) options: SemaOptions,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) expr_types: Vec<TypeId>,
    pub(crate) reachable: Vec<bool>,
    pub(crate) dynamic_sites: Vec<(NodeId, DynamicCallSite)>,
    pub(crate) scopes: LocalScopes,
    /// Spans already reported for checked-constant overflow; a nested
    /// expression surfaces the same span through every enclosing level.
    pub(crate) overflow_spans: Vec<Span>,
    pub(crate) names: WellKnown,
    pub(crate) method: MethodEnv,
    /// Rebuilt per type declaration; `None` only outside any type.
    pub(crate) resolver: Option<TypeResolver<'a>>,
}

impl<'a> Checker<'a> {
    // === Declaration walk ===

    fn check_items(&mut self, items: &[Item], prefix: &[Name], scope: &ImportScope) {
        for item in items {
            match item {
                Item::Namespace(ns) => self.check_namespace(ns, prefix, scope),
                Item::Type(decl) => self.check_type_decl(decl, prefix, scope),
                Item::Error(_) => {}
            }
        }
    }

    fn check_namespace(&mut self, ns: &NamespaceDecl, prefix: &[Name], scope: &ImportScope) {
        let mut inner_prefix = prefix.to_vec();
        inner_prefix.extend(&ns.path);
        let mut inner_scope = scope.clone();
        inner_scope.extend(self.interner, &ns.usings);
        self.check_items(&ns.items, &inner_prefix, &inner_scope);
    }

    fn check_type_decl(&mut self, decl: &TypeDecl, prefix: &[Name], scope: &ImportScope) {
        let mut segments = prefix.to_vec();
        segments.push(decl.name);
        let path = join_path(self.interner, &segments);
        // duplicates were reported during collection
        let Some(def) = self.symbols.lookup_qualified(path) else {
            return;
        };
        if matches!(decl.kind, TypeDeclKind::Enum | TypeDeclKind::Delegate) {
            return;
        }

        let mut enclosing = Vec::with_capacity(prefix.len() + 1);
        let mut chain = prefix.to_vec();
        while !chain.is_empty() {
            enclosing.push(join_path(self.interner, &chain));
            chain.pop();
        }
        enclosing.push(Name::EMPTY);

        let mut type_params = FxHashMap::default();
        let mut own_args = Vec::with_capacity(decl.type_params.len());
        for (i, param) in decl.type_params.iter().enumerate() {
            let bounds = flag_bounds(&decl.constraints, param.name);
            let ty = self.pool.type_param(param.name, def, i as u32, bounds);
            type_params.insert(param.name, ty);
            own_args.push(ty);
        }
        let this_ty = self.pool.named(def, own_args);

        let saved_resolver = self.resolver.take();
        self.resolver = Some(TypeResolver {
            symbols: self.symbols,
            pool: self.pool,
            interner: self.interner,
            metadata: self.metadata,
            enclosing,
            usings: scope.usings.clone(),
            type_params,
            aliases: scope.aliases.clone(),
        });

        for member in &decl.members {
            self.check_member(member, decl, def, this_ty, &segments, scope);
        }

        self.resolver = saved_resolver;
    }

    fn check_member(
        &mut self,
        member: &Member,
        decl: &TypeDecl,
        def: TypeDefId,
        this_ty: TypeId,
        segments: &[Name],
        scope: &ImportScope,
    ) {
        match member {
            Member::Field(field) | Member::Event(field) => {
                let ty = self.resolve_type(&field.ty);
                self.check_instantiation(ty, field.span);
                let is_static =
                    field.modifiers.contains(Modifiers::STATIC) || field.is_const;
                for (_, init) in &field.declarators {
                    let Some(init) = init else { continue };
                    self.enter_body(def, this_ty, ty, is_static, false, false);
                    let ctx = self.base_context(decl.modifiers | field.modifiers);
                    let init_ty = self.type_of(init, ctx);
                    self.require_implicit(init_ty, ty, init.span);
                    self.leave_body();
                }
            }
            Member::Method(method) => self.check_method(method, decl, def, this_ty),
            Member::Property(property) => {
                let ty = self.resolve_type(&property.ty);
                let is_static = property.modifiers.contains(Modifiers::STATIC);
                let ctx = self.base_context(decl.modifiers | property.modifiers);
                if let Some(body) = &property.expr_body {
                    self.enter_body(def, this_ty, ty, is_static, false, false);
                    self.scopes.push();
                    self.declare_params_from(&property.index_params);
                    let body_ty = self.type_of(body, ctx);
                    self.require_implicit(body_ty, ty, body.span);
                    self.finish_scope();
                    self.leave_body();
                }
                for accessor in &property.accessors {
                    let Some(body) = &accessor.body else { continue };
                    let ret = if accessor.is_set { TypeId::VOID } else { ty };
                    self.enter_body(def, this_ty, ret, is_static, false, false);
                    self.scopes.push();
                    self.declare_params_from(&property.index_params);
                    if accessor.is_set {
                        self.declare_synthetic(self.names.value, ty, accessor.span);
                    }
                    self.check_stmt(body, ctx);
                    self.finish_scope();
                    self.leave_body();
                }
            }
            Member::Operator(op) => {
                let Some(body) = &op.body else { return };
                let ret = self.resolve_type(&op.return_type);
                let ctx = self.base_context(decl.modifiers | op.modifiers);
                self.enter_body(def, this_ty, ret, true, false, false);
                self.scopes.push();
                self.declare_params_from(&op.params);
                self.check_stmt(body, ctx);
                self.finish_scope();
                self.leave_body();
            }
            Member::NestedType(nested) => {
                self.check_type_decl(nested, segments, scope);
            }
            Member::Error(_) => {}
        }
    }

    fn check_method(
        &mut self,
        method: &MethodDecl,
        decl: &TypeDecl,
        def: TypeDefId,
        this_ty: TypeId,
    ) {
        let Some(body) = &method.body else { return };

        // method type parameters extend the resolver for this body
        let owner_count = self.pool.with_def(def, |d| d.type_param_count);
        let mut added = Vec::new();
        for (i, param) in method.type_params.iter().enumerate() {
            let bounds = flag_bounds(&method.constraints, param.name);
            let ty = self
                .pool
                .type_param(param.name, def, owner_count + i as u32, bounds);
            added.push((param.name, ty));
        }
        if let Some(resolver) = self.resolver.as_mut() {
            for &(name, ty) in &added {
                resolver.type_params.insert(name, ty);
            }
        }

        let ret = match method.kind {
            MethodKind::Constructor | MethodKind::StaticConstructor | MethodKind::Destructor => {
                TypeId::VOID
            }
            _ => method
                .return_type
                .as_ref()
                .map_or(TypeId::VOID, |t| self.resolve_type(t)),
        };
        let is_static = method.modifiers.contains(Modifiers::STATIC)
            || method.kind == MethodKind::StaticConstructor;
        let is_async = method.modifiers.contains(Modifiers::ASYNC);

        self.enter_body(def, this_ty, ret, is_static, contains_yield(body), is_async);
        self.scopes.push();
        self.declare_params_from(&method.params);

        let mut ctx = self.base_context(decl.modifiers | method.modifiers);
        if method.modifiers.contains(Modifiers::UNSAFE) {
            if !self.options.unsafe_allowed {
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E2012)
                        .with_message("unsafe code requires the `--unsafe` option")
                        .with_label(method.span, "declared unsafe here"),
                );
            }
            ctx |= CheckContext::IN_UNSAFE;
        }
        self.check_stmt(body, ctx);

        self.finish_scope();
        self.leave_body();
        if let Some(resolver) = self.resolver.as_mut() {
            for (name, _) in added {
                resolver.type_params.remove(&name);
            }
        }
    }

    // === Body environment ===

    fn enter_body(
        &mut self,
        def: TypeDefId,
        this_ty: TypeId,
        ret: TypeId,
        is_static: bool,
        has_yield: bool,
        is_async: bool,
    ) {
        self.method = MethodEnv {
            def: Some(def),
            this_ty,
            ret,
            is_static,
            has_yield,
            is_async,
        };
    }

    fn leave_body(&mut self) {
        self.method = MethodEnv::none();
    }

    fn base_context(&self, modifiers: Modifiers) -> CheckContext {
        let mut ctx = CheckContext::default().checked(self.options.checked_by_default);
        if modifiers.contains(Modifiers::UNSAFE) && self.options.unsafe_allowed {
            ctx |= CheckContext::IN_UNSAFE;
        }
        ctx
    }

    fn declare_params_from(&mut self, params: &[csf_ir::ast::Param]) {
        for param in params {
            let ty = self.resolve_type(&param.ty);
            let local = Local {
                ty,
                kind: LocalKind::Parameter,
                span: param.span,
                used: false,
                const_value: None,
            };
            if let Err(error) = self.scopes.declare(param.name, local) {
                self.report_declare_error(param.name, param.span, error);
            }
        }
    }

    pub(crate) fn declare_synthetic(&mut self, name: Name, ty: TypeId, span: Span) {
        let local = Local {
            ty,
            kind: LocalKind::Parameter,
            span,
            used: false,
            const_value: None,
        };
        // synthetic bindings never collide with user locals
        let _ = self.scopes.declare(name, local);
    }

    pub(crate) fn report_declare_error(
        &mut self,
        name: Name,
        span: Span,
        error: crate::scope::DeclareError,
    ) {
        use crate::scope::DeclareError;
        let text = self.interner.lookup(name);
        let diagnostic = match error {
            DeclareError::Duplicate(previous) => Diagnostic::error(ErrorCode::E2015)
                .with_message(format!("`{text}` is already declared in this scope"))
                .with_label(span, "declared again here")
                .with_secondary_label(previous, "first declared here"),
            DeclareError::Shadows(previous) => Diagnostic::error(ErrorCode::E2009)
                .with_message(format!(
                    "`{text}` conflicts with a local declared in an enclosing scope"
                ))
                .with_label(span, "conflicting declaration")
                .with_secondary_label(previous, "enclosing declaration here"),
        };
        self.diagnostics.push(diagnostic);
    }

    /// Pop the innermost scope and warn on unused locals.
    pub(crate) fn finish_scope(&mut self) {
        for (name, span) in self.scopes.pop() {
            let text = self.interner.lookup(name);
            self.diagnostics.push(
                Diagnostic::warning(ErrorCode::W3002)
                    .with_message(format!("the local `{text}` is declared but never used"))
                    .with_label(span, "never used"),
            );
        }
    }

    // === Shared helpers ===

    pub(crate) fn resolve_type(&mut self, ty: &ParsedType) -> TypeId {
        let Some(resolver) = self.resolver.as_ref() else {
            return TypeId::ERROR;
        };
        let mut diagnostics = Vec::new();
        let resolved = resolver.resolve(ty, &mut diagnostics);
        self.diagnostics.extend(diagnostics);
        if matches!(ty.kind, ParsedTypeKind::Pointer(_)) {
            self.require_unsafe_flag(ty.span);
        }
        resolved
    }

    fn require_unsafe_flag(&mut self, span: Span) {
        if !self.options.unsafe_allowed {
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E2012)
                    .with_message("pointer types require the `--unsafe` option")
                    .with_label(span, "pointer type here"),
            );
        }
    }

    pub(crate) fn record(&mut self, id: NodeId, ty: TypeId) -> TypeId {
        if let Some(slot) = self.expr_types.get_mut(id.raw() as usize) {
            *slot = ty;
        }
        ty
    }

    pub(crate) fn mark_unreachable(&mut self, id: NodeId) {
        if let Some(slot) = self.reachable.get_mut(id.raw() as usize) {
            *slot = false;
        }
    }

    /// Require an implicit conversion, reporting a mismatch once.
    pub(crate) fn require_implicit(&mut self, source: TypeId, target: TypeId, span: Span) {
        if source.is_error() || target.is_error() || source == TypeId::DYNAMIC {
            return;
        }
        let conversion =
            classify_conversion(self.pool, source, target, ConversionContext::IMPLICIT);
        if !conversion.is_implicit() {
            self.type_mismatch(source, target, span);
        }
    }

    pub(crate) fn type_mismatch(&mut self, source: TypeId, target: TypeId, span: Span) {
        let from = self.pool.display(source, self.interner);
        let to = self.pool.display(target, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!("cannot implicitly convert `{from}` to `{to}`"))
                .with_label(span, format!("expected `{to}`")),
        );
    }

    /// Validate generic constraints at an instantiation site.
    pub(crate) fn check_instantiation(&mut self, ty: TypeId, span: Span) {
        match self.pool.data(ty) {
            TypeData::Named { def, args } if !args.is_empty() => {
                for (i, &arg) in args.iter().enumerate() {
                    if arg.is_error() {
                        continue;
                    }
                    let Some(bounds) = self.symbols.param_bounds(def, i as u32).cloned() else {
                        continue;
                    };
                    if bounds.value && !self.pool.is_value_type(arg) {
                        self.constraint_violation(arg, "a value type is required", span);
                    }
                    if bounds.reference && !self.pool.is_reference_type(arg) {
                        self.constraint_violation(arg, "a reference type is required", span);
                    }
                    if bounds.constructor && !self.has_parameterless_ctor(arg) {
                        self.constraint_violation(
                            arg,
                            "a public parameterless constructor is required",
                            span,
                        );
                    }
                    for &bound in &bounds.types {
                        let bound = self.pool.substitute(bound, def, &args);
                        let conversion = classify_conversion(
                            self.pool,
                            arg,
                            bound,
                            ConversionContext::IMPLICIT,
                        );
                        if !conversion.is_implicit() {
                            let to = self.pool.display(bound, self.interner);
                            self.constraint_violation(
                                arg,
                                &format!("`{to}` is a required bound"),
                                span,
                            );
                        }
                    }
                }
                for &arg in &args {
                    self.check_instantiation(arg, span);
                }
            }
            TypeData::Array { element, .. }
            | TypeData::Nullable(element)
            | TypeData::Pointer(element) => self.check_instantiation(element, span),
            _ => {}
        }
    }

    fn constraint_violation(&mut self, arg: TypeId, requirement: &str, span: Span) {
        let name = self.pool.display(arg, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2006)
                .with_message(format!(
                    "the type argument `{name}` violates a constraint: {requirement}"
                ))
                .with_label(span, "constraint violated here"),
        );
    }

    fn has_parameterless_ctor(&self, arg: TypeId) -> bool {
        if self.pool.is_value_type(arg) {
            return true;
        }
        match self.pool.data(arg) {
            TypeData::Named { def, .. } => {
                let ctors = self.symbols.find_members(self.pool, def, self.names.ctor);
                ctors.is_empty()
                    || ctors.iter().any(|c| {
                        c.signature()
                            .is_some_and(|sig| sig.params.iter().all(|p| p.has_default))
                    })
            }
            TypeData::TypeParam { bounds, .. } => bounds.constructor || bounds.value,
            _ => false,
        }
    }
}

/// Whether a body contains a `yield` statement. Lambdas are expressions
/// and local functions have their own bodies, so neither is entered.
fn contains_yield(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::YieldReturn(_) | StmtKind::YieldBreak => true,
        StmtKind::Block(stmts) => stmts.iter().any(contains_yield),
        StmtKind::If { then, otherwise, .. } => {
            contains_yield(then) || otherwise.as_deref().is_some_and(contains_yield)
        }
        StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. }
        | StmtKind::For { body, .. }
        | StmtKind::Foreach { body, .. }
        | StmtKind::Using { body, .. }
        | StmtKind::Lock { body, .. }
        | StmtKind::Checked { body, .. }
        | StmtKind::Unsafe(body) => contains_yield(body),
        StmtKind::Switch { sections, .. } => sections
            .iter()
            .any(|s| s.body.iter().any(contains_yield)),
        StmtKind::Try {
            body,
            catches,
            finally,
        } => {
            contains_yield(body)
                || catches.iter().any(|c| contains_yield(&c.body))
                || finally.as_deref().is_some_and(contains_yield)
        }
        StmtKind::Labeled { stmt, .. } => contains_yield(stmt),
        _ => false,
    }
}
