//! Statement checking and reachability.
//!
//! `check_stmt` returns whether control can fall out of the statement's
//! end. Blocks thread that flag through their children: the first
//! statement after an exit gets one unreachable-code warning, and a
//! label makes the tail live again since a `goto` can land on it.

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{
    Expr, ExprKind, ForInit, GotoTarget, MethodKind, ParsedTypeKind, Stmt, StmtKind, SwitchLabel,
};
use csf_ir::Span;
use csf_types::{classify_conversion, ConversionContext, TypeData, TypeId};

use crate::check::{Checker, MethodEnv};
use crate::const_eval::ConstError;
use crate::context::CheckContext;
use crate::scope::{Local, LocalKind};
use crate::symbol::MemberKind;

impl<'a> Checker<'a> {
    /// Check one statement; `true` means control can reach its end.
    pub(crate) fn check_stmt(&mut self, stmt: &Stmt, ctx: CheckContext) -> bool {
        match &stmt.kind {
            StmtKind::Error | StmtKind::Empty => true,
            StmtKind::Block(stmts) => {
                self.scopes.push();
                let falls = self.check_block(stmts, ctx);
                self.finish_scope();
                falls
            }
            StmtKind::LocalVar {
                ty,
                declarators,
                is_const,
                is_using: _,
            } => {
                self.check_local_var(stmt, ty, declarators, *is_const, ctx);
                true
            }
            StmtKind::LocalFunction(decl) => {
                self.check_local_function(decl, ctx);
                true
            }
            StmtKind::Expr(expr) => {
                self.type_of(expr, ctx);
                true
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.require_bool(cond, ctx);
                let then_falls = self.check_stmt(then, ctx);
                let else_falls = otherwise
                    .as_deref()
                    .map_or(true, |s| self.check_stmt(s, ctx));
                then_falls || else_falls
            }
            StmtKind::While { cond, body } => {
                self.require_bool(cond, ctx);
                self.check_stmt(body, ctx | CheckContext::IN_LOOP);
                !is_always_true(cond) || contains_break(body)
            }
            StmtKind::DoWhile { body, cond } => {
                self.check_stmt(body, ctx | CheckContext::IN_LOOP);
                self.require_bool(cond, ctx);
                !is_always_true(cond) || contains_break(body)
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                self.scopes.push();
                match init {
                    Some(ForInit::Declaration(decl)) => {
                        self.check_stmt(decl, ctx);
                    }
                    Some(ForInit::Expressions(exprs)) => {
                        for expr in exprs {
                            self.type_of(expr, ctx);
                        }
                    }
                    None => {}
                }
                if let Some(cond) = cond {
                    self.require_bool(cond, ctx);
                }
                for expr in update {
                    self.type_of(expr, ctx);
                }
                self.check_stmt(body, ctx | CheckContext::IN_LOOP);
                self.finish_scope();
                let endless = match cond {
                    None => true,
                    Some(cond) => is_always_true(cond),
                };
                !endless || contains_break(body)
            }
            StmtKind::Foreach {
                ty,
                name,
                source,
                body,
            } => {
                let source_ty = self.type_of(source, ctx);
                let element = self.foreach_element(source_ty, source.span);
                let declared = if matches!(ty.kind, ParsedTypeKind::Var) {
                    element
                } else {
                    let declared = self.resolve_type(ty);
                    // the iteration variable allows an explicit conversion
                    // from the element type, matching the hidden cast
                    let conversion = classify_conversion(
                        self.pool,
                        element,
                        declared,
                        ConversionContext::EXPLICIT,
                    );
                    if !element.is_error() && !declared.is_error() && !conversion.exists() {
                        self.type_mismatch(element, declared, stmt.span);
                    }
                    declared
                };
                self.scopes.push();
                let local = Local {
                    ty: declared,
                    kind: LocalKind::Iteration,
                    span: stmt.span,
                    used: false,
                    const_value: None,
                };
                if let Err(error) = self.scopes.declare(*name, local) {
                    self.report_declare_error(*name, stmt.span, error);
                }
                self.check_stmt(body, ctx | CheckContext::IN_LOOP);
                self.finish_scope();
                true
            }
            StmtKind::Switch {
                scrutinee,
                sections,
            } => {
                let scrutinee_ty = self.type_of(scrutinee, ctx);
                for section in sections {
                    for label in &section.labels {
                        if let SwitchLabel::Case(expr) = label {
                            let label_ty = self.type_of(expr, ctx);
                            self.require_implicit(label_ty, scrutinee_ty, expr.span);
                            if self.eval_in_body(expr, ctx.is_checked()).is_err() {
                                self.diagnostics.push(
                                    Diagnostic::error(ErrorCode::E2001)
                                        .with_message(
                                            "a case label must be a constant expression",
                                        )
                                        .with_label(expr.span, "not a constant"),
                                );
                            }
                        }
                    }
                    self.scopes.push();
                    self.check_block(&section.body, ctx | CheckContext::IN_SWITCH);
                    self.finish_scope();
                }
                true
            }
            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                let body_falls = self.check_stmt(body, ctx);
                let mut any_catch_falls = catches.is_empty();
                for catch in catches {
                    self.scopes.push();
                    let caught = catch
                        .ty
                        .as_ref()
                        .map_or(TypeId::OBJECT, |t| self.resolve_type(t));
                    if let Some(name) = catch.name {
                        let local = Local {
                            ty: caught,
                            kind: LocalKind::Iteration,
                            span: catch.span,
                            used: false,
                            const_value: None,
                        };
                        if let Err(error) = self.scopes.declare(name, local) {
                            self.report_declare_error(name, catch.span, error);
                        }
                    }
                    if let Some(filter) = &catch.filter {
                        self.require_bool(filter, ctx);
                    }
                    if self.check_stmt(&catch.body, ctx | CheckContext::IN_CATCH) {
                        any_catch_falls = true;
                    }
                    self.finish_scope();
                }
                let finally_falls = finally
                    .as_deref()
                    .map_or(true, |s| self.check_stmt(s, ctx | CheckContext::IN_FINALLY));
                (body_falls || any_catch_falls) && finally_falls
            }
            StmtKind::Using { resource, body } => {
                self.scopes.push();
                self.check_stmt(resource, ctx);
                let falls = self.check_stmt(body, ctx);
                self.finish_scope();
                falls
            }
            StmtKind::Lock { expr, body } => {
                let ty = self.type_of(expr, ctx);
                if !ty.is_error() && ty != TypeId::DYNAMIC && !self.pool.is_reference_type(ty) {
                    let name = self.pool.display(ty, self.interner);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message(format!(
                                "`lock` requires a reference type, found `{name}`"
                            ))
                            .with_label(expr.span, "value type here"),
                    );
                }
                self.check_stmt(body, ctx | CheckContext::IN_LOCK)
            }
            StmtKind::Checked { checked, body } => self.check_stmt(body, ctx.checked(*checked)),
            StmtKind::Unsafe(body) => {
                if !self.options.unsafe_allowed {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2012)
                            .with_message("unsafe blocks require the `--unsafe` option")
                            .with_label(stmt.span, "unsafe block here"),
                    );
                }
                self.check_stmt(body, ctx | CheckContext::IN_UNSAFE)
            }
            StmtKind::Return(value) => {
                self.check_return(value.as_ref(), stmt.span, ctx);
                false
            }
            StmtKind::Break | StmtKind::Continue => false,
            StmtKind::Goto(target) => {
                if let GotoTarget::Case(expr) = target {
                    self.type_of(expr, ctx);
                }
                false
            }
            StmtKind::Labeled { label: _, stmt } => self.check_stmt(stmt, ctx),
            StmtKind::YieldReturn(expr) => {
                self.check_yield(stmt.span, ctx);
                self.type_of(expr, ctx);
                true
            }
            StmtKind::YieldBreak => {
                self.check_yield(stmt.span, ctx);
                false
            }
            StmtKind::Throw(value) => {
                if let Some(expr) = value {
                    self.type_of(expr, ctx);
                } else if !ctx.contains(CheckContext::IN_CATCH) {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message("a bare `throw` is only valid inside a catch block")
                            .with_label(stmt.span, "nothing to rethrow here"),
                    );
                }
                false
            }
        }
    }

    /// A statement list with reachability threading; used for blocks and
    /// switch sections.
    pub(crate) fn check_block(&mut self, stmts: &[Stmt], ctx: CheckContext) -> bool {
        let mut falls = true;
        let mut warned = false;
        for stmt in stmts {
            if !falls {
                if matches!(stmt.kind, StmtKind::Labeled { .. }) {
                    falls = true;
                    warned = false;
                } else {
                    self.mark_unreachable(stmt.id);
                    if !warned {
                        self.diagnostics.push(
                            Diagnostic::warning(ErrorCode::W3001)
                                .with_message("unreachable code detected")
                                .with_label(stmt.span, "never executed"),
                        );
                        warned = true;
                    }
                    // unreachable code is still fully checked
                    self.check_stmt(stmt, ctx);
                    continue;
                }
            }
            falls = self.check_stmt(stmt, ctx);
        }
        falls
    }

    fn check_local_var(
        &mut self,
        stmt: &Stmt,
        ty: &csf_ir::ast::ParsedType,
        declarators: &[(csf_ir::Name, Option<Expr>)],
        is_const: bool,
        ctx: CheckContext,
    ) {
        let inferred = matches!(ty.kind, ParsedTypeKind::Var);
        let declared = if inferred {
            TypeId::NONE
        } else {
            let declared = self.resolve_type(ty);
            self.check_instantiation(declared, ty.span);
            declared
        };

        for (name, init) in declarators {
            let local_ty = match (inferred, init) {
                (true, Some(init)) => {
                    let init_ty = self.type_of(init, ctx);
                    if init_ty == TypeId::VOID {
                        self.diagnostics.push(
                            Diagnostic::error(ErrorCode::E2001)
                                .with_message("cannot infer a type from a `void` expression")
                                .with_label(init.span, "has no value"),
                        );
                        TypeId::ERROR
                    } else {
                        init_ty
                    }
                }
                (true, None) => {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message(
                                "an implicitly typed local must have an initializer",
                            )
                            .with_label(stmt.span, "missing initializer"),
                    );
                    TypeId::ERROR
                }
                (false, Some(init)) => {
                    let init_ty = self.type_of(init, ctx);
                    self.require_implicit(init_ty, declared, init.span);
                    declared
                }
                (false, None) => declared,
            };

            let const_value = match (is_const, init) {
                (true, Some(init)) => match self.eval_in_body(init, true) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        self.const_local_error(error, init.span);
                        None
                    }
                },
                _ => None,
            };

            let local = Local {
                ty: local_ty,
                kind: LocalKind::Local,
                span: stmt.span,
                used: false,
                const_value,
            };
            if let Err(error) = self.scopes.declare(*name, local) {
                self.report_declare_error(*name, stmt.span, error);
            }
        }
    }

    fn const_local_error(&mut self, error: ConstError, span: Span) {
        let diagnostic = match error {
            ConstError::NotConstant => Diagnostic::error(ErrorCode::E2001)
                .with_message("a `const` local requires a constant initializer")
                .with_label(span, "not a constant expression"),
            ConstError::Overflow(at) => Diagnostic::error(ErrorCode::E2008)
                .with_message("constant expression overflows in a checked context")
                .with_label(at, "overflows here"),
            ConstError::DivideByZero(at) => Diagnostic::error(ErrorCode::E2008)
                .with_message("constant expression divides by zero")
                .with_label(at, "division by zero here"),
            ConstError::Circular(name) => {
                let text = self.interner.lookup(name);
                Diagnostic::error(ErrorCode::E2007)
                    .with_message(format!("the constant `{text}` depends on itself"))
                    .with_label(span, "circular definition")
            }
        };
        self.diagnostics.push(diagnostic);
    }

    fn check_local_function(&mut self, decl: &csf_ir::ast::MethodDecl, ctx: CheckContext) {
        let params: Vec<TypeId> = decl
            .params
            .iter()
            .map(|p| {
                let Some(resolver) = self.resolver.as_ref() else {
                    return TypeId::ERROR;
                };
                let mut diagnostics = Vec::new();
                let ty = resolver.resolve(&p.ty, &mut diagnostics);
                self.diagnostics.extend(diagnostics);
                ty
            })
            .collect();
        let ret = decl
            .return_type
            .as_ref()
            .map_or(TypeId::VOID, |t| self.resolve_type(t));
        let fn_ty = self.pool.function(params, ret);

        let local = Local {
            ty: fn_ty,
            kind: LocalKind::LocalFunction,
            span: decl.span,
            used: false,
            const_value: None,
        };
        if let Err(error) = self.scopes.declare(decl.name, local) {
            self.report_declare_error(decl.name, decl.span, error);
        }

        let Some(body) = &decl.body else { return };
        let inner = MethodEnv {
            def: self.method.def,
            this_ty: self.method.this_ty,
            ret,
            is_static: self.method.is_static
                || decl.modifiers.contains(csf_ir::ast::Modifiers::STATIC),
            has_yield: super::contains_yield(body),
            is_async: decl.modifiers.contains(csf_ir::ast::Modifiers::ASYNC),
        };
        let saved = std::mem::replace(&mut self.method, inner);
        self.scopes.push();
        self.declare_params_from(&decl.params);
        debug_assert_eq!(decl.kind, MethodKind::LocalFunction);
        self.check_stmt(body, ctx);
        self.finish_scope();
        self.method = saved;
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span, ctx: CheckContext) {
        match value {
            Some(expr) => {
                let ty = self.type_of(expr, ctx);
                if self.method.has_yield {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2010)
                            .with_message(
                                "an iterator cannot return a value; use `yield return`",
                            )
                            .with_label(span, "value returned here"),
                    );
                } else if self.method.ret == TypeId::VOID {
                    if !ty.is_error() {
                        self.diagnostics.push(
                            Diagnostic::error(ErrorCode::E2001)
                                .with_message("cannot return a value from a `void` member")
                                .with_label(expr.span, "unexpected value"),
                        );
                    }
                } else if !self.method.is_async {
                    self.require_implicit(ty, self.method.ret, expr.span);
                }
            }
            None => {
                if self.method.ret != TypeId::VOID
                    && !self.method.ret.is_error()
                    && !self.method.has_yield
                    && !self.method.is_async
                {
                    let expected = self.pool.display(self.method.ret, self.interner);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message(format!(
                                "a member returning `{expected}` must return a value"
                            ))
                            .with_label(span, "missing value"),
                    );
                }
            }
        }
    }

    fn check_yield(&mut self, span: Span, ctx: CheckContext) {
        if !ctx.allows_yield() {
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E2010)
                    .with_message(
                        "`yield` cannot appear inside catch, finally, lock, or unsafe blocks",
                    )
                    .with_label(span, "yield here"),
            );
        }
    }

    fn require_bool(&mut self, cond: &Expr, ctx: CheckContext) {
        let ty = self.type_of(cond, ctx);
        self.require_implicit(ty, TypeId::BOOL, cond.span);
    }

    /// The element type a `foreach` iterates, by shape.
    fn foreach_element(&mut self, source: TypeId, span: Span) -> TypeId {
        if source.is_error() {
            return TypeId::ERROR;
        }
        if source == TypeId::DYNAMIC {
            return TypeId::DYNAMIC;
        }
        if source == TypeId::STRING {
            return TypeId::CHAR;
        }
        match self.pool.data(source) {
            TypeData::Array { element, .. } => element,
            TypeData::Named { def, ref args } => {
                let enumerator = self
                    .symbols
                    .find_members(self.pool, def, self.names.get_enumerator)
                    .iter()
                    .find_map(|m| {
                        m.signature()
                            .filter(|sig| sig.params.is_empty())
                            .map(|sig| self.pool.substitute(sig.ret, def, args))
                    });
                let element = enumerator.and_then(|enumerator_ty| {
                    let TypeData::Named {
                        def: enum_def,
                        args: enum_args,
                    } = self.pool.data(enumerator_ty)
                    else {
                        return None;
                    };
                    let has_move_next = self
                        .symbols
                        .find_members(self.pool, enum_def, self.names.move_next)
                        .iter()
                        .any(|m| {
                            m.signature()
                                .is_some_and(|sig| sig.params.is_empty() && sig.ret == TypeId::BOOL)
                        });
                    if !has_move_next {
                        return None;
                    }
                    self.symbols
                        .find_members(self.pool, enum_def, self.names.current)
                        .iter()
                        .find_map(|m| match &m.kind {
                            MemberKind::Property { ty, .. } => {
                                Some(self.pool.substitute(*ty, enum_def, &enum_args))
                            }
                            _ => None,
                        })
                });
                match element {
                    Some(element) => element,
                    None => {
                        self.foreach_pattern_error(source, span);
                        TypeId::ERROR
                    }
                }
            }
            _ => {
                self.foreach_pattern_error(source, span);
                TypeId::ERROR
            }
        }
    }

    fn foreach_pattern_error(&mut self, source: TypeId, span: Span) {
        let name = self.pool.display(source, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2014)
                .with_message(format!(
                    "`{name}` has no public `GetEnumerator` returning an enumerator with \
                     `Current` and `MoveNext`"
                ))
                .with_label(span, "cannot iterate this"),
        );
    }
}

/// A `while (true)` style condition that never lets the loop exit by
/// falling through.
fn is_always_true(cond: &Expr) -> bool {
    matches!(cond.kind, ExprKind::LitBool(true))
}

/// Whether the loop body contains a `break` binding to this loop. Nested
/// loops and switches capture their own breaks.
fn contains_break(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Break => true,
        StmtKind::Block(stmts) => stmts.iter().any(contains_break),
        StmtKind::If { then, otherwise, .. } => {
            contains_break(then) || otherwise.as_deref().is_some_and(contains_break)
        }
        StmtKind::Try {
            body,
            catches,
            finally,
        } => {
            contains_break(body)
                || catches.iter().any(|c| contains_break(&c.body))
                || finally.as_deref().is_some_and(contains_break)
        }
        StmtKind::Using { body, .. }
        | StmtKind::Lock { body, .. }
        | StmtKind::Checked { body, .. }
        | StmtKind::Unsafe(body) => contains_break(body),
        StmtKind::Labeled { stmt, .. } => contains_break(stmt),
        // a nested loop or switch owns its own breaks
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use csf_diagnostic::ErrorCode;
    use csf_ir::StringInterner;
    use csf_parse::parse_source;
    use csf_types::TypePool;
    use pretty_assertions::assert_eq;

    use crate::check::{check_unit, SemaOptions, UnitAnalysis};
    use crate::collect::collect_units;
    use crate::external::NoMetadata;

    fn analyze(source: &str) -> UnitAnalysis {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let parsed = parse_source(source, &interner);
        assert_eq!(parsed.diagnostics, vec![]);
        let units = [parsed.unit];
        let collection = collect_units(&units, &pool, &interner, &NoMetadata);
        assert_eq!(collection.diagnostics, vec![]);
        check_unit(
            &units[0],
            &collection.symbols,
            &pool,
            &interner,
            &NoMetadata,
            &SemaOptions::default(),
        )
    }

    fn errors(source: &str) -> Vec<ErrorCode> {
        analyze(source)
            .diagnostics
            .iter()
            .map(|d| d.code)
            .filter(|c| !c.is_warning())
            .collect()
    }

    fn warnings(source: &str) -> Vec<ErrorCode> {
        analyze(source)
            .diagnostics
            .iter()
            .map(|d| d.code)
            .filter(|c| c.is_warning())
            .collect()
    }

    #[test]
    fn straight_line_method_is_clean() {
        let codes = errors(
            "class C {
                int Add(int a, int b) { return a + b; }
                int Run() {
                    int total = Add(2, 3);
                    while (total > 10) { total = total - 1; }
                    return total;
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn code_after_return_warns_once() {
        let codes = warnings(
            "class C {
                int M() {
                    return 1;
                    int x = 2;
                }
            }",
        );
        assert_eq!(codes, vec![ErrorCode::W3001, ErrorCode::W3002]);
    }

    #[test]
    fn label_after_exit_makes_tail_live() {
        let codes = warnings(
            "class C {
                int M(bool again) {
                    int n = 0;
                    start:
                    n = n + 1;
                    if (again) { goto start; }
                    return n;
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn unused_local_warns() {
        assert_eq!(
            warnings("class C { void M() { int x = 0; } }"),
            vec![ErrorCode::W3002]
        );
    }

    #[test]
    fn inner_declaration_shadowing_is_an_error() {
        assert_eq!(
            errors("class C { void M() { int x = 0; { int x = 1; } } }"),
            vec![ErrorCode::E2009]
        );
    }

    #[test]
    fn duplicate_local_in_same_scope_is_an_error() {
        assert_eq!(
            errors("class C { void M() { int x = 0; int x = 1; } }"),
            vec![ErrorCode::E2015]
        );
    }

    #[test]
    fn const_local_folds_and_feeds_later_constants() {
        let codes = errors(
            "class C {
                int M() {
                    const int a = 6;
                    const int b = a * 7;
                    return b;
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn const_local_with_nonconstant_initializer_is_an_error() {
        assert_eq!(
            errors("class C { void M(int n) { const int a = n; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn yield_inside_finally_is_an_error() {
        assert_eq!(
            errors(
                "class C {
                    object M() {
                        try { } finally { yield return 1; }
                    }
                }"
            ),
            vec![ErrorCode::E2010]
        );
    }

    #[test]
    fn await_inside_lock_is_an_error() {
        assert_eq!(
            errors(
                "class C {
                    async void M(object t) {
                        lock (t) { await t; }
                    }
                }"
            ),
            vec![ErrorCode::E2011]
        );
    }

    #[test]
    fn lock_requires_a_reference_type() {
        assert_eq!(
            errors("class C { void M(int x) { lock (x) { } } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn unsafe_block_requires_the_option() {
        assert_eq!(
            errors("class C { void M() { unsafe { } } }"),
            vec![ErrorCode::E2012]
        );
    }

    #[test]
    fn foreach_over_a_non_enumerable_is_an_error() {
        assert_eq!(
            errors("class C { void M(int x) { foreach (var v in x) { } } }"),
            vec![ErrorCode::E2014]
        );
    }

    #[test]
    fn foreach_follows_the_enumerator_pattern() {
        let codes = errors(
            "class Counter {
                public Counter GetEnumerator() { return this; }
                public int Current { get { return 0; } }
                public bool MoveNext() { return false; }
            }
            class C {
                int Sum(Counter c) {
                    int total = 0;
                    foreach (int v in c) { total = total + v; }
                    return total;
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn enumerator_without_move_next_is_rejected() {
        let codes = errors(
            "class Counter {
                public Counter GetEnumerator() { return this; }
                public int Current { get { return 0; } }
            }
            class C {
                void M(Counter c) {
                    foreach (int v in c) { }
                }
            }",
        );
        assert_eq!(codes, vec![ErrorCode::E2014]);
    }

    #[test]
    fn foreach_over_a_string_yields_chars() {
        let codes = errors(
            "class C {
                int Count(string s) {
                    int n = 0;
                    foreach (char c in s) { n = n + 1; }
                    return n;
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn switch_case_labels_must_be_constant() {
        assert_eq!(
            errors(
                "class C {
                    void M(int x, int y) {
                        switch (x) {
                            case 1: break;
                            case y: break;
                        }
                    }
                }"
            ),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn while_true_without_break_does_not_fall_through() {
        let codes = warnings(
            "class C {
                int M() {
                    while (true) { }
                    return 0;
                }
            }",
        );
        assert_eq!(codes, vec![ErrorCode::W3001]);
    }
}
