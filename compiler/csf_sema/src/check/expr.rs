//! Expression typing.
//!
//! `type_of` computes and records a type for every expression node. A
//! dotted name is first tried as a type (`System.Console`, `Outer.Inner`)
//! and falls back to value interpretation, so member access works on
//! both without backtracking the parse. Operations on a `dynamic`
//! operand are not resolved here; they get a call-site descriptor and
//! the `dynamic` result type.

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{
    AnonymousMember, Argument, ArgumentModifier, AssignOp, BinaryOp, Expr, ExprKind, LambdaBody,
    ParsedType, QueryClause, QueryExpr, QueryFinal, UnaryOp,
};
use csf_ir::{Name, Span};
use csf_types::{
    classify_conversion, resolve_overload, CallArgument, Candidate, ConversionContext,
    OverloadError, ParamModifier, ParamSig, TypeData, TypeDefId, TypeDefKind, TypeId,
};

use crate::check::{Checker, MethodEnv};
use crate::const_eval::{
    eval_const, int_literal_type, real_literal_type, ConstEnv, ConstError, ConstValue,
};
use crate::context::CheckContext;
use crate::dynamic::{DynamicCallSite, DynamicOperation};
use crate::scope::{Local, LocalKind};
use crate::symbol::{MemberKind, MemberSymbol, Signature};

/// What a member-access target resolved to.
enum Target {
    Value(TypeId),
    Ty(TypeId),
    Error,
}

impl<'a> Checker<'a> {
    /// Type an expression, recording the result in the side table.
    pub(crate) fn type_of(&mut self, expr: &Expr, ctx: CheckContext) -> TypeId {
        let ty = self.compute(expr, ctx);
        self.record(expr.id, ty)
    }

    fn compute(&mut self, expr: &Expr, ctx: CheckContext) -> TypeId {
        match &expr.kind {
            ExprKind::Error => TypeId::ERROR,

            ExprKind::LitInt { value, suffix } => int_literal_type(*value, *suffix),
            ExprKind::LitReal { suffix, .. } => real_literal_type(*suffix),
            ExprKind::LitString(_) => TypeId::STRING,
            ExprKind::LitChar(_) => TypeId::CHAR,
            ExprKind::LitBool(_) => TypeId::BOOL,
            ExprKind::LitNull => TypeId::NULL,

            ExprKind::Ident(name) => self.ident_type(*name, expr.span),
            ExprKind::GenericName { name, .. } => self.ident_type(*name, expr.span),
            ExprKind::This => {
                if self.method.def.is_none() || self.method.is_static {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message("`this` is not available in a static context")
                            .with_label(expr.span, "used here"),
                    );
                    TypeId::ERROR
                } else {
                    self.method.this_ty
                }
            }
            ExprKind::Base => {
                let Some(def) = self.method.def.filter(|_| !self.method.is_static) else {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message("`base` is not available in a static context")
                            .with_label(expr.span, "used here"),
                    );
                    return TypeId::ERROR;
                };
                self.pool.with_def(def, |d| d.base).unwrap_or(TypeId::OBJECT)
            }

            ExprKind::Member {
                target,
                name,
                type_args: _,
                null_conditional,
            } => self.member_type(expr, target, *name, *null_conditional, ctx),

            ExprKind::Invocation { target, args } => {
                self.invocation_type(expr, target, args, ctx)
            }
            ExprKind::Index {
                target,
                args,
                null_conditional,
            } => self.index_type(expr, target, args, *null_conditional, ctx),

            ExprKind::Unary { op, operand } => self.unary_type(expr, *op, operand, ctx),
            ExprKind::Binary { op, lhs, rhs } => {
                let lt = self.type_of(lhs, ctx);
                let rt = self.type_of(rhs, ctx);
                let ty = self.binary_type(expr, *op, lt, rt, ctx);
                if ctx.is_checked() {
                    self.fold_checked(expr);
                }
                ty
            }
            ExprKind::Assign { op, lhs, rhs } => {
                let lt = self.type_of(lhs, ctx);
                let rt = self.type_of(rhs, ctx);
                match op {
                    AssignOp::Simple => self.require_implicit(rt, lt, rhs.span),
                    AssignOp::Compound(bop) => {
                        let result = self.binary_type(expr, *bop, lt, rt, ctx);
                        // the result converts back to the destination with
                        // the hidden cast compound assignment carries
                        if !result.is_error() && !lt.is_error() && lt != TypeId::DYNAMIC {
                            let back = classify_conversion(
                                self.pool,
                                result,
                                lt,
                                ConversionContext::EXPLICIT,
                            );
                            if !back.exists() {
                                self.type_mismatch(result, lt, expr.span);
                            }
                        }
                    }
                }
                lt
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let cond_ty = self.type_of(cond, ctx);
                self.require_implicit(cond_ty, TypeId::BOOL, cond.span);
                let t1 = self.type_of(then, ctx);
                let t2 = self.type_of(otherwise, ctx);
                self.conditional_type(t1, t2, expr.span)
            }

            ExprKind::Cast { ty, expr: inner } => {
                let target = self.resolve_type(ty);
                self.check_instantiation(target, ty.span);
                let source = self.type_of(inner, ctx);
                if !source.is_error() && !target.is_error() && source != TypeId::DYNAMIC {
                    let context = ConversionContext {
                        explicit: true,
                        checked: ctx.is_checked(),
                    };
                    let conversion = classify_conversion(self.pool, source, target, context);
                    if !conversion.exists() {
                        let from = self.pool.display(source, self.interner);
                        let to = self.pool.display(target, self.interner);
                        self.diagnostics.push(
                            Diagnostic::error(ErrorCode::E2001)
                                .with_message(format!("cannot convert `{from}` to `{to}`"))
                                .with_label(expr.span, "no conversion exists"),
                        );
                    } else if ctx.is_checked() {
                        self.fold_checked(expr);
                    }
                }
                target
            }
            ExprKind::Is { expr: inner, ty } => {
                self.type_of(inner, ctx);
                self.resolve_type(ty);
                TypeId::BOOL
            }
            ExprKind::As { expr: inner, ty } => {
                self.type_of(inner, ctx);
                let target = self.resolve_type(ty);
                let nullable_ok = self.pool.nullable_underlying(target).is_some();
                if !target.is_error()
                    && target != TypeId::DYNAMIC
                    && !nullable_ok
                    && !self.pool.is_reference_type(target)
                {
                    let name = self.pool.display(target, self.interner);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message(format!(
                                "`as` requires a reference or nullable type, found `{name}`"
                            ))
                            .with_label(ty.span, "value type here"),
                    );
                }
                target
            }

            ExprKind::New {
                ty,
                args,
                initializer,
            } => self.new_type(expr, ty, args, initializer.as_deref(), ctx),
            ExprKind::NewArray {
                element,
                lengths,
                rank,
                initializer,
            } => self.new_array_type(element.as_ref(), lengths, *rank, initializer.as_deref(), ctx),
            ExprKind::AnonymousObject(members) => self.anonymous_type(members, ctx),

            ExprKind::Lambda {
                params,
                body,
                is_async,
            } => self.lambda_type(params, body, *is_async, ctx),
            ExprKind::Query(query) => self.query_type(query, ctx),
            ExprKind::Tuple(elements) => {
                let mut tys = Vec::with_capacity(elements.len());
                let mut names = Vec::with_capacity(elements.len());
                for element in elements {
                    tys.push(self.type_of(&element.value, ctx));
                    names.push(element.name);
                }
                self.pool.tuple(tys, names)
            }

            ExprKind::TypeOf(ty) => {
                self.resolve_type(ty);
                self.metadata
                    .lookup_external_symbol(None, "System.Type")
                    .unwrap_or(TypeId::OBJECT)
            }
            ExprKind::NameOf(inner) => {
                // the operand only needs to name something; a type name is
                // as good as a value
                self.receiver_of(inner, ctx);
                TypeId::STRING
            }
            ExprKind::SizeOf(ty) => {
                self.resolve_type(ty);
                if !ctx.contains(CheckContext::IN_UNSAFE) {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2012)
                            .with_message("`sizeof` requires an unsafe context")
                            .with_label(expr.span, "sizeof here"),
                    );
                }
                TypeId::INT
            }
            ExprKind::Default(ty) => match ty {
                Some(ty) => self.resolve_type(ty),
                None => TypeId::ERROR,
            },
            ExprKind::CheckedExpr { checked, expr: inner } => {
                let ty = self.type_of(inner, ctx.checked(*checked));
                if *checked {
                    self.fold_checked(inner);
                }
                ty
            }

            ExprKind::Paren(inner) => self.type_of(inner, ctx),
        }
    }

    // === Names ===

    fn ident_type(&mut self, name: Name, span: Span) -> TypeId {
        if let Some(local) = self.scopes.lookup(name) {
            return local.ty;
        }
        if let Some(def) = self.method.def {
            let symbols = self.symbols;
            let members = symbols.find_members(self.pool, def, name);
            if let Some(first) = members.first() {
                if !first.is_static && self.method.is_static {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message("an instance member cannot be used in a static context")
                            .with_label(span, "instance member here"),
                    );
                }
                return self.member_result(&members);
            }
        }
        if let Some(resolver) = self.resolver.as_ref() {
            let mut diagnostics = Vec::new();
            let found = resolver.lookup_path(&[name], &mut diagnostics, span);
            self.diagnostics.extend(diagnostics);
            if found.is_some() {
                let text = self.interner.lookup(name);
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E2002)
                        .with_message(format!("`{text}` is a type, not a value"))
                        .with_label(span, "type used like a value"),
                );
                return TypeId::ERROR;
            }
        }
        let text = self.interner.lookup(name);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("cannot resolve the name `{text}`"))
                .with_label(span, "not found in this scope"),
        );
        TypeId::ERROR
    }

    /// The value type of a resolved member list: a field, property, or
    /// event yields its type; a method group yields a function type.
    fn member_result(&self, members: &[&MemberSymbol]) -> TypeId {
        let Some(first) = members.first() else {
            return TypeId::ERROR;
        };
        match first.value_type() {
            Some(ty) => ty,
            None => match first.signature() {
                Some(sig) => self
                    .pool
                    .function(sig.params.iter().map(|p| p.ty).collect(), sig.ret),
                None => TypeId::ERROR,
            },
        }
    }

    // === Member access ===

    fn member_type(
        &mut self,
        expr: &Expr,
        target: &Expr,
        name: Name,
        null_conditional: bool,
        ctx: CheckContext,
    ) -> TypeId {
        match self.receiver_of(target, ctx) {
            Target::Error => TypeId::ERROR,
            Target::Ty(ty) => self.static_member_type(ty, name, expr.span),
            Target::Value(ty) => {
                if ty.is_error() {
                    return TypeId::ERROR;
                }
                if ty == TypeId::DYNAMIC {
                    self.dynamic_sites.push((
                        expr.id,
                        DynamicCallSite::new(DynamicOperation::MemberAccess(name), []),
                    ));
                    return TypeId::DYNAMIC;
                }
                let receiver = if null_conditional {
                    self.pool.nullable_underlying(ty).unwrap_or(ty)
                } else {
                    ty
                };
                let result = self.instance_member_type(receiver, name, expr.span);
                if null_conditional && !result.is_error() && self.pool.is_value_type(result) {
                    self.pool.nullable(result)
                } else {
                    result
                }
            }
        }
    }

    fn instance_member_type(&mut self, receiver: TypeId, name: Name, span: Span) -> TypeId {
        if name == self.names.length {
            if receiver == TypeId::STRING
                || matches!(self.pool.data(receiver), TypeData::Array { .. })
            {
                return TypeId::INT;
            }
        }
        match self.pool.data(receiver) {
            TypeData::Named { def, args } => {
                let symbols = self.symbols;
                let members = symbols.find_members(self.pool, def, name);
                if members.is_empty() {
                    return self.missing_member(receiver, name, span);
                }
                if members.iter().all(|m| m.is_static) {
                    let text = self.interner.lookup(name);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message(format!(
                                "the static member `{text}` needs a type, not an instance"
                            ))
                            .with_label(span, "accessed through an instance"),
                    );
                    return TypeId::ERROR;
                }
                let raw = self.member_result(&members);
                self.substitute_for(raw, &members, def, &args)
            }
            _ => self.missing_member(receiver, name, span),
        }
    }

    fn static_member_type(&mut self, receiver: TypeId, name: Name, span: Span) -> TypeId {
        match self.pool.data(receiver) {
            TypeData::Named { def, args } => {
                let symbols = self.symbols;
                let members = symbols.find_members(self.pool, def, name);
                if members.is_empty() {
                    return self.missing_member(receiver, name, span);
                }
                if members.iter().all(|m| !m.is_static) {
                    let text = self.interner.lookup(name);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2002)
                            .with_message(format!("the member `{text}` needs an instance"))
                            .with_label(span, "accessed through the type"),
                    );
                    return TypeId::ERROR;
                }
                let raw = self.member_result(&members);
                self.substitute_for(raw, &members, def, &args)
            }
            _ => self.missing_member(receiver, name, span),
        }
    }

    /// Substitute the receiver's type arguments into a member type, when
    /// the member is declared by the receiver's own definition.
    fn substitute_for(
        &self,
        ty: TypeId,
        members: &[&MemberSymbol],
        def: TypeDefId,
        args: &[TypeId],
    ) -> TypeId {
        match members.first() {
            Some(first) if first.owner == def => self.pool.substitute(ty, def, args),
            _ => ty,
        }
    }

    fn missing_member(&mut self, receiver: TypeId, name: Name, span: Span) -> TypeId {
        let on = self.pool.display(receiver, self.interner);
        let text = self.interner.lookup(name);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("`{on}` has no member named `{text}`"))
                .with_label(span, "unknown member"),
        );
        TypeId::ERROR
    }

    /// Resolve a member-access target, preferring a value interpretation
    /// for a leading local or field, and a type interpretation for a
    /// dotted name that resolves to one.
    fn receiver_of(&mut self, expr: &Expr, ctx: CheckContext) -> Target {
        if let Some(segments) = flatten_path(expr) {
            let first = segments[0];
            let first_is_local = self.scopes.lookup(first).is_some();
            let first_is_member = !first_is_local
                && self.method.def.is_some_and(|def| {
                    !self.symbols.find_members(self.pool, def, first).is_empty()
                });
            if !first_is_local && !first_is_member {
                if let Some(resolver) = self.resolver.as_ref() {
                    let mut diagnostics = Vec::new();
                    let found = resolver.lookup_path(&segments, &mut diagnostics, expr.span);
                    self.diagnostics.extend(diagnostics);
                    if let Some(ty) = found {
                        self.record(expr.id, ty);
                        return Target::Ty(ty);
                    }
                }
            }
        }
        let ty = self.type_of(expr, ctx);
        if ty.is_error() {
            Target::Error
        } else {
            Target::Value(ty)
        }
    }

    // === Invocation ===

    fn invocation_type(
        &mut self,
        expr: &Expr,
        target: &Expr,
        args: &[Argument],
        ctx: CheckContext,
    ) -> TypeId {
        let call_args = self.call_arguments(args, ctx);
        if call_args.iter().any(|a| a.ty == TypeId::DYNAMIC) {
            self.dynamic_sites.push((
                expr.id,
                DynamicCallSite::new(
                    DynamicOperation::Invocation,
                    call_args.iter().map(|a| a.ty),
                ),
            ));
            return TypeId::DYNAMIC;
        }

        match &target.kind {
            ExprKind::Ident(name) => {
                self.unqualified_call(expr, *name, &[], &call_args, ctx)
            }
            ExprKind::GenericName { name, type_args } => {
                let targs: Vec<TypeId> =
                    type_args.iter().map(|t| self.resolve_type(t)).collect();
                self.unqualified_call(expr, *name, &targs, &call_args, ctx)
            }
            ExprKind::Member {
                target: receiver,
                name,
                type_args,
                null_conditional: _,
            } => {
                let targs: Vec<TypeId> =
                    type_args.iter().map(|t| self.resolve_type(t)).collect();
                match self.receiver_of(receiver, ctx) {
                    Target::Error => TypeId::ERROR,
                    Target::Ty(ty) => {
                        self.member_call(expr, ty, *name, &targs, &call_args, true)
                    }
                    Target::Value(ty) => {
                        if ty == TypeId::DYNAMIC {
                            self.dynamic_sites.push((
                                expr.id,
                                DynamicCallSite::new(
                                    DynamicOperation::Invocation,
                                    call_args.iter().map(|a| a.ty),
                                ),
                            ));
                            return TypeId::DYNAMIC;
                        }
                        self.member_call(expr, ty, *name, &targs, &call_args, false)
                    }
                }
            }
            _ => {
                let callee = self.type_of(target, ctx);
                self.invoke_value(callee, &call_args, expr.span)
            }
        }
    }

    /// `M(...)` with no receiver: a local delegate or a member of the
    /// enclosing type.
    fn unqualified_call(
        &mut self,
        expr: &Expr,
        name: Name,
        type_args: &[TypeId],
        call_args: &[CallArgument],
        _ctx: CheckContext,
    ) -> TypeId {
        if let Some(local) = self.scopes.lookup(name) {
            let callee = local.ty;
            return self.invoke_value(callee, call_args, expr.span);
        }
        let Some(def) = self.method.def else {
            return self.unresolved_call(name, expr.span);
        };
        let symbols = self.symbols;
        let members = symbols.find_members(self.pool, def, name);
        if members.is_empty() {
            return self.unresolved_call(name, expr.span);
        }
        let receiver_args: Vec<TypeId> = match self.pool.data(self.method.this_ty) {
            TypeData::Named { args, .. } => args,
            _ => Vec::new(),
        };
        self.resolve_member_call(expr, &members, def, &receiver_args, type_args, call_args, None)
    }

    fn member_call(
        &mut self,
        expr: &Expr,
        receiver: TypeId,
        name: Name,
        type_args: &[TypeId],
        call_args: &[CallArgument],
        static_receiver: bool,
    ) -> TypeId {
        if receiver.is_error() {
            return TypeId::ERROR;
        }
        let (def, receiver_args) = match self.pool.data(receiver) {
            TypeData::Named { def, args } => (def, args),
            _ => return self.missing_member(receiver, name, expr.span),
        };
        let symbols = self.symbols;
        let members = symbols.find_members(self.pool, def, name);
        if members.is_empty() {
            return self.missing_member(receiver, name, expr.span);
        }
        self.resolve_member_call(
            expr,
            &members,
            def,
            &receiver_args,
            type_args,
            call_args,
            Some(static_receiver),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_member_call(
        &mut self,
        expr: &Expr,
        members: &[&MemberSymbol],
        def: TypeDefId,
        receiver_args: &[TypeId],
        type_args: &[TypeId],
        call_args: &[CallArgument],
        static_receiver: Option<bool>,
    ) -> TypeId {
        let methods: Vec<&MemberSymbol> = members
            .iter()
            .filter(|m| m.signature().is_some())
            .filter(|m| static_receiver.map_or(true, |s| m.is_static == s))
            .copied()
            .collect();

        if methods.is_empty() {
            // a field or property holding a delegate is still callable
            if let Some(ty) = members.first().and_then(|m| m.value_type()) {
                let callee = self.substitute_for(ty, members, def, receiver_args);
                return self.invoke_value(callee, call_args, expr.span);
            }
            return self.unresolved_call(
                members.first().map_or(Name::EMPTY, |m| m.name),
                expr.span,
            );
        }

        let mut candidates = Vec::with_capacity(methods.len());
        let mut rets = Vec::with_capacity(methods.len());
        for method in &methods {
            let Some(sig) = method.signature() else { continue };
            let mut args_for_sub = receiver_args.to_vec();
            if sig.type_param_count as usize == type_args.len() {
                args_for_sub.extend_from_slice(type_args);
            }
            let substitute = method.owner == def;
            candidates.push(self.candidate_of(sig, def, &args_for_sub, substitute));
            rets.push(if substitute {
                self.pool.substitute(sig.ret, def, &args_for_sub)
            } else {
                sig.ret
            });
        }

        let name = methods.first().map_or(Name::EMPTY, |m| m.name);
        match resolve_overload(self.pool, &candidates, call_args) {
            Ok(index) => rets[index],
            Err(error) => {
                self.report_overload_error(error, name, &candidates, call_args, expr.span);
                TypeId::ERROR
            }
        }
    }

    /// Call through a value of function or delegate type.
    fn invoke_value(&mut self, callee: TypeId, call_args: &[CallArgument], span: Span) -> TypeId {
        if callee.is_error() {
            return TypeId::ERROR;
        }
        if callee == TypeId::DYNAMIC {
            return TypeId::DYNAMIC;
        }
        let signature = match self.pool.data(callee) {
            TypeData::Function { params, ret } => Some((params, ret)),
            TypeData::Named { def, ref args } => match self.pool.def_kind(def) {
                TypeDefKind::Delegate { params, ret } => Some((
                    params
                        .iter()
                        .map(|&p| self.pool.substitute(p, def, args))
                        .collect(),
                    self.pool.substitute(ret, def, args),
                )),
                _ => None,
            },
            _ => None,
        };
        let Some((params, ret)) = signature else {
            let name = self.pool.display(callee, self.interner);
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!("a value of type `{name}` is not callable"))
                    .with_label(span, "called here"),
            );
            return TypeId::ERROR;
        };
        if params.len() != call_args.len() {
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!(
                        "this call takes {} argument(s), found {}",
                        params.len(),
                        call_args.len()
                    ))
                    .with_label(span, "wrong argument count"),
            );
            return TypeId::ERROR;
        }
        for (&param, arg) in params.iter().zip(call_args) {
            self.require_implicit(arg.ty, param, span);
        }
        ret
    }

    fn unresolved_call(&mut self, name: Name, span: Span) -> TypeId {
        let text = self.interner.lookup(name);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("cannot resolve the name `{text}`"))
                .with_label(span, "not found in this scope"),
        );
        TypeId::ERROR
    }

    fn call_arguments(&mut self, args: &[Argument], ctx: CheckContext) -> Vec<CallArgument> {
        args.iter()
            .map(|arg| CallArgument {
                name: arg.name,
                ty: self.type_of(&arg.expr, ctx),
                modifier: call_modifier(arg.modifier),
            })
            .collect()
    }

    fn candidate_of(
        &self,
        sig: &Signature,
        owner: TypeDefId,
        args: &[TypeId],
        substitute: bool,
    ) -> Candidate {
        Candidate {
            params: sig
                .params
                .iter()
                .map(|p| ParamSig {
                    name: p.name,
                    ty: if substitute {
                        self.pool.substitute(p.ty, owner, args)
                    } else {
                        p.ty
                    },
                    modifier: p.modifier,
                    has_default: p.has_default,
                })
                .collect(),
            is_generic: sig.is_generic(),
        }
    }

    fn report_overload_error(
        &mut self,
        error: OverloadError,
        name: Name,
        candidates: &[Candidate],
        call_args: &[CallArgument],
        span: Span,
    ) {
        let text = self.interner.lookup(name);
        match error {
            OverloadError::NoApplicableCandidate { closest } => {
                let orphan = call_args.iter().find_map(|a| {
                    a.name.filter(|n| {
                        !candidates
                            .iter()
                            .any(|c| c.params.iter().any(|p| p.name == *n))
                    })
                });
                if let Some(orphan) = orphan {
                    let label = self.interner.lookup(orphan);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2013)
                            .with_message(format!(
                                "no overload of `{text}` has a parameter named `{label}`"
                            ))
                            .with_label(span, "named argument here"),
                    );
                    return;
                }
                let mut diagnostic = Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!("no overload of `{text}` matches these arguments"))
                    .with_label(span, "called here");
                if let Some(index) = closest {
                    diagnostic = diagnostic.with_note(format!(
                        "closest match: `{}`",
                        self.candidate_display(text, &candidates[index])
                    ));
                }
                self.diagnostics.push(diagnostic);
            }
            OverloadError::AmbiguousCall(tied) => {
                let mut diagnostic = Diagnostic::error(ErrorCode::E2005)
                    .with_message(format!(
                        "the call to `{text}` is ambiguous between {} overloads",
                        tied.len()
                    ))
                    .with_label(span, "ambiguous call");
                for &index in tied.iter().take(2) {
                    diagnostic = diagnostic.with_note(format!(
                        "candidate: `{}`",
                        self.candidate_display(text, &candidates[index])
                    ));
                }
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn candidate_display(&self, name: &str, candidate: &Candidate) -> String {
        let params: Vec<String> = candidate
            .params
            .iter()
            .map(|p| self.pool.display(p.ty, self.interner))
            .collect();
        format!("{name}({})", params.join(", "))
    }

    // === Element access ===

    fn index_type(
        &mut self,
        expr: &Expr,
        target: &Expr,
        args: &[Argument],
        null_conditional: bool,
        ctx: CheckContext,
    ) -> TypeId {
        let target_ty = self.type_of(target, ctx);
        let call_args = self.call_arguments(args, ctx);
        if target_ty.is_error() {
            return TypeId::ERROR;
        }
        if target_ty == TypeId::DYNAMIC {
            self.dynamic_sites.push((
                expr.id,
                DynamicCallSite::new(DynamicOperation::Index, call_args.iter().map(|a| a.ty)),
            ));
            return TypeId::DYNAMIC;
        }
        let receiver = if null_conditional {
            self.pool.nullable_underlying(target_ty).unwrap_or(target_ty)
        } else {
            target_ty
        };
        let element = self.index_element(expr, receiver, &call_args, args);
        if null_conditional && !element.is_error() && self.pool.is_value_type(element) {
            self.pool.nullable(element)
        } else {
            element
        }
    }

    fn index_element(
        &mut self,
        expr: &Expr,
        receiver: TypeId,
        call_args: &[CallArgument],
        args: &[Argument],
    ) -> TypeId {
        if receiver == TypeId::STRING {
            for arg in call_args {
                self.require_implicit(arg.ty, TypeId::INT, expr.span);
            }
            return TypeId::CHAR;
        }
        match self.pool.data(receiver) {
            TypeData::Array { element, rank } => {
                if call_args.len() != rank as usize {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2004)
                            .with_message(format!(
                                "this array takes {} index(es), found {}",
                                rank,
                                call_args.len()
                            ))
                            .with_label(expr.span, "indexed here"),
                    );
                    return TypeId::ERROR;
                }
                for (arg, node) in call_args.iter().zip(args) {
                    self.require_implicit(arg.ty, TypeId::INT, node.span);
                }
                element
            }
            TypeData::Named { def, args: targs } => {
                let symbols = self.symbols;
                let indexers: Vec<&MemberSymbol> = symbols
                    .find_members(self.pool, def, self.names.indexer)
                    .into_iter()
                    .filter(|m| {
                        matches!(&m.kind, MemberKind::Property { index_params, .. }
                            if !index_params.is_empty())
                    })
                    .collect();
                if indexers.is_empty() {
                    let name = self.pool.display(receiver, self.interner);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2004)
                            .with_message(format!("`{name}` has no indexer"))
                            .with_label(expr.span, "indexed here"),
                    );
                    return TypeId::ERROR;
                }
                let mut candidates = Vec::with_capacity(indexers.len());
                let mut rets = Vec::with_capacity(indexers.len());
                for indexer in &indexers {
                    let MemberKind::Property {
                        ty, index_params, ..
                    } = &indexer.kind
                    else {
                        continue;
                    };
                    let substitute = indexer.owner == def;
                    candidates.push(Candidate {
                        params: index_params
                            .iter()
                            .map(|p| ParamSig {
                                name: p.name,
                                ty: if substitute {
                                    self.pool.substitute(p.ty, def, &targs)
                                } else {
                                    p.ty
                                },
                                modifier: p.modifier,
                                has_default: p.has_default,
                            })
                            .collect(),
                        is_generic: false,
                    });
                    rets.push(if substitute {
                        self.pool.substitute(*ty, def, &targs)
                    } else {
                        *ty
                    });
                }
                match resolve_overload(self.pool, &candidates, call_args) {
                    Ok(index) => rets[index],
                    Err(error) => {
                        self.report_overload_error(
                            error,
                            self.names.indexer,
                            &candidates,
                            call_args,
                            expr.span,
                        );
                        TypeId::ERROR
                    }
                }
            }
            _ => {
                let name = self.pool.display(receiver, self.interner);
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E2004)
                        .with_message(format!("`{name}` cannot be indexed"))
                        .with_label(expr.span, "indexed here"),
                );
                TypeId::ERROR
            }
        }
    }

    // === Object creation ===

    fn new_type(
        &mut self,
        expr: &Expr,
        ty: &ParsedType,
        args: &[Argument],
        initializer: Option<&[Expr]>,
        ctx: CheckContext,
    ) -> TypeId {
        let target = self.resolve_type(ty);
        self.check_instantiation(target, ty.span);
        let call_args = self.call_arguments(args, ctx);
        if target.is_error() {
            return TypeId::ERROR;
        }

        if let TypeData::Named { def, args: targs } = self.pool.data(target) {
            if matches!(self.pool.def_kind(def), TypeDefKind::Delegate { .. }) {
                // delegate creation wraps a method group or another
                // delegate; the single argument was typed above
                return target;
            }
            let symbols = self.symbols;
            let ctors: Vec<&MemberSymbol> = symbols
                .members_of(def)
                .iter()
                .filter(|m| m.name == self.names.ctor)
                .collect();
            if ctors.is_empty() {
                // the implicit default constructor takes no arguments
                if !call_args.is_empty() {
                    let name = self.pool.display(target, self.interner);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2004)
                            .with_message(format!(
                                "`{name}` only has the default constructor, which takes \
                                 no arguments"
                            ))
                            .with_label(expr.span, "arguments here"),
                    );
                }
            } else {
                let mut candidates = Vec::with_capacity(ctors.len());
                for ctor in &ctors {
                    let Some(sig) = ctor.signature() else { continue };
                    candidates.push(self.candidate_of(sig, def, &targs, true));
                }
                if let Err(error) = resolve_overload(self.pool, &candidates, &call_args) {
                    self.report_overload_error(
                        error,
                        self.pool.def_name(def),
                        &candidates,
                        &call_args,
                        expr.span,
                    );
                }
            }
            if let Some(initializer) = initializer {
                self.check_initializer(initializer, def, &targs, ctx);
            }
        } else if !call_args.is_empty() {
            let name = self.pool.display(target, self.interner);
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E2004)
                    .with_message(format!("`{name}` has no constructor taking arguments"))
                    .with_label(expr.span, "arguments here"),
            );
        }
        target
    }

    /// Object initializer entries: `Name = value` assigns a member of
    /// the constructed type; anything else is a collection element.
    fn check_initializer(
        &mut self,
        entries: &[Expr],
        def: TypeDefId,
        targs: &[TypeId],
        ctx: CheckContext,
    ) {
        for entry in entries {
            match &entry.kind {
                ExprKind::Assign {
                    op: AssignOp::Simple,
                    lhs,
                    rhs,
                } => {
                    let value_ty = self.type_of(rhs, ctx);
                    if let ExprKind::Ident(name) = lhs.kind {
                        let symbols = self.symbols;
                        let members = symbols.find_members(self.pool, def, name);
                        match members.first().and_then(|m| m.value_type()) {
                            Some(member_ty) => {
                                let member_ty =
                                    self.substitute_for(member_ty, &members, def, targs);
                                self.record(lhs.id, member_ty);
                                self.record(entry.id, member_ty);
                                self.require_implicit(value_ty, member_ty, rhs.span);
                            }
                            None => {
                                let receiver = self.pool.named(def, targs.to_vec());
                                self.missing_member(receiver, name, lhs.span);
                            }
                        }
                    }
                }
                _ => {
                    self.type_of(entry, ctx);
                }
            }
        }
    }

    fn new_array_type(
        &mut self,
        element: Option<&ParsedType>,
        lengths: &[Expr],
        rank: u8,
        initializer: Option<&[Expr]>,
        ctx: CheckContext,
    ) -> TypeId {
        for length in lengths {
            let ty = self.type_of(length, ctx);
            self.require_implicit(ty, TypeId::INT, length.span);
        }
        let element_ty = match element {
            Some(ty) => self.resolve_type(ty),
            None => {
                // `new[] { ... }` infers the element from the first value
                match initializer.and_then(|init| init.first()) {
                    Some(first) => self.type_of(first, ctx),
                    None => TypeId::ERROR,
                }
            }
        };
        if let Some(initializer) = initializer {
            let inferred = element.is_none();
            for (index, value) in initializer.iter().enumerate() {
                if inferred && index == 0 {
                    continue;
                }
                let ty = self.type_of(value, ctx);
                self.require_implicit(ty, element_ty, value.span);
            }
        }
        self.pool.array(element_ty, rank)
    }

    fn anonymous_type(&mut self, members: &[AnonymousMember], ctx: CheckContext) -> TypeId {
        let mut tys = Vec::with_capacity(members.len());
        let mut names = Vec::with_capacity(members.len());
        for member in members {
            tys.push(self.type_of(&member.value, ctx));
            names.push(member.name.or_else(|| projected_name(&member.value)));
        }
        self.pool.tuple(tys, names)
    }

    // === Lambdas and queries ===

    fn lambda_type(
        &mut self,
        params: &[csf_ir::ast::LambdaParam],
        body: &LambdaBody,
        is_async: bool,
        ctx: CheckContext,
    ) -> TypeId {
        // without a target type, only fully annotated lambdas get a type
        if params.iter().any(|p| p.ty.is_none()) {
            return TypeId::ERROR;
        }
        let param_tys: Vec<TypeId> = params
            .iter()
            .map(|p| {
                p.ty.as_ref()
                    .map_or(TypeId::ERROR, |ty| self.resolve_type(ty))
            })
            .collect();

        self.scopes.push();
        for (param, &ty) in params.iter().zip(&param_tys) {
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
        let ret = match body {
            LambdaBody::Expr(expr) => self.type_of(expr, ctx),
            LambdaBody::Block(block) => {
                // the error return silences mismatched-return diagnostics;
                // lambda return types come from the target type
                let inner = MethodEnv {
                    def: self.method.def,
                    this_ty: self.method.this_ty,
                    ret: TypeId::ERROR,
                    is_static: self.method.is_static,
                    has_yield: false,
                    is_async,
                };
                let saved = std::mem::replace(&mut self.method, inner);
                self.check_stmt(block, ctx);
                self.method = saved;
                TypeId::VOID
            }
        };
        self.finish_scope();
        self.pool.function(param_tys, ret)
    }

    /// Query expressions type as `dynamic`: the range variables have no
    /// static type without full method-chain translation, but every
    /// embedded expression is still walked.
    fn query_type(&mut self, query: &QueryExpr, ctx: CheckContext) -> TypeId {
        self.type_of(&query.source, ctx);
        if let Some(ty) = &query.range_ty {
            self.resolve_type(ty);
        }
        self.scopes.push();
        self.declare_range_var(query.range_var, query.source.span);
        for clause in &query.clauses {
            match clause {
                QueryClause::From { name, ty, source } => {
                    self.type_of(source, ctx);
                    if let Some(ty) = ty {
                        self.resolve_type(ty);
                    }
                    self.declare_range_var(*name, source.span);
                }
                QueryClause::Let { name, value } => {
                    self.type_of(value, ctx);
                    self.declare_range_var(*name, value.span);
                }
                QueryClause::Where(cond) => {
                    self.type_of(cond, ctx);
                }
                QueryClause::Join {
                    name,
                    source,
                    left,
                    right,
                    into,
                } => {
                    self.type_of(source, ctx);
                    self.declare_range_var(*name, source.span);
                    self.type_of(left, ctx);
                    self.type_of(right, ctx);
                    if let Some(into) = into {
                        self.declare_range_var(*into, source.span);
                    }
                }
                QueryClause::OrderBy(orderings) => {
                    for (key, _) in orderings {
                        self.type_of(key, ctx);
                    }
                }
            }
        }
        match &query.terminal {
            QueryFinal::Select(expr) => {
                self.type_of(expr, ctx);
            }
            QueryFinal::GroupBy { element, key } => {
                self.type_of(element, ctx);
                self.type_of(key, ctx);
            }
        }
        if let Some((name, rest)) = &query.continuation {
            self.declare_range_var(*name, query.source.span);
            self.query_type(rest, ctx);
        }
        self.finish_scope();
        TypeId::DYNAMIC
    }

    fn declare_range_var(&mut self, name: Name, span: Span) {
        let local = Local {
            ty: TypeId::DYNAMIC,
            kind: LocalKind::Iteration,
            span,
            used: false,
            const_value: None,
        };
        if let Err(error) = self.scopes.declare(name, local) {
            self.report_declare_error(name, span, error);
        }
    }

    // === Operators ===

    fn binary_type(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        lt: TypeId,
        rt: TypeId,
        _ctx: CheckContext,
    ) -> TypeId {
        if lt.is_error() || rt.is_error() {
            return TypeId::ERROR;
        }
        if lt == TypeId::DYNAMIC || rt == TypeId::DYNAMIC {
            self.dynamic_sites.push((
                expr.id,
                DynamicCallSite::new(DynamicOperation::Binary(op), [lt, rt]),
            ));
            return TypeId::DYNAMIC;
        }

        match op {
            BinaryOp::LogAnd | BinaryOp::LogOr => {
                self.require_implicit(lt, TypeId::BOOL, expr.span);
                self.require_implicit(rt, TypeId::BOOL, expr.span);
                return TypeId::BOOL;
            }
            BinaryOp::Coalesce => return self.coalesce_type(lt, rt, expr.span),
            _ => {}
        }

        if let Some(name) = op.operator_method_name() {
            if let Some(result) = self.user_binary(expr, name, lt, rt) {
                return result;
            }
        }
        if let Some(result) = self.builtin_binary(op, lt, rt) {
            return result;
        }

        let left = self.pool.display(lt, self.interner);
        let right = self.pool.display(rt, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "operator `{}` cannot be applied to `{left}` and `{right}`",
                    op.symbol()
                ))
                .with_label(expr.span, "no such operator"),
        );
        TypeId::ERROR
    }

    fn coalesce_type(&mut self, lt: TypeId, rt: TypeId, span: Span) -> TypeId {
        if lt == TypeId::NULL {
            return rt;
        }
        if let Some(underlying) = self.pool.nullable_underlying(lt) {
            let to_underlying =
                classify_conversion(self.pool, rt, underlying, ConversionContext::IMPLICIT);
            if to_underlying.is_implicit() {
                return underlying;
            }
            let widened = classify_conversion(self.pool, underlying, rt, ConversionContext::IMPLICIT);
            if widened.is_implicit() {
                return rt;
            }
            self.type_mismatch(rt, underlying, span);
            return TypeId::ERROR;
        }
        if self.pool.is_reference_type(lt) {
            self.require_implicit(rt, lt, span);
            return lt;
        }
        let name = self.pool.display(lt, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "the left side of `??` must be nullable or a reference type, found `{name}`"
                ))
                .with_label(span, "never null"),
        );
        TypeId::ERROR
    }

    /// Try user-declared operators on either operand's type. `None`
    /// falls through to the built-in operators.
    fn user_binary(&mut self, expr: &Expr, name: &str, lt: TypeId, rt: TypeId) -> Option<TypeId> {
        let op_name = self.interner.intern(name);
        let mut candidates = Vec::new();
        let mut rets = Vec::new();
        let mut seen = Vec::new();
        let any_lifted = self.pool.nullable_underlying(lt).is_some()
            || self.pool.nullable_underlying(rt).is_some();

        for operand in [lt, rt] {
            let stripped = self.pool.nullable_underlying(operand).unwrap_or(operand);
            let TypeData::Named { def, args } = self.pool.data(stripped) else {
                continue;
            };
            if seen.contains(&def) {
                continue;
            }
            seen.push(def);
            let symbols = self.symbols;
            for member in symbols.find_members(self.pool, def, op_name) {
                let Some(sig) = member.signature() else { continue };
                if sig.params.len() != 2 {
                    continue;
                }
                let substitute = member.owner == def;
                let candidate = self.candidate_of(sig, def, &args, substitute);
                let ret = if substitute {
                    self.pool.substitute(sig.ret, def, &args)
                } else {
                    sig.ret
                };
                if any_lifted && candidate.params.iter().all(|p| self.pool.is_value_type(p.ty)) {
                    let lifted = Candidate {
                        params: candidate
                            .params
                            .iter()
                            .map(|p| ParamSig {
                                name: p.name,
                                ty: self.pool.nullable(p.ty),
                                modifier: p.modifier,
                                has_default: p.has_default,
                            })
                            .collect(),
                        is_generic: candidate.is_generic,
                    };
                    candidates.push(lifted);
                    rets.push(if ret == TypeId::BOOL {
                        TypeId::BOOL
                    } else {
                        self.pool.nullable(ret)
                    });
                }
                candidates.push(candidate);
                rets.push(ret);
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let arguments = [
            CallArgument {
                name: None,
                ty: lt,
                modifier: ParamModifier::Value,
            },
            CallArgument {
                name: None,
                ty: rt,
                modifier: ParamModifier::Value,
            },
        ];
        match resolve_overload(self.pool, &candidates, &arguments) {
            Ok(index) => Some(rets[index]),
            Err(OverloadError::AmbiguousCall(_)) => {
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E2005)
                        .with_message(format!("the user-defined operator `{name}` is ambiguous"))
                        .with_label(expr.span, "ambiguous operator"),
                );
                Some(TypeId::ERROR)
            }
            Err(OverloadError::NoApplicableCandidate { .. }) => None,
        }
    }

    fn builtin_binary(&mut self, op: BinaryOp, lt: TypeId, rt: TypeId) -> Option<TypeId> {
        use crate::const_eval::numeric_promote;

        if op == BinaryOp::Add && (lt == TypeId::STRING || rt == TypeId::STRING) {
            if lt != TypeId::VOID && rt != TypeId::VOID {
                return Some(TypeId::STRING);
            }
            return None;
        }

        match op {
            BinaryOp::Shl | BinaryOp::Shr => {
                if lt.is_integral() && self.implicit_exists(rt, TypeId::INT) {
                    return Some(shift_promote(lt));
                }
                None
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                if let Some(promoted) = numeric_promote(lt, rt) {
                    return Some(promoted);
                }
                // enum arithmetic: E + underlying, E - E, E - underlying
                if let Some(underlying) = self.pool.enum_underlying(lt) {
                    if op == BinaryOp::Sub && rt == lt {
                        return Some(underlying);
                    }
                    if matches!(op, BinaryOp::Add | BinaryOp::Sub)
                        && self.implicit_exists(rt, underlying)
                    {
                        return Some(lt);
                    }
                }
                if let Some(underlying) = self.pool.enum_underlying(rt) {
                    if op == BinaryOp::Add && self.implicit_exists(lt, underlying) {
                        return Some(rt);
                    }
                }
                self.lifted_binary(op, lt, rt)
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                if lt == TypeId::BOOL && rt == TypeId::BOOL {
                    return Some(TypeId::BOOL);
                }
                if lt == rt && self.pool.enum_underlying(lt).is_some() {
                    return Some(lt);
                }
                if lt.is_integral() && rt.is_integral() {
                    return numeric_promote(lt, rt);
                }
                self.lifted_binary(op, lt, rt)
            }
            BinaryOp::Eq | BinaryOp::NotEq => {
                if numeric_promote(lt, rt).is_some()
                    || (lt == TypeId::BOOL && rt == TypeId::BOOL)
                    || (lt == rt && self.pool.enum_underlying(lt).is_some())
                {
                    return Some(TypeId::BOOL);
                }
                if self.null_comparable(lt, rt) || self.null_comparable(rt, lt) {
                    return Some(TypeId::BOOL);
                }
                if self.pool.reference_convertible(lt, rt)
                    || self.pool.reference_convertible(rt, lt)
                {
                    return Some(TypeId::BOOL);
                }
                self.lifted_binary(op, lt, rt)
            }
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                if numeric_promote(lt, rt).is_some()
                    || (lt == rt && self.pool.enum_underlying(lt).is_some())
                {
                    return Some(TypeId::BOOL);
                }
                self.lifted_binary(op, lt, rt)
            }
            _ => None,
        }
    }

    /// Nullable lifting for built-in operators: strip, compute on the
    /// underlying types, and rewrap non-comparison results.
    fn lifted_binary(&mut self, op: BinaryOp, lt: TypeId, rt: TypeId) -> Option<TypeId> {
        let lu = self.pool.nullable_underlying(lt);
        let ru = self.pool.nullable_underlying(rt);
        if lu.is_none() && ru.is_none() {
            // null literal against a nullable is covered by lifting; a
            // plain operand pairs with the other side's underlying
            return None;
        }
        let lu = lu.unwrap_or(lt);
        let ru = ru.unwrap_or(rt);
        if lu == TypeId::NULL || ru == TypeId::NULL {
            return None;
        }
        let base = self.builtin_binary(op, lu, ru)?;
        if op.is_comparison() {
            Some(TypeId::BOOL)
        } else {
            Some(self.pool.nullable(base))
        }
    }

    fn null_comparable(&self, null_side: TypeId, other: TypeId) -> bool {
        null_side == TypeId::NULL
            && (self.pool.is_reference_type(other)
                || self.pool.nullable_underlying(other).is_some()
                || other == TypeId::NULL)
    }

    fn implicit_exists(&self, source: TypeId, target: TypeId) -> bool {
        classify_conversion(self.pool, source, target, ConversionContext::IMPLICIT).is_implicit()
    }

    fn unary_type(
        &mut self,
        expr: &Expr,
        op: UnaryOp,
        operand: &Expr,
        ctx: CheckContext,
    ) -> TypeId {
        let ty = self.type_of(operand, ctx);
        if ty.is_error() {
            return TypeId::ERROR;
        }
        match op {
            UnaryOp::Await => {
                if !ctx.allows_await() {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2011)
                            .with_message("`await` cannot appear inside a `lock` body")
                            .with_label(expr.span, "await here"),
                    );
                }
                ty
            }
            UnaryOp::AddressOf => {
                self.require_unsafe_op(ctx, expr.span);
                self.pool.pointer(ty)
            }
            UnaryOp::Deref => {
                self.require_unsafe_op(ctx, expr.span);
                match self.pool.data(ty) {
                    TypeData::Pointer(element) => element,
                    _ => {
                        let name = self.pool.display(ty, self.interner);
                        self.diagnostics.push(
                            Diagnostic::error(ErrorCode::E2001)
                                .with_message(format!("cannot dereference `{name}`"))
                                .with_label(expr.span, "not a pointer"),
                        );
                        TypeId::ERROR
                    }
                }
            }
            _ if ty == TypeId::DYNAMIC => {
                self.dynamic_sites.push((
                    expr.id,
                    DynamicCallSite::new(DynamicOperation::Unary(op), [ty]),
                ));
                TypeId::DYNAMIC
            }
            UnaryOp::Plus => {
                if ty.is_numeric() || ty == TypeId::CHAR {
                    return unary_promote(ty);
                }
                self.user_unary(expr, op, ty)
            }
            UnaryOp::Minus => {
                if ty == TypeId::ULONG {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message("cannot negate a `ulong` value")
                            .with_label(expr.span, "negated here"),
                    );
                    return TypeId::ERROR;
                }
                if ty == TypeId::UINT {
                    return TypeId::LONG;
                }
                if ty.is_numeric() || ty == TypeId::CHAR {
                    return unary_promote(ty);
                }
                self.user_unary(expr, op, ty)
            }
            UnaryOp::Not => {
                if self.implicit_exists(ty, TypeId::BOOL) {
                    return TypeId::BOOL;
                }
                self.user_unary(expr, op, ty)
            }
            UnaryOp::BitNot => {
                if ty.is_integral() {
                    return unary_promote(ty);
                }
                if self.pool.enum_underlying(ty).is_some() {
                    return ty;
                }
                self.user_unary(expr, op, ty)
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                if ty.is_numeric()
                    || ty == TypeId::CHAR
                    || self.pool.enum_underlying(ty).is_some()
                    || matches!(self.pool.data(ty), TypeData::Pointer(_))
                {
                    return ty;
                }
                self.user_unary(expr, op, ty)
            }
        }
    }

    fn user_unary(&mut self, expr: &Expr, op: UnaryOp, ty: TypeId) -> TypeId {
        let result = op.operator_method_name().and_then(|name| {
            let op_name = self.interner.intern(name);
            let lifted = self.pool.nullable_underlying(ty);
            let stripped = lifted.unwrap_or(ty);
            let TypeData::Named { def, args } = self.pool.data(stripped) else {
                return None;
            };
            let symbols = self.symbols;
            let mut candidates = Vec::new();
            let mut rets = Vec::new();
            for member in symbols.find_members(self.pool, def, op_name) {
                let Some(sig) = member.signature() else { continue };
                if sig.params.len() != 1 {
                    continue;
                }
                let substitute = member.owner == def;
                let mut candidate = self.candidate_of(sig, def, &args, substitute);
                let mut ret = if substitute {
                    self.pool.substitute(sig.ret, def, &args)
                } else {
                    sig.ret
                };
                if lifted.is_some() {
                    for param in &mut candidate.params {
                        param.ty = self.pool.nullable(param.ty);
                    }
                    ret = self.pool.nullable(ret);
                }
                candidates.push(candidate);
                rets.push(ret);
            }
            let arguments = [CallArgument {
                name: None,
                ty,
                modifier: ParamModifier::Value,
            }];
            resolve_overload(self.pool, &candidates, &arguments)
                .ok()
                .map(|index| rets[index])
        });
        match result {
            Some(ty) => ty,
            None => {
                let name = self.pool.display(ty, self.interner);
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "operator `{}` cannot be applied to `{name}`",
                            op.symbol()
                        ))
                        .with_label(expr.span, "no such operator"),
                );
                TypeId::ERROR
            }
        }
    }

    fn conditional_type(&mut self, t1: TypeId, t2: TypeId, span: Span) -> TypeId {
        if t1.is_error() || t2.is_error() {
            return TypeId::ERROR;
        }
        if t1 == TypeId::DYNAMIC || t2 == TypeId::DYNAMIC {
            return TypeId::DYNAMIC;
        }
        if t1 == t2 {
            return t1;
        }
        if self.implicit_exists(t1, t2) {
            return t2;
        }
        if self.implicit_exists(t2, t1) {
            return t1;
        }
        let first = self.pool.display(t1, self.interner);
        let second = self.pool.display(t2, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "the branches of `?:` have no common type: `{first}` and `{second}`"
                ))
                .with_label(span, "incompatible branches"),
        );
        TypeId::ERROR
    }

    fn require_unsafe_op(&mut self, ctx: CheckContext, span: Span) {
        if ctx.contains(CheckContext::IN_UNSAFE) {
            return;
        }
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E2012)
                .with_message("pointer operations require an unsafe context")
                .with_label(span, "pointer operation here"),
        );
    }

    // === Constant folding in checked contexts ===

    /// Evaluate in the current body's constant environment: `const`
    /// locals, then `const` members of the enclosing type.
    pub(crate) fn eval_in_body(
        &self,
        expr: &Expr,
        checked: bool,
    ) -> Result<ConstValue, ConstError> {
        let env = BodyEnv { checker: self };
        eval_const(expr, &env, self.interner, checked)
    }

    /// In a checked context, a constant subexpression that overflows is
    /// a compile-time error, not a runtime one.
    pub(crate) fn fold_checked(&mut self, expr: &Expr) {
        match self.eval_in_body(expr, true) {
            Err(ConstError::Overflow(span)) => {
                if !self.overflow_spans.contains(&span) {
                    self.overflow_spans.push(span);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2008)
                            .with_message(
                                "this constant expression overflows in a checked context",
                            )
                            .with_label(span, "overflows here"),
                    );
                }
            }
            Err(ConstError::DivideByZero(span)) => {
                if !self.overflow_spans.contains(&span) {
                    self.overflow_spans.push(span);
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E2008)
                            .with_message("this constant expression divides by zero")
                            .with_label(span, "division by zero"),
                    );
                }
            }
            _ => {}
        }
    }
}

/// Unqualified constant lookup inside a member body.
struct BodyEnv<'c, 'a> {
    checker: &'c Checker<'a>,
}

impl ConstEnv for BodyEnv<'_, '_> {
    fn lookup(&self, name: Name) -> Result<Option<ConstValue>, ConstError> {
        if let Some(value) = self.checker.scopes.constant(name) {
            return Ok(Some(value.clone()));
        }
        if let Some(def) = self.checker.method.def {
            let found = self
                .checker
                .symbols
                .find_members(self.checker.pool, def, name)
                .iter()
                .find_map(|m| m.const_value.clone());
            return Ok(found);
        }
        Ok(None)
    }

    fn lookup_member(&self, target: Name, member: Name) -> Result<Option<ConstValue>, ConstError> {
        if let [def] = self.checker.symbols.lookup_simple(target) {
            let found = self
                .checker
                .symbols
                .find_members(self.checker.pool, *def, member)
                .iter()
                .find_map(|m| m.const_value.clone());
            return Ok(found);
        }
        Ok(None)
    }
}

/// An unparenthesized `a.b.c` chain as name segments, or `None` when any
/// link is not a plain member access.
fn flatten_path(expr: &Expr) -> Option<Vec<Name>> {
    match &expr.kind {
        ExprKind::Ident(name) => Some(vec![*name]),
        ExprKind::Member {
            target,
            name,
            type_args,
            null_conditional,
        } if type_args.is_empty() && !null_conditional => {
            let mut path = flatten_path(target)?;
            path.push(*name);
            Some(path)
        }
        _ => None,
    }
}

fn projected_name(value: &Expr) -> Option<Name> {
    match &value.kind {
        ExprKind::Ident(name) => Some(*name),
        ExprKind::Member { name, .. } => Some(*name),
        _ => None,
    }
}

fn call_modifier(modifier: ArgumentModifier) -> ParamModifier {
    match modifier {
        ArgumentModifier::None => ParamModifier::Value,
        ArgumentModifier::Ref => ParamModifier::Ref,
        ArgumentModifier::Out => ParamModifier::Out,
    }
}

/// Small integral operands widen to `int` under the unary operators.
fn unary_promote(ty: TypeId) -> TypeId {
    match ty {
        TypeId::SBYTE | TypeId::BYTE | TypeId::SHORT | TypeId::USHORT | TypeId::CHAR => TypeId::INT,
        _ => ty,
    }
}

/// The left operand of a shift widens to at least `int`; the result
/// keeps its signedness.
fn shift_promote(ty: TypeId) -> TypeId {
    match ty {
        TypeId::SBYTE | TypeId::BYTE | TypeId::SHORT | TypeId::USHORT => TypeId::INT,
        _ => ty,
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

    #[test]
    fn arithmetic_and_concatenation_type_cleanly() {
        let codes = errors(
            "class C {
                string M(int n, double d) {
                    double sum = n + d;
                    return \"total: \" + sum;
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn incompatible_initializer_is_a_conversion_error() {
        assert_eq!(
            errors("class C { void M() { int x = \"hi\"; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn unresolved_name_is_reported() {
        assert_eq!(
            errors("class C { void M() { Missing(); } }"),
            vec![ErrorCode::E2002]
        );
    }

    #[test]
    fn no_matching_overload_is_reported_with_the_closest() {
        let analysis = analyze(
            "class C {
                void F(int a) { }
                void F(string a) { }
                void M() { F(true); }
            }",
        );
        let codes: Vec<ErrorCode> = analysis.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![ErrorCode::E2004]);
    }

    #[test]
    fn equally_good_overloads_are_ambiguous() {
        assert_eq!(
            errors(
                "class C {
                    void F(int a, long b) { }
                    void F(long a, int b) { }
                    void M() { F(1, 2); }
                }"
            ),
            vec![ErrorCode::E2005]
        );
    }

    #[test]
    fn named_argument_matching_no_parameter_is_reported() {
        assert_eq!(
            errors(
                "class C {
                    void F(int a) { }
                    void M() { F(b: 1); }
                }"
            ),
            vec![ErrorCode::E2013]
        );
    }

    #[test]
    fn named_arguments_pick_the_right_overload() {
        let codes = errors(
            "class C {
                int F(int width, int height) { return width * height; }
                int M() { return F(height: 2, width: 3); }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn cast_without_a_conversion_is_an_error() {
        assert_eq!(
            errors("class C { void M() { string s = (string)5; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn checked_constant_overflow_is_reported_once() {
        assert_eq!(
            errors(
                "class C {
                    void M() {
                        const int big = 2147483647;
                        int y = checked(big + 1);
                    }
                }"
            ),
            vec![ErrorCode::E2008]
        );
    }

    #[test]
    fn unchecked_constant_overflow_is_silent() {
        assert_eq!(
            errors(
                "class C {
                    void M() {
                        const int big = 2147483647;
                        int y = big + 1;
                    }
                }"
            ),
            vec![]
        );
    }

    #[test]
    fn dynamic_receiver_defers_to_a_call_site() {
        let analysis = analyze(
            "class C {
                dynamic M(dynamic d) { return d.Foo(1); }
            }",
        );
        assert_eq!(
            analysis
                .diagnostics
                .iter()
                .filter(|d| !d.code.is_warning())
                .count(),
            0
        );
        assert_eq!(analysis.dynamic_sites.len(), 1);
    }

    #[test]
    fn dynamic_operand_defers_a_binary_operator() {
        let analysis = analyze(
            "class C {
                dynamic M(dynamic d, int n) { return d + n; }
            }",
        );
        assert_eq!(analysis.dynamic_sites.len(), 1);
    }

    #[test]
    fn user_defined_operator_is_found() {
        let codes = errors(
            "class Vec {
                public static Vec operator +(Vec a, Vec b) { return a; }
            }
            class C {
                Vec M(Vec a, Vec b) { return a + b; }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn operator_without_a_definition_is_an_error() {
        assert_eq!(
            errors(
                "class Vec { }
                class C {
                    void M(Vec a, Vec b) { bool x = a < b; }
                }"
            ),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn static_member_access_through_the_type_name() {
        let codes = errors(
            "class Config {
                public static int Limit;
            }
            class C {
                int M() { return Config.Limit; }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn instance_member_through_the_type_name_is_an_error() {
        assert_eq!(
            errors(
                "class Config {
                    public int Limit;
                }
                class C {
                    int M() { return Config.Limit; }
                }"
            ),
            vec![ErrorCode::E2002]
        );
    }

    #[test]
    fn string_and_array_length_are_built_in() {
        let codes = errors(
            "class C {
                int M(string s, int[] xs) { return s.Length + xs.Length; }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn array_indexing_requires_int_indexes() {
        assert_eq!(
            errors("class C { int M(int[] xs, string k) { return xs[k]; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn conditional_branches_need_a_common_type() {
        assert_eq!(
            errors("class C { void M(bool b) { var x = b ? 1 : \"one\"; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn coalesce_on_a_non_nullable_left_side_is_an_error() {
        assert_eq!(
            errors("class C { int M(int a, int b) { return a ?? b; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn nullable_coalesce_yields_the_underlying_type() {
        let codes = errors(
            "class C {
                int M(int? a) { return a ?? 0; }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn constructor_overloads_are_resolved() {
        let codes = errors(
            "class Point {
                public int X;
                public int Y;
                public Point(int x, int y) { X = x; Y = y; }
            }
            class C {
                Point M() { return new Point(1, 2) { X = 3 }; }
            }",
        );
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn object_initializer_entries_must_name_members() {
        assert_eq!(
            errors(
                "class Point {
                    public int X;
                }
                class C {
                    Point M() { return new Point() { Z = 1 }; }
                }"
            ),
            vec![ErrorCode::E2002]
        );
    }

    #[test]
    fn negating_an_unsigned_long_is_an_error() {
        assert_eq!(
            errors("class C { void M(ulong u) { var x = -u; } }"),
            vec![ErrorCode::E2001]
        );
    }

    #[test]
    fn fully_typed_lambda_gets_a_function_type() {
        let codes = errors(
            "class C {
                void M() {
                    var f = (int a, int b) => a + b;
                    int r = f(1, 2);
                }
            }",
        );
        assert_eq!(codes, vec![]);
    }
}
