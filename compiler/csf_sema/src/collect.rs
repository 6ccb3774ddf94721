//! Declaration collection, the first of the two semantic passes.
//!
//! Walks every compilation unit, registers each declared type with the
//! pool and the symbol table, then links relations (bases, interfaces,
//! member signatures, conversion operators) and evaluates constants.
//! Forward references work because linking starts only after every
//! declaration is registered; the resulting [`GlobalSymbols`] is frozen
//! and shared read-only with the resolution pass.

use std::cell::RefCell;

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{
    CompilationUnit, Constraint, ConstraintClause, Expr, Item, Member, MethodDecl, Modifiers,
    NamespaceDecl, OperatorKind, Param, TypeDecl, TypeDeclKind, UsingDirective,
};
use csf_ir::{Name, Span, StringInterner};
use csf_types::{
    ParamModifier, TypeDef, TypeDefId, TypeDefKind, TypeId, TypeParamBounds, TypePool,
    UserConversion,
};
use rustc_hash::FxHashMap;

use crate::const_eval::{eval_const, ConstEnv, ConstError, ConstValue};
use crate::external::MetadataProvider;
use crate::resolve::{join_path, TypeResolver};
use crate::symbol::{GlobalSymbols, MemberKind, MemberSymbol, ParamSymbol, Signature};

/// Result of collecting a batch of compilation units.
pub struct Collection {
    pub symbols: GlobalSymbols,
    pub diagnostics: Vec<Diagnostic>,
}

/// Collect declarations from every unit and link them.
#[tracing::instrument(level = "debug", skip_all, fields(units = units.len()))]
pub fn collect_units(
    units: &[CompilationUnit],
    pool: &TypePool,
    interner: &StringInterner,
    metadata: &dyn MetadataProvider,
) -> Collection {
    let mut collector = Collector {
        pool,
        interner,
        metadata,
        symbols: GlobalSymbols::new(),
        diagnostics: Vec::new(),
        pending: Vec::new(),
        const_jobs: Vec::new(),
    };
    for unit in units {
        let scope = ImportScope::from_usings(interner, &unit.usings);
        collector.declare_items(&unit.items, &[], &scope);
    }
    collector.link();
    collector.evaluate_consts();
    Collection {
        symbols: collector.symbols,
        diagnostics: collector.diagnostics,
    }
}

/// Namespace prefixes and aliases visible at one declaration site.
#[derive(Clone, Default)]
pub(crate) struct ImportScope {
    pub(crate) usings: Vec<Name>,
    pub(crate) aliases: FxHashMap<Name, Name>,
}

impl ImportScope {
    pub(crate) fn from_usings(interner: &StringInterner, usings: &[UsingDirective]) -> Self {
        let mut scope = ImportScope::default();
        scope.extend(interner, usings);
        scope
    }

    pub(crate) fn extend(&mut self, interner: &StringInterner, usings: &[UsingDirective]) {
        for using in usings {
            let path = join_path(interner, &using.path);
            match using.alias {
                Some(alias) => {
                    self.aliases.insert(alias, path);
                }
                // `using static T` opens the type itself as a prefix,
                // which also makes its nested types visible unqualified
                None => self.usings.push(path),
            }
        }
    }
}

struct Pending<'a> {
    decl: &'a TypeDecl,
    def: TypeDefId,
    /// Dotted prefixes to try for unqualified names, innermost first,
    /// ending with the global namespace.
    enclosing: Vec<Name>,
    scope: ImportScope,
}

/// A constant awaiting evaluation: a `const` field initializer or an
/// enum member (implicit values continue from the previous member).
struct ConstJob<'a> {
    def: TypeDefId,
    name: Name,
    expr: Option<&'a Expr>,
    /// Previous enum member, for implicit `previous + 1` values.
    prev: Option<Name>,
    /// Enum underlying type the value is carried at.
    underlying: Option<TypeId>,
    span: Span,
}

/// Mutations produced while linking one type. Applied after the
/// resolver's borrow of the symbol table ends.
#[derive(Default)]
struct LinkSink<'a> {
    members: Vec<(TypeDefId, MemberSymbol)>,
    explicit_impls: Vec<(TypeId, Name, MemberSymbol)>,
    param_bounds: Vec<(TypeDefId, u32, TypeParamBounds)>,
    const_jobs: Vec<ConstJob<'a>>,
    diagnostics: Vec<Diagnostic>,
}

struct Collector<'a> {
    pool: &'a TypePool,
    interner: &'a StringInterner,
    metadata: &'a dyn MetadataProvider,
    symbols: GlobalSymbols,
    diagnostics: Vec<Diagnostic>,
    pending: Vec<Pending<'a>>,
    const_jobs: Vec<ConstJob<'a>>,
}

impl<'a> Collector<'a> {
    // === Phase one: register every type declaration ===

    fn declare_items(&mut self, items: &'a [Item], prefix: &[Name], scope: &ImportScope) {
        for item in items {
            match item {
                Item::Namespace(ns) => self.declare_namespace(ns, prefix, scope),
                Item::Type(decl) => self.declare_type(decl, prefix, scope),
                Item::Error(_) => {}
            }
        }
    }

    fn declare_namespace(&mut self, ns: &'a NamespaceDecl, prefix: &[Name], scope: &ImportScope) {
        let mut inner_prefix = prefix.to_vec();
        inner_prefix.extend(&ns.path);
        let mut inner_scope = scope.clone();
        inner_scope.extend(self.interner, &ns.usings);
        self.declare_items(&ns.items, &inner_prefix, &inner_scope);
    }

    fn declare_type(&mut self, decl: &'a TypeDecl, prefix: &[Name], scope: &ImportScope) {
        let kind = match decl.kind {
            TypeDeclKind::Class => TypeDefKind::Class,
            TypeDeclKind::Struct => TypeDefKind::Struct,
            TypeDeclKind::Interface => TypeDefKind::Interface,
            // underlying type and delegate signature are linked later
            TypeDeclKind::Enum => TypeDefKind::Enum {
                underlying: TypeId::INT,
            },
            TypeDeclKind::Delegate => TypeDefKind::Delegate {
                params: Vec::new(),
                ret: TypeId::VOID,
            },
        };
        let def = self.pool.add_def(TypeDef::new(decl.name, kind));
        self.pool.set_type_params(
            def,
            decl.type_params.len() as u32,
            decl.type_params.iter().map(|p| p.variance).collect(),
        );

        let mut segments = prefix.to_vec();
        segments.push(decl.name);
        let path = join_path(self.interner, &segments);
        if !self.symbols.insert_type(path, decl.name, def) {
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E2015)
                    .with_message(format!(
                        "`{}` is already declared",
                        self.interner.lookup(path)
                    ))
                    .with_label(decl.span, "duplicate declaration"),
            );
            return;
        }

        // every enclosing prefix, innermost first, down to the global
        // namespace
        let mut enclosing = Vec::with_capacity(prefix.len() + 1);
        let mut chain = prefix.to_vec();
        while !chain.is_empty() {
            enclosing.push(join_path(self.interner, &chain));
            chain.pop();
        }
        enclosing.push(Name::EMPTY);

        self.pending.push(Pending {
            decl,
            def,
            enclosing,
            scope: scope.clone(),
        });

        // nested types live at `Outer.Inner`
        for member in &decl.members {
            if let Member::NestedType(nested) = member {
                self.declare_type(nested, &segments, scope);
            }
        }
    }

    // === Phase two: link relations and member signatures ===

    fn link(&mut self) {
        for i in 0..self.pending.len() {
            let (decl, def) = (self.pending[i].decl, self.pending[i].def);
            let mut sink = LinkSink::default();
            {
                let linker = Linker {
                    pool: self.pool,
                    interner: self.interner,
                    resolver: self.resolver_for(&self.pending[i]),
                };
                linker.link_type(decl, def, &mut sink);
            }
            self.apply(sink);
        }
    }

    fn apply(&mut self, sink: LinkSink<'a>) {
        for (def, member) in sink.members {
            self.symbols.insert_member(def, member);
        }
        for (interface, name, member) in sink.explicit_impls {
            self.symbols.insert_explicit_impl(interface, name, member);
        }
        for (def, index, bounds) in sink.param_bounds {
            self.symbols.set_param_bounds(def, index, bounds);
        }
        self.const_jobs.extend(sink.const_jobs);
        self.diagnostics.extend(sink.diagnostics);
    }

    fn resolver_for<'s>(&'s self, pending: &Pending<'a>) -> TypeResolver<'s> {
        let mut type_params = FxHashMap::default();
        for (i, param) in pending.decl.type_params.iter().enumerate() {
            let bounds = flag_bounds(&pending.decl.constraints, param.name);
            let ty = self
                .pool
                .type_param(param.name, pending.def, i as u32, bounds);
            type_params.insert(param.name, ty);
        }
        TypeResolver {
            symbols: &self.symbols,
            pool: self.pool,
            interner: self.interner,
            metadata: self.metadata,
            enclosing: pending.enclosing.clone(),
            usings: pending.scope.usings.clone(),
            type_params,
            aliases: pending.scope.aliases.clone(),
        }
    }

    // === Phase three: constant evaluation with cycle detection ===

    fn evaluate_consts(&mut self) {
        let table = ConstTable {
            index: self
                .const_jobs
                .iter()
                .enumerate()
                .map(|(i, job)| ((job.def, job.name), i))
                .collect(),
            jobs: &self.const_jobs,
            states: RefCell::new(FxHashMap::default()),
            symbols: &self.symbols,
            interner: self.interner,
        };
        let mut results = Vec::new();
        for (i, job) in self.const_jobs.iter().enumerate() {
            match table.evaluate(i) {
                Ok(Some(value)) => results.push((job.def, job.name, value)),
                Ok(None) => {}
                Err(error) => self.diagnostics.push(const_diagnostic(
                    error,
                    job.span,
                    self.interner.lookup(job.name),
                )),
            }
        }
        for (def, name, value) in results {
            self.symbols.set_const_value(def, name, value);
        }
    }
}

/// Links one type declaration. Holds only shared borrows so the sink
/// can be filled while the resolver reads the symbol table.
struct Linker<'s> {
    pool: &'s TypePool,
    interner: &'s StringInterner,
    resolver: TypeResolver<'s>,
}

impl Linker<'_> {
    fn link_type<'a>(&self, decl: &'a TypeDecl, def: TypeDefId, sink: &mut LinkSink<'a>) {
        // full constraints go to the side table for instantiation
        // checks; the interned parameter carries only the flags
        for clause in &decl.constraints {
            let index = decl.type_params.iter().position(|p| p.name == clause.param);
            let Some(index) = index else { continue };
            let mut bounds = flag_bounds(&decl.constraints, clause.param);
            bounds.types = clause
                .constraints
                .iter()
                .filter_map(|c| match c {
                    Constraint::Type(ty) => Some(self.resolver.resolve(ty, &mut sink.diagnostics)),
                    _ => None,
                })
                .collect();
            sink.param_bounds.push((def, index as u32, bounds));
        }

        match decl.kind {
            TypeDeclKind::Enum => {
                let underlying = decl
                    .bases
                    .first()
                    .map(|b| self.resolver.resolve(b, &mut sink.diagnostics))
                    .filter(|t| t.is_integral())
                    .unwrap_or(TypeId::INT);
                self.pool
                    .set_def_kind(def, TypeDefKind::Enum { underlying });
                self.collect_enum_members(decl, def, underlying, sink);
                return;
            }
            TypeDeclKind::Delegate => {
                let params: Vec<TypeId> = decl
                    .delegate_params
                    .iter()
                    .map(|p| self.resolver.resolve(&p.ty, &mut sink.diagnostics))
                    .collect();
                let ret = decl.delegate_return.as_ref().map_or(TypeId::VOID, |t| {
                    self.resolver.resolve(t, &mut sink.diagnostics)
                });
                self.pool
                    .set_def_kind(def, TypeDefKind::Delegate { params, ret });
                return;
            }
            _ => {}
        }

        for base in &decl.bases {
            let resolved = self.resolver.resolve(base, &mut sink.diagnostics);
            if resolved.is_error() {
                continue;
            }
            if self.pool.is_interface(resolved) {
                self.pool.add_interface(def, resolved);
            } else if decl.kind == TypeDeclKind::Class {
                self.pool.set_base(def, resolved);
            }
        }

        for member in &decl.members {
            self.link_member(member, def, sink);
        }
    }

    fn link_member<'a>(&self, member: &'a Member, def: TypeDefId, sink: &mut LinkSink<'a>) {
        match member {
            Member::Field(field) | Member::Event(field) => {
                let is_event = matches!(member, Member::Event(_));
                let ty = self.resolver.resolve(&field.ty, &mut sink.diagnostics);
                for (name, init) in &field.declarators {
                    let kind = if is_event {
                        MemberKind::Event { ty }
                    } else {
                        MemberKind::Field {
                            ty,
                            is_const: field.is_const,
                        }
                    };
                    sink.members.push((
                        def,
                        MemberSymbol {
                            name: *name,
                            owner: def,
                            kind,
                            is_static: field.modifiers.contains(Modifiers::STATIC)
                                || field.is_const,
                            span: field.span,
                            const_value: None,
                        },
                    ));
                    if field.is_const && !is_event {
                        sink.const_jobs.push(ConstJob {
                            def,
                            name: *name,
                            expr: init.as_ref(),
                            prev: None,
                            underlying: None,
                            span: field.span,
                        });
                    }
                }
            }
            Member::Method(method) => {
                use csf_ir::ast::MethodKind;
                let name = match method.kind {
                    MethodKind::Constructor => self.interner.intern(".ctor"),
                    // static constructors and destructors never take
                    // part in lookup or overload resolution
                    MethodKind::StaticConstructor | MethodKind::Destructor => return,
                    _ => method.name,
                };
                let signature = self.method_signature(method, def, sink);
                let symbol = MemberSymbol {
                    name,
                    owner: def,
                    kind: MemberKind::Method(signature),
                    is_static: method.modifiers.contains(Modifiers::STATIC),
                    span: method.span,
                    const_value: None,
                };
                match &method.explicit_interface {
                    Some(interface) => {
                        let interface_ty = self.resolver.resolve(interface, &mut sink.diagnostics);
                        sink.explicit_impls.push((interface_ty, name, symbol));
                    }
                    None => sink.members.push((def, symbol)),
                }
            }
            Member::Property(property) => {
                let ty = self.resolver.resolve(&property.ty, &mut sink.diagnostics);
                let index_params = property
                    .index_params
                    .iter()
                    .map(|p| self.param_symbol(p, &self.resolver, sink))
                    .collect();
                let has_get = property.expr_body.is_some()
                    || property.accessors.iter().any(|a| !a.is_set);
                let has_set = property.accessors.iter().any(|a| a.is_set);
                // indexers share one name so they overload like methods
                let name = if property.index_params.is_empty() {
                    property.name
                } else {
                    self.interner.intern("this")
                };
                let symbol = MemberSymbol {
                    name,
                    owner: def,
                    kind: MemberKind::Property {
                        ty,
                        index_params,
                        has_get,
                        has_set,
                    },
                    is_static: property.modifiers.contains(Modifiers::STATIC),
                    span: property.span,
                    const_value: None,
                };
                match &property.explicit_interface {
                    Some(interface) => {
                        let interface_ty = self.resolver.resolve(interface, &mut sink.diagnostics);
                        sink.explicit_impls.push((interface_ty, name, symbol));
                    }
                    None => sink.members.push((def, symbol)),
                }
            }
            Member::Operator(op) => {
                let ret = self.resolver.resolve(&op.return_type, &mut sink.diagnostics);
                let params: Vec<ParamSymbol> = op
                    .params
                    .iter()
                    .map(|p| self.param_symbol(p, &self.resolver, sink))
                    .collect();
                match &op.op {
                    OperatorKind::Conversion { implicit } => {
                        let from = params.first().map_or(TypeId::ERROR, |p| p.ty);
                        self.pool.add_conversion(
                            def,
                            UserConversion {
                                from,
                                to: ret,
                                implicit: *implicit,
                                owner: def,
                            },
                        );
                    }
                    kind => {
                        let Some(name) = operator_name(kind) else {
                            return;
                        };
                        sink.members.push((
                            def,
                            MemberSymbol {
                                name: self.interner.intern(name),
                                owner: def,
                                kind: MemberKind::Method(Signature {
                                    params,
                                    ret,
                                    type_param_count: 0,
                                }),
                                is_static: true,
                                span: op.span,
                                const_value: None,
                            },
                        ));
                    }
                }
            }
            // registered during declaration; linked via its own
            // pending entry
            Member::NestedType(_) | Member::Error(_) => {}
        }
    }

    fn method_signature(
        &self,
        method: &MethodDecl,
        def: TypeDefId,
        sink: &mut LinkSink<'_>,
    ) -> Signature {
        // method type parameters extend the owner's, with shifted
        // indices
        let mut resolver = TypeResolver {
            symbols: self.resolver.symbols,
            pool: self.resolver.pool,
            interner: self.resolver.interner,
            metadata: self.resolver.metadata,
            enclosing: self.resolver.enclosing.clone(),
            usings: self.resolver.usings.clone(),
            type_params: self.resolver.type_params.clone(),
            aliases: self.resolver.aliases.clone(),
        };
        let owner_count = self.pool.with_def(def, |d| d.type_param_count);
        for (i, param) in method.type_params.iter().enumerate() {
            let bounds = flag_bounds(&method.constraints, param.name);
            let ty = self
                .pool
                .type_param(param.name, def, owner_count + i as u32, bounds);
            resolver.type_params.insert(param.name, ty);
        }
        let params = method
            .params
            .iter()
            .map(|p| self.param_symbol(p, &resolver, sink))
            .collect();
        let ret = method
            .return_type
            .as_ref()
            .map_or(TypeId::VOID, |t| resolver.resolve(t, &mut sink.diagnostics));
        Signature {
            params,
            ret,
            type_param_count: method.type_params.len() as u32,
        }
    }

    fn param_symbol(
        &self,
        param: &Param,
        resolver: &TypeResolver<'_>,
        sink: &mut LinkSink<'_>,
    ) -> ParamSymbol {
        use csf_ir::ast::ParamModifier as Ast;
        ParamSymbol {
            name: param.name,
            ty: resolver.resolve(&param.ty, &mut sink.diagnostics),
            modifier: match param.modifier {
                Ast::Ref => ParamModifier::Ref,
                Ast::Out => ParamModifier::Out,
                Ast::Params => ParamModifier::Params,
                Ast::None | Ast::This => ParamModifier::Value,
            },
            has_default: param.default.is_some(),
        }
    }

    fn collect_enum_members<'a>(
        &self,
        decl: &'a TypeDecl,
        def: TypeDefId,
        underlying: TypeId,
        sink: &mut LinkSink<'a>,
    ) {
        let enum_ty = self.pool.named(def, vec![]);
        let mut prev = None;
        for member in &decl.enum_members {
            sink.members.push((
                def,
                MemberSymbol {
                    name: member.name,
                    owner: def,
                    kind: MemberKind::Field {
                        ty: enum_ty,
                        is_const: true,
                    },
                    is_static: true,
                    span: member.span,
                    const_value: None,
                },
            ));
            sink.const_jobs.push(ConstJob {
                def,
                name: member.name,
                expr: member.value.as_ref(),
                prev,
                underlying: Some(underlying),
                span: member.span,
            });
            prev = Some(member.name);
        }
    }
}

fn const_diagnostic(error: ConstError, span: Span, name: &str) -> Diagnostic {
    match error {
        ConstError::Circular(_) => Diagnostic::error(ErrorCode::E2007)
            .with_message(format!("the constant `{name}` depends on itself"))
            .with_label(span, "circular definition"),
        ConstError::Overflow(at) => Diagnostic::error(ErrorCode::E2008)
            .with_message(format!(
                "the constant value of `{name}` overflows in a checked context"
            ))
            .with_label(at, "overflows here"),
        ConstError::DivideByZero(at) => Diagnostic::error(ErrorCode::E2008)
            .with_message(format!("the constant `{name}` divides by zero"))
            .with_label(at, "division by zero"),
        ConstError::NotConstant => Diagnostic::error(ErrorCode::E2001)
            .with_message(format!(
                "the initializer of `{name}` is not a constant expression"
            ))
            .with_label(span, "not constant"),
    }
}

#[derive(Clone)]
enum ConstState {
    Resolving,
    Resolved(Option<ConstValue>),
    Errored,
}

struct ConstTable<'a, 'j> {
    index: FxHashMap<(TypeDefId, Name), usize>,
    jobs: &'j [ConstJob<'a>],
    states: RefCell<FxHashMap<usize, ConstState>>,
    symbols: &'j GlobalSymbols,
    interner: &'a StringInterner,
}

impl ConstTable<'_, '_> {
    /// Evaluate one job, memoized. Re-entry while `Resolving` is a
    /// circular definition.
    fn evaluate(&self, index: usize) -> Result<Option<ConstValue>, ConstError> {
        match self.states.borrow().get(&index) {
            Some(ConstState::Resolved(value)) => return Ok(value.clone()),
            Some(ConstState::Resolving) => {
                return Err(ConstError::Circular(self.jobs[index].name));
            }
            Some(ConstState::Errored) => return Ok(None),
            None => {}
        }
        self.states
            .borrow_mut()
            .insert(index, ConstState::Resolving);

        let job = &self.jobs[index];
        let result = self.evaluate_inner(job);
        let state = match &result {
            Ok(value) => ConstState::Resolved(value.clone()),
            Err(_) => ConstState::Errored,
        };
        self.states.borrow_mut().insert(index, state);
        result
    }

    fn evaluate_inner(&self, job: &ConstJob<'_>) -> Result<Option<ConstValue>, ConstError> {
        let value = match job.expr {
            Some(expr) => {
                let env = JobEnv {
                    table: self,
                    def: job.def,
                };
                // constant expressions evaluate with checked semantics
                Some(eval_const(expr, &env, self.interner, true)?)
            }
            None => match job.underlying {
                // implicit enum value: previous + 1, or zero at the
                // start
                Some(underlying) => {
                    let base = match job.prev {
                        Some(prev) => match self.lookup_in(job.def, prev)? {
                            Some(ConstValue::Int { value, .. }) => value,
                            _ => -1,
                        },
                        None => -1,
                    };
                    Some(ConstValue::Int {
                        value: base + 1,
                        ty: underlying,
                    })
                }
                None => None,
            },
        };
        // enum values are carried at the underlying type
        match (value, job.underlying) {
            (Some(ConstValue::Int { value, .. }), Some(underlying)) => Ok(Some(ConstValue::Int {
                value,
                ty: underlying,
            })),
            (value, _) => Ok(value),
        }
    }

    fn lookup_in(&self, def: TypeDefId, name: Name) -> Result<Option<ConstValue>, ConstError> {
        match self.index.get(&(def, name)) {
            Some(&index) => self.evaluate(index),
            None => Ok(None),
        }
    }
}

struct JobEnv<'t, 'a, 'j> {
    table: &'t ConstTable<'a, 'j>,
    def: TypeDefId,
}

impl ConstEnv for JobEnv<'_, '_, '_> {
    fn lookup(&self, name: Name) -> Result<Option<ConstValue>, ConstError> {
        self.table.lookup_in(self.def, name)
    }

    fn lookup_member(&self, target: Name, member: Name) -> Result<Option<ConstValue>, ConstError> {
        if let [def] = self.table.symbols.lookup_simple(target) {
            return self.table.lookup_in(*def, member);
        }
        Ok(None)
    }
}

pub(crate) fn flag_bounds(clauses: &[ConstraintClause], param: Name) -> TypeParamBounds {
    let mut bounds = TypeParamBounds::default();
    for clause in clauses.iter().filter(|c| c.param == param) {
        for constraint in &clause.constraints {
            match constraint {
                Constraint::ReferenceType => bounds.reference = true,
                Constraint::ValueType => bounds.value = true,
                Constraint::DefaultConstructor => bounds.constructor = true,
                Constraint::Type(_) => {}
            }
        }
    }
    bounds
}

fn operator_name(kind: &OperatorKind) -> Option<&'static str> {
    match kind {
        OperatorKind::Binary(op) => op.operator_method_name(),
        OperatorKind::Unary(op) => op.operator_method_name(),
        OperatorKind::True => Some("op_True"),
        OperatorKind::False => Some("op_False"),
        OperatorKind::Conversion { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use csf_parse::parse_source;
    use pretty_assertions::assert_eq;

    use crate::external::NoMetadata;

    use super::*;

    fn collect_source(source: &str, pool: &TypePool, interner: &StringInterner) -> Collection {
        let parsed = parse_source(source, interner);
        assert_eq!(parsed.diagnostics, vec![]);
        collect_units(&[parsed.unit], pool, interner, &NoMetadata)
    }

    fn def_named(collection: &Collection, interner: &StringInterner, path: &str) -> TypeDefId {
        collection
            .symbols
            .lookup_qualified(interner.intern(path))
            .unwrap_or_else(|| panic!("`{path}` was not collected"))
    }

    #[test]
    fn forward_references_resolve() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "namespace App {
                 class Uses { Helper h; }
                 class Helper { }
             }",
            &pool,
            &interner,
        );
        assert_eq!(collection.diagnostics, vec![]);
        let uses = def_named(&collection, &interner, "App.Uses");
        let helper = def_named(&collection, &interner, "App.Helper");
        let members = collection.symbols.members_of(uses);
        assert_eq!(members[0].value_type(), Some(pool.named(helper, vec![])));
    }

    #[test]
    fn duplicate_type_in_one_namespace_is_reported() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "namespace App { class Twice { } class Twice { } }",
            &pool,
            &interner,
        );
        assert_eq!(collection.diagnostics.len(), 1);
        assert_eq!(collection.diagnostics[0].code, ErrorCode::E2015);
    }

    #[test]
    fn enum_members_auto_increment_from_explicit_values() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection =
            collect_source("enum Color { Red, Green = 5, Blue }", &pool, &interner);
        assert_eq!(collection.diagnostics, vec![]);
        let color = def_named(&collection, &interner, "Color");
        let values: Vec<i128> = collection
            .symbols
            .members_of(color)
            .iter()
            .map(|m| match m.const_value {
                Some(ConstValue::Int { value, .. }) => value,
                _ => panic!("enum member without a value"),
            })
            .collect();
        assert_eq!(values, vec![0, 5, 6]);
    }

    #[test]
    fn circular_constants_are_reported() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "class C { const int A = B + 1; const int B = A + 1; }",
            &pool,
            &interner,
        );
        assert!(collection
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::E2007));
    }

    #[test]
    fn const_field_referencing_a_sibling_folds() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "class C { const int Base = 10; const int Derived = Base * 4 + 2; }",
            &pool,
            &interner,
        );
        assert_eq!(collection.diagnostics, vec![]);
        let c = def_named(&collection, &interner, "C");
        let derived = interner.intern("Derived");
        let member = collection
            .symbols
            .members_of(c)
            .iter()
            .find(|m| m.name == derived)
            .unwrap_or_else(|| panic!("missing member"));
        assert_eq!(
            member.const_value,
            Some(ConstValue::Int {
                value: 42,
                ty: TypeId::INT,
            })
        );
    }

    #[test]
    fn conversion_operators_register_with_the_pool() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "struct Meters {
                 public static implicit operator double(Meters m) { return 0.0; }
             }",
            &pool,
            &interner,
        );
        assert_eq!(collection.diagnostics, vec![]);
        let meters = def_named(&collection, &interner, "Meters");
        let conversions = pool.conversions_of(pool.named(meters, vec![]));
        assert_eq!(conversions.len(), 1);
        assert_eq!(conversions[0].to, TypeId::DOUBLE);
        assert!(conversions[0].implicit);
    }

    #[test]
    fn interfaces_and_base_classes_are_sorted_apart() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "interface IShape { }
             class Shape { }
             class Circle : Shape, IShape { }",
            &pool,
            &interner,
        );
        assert_eq!(collection.diagnostics, vec![]);
        let circle = def_named(&collection, &interner, "Circle");
        let shape_ty = pool.named(def_named(&collection, &interner, "Shape"), vec![]);
        let ishape_ty = pool.named(def_named(&collection, &interner, "IShape"), vec![]);
        let (base, interfaces) = pool.with_def(circle, |d| (d.base, d.interfaces.clone()));
        assert_eq!(base, Some(shape_ty));
        assert_eq!(interfaces, vec![ishape_ty]);
    }

    #[test]
    fn nested_types_get_dotted_paths() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let collection = collect_source(
            "namespace App { class Outer { class Inner { } } }",
            &pool,
            &interner,
        );
        assert_eq!(collection.diagnostics, vec![]);
        assert!(collection
            .symbols
            .lookup_qualified(interner.intern("App.Outer.Inner"))
            .is_some());
    }
}
