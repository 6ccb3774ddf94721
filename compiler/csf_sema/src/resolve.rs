//! Resolution of syntactic type references into pool ids.
//!
//! Unqualified names are tried against the enclosing namespace chain
//! (innermost first, first hit wins), then against `using` directives
//! (all at equal specificity, so two hits are ambiguous), then against
//! the external metadata provider. Failures produce one diagnostic and
//! the error type, which converts everywhere downstream.

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{ParsedType, ParsedTypeKind, TypePath};
use csf_ir::{Name, Span, StringInterner};
use csf_types::{TypeDefId, TypeId, TypePool};
use rustc_hash::FxHashMap;

use crate::const_eval::primitive_type;
use crate::external::MetadataProvider;
use crate::symbol::GlobalSymbols;

/// Join interned path segments into one interned dotted name.
pub(crate) fn join_path(interner: &StringInterner, segments: &[Name]) -> Name {
    if segments.len() == 1 {
        return segments[0];
    }
    let mut text = String::new();
    for (i, &segment) in segments.iter().enumerate() {
        if i > 0 {
            text.push('.');
        }
        text.push_str(interner.lookup(segment));
    }
    interner.intern(&text)
}

fn prefixed(interner: &StringInterner, prefix: Name, name: Name) -> Name {
    if prefix == Name::EMPTY {
        return name;
    }
    let text = format!("{}.{}", interner.lookup(prefix), interner.lookup(name));
    interner.intern(&text)
}

pub struct TypeResolver<'a> {
    pub symbols: &'a GlobalSymbols,
    pub pool: &'a TypePool,
    pub interner: &'a StringInterner,
    pub metadata: &'a dyn MetadataProvider,
    /// Enclosing namespace prefixes, innermost first, ending with the
    /// global namespace (`Name::EMPTY`).
    pub enclosing: Vec<Name>,
    /// Prefixes opened by `using` directives, all at equal specificity.
    pub usings: Vec<Name>,
    /// Type parameters of the enclosing declaration(s).
    pub type_params: FxHashMap<Name, TypeId>,
    /// `using IO = System.IO;` aliases, alias name to dotted path.
    pub aliases: FxHashMap<Name, Name>,
}

impl<'a> TypeResolver<'a> {
    /// Resolve a syntactic type to a pool id, reporting failures.
    pub fn resolve(&self, ty: &ParsedType, diagnostics: &mut Vec<Diagnostic>) -> TypeId {
        match &ty.kind {
            ParsedTypeKind::Primitive(p) => primitive_type(*p),
            ParsedTypeKind::Dynamic => TypeId::DYNAMIC,
            // `var` is resolved from the initializer by the checker;
            // reaching here means it was used outside a local declaration
            ParsedTypeKind::Var => {
                diagnostics.push(
                    Diagnostic::error(ErrorCode::E1104)
                        .with_message("`var` is only valid for local declarations")
                        .with_label(ty.span, "expected a type name"),
                );
                TypeId::ERROR
            }
            ParsedTypeKind::Array { element, rank } => {
                let element = self.resolve(element, diagnostics);
                self.pool.array(element, *rank)
            }
            ParsedTypeKind::Nullable(underlying) => {
                let underlying = self.resolve(underlying, diagnostics);
                self.pool.nullable(underlying)
            }
            ParsedTypeKind::Pointer(element) => {
                let element = self.resolve(element, diagnostics);
                self.pool.pointer(element)
            }
            ParsedTypeKind::Tuple(elements) => {
                let (names, types): (Vec<_>, Vec<_>) = elements
                    .iter()
                    .map(|(name, ty)| (*name, self.resolve(ty, diagnostics)))
                    .unzip();
                self.pool.tuple(types, names)
            }
            ParsedTypeKind::Named(path) => self.resolve_named(path, ty.span, diagnostics),
            ParsedTypeKind::Error => TypeId::ERROR,
        }
    }

    fn resolve_named(
        &self,
        path: &TypePath,
        span: Span,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TypeId {
        let last = path.last();

        // a bare name may be a type parameter of the enclosing declaration
        if path.segments.len() == 1 && last.type_args.is_empty() {
            if let Some(&param) = self.type_params.get(&last.name) {
                return param;
            }
        }

        let mut segment_names: Vec<Name> = path.segments.iter().map(|s| s.name).collect();
        // a using-alias substitutes for the leading segment
        if let Some(&target) = self.aliases.get(&segment_names[0]) {
            segment_names[0] = target;
        }
        let dotted = join_path(self.interner, &segment_names);

        let def = match self.find_def(dotted, diagnostics, span) {
            Lookup::Found(def) => def,
            Lookup::Ambiguous => return TypeId::ERROR,
            Lookup::Missing => {
                // external types resolve to a pre-registered pool id
                let text = self.interner.lookup(dotted);
                if let Some(external) = self.metadata.lookup_external_symbol(None, text) {
                    return external;
                }
                for &prefix in self.enclosing.iter().chain(&self.usings) {
                    let candidate = prefixed(self.interner, prefix, dotted);
                    let text = self.interner.lookup(candidate);
                    if let Some(external) = self.metadata.lookup_external_symbol(None, text) {
                        return external;
                    }
                }
                diagnostics.push(
                    Diagnostic::error(ErrorCode::E2002)
                        .with_message(format!(
                            "the type `{}` does not exist in this scope",
                            self.interner.lookup(dotted)
                        ))
                        .with_label(span, "not found"),
                );
                return TypeId::ERROR;
            }
        };

        let args: Vec<TypeId> = last
            .type_args
            .iter()
            .map(|arg| self.resolve(arg, diagnostics))
            .collect();
        let expected = self.pool.with_def(def, |d| d.type_param_count);
        if args.len() as u32 != expected {
            diagnostics.push(
                Diagnostic::error(ErrorCode::E2002)
                    .with_message(format!(
                        "`{}` takes {expected} type argument(s), {} given",
                        self.interner.lookup(last.name),
                        args.len()
                    ))
                    .with_label(span, "wrong number of type arguments"),
            );
            return TypeId::ERROR;
        }
        self.pool.named(def, args)
    }

    /// Resolve a name chain (`Outer.Inner`, `System.Console`) to a type
    /// if it names one. Silent on a miss so expression checking can fall
    /// back to value interpretation; ambiguity still reports and yields
    /// the error type.
    pub fn lookup_path(
        &self,
        segments: &[Name],
        diagnostics: &mut Vec<Diagnostic>,
        span: Span,
    ) -> Option<TypeId> {
        if let [single] = segments {
            if let Some(&param) = self.type_params.get(single) {
                return Some(param);
            }
        }
        let mut names = segments.to_vec();
        if let Some(&target) = self.aliases.get(&names[0]) {
            names[0] = target;
        }
        let dotted = join_path(self.interner, &names);
        match self.find_def(dotted, diagnostics, span) {
            Lookup::Found(def) => Some(self.pool.named(def, vec![])),
            Lookup::Ambiguous => Some(TypeId::ERROR),
            Lookup::Missing => {
                let text = self.interner.lookup(dotted);
                if let Some(external) = self.metadata.lookup_external_symbol(None, text) {
                    return Some(external);
                }
                for &prefix in self.enclosing.iter().chain(&self.usings) {
                    let candidate = prefixed(self.interner, prefix, dotted);
                    let text = self.interner.lookup(candidate);
                    if let Some(external) = self.metadata.lookup_external_symbol(None, text) {
                        return Some(external);
                    }
                }
                None
            }
        }
    }

    /// Find a declaration for a (possibly already dotted) name using the
    /// prefix rules. Reports ambiguity itself; stays silent when missing
    /// so the caller can try external metadata first.
    fn find_def(&self, dotted: Name, diagnostics: &mut Vec<Diagnostic>, span: Span) -> Lookup {
        if let Some(def) = self.symbols.lookup_qualified(dotted) {
            return Lookup::Found(def);
        }
        for &prefix in &self.enclosing {
            let candidate = prefixed(self.interner, prefix, dotted);
            if let Some(def) = self.symbols.lookup_qualified(candidate) {
                return Lookup::Found(def);
            }
        }
        let mut hits: Vec<TypeDefId> = Vec::new();
        for &prefix in &self.usings {
            let candidate = prefixed(self.interner, prefix, dotted);
            if let Some(def) = self.symbols.lookup_qualified(candidate) {
                if !hits.contains(&def) {
                    hits.push(def);
                }
            }
        }
        match hits.len() {
            0 => Lookup::Missing,
            1 => Lookup::Found(hits[0]),
            _ => {
                diagnostics.push(
                    Diagnostic::error(ErrorCode::E2003)
                        .with_message(format!(
                            "`{}` is ambiguous between multiple using directives",
                            self.interner.lookup(dotted)
                        ))
                        .with_label(span, "ambiguous reference"),
                );
                Lookup::Ambiguous
            }
        }
    }
}

enum Lookup {
    Found(TypeDefId),
    Ambiguous,
    Missing,
}

#[cfg(test)]
mod tests {
    use csf_ir::ast::TypeSegment;
    use csf_types::{TypeDef, TypeDefKind};
    use pretty_assertions::assert_eq;

    use crate::external::NoMetadata;

    use super::*;

    fn named(interner: &StringInterner, name: &str) -> ParsedType {
        ParsedType::new(
            ParsedTypeKind::Named(TypePath {
                segments: vec![TypeSegment {
                    name: interner.intern(name),
                    type_args: vec![],
                    span: Span::new(0, 0),
                }],
            }),
            Span::new(0, 0),
        )
    }

    fn resolver<'a>(
        symbols: &'a GlobalSymbols,
        pool: &'a TypePool,
        interner: &'a StringInterner,
        usings: Vec<Name>,
    ) -> TypeResolver<'a> {
        TypeResolver {
            symbols,
            pool,
            interner,
            metadata: &NoMetadata,
            enclosing: vec![Name::EMPTY],
            usings,
            type_params: FxHashMap::default(),
            aliases: FxHashMap::default(),
        }
    }

    #[test]
    fn unresolved_name_reports_once_and_yields_error_type() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let symbols = GlobalSymbols::new();
        let r = resolver(&symbols, &pool, &interner, vec![]);
        let mut diagnostics = Vec::new();
        let ty = r.resolve(&named(&interner, "Missing"), &mut diagnostics);
        assert_eq!(ty, TypeId::ERROR);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::E2002);
    }

    #[test]
    fn equal_specificity_usings_are_ambiguous() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let mut symbols = GlobalSymbols::new();
        let simple = interner.intern("List");
        let a = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        let b = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        symbols.insert_type(interner.intern("A.List"), simple, a);
        symbols.insert_type(interner.intern("B.List"), simple, b);

        let usings = vec![interner.intern("A"), interner.intern("B")];
        let r = resolver(&symbols, &pool, &interner, usings);
        let mut diagnostics = Vec::new();
        let ty = r.resolve(&named(&interner, "List"), &mut diagnostics);
        assert_eq!(ty, TypeId::ERROR);
        assert_eq!(diagnostics[0].code, ErrorCode::E2003);
    }

    #[test]
    fn enclosing_namespace_beats_usings() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let mut symbols = GlobalSymbols::new();
        let simple = interner.intern("Helper");
        let ours = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        let theirs = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        symbols.insert_type(interner.intern("App.Helper"), simple, ours);
        symbols.insert_type(interner.intern("Lib.Helper"), simple, theirs);

        let mut r = resolver(&symbols, &pool, &interner, vec![interner.intern("Lib")]);
        r.enclosing = vec![interner.intern("App"), Name::EMPTY];
        let mut diagnostics = Vec::new();
        let ty = r.resolve(&named(&interner, "Helper"), &mut diagnostics);
        assert_eq!(diagnostics, vec![]);
        assert_eq!(ty, pool.named(ours, vec![]));
    }

    #[test]
    fn primitives_and_shapes_resolve_without_symbols() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let symbols = GlobalSymbols::new();
        let r = resolver(&symbols, &pool, &interner, vec![]);
        let mut diagnostics = Vec::new();

        let int_array = ParsedType::new(
            ParsedTypeKind::Array {
                element: Box::new(ParsedType::new(
                    ParsedTypeKind::Primitive(csf_ir::ast::PrimitiveName::Int),
                    Span::new(0, 3),
                )),
                rank: 1,
            },
            Span::new(0, 5),
        );
        let ty = r.resolve(&int_array, &mut diagnostics);
        assert_eq!(diagnostics, vec![]);
        assert_eq!(ty, pool.array(TypeId::INT, 1));
    }
}
