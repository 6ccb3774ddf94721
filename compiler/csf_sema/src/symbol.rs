//! Symbols and the frozen global symbol table.
//!
//! Declaration collection writes the table once; after the barrier it is
//! shared immutably with every unit's resolution pass, so lookups need
//! no locking.

use csf_ir::{Name, Span};
use csf_types::{ParamModifier, TypeDefId, TypeId, TypeParamBounds, TypePool};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::const_eval::ConstValue;

/// A resolved parameter in a member signature.
#[derive(Clone, Debug)]
pub struct ParamSymbol {
    pub name: Name,
    pub ty: TypeId,
    pub modifier: ParamModifier,
    pub has_default: bool,
}

/// A resolved callable signature.
#[derive(Clone, Debug)]
pub struct Signature {
    pub params: Vec<ParamSymbol>,
    pub ret: TypeId,
    pub type_param_count: u32,
}

impl Signature {
    pub fn is_generic(&self) -> bool {
        self.type_param_count > 0
    }
}

/// What a member symbol is.
#[derive(Clone, Debug)]
pub enum MemberKind {
    /// Methods, constructors (named `.ctor`), and user-declared
    /// operators (named `op_Addition` and friends).
    Method(Signature),
    Field {
        ty: TypeId,
        is_const: bool,
    },
    Property {
        ty: TypeId,
        /// Indexer parameters; empty for plain properties.
        index_params: Vec<ParamSymbol>,
        has_get: bool,
        has_set: bool,
    },
    Event {
        ty: TypeId,
    },
}

/// One member of a declared type.
#[derive(Clone, Debug)]
pub struct MemberSymbol {
    pub name: Name,
    pub owner: TypeDefId,
    pub kind: MemberKind,
    pub is_static: bool,
    pub span: Span,
    /// Filled for `const` fields and enum members.
    pub const_value: Option<ConstValue>,
}

impl MemberSymbol {
    pub fn signature(&self) -> Option<&Signature> {
        match &self.kind {
            MemberKind::Method(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn value_type(&self) -> Option<TypeId> {
        match &self.kind {
            MemberKind::Field { ty, .. }
            | MemberKind::Property { ty, .. }
            | MemberKind::Event { ty } => Some(*ty),
            MemberKind::Method(_) => None,
        }
    }
}

/// The global symbol table, written during declaration collection and
/// frozen before any body is checked.
#[derive(Default)]
pub struct GlobalSymbols {
    /// Fully qualified dotted name (interned whole, `"A.B.C"`) to
    /// declaration.
    by_path: FxHashMap<Name, TypeDefId>,
    /// Simple name to every declaration carrying it; more than one entry
    /// makes an unqualified reference ambiguous.
    by_simple: FxHashMap<Name, SmallVec<[TypeDefId; 1]>>,
    members: FxHashMap<TypeDefId, Vec<MemberSymbol>>,
    /// Explicit interface implementations, keyed by the implemented
    /// interface type and member name; invisible to ordinary lookup.
    explicit_impls: FxHashMap<(TypeId, Name), MemberSymbol>,
    /// Declared constraints per type parameter, keyed by owner and
    /// parameter index, with constraint types resolved.
    param_bounds: FxHashMap<(TypeDefId, u32), TypeParamBounds>,
}

impl GlobalSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_type(&mut self, path: Name, simple: Name, def: TypeDefId) -> bool {
        if self.by_path.contains_key(&path) {
            return false;
        }
        self.by_path.insert(path, def);
        self.by_simple.entry(simple).or_default().push(def);
        true
    }

    pub(crate) fn insert_member(&mut self, def: TypeDefId, member: MemberSymbol) {
        self.members.entry(def).or_default().push(member);
    }

    pub(crate) fn insert_explicit_impl(
        &mut self,
        interface: TypeId,
        name: Name,
        member: MemberSymbol,
    ) {
        self.explicit_impls.insert((interface, name), member);
    }

    pub(crate) fn set_const_value(&mut self, def: TypeDefId, name: Name, value: ConstValue) {
        if let Some(members) = self.members.get_mut(&def) {
            if let Some(member) = members.iter_mut().find(|m| m.name == name) {
                member.const_value = Some(value);
            }
        }
    }

    pub(crate) fn set_param_bounds(&mut self, def: TypeDefId, index: u32, bounds: TypeParamBounds) {
        self.param_bounds.insert((def, index), bounds);
    }

    /// Declared constraints for a type parameter, if any.
    pub fn param_bounds(&self, def: TypeDefId, index: u32) -> Option<&TypeParamBounds> {
        self.param_bounds.get(&(def, index))
    }

    pub fn lookup_qualified(&self, path: Name) -> Option<TypeDefId> {
        self.by_path.get(&path).copied()
    }

    /// Every type carrying this simple name, in declaration order.
    pub fn lookup_simple(&self, name: Name) -> &[TypeDefId] {
        self.by_simple.get(&name).map_or(&[], |v| v.as_slice())
    }

    pub fn members_of(&self, def: TypeDefId) -> &[MemberSymbol] {
        self.members.get(&def).map_or(&[], |v| v.as_slice())
    }

    pub fn explicit_impl(&self, interface: TypeId, name: Name) -> Option<&MemberSymbol> {
        self.explicit_impls.get(&(interface, name))
    }

    /// Members named `name` on `def` or any base class, nearest
    /// declaration first. Derived members hide base members of the same
    /// name for lookup purposes.
    pub fn find_members(&self, pool: &TypePool, def: TypeDefId, name: Name) -> Vec<&MemberSymbol> {
        let mut current = Some(def);
        while let Some(def) = current {
            let found: Vec<&MemberSymbol> = self
                .members_of(def)
                .iter()
                .filter(|m| m.name == name)
                .collect();
            if !found.is_empty() {
                return found;
            }
            current = pool
                .with_def(def, |d| d.base)
                .and_then(|base| match pool.data(base) {
                    csf_types::TypeData::Named { def, .. } => Some(def),
                    _ => None,
                });
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;
    use csf_types::{TypeDef, TypeDefKind};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn duplicate_paths_are_rejected() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let mut symbols = GlobalSymbols::new();
        let path = interner.intern("A.Foo");
        let simple = interner.intern("Foo");
        let a = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        let b = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        assert!(symbols.insert_type(path, simple, a));
        assert!(!symbols.insert_type(path, simple, b));
        assert_eq!(symbols.lookup_qualified(path), Some(a));
    }

    #[test]
    fn same_simple_name_in_two_namespaces_is_visible_twice() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let mut symbols = GlobalSymbols::new();
        let simple = interner.intern("List");
        let a = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        let b = pool.add_def(TypeDef::new(simple, TypeDefKind::Class));
        symbols.insert_type(interner.intern("A.List"), simple, a);
        symbols.insert_type(interner.intern("B.List"), simple, b);
        assert_eq!(symbols.lookup_simple(simple).len(), 2);
    }

    #[test]
    fn member_lookup_walks_the_base_chain() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let mut symbols = GlobalSymbols::new();
        let base = pool.add_def(TypeDef::new(interner.intern("Base"), TypeDefKind::Class));
        let derived = pool.add_def(TypeDef::new(interner.intern("Derived"), TypeDefKind::Class));
        pool.set_base(derived, pool.named(base, vec![]));

        let name = interner.intern("Count");
        symbols.insert_member(
            base,
            MemberSymbol {
                name,
                owner: base,
                kind: MemberKind::Field {
                    ty: TypeId::INT,
                    is_const: false,
                },
                is_static: false,
                span: Span::new(0, 0),
                const_value: None,
            },
        );

        let found = symbols.find_members(&pool, derived, name);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owner, base);
    }
}
