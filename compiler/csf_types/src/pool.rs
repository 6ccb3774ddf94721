//! The type pool: structural interning plus the named-type registry.
//!
//! Interning makes type equality an index comparison, which the
//! conversion classifier and overload engine rely on. The pool is
//! shared across compilation units behind a `RwLock`; every accessor
//! takes and releases the lock itself, so callers never hold a guard
//! across pool calls.

use csf_ir::{Name, StringInterner};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::data::{TypeData, TypeDef, TypeDefKind, TypeParamBounds, UserConversion};
use crate::idx::{TypeDefId, TypeId};

struct PoolInner {
    map: FxHashMap<TypeData, TypeId>,
    types: Vec<TypeData>,
    defs: Vec<TypeDef>,
}

pub struct TypePool {
    inner: RwLock<PoolInner>,
}

impl TypePool {
    pub fn new() -> Self {
        let primitives = [
            TypeData::Error,
            TypeData::Void,
            TypeData::Object,
            TypeData::String,
            TypeData::Bool,
            TypeData::Char,
            TypeData::Sbyte,
            TypeData::Byte,
            TypeData::Short,
            TypeData::Ushort,
            TypeData::Int,
            TypeData::Uint,
            TypeData::Long,
            TypeData::Ulong,
            TypeData::Float,
            TypeData::Double,
            TypeData::Decimal,
            TypeData::Dynamic,
            TypeData::Null,
        ];
        debug_assert_eq!(primitives.len() as u32, TypeId::PRIMITIVE_COUNT);

        let mut map = FxHashMap::default();
        let mut types = Vec::with_capacity(TypeId::FIRST_DYNAMIC as usize + 256);
        for (idx, data) in primitives.into_iter().enumerate() {
            map.insert(data.clone(), TypeId::from_raw(idx as u32));
            types.push(data);
        }
        // pad the reserved range so fresh ids start at FIRST_DYNAMIC
        while types.len() < TypeId::FIRST_DYNAMIC as usize {
            types.push(TypeData::Error);
        }

        TypePool {
            inner: RwLock::new(PoolInner {
                map,
                types,
                defs: Vec::new(),
            }),
        }
    }

    /// Intern structural type data, returning the canonical id.
    pub fn intern(&self, data: TypeData) -> TypeId {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.map.get(&data) {
                return id;
            }
        }
        let mut inner = self.inner.write();
        if let Some(&id) = inner.map.get(&data) {
            return id;
        }
        let id = TypeId::from_raw(inner.types.len() as u32);
        inner.map.insert(data.clone(), id);
        inner.types.push(data);
        id
    }

    /// The structural data behind an id.
    pub fn data(&self, id: TypeId) -> TypeData {
        self.inner.read().types[id.raw() as usize].clone()
    }

    // === Constructors ===

    pub fn array(&self, element: TypeId, rank: u8) -> TypeId {
        self.intern(TypeData::Array { element, rank })
    }

    /// `T?`. Nullable-of-nullable and nullable-of-reference are the
    /// checker's errors to report; the pool interns what it is given.
    pub fn nullable(&self, underlying: TypeId) -> TypeId {
        self.intern(TypeData::Nullable(underlying))
    }

    pub fn pointer(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Pointer(element))
    }

    pub fn tuple(&self, elements: Vec<TypeId>, names: Vec<Option<Name>>) -> TypeId {
        self.intern(TypeData::Tuple { elements, names })
    }

    pub fn named(&self, def: TypeDefId, args: Vec<TypeId>) -> TypeId {
        self.intern(TypeData::Named { def, args })
    }

    pub fn type_param(
        &self,
        name: Name,
        owner: TypeDefId,
        index: u32,
        bounds: TypeParamBounds,
    ) -> TypeId {
        self.intern(TypeData::TypeParam {
            name,
            owner,
            index,
            bounds,
        })
    }

    pub fn function(&self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeData::Function { params, ret })
    }

    // === Named-type registry ===

    /// Register a declaration. Relations (base, interfaces, conversion
    /// operators) are filled in before resolution starts.
    pub fn add_def(&self, def: TypeDef) -> TypeDefId {
        let mut inner = self.inner.write();
        let id = TypeDefId::from_raw(inner.defs.len() as u32);
        inner.defs.push(def);
        id
    }

    /// Read a definition without cloning its vectors.
    pub fn with_def<R>(&self, id: TypeDefId, f: impl FnOnce(&TypeDef) -> R) -> R {
        f(&self.inner.read().defs[id.index()])
    }

    pub fn def_kind(&self, id: TypeDefId) -> TypeDefKind {
        self.inner.read().defs[id.index()].kind.clone()
    }

    pub fn def_name(&self, id: TypeDefId) -> Name {
        self.inner.read().defs[id.index()].name
    }

    pub fn set_base(&self, id: TypeDefId, base: TypeId) {
        self.inner.write().defs[id.index()].base = Some(base);
    }

    pub fn add_interface(&self, id: TypeDefId, interface: TypeId) {
        self.inner.write().defs[id.index()].interfaces.push(interface);
    }

    pub fn add_conversion(&self, id: TypeDefId, conversion: UserConversion) {
        self.inner.write().defs[id.index()].conversions.push(conversion);
    }

    pub fn set_def_kind(&self, id: TypeDefId, kind: TypeDefKind) {
        self.inner.write().defs[id.index()].kind = kind;
    }

    pub fn set_type_params(
        &self,
        id: TypeDefId,
        count: u32,
        variance: Vec<Option<csf_ir::ast::Variance>>,
    ) {
        let mut inner = self.inner.write();
        let def = &mut inner.defs[id.index()];
        def.type_param_count = count;
        def.variance = variance;
    }

    // === Classification queries ===

    pub fn is_value_type(&self, id: TypeId) -> bool {
        if id.is_numeric() || matches!(id, TypeId::BOOL | TypeId::CHAR) {
            return true;
        }
        match self.data(id) {
            TypeData::Nullable(_) | TypeData::Tuple { .. } | TypeData::Pointer(_) => true,
            TypeData::Named { def, .. } => self.with_def(def, TypeDef::is_value_type),
            TypeData::TypeParam { bounds, .. } => bounds.value,
            _ => false,
        }
    }

    pub fn is_reference_type(&self, id: TypeId) -> bool {
        if matches!(id, TypeId::OBJECT | TypeId::STRING | TypeId::DYNAMIC) {
            return true;
        }
        match self.data(id) {
            TypeData::Array { .. } | TypeData::Function { .. } => true,
            TypeData::Named { def, .. } => self.with_def(def, TypeDef::is_reference_type),
            TypeData::TypeParam { bounds, .. } => bounds.reference,
            _ => false,
        }
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        match self.data(id) {
            TypeData::Named { def, .. } => self.with_def(def, TypeDef::is_interface),
            _ => false,
        }
    }

    pub fn nullable_underlying(&self, id: TypeId) -> Option<TypeId> {
        match self.data(id) {
            TypeData::Nullable(underlying) => Some(underlying),
            _ => None,
        }
    }

    pub fn enum_underlying(&self, id: TypeId) -> Option<TypeId> {
        match self.data(id) {
            TypeData::Named { def, .. } => self.with_def(def, |d| match d.kind {
                TypeDefKind::Enum { underlying } => Some(underlying),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Replace `owner`'s type parameters with `args` throughout `ty`.
    /// Used to view inherited relations of an instantiated type.
    pub fn substitute(&self, ty: TypeId, owner: TypeDefId, args: &[TypeId]) -> TypeId {
        if args.is_empty() {
            return ty;
        }
        match self.data(ty) {
            TypeData::TypeParam {
                owner: param_owner,
                index,
                ..
            } if param_owner == owner => args
                .get(index as usize)
                .copied()
                .unwrap_or(TypeId::ERROR),
            TypeData::Array { element, rank } => {
                self.array(self.substitute(element, owner, args), rank)
            }
            TypeData::Nullable(underlying) => {
                self.nullable(self.substitute(underlying, owner, args))
            }
            TypeData::Pointer(element) => self.pointer(self.substitute(element, owner, args)),
            TypeData::Tuple { elements, names } => {
                let elements = elements
                    .into_iter()
                    .map(|e| self.substitute(e, owner, args))
                    .collect();
                self.tuple(elements, names)
            }
            TypeData::Named {
                def,
                args: inst_args,
            } => {
                let inst_args = inst_args
                    .into_iter()
                    .map(|a| self.substitute(a, owner, args))
                    .collect();
                self.named(def, inst_args)
            }
            TypeData::Function { params, ret } => {
                let params = params
                    .into_iter()
                    .map(|p| self.substitute(p, owner, args))
                    .collect();
                self.function(params, self.substitute(ret, owner, args))
            }
            _ => ty,
        }
    }

    /// Implicit reference conversion: identity, up the base chain,
    /// to an implemented interface (with declared variance), covariant
    /// arrays, or to `object`.
    pub fn reference_convertible(&self, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }
        if target == TypeId::OBJECT {
            return self.is_reference_type(source);
        }
        match (self.data(source), self.data(target)) {
            (
                TypeData::Named { def: sd, args: sa },
                TypeData::Named { def: td, args: ta },
            ) if sd == td => self.variance_compatible(sd, &sa, &ta),
            (TypeData::Named { def, args }, _) => {
                let relations: Vec<TypeId> = self.with_def(def, |d| {
                    d.base.iter().chain(d.interfaces.iter()).copied().collect()
                });
                relations.into_iter().any(|rel| {
                    let rel = self.substitute(rel, def, &args);
                    self.reference_convertible(rel, target)
                })
            }
            (
                TypeData::Array {
                    element: se,
                    rank: sr,
                },
                TypeData::Array {
                    element: te,
                    rank: tr,
                },
            ) => {
                // array covariance is reference-element only
                sr == tr
                    && self.is_reference_type(se)
                    && self.is_reference_type(te)
                    && self.reference_convertible(se, te)
            }
            (TypeData::TypeParam { bounds, .. }, _) => bounds
                .types
                .iter()
                .any(|&bound| self.reference_convertible(bound, target)),
            _ => false,
        }
    }

    fn variance_compatible(&self, def: TypeDefId, source: &[TypeId], target: &[TypeId]) -> bool {
        use csf_ir::ast::Variance;
        if source.len() != target.len() {
            return false;
        }
        let variance = self.with_def(def, |d| d.variance.clone());
        source.iter().zip(target).enumerate().all(|(i, (&s, &t))| {
            match variance.get(i).copied().flatten() {
                None => s == t,
                Some(Variance::Out) => {
                    s == t || (self.is_reference_type(s) && self.reference_convertible(s, t))
                }
                Some(Variance::In) => {
                    s == t || (self.is_reference_type(t) && self.reference_convertible(t, s))
                }
            }
        })
    }

    /// Value types box to `object` or to any interface they implement.
    pub fn boxing_target(&self, source: TypeId, target: TypeId) -> bool {
        if !self.is_value_type(source) {
            return false;
        }
        if target == TypeId::OBJECT {
            return true;
        }
        if !self.is_interface(target) {
            return false;
        }
        // a nullable boxes as its underlying type would
        let source = self.nullable_underlying(source).unwrap_or(source);
        match self.data(source) {
            TypeData::Named { def, args } => {
                let interfaces = self.with_def(def, |d| d.interfaces.clone());
                interfaces.into_iter().any(|rel| {
                    let rel = self.substitute(rel, def, &args);
                    self.reference_convertible(rel, target)
                })
            }
            _ => false,
        }
    }

    /// User-declared conversion operators reachable from a type
    /// (declared on the type itself, nullable stripped first).
    pub fn conversions_of(&self, id: TypeId) -> Vec<UserConversion> {
        let id = self.nullable_underlying(id).unwrap_or(id);
        match self.data(id) {
            TypeData::Named { def, args } => {
                let raw = self.with_def(def, |d| d.conversions.clone());
                raw.into_iter()
                    .map(|c| UserConversion {
                        from: self.substitute(c.from, def, &args),
                        to: self.substitute(c.to, def, &args),
                        ..c
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Human-readable rendering for diagnostics.
    pub fn display(&self, id: TypeId, interner: &StringInterner) -> String {
        if let Some(name) = id.primitive_name() {
            return name.to_owned();
        }
        if id.is_none() {
            return "<none>".to_owned();
        }
        match self.data(id) {
            TypeData::Array { element, rank } => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", self.display(element, interner), commas)
            }
            TypeData::Nullable(underlying) => {
                format!("{}?", self.display(underlying, interner))
            }
            TypeData::Pointer(element) => format!("{}*", self.display(element, interner)),
            TypeData::Tuple { elements, names } => {
                let parts: Vec<String> = elements
                    .iter()
                    .zip(&names)
                    .map(|(&e, name)| match name {
                        Some(n) => {
                            format!("{} {}", self.display(e, interner), interner.lookup(*n))
                        }
                        None => self.display(e, interner),
                    })
                    .collect();
                format!("({})", parts.join(", "))
            }
            TypeData::Named { def, args } => {
                let name = interner.lookup(self.def_name(def)).to_owned();
                if args.is_empty() {
                    name
                } else {
                    let parts: Vec<String> =
                        args.iter().map(|&a| self.display(a, interner)).collect();
                    format!("{}<{}>", name, parts.join(", "))
                }
            }
            TypeData::TypeParam { name, .. } => interner.lookup(name).to_owned(),
            TypeData::Function { params, ret } => {
                let parts: Vec<String> =
                    params.iter().map(|&p| self.display(p, interner)).collect();
                format!("({}) => {}", parts.join(", "), self.display(ret, interner))
            }
            // pre-interned data always renders through primitive_name
            other => format!("{other:?}"),
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        TypePool::new()
    }
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn interning_is_canonical() {
        let pool = TypePool::new();
        let a = pool.array(TypeId::INT, 1);
        let b = pool.array(TypeId::INT, 1);
        assert_eq!(a, b);
        assert!(a.raw() >= TypeId::FIRST_DYNAMIC);
        let c = pool.array(TypeId::INT, 2);
        assert_ne!(a, c);
    }

    #[test]
    fn primitives_intern_to_fixed_ids() {
        let pool = TypePool::new();
        assert_eq!(pool.intern(TypeData::Int), TypeId::INT);
        assert_eq!(pool.intern(TypeData::Error), TypeId::ERROR);
    }

    #[test]
    fn named_types_compare_by_declaration() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let a = pool.add_def(TypeDef::new(interner.intern("A"), TypeDefKind::Class));
        let b = pool.add_def(TypeDef::new(interner.intern("B"), TypeDefKind::Class));
        assert_ne!(pool.named(a, vec![]), pool.named(b, vec![]));
        assert_eq!(
            pool.named(a, vec![TypeId::INT]),
            pool.named(a, vec![TypeId::INT])
        );
    }

    #[test]
    fn base_chain_reference_conversion() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let base = pool.add_def(TypeDef::new(interner.intern("Base"), TypeDefKind::Class));
        let derived = pool.add_def(TypeDef::new(interner.intern("Derived"), TypeDefKind::Class));
        let base_ty = pool.named(base, vec![]);
        let derived_ty = pool.named(derived, vec![]);
        pool.set_base(derived, base_ty);

        assert!(pool.reference_convertible(derived_ty, base_ty));
        assert!(!pool.reference_convertible(base_ty, derived_ty));
        assert!(pool.reference_convertible(derived_ty, TypeId::OBJECT));
    }

    #[test]
    fn covariant_interface_conversion() {
        use csf_ir::ast::Variance;
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let ienum = pool.add_def(TypeDef::new(
            interner.intern("IEnumerable"),
            TypeDefKind::Interface,
        ));
        pool.set_type_params(ienum, 1, vec![Some(Variance::Out)]);

        let of_string = pool.named(ienum, vec![TypeId::STRING]);
        let of_object = pool.named(ienum, vec![TypeId::OBJECT]);
        let of_int = pool.named(ienum, vec![TypeId::INT]);

        assert!(pool.reference_convertible(of_string, of_object));
        assert!(!pool.reference_convertible(of_object, of_string));
        // value-type arguments are never variance-converted
        assert!(!pool.reference_convertible(of_int, of_object));
    }

    #[test]
    fn display_renders_shapes() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        assert_eq!(pool.display(TypeId::INT, &interner), "int");
        let arr = pool.array(TypeId::STRING, 2);
        assert_eq!(pool.display(arr, &interner), "string[,]");
        let nullable = pool.nullable(TypeId::INT);
        assert_eq!(pool.display(nullable, &interner), "int?");
        let list = pool.add_def(TypeDef::new(interner.intern("List"), TypeDefKind::Class));
        let of_int = pool.named(list, vec![TypeId::INT]);
        assert_eq!(pool.display(of_int, &interner), "List<int>");
    }
}
