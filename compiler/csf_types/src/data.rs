//! Structural type data and named-type declarations.
//!
//! [`TypeData`] is what gets interned: two types are the same `TypeId`
//! exactly when their data is equal. Reference types compare by
//! declaration identity through their [`TypeDefId`], so two
//! instantiations `List<int>` intern to one id while distinct classes
//! with identical shapes stay distinct.

use csf_ir::ast::Variance;
use csf_ir::Name;

use crate::idx::{TypeDefId, TypeId};

/// Interned type structure.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    Error,
    Void,
    Object,
    String,
    Bool,
    Char,
    Sbyte,
    Byte,
    Short,
    Ushort,
    Int,
    Uint,
    Long,
    Ulong,
    Float,
    Double,
    Decimal,
    Dynamic,
    /// The type of the `null` literal, convertible to any reference or
    /// nullable type.
    Null,

    /// `T[]`, `T[,]`, ...
    Array { element: TypeId, rank: u8 },
    /// `T?` where `T` is a value type.
    Nullable(TypeId),
    /// `T*` (unsafe contexts).
    Pointer(TypeId),
    /// `(int, string name)` — element names do not affect identity of
    /// the unnamed shape but are carried for diagnostics.
    Tuple {
        elements: Vec<TypeId>,
        names: Vec<Option<Name>>,
    },
    /// Declared type (class/struct/interface/enum/delegate), possibly
    /// instantiated. `args` is empty for non-generic types.
    Named { def: TypeDefId, args: Vec<TypeId> },
    /// A generic type parameter, compared by owner position.
    TypeParam {
        name: Name,
        owner: TypeDefId,
        index: u32,
        bounds: TypeParamBounds,
    },
    /// Anonymous function shape used for lambda/delegate compatibility.
    Function { params: Vec<TypeId>, ret: TypeId },
}

/// Constraints attached to a type parameter, as they affect conversions.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TypeParamBounds {
    /// `where T : class`.
    pub reference: bool,
    /// `where T : struct`.
    pub value: bool,
    /// `where T : new()`.
    pub constructor: bool,
    /// Base class and interface bounds.
    pub types: Vec<TypeId>,
}

/// What kind of declaration a [`TypeDef`] is.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeDefKind {
    Class,
    Struct,
    Interface,
    Enum {
        /// The underlying integral type (`int` unless declared).
        underlying: TypeId,
    },
    Delegate {
        params: Vec<TypeId>,
        ret: TypeId,
    },
}

/// A user-declared conversion operator.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct UserConversion {
    pub from: TypeId,
    pub to: TypeId,
    pub implicit: bool,
    /// The declaring type; diagnostics name it on ambiguity.
    pub owner: TypeDefId,
}

/// A named type declaration registered with the pool.
///
/// Registered during declaration collection with placeholder relations,
/// then completed (bases, interfaces, operators) before the pool is
/// frozen for the resolution phase.
#[derive(Clone, Debug)]
pub struct TypeDef {
    pub name: Name,
    pub kind: TypeDefKind,
    /// Direct base class, `None` for interfaces/`object` itself.
    /// May mention the def's own type parameters; conversion checks
    /// substitute instantiation arguments.
    pub base: Option<TypeId>,
    /// Directly implemented interfaces (same substitution rule).
    pub interfaces: Vec<TypeId>,
    /// `implicit`/`explicit operator` declarations.
    pub conversions: Vec<UserConversion>,
    /// Declared variance per type parameter (interfaces/delegates).
    pub variance: Vec<Option<Variance>>,
    pub type_param_count: u32,
}

impl TypeDef {
    /// A fresh definition with no relations filled in yet.
    pub fn new(name: Name, kind: TypeDefKind) -> Self {
        TypeDef {
            name,
            kind,
            base: None,
            interfaces: Vec::new(),
            conversions: Vec::new(),
            variance: Vec::new(),
            type_param_count: 0,
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeDefKind::Struct | TypeDefKind::Enum { .. })
    }

    pub fn is_reference_type(&self) -> bool {
        matches!(
            self.kind,
            TypeDefKind::Class | TypeDefKind::Interface | TypeDefKind::Delegate { .. }
        )
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeDefKind::Interface)
    }
}
