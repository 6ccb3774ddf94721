//! Type representation, conversion classification, and overload
//! resolution.
//!
//! Types are interned into a shared [`TypePool`] and handled as
//! [`TypeId`] indices, so equality checks never walk structure. The two
//! algorithmic surfaces are [`classify_conversion`], the pure
//! implicit/explicit conversion classifier, and [`resolve_overload`],
//! which picks the unique best candidate for a call site or reports
//! ambiguity. The semantic checker owns all diagnostics; this crate
//! only answers questions.

mod conversions;
mod data;
mod idx;
mod overload;
mod pool;

pub use conversions::{classify_conversion, Conversion, ConversionContext};
pub use data::{TypeData, TypeDef, TypeDefKind, TypeParamBounds, UserConversion};
pub use idx::{TypeDefId, TypeId};
pub use overload::{
    resolve_overload, CallArgument, Candidate, OverloadError, ParamModifier, ParamSig,
};
pub use pool::TypePool;
