//! Semantic analysis for the C# front end.
//!
//! Runs after parsing in two phases. Declaration collection walks every
//! compilation unit and builds the global symbol table; it is the only
//! phase that needs the whole program. Checking then types each unit
//! independently against that table, so units can be checked in
//! parallel.
//!
//! # Main Entry Points
//!
//! - [`collect_units`]: build [`GlobalSymbols`] from parsed units
//! - [`check_unit`]: type and flow-check one unit, producing a
//!   [`UnitAnalysis`]
//!
//! # Module Organization
//!
//! - `collect`: declaration collection into the symbol table
//! - `check`: statement/expression checking and reachability
//! - `resolve`: parsed-type and dotted-name resolution
//! - `const_eval`: compile-time constant evaluation
//! - `scope`: lexical scopes for locals
//! - `dynamic`: call-site descriptors for `dynamic` operations

mod check;
mod collect;
mod const_eval;
mod context;
mod dynamic;
mod external;
mod resolve;
mod scope;
mod symbol;

pub use check::{check_unit, SemaOptions, UnitAnalysis};
pub use collect::{collect_units, Collection};
pub use const_eval::{eval_const, ConstEnv, ConstError, ConstValue, EmptyEnv};
pub use context::CheckContext;
pub use dynamic::{DynamicCallSite, DynamicOperation};
pub use external::{MetadataProvider, NoMetadata};
pub use resolve::TypeResolver;
pub use scope::{DeclareError, Local, LocalKind, LocalScopes};
pub use symbol::{GlobalSymbols, MemberKind, MemberSymbol, ParamSymbol, Signature};
