//! Deferred-binding descriptors for `dynamic` operations.
//!
//! An operation with a `dynamic` operand is never statically resolved;
//! the checker records a call-site descriptor (operation kind plus the
//! static types it did know) and annotates the result as `dynamic`. The
//! backend lowers these into runtime binder calls.

use csf_ir::ast::{BinaryOp, UnaryOp};
use csf_ir::Name;
use csf_types::TypeId;
use smallvec::SmallVec;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum DynamicOperation {
    Invocation,
    MemberAccess(Name),
    Index,
    Binary(BinaryOp),
    Unary(UnaryOp),
    Conversion { target: TypeId },
}

/// One deferred-bound call site.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DynamicCallSite {
    pub operation: DynamicOperation,
    /// Static argument type hints; `DYNAMIC` where unknown.
    pub arg_types: SmallVec<[TypeId; 4]>,
}

impl DynamicCallSite {
    pub fn new(operation: DynamicOperation, arg_types: impl IntoIterator<Item = TypeId>) -> Self {
        DynamicCallSite {
            operation,
            arg_types: arg_types.into_iter().collect(),
        }
    }
}
