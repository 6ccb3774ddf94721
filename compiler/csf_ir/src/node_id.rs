//! Dense node identifiers for AST annotation side tables.

use std::fmt;

/// Identifier of one AST node within one compilation unit.
///
/// Assigned densely by the parser in creation order. The semantic
/// checker keys its resolved-type and resolved-symbol side tables by
/// `NodeId`, which keeps the AST itself immutable after parsing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Id used by synthesized error nodes that predate id assignment.
    pub const DUMMY: NodeId = NodeId(u32::MAX);

    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == NodeId::DUMMY {
            write!(f, "NodeId(DUMMY)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}
