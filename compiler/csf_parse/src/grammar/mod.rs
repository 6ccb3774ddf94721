//! Grammar productions, split by syntactic category.

pub(crate) mod expr;
pub(crate) mod item;
pub(crate) mod stmt;
pub(crate) mod ty;
