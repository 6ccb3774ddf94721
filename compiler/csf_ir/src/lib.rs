//! Shared IR types for the csf C# front-end.
//!
//! Everything downstream of the lexer speaks in terms of these types:
//! [`Span`]s for source locations, interned [`Name`]s for identifiers,
//! [`Token`]s as the lexer/parser boundary, and the owned [`ast`] tree.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod interner;
mod name;
mod node_id;
mod span;
mod token;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use node_id::NodeId;
pub use span::Span;
pub use token::{IntSuffix, RealSuffix, Token, TokenKind, TokenList};
