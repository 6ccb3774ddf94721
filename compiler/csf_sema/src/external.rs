//! External library metadata.
//!
//! Referenced-assembly symbols (`System.Console`, `System.Collections.*`)
//! come from an injected provider; the front-end itself carries no
//! standard library. A provider typically pre-registers its types into
//! the shared [`TypePool`](csf_types::TypePool) and answers lookups with
//! their ids.

use csf_types::TypeId;

/// Injected resolver for symbols living in referenced libraries.
///
/// `Sync` because resolution fans out across worker threads after the
/// collection barrier.
pub trait MetadataProvider: Sync {
    /// Resolve a fully qualified dotted name (`"System.Console"`),
    /// optionally restricted to one assembly. `None` means not found.
    fn lookup_external_symbol(&self, assembly: Option<&str>, fully_qualified: &str)
        -> Option<TypeId>;
}

/// A provider with no referenced libraries; every lookup misses.
pub struct NoMetadata;

impl MetadataProvider for NoMetadata {
    fn lookup_external_symbol(&self, _: Option<&str>, _: &str) -> Option<TypeId> {
        None
    }
}
