//! String interner for identifier and literal storage.
//!
//! One interner is shared by every compilation unit in a compilation so
//! that `Name` handles are comparable across files. Interning is behind
//! a `parking_lot::RwLock`; lookups of already-interned strings take the
//! read path only.

// Arc is needed here: the interner is shared across the rayon workers
// that lex and check independent compilation units.
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Interner exceeded capacity (over 4 billion strings).
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => {
                write!(
                    f,
                    "interner exceeded capacity: {count} strings, max is {}",
                    u32::MAX
                )
            }
        }
    }
}

impl std::error::Error for InternError {}

struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name::raw()`.
    strings: Vec<&'static str>,
}

/// Thread-safe string interner.
///
/// The empty string is pre-interned at index 0 ([`Name::EMPTY`]).
pub struct StringInterner {
    table: RwLock<InternTable>,
}

/// Interner shared across compilation-unit pipelines.
pub type SharedInterner = Arc<StringInterner>;

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        let mut table = InternTable {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(1024),
        };
        let empty: &'static str = "";
        table.map.insert(empty, 0);
        table.strings.push(empty);
        StringInterner {
            table: RwLock::new(table),
        }
    }

    /// Intern a string, returning its handle.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    /// Use [`try_intern`](Self::try_intern) for the fallible version.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Try to intern a string, returning its handle or an overflow error.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        // Fast path: already interned.
        {
            let table = self.table.read();
            if let Some(&idx) = table.map.get(s) {
                return Ok(Name::from_raw(idx));
            }
        }

        let mut table = self.table.write();
        // Recheck under the write lock: another thread may have won.
        if let Some(&idx) = table.map.get(s) {
            return Ok(Name::from_raw(idx));
        }
        let idx = u32::try_from(table.strings.len()).map_err(|_| InternError::Overflow {
            count: table.strings.len(),
        })?;
        // Leak the string so the map key and the storage share one allocation
        // that lives for the whole compilation. The interner is process-wide
        // and never dropped mid-compilation.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        table.map.insert(leaked, idx);
        table.strings.push(leaked);
        Ok(Name::from_raw(idx))
    }

    /// Look up the text of an interned name.
    ///
    /// # Panics
    /// Panics if `name` did not come from this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        let table = self.table.read();
        table.strings[name.raw() as usize]
    }

    /// Number of interned strings (including the pre-interned empty string).
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Check whether the interner only holds the pre-interned empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_string_is_preinterned() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn interning_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.intern("Console");
        let b = interner.intern("Console");
        assert_eq!(a, b);
        assert_eq!(interner.lookup(a), "Console");
    }

    #[test]
    fn distinct_strings_get_distinct_names() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn concurrent_interning_agrees() {
        let interner = std::sync::Arc::new(StringInterner::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = std::sync::Arc::clone(&interner);
                std::thread::spawn(move || interner.intern("shared"))
            })
            .collect();
        let names: Vec<Name> = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(Name::EMPTY))
            .collect();
        assert!(names.windows(2).all(|w| w[0] == w[1]));
    }
}
