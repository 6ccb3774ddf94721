//! Lexical scopes for locals and parameters.
//!
//! Lookup walks from the innermost scope outward. Declaring a local that
//! collides with another local anywhere on that chain is an error, not a
//! shadowing: C# forbids local-shadows-local even across block nesting.

use csf_ir::{Name, Span};
use csf_types::TypeId;
use rustc_hash::FxHashMap;

use crate::const_eval::ConstValue;

/// What kind of local binding this is, for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LocalKind {
    Local,
    Parameter,
    /// `foreach`/`catch`/query range variables; read-only.
    Iteration,
    LocalFunction,
}

#[derive(Clone, Debug)]
pub struct Local {
    pub ty: TypeId,
    pub kind: LocalKind,
    pub span: Span,
    pub used: bool,
    /// Set for `const` locals.
    pub const_value: Option<ConstValue>,
}

/// Outcome of a declaration attempt.
#[derive(Debug)]
pub enum DeclareError {
    /// Same name already in this exact scope.
    Duplicate(Span),
    /// Name declared as a local in an enclosing local scope.
    Shadows(Span),
}

/// A stack of local scopes within one member body.
#[derive(Default)]
pub struct LocalScopes {
    scopes: Vec<FxHashMap<Name, Local>>,
}

impl LocalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the innermost scope, yielding unused non-parameter locals for
    /// the unused-variable warning.
    pub fn pop(&mut self) -> Vec<(Name, Span)> {
        self.scopes
            .pop()
            .map(|scope| {
                scope
                    .into_iter()
                    .filter(|(_, local)| !local.used && local.kind == LocalKind::Local)
                    .map(|(name, local)| (name, local.span))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn declare(&mut self, name: Name, local: Local) -> Result<(), DeclareError> {
        let depth = self.scopes.len();
        for (i, scope) in self.scopes.iter().enumerate() {
            if let Some(existing) = scope.get(&name) {
                if i + 1 == depth {
                    return Err(DeclareError::Duplicate(existing.span));
                }
                return Err(DeclareError::Shadows(existing.span));
            }
        }
        if let Some(innermost) = self.scopes.last_mut() {
            innermost.insert(name, local);
        }
        Ok(())
    }

    /// Look up a name, marking it used.
    pub fn lookup(&mut self, name: Name) -> Option<&Local> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(local) = scope.get_mut(&name) {
                local.used = true;
                return Some(local);
            }
        }
        None
    }

    /// Constant value of a `const` local, without marking it used.
    pub fn constant(&self, name: Name) -> Option<&ConstValue> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name))
            .and_then(|local| local.const_value.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn local(span: Span) -> Local {
        Local {
            ty: TypeId::INT,
            kind: LocalKind::Local,
            span,
            used: false,
            const_value: None,
        }
    }

    #[test]
    fn inner_scope_cannot_shadow_outer_local() {
        let interner = csf_ir::StringInterner::new();
        let x = interner.intern("x");
        let mut scopes = LocalScopes::new();
        scopes.push();
        assert!(scopes.declare(x, local(Span::new(0, 1))).is_ok());
        scopes.push();
        assert!(matches!(
            scopes.declare(x, local(Span::new(5, 6))),
            Err(DeclareError::Shadows(_))
        ));
    }

    #[test]
    fn sibling_scopes_may_reuse_a_name() {
        let interner = csf_ir::StringInterner::new();
        let x = interner.intern("x");
        let mut scopes = LocalScopes::new();
        scopes.push();
        scopes.push();
        assert!(scopes.declare(x, local(Span::new(0, 1))).is_ok());
        scopes.pop();
        scopes.push();
        assert!(scopes.declare(x, local(Span::new(9, 10))).is_ok());
    }

    #[test]
    fn pop_reports_unused_locals() {
        let interner = csf_ir::StringInterner::new();
        let used = interner.intern("used");
        let unused = interner.intern("unused");
        let mut scopes = LocalScopes::new();
        scopes.push();
        scopes
            .declare(used, local(Span::new(0, 4)))
            .unwrap_or_else(|_| unreachable!());
        scopes
            .declare(unused, local(Span::new(5, 11)))
            .unwrap_or_else(|_| unreachable!());
        assert!(scopes.lookup(used).is_some());
        let leftovers = scopes.pop();
        assert_eq!(leftovers, vec![(unused, Span::new(5, 11))]);
    }
}
