//! Immutable checking context.
//!
//! Passed by value down the statement/expression walk; entering a
//! construct derives a new context rather than flipping shared state, so
//! a sibling branch can never observe another branch's flags.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct CheckContext: u8 {
        /// Inside a `catch` body (blocks `yield`).
        const IN_CATCH = 1 << 0;
        /// Inside a `finally` body (blocks `yield`).
        const IN_FINALLY = 1 << 1;
        /// Inside a `lock` body (blocks `yield` and `await`).
        const IN_LOCK = 1 << 2;
        /// Inside `unsafe` (permits pointers; blocks `yield`).
        const IN_UNSAFE = 1 << 3;
        /// `checked` arithmetic semantics.
        const CHECKED = 1 << 4;
        /// Inside a loop body (`break`/`continue` legal).
        const IN_LOOP = 1 << 5;
        /// Inside a switch section (`break`/`goto case` legal).
        const IN_SWITCH = 1 << 6;
    }
}

impl CheckContext {
    pub fn with(self, flags: CheckContext) -> CheckContext {
        self | flags
    }

    pub fn checked(self, checked: bool) -> CheckContext {
        if checked {
            self | CheckContext::CHECKED
        } else {
            self - CheckContext::CHECKED
        }
    }

    pub fn is_checked(self) -> bool {
        self.contains(CheckContext::CHECKED)
    }

    /// `yield` is illegal in catch, finally, lock, and unsafe blocks.
    pub fn allows_yield(self) -> bool {
        !self.intersects(
            CheckContext::IN_CATCH
                | CheckContext::IN_FINALLY
                | CheckContext::IN_LOCK
                | CheckContext::IN_UNSAFE,
        )
    }

    /// `await` is illegal inside a `lock` body.
    pub fn allows_await(self) -> bool {
        !self.contains(CheckContext::IN_LOCK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_contexts_do_not_leak_back() {
        let outer = CheckContext::default();
        let inner = outer.with(CheckContext::IN_LOCK);
        assert!(!inner.allows_await());
        assert!(outer.allows_await());
    }

    #[test]
    fn yield_legality() {
        assert!(CheckContext::IN_LOOP.allows_yield());
        assert!(!CheckContext::IN_FINALLY.allows_yield());
        assert!(!CheckContext::IN_UNSAFE.allows_yield());
    }

    #[test]
    fn checked_toggles_both_ways() {
        let ctx = CheckContext::default().checked(true);
        assert!(ctx.contains(CheckContext::CHECKED));
        assert!(!ctx.checked(false).contains(CheckContext::CHECKED));
    }
}
