//! Diagnostic queue: collect, deduplicate, sort, limit.
//!
//! Fixture comparison depends on deterministic output, so `finish()`
//! stable-sorts by primary source position and the relative order of
//! same-position diagnostics follows insertion order.

use crate::Diagnostic;

/// Collects diagnostics from all phases of one compilation unit.
#[derive(Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    /// Maximum number of errors to keep (0 = unlimited).
    error_limit: usize,
    errors_seen: usize,
}

impl DiagnosticQueue {
    /// Create an unlimited queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that stops recording errors past `limit`.
    pub fn with_error_limit(limit: usize) -> Self {
        DiagnosticQueue {
            error_limit: limit,
            ..Self::default()
        }
    }

    /// Record a diagnostic. Exact duplicates (same code, span, message)
    /// are dropped; errors past the limit are dropped.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() && self.error_limit != 0 && self.errors_seen >= self.error_limit {
            return;
        }
        if self.diagnostics.contains(&diagnostic) {
            return;
        }
        if diagnostic.is_error() {
            self.errors_seen += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record every diagnostic from an iterator.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors_seen
    }

    /// Check whether any error (not warning) has been recorded.
    pub fn has_errors(&self) -> bool {
        self.errors_seen > 0
    }

    /// Finish: stable-sort by primary span position and return the list.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| {
            d.primary_span()
                .map_or((u32::MAX, u32::MAX), |s| (s.start, s.end))
        });
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use csf_ir::Span;
    use pretty_assertions::assert_eq;

    fn diag(code: ErrorCode, start: u32, msg: &str) -> Diagnostic {
        Diagnostic::error(code)
            .with_message(msg)
            .with_label(Span::new(start, start + 1), "here")
    }

    #[test]
    fn finish_sorts_by_position() {
        let mut q = DiagnosticQueue::new();
        q.push(diag(ErrorCode::E1101, 30, "third"));
        q.push(diag(ErrorCode::E1101, 10, "first"));
        q.push(diag(ErrorCode::E1101, 20, "second"));
        let sorted = q.finish();
        let messages: Vec<_> = sorted.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn same_position_preserves_insertion_order() {
        let mut q = DiagnosticQueue::new();
        q.push(diag(ErrorCode::E1101, 10, "a"));
        q.push(diag(ErrorCode::E1102, 10, "b"));
        let sorted = q.finish();
        assert_eq!(sorted[0].message, "a");
        assert_eq!(sorted[1].message, "b");
    }

    #[test]
    fn exact_duplicates_are_dropped() {
        let mut q = DiagnosticQueue::new();
        q.push(diag(ErrorCode::E1101, 5, "dup"));
        q.push(diag(ErrorCode::E1101, 5, "dup"));
        assert_eq!(q.finish().len(), 1);
    }

    #[test]
    fn error_limit_is_enforced() {
        let mut q = DiagnosticQueue::with_error_limit(2);
        q.push(diag(ErrorCode::E1101, 1, "one"));
        q.push(diag(ErrorCode::E1101, 2, "two"));
        q.push(diag(ErrorCode::E1101, 3, "three"));
        assert_eq!(q.error_count(), 2);
        assert_eq!(q.finish().len(), 2);
    }

    #[test]
    fn warnings_do_not_count_toward_error_limit() {
        let mut q = DiagnosticQueue::with_error_limit(1);
        q.push(
            Diagnostic::warning(ErrorCode::W3001)
                .with_message("unreachable")
                .with_label(Span::new(0, 1), "here"),
        );
        q.push(diag(ErrorCode::E1101, 2, "err"));
        let all = q.finish();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn diagnostics_without_spans_sort_last() {
        let mut q = DiagnosticQueue::new();
        q.push(Diagnostic::error(ErrorCode::E2002).with_message("spanless"));
        q.push(diag(ErrorCode::E1101, 100, "spanned"));
        let sorted = q.finish();
        assert_eq!(sorted[0].message, "spanned");
        assert_eq!(sorted[1].message, "spanless");
    }
}
