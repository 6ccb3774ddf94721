//! Diagnostic and error reporting for the csf front-end.
//!
//! Every phase reports through [`Diagnostic`]; the [`DiagnosticQueue`]
//! collects them, deduplicates exact repeats, and produces the
//! position-sorted, deterministic list the test fixtures diff against.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{expected_expression, unexpected_token, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;
