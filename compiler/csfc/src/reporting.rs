//! Plain-text diagnostic rendering for the CLI.

use csf_diagnostic::{Diagnostic, Severity};
use csf_ir::Span;

/// Byte offsets of line starts, for offset-to-position translation.
pub struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> LineIndex {
        let mut starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset as u32 + 1);
            }
        }
        LineIndex { starts }
    }

    /// 1-based line and column of a byte offset.
    pub fn position(&self, offset: u32) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        (line + 1, (offset - self.starts[line]) as usize + 1)
    }
}

/// Render one diagnostic the way `rustc` renders its short form:
///
/// ```text
/// error[E2001]: cannot convert `string` to `int`
///   --> main.cs:3:17: no conversion exists
///   = note: ...
/// ```
pub fn render(diagnostic: &Diagnostic, file: &str, index: &LineIndex) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    let mut out = format!(
        "{severity}[{}]: {}",
        diagnostic.code, diagnostic.message
    );
    for label in &diagnostic.labels {
        let (line, column) = index.position(label.span.start);
        let marker = if label.is_primary { "-->" } else { "   " };
        out.push_str(&format!(
            "\n  {marker} {file}:{line}:{column}: {}",
            label.message
        ));
    }
    for note in &diagnostic.notes {
        out.push_str(&format!("\n  = note: {note}"));
    }
    out
}

/// Show the source line under a span, with a caret run.
pub fn snippet(text: &str, span: Span, index: &LineIndex) -> Option<String> {
    let (line, column) = index.position(span.start);
    let line_text = text.lines().nth(line - 1)?;
    let width = (span.end.saturating_sub(span.start) as usize).max(1);
    let width = width.min(line_text.len().saturating_sub(column - 1).max(1));
    Some(format!(
        "{line_text}\n{}{}",
        " ".repeat(column - 1),
        "^".repeat(width)
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn positions_are_one_based() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.position(0), (1, 1));
        assert_eq!(index.position(1), (1, 2));
        assert_eq!(index.position(3), (2, 1));
        assert_eq!(index.position(4), (2, 2));
    }

    #[test]
    fn offset_past_the_last_newline_lands_on_the_final_line() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.position(4), (2, 2));
    }

    #[test]
    fn snippet_underlines_the_span() {
        let text = "int x = y;";
        let index = LineIndex::new(text);
        let rendered = snippet(text, Span::new(8, 9), &index);
        assert_eq!(rendered.as_deref(), Some("int x = y;\n        ^"));
    }
}
