//! The two-phase compilation pipeline.
//!
//! Phase one lexes and parses every source file in parallel; every file
//! produces a tree, so a malformed file never suppresses diagnostics
//! from the others. Declaration collection then runs once over all
//! units and freezes the symbol table. Phase two resolves and checks
//! each unit in parallel against the frozen table.

use csf_diagnostic::{Diagnostic, DiagnosticQueue};
use csf_ir::ast::CompilationUnit;
use csf_ir::StringInterner;
use csf_sema::{check_unit, collect_units, MetadataProvider, SemaOptions, UnitAnalysis};
use csf_types::TypePool;
use rayon::prelude::*;

/// Language level accepted by the front end.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum LanguageVersion {
    CSharp4,
    #[default]
    CSharp5,
}

impl LanguageVersion {
    pub fn parse(text: &str) -> Option<LanguageVersion> {
        match text {
            "4" | "csharp4" => Some(LanguageVersion::CSharp4),
            "5" | "csharp5" => Some(LanguageVersion::CSharp5),
            _ => None,
        }
    }
}

/// Compilation configuration, filled in by the CLI.
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub language_version: LanguageVersion,
    /// `--unsafe`: permits `unsafe` blocks, pointers, `sizeof`.
    pub unsafe_allowed: bool,
    /// `--checked`: arithmetic outside `checked`/`unchecked` is checked.
    pub checked_by_default: bool,
    /// `--define=SYM`. Preprocessor lines are consumed as trivia, so
    /// symbols are carried for tooling but do not alter lexing.
    pub preprocessor_symbols: Vec<String>,
}

/// One input file: a display name and its full text.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

/// Per-file result: merged lex/parse/check diagnostics in position
/// order, plus the checker's annotation tables.
pub struct UnitReport {
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
    pub analysis: UnitAnalysis,
}

/// The outcome of [`compile`] over a set of files.
pub struct Compilation {
    pub units: Vec<UnitReport>,
    /// Cross-unit diagnostics from declaration collection (duplicate
    /// types, bad base types, constant cycles).
    pub global_diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn error_count(&self) -> usize {
        self.global_diagnostics
            .iter()
            .filter(|d| d.is_error())
            .count()
            + self
                .units
                .iter()
                .flat_map(|u| &u.diagnostics)
                .filter(|d| d.is_error())
                .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Run the full front end over `sources`.
#[tracing::instrument(level = "info", skip_all, fields(files = sources.len()))]
pub fn compile(
    sources: &[SourceFile],
    options: &Options,
    metadata: &dyn MetadataProvider,
) -> Compilation {
    tracing::debug!(
        version = ?options.language_version,
        symbols = options.preprocessor_symbols.len(),
        "configured"
    );
    let interner = StringInterner::new();
    let pool = TypePool::new();

    let parsed: Vec<(CompilationUnit, Vec<Diagnostic>)> = sources
        .par_iter()
        .map(|file| {
            let result = csf_parse::parse_source(&file.text, &interner);
            (result.unit, result.diagnostics)
        })
        .collect();
    let (units, parse_diagnostics): (Vec<_>, Vec<_>) = parsed.into_iter().unzip();

    let collection = collect_units(&units, &pool, &interner, metadata);
    let symbols = collection.symbols;
    let sema = SemaOptions {
        unsafe_allowed: options.unsafe_allowed,
        checked_by_default: options.checked_by_default,
    };

    let reports: Vec<UnitReport> = units
        .par_iter()
        .zip(parse_diagnostics.into_par_iter())
        .zip(sources.par_iter())
        .map(|((unit, parse), file)| {
            let mut analysis = check_unit(unit, &symbols, &pool, &interner, metadata, &sema);
            let mut queue = DiagnosticQueue::new();
            queue.extend(parse);
            queue.extend(std::mem::take(&mut analysis.diagnostics));
            UnitReport {
                name: file.name.clone(),
                diagnostics: queue.finish(),
                analysis,
            }
        })
        .collect();

    let mut global = DiagnosticQueue::new();
    global.extend(collection.diagnostics);
    Compilation {
        units: reports,
        global_diagnostics: global.finish(),
    }
}

#[cfg(test)]
mod tests {
    use csf_diagnostic::ErrorCode;
    use csf_sema::NoMetadata;
    use pretty_assertions::assert_eq;

    use super::*;

    fn file(name: &str, text: &str) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn cross_file_references_resolve() {
        let compilation = compile(
            &[
                file("point.cs", "class Point { public int X; }"),
                file(
                    "use.cs",
                    "class C { int M(Point p) { return p.X; } }",
                ),
            ],
            &Options::default(),
            &NoMetadata,
        );
        assert_eq!(compilation.global_diagnostics, vec![]);
        assert!(!compilation.has_errors());
    }

    #[test]
    fn a_malformed_file_does_not_suppress_the_others() {
        let compilation = compile(
            &[
                file("bad.cs", "class { "),
                file("use.cs", "class C { void M() { int x = \"hi\"; } }"),
            ],
            &Options::default(),
            &NoMetadata,
        );
        assert!(!compilation.units[0].diagnostics.is_empty());
        let use_codes: Vec<ErrorCode> = compilation.units[1]
            .diagnostics
            .iter()
            .map(|d| d.code)
            .filter(|c| !c.is_warning())
            .collect();
        assert_eq!(use_codes, vec![ErrorCode::E2001]);
    }

    #[test]
    fn unsafe_option_reaches_the_checker() {
        let source = "class C { void M() { unsafe { } } }";
        let denied = compile(
            &[file("a.cs", source)],
            &Options::default(),
            &NoMetadata,
        );
        assert_eq!(denied.error_count(), 1);

        let allowed = compile(
            &[file("a.cs", source)],
            &Options {
                unsafe_allowed: true,
                ..Options::default()
            },
            &NoMetadata,
        );
        assert_eq!(allowed.error_count(), 0);
    }
}
