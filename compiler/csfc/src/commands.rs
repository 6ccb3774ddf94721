//! Subcommand implementations for the `csfc` binary.

use std::fs;

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::StringInterner;
use csf_sema::NoMetadata;

use crate::driver::{compile, Options, SourceFile};
use crate::reporting::{render, snippet, LineIndex};

fn read_source(path: &str) -> Option<SourceFile> {
    match fs::read_to_string(path) {
        Ok(text) => Some(SourceFile {
            name: path.to_string(),
            text,
        }),
        Err(error) => {
            eprintln!("error: cannot read `{path}`: {error}");
            None
        }
    }
}

fn print_unit_diagnostics(file: &SourceFile, diagnostics: &[Diagnostic]) {
    let index = LineIndex::new(&file.text);
    for diagnostic in diagnostics {
        println!("{}", render(diagnostic, &file.name, &index));
        if let Some(span) = diagnostic.primary_span() {
            if let Some(source) = snippet(&file.text, span, &index) {
                for line in source.lines() {
                    println!("     | {line}");
                }
            }
        }
        println!();
    }
}

/// `csfc check`: run the full front end and report diagnostics.
/// Returns `false` when any file fails to read or any error is reported.
pub fn check_files(paths: &[String], options: &Options) -> bool {
    let mut sources = Vec::new();
    for path in paths {
        match read_source(path) {
            Some(source) => sources.push(source),
            None => return false,
        }
    }

    let compilation = compile(&sources, options, &NoMetadata);
    for diagnostic in &compilation.global_diagnostics {
        println!("{diagnostic}");
        println!();
    }
    for (file, unit) in sources.iter().zip(&compilation.units) {
        print_unit_diagnostics(file, &unit.diagnostics);
    }

    let errors = compilation.error_count();
    let warnings = compilation
        .units
        .iter()
        .flat_map(|u| &u.diagnostics)
        .filter(|d| !d.is_error())
        .count();
    if errors == 0 {
        println!("ok: {} file(s), {warnings} warning(s)", sources.len());
        true
    } else {
        println!("failed: {errors} error(s), {warnings} warning(s)");
        false
    }
}

/// `csfc lex`: dump the token stream of one file.
pub fn lex_file(path: &str) -> bool {
    let Some(source) = read_source(path) else {
        return false;
    };
    let interner = StringInterner::new();
    let (tokens, diagnostics) = csf_lexer::lex(&source.text, &interner);
    for token in tokens.iter() {
        println!(
            "{:>6}..{:<6} {:?}",
            token.span.start, token.span.end, token.kind
        );
    }
    print_unit_diagnostics(&source, &diagnostics);
    diagnostics.iter().all(|d| !d.is_error())
}

/// `csfc parse`: parse one file and dump the tree.
pub fn parse_file(path: &str, dump_ast: bool) -> bool {
    let Some(source) = read_source(path) else {
        return false;
    };
    let interner = StringInterner::new();
    let result = csf_parse::parse_source(&source.text, &interner);
    if dump_ast {
        println!("{:#?}", result.unit);
    } else {
        println!(
            "{}: {} using(s), {} item(s), {} node(s)",
            source.name,
            result.unit.usings.len(),
            result.unit.items.len(),
            result.unit.node_count
        );
    }
    print_unit_diagnostics(&source, &result.diagnostics);
    result.diagnostics.iter().all(|d| !d.is_error())
}

/// `csfc explain`: describe an error code, or list them all.
pub fn explain_error(code: &str) -> bool {
    let wanted = code.to_ascii_uppercase();
    match ErrorCode::all().iter().find(|c| c.to_string() == wanted) {
        Some(code) => {
            println!("{code}: {}", code.explanation());
            true
        }
        None => {
            eprintln!("unknown code `{code}`; known codes:");
            for code in ErrorCode::all() {
                eprintln!("  {code}: {}", code.explanation());
            }
            false
        }
    }
}
