//! csfc command-line interface.

use csfc::commands::{check_files, explain_error, lex_file, parse_file};
use csfc::driver::{LanguageVersion, Options};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let ok = match args[1].as_str() {
        "check" => {
            let mut options = Options::default();
            let mut files = Vec::new();
            for arg in &args[2..] {
                if arg == "--unsafe" {
                    options.unsafe_allowed = true;
                } else if arg == "--checked" {
                    options.checked_by_default = true;
                } else if let Some(symbol) = arg.strip_prefix("--define=") {
                    options.preprocessor_symbols.push(symbol.to_string());
                } else if let Some(version) = arg.strip_prefix("--lang=") {
                    match LanguageVersion::parse(version) {
                        Some(parsed) => options.language_version = parsed,
                        None => {
                            eprintln!("error: unknown language version `{version}`");
                            std::process::exit(1);
                        }
                    }
                } else if arg.starts_with('-') {
                    eprintln!("error: unknown option `{arg}`");
                    std::process::exit(1);
                } else {
                    files.push(arg.clone());
                }
            }
            if files.is_empty() {
                eprintln!("Usage: csfc check <file.cs>... [--unsafe] [--checked] [--define=SYM] [--lang=<ver>]");
                std::process::exit(1);
            }
            check_files(&files, &options)
        }
        "lex" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: csfc lex <file.cs>");
                std::process::exit(1);
            };
            lex_file(path)
        }
        "parse" => {
            let Some(path) = args.iter().skip(2).find(|a| !a.starts_with('-')) else {
                eprintln!("Usage: csfc parse <file.cs> [--ast]");
                std::process::exit(1);
            };
            let dump_ast = args.iter().skip(2).any(|a| a == "--ast");
            parse_file(path, dump_ast)
        }
        "explain" | "--explain" => {
            let Some(code) = args.get(2) else {
                eprintln!("Usage: csfc explain <ERROR_CODE>");
                eprintln!("Example: csfc explain E2001");
                std::process::exit(1);
            };
            explain_error(code)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            true
        }
        "version" | "--version" | "-V" => {
            println!("csfc {}", env!("CARGO_PKG_VERSION"));
            true
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            false
        }
    };

    if !ok {
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!("csfc - C# front-end checker");
    println!();
    println!("Usage: csfc <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <file.cs>...   Lex, parse, and type-check files");
    println!("  lex <file.cs>        Tokenize and dump the token stream");
    println!("  parse <file.cs>      Parse and summarize (--ast dumps the tree)");
    println!("  explain <code>       Explain an error code (e.g. E2001)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Check options:");
    println!("  --unsafe             Permit unsafe blocks and pointer types");
    println!("  --checked            Checked arithmetic outside unchecked blocks");
    println!("  --define=SYM         Define a preprocessor symbol");
    println!("  --lang=<ver>         Language version: 4, 5 (default 5)");
}
