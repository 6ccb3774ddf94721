//! C# front-end driver.
//!
//! Ties the pipeline crates together:
//!
//! ```text
//! SourceFile ──► csf_lexer ──► csf_parse ──► csf_sema::collect
//!                                                 │  (barrier)
//!                                                 ▼
//!                                  csf_sema::check (per unit, parallel)
//! ```
//!
//! [`driver::compile`] runs the whole front end over a set of files;
//! `commands` backs the CLI subcommands.

pub mod commands;
pub mod driver;
pub mod reporting;

pub use driver::{compile, Compilation, LanguageVersion, Options, SourceFile, UnitReport};
