//! # Stu Parser
//!
//! Scanner and parser for the Stu build language. This crate turns
//! build-script source into an ordered list of [`ast::Rule`]s, each with a
//! target, a dependency tree and an optional shell command.
//!
//! The pipeline has two stages:
//!
//! 1. **Scan** - [`Scanner`] converts source into [`Token`]s, expanding
//!    `%include` and checking `%version` along the way
//! 2. **Parse** - [`build_file`] builds rules from the tokens
//!
//! ## Usage
//!
//! ```
//! # use stu_parser::{parse_file, MemoryLoader, ParseError, ParserConfig};
//!
//! fn main() -> Result<(), ParseError> {
//!     let loader = MemoryLoader::new().with_file(
//!         "main.stu",
//!         "@all: prog;\nprog: [sources.list] { cc -o prog $(cat sources.list) }",
//!     );
//!
//!     let rules = parse_file("main.stu", &ParserConfig::default(), &loader)?;
//!     assert_eq!(rules.len(), 2);
//!     assert_eq!(rules[1].dependencies[0].depth(), 1);
//!     Ok(())
//! }
//! ```

pub mod ast;
mod config;
pub mod error;
mod format;
mod lexer;
mod name;
mod parser;
#[cfg(test)]
mod parser_tests;
mod position;
mod source;
mod tokens;
mod version;

pub use config::{DEFAULT_FILENAME, ParserConfig};
pub use error::{Diagnostic, ErrorCode, ParseError, Result, Trace};
pub use lexer::{Context, Scanner};
pub use name::{Anchoring, NameMatch, ParamName, Parameter};
pub use parser::{build_dependencies, build_file};
pub use position::{Position, SourceKind};
pub use source::{FsLoader, LoadedSource, MemoryLoader, SourceLoader};
pub use tokens::{Command, OPERATOR_CHARS, Operator, Token};
pub use version::{Version, VersionRequest};

use log::info;

use ast::Rule;

/// Scan and parse the build script `filename` with its inclusions.
///
/// An empty filename reads standard input when `loader` is an
/// [`FsLoader`].
pub fn parse_file(
    filename: &str,
    config: &ParserConfig,
    loader: &dyn SourceLoader,
) -> Result<Vec<Rule>> {
    let mut tokens = Vec::new();
    let end = Scanner::new(config, loader).tokenize_file(
        &mut tokens,
        Context::Source,
        filename,
        None,
        None,
    )?;
    let rules = build_file(&tokens, &end)?;
    info!(filename, tokens = tokens.len(), rules = rules.len(); "Parsed build script");
    Ok(rules)
}

/// Scan and parse rules given as text, such as the argument to `-F`.
///
/// `%include` is not allowed in the text.
pub fn parse_str(text: &str, config: &ParserConfig) -> Result<Vec<Rule>> {
    let loader = MemoryLoader::new();
    let mut tokens = Vec::new();
    let end = Scanner::new(config, &loader).tokenize_str(
        &mut tokens,
        Context::OptionF,
        text,
        None,
    )?;
    build_file(&tokens, &end)
}
