//! CLI logic for the Stu build-script inspector.
//!
//! The CLI reads a build script with its inclusions, plus rule and
//! dependency fragments given on the command line, and prints what was
//! parsed in source form. Nothing is ever executed.

pub mod error_adapter;

mod args;
mod config;
mod error;
mod sources;

pub use args::Args;
pub use config::ConfigError;
pub use error::CliError;
pub use sources::Sources;

use std::io::{self, Write};

use log::info;

use stu_parser::{
    Context, FsLoader, ParserConfig, Result as ParseResult, Scanner,
    ast::{Dependency, Rule},
    build_dependencies, build_file,
};

use sources::RecordingLoader;

/// Run the Stu CLI application, printing to standard output.
///
/// # Errors
///
/// Returns `CliError` for:
/// - Configuration loading errors
/// - Scan and parse errors, including unreadable build scripts
/// - Errors writing the output
pub fn run(args: &Args) -> Result<(), CliError> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// Run the Stu CLI application, printing to `out`.
///
/// Without an input file, the configured default file is read unless
/// rules or dependencies were given as text.
pub fn run_with_output(args: &Args, out: &mut dyn Write) -> Result<(), CliError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let parser_config = &app_config.parser;

    let input = match &args.input {
        Some(input) => Some(input.as_str()),
        None if args.rules.is_empty() && args.dependencies.is_none() => {
            Some(parser_config.default_filename.as_str())
        }
        None => None,
    };

    let loader = RecordingLoader::new(FsLoader);
    let parsed = parse_all(args, input, parser_config, &loader);
    let (rules, dependencies) =
        parsed.map_err(|err| CliError::new_parse_error(err, loader.into_sources()))?;

    info!(rules = rules.len(), dependencies = dependencies.len(); "Parsed successfully");

    if !args.quiet {
        for rule in &rules {
            writeln!(out, "{rule}")?;
        }
        for dependency in &dependencies {
            writeln!(out, "{dependency}")?;
        }
    }

    Ok(())
}

type Parsed = (Vec<Rule>, Vec<Dependency>);

fn parse_all(
    args: &Args,
    input: Option<&str>,
    config: &ParserConfig,
    loader: &RecordingLoader<FsLoader>,
) -> ParseResult<Parsed> {
    let scanner = Scanner::new(config, loader);
    let mut rules = Vec::new();

    if let Some(input) = input {
        info!(input_path = input; "Processing build script");
        let mut tokens = Vec::new();
        let end = scanner.tokenize_file(&mut tokens, Context::Source, input, None, None)?;
        rules.extend(build_file(&tokens, &end)?);
    }

    for text in &args.rules {
        let mut tokens = Vec::new();
        let end = scanner.tokenize_str(&mut tokens, Context::OptionF, text, None)?;
        rules.extend(build_file(&tokens, &end)?);
    }

    let mut dependencies = Vec::new();
    if let Some(text) = &args.dependencies {
        let mut tokens = Vec::new();
        let end = scanner.tokenize_str(&mut tokens, Context::OptionC, text, None)?;
        dependencies = build_dependencies(&tokens, &end)?;
    }

    Ok((rules, dependencies))
}
