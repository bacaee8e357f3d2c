//! Lexical analyzer for Stu source text.
//!
//! The lexer converts source text into a sequence of [`Token`]s for the
//! parser. It handles whitespace, comments, quoting, parameters, command
//! blocks and the `%include` and `%version` statements. Files pulled in by
//! `%include` are scanned recursively into the same token sequence.
//!
//! The public entry point is [`Scanner`]. Scanning stops at the first error.

mod command;
mod name;
mod statement;

use std::{collections::HashSet, fs::File, sync::Arc};

use log::{debug, trace};
use winnow::{
    Parser as _,
    error::ModalResult,
    stream::{LocatingSlice, Location, Stream},
    token::take_while,
};

use crate::{
    config::ParserConfig,
    error::{Diagnostic, ErrorCode, ParseError, Result, Trace},
    format::{char_word, name_word},
    position::{LineIndex, Position, SourceKind},
    source::SourceLoader,
    tokens::{OPERATOR_CHARS, Operator, Token},
};

type Input<'a> = LocatingSlice<&'a str>;

/// The syntactic environment of a scan, which decides the legal statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// A build script
    Source,
    /// The content of a dynamic dependency
    Dynamic,
    /// The argument to the `-C` option
    OptionC,
    /// The argument to the `-F` option
    OptionF,
}

/// Whether `c` may appear unquoted in a name.
///
/// All non-ASCII characters are allowed.
pub(crate) fn is_name_char(c: char) -> bool {
    match c {
        ' '..='~' => !" []\"':={}#<>@$;()%*\\!?|&".contains(c),
        c => !c.is_ascii(),
    }
}

pub(crate) fn is_operator_char(c: char) -> bool {
    c.is_ascii() && OPERATOR_CHARS.contains(&(c as u8))
}

pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\u{b}' | '\u{c}' | '\r')
}

/// Consume the longest prefix whose characters satisfy `pred`.
fn take_run<'a>(input: &mut Input<'a>, pred: impl Fn(char) -> bool) -> &'a str {
    let run: ModalResult<&'a str> = take_while(0.., pred).parse_next(input);
    run.unwrap_or_default()
}

fn skip_space(input: &mut Input<'_>) {
    take_run(input, is_space);
}

/// Files being expanded and already expanded during one top-level scan.
#[derive(Debug, Default)]
struct Inclusion {
    /// One entry per active `%include`, outermost first
    traces: Vec<Trace>,
    /// The files containing the active `%include`s, outermost first
    filenames: Vec<String>,
    /// Every file scanned in a source context so far
    includes: HashSet<String>,
}

/// Turns build-script source into tokens.
///
/// # Example
///
/// ```
/// # use stu_parser::{Context, MemoryLoader, ParserConfig, Scanner};
///
/// let config = ParserConfig::default();
/// let loader = MemoryLoader::new().with_file("main.stu", "all: prog;");
/// let scanner = Scanner::new(&config, &loader);
///
/// let mut tokens = Vec::new();
/// let end = scanner
///     .tokenize_file(&mut tokens, Context::Source, "main.stu", None, None)
///     .unwrap();
/// assert_eq!(tokens.len(), 4);
/// assert_eq!(end.to_string(), "main.stu:1:11");
/// ```
#[derive(Clone, Copy)]
pub struct Scanner<'c> {
    config: &'c ParserConfig,
    loader: &'c dyn SourceLoader,
}

impl<'c> Scanner<'c> {
    pub fn new(config: &'c ParserConfig, loader: &'c dyn SourceLoader) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &ParserConfig {
        self.config
    }

    /// Scan the file `filename` and append its tokens to `tokens`.
    ///
    /// An empty filename reads standard input. `diagnostic` is where the
    /// file was requested, e.g. an option on the command line, and is used
    /// when the file cannot be read. `handle` may be the file already
    /// opened. Returns the position of the end of the file.
    pub fn tokenize_file(
        &self,
        tokens: &mut Vec<Token>,
        context: Context,
        filename: &str,
        diagnostic: Option<&Position>,
        handle: Option<File>,
    ) -> Result<Position> {
        let mut inclusion = Inclusion::default();
        self.scan_file(tokens, context, filename, diagnostic, handle, &mut inclusion)
    }

    /// Scan in-memory `text`, such as a rule fragment given on the command
    /// line, and append its tokens to `tokens`. Returns the position of the
    /// end of the text.
    pub fn tokenize_str(
        &self,
        tokens: &mut Vec<Token>,
        context: Context,
        text: &str,
        diagnostic: Option<&Position>,
    ) -> Result<Position> {
        let mut inclusion = Inclusion::default();
        let index = LineIndex::new(SourceKind::Argument, Arc::from(text), text);
        trace!(bytes = text.len(); "Tokenizing string");
        Lexer {
            scanner: self,
            context,
            source: text,
            index,
            tokens,
            inclusion: &mut inclusion,
            diagnostic,
        }
        .run()
    }

    fn scan_file(
        &self,
        tokens: &mut Vec<Token>,
        context: Context,
        filename: &str,
        diagnostic: Option<&Position>,
        handle: Option<File>,
        inclusion: &mut Inclusion,
    ) -> Result<Position> {
        if context == Context::Source {
            inclusion.includes.insert(filename.to_string());
        }

        let loaded = self
            .loader
            .load(filename, handle, self.config)
            .map_err(|err| {
                let mut traces: Vec<Trace> = inclusion.traces.iter().rev().cloned().collect();
                if let (true, Some(position)) = (traces.is_empty(), diagnostic) {
                    traces.push(Trace::new(
                        position.clone(),
                        format!("{} is read from here", name_word(filename)),
                    ));
                }
                ParseError::fatal(filename, traces, err)
            })?;

        debug!(
            filename = loaded.filename.as_str(),
            bytes = loaded.content.len();
            "Tokenizing file"
        );

        let name: Arc<str> = Arc::from(loaded.filename.as_str());
        let source = decode(&loaded.content, &name)?;
        let index = LineIndex::new(SourceKind::File, name, source);

        Lexer {
            scanner: self,
            context,
            source,
            index,
            tokens,
            inclusion,
            diagnostic,
        }
        .run()
    }
}

/// Check that file content is UTF-8.
fn decode<'a>(content: &'a [u8], name: &Arc<str>) -> Result<&'a str> {
    std::str::from_utf8(content).map_err(|err| {
        let valid = err.valid_up_to();
        let prefix = std::str::from_utf8(&content[..valid]).unwrap_or_default();
        let index = LineIndex::new(SourceKind::File, Arc::clone(name), prefix);
        Diagnostic::error(index.position(valid), "invalid UTF-8 sequence")
            .with_code(ErrorCode::E002)
            .into()
    })
}

/// Scanning state for one buffer.
struct Lexer<'a> {
    scanner: &'a Scanner<'a>,
    context: Context,
    source: &'a str,
    index: LineIndex,
    tokens: &'a mut Vec<Token>,
    inclusion: &'a mut Inclusion,
    diagnostic: Option<&'a Position>,
}

impl<'a> Lexer<'a> {
    fn position(&self, offset: usize) -> Position {
        self.index.position(offset)
    }

    fn here(&self, input: &Input<'_>) -> Position {
        self.position(input.current_token_start())
    }

    fn push_operator(&mut self, op: char, offset: usize) {
        let position = self.position(offset);
        self.tokens.push(Token::Operator(Operator { op, position }));
    }

    /// Scan the whole buffer and return the end position.
    fn run(mut self) -> Result<Position> {
        let mut input = LocatingSlice::new(self.source);
        self.scan(&mut input)?;
        Ok(self.position(self.source.len()))
    }

    fn scan(&mut self, input: &mut Input<'a>) -> Result<()> {
        while let Some(c) = input.peek_token() {
            let start = input.current_token_start();

            if is_operator_char(c) {
                input.next_token();
                self.push_operator(c, start);
            } else if c == '$' && input.as_bytes().get(1) == Some(&b'[') {
                // Variable dependency
                input.next_slice(2);
                self.push_operator('$', start);
                self.push_operator('[', start + 1);
            } else if c == '{' {
                let command = self.scan_command(input)?;
                self.tokens.push(Token::Command(command));
            } else if c == '#' {
                take_run(input, |c| c != '\n');
            } else if is_space(c) {
                skip_space(input);
            } else if c == '%' {
                self.scan_statement(input)?;
            } else {
                match self.scan_name(input)? {
                    Some(name) => self.tokens.push(Token::Name(name)),
                    None => {
                        return Err(Diagnostic::error(
                            self.position(start),
                            format!("invalid character {}", char_word(c)),
                        )
                        .with_code(ErrorCode::E002)
                        .into());
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
fn scan_with(loader: &crate::source::MemoryLoader, filename: &str) -> Result<Vec<Token>> {
    let config = ParserConfig::default();
    let scanner = Scanner::new(&config, loader);
    let mut tokens = Vec::new();
    scanner.tokenize_file(&mut tokens, Context::Source, filename, None, None)?;
    Ok(tokens)
}

#[cfg(test)]
fn scan(text: &str) -> Result<Vec<Token>> {
    scan_in(Context::Source, text)
}

#[cfg(test)]
fn scan_in(context: Context, text: &str) -> Result<Vec<Token>> {
    let loader = crate::source::MemoryLoader::new().with_file("main.stu", text);
    let config = ParserConfig::default();
    let scanner = Scanner::new(&config, &loader);
    let mut tokens = Vec::new();
    scanner.tokenize_file(&mut tokens, context, "main.stu", None, None)?;
    Ok(tokens)
}

#[cfg(test)]
fn scan_err(text: &str) -> Diagnostic {
    match scan(text) {
        Err(ParseError::Logical(diag)) => diag,
        other => panic!("expected a logical error for {text:?}, got {other:?}"),
    }
}
