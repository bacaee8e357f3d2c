//! `%` statements: `%include` and `%version`.

use log::{debug, trace};
use winnow::stream::{Location, Stream};

use super::{Context, Input, Lexer, is_name_char, skip_space, take_run};
use crate::{
    error::{Diagnostic, ErrorCode, Result, Trace},
    format::{char_word, name_word, prefix_word},
    position::Position,
    version::VersionRequest,
};

impl Lexer<'_> {
    pub(super) fn scan_statement(&mut self, input: &mut Input<'_>) -> Result<()> {
        let percent = self.here(input);
        input.next_token();
        skip_space(input);

        let name_position = self.here(input);
        let statement = take_run(input, |c| c.is_ascii_alphanumeric());
        if statement.is_empty() {
            let message = match input.peek_token() {
                Some(c) => format!("expected statement name, not {}", char_word(c)),
                None => "expected statement name".to_string(),
            };
            return Err(Diagnostic::error(name_position, message)
                .with_code(ErrorCode::E010)
                .with_trace(percent, "after '%'")
                .into());
        }
        skip_space(input);

        trace!(statement; "Scanning statement");
        match statement {
            "include" => self.scan_include(input, percent),
            "version" => self.scan_version(input, percent),
            other => Err(Diagnostic::error(
                percent,
                format!("invalid statement {}", prefix_word(other, "%")),
            )
            .with_code(ErrorCode::E010)
            .into()),
        }
    }

    fn scan_include(&mut self, input: &mut Input<'_>, percent: Position) -> Result<()> {
        let not_here = match self.context {
            Context::Source => None,
            Context::Dynamic => Some("'%include' must not appear in dynamic dependencies"),
            Context::OptionC => {
                Some("'%include' must not appear in the argument to the '-C' option")
            }
            Context::OptionF => {
                Some("'%include' must not appear in the argument to the '-F' option")
            }
        };
        if let Some(message) = not_here {
            return Err(Diagnostic::error(percent, message)
                .with_code(ErrorCode::E011)
                .into());
        }

        let Some(name) = self.scan_name(input)? else {
            let message = match input.peek_token() {
                Some(c) => format!("expected filename, not {}", char_word(c)),
                None => "expected filename".to_string(),
            };
            return Err(Diagnostic::error(self.here(input), message)
                .with_code(ErrorCode::E012)
                .with_trace(percent, "after '%include'")
                .into());
        };

        let Some(filename) = name.unparametrized().map(str::to_string) else {
            return Err(Diagnostic::error(
                name.position().clone(),
                format!("name {} must not be parametrized", name_word(&name.raw())),
            )
            .with_code(ErrorCode::E012)
            .with_trace(percent, "after '%include'")
            .into());
        };

        self.inclusion.filenames.push(self.index.name().to_string());
        let result = self.include(&filename, name.position());
        self.inclusion.filenames.pop();
        result
    }

    fn include(&mut self, filename: &str, position: &Position) -> Result<()> {
        if self.inclusion.includes.contains(filename) {
            if self.inclusion.filenames.iter().any(|f| f == filename) {
                // The include chain, innermost first
                let chain = self.inclusion.traces.iter().rev().cloned();
                return Err(Diagnostic::error(
                    position.clone(),
                    format!(
                        "recursive inclusion of {} using '%include'",
                        name_word(filename)
                    ),
                )
                .with_code(ErrorCode::E013)
                .with_traces(chain)
                .into());
            }
            debug!(filename; "Skipping file that was already included");
            return Ok(());
        }

        self.inclusion.traces.push(Trace::new(
            position.clone(),
            format!("{} is included from here", name_word(filename)),
        ));
        let result = self
            .scanner
            .scan_file(
                &mut *self.tokens,
                Context::Source,
                filename,
                self.diagnostic,
                None,
                &mut *self.inclusion,
            )
            .map(drop);
        self.inclusion.traces.pop();
        result
    }

    fn scan_version(&mut self, input: &mut Input<'_>, percent: Position) -> Result<()> {
        let begin = input.current_token_start();
        let text = take_run(input, is_name_char);
        let position = self.position(begin);

        let Ok(request) = text.parse::<VersionRequest>() else {
            return Err(Diagnostic::error(
                position,
                format!(
                    "expected version number of the form MAJOR.MINOR or MAJOR.MINOR.PATCH, not {}",
                    name_word(text)
                ),
            )
            .with_code(ErrorCode::E014)
            .with_trace(percent, "after '%version'")
            .into());
        };

        let current = &self.scanner.config().version;
        if !current.satisfies(&request) {
            return Err(Diagnostic::error(
                position,
                format!(
                    "requested version {} using '%version' is incompatible with this Stu's version {}",
                    name_word(text),
                    name_word(&current.to_string())
                ),
            )
            .with_code(ErrorCode::E015)
            .into());
        }

        debug!(requested = text, current:%; "Version requirement satisfied");
        Ok(())
    }
}
