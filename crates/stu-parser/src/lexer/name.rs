//! Names, quotes and parameters.

use winnow::stream::{Location, Stream};

use super::{Input, Lexer, is_name_char, take_run};
use crate::{
    error::{Diagnostic, ErrorCode, Result},
    format::{char_word, prefix_word},
    name::ParamName,
};

const PARAMETER_HELP: &str = "parameter names consist of ASCII letters, digits and '_', \
    and must not start with a digit";

fn is_parameter_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// The spelling of an escaped character in a diagnostic.
fn escape_word(c: char) -> String {
    if c.is_ascii_graphic() {
        format!("'\\{c}'")
    } else {
        let mut buf = [0; 4];
        let octal: String = c
            .encode_utf8(&mut buf)
            .bytes()
            .map(|b| format!("\\{b:03o}"))
            .collect();
        format!("'\\{octal}'")
    }
}

impl Lexer<'_> {
    /// Scan a name made of unquoted characters, quoted parts and
    /// parameters.
    ///
    /// Returns `None` if nothing at the current position can start a name.
    pub(super) fn scan_name(&mut self, input: &mut Input<'_>) -> Result<Option<ParamName>> {
        let begin = input.current_token_start();
        let mut name = ParamName::new(self.position(begin));

        loop {
            match input.peek_token() {
                Some('"') => self.scan_double_quote(input, &mut name)?,
                Some('\'') => self.scan_single_quote(input, &mut name)?,
                Some('$') => self.scan_parameter(input, &mut name)?,
                Some(c) if is_name_char(c) => name.push_text(take_run(input, is_name_char)),
                _ => break,
            }
        }

        if !name.is_empty() {
            return Ok(Some(name));
        }
        if input.current_token_start() == begin {
            return Ok(None);
        }
        Err(Diagnostic::error(self.position(begin), "name must not be empty")
            .with_code(ErrorCode::E005)
            .into())
    }

    fn scan_double_quote(&mut self, input: &mut Input<'_>, name: &mut ParamName) -> Result<()> {
        let open = self.here(input);
        input.next_token();

        loop {
            name.push_text(take_run(input, |c| !matches!(c, '"' | '\\' | '\n' | '\0')));

            let at = input.current_token_start();
            match input.next_token() {
                Some('"') => return Ok(()),
                Some('\\') => {
                    let Some(c) = input.next_token() else {
                        break;
                    };
                    let unescaped = match c {
                        'a' => '\u{7}',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'v' => '\u{b}',
                        '\\' | '"' | '$' => c,
                        _ => {
                            return Err(Diagnostic::error(
                                self.position(at),
                                format!("invalid escape sequence {}", escape_word(c)),
                            )
                            .with_code(ErrorCode::E003)
                            .with_trace(open, "in quote started by '\"'")
                            .into());
                        }
                    };
                    name.push_char(unescaped);
                }
                Some('\0') => {
                    return Err(Diagnostic::error(self.position(at), "invalid character '\\0'")
                        .with_code(ErrorCode::E002)
                        .with_trace(open, "in quote started by '\"'")
                        .into());
                }
                Some(_) => {
                    // Newline
                    return Err(Diagnostic::error(self.position(at), "expected a closing '\"'")
                        .with_code(ErrorCode::E001)
                        .with_trace(open, "for quote started by '\"'")
                        .into());
                }
                None => break,
            }
        }

        Err(Diagnostic::error(self.here(input), "expected a closing '\"'")
            .with_code(ErrorCode::E001)
            .with_trace(open, "for quote started by '\"'")
            .into())
    }

    fn scan_single_quote(&mut self, input: &mut Input<'_>, name: &mut ParamName) -> Result<()> {
        let open = self.here(input);
        input.next_token();

        name.push_text(take_run(input, |c| !matches!(c, '\'' | '\0')));

        let at = input.current_token_start();
        match input.next_token() {
            Some('\'') => Ok(()),
            Some(_) => Err(Diagnostic::error(self.position(at), "invalid character '\\0'")
                .with_code(ErrorCode::E002)
                .with_trace(open, "in quote started by '''")
                .into()),
            None => Err(Diagnostic::error(self.here(input), "expected a closing '''")
                .with_code(ErrorCode::E001)
                .with_trace(open, "for quote started by '''")
                .into()),
        }
    }

    /// Scan `$NAME` or `${NAME}`.
    fn scan_parameter(&mut self, input: &mut Input<'_>, name: &mut ParamName) -> Result<()> {
        let dollar = input.current_token_start();
        input.next_token();

        let braces = input.peek_token() == Some('{');
        if braces {
            input.next_token();
        }

        let name_start = input.current_token_start();
        let parameter = take_run(input, is_parameter_char);

        if braces && input.peek_token() != Some('}') {
            let message = match input.peek_token() {
                Some(c) => format!("character {} must not appear", char_word(c)),
                None => "expected a closing '}'".to_string(),
            };
            return Err(Diagnostic::error(self.here(input), message)
                .with_code(ErrorCode::E004)
                .with_trace(self.position(dollar), "in parameter started by '$'")
                .with_help(PARAMETER_HELP)
                .into());
        }

        if parameter.is_empty() {
            let message = match input.peek_token() {
                Some(c) => format!("expected parameter name, not {}", char_word(c)),
                None => "expected parameter name".to_string(),
            };
            return Err(Diagnostic::error(self.position(name_start), message)
                .with_code(ErrorCode::E004)
                .with_trace(self.position(dollar), "after '$'")
                .into());
        }

        if parameter.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Diagnostic::error(
                self.position(name_start),
                format!(
                    "parameter name {} must not start with a digit",
                    prefix_word(parameter, "$")
                ),
            )
            .with_code(ErrorCode::E004)
            .with_help(PARAMETER_HELP)
            .into());
        }

        if braces {
            input.next_token();
        }
        name.push_parameter(parameter, self.position(dollar));
        Ok(())
    }
}
