//! Command blocks.
//!
//! A command extends from `{` to the matching `}`. Braces inside shell
//! quotes, backquotes, subshells and comments do not count, so the block
//! is scanned with a stack of the currently open shell constructs.

use winnow::stream::{Location, Stream};

use super::{Input, Lexer, is_space, take_run};
use crate::{
    error::{Diagnostic, ErrorCode, Result},
    tokens::Command,
};

impl Lexer<'_> {
    pub(super) fn scan_command(&mut self, input: &mut Input<'_>) -> Result<Command> {
        let open = input.current_token_start();
        input.next_token();

        let begin = input.current_token_start();
        let first_line = self.index.line(begin);
        let mut place = begin;
        let mut leading = true;

        // Innermost open construct last
        let mut stack = vec!['{'];

        while let Some(c) = input.peek_token() {
            let offset = input.current_token_start();
            let top = stack.last().copied().unwrap_or('{');

            if leading {
                if c == '\n' {
                    let line = self.index.line(offset);
                    if line == first_line {
                        place = offset;
                    } else if line == first_line + 1 {
                        place = self.index.line_start(line);
                    }
                } else if !is_space(c) && c != '}' {
                    leading = false;
                    place = offset;
                }
            }

            input.next_token();

            match c {
                '}' if top == '{' => {
                    stack.pop();
                    if stack.is_empty() {
                        return Ok(Command {
                            text: self.source[begin..offset].to_string(),
                            position: self.position(place),
                            open: self.position(open),
                        });
                    }
                }
                '{' | '(' if matches!(top, '{' | '(') => stack.push(c),
                ')' if top == '(' => {
                    stack.pop();
                }
                '\'' | '"' | '`' if top == c => {
                    stack.pop();
                }
                '\'' if matches!(top, '{' | '(') => stack.push(c),
                '"' if !matches!(top, '\'' | '`') => stack.push(c),
                '`' if top != '\'' => stack.push(c),
                '\\' if top != '\'' => {
                    input.next_token();
                }
                '#' if matches!(top, '{' | '(' | '`') => {
                    take_run(input, |c| c != '\n');
                }
                '$' if input.peek_token() == Some('(') => {
                    input.next_token();
                    if matches!(top, '{' | '(' | '"') {
                        stack.push('(');
                    }
                }
                _ => {}
            }
        }

        Err(
            Diagnostic::error(self.here(input), "expected end of command using '}'")
                .with_code(ErrorCode::E006)
                .with_trace(self.position(open), "after opening '{'")
                .into(),
        )
    }
}
