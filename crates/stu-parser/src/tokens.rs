//! Token types produced by the scanner.

use std::fmt;

use crate::{lexer::is_space, name::ParamName, position::Position};

/// Characters that form single-character operator tokens.
pub const OPERATOR_CHARS: &[u8] = b":<>=@;()?[]!&,\\|";

/// Token types for the Stu language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A single punctuation character such as `:` or `[`
    Operator(Operator),
    /// A name, possibly parametrized
    Name(ParamName),
    /// A command block `{ ... }`
    Command(Command),
}

#[derive(Debug, Clone)]
pub struct Operator {
    pub op: char,
    pub position: Position,
}

/// A shell command delimited by braces.
#[derive(Debug, Clone)]
pub struct Command {
    /// The text between the braces, exactly as written
    pub text: String,
    /// Where an editor should place the cursor; usually the first
    /// non-whitespace character of the command
    pub position: Position,
    /// The opening brace
    pub open: Position,
}

impl Token {
    /// The position used when reporting errors about this token.
    pub fn position(&self) -> &Position {
        match self {
            Token::Operator(op) => &op.position,
            Token::Name(name) => name.position(),
            Token::Command(cmd) => &cmd.position,
        }
    }

    /// The operator character, if this is an operator.
    pub fn operator(&self) -> Option<char> {
        match self {
            Token::Operator(op) => Some(op.op),
            _ => None,
        }
    }

    pub fn is_operator(&self, c: char) -> bool {
        self.operator() == Some(c)
    }

    pub fn as_name(&self) -> Option<&ParamName> {
        match self {
            Token::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Token::Command(cmd) => Some(cmd),
            _ => None,
        }
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
    }
}

impl Eq for Operator {}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Command {}

impl Command {
    /// The command split into lines for display.
    ///
    /// Lines with only whitespace are dropped, whitespace common to the
    /// start of all lines is removed, and trailing whitespace is trimmed.
    pub fn lines(&self) -> Vec<&str> {
        let lines: Vec<&str> = self
            .text
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect();

        let mut indent = 0;
        if let Some(first) = lines.first() {
            'outer: for (i, c) in first.char_indices() {
                if !is_space(c) {
                    break;
                }
                for line in &lines {
                    if line.as_bytes().get(i) != Some(&(c as u8)) {
                        break 'outer;
                    }
                }
                indent = i + 1;
            }
        }

        lines
            .into_iter()
            .map(|line| line[indent..].trim_end())
            .collect()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Operator(op) => write!(f, "{}", op.op),
            Token::Name(name) => write!(f, "{name}"),
            Token::Command(cmd) => write!(f, "{{{}}}", cmd.text),
        }
    }
}
