//! The ParseError type returned by the scanner and the parser.
//!
//! There are two kinds of failure. A [`ParseError::Logical`] error means the
//! build script itself is wrong; it carries a [`Diagnostic`]. A
//! [`ParseError::Fatal`] error means the environment failed, typically
//! because a file could not be read. Either one aborts the whole parse.

use std::io;

use thiserror::Error;

use crate::{
    error::{Diagnostic, ErrorCode, Trace},
    position::Position,
};

/// A type alias for `Result<T, ParseError>`.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Error type for scanning and parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed or semantically invalid source.
    #[error(transparent)]
    Logical(#[from] Diagnostic),

    /// A system error while loading source.
    #[error("{}: {source}", display_filename(.filename))]
    Fatal {
        /// The file that could not be loaded; empty for standard input
        filename: String,
        /// The `%include` chain that led to the file, innermost first
        traces: Vec<Trace>,
        #[source]
        source: io::Error,
    },
}

fn display_filename(filename: &str) -> &str {
    if filename.is_empty() {
        "<stdin>"
    } else {
        filename
    }
}

impl ParseError {
    pub(crate) fn fatal(filename: &str, traces: Vec<Trace>, source: io::Error) -> Self {
        ParseError::Fatal {
            filename: filename.to_string(),
            traces,
            source,
        }
    }

    /// The error code, for logical errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ParseError::Logical(diag) => diag.code(),
            ParseError::Fatal { .. } => None,
        }
    }

    /// The innermost position of the error, if known.
    pub fn position(&self) -> Option<&Position> {
        match self {
            ParseError::Logical(diag) => Some(diag.position()),
            ParseError::Fatal { traces, .. } => traces.first().map(Trace::position),
        }
    }

    /// The diagnostic, for logical errors.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            ParseError::Logical(diag) => Some(diag),
            ParseError::Fatal { .. } => None,
        }
    }

    /// Render the error as one `position: message` line per trace.
    pub fn render(&self) -> String {
        match self {
            ParseError::Logical(diag) => diag.to_string(),
            ParseError::Fatal { traces, .. } => match traces.split_first() {
                None => self.to_string(),
                Some((first, rest)) => {
                    let mut lines = vec![format!("{}: {self}", first.position())];
                    lines.extend(rest.iter().map(ToString::to_string));
                    lines.join("\n")
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_from_diagnostic() {
        let diag = Diagnostic::error(Position::file("a.stu", 1, 0), "expected a rule")
            .with_code(ErrorCode::E100);
        let err: ParseError = diag.into();

        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.to_string(), "a.stu:1:1: expected a rule");
        assert!(err.diagnostic().is_some());
    }

    #[test]
    fn test_fatal_display() {
        let err = ParseError::fatal(
            "missing.stu",
            Vec::new(),
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(err.to_string(), "missing.stu: No such file or directory");
        assert_eq!(err.code(), None);
        assert!(err.position().is_none());
        assert_eq!(err.render(), "missing.stu: No such file or directory");
    }

    #[test]
    fn test_fatal_stdin_display() {
        let err = ParseError::fatal("", Vec::new(), io::Error::other("read failed"));
        assert_eq!(err.to_string(), "<stdin>: read failed");
    }

    #[test]
    fn test_fatal_render_with_traces() {
        let traces = vec![
            Trace::new(Position::file("b.stu", 2, 9), "'c.stu' is included from here"),
            Trace::new(Position::file("main.stu", 1, 9), "'b.stu' is included from here"),
        ];
        let err = ParseError::fatal("c.stu", traces, io::Error::other("denied"));
        assert_eq!(
            err.render(),
            "b.stu:2:10: c.stu: denied\nmain.stu:1:10: 'b.stu' is included from here"
        );
        assert_eq!(err.position(), Some(&Position::file("b.stu", 2, 9)));
    }
}
