//! The core diagnostic type for the Stu error system.
//!
//! A [`Diagnostic`] is a chain of [`Trace`]s, innermost cause first. The
//! first trace carries the main message; every further trace adds context,
//! such as the opening quote of an unterminated string or the `%include`
//! statement that pulled a file in.

use std::fmt;

use crate::{error::ErrorCode, position::Position};

/// A position together with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    position: Position,
    message: String,
}

impl Trace {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

/// A logical error in build-script source.
///
/// # Example
///
/// ```text
/// main.stu:3:9: expected a closing '"'
/// main.stu:3:5: for quote started by '"'
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    traces: Vec<Trace>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic whose innermost cause is at `position`.
    ///
    /// # Example
    ///
    /// ```
    /// # use stu_parser::error::{Diagnostic, ErrorCode};
    /// # use stu_parser::Position;
    ///
    /// let diag = Diagnostic::error(Position::file("main.stu", 2, 4), "expected ']'")
    ///     .with_code(ErrorCode::E100)
    ///     .with_trace(Position::file("main.stu", 2, 0), "after opening '$['");
    /// assert_eq!(diag.traces().len(), 2);
    /// ```
    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self::from_trace(Trace::new(position, message))
    }

    fn from_trace(trace: Trace) -> Self {
        Self {
            code: None,
            traces: vec![trace],
            help: None,
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Append an outer context entry to the chain.
    pub fn with_trace(mut self, position: Position, message: impl Into<String>) -> Self {
        self.traces.push(Trace::new(position, message));
        self
    }

    pub(crate) fn with_traces(mut self, traces: impl IntoIterator<Item = Trace>) -> Self {
        self.traces.extend(traces);
        self
    }

    /// Set help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// The main message, from the innermost trace.
    pub fn message(&self) -> &str {
        self.traces[0].message()
    }

    /// The position of the innermost cause.
    pub fn position(&self) -> &Position {
        self.traces[0].position()
    }

    /// All traces, innermost first. Never empty.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, trace) in self.traces.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{trace}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, column: u32) -> Position {
        Position::file("main.stu", line, column)
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error(pos(1, 4), "expected ')'")
            .with_code(ErrorCode::E100)
            .with_trace(pos(1, 0), "for group started by '('")
            .with_help("close the group");

        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.message(), "expected ')'");
        assert_eq!(diag.position(), &pos(1, 4));
        assert_eq!(diag.traces().len(), 2);
        assert_eq!(diag.traces()[1].message(), "for group started by '('");
        assert_eq!(diag.help(), Some("close the group"));
    }

    #[test]
    fn test_diagnostic_display_innermost_first() {
        let diag = Diagnostic::error(pos(2, 3), "expected ']'")
            .with_trace(pos(2, 0), "after opening '$['");
        assert_eq!(
            diag.to_string(),
            "main.stu:2:4: expected ']'\nmain.stu:2:1: after opening '$['"
        );
    }

    #[test]
    fn test_diagnostic_without_code() {
        let diag = Diagnostic::error(pos(1, 0), "expected a rule");
        assert_eq!(diag.code(), None);
        assert_eq!(diag.help(), None);
    }
}
