//! Error codes for the Stu diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E00x` - Scanner errors
//! - `E01x` - Statement and inclusion errors
//! - `E1xx` - Parser errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Scanner Errors (E00x)
    // =========================================================================
    /// Unterminated quote.
    ///
    /// A single or double quote was opened but not closed before the end of
    /// the line (double quotes) or the end of the input.
    E001,

    /// Invalid character.
    ///
    /// A character that cannot start any token, or a NUL byte inside a quote.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes inside double quotes are: `\a`, `\b`, `\f`, `\n`, `\r`,
    /// `\t`, `\v`, `\\`, `\"`, `\$`.
    E003,

    /// Invalid parameter name.
    ///
    /// A `$` or `${` was not followed by a valid parameter name. Parameter
    /// names consist of alphanumerics and underscores and must not start
    /// with a digit.
    E004,

    /// Empty name.
    ///
    /// A name was written using quotes but contains no characters.
    E005,

    /// Unterminated command.
    ///
    /// The input ended before the closing `}` of a command.
    E006,

    // =========================================================================
    // Statement Errors (E01x)
    // =========================================================================
    /// Invalid statement.
    ///
    /// A `%` was not followed by `include` or `version`.
    E010,

    /// Statement not allowed here.
    ///
    /// `%include` was used in a dynamic dependency or an option argument.
    E011,

    /// Invalid include filename.
    ///
    /// `%include` was not followed by an unparametrized filename.
    E012,

    /// Recursive inclusion.
    ///
    /// A file includes itself, directly or through other files.
    E013,

    /// Malformed version.
    ///
    /// The argument to `%version` is not of the form `MAJOR.MINOR` or
    /// `MAJOR.MINOR.PATCH`.
    E014,

    /// Incompatible version.
    ///
    /// The version requested with `%version` is not provided.
    E015,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    /// Invalid target name.
    ///
    /// A target name contains two unseparated parameters or the same
    /// parameter twice.
    E102,

    /// Invalid output redirection.
    ///
    /// `>` was used on a phony target or in a rule without a command.
    E103,

    /// Duplicate input redirection.
    ///
    /// More than one `<` appears in the dependencies of one rule.
    E104,

    /// Invalid input redirection.
    ///
    /// `<` was used in a rule without a command or together with `?`.
    E105,

    /// Invalid variable name.
    ///
    /// The name of a `$[...]` dependency contains `=`.
    E106,

    /// Unused parameter.
    ///
    /// A dependency uses a parameter that does not appear in the target.
    E107,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Scanner errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            // Statement errors
            ErrorCode::E010 => "E010",
            ErrorCode::E011 => "E011",
            ErrorCode::E012 => "E012",
            ErrorCode::E013 => "E013",
            ErrorCode::E014 => "E014",
            ErrorCode::E015 => "E015",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Scanner errors
            ErrorCode::E001 => "unterminated quote",
            ErrorCode::E002 => "invalid character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid parameter name",
            ErrorCode::E005 => "empty name",
            ErrorCode::E006 => "unterminated command",
            // Statement errors
            ErrorCode::E010 => "invalid statement",
            ErrorCode::E011 => "statement not allowed here",
            ErrorCode::E012 => "invalid include filename",
            ErrorCode::E013 => "recursive inclusion",
            ErrorCode::E014 => "malformed version",
            ErrorCode::E015 => "incompatible version",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "invalid target name",
            ErrorCode::E103 => "invalid output redirection",
            ErrorCode::E104 => "duplicate input redirection",
            ErrorCode::E105 => "invalid input redirection",
            ErrorCode::E106 => "invalid variable name",
            ErrorCode::E107 => "unused parameter",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
