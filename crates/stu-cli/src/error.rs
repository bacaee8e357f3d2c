//! Error type of the CLI.

use std::io;

use thiserror::Error;

use stu_parser::ParseError;

use crate::{config::ConfigError, sources::Sources};

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A scan or parse error, with the text of every file loaded so far
    /// for rendering source snippets.
    #[error("{err}")]
    Parse { err: ParseError, sources: Sources },
}

/// Exit status for errors in the build script itself.
pub const EXIT_LOGICAL: i32 = 2;
/// Exit status for errors of the environment, such as unreadable files.
pub const EXIT_FATAL: i32 = 4;

impl CliError {
    pub fn new_parse_error(err: ParseError, sources: Sources) -> Self {
        CliError::Parse { err, sources }
    }

    /// The process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Parse {
                err: ParseError::Logical(_),
                ..
            } => EXIT_LOGICAL,
            CliError::Parse {
                err: ParseError::Fatal { .. },
                ..
            }
            | CliError::Io(_)
            | CliError::Config(_) => EXIT_FATAL,
        }
    }
}
