//! Error and diagnostic system for the Stu parser.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Chains of positioned messages, innermost cause first
//! - A split between logical errors in the source and fatal system errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which holds an
//! optional error code, a non-empty chain of [`Trace`]s and optional help
//! text. Diagnostics are wrapped in [`ParseError::Logical`]; failures to load
//! a file become [`ParseError::Fatal`].
//!
//! # Example
//!
//! ```
//! # use stu_parser::error::{Diagnostic, ErrorCode, ParseError};
//! # use stu_parser::Position;
//!
//! let brace = Position::file("main.stu", 4, 10);
//! let end = Position::file("main.stu", 9, 0);
//!
//! let err: ParseError = Diagnostic::error(end, "expected end of command using '}'")
//!     .with_code(ErrorCode::E006)
//!     .with_trace(brace, "after opening '{'")
//!     .into();
//! assert_eq!(err.code(), Some(ErrorCode::E006));
//! ```

mod diagnostic;
mod error_code;
mod parse_error;

pub use diagnostic::{Diagnostic, Trace};
pub use error_code::ErrorCode;
pub use parse_error::{ParseError, Result};
