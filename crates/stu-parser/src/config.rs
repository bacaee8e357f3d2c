//! Scanner configuration.

use serde::Deserialize;

use crate::version::Version;

/// The filename loaded when a source path names a directory.
pub const DEFAULT_FILENAME: &str = "main.stu";

/// Immutable settings threaded through one scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Loaded from inside a directory given as a source path
    pub default_filename: String,
    /// Checked against `%version` statements
    pub version: Version,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_filename: DEFAULT_FILENAME.to_string(),
            version: Version::CURRENT,
        }
    }
}

impl ParserConfig {
    pub fn new(default_filename: impl Into<String>, version: Version) -> Self {
        Self {
            default_filename: default_filename.into(),
            version,
        }
    }
}
