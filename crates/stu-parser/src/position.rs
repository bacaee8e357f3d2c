//! Source positions for diagnostics and editor navigation.
//!
//! A [`Position`] names where a piece of source came from (a file, a
//! command-line argument, or a synthetic origin) together with a 1-based
//! line and a 0-based byte column. Positions are carried by every token and
//! AST node so that errors can point at the exact character that caused
//! them. They are never used to decide the meaning of a build script.

use std::{fmt, sync::Arc};

/// Where a piece of source text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A file on disk, or standard input when the name is empty.
    File,
    /// Text supplied directly as a command-line argument.
    Argument,
    /// A position not backed by source text, such as an option name.
    Synthetic,
}

/// An immutable location in source text.
///
/// Lines are 1-based. Columns are 0-based byte offsets from the start of the
/// line and are printed 1-based, which is what editors expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    kind: SourceKind,
    name: Arc<str>,
    line: u32,
    column: u32,
    offset: usize,
}

impl Position {
    /// Create a position inside a file. An empty name denotes standard input.
    pub fn file(name: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self::new(SourceKind::File, name.into(), line, column, 0)
    }

    /// Create a position inside a command-line argument.
    pub fn argument(text: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self::new(SourceKind::Argument, text.into(), line, column, 0)
    }

    /// Create a position that only carries a descriptive name.
    pub fn synthetic(name: impl Into<Arc<str>>) -> Self {
        Self::new(SourceKind::Synthetic, name.into(), 1, 0, 0)
    }

    pub(crate) fn new(
        kind: SourceKind,
        name: Arc<str>,
        line: u32,
        column: u32,
        offset: usize,
    ) -> Self {
        debug_assert!(line >= 1);
        Self {
            kind,
            name,
            line,
            column,
            offset,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The filename, or the argument text for [`SourceKind::Argument`].
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// Byte offset into the scanned buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The filename as shown to users, with `<stdin>` for standard input.
    pub fn display_name(&self) -> &str {
        match self.kind {
            SourceKind::File if self.name.is_empty() => "<stdin>",
            SourceKind::Argument => "Command line argument",
            _ => &self.name,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SourceKind::File | SourceKind::Argument => write!(
                f,
                "{}:{}:{}",
                self.display_name(),
                self.line,
                self.column + 1
            ),
            SourceKind::Synthetic => f.write_str(&self.name),
        }
    }
}

/// Maps byte offsets of one buffer to [`Position`]s.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    kind: SourceKind,
    name: Arc<str>,
    /// Offset of the first byte of every line
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(kind: SourceKind, name: Arc<str>, content: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self { kind, name, starts }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based line containing `offset`.
    pub(crate) fn line(&self, offset: usize) -> u32 {
        self.starts.partition_point(|&start| start <= offset) as u32
    }

    /// Offset of the first byte of the given 1-based line.
    pub(crate) fn line_start(&self, line: u32) -> usize {
        self.starts[line as usize - 1]
    }

    pub(crate) fn position(&self, offset: usize) -> Position {
        let line = self.line(offset);
        let column = (offset - self.line_start(line)) as u32;
        Position::new(self.kind, Arc::clone(&self.name), line, column, offset)
    }
}
