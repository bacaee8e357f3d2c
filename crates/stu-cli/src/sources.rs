//! Keeping loaded build-script text around for error reports.

use std::{cell::RefCell, collections::HashMap, fs::File, io};

use stu_parser::{LoadedSource, ParserConfig, Position, SourceKind, SourceLoader};

/// Text of every file loaded during one run, by filename.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    files: HashMap<String, String>,
}

impl Sources {
    /// The text that `position` points into.
    ///
    /// Command-line arguments carry their own text as the position name.
    pub fn text<'a>(&'a self, position: &'a Position) -> Option<&'a str> {
        match position.kind() {
            SourceKind::File => self.files.get(position.name()).map(String::as_str),
            SourceKind::Argument => Some(position.name()),
            SourceKind::Synthetic => None,
        }
    }

    pub fn insert(&mut self, filename: impl Into<String>, text: impl Into<String>) {
        self.files.insert(filename.into(), text.into());
    }
}

/// A [`SourceLoader`] that records the content of every file it loads.
pub struct RecordingLoader<L> {
    inner: L,
    sources: RefCell<Sources>,
}

impl<L: SourceLoader> RecordingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            sources: RefCell::new(Sources::default()),
        }
    }

    pub fn into_sources(self) -> Sources {
        self.sources.into_inner()
    }
}

impl<L: SourceLoader> SourceLoader for RecordingLoader<L> {
    fn load(
        &self,
        filename: &str,
        handle: Option<File>,
        config: &ParserConfig,
    ) -> io::Result<LoadedSource> {
        let loaded = self.inner.load(filename, handle, config)?;
        self.sources.borrow_mut().insert(
            loaded.filename.clone(),
            String::from_utf8_lossy(&loaded.content),
        );
        Ok(loaded)
    }
}
