//! Loading build-script source.
//!
//! The scanner never touches the filesystem itself. It asks a
//! [`SourceLoader`] for the complete content of a file and scans the
//! returned buffer.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{self, Read},
    path::Path,
};

use log::debug;

use crate::config::ParserConfig;

/// The content of one loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    /// The name the content was actually read from. Differs from the
    /// requested name when a directory was given.
    pub filename: String,
    pub content: Vec<u8>,
}

/// Provides the content of build-script files.
pub trait SourceLoader {
    /// Load `filename` completely.
    ///
    /// An empty filename means standard input. `handle` may be the file
    /// already opened by the caller. When `filename` is a directory,
    /// [`ParserConfig::default_filename`] inside it is loaded instead.
    fn load(
        &self,
        filename: &str,
        handle: Option<File>,
        config: &ParserConfig,
    ) -> io::Result<LoadedSource>;
}

/// Name of the default file inside the directory `dir`.
fn join_default(dir: &str, config: &ParserConfig) -> String {
    if dir.ends_with('/') {
        format!("{dir}{}", config.default_filename)
    } else {
        format!("{dir}/{}", config.default_filename)
    }
}

/// Loads files from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(
        &self,
        filename: &str,
        handle: Option<File>,
        config: &ParserConfig,
    ) -> io::Result<LoadedSource> {
        let mut content = Vec::new();

        if filename.is_empty() {
            debug!("Reading standard input");
            io::stdin().lock().read_to_end(&mut content)?;
            return Ok(LoadedSource {
                filename: String::new(),
                content,
            });
        }

        let mut file = match handle {
            Some(file) => file,
            None => File::open(filename)?,
        };

        if file.metadata()?.is_dir() {
            let inner = join_default(filename, config);
            debug!(directory = filename, filename = inner.as_str(); "Loading default file in directory");
            let content = fs::read(Path::new(&inner))?;
            return Ok(LoadedSource {
                filename: inner,
                content,
            });
        }

        file.read_to_end(&mut content)?;
        Ok(LoadedSource {
            filename: filename.to_string(),
            content,
        })
    }
}

/// Serves files from memory.
///
/// A requested name that is not present is treated as a directory when
/// the default filename inside it is present.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content.
    pub fn insert(&mut self, filename: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(filename.into(), content.into());
    }

    /// Builder-style [`MemoryLoader::insert`].
    pub fn with_file(mut self, filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(filename, content);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(
        &self,
        filename: &str,
        _handle: Option<File>,
        config: &ParserConfig,
    ) -> io::Result<LoadedSource> {
        if let Some(content) = self.files.get(filename) {
            return Ok(LoadedSource {
                filename: filename.to_string(),
                content: content.clone(),
            });
        }
        let inner = join_default(filename, config);
        match self.files.get(&inner) {
            Some(content) => Ok(LoadedSource {
                filename: inner,
                content: content.clone(),
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            )),
        }
    }
}
