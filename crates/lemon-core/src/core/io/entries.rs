use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EntriesError {
    #[error("Entries file '{path}' does not exist", path = path.display())]
    Missing { path: PathBuf },
    #[error("Entries path '{path}' is not a regular file", path = path.display())]
    NotAFile { path: PathBuf },
    #[error("Failed to read entries file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An ordered, duplicate-free list of record identifiers.
///
/// Insertion order is preserved because it is the order in which records are handed
/// to the pool; later duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryList {
    ids: Vec<String>,
    seen: HashSet<String>,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an entries file: one identifier per line, surrounding whitespace trimmed,
    /// blank lines skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist, is not a regular file, or cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EntriesError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EntriesError::Missing {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(EntriesError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let io_err = |source| EntriesError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let list = Self::read_from(BufReader::new(file)).map_err(io_err)?;
        debug!(
            "Loaded {} entries from {}",
            list.len(),
            path.display()
        );
        Ok(list)
    }

    pub fn read_from(reader: impl BufRead) -> io::Result<Self> {
        let mut list = Self::new();
        let mut duplicates = 0usize;
        for line in reader.lines() {
            let line = line?;
            let id = line.trim();
            if id.is_empty() {
                continue;
            }
            if !list.push(id) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            debug!("Dropped {} duplicate entries", duplicates);
        }
        Ok(list)
    }

    /// Appends an identifier, returning `false` if it was already present.
    pub fn push(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.ids.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }
}

impl<S: AsRef<str>> FromIterator<S> for EntryList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for id in iter {
            let id = id.as_ref().trim();
            if !id.is_empty() {
                list.push(id);
            }
        }
        list
    }
}
