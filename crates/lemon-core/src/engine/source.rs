use super::error::RecordError;
use crate::core::io::sequence::{SequenceError, SequenceReader, SequenceRecord};
use crate::core::io::traits::StructureFormat;
use crate::core::models::structure::Structure;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Resolves identifiers to files in a PDB-mirror style directory tree.
///
/// `1ABC` lives at `root/ab/1ABC.pdb`: the second and third characters of the
/// identifier, lowercased, name the subdirectory and the file name keeps its case. A gzip sibling (`1ABC.pdb.gz`) is
/// used when the plain file is absent.
#[derive(Debug, Clone)]
pub struct DirectorySource<F> {
    root: PathBuf,
    _format: PhantomData<fn() -> F>,
}

impl<F: StructureFormat> DirectorySource<F> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _format: PhantomData,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        let file_name = format!("{id}.{}", F::EXTENSION);
        if id.chars().count() < 3 {
            return self.root.join(file_name);
        }
        let bucket: String = id.chars().skip(1).take(2).collect();
        self.root.join(bucket.to_lowercase()).join(file_name)
    }

    /// Reads and parses the structure stored for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] if neither the plain nor the gzip file exists,
    /// [`RecordError::Unreadable`] if the file cannot be read, and [`RecordError::Parse`]
    /// if its contents do not parse.
    pub fn resolve(&self, id: &str) -> Result<Structure, RecordError> {
        let plain = self.path_for(id);
        let path = if plain.is_file() {
            plain
        } else {
            let mut gz = plain.clone().into_os_string();
            gz.push(".gz");
            let gz = PathBuf::from(gz);
            if !gz.is_file() {
                return Err(RecordError::NotFound { path: plain });
            }
            gz
        };

        trace!("Reading {}", path.display());
        let bytes = fs::read(&path).map_err(|e| RecordError::Unreadable {
            path: path.clone(),
            message: e.to_string(),
        })?;
        F::read_from_bytes(&bytes).map_err(|e| RecordError::Parse(e.to_string()))
    }
}

/// A set of sequence containers holding keyed, gzip-compressed structures.
#[derive(Debug, Clone)]
pub struct ArchiveSource<F> {
    containers: Vec<PathBuf>,
    _format: PhantomData<fn() -> F>,
}

impl<F: StructureFormat> ArchiveSource<F> {
    pub fn new(containers: Vec<PathBuf>) -> Self {
        Self {
            containers,
            _format: PhantomData,
        }
    }

    /// Collects every regular file in `dir`, sorted by name.
    ///
    /// Names starting with `.` or `_` are bookkeeping files written next to the
    /// containers (`_SUCCESS`, `.part-00000.crc`) and are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn discover(dir: &Path) -> io::Result<Self> {
        let mut containers = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || name.starts_with('_') {
                trace!("Skipping bookkeeping file {}", name);
                continue;
            }
            if entry.path().is_file() {
                containers.push(entry.path());
            }
        }
        containers.sort();
        debug!(
            "Discovered {} containers in {}",
            containers.len(),
            dir.display()
        );
        Ok(Self::new(containers))
    }

    pub fn containers(&self) -> &[PathBuf] {
        &self.containers
    }

    /// Opens one container for a sequential scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is invalid.
    pub fn open(&self, container: &Path) -> Result<ContainerScan, RecordError> {
        let file = File::open(container).map_err(|e| RecordError::Unreadable {
            path: container.to_path_buf(),
            message: e.to_string(),
        })?;
        let reader = SequenceReader::new(BufReader::new(file))
            .map_err(|e| container_error(container, e))?;
        Ok(ContainerScan {
            path: container.to_path_buf(),
            reader,
        })
    }

    /// Decompresses and parses one record payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Parse`] if the payload does not decompress or parse.
    pub fn decode(&self, record: &SequenceRecord) -> Result<Structure, RecordError> {
        F::read_from_bytes(&record.payload).map_err(|e| RecordError::Parse(e.to_string()))
    }

    /// Lazily lists every record key, container by container.
    ///
    /// Payloads are skipped without being decompressed. A container that cannot be opened
    /// or turns out to be corrupt yields one error and the listing moves to the next one.
    pub fn enumerate(&self) -> Keys<'_, F> {
        Keys {
            source: self,
            next_container: 0,
            current: None,
        }
    }

    /// Finds `id` by scanning the containers in order.
    ///
    /// A container that cannot be opened or is corrupt is skipped, so every key
    /// [`enumerate`](Self::enumerate) lists stays reachable.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] if no readable container holds the key. If a
    /// skipped container might have held it, the last container error is returned instead.
    pub fn resolve(&self, id: &str) -> Result<Structure, RecordError> {
        let mut last_error = None;
        for container in &self.containers {
            match self.find_in(container, id) {
                Ok(Some(record)) => return self.decode(&record),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping container while resolving {}: {}", id, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| RecordError::NotFound {
            path: PathBuf::from(id),
        }))
    }

    fn find_in(&self, container: &Path, id: &str) -> Result<Option<SequenceRecord>, RecordError> {
        let mut scan = self.open(container)?;
        while let Some(record) = scan.next_record()? {
            if record.key == id {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Sequential scan over one container; the file handle is owned and closed on drop.
pub struct ContainerScan {
    path: PathBuf,
    reader: SequenceReader<BufReader<File>>,
}

impl ContainerScan {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_record(&mut self) -> Result<Option<SequenceRecord>, RecordError> {
        self.reader
            .next_record()
            .map_err(|e| container_error(&self.path, e))
    }

    pub fn next_key(&mut self) -> Result<Option<String>, RecordError> {
        self.reader
            .next_key()
            .map_err(|e| container_error(&self.path, e))
    }
}

fn container_error(container: &Path, error: SequenceError) -> RecordError {
    if error.is_corruption() {
        RecordError::ArchiveCorruption {
            container: container.to_path_buf(),
            reason: error.to_string(),
        }
    } else {
        RecordError::Unreadable {
            path: container.to_path_buf(),
            message: error.to_string(),
        }
    }
}

pub struct Keys<'a, F> {
    source: &'a ArchiveSource<F>,
    next_container: usize,
    current: Option<ContainerScan>,
}

impl<F: StructureFormat> Iterator for Keys<'_, F> {
    type Item = Result<String, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(scan) = self.current.as_mut() {
                match scan.next_key() {
                    Ok(Some(key)) => return Some(Ok(key)),
                    Ok(None) => self.current = None,
                    Err(e) => {
                        self.current = None;
                        return Some(Err(e));
                    }
                }
            }

            let container = self.source.containers.get(self.next_container)?;
            self.next_container += 1;
            match self.source.open(container) {
                Ok(scan) => self.current = Some(scan),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// The record source selected for a run.
#[derive(Debug, Clone)]
pub enum RecordSource<F> {
    Directory(DirectorySource<F>),
    Archive(ArchiveSource<F>),
}

impl<F: StructureFormat> RecordSource<F> {
    pub fn resolve(&self, id: &str) -> Result<Structure, RecordError> {
        match self {
            RecordSource::Directory(source) => source.resolve(id),
            RecordSource::Archive(source) => source.resolve(id),
        }
    }
}
