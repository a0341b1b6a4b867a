use super::compression;
use crate::core::models::structure::Structure;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::Path;

/// Defines the interface for reading and writing a structure file format.
///
/// Implementors handle format-specific parsing and serialization; the engine only ever
/// sees [`Structure`] values and the implementor's error type. Implementations are
/// stateless, so a format can be used from any number of pool workers at once.
pub trait StructureFormat {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error> + Send + Sync + 'static;

    /// File extension (without the leading dot) of uncompressed files in this format.
    const EXTENSION: &'static str;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error>;

    /// Writes a structure to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a structure from an in-memory buffer.
    ///
    /// Gzip-compressed buffers are transparently decompressed first.
    ///
    /// # Errors
    ///
    /// Returns an error if decompression or parsing fails.
    fn read_from_bytes(bytes: &[u8]) -> Result<Structure, Self::Error> {
        let data = compression::maybe_gunzip(bytes)?;
        let mut reader = Cursor::new(data.as_ref());
        Self::read_from(&mut reader)
    }

    /// Reads a structure from a file path.
    ///
    /// Files ending in `.gz` are decompressed while reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, Self::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        if compression::has_gzip_extension(path) {
            let mut reader = BufReader::new(flate2::read::MultiGzDecoder::new(file));
            Self::read_from(&mut reader)
        } else {
            let mut reader = BufReader::new(file);
            Self::read_from(&mut reader)
        }
    }

    /// Writes a structure to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(structure: &Structure, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
