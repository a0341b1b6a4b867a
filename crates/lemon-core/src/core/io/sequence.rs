//! Reader and writer for Hadoop-style sequence containers.
//!
//! A container is a header followed by a stream of `(key, value)` records. Only
//! uncompressed-record containers with `Text` keys and `BytesWritable` values are
//! supported; the values themselves are usually gzip-compressed structure files.
//!
//! ```text
//! header : "SEQ" version(6) Text(key class) Text(value class)
//!          bool(compressed) bool(block compressed) i32(metadata count) {Text Text}*
//!          sync[16]
//! record : i32(record length) i32(key length) key[key length] value[record - key]
//!          | i32(-1) sync[16]
//! key    : vint(n) utf8[n]                 (Text)
//! value  : i32(n) bytes[n]                 (BytesWritable)
//! ```
//!
//! All fixed-width integers are big-endian.

use super::compression;
use std::io::{self, Read, Write};
use thiserror::Error;

const MAGIC: &[u8; 3] = b"SEQ";
const VERSION: u8 = 6;
const SYNC_ESCAPE: i32 = -1;
const SYNC_SIZE: usize = 16;
const DEFAULT_SYNC_INTERVAL: usize = 100;

pub const TEXT_CLASS: &str = "org.apache.hadoop.io.Text";
pub const BYTES_WRITABLE_CLASS: &str = "org.apache.hadoop.io.BytesWritable";

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a sequence container (bad magic)")]
    BadMagic,
    #[error("Unsupported sequence container version {0}")]
    UnsupportedVersion(u8),
    #[error("Unsupported container layout: {0}")]
    Unsupported(String),
    #[error("Container truncated while reading {context}")]
    Truncated { context: &'static str },
    #[error("Declared length {declared} of {context} does not match the {actual} bytes available")]
    LengthMismatch {
        context: &'static str,
        declared: i64,
        actual: i64,
    },
    #[error("Sync marker mismatch at byte {offset}")]
    SyncMismatch { offset: u64 },
    #[error("Invalid record key: {0}")]
    InvalidKey(String),
}

impl SequenceError {
    /// Whether the error describes damaged container bytes rather than an I/O failure.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, SequenceError::Io(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    pub key_class: String,
    pub value_class: String,
    pub metadata: Vec<(String, String)>,
    sync: [u8; SYNC_SIZE],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub key: String,
    pub payload: Vec<u8>,
}

/// Counts bytes consumed so corruption can be reported with an offset.
struct Counted<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }
}

fn read_exact_or(
    reader: &mut impl Read,
    buf: &mut [u8],
    context: &'static str,
) -> Result<(), SequenceError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => SequenceError::Truncated { context },
        _ => SequenceError::Io(e),
    })
}

fn read_i32(reader: &mut impl Read, context: &'static str) -> Result<i32, SequenceError> {
    let mut buf = [0u8; 4];
    read_exact_or(reader, &mut buf, context)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_u8(reader: &mut impl Read, context: &'static str) -> Result<u8, SequenceError> {
    let mut buf = [0u8; 1];
    read_exact_or(reader, &mut buf, context)?;
    Ok(buf[0])
}

/// Decodes a Hadoop `WritableUtils` variable-length integer.
fn read_vlong(reader: &mut impl Read, context: &'static str) -> Result<i64, SequenceError> {
    let first = read_u8(reader, context)? as i8;
    if first >= -112 {
        return Ok(first as i64);
    }
    let negative = first < -120;
    let len = if negative { -119 - first as i32 } else { -111 - first as i32 };
    let mut value: i64 = 0;
    for _ in 1..len {
        value = (value << 8) | read_u8(reader, context)? as i64;
    }
    Ok(if negative { !value } else { value })
}

fn write_vlong(writer: &mut impl Write, value: i64) -> io::Result<()> {
    if (-112..=127).contains(&value) {
        return writer.write_all(&[value as i8 as u8]);
    }
    let mut len: i32 = -112;
    let mut value = value;
    if value < 0 {
        value = !value;
        len = -120;
    }
    let mut tmp = value;
    while tmp != 0 {
        tmp >>= 8;
        len -= 1;
    }
    writer.write_all(&[len as i8 as u8])?;
    let len = if len < -120 { -(len + 120) } else { -(len + 112) };
    for idx in (0..len).rev() {
        writer.write_all(&[((value >> (idx * 8)) & 0xFF) as u8])?;
    }
    Ok(())
}

fn vlong_size(value: i64) -> usize {
    let mut sink = Vec::with_capacity(9);
    // Writing into a Vec cannot fail.
    let _ = write_vlong(&mut sink, value);
    sink.len()
}

fn read_text(reader: &mut impl Read, context: &'static str) -> Result<String, SequenceError> {
    let len = read_vlong(reader, context)?;
    if len < 0 {
        return Err(SequenceError::Unsupported(format!(
            "negative text length {len} in {context}"
        )));
    }
    let mut buf = Vec::new();
    let read = reader.take(len as u64).read_to_end(&mut buf)?;
    if read as i64 != len {
        return Err(SequenceError::Truncated { context });
    }
    String::from_utf8(buf).map_err(|e| SequenceError::InvalidKey(e.to_string()))
}

fn write_text(writer: &mut impl Write, text: &str) -> io::Result<()> {
    write_vlong(writer, text.len() as i64)?;
    writer.write_all(text.as_bytes())
}

/// Streams records out of a sequence container.
///
/// The reader owns its source; dropping it closes the underlying handle.
pub struct SequenceReader<R> {
    reader: Counted<R>,
    header: SequenceHeader,
}

impl<R: Read> SequenceReader<R> {
    /// Reads and validates the container header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is malformed or describes an unsupported layout.
    pub fn new(reader: R) -> Result<Self, SequenceError> {
        let mut reader = Counted {
            inner: reader,
            offset: 0,
        };

        let mut magic = [0u8; 3];
        read_exact_or(&mut reader, &mut magic, "header magic").map_err(|e| match e {
            SequenceError::Truncated { .. } => SequenceError::BadMagic,
            other => other,
        })?;
        if &magic != MAGIC {
            return Err(SequenceError::BadMagic);
        }
        let version = read_u8(&mut reader, "header version")?;
        if version != VERSION {
            return Err(SequenceError::UnsupportedVersion(version));
        }

        let key_class = read_text(&mut reader, "key class name")?;
        let value_class = read_text(&mut reader, "value class name")?;
        if key_class != TEXT_CLASS {
            return Err(SequenceError::Unsupported(format!(
                "key class '{key_class}' (expected {TEXT_CLASS})"
            )));
        }
        if value_class != BYTES_WRITABLE_CLASS {
            return Err(SequenceError::Unsupported(format!(
                "value class '{value_class}' (expected {BYTES_WRITABLE_CLASS})"
            )));
        }

        let compressed = read_u8(&mut reader, "compression flag")? != 0;
        let block_compressed = read_u8(&mut reader, "block compression flag")? != 0;
        if compressed || block_compressed {
            return Err(SequenceError::Unsupported(
                "record or block compressed containers".to_string(),
            ));
        }

        let metadata_count = read_i32(&mut reader, "metadata count")?;
        if metadata_count < 0 {
            return Err(SequenceError::Unsupported(format!(
                "negative metadata count {metadata_count}"
            )));
        }
        let mut metadata = Vec::with_capacity(metadata_count.min(64) as usize);
        for _ in 0..metadata_count {
            let key = read_text(&mut reader, "metadata key")?;
            let value = read_text(&mut reader, "metadata value")?;
            metadata.push((key, value));
        }

        let mut sync = [0u8; SYNC_SIZE];
        read_exact_or(&mut reader, &mut sync, "header sync marker")?;

        Ok(Self {
            reader,
            header: SequenceHeader {
                key_class,
                value_class,
                metadata,
                sync,
            },
        })
    }

    pub fn header(&self) -> &SequenceHeader {
        &self.header
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.reader.offset
    }

    /// Reads the next record, or `None` at a clean end of container.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is truncated or its lengths are inconsistent.
    pub fn next_record(&mut self) -> Result<Option<SequenceRecord>, SequenceError> {
        let Some((key, value_len)) = self.next_record_head()? else {
            return Ok(None);
        };
        let mut payload = Vec::new();
        let read = (&mut self.reader)
            .take(value_len as u64)
            .read_to_end(&mut payload)?;
        if read != value_len {
            return Err(SequenceError::LengthMismatch {
                context: "record value",
                declared: value_len as i64,
                actual: read as i64,
            });
        }
        Ok(Some(SequenceRecord { key, payload }))
    }

    /// Reads the next record key and skips its value without buffering it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is truncated or its lengths are inconsistent.
    pub fn next_key(&mut self) -> Result<Option<String>, SequenceError> {
        let Some((key, value_len)) = self.next_record_head()? else {
            return Ok(None);
        };
        let skipped = io::copy(&mut (&mut self.reader).take(value_len as u64), &mut io::sink())?;
        if skipped != value_len as u64 {
            return Err(SequenceError::LengthMismatch {
                context: "record value",
                declared: value_len as i64,
                actual: skipped as i64,
            });
        }
        Ok(Some(key))
    }

    /// Reads a record header, returning the key and the length of the value bytes.
    fn next_record_head(&mut self) -> Result<Option<(String, usize)>, SequenceError> {
        let record_len = loop {
            let mut buf = [0u8; 4];
            let first = self.reader.read(&mut buf[..1])?;
            if first == 0 {
                return Ok(None);
            }
            read_exact_or(&mut self.reader, &mut buf[1..], "record length")?;
            let len = i32::from_be_bytes(buf);
            if len != SYNC_ESCAPE {
                break len;
            }
            let offset = self.reader.offset;
            let mut sync = [0u8; SYNC_SIZE];
            read_exact_or(&mut self.reader, &mut sync, "sync marker")?;
            if sync != self.header.sync {
                return Err(SequenceError::SyncMismatch { offset });
            }
        };

        let key_len = read_i32(&mut self.reader, "key length")?;
        if record_len < 0 || key_len < 0 || key_len > record_len {
            return Err(SequenceError::LengthMismatch {
                context: "record key",
                declared: key_len as i64,
                actual: record_len as i64,
            });
        }

        let mut key_bytes = Vec::new();
        let read = (&mut self.reader)
            .take(key_len as u64)
            .read_to_end(&mut key_bytes)?;
        if read != key_len as usize {
            return Err(SequenceError::Truncated { context: "record key" });
        }
        let key = read_text(&mut key_bytes.as_slice(), "record key")?;

        let value_region = (record_len - key_len) as i64;
        let value_len = read_i32(&mut self.reader, "value length")? as i64;
        if value_len < 0 || value_len + 4 != value_region {
            return Err(SequenceError::LengthMismatch {
                context: "record value",
                declared: value_len,
                actual: value_region - 4,
            });
        }
        Ok(Some((key, value_len as usize)))
    }
}

/// Writes sequence containers readable by [`SequenceReader`] and by Hadoop itself.
pub struct SequenceWriter<W: Write> {
    writer: W,
    sync: [u8; SYNC_SIZE],
    sync_interval: usize,
    since_sync: usize,
    records: usize,
}

impl<W: Write> SequenceWriter<W> {
    /// Writes the container header.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the header fails.
    pub fn new(writer: W) -> Result<Self, SequenceError> {
        Self::with_metadata(writer, &[])
    }

    pub fn with_metadata(mut writer: W, metadata: &[(&str, &str)]) -> Result<Self, SequenceError> {
        let sync: [u8; SYNC_SIZE] = rand::random();

        writer.write_all(MAGIC)?;
        writer.write_all(&[VERSION])?;
        write_text(&mut writer, TEXT_CLASS)?;
        write_text(&mut writer, BYTES_WRITABLE_CLASS)?;
        writer.write_all(&[0, 0])?;
        writer.write_all(&(metadata.len() as i32).to_be_bytes())?;
        for (key, value) in metadata {
            write_text(&mut writer, key)?;
            write_text(&mut writer, value)?;
        }
        writer.write_all(&sync)?;

        Ok(Self {
            writer,
            sync,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            since_sync: 0,
            records: 0,
        })
    }

    /// Sets how many records are written between sync markers (minimum 1).
    pub fn sync_interval(mut self, records: usize) -> Self {
        self.sync_interval = records.max(1);
        self
    }

    /// Appends one record with `payload` stored as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is too large for the format or writing fails.
    pub fn append(&mut self, key: &str, payload: &[u8]) -> Result<(), SequenceError> {
        if self.since_sync >= self.sync_interval {
            self.writer.write_all(&SYNC_ESCAPE.to_be_bytes())?;
            self.writer.write_all(&self.sync)?;
            self.since_sync = 0;
        }

        let key_len = vlong_size(key.len() as i64) + key.len();
        let value_len = 4 + payload.len();
        let record_len = i32::try_from(key_len + value_len).map_err(|_| {
            SequenceError::Unsupported(format!("record '{key}' exceeds the 2 GiB format limit"))
        })?;

        self.writer.write_all(&record_len.to_be_bytes())?;
        self.writer.write_all(&(key_len as i32).to_be_bytes())?;
        write_text(&mut self.writer, key)?;
        self.writer.write_all(&(payload.len() as i32).to_be_bytes())?;
        self.writer.write_all(payload)?;

        self.since_sync += 1;
        self.records += 1;
        Ok(())
    }

    /// Appends one record, gzip-compressing `data` first.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or writing fails.
    pub fn append_compressed(&mut self, key: &str, data: &[u8]) -> Result<(), SequenceError> {
        let payload = compression::gzip(data)?;
        self.append(key, &payload)
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<W, SequenceError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
