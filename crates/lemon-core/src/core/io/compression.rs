//! Gzip helpers for record payloads and compressed structure files.

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::borrow::Cow;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::trace;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

pub fn has_gzip_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Decompresses gzip-compressed data.
pub fn gunzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    trace!("Decompressed {} -> {} bytes", data.len(), decompressed.len());
    Ok(decompressed)
}

/// Decompresses `data` when it carries the gzip magic number, otherwise borrows it.
pub fn maybe_gunzip(data: &[u8]) -> io::Result<Cow<'_, [u8]>> {
    if is_gzip(data) {
        gunzip(data).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(data))
    }
}

pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_output_is_detected_and_restored() {
        let payload = b"ATOM      1  N   ALA A   1".to_vec();
        let compressed = gzip(&payload).unwrap();
        assert!(is_gzip(&compressed));
        assert_eq!(gunzip(&compressed).unwrap(), payload);
    }

    #[test]
    fn maybe_gunzip_borrows_plain_data() {
        let plain = b"HEADER";
        assert!(matches!(maybe_gunzip(plain).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn truncated_gzip_stream_is_an_error() {
        let compressed = gzip(&[7u8; 4096]).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert!(gunzip(truncated).is_err());
    }

    #[test]
    fn gzip_extension_is_case_insensitive() {
        assert!(has_gzip_extension(Path::new("ab/1abc.pdb.GZ")));
        assert!(!has_gzip_extension(Path::new("ab/1abc.pdb")));
    }
}
