//! Test fixtures: small PDB records laid out as a divided mirror or packed in containers.

use crate::core::io::compression;
use crate::core::io::pdb::PdbFile;
use crate::core::io::sequence::SequenceWriter;
use crate::engine::source::DirectorySource;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// A two-residue record with one zinc ion; `id` goes into the HEADER line.
pub fn pdb_text(id: &str) -> String {
    format!(
        "\
HEADER    TEST RECORD                             01-JAN-00   {id:<4}
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
HETATM    3 ZN    ZN A 101       5.000   5.000   5.000  1.00 20.00          ZN
END
"
    )
}

pub fn write_divided(root: &Path, ids: &[&str]) {
    let source = DirectorySource::<PdbFile>::new(root);
    for id in ids {
        let path = source.path_for(id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, pdb_text(id)).unwrap();
    }
}

pub fn write_divided_gz(root: &Path, ids: &[&str]) {
    let source = DirectorySource::<PdbFile>::new(root);
    for id in ids {
        let path = source.path_for(id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut gz = path.into_os_string();
        gz.push(".gz");
        fs::write(gz, compression::gzip(pdb_text(id).as_bytes()).unwrap()).unwrap();
    }
}

pub fn write_archive(path: &Path, ids: &[&str]) {
    let file = BufWriter::new(File::create(path).unwrap());
    let mut writer = SequenceWriter::new(file).unwrap().sync_interval(2);
    for id in ids {
        writer
            .append_compressed(id, pdb_text(id).as_bytes())
            .unwrap();
    }
    writer.finish().unwrap().flush().unwrap();
}
