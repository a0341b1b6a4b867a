use crate::cli::ListArgs;
use crate::error::Result;
use lemon::core::io::pdb::PdbFile;
use lemon::engine::error::EngineError;
use lemon::engine::source::ArchiveSource;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListSummary {
    pub keys: usize,
    pub errors: usize,
}

/// Writes every archive key in `work_dir` to `out`, one per line unless `count_only`.
pub fn list_keys(work_dir: &Path, count_only: bool, out: &mut impl Write) -> Result<ListSummary> {
    if !work_dir.is_dir() {
        return Err(EngineError::InvalidConfiguration(format!(
            "working directory '{}' is not a directory",
            work_dir.display()
        ))
        .into());
    }

    let archive = ArchiveSource::<PdbFile>::discover(work_dir)?;
    info!(
        "Listing keys of {} containers in {}",
        archive.containers().len(),
        work_dir.display()
    );

    let mut summary = ListSummary::default();
    for key in archive.enumerate() {
        match key {
            Ok(key) => {
                summary.keys += 1;
                if !count_only {
                    writeln!(out, "{key}")?;
                }
            }
            Err(e) => {
                summary.errors += 1;
                warn!("{}", e);
            }
        }
    }
    if count_only {
        writeln!(out, "{}", summary.keys)?;
    }
    out.flush()?;
    Ok(summary)
}

pub fn run(args: ListArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = list_keys(&args.work_dir, args.count, &mut out)?;
    if summary.errors > 0 {
        eprintln!(
            "Warning: {} container(s) could not be read completely.",
            summary.errors
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use lemon::core::io::compression;
    use lemon::core::io::sequence::SequenceWriter;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn write_archive(path: &Path, keys: &[&str]) {
        let mut writer = SequenceWriter::new(File::create(path).unwrap()).unwrap();
        for key in keys {
            let payload = compression::gzip(b"END\n").unwrap();
            writer.append(key, &payload).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn lists_keys_across_containers() {
        let dir = TempDir::new().unwrap();
        write_archive(&dir.path().join("part-00000"), &["1ABC", "1XYZ"]);
        write_archive(&dir.path().join("part-00001"), &["2DEF"]);
        fs::write(dir.path().join("_SUCCESS"), "").unwrap();

        let mut out = Vec::new();
        let summary = list_keys(dir.path(), false, &mut out).unwrap();
        assert_eq!(summary, ListSummary { keys: 3, errors: 0 });
        assert_eq!(String::from_utf8(out).unwrap(), "1ABC\n1XYZ\n2DEF\n");
    }

    #[test]
    fn count_only_prints_the_total_and_reports_bad_containers() {
        let dir = TempDir::new().unwrap();
        write_archive(&dir.path().join("part-00000"), &["1ABC"]);
        fs::write(dir.path().join("part-00001"), b"not a container").unwrap();

        let mut out = Vec::new();
        let summary = list_keys(dir.path(), true, &mut out).unwrap();
        assert_eq!(summary, ListSummary { keys: 1, errors: 1 });
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
    }

    #[test]
    fn missing_directory_maps_to_exit_code_two() {
        let dir = TempDir::new().unwrap();
        let err = list_keys(&dir.path().join("nope"), false, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Lemon(EngineError::InvalidConfiguration(_))
        ));
        assert_eq!(err.exit_code(), 2);
    }
}
