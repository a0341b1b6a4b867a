use crate::core::io::entries::EntryList;
use crate::core::io::traits::StructureFormat;
use crate::engine::aggregator::ResultSink;
use crate::engine::config::RunConfig;
use crate::engine::dispatcher::Dispatcher;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::source::{ArchiveSource, DirectorySource, RecordSource};
use crate::engine::state::RunSummary;
use crate::engine::worker::Worker;
use tracing::{info, instrument};

/// Checks the options and selects the record source without processing anything.
///
/// With an entries file the run reads a directory mirror driven by the loaded list.
/// Without one, every container in the working directory is scanned.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfiguration`] if the working directory is not a
/// directory or a count is zero, and [`EngineError::InvalidInput`] if the entries file
/// is missing or not a regular file.
pub fn prepare<F: StructureFormat>(
    config: &RunConfig,
) -> Result<(RecordSource<F>, Option<EntryList>), EngineError> {
    if !config.work_dir.is_dir() {
        return Err(EngineError::InvalidConfiguration(format!(
            "working directory '{}' is not a directory",
            config.work_dir.display()
        )));
    }
    if config.worker_count == 0 {
        return Err(EngineError::InvalidConfiguration(
            "worker count must be at least 1".to_string(),
        ));
    }
    if config.flush_threshold == 0 {
        return Err(EngineError::InvalidConfiguration(
            "flush threshold must be at least 1".to_string(),
        ));
    }

    match &config.entries_path {
        Some(path) => {
            let entries = EntryList::load(path)?;
            info!(
                "Loaded {} entries; reading records from {}",
                entries.len(),
                config.work_dir.display()
            );
            let source = RecordSource::Directory(DirectorySource::new(&config.work_dir));
            Ok((source, Some(entries)))
        }
        None => {
            let archive = ArchiveSource::discover(&config.work_dir).map_err(|e| {
                EngineError::InvalidConfiguration(format!(
                    "cannot list working directory '{}': {e}",
                    config.work_dir.display()
                ))
            })?;
            info!(
                "Scanning {} containers in {}",
                archive.containers().len(),
                config.work_dir.display()
            );
            Ok((RecordSource::Archive(archive), None))
        }
    }
}

/// Runs `worker` over every record selected by `config`, writing results to `sink`.
///
/// # Errors
///
/// Fails before any record is processed if [`prepare`] rejects the options; fails
/// with [`EngineError::Output`] if the sink could not be written.
#[instrument(skip_all, name = "mining_workflow")]
pub fn run<F, W, S>(
    config: &RunConfig,
    worker: &mut W,
    sink: &mut S,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError>
where
    F: StructureFormat,
    W: Worker,
    S: ResultSink<W::Output>,
{
    let (source, entries) = prepare::<F>(config)?;
    reporter.report(Progress::Message(match &source {
        RecordSource::Directory(_) => "Processing directory entries".to_string(),
        RecordSource::Archive(_) => "Scanning archive containers".to_string(),
    }));
    Dispatcher::new(config, reporter).run(&source, entries.as_ref(), worker, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::models::residue::ResidueKind;
    use crate::core::models::structure::Structure;
    use crate::engine::aggregator::Collector;
    use crate::engine::config::RunConfigBuilder;
    use crate::engine::error::RecordError;
    use crate::engine::fixtures;
    use crate::engine::worker::{WorkerError, from_fn};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn metal_count(s: Structure, id: &str) -> Result<String, WorkerError> {
        let metals = s.residues_of_kind(ResidueKind::MetalIon);
        Ok(format!("{id}\t{}", metals.len()))
    }

    fn config(dir: PathBuf, entries: Option<PathBuf>) -> RunConfig {
        RunConfigBuilder::new()
            .work_dir(dir)
            .entries_path(entries)
            .worker_count(2)
            .build()
            .unwrap()
    }

    #[test]
    fn directory_run_reports_found_and_missing_entries() {
        let dir = TempDir::new().unwrap();
        fixtures::write_divided(dir.path(), &["1ABC"]);
        let entries = dir.path().join("entries.txt");
        fs::write(&entries, "1ABC\n1XYZ\n").unwrap();

        let mut sink = Collector::new();
        let mut worker = from_fn(metal_count);
        let summary = run::<PdbFile, _, _>(
            &config(dir.path().to_path_buf(), Some(entries)),
            &mut worker,
            &mut sink,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "1XYZ");
        assert!(matches!(
            summary.failures[0].1,
            RecordError::NotFound { .. }
        ));
        let done = sink
            .results()
            .iter()
            .find(|r| r.id == "1ABC")
            .unwrap();
        assert_eq!(done.outcome, Ok("1ABC\t1".to_string()));
    }

    #[test]
    fn archive_run_without_entries_scans_all_containers() {
        let dir = TempDir::new().unwrap();
        fixtures::write_archive(&dir.path().join("part-00000"), &["1ABC", "2DEF"]);
        fixtures::write_archive(&dir.path().join("part-00001"), &["3GHI"]);
        fs::write(dir.path().join("_SUCCESS"), "").unwrap();

        let mut sink = Collector::new();
        let mut worker = from_fn(metal_count);
        let summary = run::<PdbFile, _, _>(
            &config(dir.path().to_path_buf(), None),
            &mut worker,
            &mut sink,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(summary.completed, 3);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn missing_entries_file_fails_before_any_work() {
        let dir = TempDir::new().unwrap();
        fixtures::write_divided(dir.path(), &["1ABC"]);
        let calls = AtomicUsize::new(0);
        let finalized = AtomicUsize::new(0);

        let mut sink = Collector::new();
        let mut worker = from_fn(|s: Structure, id: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            metal_count(s, id)
        })
        .with_finalize(|| {
            finalized.fetch_add(1, Ordering::SeqCst);
        });
        let result = run::<PdbFile, _, _>(
            &config(
                dir.path().to_path_buf(),
                Some(dir.path().join("missing.txt")),
            ),
            &mut worker,
            &mut sink,
            &ProgressReporter::new(),
        );

        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(finalized.load(Ordering::SeqCst), 0);
        assert!(sink.results().is_empty());
    }

    #[test]
    fn entries_path_pointing_at_a_directory_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let result = prepare::<PdbFile>(&config(
            dir.path().to_path_buf(),
            Some(dir.path().to_path_buf()),
        ));
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn invalid_working_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        let result = prepare::<PdbFile>(&config(file, None));
        assert!(matches!(
            result,
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_workers_is_rejected_even_without_the_builder() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path().to_path_buf(), None);
        config.worker_count = 0;
        assert!(matches!(
            prepare::<PdbFile>(&config),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }
}
