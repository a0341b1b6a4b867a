use super::aggregator::{Aggregator, Batch, ResultSink};
use super::config::{OutputOrder, RunConfig};
use super::error::{EngineError, RecordError};
use super::progress::{Progress, ProgressReporter};
use super::source::{ArchiveSource, DirectorySource, RecordSource};
use super::state::{Position, RunSummary, WorkItem, WorkResult};
use super::worker::Worker;
use crate::core::io::entries::EntryList;
use crate::core::io::traits::StructureFormat;
use crate::core::models::structure::Structure;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info, instrument, trace, warn};

/// Runs a [`Worker`] over every record of a [`RecordSource`] on a fixed pool.
///
/// The pool has exactly `worker_count` threads pulling from one FIFO queue. Results flow
/// over a channel to the calling thread, which is the only one touching the sink.
/// There is no cancellation and no per-record timeout: a worker that never returns
/// stalls its pool thread for the rest of the run.
pub struct Dispatcher<'r> {
    worker_count: usize,
    flush_threshold: usize,
    output_order: OutputOrder,
    reporter: &'r ProgressReporter<'r>,
}

impl<'r> Dispatcher<'r> {
    pub fn new(config: &RunConfig, reporter: &'r ProgressReporter<'r>) -> Self {
        Self {
            worker_count: config.worker_count.max(1),
            flush_threshold: config.flush_threshold.max(1),
            output_order: config.output_order,
            reporter,
        }
    }

    /// Processes every record and calls `finalize` once all results were observed.
    ///
    /// Directory sources need an entry list. For archive sources the optional list
    /// restricts the run to the listed keys, and listed keys no container holds are
    /// reported as [`RecordError::NotFound`] after the scans.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfiguration`] if a directory source has no entry
    /// list, [`EngineError::Internal`] if the pool cannot be built, and
    /// [`EngineError::Output`] if the sink failed. Per-record failures are not errors.
    #[instrument(skip_all, name = "dispatch", fields(workers = self.worker_count))]
    pub fn run<F, W, S>(
        &self,
        source: &RecordSource<F>,
        entries: Option<&EntryList>,
        worker: &mut W,
        sink: &mut S,
    ) -> Result<RunSummary, EngineError>
    where
        F: StructureFormat,
        W: Worker,
        S: ResultSink<W::Output>,
    {
        let (items, total) = match source {
            RecordSource::Directory(_) => {
                let entries = entries.ok_or_else(|| {
                    EngineError::InvalidConfiguration(
                        "a directory source requires an entry list".to_string(),
                    )
                })?;
                let items: Vec<_> = entries
                    .iter()
                    .enumerate()
                    .map(|(index, id)| WorkItem::Entry {
                        index,
                        id: id.to_string(),
                    })
                    .collect();
                let total = items.len() as u64;
                (items, Some(total))
            }
            RecordSource::Archive(archive) => {
                let items: Vec<_> = archive
                    .containers()
                    .iter()
                    .enumerate()
                    .map(|(index, path)| WorkItem::Container {
                        index,
                        path: path.clone(),
                    })
                    .collect();
                (items, None)
            }
        };

        self.reporter.report(Progress::RunStart { total });
        info!(
            "Dispatching {} work items to {} pool workers",
            items.len(),
            self.worker_count
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|i| format!("lemon-worker-{i}"))
            .build()
            .map_err(|e| EngineError::Internal(format!("failed to build thread pool: {e}")))?;

        let (queue_tx, queue_rx) = crossbeam_channel::unbounded::<WorkItem>();
        for item in items {
            queue_tx
                .send(item)
                .map_err(|_| EngineError::Internal("work queue closed early".to_string()))?;
        }
        drop(queue_tx);

        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<Batch<W::Output>>(self.worker_count * 4);
        let mut aggregator = Aggregator::new(sink, self.output_order, self.reporter);
        let filter = match source {
            RecordSource::Archive(_) => entries,
            RecordSource::Directory(_) => None,
        };
        let mut matched = HashSet::new();

        {
            let shared: &W = worker;
            let flush_threshold = self.flush_threshold;

            pool.in_place_scope(|scope| {
                for _ in 0..self.worker_count {
                    let queue = queue_rx.clone();
                    let results = result_tx.clone();
                    scope.spawn(move |_| {
                        pool_worker(source, shared, filter, flush_threshold, &queue, &results)
                    });
                }
                drop(result_tx);

                for batch in &result_rx {
                    if let (Some(_), Batch::Results(results)) = (filter, &batch) {
                        matched.extend(results.iter().map(|r| r.id.clone()));
                    }
                    aggregator.observe(batch);
                }
            });
        }

        if let (Some(entries), RecordSource::Archive(archive)) = (filter, source) {
            let missing = unmatched_entries(entries, &matched, archive.containers().len());
            if !missing.is_empty() {
                warn!("{} listed keys were not found in any container", missing.len());
                aggregator.observe(Batch::Results(missing));
            }
        }

        let (summary, sink_error) = aggregator.finish();
        debug!("All results observed, finalizing worker");
        worker.finalize();
        self.reporter.report(Progress::RunFinish);
        info!(
            completed = summary.completed,
            failed = summary.failed,
            "Run finished"
        );

        match sink_error {
            Some(e) => Err(EngineError::Output(e)),
            None => Ok(summary),
        }
    }
}

fn pool_worker<F, W>(
    source: &RecordSource<F>,
    worker: &W,
    filter: Option<&EntryList>,
    flush_threshold: usize,
    queue: &Receiver<WorkItem>,
    results: &Sender<Batch<W::Output>>,
) where
    F: StructureFormat,
    W: Worker,
{
    for item in queue {
        let delivered = match (item, source) {
            (WorkItem::Entry { index, id }, RecordSource::Directory(directory)) => {
                let result = process_entry(directory, worker, index, id);
                results.send(Batch::Results(vec![result])).is_ok()
            }
            (WorkItem::Container { index, path }, RecordSource::Archive(archive)) => {
                scan_container(archive, worker, filter, flush_threshold, index, &path, results)
            }
            (item, _) => {
                warn!("Work item {:?} does not match the active source", item);
                true
            }
        };
        if !delivered {
            break;
        }
    }
}

fn process_entry<F, W>(
    source: &DirectorySource<F>,
    worker: &W,
    index: usize,
    id: String,
) -> WorkResult<W::Output>
where
    F: StructureFormat,
    W: Worker,
{
    trace!(%id, "Claimed entry");
    let outcome = guarded(worker, &id, || source.resolve(&id));
    WorkResult {
        id,
        position: Position::new(0, index),
        outcome,
    }
}

/// Scans one container to its end, sending results in batches of `flush_threshold`.
///
/// Returns `false` once the aggregator is gone.
fn scan_container<F, W>(
    source: &ArchiveSource<F>,
    worker: &W,
    filter: Option<&EntryList>,
    flush_threshold: usize,
    group: usize,
    path: &Path,
    results: &Sender<Batch<W::Output>>,
) -> bool
where
    F: StructureFormat,
    W: Worker,
{
    debug!("Scanning container {}", path.display());
    let mut batch = Vec::with_capacity(flush_threshold);
    let mut produced = 0usize;

    match source.open(path) {
        Err(e) => {
            warn!("Cannot open container {}: {}", path.display(), e);
            batch.push(WorkResult {
                id: path.display().to_string(),
                position: Position::new(group, 0),
                outcome: Err(e),
            });
            produced = 1;
        }
        Ok(mut scan) => loop {
            let record = match scan.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopping scan of {}: {}", path.display(), e);
                    batch.push(WorkResult {
                        id: path.display().to_string(),
                        position: Position::new(group, produced),
                        outcome: Err(e),
                    });
                    produced += 1;
                    break;
                }
            };
            if filter.is_some_and(|entries| !entries.contains(&record.key)) {
                continue;
            }

            let outcome = guarded(worker, &record.key, || source.decode(&record));
            batch.push(WorkResult {
                id: record.key,
                position: Position::new(group, produced),
                outcome,
            });
            produced += 1;

            if batch.len() >= flush_threshold {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(flush_threshold));
                if results.send(Batch::Results(full)).is_err() {
                    return false;
                }
            }
        },
    }

    if !batch.is_empty() && results.send(Batch::Results(batch)).is_err() {
        return false;
    }
    results
        .send(Batch::GroupDone {
            group,
            records: produced,
        })
        .is_ok()
}

/// Builds a `NotFound` result for every listed key that no container scan produced.
///
/// The results form one extra group placed after the last container.
fn unmatched_entries<T>(
    entries: &EntryList,
    matched: &HashSet<String>,
    group: usize,
) -> Vec<WorkResult<T>> {
    entries
        .iter()
        .filter(|id| !matched.contains(*id))
        .enumerate()
        .map(|(index, id)| WorkResult {
            id: id.to_string(),
            position: Position::new(group, index),
            outcome: Err(RecordError::NotFound {
                path: id.into(),
            }),
        })
        .collect()
}

/// Resolves and processes one record, turning errors and panics into a failed outcome.
fn guarded<W, R>(worker: &W, id: &str, resolve: R) -> Result<W::Output, RecordError>
where
    W: Worker,
    R: FnOnce() -> Result<Structure, RecordError>,
{
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let structure = resolve()?;
        worker
            .process(structure, id)
            .map_err(|e| RecordError::Worker(e.to_string()))
    }));
    attempt.unwrap_or_else(|payload| {
        Err(RecordError::Worker(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
