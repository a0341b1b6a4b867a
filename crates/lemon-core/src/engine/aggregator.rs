use super::config::OutputOrder;
use super::progress::{Progress, ProgressReporter};
use super::state::{Position, RunSummary, WorkResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::io::{self, Write};
use tracing::{debug, error};

/// Destination of the aggregated result stream.
///
/// Only the aggregator calls `emit`, one result at a time, so a record's output is
/// never interleaved with another's.
pub trait ResultSink<T> {
    fn emit(&mut self, result: WorkResult<T>) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each completed outcome's `Display` on its own line to `out`, and each failure
/// as `id<TAB>cause` to `err`.
pub struct TextSink<O: Write, E: Write> {
    out: O,
    err: E,
}

impl<O: Write, E: Write> TextSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<T: Display, O: Write, E: Write> ResultSink<T> for TextSink<O, E> {
    fn emit(&mut self, result: WorkResult<T>) -> io::Result<()> {
        match result.outcome {
            Ok(value) => writeln!(self.out, "{value}"),
            Err(e) => {
                debug!(id = %result.id, kind = e.kind(), "Record failed: {}", e);
                writeln!(self.err, "{}\t{}", result.id, e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }
}

/// Keeps every result in emission order.
#[derive(Debug)]
pub struct Collector<T> {
    results: Vec<WorkResult<T>>,
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<T> Collector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[WorkResult<T>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<WorkResult<T>> {
        self.results
    }
}

impl<T> ResultSink<T> for Collector<T> {
    fn emit(&mut self, result: WorkResult<T>) -> io::Result<()> {
        self.results.push(result);
        Ok(())
    }
}

/// Messages sent from pool workers to the aggregator.
pub(crate) enum Batch<T> {
    Results(Vec<WorkResult<T>>),
    /// A container scan finished after producing `records` results.
    GroupDone { group: usize, records: usize },
}

/// Serializes results into one sink and keeps the run tally.
pub(crate) struct Aggregator<'s, 'r, T, S: ResultSink<T>> {
    sink: &'s mut S,
    reporter: &'r ProgressReporter<'r>,
    order: OutputOrder,
    summary: RunSummary,
    pending: BTreeMap<Position, WorkResult<T>>,
    group_sizes: HashMap<usize, usize>,
    next: Position,
    sink_error: Option<io::Error>,
}

impl<'s, 'r, T, S: ResultSink<T>> Aggregator<'s, 'r, T, S> {
    pub(crate) fn new(sink: &'s mut S, order: OutputOrder, reporter: &'r ProgressReporter<'r>) -> Self {
        Self {
            sink,
            reporter,
            order,
            summary: RunSummary::default(),
            pending: BTreeMap::new(),
            group_sizes: HashMap::new(),
            next: Position::new(0, 0),
            sink_error: None,
        }
    }

    pub(crate) fn observe(&mut self, batch: Batch<T>) {
        match batch {
            Batch::Results(results) => {
                for result in results {
                    self.summary.record(&result);
                    match self.order {
                        OutputOrder::Completion => self.emit(result),
                        OutputOrder::Submission => {
                            self.pending.insert(result.position, result);
                        }
                    }
                }
                self.reporter.report(Progress::RecordsDone {
                    completed: self.summary.completed as u64,
                    failed: self.summary.failed as u64,
                });
            }
            Batch::GroupDone { group, records } => {
                self.group_sizes.insert(group, records);
                self.reporter.report(Progress::ContainerDone {
                    records: records as u64,
                });
            }
        }
        if self.order == OutputOrder::Submission {
            self.drain_ready();
        }
    }

    fn drain_ready(&mut self) {
        loop {
            if let Some(result) = self.pending.remove(&self.next) {
                self.emit(result);
                self.next.index += 1;
            } else if self.group_sizes.get(&self.next.group) == Some(&self.next.index) {
                self.next = Position::new(self.next.group + 1, 0);
            } else {
                break;
            }
        }
    }

    fn emit(&mut self, result: WorkResult<T>) {
        if self.sink_error.is_some() {
            return;
        }
        if let Err(e) = self.sink.emit(result) {
            error!("Result sink failed, suppressing further output: {}", e);
            self.sink_error = Some(e);
        }
    }

    /// Emits anything still buffered and returns the tally plus the first sink error.
    pub(crate) fn finish(mut self) -> (RunSummary, Option<io::Error>) {
        let leftovers = std::mem::take(&mut self.pending);
        for (_, result) in leftovers {
            self.emit(result);
        }
        if self.sink_error.is_none() {
            if let Err(e) = self.sink.flush() {
                self.sink_error = Some(e);
            }
        }
        (self.summary, self.sink_error)
    }
}
