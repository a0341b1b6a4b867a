use super::error::RecordError;
use std::path::PathBuf;

/// Submission position of a record.
///
/// Directory runs use a single group and the entry index. Archive runs use the
/// container index as the group and the record index inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub group: usize,
    pub index: usize,
}

impl Position {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

/// A unit of work placed on the shared queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Entry { index: usize, id: String },
    Container { index: usize, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkResult<T> {
    pub id: String,
    pub position: Position,
    pub outcome: Result<T, RecordError>,
}

impl<T> WorkResult<T> {
    pub fn is_completed(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub failures: Vec<(String, RecordError)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }

    pub(crate) fn record<T>(&mut self, result: &WorkResult<T>) {
        match &result.outcome {
            Ok(_) => self.completed += 1,
            Err(e) => {
                self.failed += 1;
                self.failures.push((result.id.clone(), e.clone()));
            }
        }
    }
}
