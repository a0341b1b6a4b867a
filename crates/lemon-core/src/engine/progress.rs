#[derive(Debug, Clone)]
pub enum Progress {
    /// A run started; `total` is known only when driven by an entry list.
    RunStart { total: Option<u64> },
    /// Results were observed by the aggregator.
    RecordsDone { completed: u64, failed: u64 },
    /// A pool worker finished scanning a container.
    ContainerDone { records: u64 },
    RunFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
