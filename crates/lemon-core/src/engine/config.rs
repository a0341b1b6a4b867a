use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Parameter '{name}' must be at least 1 (got {value})")]
    NotPositive { name: &'static str, value: usize },
}

/// Order in which results reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputOrder {
    /// Results are emitted as soon as they complete; order varies between runs.
    #[default]
    Completion,
    /// Results are buffered and emitted in the order records were submitted.
    Submission,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub work_dir: PathBuf,
    pub entries_path: Option<PathBuf>,
    pub worker_count: usize,
    pub flush_threshold: usize,
    pub output_order: OutputOrder,
}

#[derive(Default)]
pub struct RunConfigBuilder {
    work_dir: Option<PathBuf>,
    entries_path: Option<PathBuf>,
    worker_count: Option<usize>,
    flush_threshold: Option<usize>,
    output_order: Option<OutputOrder>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn work_dir(mut self, path: PathBuf) -> Self {
        self.work_dir = Some(path);
        self
    }
    pub fn entries_path(mut self, path: Option<PathBuf>) -> Self {
        self.entries_path = path;
        self
    }
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }
    pub fn flush_threshold(mut self, records: usize) -> Self {
        self.flush_threshold = Some(records);
        self
    }
    pub fn output_order(mut self, order: OutputOrder) -> Self {
        self.output_order = Some(order);
        self
    }

    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let work_dir = self
            .work_dir
            .ok_or(ConfigError::MissingParameter("work_dir"))?;
        let worker_count = self.worker_count.unwrap_or(1);
        if worker_count == 0 {
            return Err(ConfigError::NotPositive {
                name: "worker_count",
                value: worker_count,
            });
        }
        let flush_threshold = self.flush_threshold.unwrap_or(1);
        if flush_threshold == 0 {
            return Err(ConfigError::NotPositive {
                name: "flush_threshold",
                value: flush_threshold,
            });
        }
        Ok(RunConfig {
            work_dir,
            entries_path: self.entries_path,
            worker_count,
            flush_threshold,
            output_order: self.output_order.unwrap_or_default(),
        })
    }
}
