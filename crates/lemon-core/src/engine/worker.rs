use crate::core::models::structure::Structure;
use std::error::Error;

pub type WorkerError = Box<dyn Error + Send + Sync>;

/// Caller-supplied analysis applied to every record of a run.
///
/// `process` is called from pool threads, possibly concurrently, so implementors
/// must be `Sync`; any shared accumulator needs its own synchronization.
/// `finalize` runs exactly once on the calling thread after every record has a result.
pub trait Worker: Sync {
    type Output: Send;

    fn process(&self, structure: Structure, id: &str) -> Result<Self::Output, WorkerError>;

    fn finalize(&mut self) {}
}

/// A [`Worker`] built from closures.
pub struct FnWorker<P, F> {
    process: P,
    finalize: F,
}

pub fn from_fn<P, T>(process: P) -> FnWorker<P, fn()>
where
    P: Fn(Structure, &str) -> Result<T, WorkerError> + Sync,
    T: Send,
{
    FnWorker {
        process,
        finalize: || {},
    }
}

impl<P, F> FnWorker<P, F> {
    pub fn with_finalize<G>(self, finalize: G) -> FnWorker<P, G>
    where
        G: FnMut() + Sync,
    {
        FnWorker {
            process: self.process,
            finalize,
        }
    }
}

impl<P, F, T> Worker for FnWorker<P, F>
where
    P: Fn(Structure, &str) -> Result<T, WorkerError> + Sync,
    F: FnMut() + Sync,
    T: Send,
{
    type Output = T;

    fn process(&self, structure: Structure, id: &str) -> Result<T, WorkerError> {
        (self.process)(structure, id)
    }

    fn finalize(&mut self) {
        (self.finalize)()
    }
}
