use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::app::{FeedfsError, Result};
use crate::domain::{FeedSource, ParsedFeed};
use crate::fetcher::Loaders;

pub const DEFAULT_WORKERS: usize = 10;

/// Loads many sources concurrently, returning results in input order.
pub struct ParallelLoader {
    loaders: Loaders,
    semaphore: Arc<Semaphore>,
}

impl ParallelLoader {
    pub fn new(loaders: Loaders) -> Self {
        Self::with_workers(loaders, DEFAULT_WORKERS)
    }

    pub fn with_workers(loaders: Loaders, workers: usize) -> Self {
        Self {
            loaders,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Loads every source; dropping the returned future aborts the loads
    /// still in flight and releases their permits.
    pub async fn load_all(
        &self,
        sources: Vec<Arc<FeedSource>>,
    ) -> Vec<(Arc<FeedSource>, Result<ParsedFeed>)> {
        let mut tasks = LoadTasks(Vec::with_capacity(sources.len()));

        for source in sources {
            let loader = self.loaders.for_source(&source);
            let semaphore = self.semaphore.clone();
            let task_source = source.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| FeedfsError::Other(format!("Loader pool closed: {}", e)))?;
                loader.load(&task_source).await
            });

            tasks.0.push((source, handle));
        }

        let mut results = Vec::with_capacity(tasks.0.len());
        for (source, handle) in tasks.0.iter_mut() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                    Err(FeedfsError::Other(format!("Loading task failed: {}", e)))
                }
            };
            results.push((source.clone(), result));
        }

        results
    }
}

/// Spawned loads of one `load_all` call, aborted when dropped.
struct LoadTasks(Vec<(Arc<FeedSource>, JoinHandle<Result<ParsedFeed>>)>);

impl Drop for LoadTasks {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}
