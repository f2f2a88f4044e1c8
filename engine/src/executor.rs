//! The pluggable task executor. Tile tasks are shared-nothing, so the policy
//! only decides how many run at once; a distributed worker pool behind a
//! queue can implement the same trait.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};

/// Runs a batch of independent tasks to completion. Tasks report their
/// results through channels they capture; the executor only schedules.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn run_all(&self, tasks: Vec<BoxFuture<'static, ()>>);
}

/// Runs tasks one after another, in order
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleThreadedExecutor;

#[async_trait]
impl TaskExecutor for SingleThreadedExecutor {
    async fn run_all(&self, tasks: Vec<BoxFuture<'static, ()>>) {
        for task in tasks {
            task.await;
        }
    }
}

/// Runs up to `parallelism` tasks concurrently on the tokio runtime
#[derive(Debug, Clone, Copy)]
pub struct ThreadPoolExecutor {
    parallelism: usize,
}

impl ThreadPoolExecutor {
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }
}

#[async_trait]
impl TaskExecutor for ThreadPoolExecutor {
    async fn run_all(&self, tasks: Vec<BoxFuture<'static, ()>>) {
        let mut running = FuturesUnordered::new();
        let mut queue = tasks.into_iter();

        for task in queue.by_ref().take(self.parallelism) {
            running.push(tokio::spawn(task));
        }

        while let Some(finished) = running.next().await {
            // a panicking task must not stall the remaining ones
            if let Err(join_error) = finished {
                tracing::error!(%join_error, "tile task panicked");
            }
            if let Some(task) = queue.next() {
                running.push(tokio::spawn(task));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_tasks(n: usize, counter: &Arc<AtomicUsize>) -> Vec<BoxFuture<'static, ()>> {
        (0..n)
            .map(|_| {
                let counter = Arc::clone(counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            })
            .collect()
    }

    #[tokio::test]
    async fn single_threaded_runs_everything() {
        let counter = Arc::new(AtomicUsize::new(0));
        SingleThreadedExecutor
            .run_all(counting_tasks(17, &counter))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 17);
    }

    #[tokio::test]
    async fn thread_pool_runs_everything() {
        let counter = Arc::new(AtomicUsize::new(0));
        ThreadPoolExecutor::new(4)
            .run_all(counting_tasks(33, &counter))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 33);
    }

    #[tokio::test]
    async fn zero_parallelism_is_clamped() {
        let counter = Arc::new(AtomicUsize::new(0));
        ThreadPoolExecutor::new(0)
            .run_all(counting_tasks(3, &counter))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
