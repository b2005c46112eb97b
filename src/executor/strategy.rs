//! How the measured calls of one run are scheduled

use crate::{
    error::{AppError, Result},
    models::metrics::TimingSample,
};
use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio::task::JoinError;

/// Scheduling policy for the calls of a run
///
/// `Sequential` awaits each call before issuing the next, so latencies are
/// free of self-contention. `Concurrent` keeps up to `limit` calls in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IterationStrategy {
    #[default]
    Sequential,
    Concurrent { limit: usize },
}

impl IterationStrategy {
    /// `1` (or `0`) means sequential
    pub fn from_concurrency(concurrency: usize) -> Self {
        if concurrency <= 1 {
            Self::Sequential
        } else {
            Self::Concurrent { limit: concurrency }
        }
    }

    pub fn concurrency(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Concurrent { limit } => (*limit).max(1),
        }
    }

    /// Run `count` measured calls, reporting the completed count after each
    ///
    /// Each call runs as its own task; a call that panics aborts the run.
    pub async fn run<F, Fut, P>(&self, count: usize, mut make: F, mut progress: P) -> Result<Vec<TimingSample>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = TimingSample> + Send + 'static,
        P: FnMut(usize),
    {
        let mut samples = Vec::with_capacity(count);

        match *self {
            Self::Sequential => {
                for index in 0..count {
                    let sample = tokio::spawn(make(index)).await.map_err(aborted)?;
                    samples.push(sample);
                    progress(samples.len());
                }
            }
            Self::Concurrent { .. } => {
                let mut in_flight = stream::iter(0..count)
                    .map(|index| tokio::spawn(make(index)))
                    .buffer_unordered(self.concurrency());

                while let Some(joined) = in_flight.next().await {
                    samples.push(joined.map_err(aborted)?);
                    progress(samples.len());
                }
            }
        }

        Ok(samples)
    }
}

fn aborted(error: JoinError) -> AppError {
    if error.is_panic() {
        AppError::test_execution("a measured call panicked; run aborted")
    } else {
        AppError::test_execution(format!("a measured call was cancelled: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn sleeper(in_flight: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> impl Future<Output = TimingSample> + Send + 'static {
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            TimingSample::success(Duration::from_millis(10))
        }
    }

    async fn peak_for(strategy: IterationStrategy, count: usize) -> (usize, Vec<usize>) {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut ticks = Vec::new();

        let samples = strategy
            .run(
                count,
                |_| sleeper(Arc::clone(&in_flight), Arc::clone(&peak)),
                |done| ticks.push(done),
            )
            .await
            .unwrap();

        assert_eq!(samples.len(), count);
        (peak.load(Ordering::SeqCst), ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_never_overlaps() {
        let (peak, ticks) = peak_for(IterationStrategy::Sequential, 6).await;
        assert_eq!(peak, 1);
        assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_respects_limit() {
        let (peak, ticks) = peak_for(IterationStrategy::Concurrent { limit: 3 }, 10).await;
        assert_eq!(peak, 3);
        assert_eq!(ticks.last(), Some(&10));
    }

    #[tokio::test]
    async fn test_panicking_call_aborts_run() {
        let result = IterationStrategy::Sequential
            .run(
                3,
                |index| async move {
                    if index == 1 {
                        panic!("adapter bug");
                    }
                    TimingSample::success(Duration::from_millis(1))
                },
                |_| {},
            )
            .await;

        assert!(matches!(result, Err(AppError::TestExecution(_))));
    }

    #[test]
    fn test_from_concurrency() {
        assert_eq!(IterationStrategy::from_concurrency(1), IterationStrategy::Sequential);
        assert_eq!(IterationStrategy::from_concurrency(4), IterationStrategy::Concurrent { limit: 4 });
        assert_eq!(IterationStrategy::Concurrent { limit: 0 }.concurrency(), 1);
    }
}
