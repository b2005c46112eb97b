//! Measures any asynchronous call on the monotonic clock

use crate::models::metrics::TimingSample;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub struct TimingCollector;

impl TimingCollector {
    /// Await `call` and report how long it took along with its outcome
    pub async fn timed<F, T, E>(call: F) -> (Duration, Result<T, E>)
    where
        F: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let outcome = call.await;
        (started.elapsed(), outcome)
    }

    /// Await `call` and turn whatever it returns into a sample
    pub async fn measure<F, T, E>(call: F) -> TimingSample
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        match Self::timed(call).await {
            (duration, Ok(_)) => TimingSample::success(duration),
            (duration, Err(error)) => TimingSample::failure(duration, error.to_string()),
        }
    }
}
