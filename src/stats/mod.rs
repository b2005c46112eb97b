//! Statistics over batches of timing samples

pub mod aggregate;

pub use aggregate::{overall_totals, rank_protocols, summarize_protocols};

use crate::{
    error::{AppError, Result},
    models::metrics::{RunStatistics, TimingSample},
    types::Protocol,
};
use std::time::Duration;

/// Reduces one batch of samples into `RunStatistics`
///
/// Every recorded duration feeds the latency figures, failures included:
/// a failed call still occupied the wall clock. Percentiles use
/// nearest-rank indexing on the sorted durations: the median sits at
/// `floor(n/2)`, p95 and p99 at `ceil(0.95n)` and `ceil(0.99n)`, both
/// clamped to the last index.
pub struct StatisticsEngine;

impl StatisticsEngine {
    pub fn summarize(
        protocol: Protocol,
        operation: &str,
        samples: &[TimingSample],
        elapsed: Duration,
    ) -> Result<RunStatistics> {
        if samples.is_empty() {
            return Err(AppError::invalid_batch(format!(
                "no samples recorded for {} {}",
                protocol, operation
            )));
        }

        let total = samples.len();
        let failed = samples.iter().filter(|s| !s.is_success()).count();
        let first_error = samples.iter().find_map(|s| s.error()).map(str::to_string);

        let mut durations: Vec<f64> = samples.iter().map(TimingSample::duration_ms).collect();
        durations.sort_by(f64::total_cmp);

        let elapsed_secs = elapsed.as_secs_f64();
        let requests_per_second = if elapsed_secs > 0.0 {
            total as f64 / elapsed_secs
        } else {
            0.0
        };

        Ok(RunStatistics {
            protocol,
            operation: operation.to_string(),
            total_requests: total,
            successful_requests: total - failed,
            failed_requests: failed,
            mean_ms: durations.iter().sum::<f64>() / total as f64,
            min_ms: durations[0],
            max_ms: durations[total - 1],
            median_ms: durations[total / 2],
            p95_ms: durations[Self::percentile_index(total, 95)],
            p99_ms: durations[Self::percentile_index(total, 99)],
            requests_per_second,
            error_rate: failed as f64 * 100.0 / total as f64,
            first_error,
        })
    }

    /// Index of the `percent`-th percentile in a sorted batch of `len` values
    pub fn percentile_index(len: usize, percent: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (len * percent).div_ceil(100).min(len - 1)
    }
}

#[cfg(test)]
mod comprehensive_tests;

#[cfg(test)]
mod tests {
    use super::*;

    fn successes(millis: impl IntoIterator<Item = u64>) -> Vec<TimingSample> {
        millis
            .into_iter()
            .map(|ms| TimingSample::success(Duration::from_millis(ms)))
            .collect()
    }

    #[test]
    fn test_constant_duration() {
        let samples = successes(std::iter::repeat(7).take(12));
        let stats = StatisticsEngine::summarize(Protocol::Rest, "list_users", &samples, Duration::from_secs(2)).unwrap();

        for value in [stats.mean_ms, stats.min_ms, stats.max_ms, stats.median_ms, stats.p95_ms, stats.p99_ms] {
            assert!((value - 7.0).abs() < 1e-9);
        }
        assert!((stats.requests_per_second - 6.0).abs() < 1e-9);
        assert_eq!(stats.error_rate, 0.0);
        assert_eq!(stats.first_error, None);
    }

    #[test]
    fn test_percentiles_one_to_hundred() {
        // Shuffled on purpose; the engine sorts
        let samples = successes((1..=100).rev());
        let stats = StatisticsEngine::summarize(Protocol::Grpc, "list_users", &samples, Duration::from_secs(1)).unwrap();

        assert_eq!(stats.median_ms, 51.0);
        assert_eq!(stats.p95_ms, 96.0);
        assert_eq!(stats.p99_ms, 100.0);
        assert_eq!(stats.min_ms, 1.0);
        assert_eq!(stats.max_ms, 100.0);
        assert!((stats.mean_ms - 50.5).abs() < 1e-9);
    }

    #[test]
    fn test_error_rate_three_of_ten() {
        let mut samples = successes(std::iter::repeat(5).take(7));
        for _ in 0..3 {
            samples.push(TimingSample::failure(Duration::from_millis(20), "HTTP 500"));
        }

        let stats = StatisticsEngine::summarize(Protocol::Soap, "list_tracks", &samples, Duration::from_secs(1)).unwrap();
        assert_eq!(stats.error_rate, 30.0);
        assert_eq!(stats.failed_requests, 3);
        assert_eq!(stats.successful_requests, 7);
        assert_eq!(stats.first_error.as_deref(), Some("HTTP 500"));
        // Failures count toward latency
        assert_eq!(stats.max_ms, 20.0);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let result = StatisticsEngine::summarize(Protocol::Rest, "list_users", &[], Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::InvalidBatch(_))));
    }

    #[test]
    fn test_all_failed_batch() {
        let samples = vec![
            TimingSample::failure(Duration::from_millis(3), "refused"),
            TimingSample::failure(Duration::from_millis(9), "timeout"),
        ];
        let stats = StatisticsEngine::summarize(Protocol::GraphQl, "list_users", &samples, Duration::from_millis(12)).unwrap();

        assert_eq!(stats.successful_requests, 0);
        assert_eq!(stats.error_rate, 100.0);
        assert_eq!(stats.mean_ms, 6.0);
        assert_eq!(stats.first_error.as_deref(), Some("refused"));
        assert_eq!(stats.failed_requests, 2);
    }

    #[test]
    fn test_single_sample_clamped() {
        let samples = successes([42]);
        let stats = StatisticsEngine::summarize(Protocol::Rest, "list_users", &samples, Duration::ZERO).unwrap();

        assert_eq!(stats.median_ms, 42.0);
        assert_eq!(stats.p95_ms, 42.0);
        assert_eq!(stats.p99_ms, 42.0);
        assert_eq!(stats.requests_per_second, 0.0);
    }

    #[test]
    fn test_percentile_index() {
        assert_eq!(StatisticsEngine::percentile_index(100, 95), 95);
        assert_eq!(StatisticsEngine::percentile_index(100, 99), 99);
        assert_eq!(StatisticsEngine::percentile_index(20, 95), 19);
        assert_eq!(StatisticsEngine::percentile_index(10, 99), 9);
        assert_eq!(StatisticsEngine::percentile_index(0, 95), 0);
    }
}
