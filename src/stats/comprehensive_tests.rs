//! Property-based and edge case tests for the statistics engine

use super::{aggregate, StatisticsEngine};
use crate::{models::metrics::TimingSample, types::Protocol};
use proptest::collection::vec;
use proptest::prelude::*;
use std::time::Duration;

/// Property-based test generators
mod generators {
    use super::*;

    /// One sample of 1 µs ..= 10 s, failing roughly one time in five
    pub fn timing_sample() -> impl Strategy<Value = TimingSample> {
        (1u64..=10_000_000, 0u8..5).prop_map(|(micros, roll)| {
            let duration = Duration::from_micros(micros);
            if roll == 0 {
                TimingSample::failure(duration, "simulated failure")
            } else {
                TimingSample::success(duration)
            }
        })
    }

    pub fn batches() -> impl Strategy<Value = Vec<TimingSample>> {
        vec(timing_sample(), 1..300)
    }

    pub fn protocol() -> impl Strategy<Value = Protocol> {
        prop_oneof![
            Just(Protocol::Rest),
            Just(Protocol::GraphQl),
            Just(Protocol::Soap),
            Just(Protocol::Grpc),
        ]
    }
}

proptest! {
    #[test]
    fn order_statistics_are_monotonic(samples in generators::batches()) {
        let stats = StatisticsEngine::summarize(Protocol::Rest, "list_users", &samples, Duration::from_secs(1)).unwrap();

        prop_assert!(stats.min_ms <= stats.median_ms);
        prop_assert!(stats.median_ms <= stats.p95_ms);
        prop_assert!(stats.p95_ms <= stats.p99_ms);
        prop_assert!(stats.p99_ms <= stats.max_ms);
        prop_assert!(stats.min_ms <= stats.mean_ms + 1e-9);
        prop_assert!(stats.mean_ms <= stats.max_ms + 1e-9);
    }

    #[test]
    fn counts_add_up(samples in generators::batches()) {
        let stats = StatisticsEngine::summarize(Protocol::Soap, "list_tracks", &samples, Duration::from_millis(250)).unwrap();

        prop_assert_eq!(stats.total_requests, samples.len());
        prop_assert_eq!(stats.successful_requests + stats.failed_requests, stats.total_requests);
        prop_assert!((0.0..=100.0).contains(&stats.error_rate));
        prop_assert_eq!(stats.first_error.is_some(), stats.failed_requests > 0);
        prop_assert!((stats.requests_per_second - samples.len() as f64 * 4.0).abs() < 1e-6);
    }

    #[test]
    fn sample_order_does_not_matter(mut samples in generators::batches()) {
        let forward = StatisticsEngine::summarize(Protocol::Grpc, "list_users", &samples, Duration::from_secs(1)).unwrap();
        samples.reverse();
        let backward = StatisticsEngine::summarize(Protocol::Grpc, "list_users", &samples, Duration::from_secs(1)).unwrap();

        prop_assert_eq!(forward.median_ms, backward.median_ms);
        prop_assert_eq!(forward.p95_ms, backward.p95_ms);
        prop_assert_eq!(forward.p99_ms, backward.p99_ms);
        prop_assert_eq!(forward.error_rate, backward.error_rate);
    }

    #[test]
    fn percentile_index_in_bounds(len in 1usize..10_000, percent in 0usize..=100) {
        prop_assert!(StatisticsEngine::percentile_index(len, percent) < len);
    }

    #[test]
    fn ranking_is_sorted_and_complete(
        entries in vec((generators::protocol(), 0.1f64..1000.0), 1..12)
    ) {
        let runs: Vec<_> = entries
            .iter()
            .map(|&(protocol, ms)| {
                let samples = vec![TimingSample::success(Duration::from_secs_f64(ms / 1000.0))];
                StatisticsEngine::summarize(protocol, "list_users", &samples, Duration::from_secs(1)).unwrap()
            })
            .collect();

        let summaries = aggregate::summarize_protocols(&runs);
        let ranking = aggregate::rank_protocols(&summaries);

        prop_assert_eq!(ranking.len(), summaries.len());
        for (index, pair) in ranking.windows(2).enumerate() {
            prop_assert_eq!(pair[0].rank, index + 1);
            prop_assert!(pair[0].summary.mean_latency_ms <= pair[1].summary.mean_latency_ms);
        }
    }
}

#[test]
fn test_two_samples_take_upper_median() {
    let samples = vec![
        TimingSample::success(Duration::from_millis(10)),
        TimingSample::success(Duration::from_millis(30)),
    ];
    let stats = StatisticsEngine::summarize(Protocol::Rest, "list_users", &samples, Duration::from_secs(1)).unwrap();
    assert_eq!(stats.median_ms, 30.0);
    assert_eq!(stats.mean_ms, 20.0);
}

#[test]
fn test_large_batch() {
    let samples: Vec<_> = (1..=100_000u64)
        .map(|i| TimingSample::success(Duration::from_micros(i)))
        .collect();
    let stats = StatisticsEngine::summarize(Protocol::Rest, "list_users", &samples, Duration::from_secs(10)).unwrap();

    assert_eq!(stats.total_requests, 100_000);
    assert!((stats.p99_ms - 99.001).abs() < 1e-9);
    assert!((stats.requests_per_second - 10_000.0).abs() < 1e-9);
}
