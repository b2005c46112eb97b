//! Timing samples, run statistics and report data models

use crate::types::Protocol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// How a measured invocation ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleOutcome {
    Success,
    Failure { error: String },
}

/// One measured invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    /// Elapsed time on the monotonic clock
    pub duration: Duration,
    pub outcome: SampleOutcome,
}

impl TimingSample {
    pub fn success(duration: Duration) -> Self {
        Self {
            duration,
            outcome: SampleOutcome::Success,
        }
    }

    pub fn failure<S: Into<String>>(duration: Duration, error: S) -> Self {
        Self {
            duration,
            outcome: SampleOutcome::Failure { error: error.into() },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SampleOutcome::Success)
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SampleOutcome::Success => None,
            SampleOutcome::Failure { error } => Some(error),
        }
    }
}

/// Aggregated result of one (protocol, operation, request count) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub protocol: Protocol,
    pub operation: String,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub requests_per_second: f64,
    /// Failed requests as a percentage of the total
    pub error_rate: f64,
    /// First failure message seen in the batch, if any
    pub first_error: Option<String>,
}

/// Per-protocol aggregate over a set of runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSummary {
    pub protocol: Protocol,
    pub runs: usize,
    /// Mean of the runs' mean latencies
    pub mean_latency_ms: f64,
    /// Mean of the runs' throughputs
    pub mean_requests_per_second: f64,
    pub mean_p95_ms: f64,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
}

/// A protocol's place in a ranking, 1 being the fastest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProtocol {
    pub rank: usize,
    pub summary: ProtocolSummary,
}

/// Totals over every run of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallTotals {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub mean_latency_ms: f64,
    pub mean_requests_per_second: f64,
}

/// Result of a full-suite load test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub request_count: usize,
    pub runs: Vec<RunStatistics>,
    pub summaries: Vec<ProtocolSummary>,
    pub ranking: Vec<RankedProtocol>,
    pub totals: OverallTotals,
}

/// One level of a progressive stress run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressLevel {
    pub request_count: usize,
    /// Exactly one entry per protocol, all measured at `request_count`
    pub results: Vec<RunStatistics>,
    pub summaries: Vec<ProtocolSummary>,
}

/// Result of a progressive stress run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub operation: String,
    pub levels: Vec<StressLevel>,
}

/// Per-protocol health
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub rest: bool,
    pub graphql: bool,
    pub soap: bool,
    pub grpc: bool,
}

impl HealthReport {
    pub fn get(&self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::Rest => self.rest,
            Protocol::GraphQl => self.graphql,
            Protocol::Soap => self.soap,
            Protocol::Grpc => self.grpc,
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.rest && self.graphql && self.soap && self.grpc
    }
}

/// Quick single-shot comparison result for one protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub protocol: Protocol,
    /// Mean of the successful calls, `None` when every call failed
    pub mean_ms: Option<f64>,
    pub errors: Vec<String>,
}
