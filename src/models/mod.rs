//! Data models and structures for the protocol benchmark

pub mod config;
pub mod metrics;
pub mod records;

// Re-export main model types
pub use config::{ClientConfig, Config, GraphQlConfig, GrpcConfig, RestConfig, SoapConfig};
pub use metrics::{
    ComparisonEntry, HealthReport, OverallTotals, ProtocolSummary, RankedProtocol, RunStatistics,
    SampleOutcome, StressLevel, StressReport, SuiteReport, TimingSample,
};
pub use records::{Collection, Record, Track, User};
