//! Protocol Bench
//!
//! A unified client that issues the same read operations against one backend
//! exposed over REST, GraphQL, SOAP and gRPC, plus a load tester that drives
//! it and compares latency and throughput across the four protocols.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use client::{ProtocolAdapter, RemoteCaller, UnifiedClient};
pub use error::{AppError, ClientError, InitializationError, RemoteCallError, Result};
pub use executor::{IterationStrategy, LoadTester, RunObserver, RunPhase, SuitePlan, TimingCollector};
pub use models::{ClientConfig, Config, Record, RunStatistics, StressReport, SuiteReport, TimingSample};
pub use stats::StatisticsEngine;
pub use types::{Operation, OperationKind, Protocol};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
    pub const MAX_TIMEOUT_MS: u64 = 300_000;

    pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:3000";
    pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:3000/graphql";
    pub const DEFAULT_SOAP_WSDL_URL: &str = "http://localhost:3000/service.wsdl";
    pub const DEFAULT_GRPC_TARGET: &str = "localhost:5000";

    pub const DEFAULT_REQUEST_COUNT: usize = 100;
    pub const MAX_REQUEST_COUNT: usize = 100_000;
    pub const DEFAULT_STRESS_LEVELS: &[usize] = &[10, 50, 100, 200, 500];
    pub const DEFAULT_ENTITY_ID: i64 = 1;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
