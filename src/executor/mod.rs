//! Load-test orchestration
//!
//! This module contains the measurement pipeline:
//! - `timing`: wraps a call and always yields a `TimingSample`
//! - `strategy`: sequential or bounded-concurrent scheduling of a run
//! - `LoadTester`: full suites, progressive stress runs and quick comparisons

pub mod strategy;
pub mod timing;

pub use strategy::IterationStrategy;
pub use timing::TimingCollector;

use crate::{
    client::RemoteCaller,
    error::{AppError, Result},
    models::metrics::{ComparisonEntry, RunStatistics, StressLevel, StressReport, SuiteReport},
    stats::{self, StatisticsEngine},
    types::{Operation, OperationKind, Protocol},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

/// Progress notifications are sent every this many percent of a run
const PROGRESS_STEP_PERCENT: usize = 5;

/// Lifecycle of an orchestrated run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Running,
    Aggregating,
    Done,
}

/// Receives progress of an orchestrated run; every method defaults to a no-op
pub trait RunObserver: Send + Sync {
    fn phase_changed(&self, _phase: RunPhase) {}

    fn run_started(&self, _protocol: Protocol, _operation: &Operation, _request_count: usize) {}

    fn progress(&self, _protocol: Protocol, _completed: usize, _total: usize) {}

    fn run_completed(&self, _stats: &RunStatistics) {}

    fn level_started(&self, _request_count: usize, _index: usize, _total_levels: usize) {}

    fn level_completed(&self, _level: &StressLevel) {}
}

/// Observer that ignores everything
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// What a full suite measures
#[derive(Debug, Clone, PartialEq)]
pub struct SuitePlan {
    pub operations: Vec<Operation>,
    pub protocols: Vec<Protocol>,
    pub request_count: usize,
}

impl SuitePlan {
    /// Every operation against every protocol
    pub fn full(request_count: usize, entity_id: i64) -> Self {
        Self {
            operations: Operation::suite(entity_id),
            protocols: Protocol::ALL.to_vec(),
            request_count,
        }
    }

    /// Restrict the plan; an empty selection keeps everything
    pub fn select(mut self, kinds: &[OperationKind], protocols: &[Protocol]) -> Self {
        if !kinds.is_empty() {
            self.operations.retain(|operation| kinds.contains(&operation.kind()));
        }
        if !protocols.is_empty() {
            self.protocols.retain(|protocol| protocols.contains(protocol));
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.operations.is_empty() {
            return Err(AppError::config("The load test has no operations to run"));
        }
        if self.protocols.is_empty() {
            return Err(AppError::config("The load test has no protocols to run"));
        }
        if self.request_count == 0 {
            return Err(AppError::config("Request count must be greater than 0"));
        }
        Ok(())
    }
}

/// Drives a `RemoteCaller` and reduces what it measures
pub struct LoadTester {
    caller: Arc<dyn RemoteCaller>,
    strategy: IterationStrategy,
    observer: Arc<dyn RunObserver>,
    phase: RunPhase,
}

impl LoadTester {
    pub fn new(caller: Arc<dyn RemoteCaller>) -> Self {
        Self {
            caller,
            strategy: IterationStrategy::Sequential,
            observer: Arc::new(SilentObserver),
            phase: RunPhase::Idle,
        }
    }

    pub fn with_strategy(mut self, strategy: IterationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn transition(&mut self, phase: RunPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "run phase");
            self.phase = phase;
            self.observer.phase_changed(phase);
        }
    }

    /// Measure `request_count` calls of one operation over one protocol
    pub async fn run_batch(
        &self,
        protocol: Protocol,
        operation: Operation,
        request_count: usize,
    ) -> Result<RunStatistics> {
        if request_count == 0 {
            return Err(AppError::config("Request count must be greater than 0"));
        }

        self.observer.run_started(protocol, &operation, request_count);
        let step = (request_count * PROGRESS_STEP_PERCENT / 100).max(1);
        let observer = Arc::clone(&self.observer);

        let started = Instant::now();
        let samples = self
            .strategy
            .run(
                request_count,
                |_| {
                    let caller = Arc::clone(&self.caller);
                    async move { TimingCollector::measure(caller.call(protocol, operation)).await }
                },
                |completed| {
                    if completed % step == 0 || completed == request_count {
                        observer.progress(protocol, completed, request_count);
                    }
                },
            )
            .await?;
        let elapsed = started.elapsed();

        let stats = StatisticsEngine::summarize(protocol, &operation.label(), &samples, elapsed)?;
        tracing::info!(
            %protocol,
            operation = operation.name(),
            requests = stats.total_requests,
            failed = stats.failed_requests,
            mean_ms = stats.mean_ms,
            "run complete"
        );
        self.observer.run_completed(&stats);
        Ok(stats)
    }

    /// Every (operation, protocol) pair of the plan, then per-protocol aggregates and ranking
    pub async fn run_full_suite(&mut self, plan: &SuitePlan) -> Result<SuiteReport> {
        plan.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, pairs = plan.operations.len() * plan.protocols.len(), "starting load test");

        self.transition(RunPhase::Running);
        let mut runs = Vec::with_capacity(plan.operations.len() * plan.protocols.len());
        for &operation in &plan.operations {
            for &protocol in &plan.protocols {
                let outcome = self.run_batch(protocol, operation, plan.request_count).await;
                match outcome {
                    Ok(stats) => runs.push(stats),
                    Err(error) => return Err(self.abort(error)),
                }
            }
        }

        self.transition(RunPhase::Aggregating);
        let summaries = stats::summarize_protocols(&runs);
        let ranking = stats::rank_protocols(&summaries);
        let totals = stats::overall_totals(&runs);
        self.transition(RunPhase::Done);
        tracing::info!(%run_id, "load test finished");

        Ok(SuiteReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            request_count: plan.request_count,
            runs,
            summaries,
            ranking,
            totals,
        })
    }

    /// "List users" on every protocol at each request count, one level at a time
    pub async fn run_stress(&mut self, levels: &[usize], protocols: &[Protocol]) -> Result<StressReport> {
        if levels.is_empty() {
            return Err(AppError::config("The stress run has no levels"));
        }
        if levels.contains(&0) {
            return Err(AppError::config("Stress levels must be greater than 0"));
        }
        if protocols.is_empty() {
            return Err(AppError::config("The stress run has no protocols to run"));
        }

        let operation = Operation::ListUsers;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, ?levels, "starting stress run");

        let mut completed = Vec::with_capacity(levels.len());
        for (index, &request_count) in levels.iter().enumerate() {
            self.observer.level_started(request_count, index, levels.len());
            self.transition(RunPhase::Running);

            // Fresh accumulator per level
            let mut results = Vec::with_capacity(protocols.len());
            for &protocol in protocols {
                let outcome = self.run_batch(protocol, operation, request_count).await;
                match outcome {
                    Ok(stats) => results.push(stats),
                    Err(error) => return Err(self.abort(error)),
                }
            }

            self.transition(RunPhase::Aggregating);
            let level = StressLevel {
                request_count,
                summaries: stats::summarize_protocols(&results),
                results,
            };
            self.observer.level_completed(&level);
            completed.push(level);
        }

        self.transition(RunPhase::Done);
        tracing::info!(%run_id, "stress run finished");

        Ok(StressReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            operation: operation.label(),
            levels: completed,
        })
    }

    fn abort(&mut self, error: AppError) -> AppError {
        tracing::error!(%error, "run aborted");
        self.transition(RunPhase::Idle);
        error
    }

    /// One timed call of three operations per protocol
    pub async fn quick_compare(&self, protocols: &[Protocol], entity_id: i64) -> Vec<ComparisonEntry> {
        let operations = [
            Operation::ListUsers,
            Operation::ListTracks,
            Operation::ListUserCollections { user_id: entity_id },
        ];

        let mut entries = Vec::with_capacity(protocols.len());
        for &protocol in protocols {
            let mut durations = Vec::new();
            let mut errors = Vec::new();

            for operation in operations {
                match TimingCollector::timed(self.caller.call(protocol, operation)).await {
                    (duration, Ok(_)) => durations.push(duration.as_secs_f64() * 1000.0),
                    (_, Err(error)) => errors.push(error.to_string()),
                }
            }

            let mean_ms = if durations.is_empty() {
                None
            } else {
                Some(durations.iter().sum::<f64>() / durations.len() as f64)
            };
            entries.push(ComparisonEntry { protocol, mean_ms, errors });
        }
        entries
    }
}

/// Protocol with the lowest mean among entries that have one
pub fn fastest(entries: &[ComparisonEntry]) -> Option<Protocol> {
    entries
        .iter()
        .filter_map(|entry| entry.mean_ms.map(|mean| (entry.protocol, mean)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(protocol, _)| protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, RemoteCallError};
    use crate::models::{Record, User};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers after a per-protocol delay; listed protocols fail, `panics` panics
    #[derive(Default)]
    struct FakeCaller {
        delays_ms: HashMap<Protocol, u64>,
        failing: Vec<Protocol>,
        panics: Option<Protocol>,
        calls: Mutex<Vec<(Protocol, Operation)>>,
    }

    impl FakeCaller {
        fn with_delays(delays: [(Protocol, u64); 4]) -> Self {
            Self {
                delays_ms: delays.into_iter().collect(),
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteCaller for FakeCaller {
        async fn call(&self, protocol: Protocol, operation: Operation) -> std::result::Result<Vec<Record>, ClientError> {
            self.calls.lock().unwrap().push((protocol, operation));
            if self.panics == Some(protocol) {
                panic!("unexpected adapter state");
            }
            let delay = self.delays_ms.get(&protocol).copied().unwrap_or(1);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.failing.contains(&protocol) {
                Err(RemoteCallError::new(protocol, operation.name(), "connection refused").into())
            } else {
                Ok(vec![Record::User(User { id: 1, name: "Ana".to_string(), age: Some(30) })])
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        phases: Mutex<Vec<RunPhase>>,
        ticks: Mutex<Vec<usize>>,
        levels: Mutex<Vec<usize>>,
        level_events: Mutex<Vec<String>>,
    }

    impl RunObserver for RecordingObserver {
        fn phase_changed(&self, phase: RunPhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn progress(&self, _protocol: Protocol, completed: usize, _total: usize) {
            self.ticks.lock().unwrap().push(completed);
        }

        fn level_started(&self, request_count: usize, _index: usize, _total_levels: usize) {
            self.levels.lock().unwrap().push(request_count);
            self.level_events.lock().unwrap().push(format!("started {}", request_count));
        }

        fn level_completed(&self, level: &StressLevel) {
            let protocols: Vec<String> = level.summaries.iter().map(|s| s.protocol.to_string()).collect();
            self.level_events
                .lock()
                .unwrap()
                .push(format!("completed {}: {}", level.request_count, protocols.join(",")));
        }
    }

    fn default_delays() -> [(Protocol, u64); 4] {
        [
            (Protocol::Rest, 5),
            (Protocol::GraphQl, 10),
            (Protocol::Soap, 1),
            (Protocol::Grpc, 20),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_suite_order_and_ranking() {
        let caller = Arc::new(FakeCaller::with_delays(default_delays()));
        let observer = Arc::new(RecordingObserver::default());
        let mut tester = LoadTester::new(caller.clone()).with_observer(observer.clone());

        let plan = SuitePlan::full(3, 2).select(&[OperationKind::ListUsers, OperationKind::ListCollectionItems], &[]);
        let report = tester.run_full_suite(&plan).await.unwrap();

        let order: Vec<(String, Protocol)> = report.runs.iter().map(|r| (r.operation.clone(), r.protocol)).collect();
        let mut expected = Vec::new();
        for operation in ["List users", "Tracks in collection (ID=2)"] {
            for protocol in Protocol::ALL {
                expected.push((operation.to_string(), protocol));
            }
        }
        assert_eq!(order, expected);
        assert_eq!(caller.call_count(), 24);

        let ranking: Vec<Protocol> = report.ranking.iter().map(|r| r.summary.protocol).collect();
        assert_eq!(ranking, vec![Protocol::Soap, Protocol::Rest, Protocol::GraphQl, Protocol::Grpc]);
        assert!((report.ranking[0].summary.mean_latency_ms - 1.0).abs() < 0.5);
        assert_eq!(report.totals.total_requests, 24);

        assert_eq!(
            *observer.phases.lock().unwrap(),
            vec![RunPhase::Running, RunPhase::Aggregating, RunPhase::Done]
        );
        assert_eq!(tester.phase(), RunPhase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stress_levels_are_isolated() {
        let caller = Arc::new(FakeCaller::with_delays(default_delays()));
        let observer = Arc::new(RecordingObserver::default());
        let mut tester = LoadTester::new(caller.clone()).with_observer(observer.clone());

        let report = tester.run_stress(&[10, 50], &Protocol::ALL).await.unwrap();

        assert_eq!(report.levels.len(), 2);
        let level_50 = &report.levels[1];
        assert_eq!(level_50.request_count, 50);
        assert_eq!(level_50.results.len(), 4);
        assert!(level_50.results.iter().all(|r| r.total_requests == 50));
        assert!(report.levels[0].results.iter().all(|r| r.total_requests == 10));
        assert_eq!(level_50.summaries.len(), 4);
        assert_eq!(caller.call_count(), 4 * 60);
        assert_eq!(*observer.levels.lock().unwrap(), vec![10, 50]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_level_summaries_reach_observer_before_next_level() {
        let observer = Arc::new(RecordingObserver::default());
        let mut tester = LoadTester::new(Arc::new(FakeCaller::with_delays(default_delays()))).with_observer(observer.clone());

        tester.run_stress(&[10, 50], &[Protocol::Rest, Protocol::Grpc]).await.unwrap();

        let expected = vec![
            "started 10".to_string(),
            format!("completed 10: {},{}", Protocol::Rest, Protocol::Grpc),
            "started 50".to_string(),
            format!("completed 50: {},{}", Protocol::Rest, Protocol::Grpc),
        ];
        assert_eq!(*observer.level_events.lock().unwrap(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_plan_is_fatal() {
        let mut tester = LoadTester::new(Arc::new(FakeCaller::default()));

        let no_operations = SuitePlan { operations: vec![], protocols: Protocol::ALL.to_vec(), request_count: 5 };
        assert!(matches!(tester.run_full_suite(&no_operations).await, Err(AppError::Config(_))));

        let no_protocols = SuitePlan { operations: Operation::suite(1), protocols: vec![], request_count: 5 };
        assert!(matches!(tester.run_full_suite(&no_protocols).await, Err(AppError::Config(_))));

        assert!(matches!(tester.run_stress(&[], &Protocol::ALL).await, Err(AppError::Config(_))));
        assert_eq!(tester.phase(), RunPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_counted_not_fatal() {
        let caller = Arc::new(FakeCaller {
            failing: vec![Protocol::Soap],
            ..FakeCaller::default()
        });
        let mut tester = LoadTester::new(caller);

        let report = tester.run_full_suite(&SuitePlan::full(10, 1)).await.unwrap();
        for run in &report.runs {
            if run.protocol == Protocol::Soap {
                assert_eq!(run.failed_requests, 10);
                assert_eq!(run.error_rate, 100.0);
                assert!(run.first_error.as_deref().unwrap_or_default().contains("connection refused"));
            } else {
                assert_eq!(run.failed_requests, 0);
            }
        }
        assert_eq!(report.totals.failed_requests, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_call_aborts_run() {
        let caller = Arc::new(FakeCaller {
            panics: Some(Protocol::Grpc),
            ..FakeCaller::default()
        });
        let observer = Arc::new(RecordingObserver::default());
        let mut tester = LoadTester::new(caller).with_observer(observer.clone());

        let result = tester.run_full_suite(&SuitePlan::full(2, 1)).await;
        assert!(matches!(result, Err(AppError::TestExecution(_))));
        assert_eq!(tester.phase(), RunPhase::Idle);
        assert!(!observer.phases.lock().unwrap().contains(&RunPhase::Done));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_every_five_percent() {
        let observer = Arc::new(RecordingObserver::default());
        let tester = LoadTester::new(Arc::new(FakeCaller::default())).with_observer(observer.clone());

        tester.run_batch(Protocol::Rest, Operation::ListUsers, 100).await.unwrap();
        let ticks = observer.ticks.lock().unwrap().clone();
        assert_eq!(ticks.len(), 20);
        assert_eq!(ticks.first(), Some(&5));
        assert_eq!(ticks.last(), Some(&100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_strategy_reports_higher_throughput() {
        let delays = [(Protocol::Rest, 10), (Protocol::GraphQl, 10), (Protocol::Soap, 10), (Protocol::Grpc, 10)];
        let sequential = LoadTester::new(Arc::new(FakeCaller::with_delays(delays)));
        let concurrent = LoadTester::new(Arc::new(FakeCaller::with_delays(delays)))
            .with_strategy(IterationStrategy::Concurrent { limit: 4 });

        let slow = sequential.run_batch(Protocol::Rest, Operation::ListUsers, 8).await.unwrap();
        let fast = concurrent.run_batch(Protocol::Rest, Operation::ListUsers, 8).await.unwrap();
        assert!(fast.requests_per_second > slow.requests_per_second * 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_compare() {
        let caller = Arc::new(FakeCaller {
            delays_ms: default_delays().into_iter().collect(),
            failing: vec![Protocol::GraphQl],
            ..FakeCaller::default()
        });
        let tester = LoadTester::new(caller.clone());

        let entries = tester.quick_compare(&Protocol::ALL, 1).await;
        assert_eq!(entries.len(), 4);
        assert_eq!(caller.call_count(), 12);

        let graphql = &entries[1];
        assert_eq!(graphql.mean_ms, None);
        assert_eq!(graphql.errors.len(), 3);
        assert_eq!(fastest(&entries), Some(Protocol::Soap));
    }
}
