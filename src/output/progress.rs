//! Live progress on stderr while a run is in flight

use super::formatter::format_duration;
use crate::{
    executor::{RunObserver, RunPhase},
    models::metrics::{RunStatistics, StressLevel},
    types::{Operation, Protocol},
};
use colored::Colorize;
use std::io::Write;

/// Writes run progress to stderr so stdout only carries the report
pub struct ConsoleObserver {
    enable_color: bool,
    verbose: bool,
}

impl ConsoleObserver {
    pub fn new(enable_color: bool, verbose: bool) -> Self {
        Self { enable_color, verbose }
    }

    fn emit(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        // Progress is best effort; a closed stderr must not fail the run
        let _ = writeln!(stderr, "{}", line);
    }
}

impl RunObserver for ConsoleObserver {
    fn phase_changed(&self, phase: RunPhase) {
        if self.verbose {
            self.emit(&format!("phase: {:?}", phase));
        }
    }

    fn run_started(&self, protocol: Protocol, operation: &Operation, request_count: usize) {
        let label = format!("{} / {}", protocol, operation);
        let label = if self.enable_color { label.bold().to_string() } else { label };
        self.emit(&format!("Running {} x{}", label, request_count));
    }

    fn progress(&self, protocol: Protocol, completed: usize, total: usize) {
        if self.verbose {
            self.emit(&format!("  {} {}/{} ({}%)", protocol, completed, total, completed * 100 / total.max(1)));
        }
    }

    fn run_completed(&self, stats: &RunStatistics) {
        let summary = format!(
            "  done: mean {}, p95 {}, {:.1} req/s, {} failed",
            format_duration(stats.mean_ms),
            format_duration(stats.p95_ms),
            stats.requests_per_second,
            stats.failed_requests
        );
        let summary = match (self.enable_color, stats.failed_requests) {
            (true, 0) => summary.green().to_string(),
            (true, _) => summary.yellow().to_string(),
            (false, _) => summary,
        };
        self.emit(&summary);
    }

    fn level_started(&self, request_count: usize, index: usize, total_levels: usize) {
        let title = format!("Stress level {}/{}: {} requests", index + 1, total_levels, request_count);
        let title = if self.enable_color { title.bold().blue().to_string() } else { title };
        self.emit(&title);
    }

    fn level_completed(&self, level: &StressLevel) {
        for (line, summary) in level_summary_lines(level).iter().zip(&level.summaries) {
            let line = match (self.enable_color, summary.failed_requests) {
                (true, 0) => line.green().to_string(),
                (true, _) => line.yellow().to_string(),
                (false, _) => line.clone(),
            };
            self.emit(&line);
        }
    }
}

/// One line per protocol summarizing a finished stress level
pub fn level_summary_lines(level: &StressLevel) -> Vec<String> {
    level
        .summaries
        .iter()
        .map(|summary| {
            format!(
                "  {:<8} mean {}, {:.1} req/s, {} failed",
                summary.protocol.to_string(),
                format_duration(summary.mean_latency_ms),
                summary.mean_requests_per_second,
                summary.failed_requests
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::ProtocolSummary;

    fn summary(protocol: Protocol, mean_latency_ms: f64, failed_requests: usize) -> ProtocolSummary {
        ProtocolSummary {
            protocol,
            runs: 1,
            mean_latency_ms,
            mean_requests_per_second: 250.0,
            mean_p95_ms: mean_latency_ms * 2.0,
            total_requests: 10,
            successful_requests: 10 - failed_requests,
            failed_requests,
        }
    }

    #[test]
    fn test_level_summary_has_a_line_per_protocol() {
        let level = StressLevel {
            request_count: 10,
            results: Vec::new(),
            summaries: vec![summary(Protocol::Rest, 4.0, 0), summary(Protocol::Grpc, 2.5, 3)],
        };

        let lines = level_summary_lines(&level);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(&Protocol::Rest.to_string()));
        assert!(lines[0].contains("250.0 req/s"));
        assert!(lines[0].ends_with("0 failed"));
        assert!(lines[1].contains(&Protocol::Grpc.to_string()));
        assert!(lines[1].ends_with("3 failed"));
    }
}
