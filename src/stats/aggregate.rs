//! Cross-run aggregation and protocol ranking

use crate::{
    models::metrics::{OverallTotals, ProtocolSummary, RankedProtocol, RunStatistics},
    types::Protocol,
};

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// One summary per protocol present in `runs`, in report order
pub fn summarize_protocols(runs: &[RunStatistics]) -> Vec<ProtocolSummary> {
    Protocol::ALL
        .iter()
        .filter_map(|&protocol| {
            let own: Vec<&RunStatistics> = runs.iter().filter(|r| r.protocol == protocol).collect();
            if own.is_empty() {
                return None;
            }

            Some(ProtocolSummary {
                protocol,
                runs: own.len(),
                mean_latency_ms: mean(own.iter().map(|r| r.mean_ms)),
                mean_requests_per_second: mean(own.iter().map(|r| r.requests_per_second)),
                mean_p95_ms: mean(own.iter().map(|r| r.p95_ms)),
                total_requests: own.iter().map(|r| r.total_requests).sum(),
                successful_requests: own.iter().map(|r| r.successful_requests).sum(),
                failed_requests: own.iter().map(|r| r.failed_requests).sum(),
            })
        })
        .collect()
}

/// Rank protocols by mean latency, fastest first; ties keep report order
pub fn rank_protocols(summaries: &[ProtocolSummary]) -> Vec<RankedProtocol> {
    let mut ordered = summaries.to_vec();
    ordered.sort_by(|a, b| a.mean_latency_ms.total_cmp(&b.mean_latency_ms));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, summary)| RankedProtocol {
            rank: index + 1,
            summary,
        })
        .collect()
}

pub fn overall_totals(runs: &[RunStatistics]) -> OverallTotals {
    OverallTotals {
        total_requests: runs.iter().map(|r| r.total_requests).sum(),
        successful_requests: runs.iter().map(|r| r.successful_requests).sum(),
        failed_requests: runs.iter().map(|r| r.failed_requests).sum(),
        mean_latency_ms: mean(runs.iter().map(|r| r.mean_ms)),
        mean_requests_per_second: mean(runs.iter().map(|r| r.requests_per_second)),
    }
}
