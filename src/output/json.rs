//! JSON rendering of the report structures

use super::formatter::OutputFormatter;
use crate::{
    demo::Walkthrough,
    error::Result,
    executor::fastest,
    models::metrics::{ComparisonEntry, HealthReport, StressReport, SuiteReport},
};
use serde::Serialize;
use serde_json::json;

/// Prints every report as pretty JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_header(&self, _title: &str) -> Result<String> {
        Ok(String::new())
    }

    fn format_suite_report(&self, report: &SuiteReport) -> Result<String> {
        Self::render(report)
    }

    fn format_stress_report(&self, report: &StressReport) -> Result<String> {
        Self::render(report)
    }

    fn format_health_report(&self, report: &HealthReport) -> Result<String> {
        Self::render(&json!({
            "health": report,
            "all_healthy": report.all_healthy(),
        }))
    }

    fn format_comparison(&self, entries: &[ComparisonEntry]) -> Result<String> {
        Self::render(&json!({
            "entries": entries,
            "fastest": fastest(entries),
        }))
    }

    fn format_walkthrough(&self, walkthrough: &Walkthrough) -> Result<String> {
        Self::render(walkthrough)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Self::render(&json!({ "warning": warning }))
    }
}
