//! Advisory checks on a configuration that already passed `Config::validate`

use crate::{error::Result, models::Config, types::Protocol};
use std::fmt;

/// Requests above which a run is flagged as long
const LONG_RUN_REQUESTS: usize = 10_000;

/// Configuration checks that produce advisories rather than errors
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, then collect advisories about it
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::check_measurement_settings(config));
        warnings.extend(Self::check_run_size(config));
        Ok(warnings)
    }

    fn check_measurement_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.concurrency > 1 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Concurrency of {} keeps several requests in flight; latencies include self-contention",
                    config.concurrency
                ),
            ));
        }

        if config.request_count < 10 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Request count of {} gives unreliable p95/p99 values (recommended: >= 10)",
                    config.request_count
                ),
            ));
        }

        let shortest = [
            config.client.rest.timeout_ms,
            config.client.graphql.timeout_ms,
            config.client.soap.timeout_ms,
            config.client.grpc.timeout_ms,
        ]
        .into_iter()
        .min()
        .unwrap_or_default();
        if shortest < 100 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Timeout of {} ms will likely fail requests that are merely slow", shortest),
            ));
        }

        warnings
    }

    fn check_run_size(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let protocols = Protocol::ALL.len();

        let suite_requests = config.request_count * crate::types::OperationKind::ALL.len() * protocols;
        if suite_requests > LONG_RUN_REQUESTS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("A full load test will issue {} requests", suite_requests),
            ));
        }

        let stress_requests: usize = config.stress_levels.iter().sum::<usize>() * protocols;
        if stress_requests > LONG_RUN_REQUESTS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("A stress run will issue {} requests", stress_requests),
            ));
        }

        warnings
    }
}

/// Advisory levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// One configuration advisory
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new<S: Into<String>>(level: ValidationLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}

/// Validate a configuration and log its advisories
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    let warnings = ConfigValidator::validate_comprehensive(config)?;
    for warning in &warnings {
        match warning.level {
            ValidationLevel::Info => tracing::info!("{}", warning.message),
            ValidationLevel::Warning => tracing::warn!("{}", warning.message),
        }
    }
    Ok(warnings)
}
