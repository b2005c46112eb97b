//! Configuration data model and validation

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// REST connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

/// GraphQL connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlConfig {
    pub url: String,
    pub timeout_ms: u64,
}

/// SOAP connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapConfig {
    /// Where the WSDL document is fetched from
    pub wsdl_url: String,
    /// Overrides the service address declared in the WSDL
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

/// gRPC connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrpcConfig {
    /// `host:port` of the gRPC server
    pub target: String,
    pub timeout_ms: u64,
}

/// Per-protocol connection parameters, fixed for the lifetime of a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub rest: RestConfig,
    pub graphql: GraphQlConfig,
    pub soap: SoapConfig,
    pub grpc: GrpcConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let timeout_ms = crate::defaults::DEFAULT_TIMEOUT.as_millis() as u64;
        Self {
            rest: RestConfig {
                base_url: crate::defaults::DEFAULT_REST_BASE_URL.to_string(),
                timeout_ms,
            },
            graphql: GraphQlConfig {
                url: crate::defaults::DEFAULT_GRAPHQL_URL.to_string(),
                timeout_ms,
            },
            soap: SoapConfig {
                wsdl_url: crate::defaults::DEFAULT_SOAP_WSDL_URL.to_string(),
                endpoint: None,
                timeout_ms,
            },
            grpc: GrpcConfig {
                target: crate::defaults::DEFAULT_GRPC_TARGET.to_string(),
                timeout_ms,
            },
        }
    }
}

impl ClientConfig {
    /// Apply one timeout to every protocol
    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.rest.timeout_ms = timeout_ms;
        self.graphql.timeout_ms = timeout_ms;
        self.soap.timeout_ms = timeout_ms;
        self.grpc.timeout_ms = timeout_ms;
    }

    /// Validate URLs, target and timeouts
    pub fn validate(&self) -> Result<()> {
        validate_http_url("REST base URL", &self.rest.base_url)?;
        validate_http_url("GraphQL URL", &self.graphql.url)?;
        validate_http_url("SOAP WSDL URL", &self.soap.wsdl_url)?;
        if let Some(endpoint) = &self.soap.endpoint {
            validate_http_url("SOAP endpoint", endpoint)?;
        }
        validate_grpc_target(&self.grpc.target)?;

        for (name, timeout_ms) in [
            ("REST", self.rest.timeout_ms),
            ("GraphQL", self.graphql.timeout_ms),
            ("SOAP", self.soap.timeout_ms),
            ("gRPC", self.grpc.timeout_ms),
        ] {
            if timeout_ms == 0 {
                return Err(AppError::config(format!("{} timeout must be greater than 0", name)));
            }
            if timeout_ms > crate::defaults::MAX_TIMEOUT_MS {
                return Err(AppError::config(format!(
                    "{} timeout cannot exceed {} ms",
                    name,
                    crate::defaults::MAX_TIMEOUT_MS
                )));
            }
        }

        Ok(())
    }
}

/// Convert a millisecond timeout into a Duration
pub fn timeout_of(timeout_ms: u64) -> Duration {
    Duration::from_millis(timeout_ms)
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub client: ClientConfig,

    /// Requests per (operation, protocol) pair in the full suite
    #[serde(default = "default_request_count")]
    pub request_count: usize,

    /// Request counts of the progressive stress run, in order
    #[serde(default = "default_stress_levels")]
    pub stress_levels: Vec<usize>,

    /// Identifier passed to the parameterised operations
    #[serde(default = "default_entity_id")]
    pub entity_id: i64,

    /// In-flight requests per run; 1 means strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Print reports as JSON instead of tables
    #[serde(default)]
    pub json_output: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            request_count: default_request_count(),
            stress_levels: default_stress_levels(),
            entity_id: default_entity_id(),
            concurrency: default_concurrency(),
            enable_color: default_enable_color(),
            json_output: false,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;

        if self.request_count == 0 {
            return Err(AppError::config("Request count must be greater than 0"));
        }
        if self.request_count > crate::defaults::MAX_REQUEST_COUNT {
            return Err(AppError::config(format!(
                "Request count cannot exceed {}",
                crate::defaults::MAX_REQUEST_COUNT
            )));
        }

        if self.stress_levels.is_empty() {
            return Err(AppError::config("At least one stress level is required"));
        }
        if let Some(level) = self
            .stress_levels
            .iter()
            .find(|&&level| level == 0 || level > crate::defaults::MAX_REQUEST_COUNT)
        {
            return Err(AppError::config(format!(
                "Stress level {} is out of range (1..={})",
                level,
                crate::defaults::MAX_REQUEST_COUNT
            )));
        }

        if self.concurrency == 0 {
            return Err(AppError::config("Concurrency must be at least 1"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        use crate::config::env::EnvManager;

        if let Some(url) = EnvManager::read_var("REST_BASE_URL")? {
            self.client.rest.base_url = url;
        }
        if let Some(url) = EnvManager::read_var("GRAPHQL_URL")? {
            self.client.graphql.url = url;
        }
        if let Some(url) = EnvManager::read_var("SOAP_WSDL_URL")? {
            self.client.soap.wsdl_url = url;
        }
        if let Some(url) = EnvManager::read_var("SOAP_URL")? {
            self.client.soap.endpoint = Some(url);
        }
        if let Some(target) = EnvManager::read_var("GRPC_TARGET")? {
            self.client.grpc.target = target;
        }
        if let Some(timeout_ms) = EnvManager::parse_var("REQUEST_TIMEOUT_MS")? {
            self.client.set_timeout_ms(timeout_ms);
        }
        if let Some(count) = EnvManager::parse_var("LOAD_TEST_REQUESTS")? {
            self.request_count = count;
        }
        if let Some(levels) = EnvManager::read_var("STRESS_LEVELS")? {
            self.stress_levels = parse_levels(&levels)?;
        }
        if let Some(id) = EnvManager::parse_var("ENTITY_ID")? {
            self.entity_id = id;
        }
        if let Some(color) = EnvManager::read_var("ENABLE_COLOR")? {
            self.enable_color = color.to_lowercase().parse().map_err(|_| {
                AppError::config(format!("Invalid ENABLE_COLOR '{}': expected true or false", color))
            })?;
        }

        Ok(())
    }
}

/// Parse a comma-separated list of request counts
pub fn parse_levels(value: &str) -> Result<Vec<usize>> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| AppError::config(format!("Invalid stress level '{}': {}", s, e)))
        })
        .collect()
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::config(format!("{} cannot be empty", name)));
    }
    match url::Url::parse(value) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(parsed) => Err(AppError::config(format!(
            "{} must use http or https, got '{}'",
            name,
            parsed.scheme()
        ))),
        Err(e) => Err(AppError::config(format!("Invalid {} '{}': {}", name, value, e))),
    }
}

fn validate_grpc_target(target: &str) -> Result<()> {
    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| AppError::config(format!("gRPC target '{}' must be host:port", target)))?;
    if host.is_empty() {
        return Err(AppError::config(format!("gRPC target '{}' has no host", target)));
    }
    port.parse::<u16>()
        .map_err(|_| AppError::config(format!("gRPC target '{}' has an invalid port", target)))?;
    Ok(())
}

fn default_request_count() -> usize {
    crate::defaults::DEFAULT_REQUEST_COUNT
}

fn default_stress_levels() -> Vec<usize> {
    crate::defaults::DEFAULT_STRESS_LEVELS.to_vec()
}

fn default_entity_id() -> i64 {
    crate::defaults::DEFAULT_ENTITY_ID
}

fn default_concurrency() -> usize {
    1
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
