//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists; variables already set win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                tracing::debug!(path = %path.display(), "loaded configuration from env file");
            }
        } else if debug {
            tracing::debug!("no .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Read a variable, treating unset and blank values alike
    pub fn read_var(key: &str) -> Result<Option<String>> {
        match std::env::var(key) {
            Ok(value) => {
                let value = value.trim();
                if value.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(value.to_string()))
                }
            }
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(AppError::config(format!("Environment variable {} is not valid UTF-8", key)))
            }
        }
    }

    /// Read and parse a variable; a malformed value is a configuration error
    pub fn parse_var<T>(key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::read_var(key)? {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|e| AppError::config(format!("Invalid {} '{}': {}", key, value, e))),
            None => Ok(None),
        }
    }

    /// Example .env content documenting every supported variable
    pub fn create_example_env_content() -> String {
        r#"# Protocol Bench Configuration
#
# Values here are used as defaults and can be overridden by
# command-line arguments.

# REST base URL
# REST_BASE_URL=http://localhost:3000

# GraphQL endpoint
# GRAPHQL_URL=http://localhost:3000/graphql

# WSDL location; the service address is read from the WSDL
# SOAP_WSDL_URL=http://localhost:3000/service.wsdl

# Override the SOAP service address declared in the WSDL
# SOAP_URL=http://localhost:8000/soap

# gRPC server (host:port)
# GRPC_TARGET=localhost:5000

# Per-request timeout in milliseconds, applied to every protocol
# REQUEST_TIMEOUT_MS=5000

# Requests per operation and protocol in the full load test
# LOAD_TEST_REQUESTS=100

# Progressive stress levels (comma-separated request counts)
# STRESS_LEVELS=10,50,100,200,500

# Identifier used by the parameterised operations
# ENTITY_ID=1

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }
}
