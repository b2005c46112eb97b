//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{Cli, Command},
    config::env::EnvManager,
    error::Result,
    models::Config,
};
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    /// Create a new configuration parser reading `.env` from the working directory
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(".env"),
        }
    }

    /// Read a different env file instead of `./.env`
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = path.into();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file_from(&self.env_file, self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(url) = &cli.rest_url {
            config.client.rest.base_url = url.clone();
        }
        if let Some(url) = &cli.graphql_url {
            config.client.graphql.url = url.clone();
        }
        if let Some(url) = &cli.soap_wsdl_url {
            config.client.soap.wsdl_url = url.clone();
        }
        if let Some(url) = &cli.soap_url {
            config.client.soap.endpoint = Some(url.clone());
        }
        if let Some(target) = &cli.grpc_target {
            config.client.grpc.target = target.clone();
        }
        if let Some(timeout_ms) = cli.timeout {
            config.client.set_timeout_ms(timeout_ms);
        }
        if let Some(id) = cli.id {
            config.entity_id = id;
        }

        match &cli.command {
            Command::LoadTest { requests, concurrency, .. } => {
                if let Some(requests) = requests {
                    config.request_count = *requests;
                }
                if let Some(concurrency) = concurrency {
                    config.concurrency = *concurrency;
                }
            }
            Command::Stress { levels, concurrency, .. } => {
                if !levels.is_empty() {
                    config.stress_levels = levels.clone();
                }
                if let Some(concurrency) = concurrency {
                    config.concurrency = *concurrency;
                }
            }
            _ => {}
        }

        if cli.color {
            config.enable_color = true;
        } else if cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.json_output = cli.json;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        tracing::debug!(
            request_count = config.request_count,
            concurrency = config.concurrency,
            entity_id = config.entity_id,
            enable_color = config.enable_color,
            "applied CLI overrides"
        );
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let client = &config.client;
    let mut summary = Vec::new();

    summary.push(format!("REST: {}", client.rest.base_url));
    summary.push(format!("GraphQL: {}", client.graphql.url));
    summary.push(format!(
        "SOAP: {}{}",
        client.soap.wsdl_url,
        client
            .soap
            .endpoint
            .as_ref()
            .map(|endpoint| format!(" (endpoint {})", endpoint))
            .unwrap_or_default()
    ));
    summary.push(format!("gRPC: {}", client.grpc.target));
    summary.push(format!("Timeout: {} ms", client.rest.timeout_ms));
    summary.push(format!("Request Count: {}", config.request_count));
    summary.push(format!(
        "Stress Levels: {}",
        config
            .stress_levels
            .iter()
            .map(|level| level.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    summary.push(format!("Entity Id: {}", config.entity_id));
    summary.push(format!("Concurrency: {}", config.concurrency));
    summary.push(format!("Color Output: {}", config.enable_color));

    summary.join("\n")
}
