//! Command-line interface

use crate::types::{OperationKind, Protocol};
use clap::{ArgAction, Parser, Subcommand};

/// Protocol Bench - compare REST, GraphQL, SOAP and gRPC on the same backend
#[derive(Parser, Debug, Clone)]
#[command(name = "pbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// REST base URL
    #[arg(long, global = true)]
    pub rest_url: Option<String>,

    /// GraphQL endpoint URL
    #[arg(long, global = true)]
    pub graphql_url: Option<String>,

    /// Location of the SOAP service WSDL
    #[arg(long, global = true)]
    pub soap_wsdl_url: Option<String>,

    /// SOAP service address (overrides the WSDL's address)
    #[arg(long, global = true)]
    pub soap_url: Option<String>,

    /// gRPC server as host:port
    #[arg(long, global = true)]
    pub grpc_target: Option<String>,

    /// Per-request timeout in milliseconds, for every protocol
    #[arg(short, long, global = true, value_parser = parse_timeout_ms)]
    pub timeout: Option<u64>,

    /// Identifier used by the parameterised operations
    #[arg(long, global = true)]
    pub id: Option<i64>,

    /// Force colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run all five operations against every protocol and show the records
    Examples,

    /// Run every operation against every protocol and rank the protocols
    LoadTest {
        /// Requests per operation and protocol
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// Restrict the suite to these operations (repeatable)
        #[arg(long = "operation", value_enum, action = ArgAction::Append)]
        operations: Vec<OperationKind>,

        /// Restrict the suite to these protocols (repeatable)
        #[arg(long = "protocol", value_enum, action = ArgAction::Append)]
        protocols: Vec<Protocol>,

        /// Requests kept in flight per run (1 = sequential)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Repeat "list users" on every protocol at increasing request counts
    Stress {
        /// Request counts, in order (comma-separated)
        #[arg(long, value_delimiter = ',')]
        levels: Vec<usize>,

        /// Restrict the run to these protocols (repeatable)
        #[arg(long = "protocol", value_enum, action = ArgAction::Append)]
        protocols: Vec<Protocol>,

        /// Requests kept in flight per run (1 = sequential)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Check all four protocols in parallel
    Health,

    /// Time one call of three operations on every protocol
    Compare,

    /// Print an example .env file
    EnvTemplate,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        match &self.command {
            Command::LoadTest { requests: Some(0), .. } => {
                Err("--requests must be greater than 0".to_string())
            }
            Command::LoadTest { concurrency: Some(0), .. } | Command::Stress { concurrency: Some(0), .. } => {
                Err("--concurrency must be greater than 0".to_string())
            }
            Command::Stress { levels, .. } if levels.contains(&0) => {
                Err("--levels entries must be greater than 0".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse a timeout in milliseconds
fn parse_timeout_ms(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|ms| {
            if ms == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if ms > crate::defaults::MAX_TIMEOUT_MS {
                Err(format!("Timeout cannot exceed {} ms", crate::defaults::MAX_TIMEOUT_MS))
            } else {
                Ok(ms)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_test_parsing() {
        let cli = Cli::parse_from([
            "pbench",
            "load-test",
            "--requests", "25",
            "--operation", "list-users",
            "--operation", "list-collections-by-item",
            "--protocol", "grpc",
            "--timeout", "1500",
        ]);

        assert_eq!(cli.timeout, Some(1500));
        match cli.command {
            Command::LoadTest { requests, operations, protocols, concurrency } => {
                assert_eq!(requests, Some(25));
                assert_eq!(operations, vec![OperationKind::ListUsers, OperationKind::ListCollectionsByItem]);
                assert_eq!(protocols, vec![Protocol::Grpc]);
                assert_eq!(concurrency, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_stress_levels_parsing() {
        let cli = Cli::parse_from(["pbench", "stress", "--levels", "10,50"]);
        assert_eq!(
            cli.command,
            Command::Stress { levels: vec![10, 50], protocols: vec![], concurrency: None }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pbench", "health", "--no-color", "--grpc-target", "127.0.0.1:50051"]);
        assert_eq!(cli.command, Command::Health);
        assert!(cli.no_color);
        assert_eq!(cli.grpc_target.as_deref(), Some("127.0.0.1:50051"));
        assert!(!cli.use_colors());
    }

    #[test]
    fn test_validate_conflicts() {
        let cli = Cli::parse_from(["pbench", "health", "--color", "--no-color"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["pbench", "load-test", "--requests", "0"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["pbench", "stress", "--levels", "10,0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_timeout_parser() {
        assert_eq!(parse_timeout_ms("250"), Ok(250));
        assert!(parse_timeout_ms("0").is_err());
        assert!(parse_timeout_ms("+5").is_err());
        assert!(parse_timeout_ms("abc").is_err());
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        assert!(Cli::try_parse_from(["pbench", "load-test", "--protocol", "thrift"]).is_err());
    }
}
