//! Main application orchestration and execution

use crate::{
    cli::{Cli, Command},
    client::UnifiedClient,
    config::{display_config_summary, load_config, validate_config, EnvManager},
    demo,
    error::Result,
    executor::{IterationStrategy, LoadTester, RunObserver, SuitePlan},
    models::Config,
    output::{ConsoleObserver, OutputFormatter, OutputFormatterFactory},
    types::Protocol,
};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Load the configuration the command runs with; `env-template` needs none
    pub fn load_config(&self) -> Result<Option<Config>> {
        if self.cli.command == Command::EnvTemplate {
            return Ok(None);
        }
        load_config(self.cli.clone()).map(Some)
    }

    /// Run the selected subcommand and print its report on stdout
    pub async fn run(self, config: Option<Config>) -> Result<()> {
        let Some(config) = config else {
            print!("{}", EnvManager::create_example_env_content());
            return Ok(());
        };

        let warnings = validate_config(&config)?;

        let formatter = OutputFormatterFactory::from_config(&config);
        if config.debug {
            eprintln!("{} v{}", crate::PKG_NAME, crate::VERSION);
            eprintln!("{}", display_config_summary(&config));
        }
        if config.verbose && !config.json_output {
            for warning in &warnings {
                eprintln!("{}", formatter.format_warning(&warning.to_string())?);
            }
        }

        let client = Arc::new(UnifiedClient::new(&config.client)?);
        // Progress goes to stderr, so JSON mode keeps it without colors
        let observer: Arc<dyn RunObserver> = Arc::new(ConsoleObserver::new(
            config.enable_color && !config.json_output,
            config.verbose,
        ));

        let report = execute(&self.cli.command, &config, client, observer, formatter.as_ref()).await?;
        println!("{}", report);
        Ok(())
    }
}

/// Color for logs and error output: the loaded `ENABLE_COLOR`, else the command-line flags
pub fn resolve_color(loaded: &Result<Option<Config>>, cli_color: bool) -> bool {
    match loaded {
        Ok(Some(config)) => config.enable_color,
        _ => cli_color,
    }
}

/// Execute one subcommand against a client and render its report
pub async fn execute(
    command: &Command,
    config: &Config,
    client: Arc<UnifiedClient>,
    observer: Arc<dyn RunObserver>,
    formatter: &dyn OutputFormatter,
) -> Result<String> {
    let strategy = IterationStrategy::from_concurrency(config.concurrency);

    match command {
        Command::Examples => {
            let walkthrough = demo::run_walkthrough(client.as_ref(), &Protocol::ALL, config.entity_id).await;
            formatter.format_walkthrough(&walkthrough)
        }
        Command::LoadTest { operations, protocols, .. } => {
            let plan = SuitePlan::full(config.request_count, config.entity_id).select(operations, protocols);
            let mut tester = LoadTester::new(client).with_strategy(strategy).with_observer(observer);
            let report = tester.run_full_suite(&plan).await?;
            formatter.format_suite_report(&report)
        }
        Command::Stress { protocols, .. } => {
            let protocols = if protocols.is_empty() { Protocol::ALL.to_vec() } else { protocols.clone() };
            let mut tester = LoadTester::new(client).with_strategy(strategy).with_observer(observer);
            let report = tester.run_stress(&config.stress_levels, &protocols).await?;
            formatter.format_stress_report(&report)
        }
        Command::Health => {
            let health = client.health_check().await;
            tracing::info!(?health, "health check finished");
            formatter.format_health_report(&health)
        }
        Command::Compare => {
            let tester = LoadTester::new(client).with_observer(observer);
            let entries = tester.quick_compare(&Protocol::ALL, config.entity_id).await;
            formatter.format_comparison(&entries)
        }
        Command::EnvTemplate => Ok(EnvManager::create_example_env_content()),
    }
}
