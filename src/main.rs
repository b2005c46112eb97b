//! Protocol Bench - Main CLI Application
//!
//! Compares REST, GraphQL, SOAP and gRPC access to the same backend.

use clap::Parser;
use protocol_bench::{
    app::{resolve_color, App},
    cli::Cli,
    error::AppError,
    logging::init_logging,
};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        fail(&AppError::validation(message), cli.use_colors());
    }

    let (verbose, debug, cli_color) = (cli.verbose, cli.debug, cli.use_colors());
    let app = App::new(cli);
    let loaded = app.load_config();
    let use_color = resolve_color(&loaded, cli_color);

    if let Err(e) = init_logging(verbose, debug, use_color) {
        fail(&e, use_color);
    }

    let result = match loaded {
        Ok(config) => app.run(config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        fail(&e, use_color);
    }
}

fn fail(error: &AppError, use_color: bool) -> ! {
    tracing::error!(category = error.category(), %error, "command failed");
    eprintln!("{}", error.format_for_console(use_color));
    print_error_suggestions(error);
    process::exit(error.exit_code());
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (see `pbench env-template`)");
            eprintln!("  - URLs must start with http:// or https://");
            eprintln!("  - The gRPC target must be host:port");
        }
        AppError::Validation(_) => {
            eprintln!();
            eprintln!("Run `pbench --help` for the accepted arguments.");
        }
        AppError::RemoteCall(_) | AppError::Initialization(_) => {
            eprintln!();
            eprintln!("Connectivity help:");
            eprintln!("  - Run `pbench health` to see which protocols answer");
            eprintln!("  - Increase the per-request timeout with --timeout");
        }
        AppError::TestExecution(_) => {
            eprintln!();
            eprintln!("The run was aborted; no partial results were reported.");
        }
        _ => {}
    }
}
