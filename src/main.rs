//! Sessiongate CLI binary entry point.

use clap::Parser;
use sessiongate::cli::{commands, Cli, Commands};
use sessiongate::config::GateConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match GateConfig::load(cli.config.as_deref()) {
        Ok(config) => match &cli.command {
            Commands::Route(args) => commands::handle_route(&config, args),
            Commands::Table => commands::handle_table(&config),
            Commands::Flow(args) => commands::handle_flow(&config, args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
