//! Tether CLI entrypoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::{Commands, ConfigCommands};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "tether")]
#[command(
    author,
    version,
    about = "Load server-described UI trees through cache strategies",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Load(args) => handlers::load(&config, args).await?,
        Commands::Inspect { url, method } => handlers::inspect(&config, &url, &method).await?,
        Commands::Clear { url, method } => handlers::clear(&config, &url, &method).await?,
        Commands::Strategies => handlers::list_strategies(),
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}
