mod cli;
mod inspect;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use s3mirror::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Panics are caught by the poll loop and the task guard; route the report
    // through tracing instead of raw stderr
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Uncaught panic");
    }));

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => server::run(Config::load_with(args.config)?).await?,
        Commands::Inspect(args) => inspect::run(args).await?,
    }

    Ok(())
}
