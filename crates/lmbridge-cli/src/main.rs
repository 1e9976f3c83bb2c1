//! CLI entry point - the composition root.
//!
//! This is the only place where infrastructure is wired together. Command
//! dispatch routes to handlers which drive the supervisor.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lmbridge_cli::{Cli, Commands, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            model,
            port,
            host,
            echo,
        } => handlers::serve::execute(model, port, host, echo).await,
    }
}
