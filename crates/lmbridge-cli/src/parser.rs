//! Command-line argument definitions.

use clap::{Parser, Subcommand};

use lmbridge_core::settings::{DEFAULT_HOST, DEFAULT_PORT};

/// lmbridge - local multimodal model server with an OpenAI-compatible API.
#[derive(Debug, Parser)]
#[command(name = "lmbridge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP listener.
    Serve {
        /// Model name advertised and accepted by the API.
        #[arg(long)]
        model: String,

        /// Base port; bind conflicts retry sequentially on the next ports.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Host to bind (use 0.0.0.0 to accept LAN clients).
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Attach the built-in echo engine for smoke testing.
        #[arg(long)]
        echo: bool,
    },
}
