//! clicker-cli - the `clicker` proxy binary
//!
//! Parses arguments, sets up logging and serves WebSocket clients, giving
//! each one a browser host and a [`clicker::Router`].

pub mod cli;
pub mod config;
pub mod logging;
pub mod server;

use anyhow::Result;

use crate::cli::Commands;
use crate::config::ServeConfig;

/// Runs a parsed subcommand to completion.
pub async fn run(command: Commands) -> Result<()> {
	match command {
		Commands::Serve(args) => server::run(ServeConfig::from_args(args)?).await,
	}
}
