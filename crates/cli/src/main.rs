use std::process::ExitCode;

use clap::Parser;
use clicker_cli::cli::Cli;
use clicker_cli::logging;
use clicker_runtime::{guard, registry};
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let outcome = tokio::select! {
		result = guard(clicker_cli::run(cli.command)) => result,
		_ = tokio::signal::ctrl_c() => {
			info!(target = "clicker", "interrupted");
			Ok(())
		}
	};

	let killed = registry().kill_all();
	if killed > 0 {
		info!(target = "clicker", killed, "killed remaining browser hosts");
	}

	match outcome {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("Error: {err:#}");
			ExitCode::FAILURE
		}
	}
}
