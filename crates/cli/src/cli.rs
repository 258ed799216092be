use std::net::SocketAddr;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clicker")]
#[command(about = "WebDriver BiDi proxy with a high-level vibium: command vocabulary")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Accept clients over WebSocket and proxy each one to its own browser
	Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
	/// Address the proxy listens on
	#[arg(long, value_name = "ADDR", default_value = "127.0.0.1:9515")]
	pub listen: SocketAddr,

	/// Browser host to launch per client: a name looked up on PATH, or a path
	#[arg(long, value_name = "NAME|PATH", default_value = "chromedriver")]
	pub browser: String,

	/// Extra argument for the browser host (repeatable)
	#[arg(long = "browser-arg", value_name = "ARG", allow_hyphen_values = true)]
	pub browser_args: Vec<String>,

	/// BiDi WebSocket URL the launched host serves
	#[arg(long, value_name = "URL")]
	pub bidi_url: String,

	/// Pass --headless to the browser host
	#[arg(long)]
	pub headless: bool,

	/// How long to keep retrying the BiDi connection, in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 10_000)]
	pub connect_timeout: u64,
}
