//! Serve configuration resolved from command-line arguments.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clicker_runtime::LaunchConfig;
use url::Url;

use crate::cli::ServeArgs;

/// Everything a client session needs to bring up its browser.
#[derive(Debug, Clone)]
pub struct ServeConfig {
	pub listen: SocketAddr,
	/// Resolved browser host executable.
	pub browser: PathBuf,
	pub browser_args: Vec<String>,
	pub bidi_url: Url,
	pub headless: bool,
	pub connect_timeout: Duration,
}

impl ServeConfig {
	pub fn from_args(args: ServeArgs) -> Result<Self> {
		let browser = locate_browser(&args.browser)?;

		let bidi_url = Url::parse(&args.bidi_url).with_context(|| format!("invalid --bidi-url {}", args.bidi_url))?;
		if !matches!(bidi_url.scheme(), "ws" | "wss") {
			bail!("--bidi-url must be a ws:// or wss:// URL, got {bidi_url}");
		}

		Ok(Self {
			listen: args.listen,
			browser,
			browser_args: args.browser_args,
			bidi_url,
			headless: args.headless,
			connect_timeout: Duration::from_millis(args.connect_timeout),
		})
	}

	/// Launch settings for one browser host.
	pub fn launch_config(&self) -> LaunchConfig {
		let config = LaunchConfig::new(&self.browser).args(self.browser_args.iter().cloned());
		if self.headless { config.arg("--headless") } else { config }
	}
}

/// Resolves `browser` to an executable.
///
/// Anything with a path separator is taken as a path and must exist; bare
/// names are looked up on `PATH`.
pub fn locate_browser(browser: &str) -> Result<PathBuf> {
	let path = Path::new(browser);
	if path.components().count() > 1 {
		if path.is_file() {
			return Ok(path.to_path_buf());
		}
		return Err(clicker_runtime::Error::BrowserNotFound(format!("{browser} does not exist")).into());
	}

	which::which(browser)
		.map_err(|e| clicker_runtime::Error::BrowserNotFound(format!("{browser}: {e}")))
		.context("looking up browser on PATH")
}
