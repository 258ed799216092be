use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directive for a `-v` count. `RUST_LOG` takes precedence.
pub fn filter_for(verbosity: u8) -> &'static str {
	// 0 = errors only (keeps per-frame tracing out of the way)
	// 1 (-v) = session lifecycle
	// 2+ (-vv) = every command and frame decision
	match verbosity {
		0 => "error",
		1 => "info,tokio_tungstenite=warn,tungstenite=warn",
		_ => "debug",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_levels_parse_as_filters() {
		for verbosity in 0..4 {
			assert!(EnvFilter::try_new(filter_for(verbosity)).is_ok());
		}
		assert_eq!(filter_for(0), "error");
		assert_eq!(filter_for(7), "debug");
	}
}
