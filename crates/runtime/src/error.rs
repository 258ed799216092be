//! Error types for the clicker runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// Browser executable could not be located.
	#[error("Browser not found: {0}")]
	BrowserNotFound(String),

	/// Failed to launch the browser host process.
	#[error("Failed to launch browser: {0}")]
	LaunchFailed(String),

	/// Failed to establish the BiDi WebSocket.
	#[error("Failed to connect to browser: {0}")]
	ConnectionFailed(String),

	/// Malformed frame or unexpected response shape.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Error frame returned by the browser for one of our commands.
	#[error("{error}: {message}")]
	Remote {
		/// BiDi error code (e.g., "no such frame", "invalid argument")
		error: String,
		/// Human-readable error message
		message: String,
		/// Remote stack trace (if provided)
		stacktrace: Option<String>,
	},

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Connection closed before a response arrived.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	/// Returns the BiDi error code if this is a Remote error.
	pub fn remote_code(&self) -> Option<&str> {
		match self {
			Error::Remote { error, .. } => Some(error),
			_ => None,
		}
	}
}
