//! Error types for command handling.

use thiserror::Error;

/// Result type alias for command handlers.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a vocabulary command can fail with.
///
/// The router turns these into client error replies: [`Error::kind`] becomes
/// the `error` field and the display text (prefixed with the operation name)
/// becomes `message`.
#[derive(Debug, Error)]
pub enum Error {
	/// Missing or malformed command parameter.
	#[error("{0}")]
	Parameter(String),

	/// No browsing context to target.
	#[error("{0}")]
	ContextResolution(String),

	/// Selector matched nothing.
	#[error("{0}")]
	ElementNotFound(String),

	/// Scope selector matched nothing.
	#[error("{0}")]
	RootNotFound(String),

	/// A wait ran out of time.
	#[error("{0}")]
	Timeout(String),

	/// Page script threw or reported a failure.
	#[error("{0}")]
	Script(String),

	/// Browser connection or protocol failure.
	#[error(transparent)]
	Transport(#[from] clicker_runtime::Error),

	/// Script result had an unexpected shape.
	#[error("{0}")]
	Decode(String),

	/// `vibium:` method with no handler.
	#[error("unknown method: {0}")]
	UnknownMethod(String),
}

impl Error {
	pub(crate) fn element_not_found() -> Self {
		Error::ElementNotFound("element not found".to_string())
	}

	pub(crate) fn root_not_found() -> Self {
		Error::RootNotFound("root not found".to_string())
	}

	/// Maps an error message reported by a page script onto a variant.
	pub(crate) fn from_script_message(message: &str) -> Self {
		match message {
			"element not found" => Self::element_not_found(),
			"root not found" => Self::root_not_found(),
			other => Error::Script(other.to_string()),
		}
	}

	/// True for both a missing element and a missing scope root.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Error::ElementNotFound(_) | Error::RootNotFound(_))
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Machine-readable kind sent as the `error` field of a client reply.
	///
	/// Kinds reuse WebDriver error codes where one fits.
	pub fn kind(&self) -> &str {
		match self {
			Error::Parameter(_) => "invalid argument",
			Error::ContextResolution(_) => "no such frame",
			Error::ElementNotFound(_) | Error::RootNotFound(_) => "no such element",
			Error::Timeout(_) => "timeout",
			Error::Script(_) => "javascript error",
			Error::Transport(err) => err.remote_code().unwrap_or("unknown error"),
			Error::Decode(_) => "unknown error",
			Error::UnknownMethod(_) => "unknown command",
		}
	}
}
