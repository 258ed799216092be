//! Client-facing command vocabulary.
//!
//! Clients speak BiDi-shaped frames. Methods carrying the [`VOCABULARY_PREFIX`]
//! are handled by the proxy; everything else is forwarded to the browser.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Namespace prefix of proxy-handled methods.
pub const VOCABULARY_PREFIX: &str = "vibium:";

/// Inbound client command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCommand {
	pub id: u64,
	pub method: String,
	#[serde(default)]
	pub params: Map<String, Value>,
}

impl ClientCommand {
	/// Returns the method name without the vocabulary prefix, or `None` for
	/// methods that should pass through to the browser.
	pub fn vocabulary_method(&self) -> Option<&str> {
		self.method.strip_prefix(VOCABULARY_PREFIX)
	}
}

/// Reply to a [`ClientCommand`], correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientReply {
	Success {
		id: u64,
		result: Value,
	},
	Error {
		id: u64,
		/// Machine-readable error kind, e.g. `timeout` or `no such element`.
		error: String,
		message: String,
	},
}

impl ClientReply {
	pub fn id(&self) -> u64 {
		match self {
			Self::Success { id, .. } | Self::Error { id, .. } => *id,
		}
	}
}

/// Server-pushed event synthesized by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
	pub method: String,
	pub params: Value,
}
