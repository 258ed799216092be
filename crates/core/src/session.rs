//! Per-client session state.

use std::sync::Arc;

use clicker_protocol::{ClientEvent, ClientReply, GetTree, GetTreeResult};
use clicker_runtime::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{OnceCell, mpsc};
use tracing::debug;

use crate::error::{Error, Result};

/// State owned by one connected client.
///
/// Holds the browser connection, the sink for frames going back to the
/// client, and two one-shot install states used by the WebSocket bridge: the
/// `script.message` subscription and the monitor preload script id. Each is
/// set at most once; a failed install leaves it unset so a later call retries.
#[derive(Debug)]
pub struct Session {
	connection: Arc<Connection>,
	client: mpsc::UnboundedSender<Value>,
	subscription: OnceCell<()>,
	monitor: OnceCell<String>,
}

impl Session {
	pub fn new(connection: Arc<Connection>, client: mpsc::UnboundedSender<Value>) -> Self {
		Self {
			connection,
			client,
			subscription: OnceCell::new(),
			monitor: OnceCell::new(),
		}
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.connection
	}

	/// Issues an internal BiDi command and decodes its result.
	pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
	where
		P: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		Ok(self.connection.call(method, params).await?)
	}

	/// Picks the browsing context a command targets.
	///
	/// Uses `params.context` when given, otherwise the first top-level
	/// context reported by `browsingContext.getTree`.
	pub async fn resolve_context(&self, params: &Map<String, Value>) -> Result<String> {
		match params.get("context") {
			Some(Value::String(context)) if !context.is_empty() => return Ok(context.clone()),
			Some(Value::String(_)) | Some(Value::Null) | None => {}
			Some(other) => return Err(Error::Parameter(format!("context must be a string, got {other}"))),
		}

		let tree: GetTreeResult = self.call("browsingContext.getTree", &GetTree { max_depth: Some(0) }).await?;
		tree.contexts
			.into_iter()
			.next()
			.map(|info| info.context)
			.ok_or_else(|| Error::ContextResolution("no browsing context available".to_string()))
	}

	pub(crate) fn subscription(&self) -> &OnceCell<()> {
		&self.subscription
	}

	pub(crate) fn monitor(&self) -> &OnceCell<String> {
		&self.monitor
	}

	/// True once `script.message` has been subscribed to.
	pub fn is_subscribed(&self) -> bool {
		self.subscription.initialized()
	}

	/// Id of the installed WebSocket monitor preload script, if any.
	pub fn monitor_script(&self) -> Option<&str> {
		self.monitor.get().map(String::as_str)
	}

	/// Sends a raw frame to the client. Dropped silently once the client is gone.
	pub fn send_to_client(&self, frame: Value) {
		if self.client.send(frame).is_err() {
			debug!(target = "clicker.session", "client gone; dropping frame");
		}
	}

	pub fn reply(&self, reply: ClientReply) {
		match serde_json::to_value(&reply) {
			Ok(frame) => self.send_to_client(frame),
			Err(e) => debug!(target = "clicker.session", id = reply.id(), error = %e, "failed to encode reply"),
		}
	}

	pub fn emit(&self, event: ClientEvent) {
		match serde_json::to_value(&event) {
			Ok(frame) => self.send_to_client(frame),
			Err(e) => debug!(target = "clicker.session", method = %event.method, error = %e, "failed to encode event"),
		}
	}
}
