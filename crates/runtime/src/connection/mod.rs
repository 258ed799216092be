//! Request/response correlation for internally issued BiDi commands.
//!
//! The proxy shares one browser socket between two kinds of traffic: frames a
//! client asked to pass through, and commands the proxy issues itself while
//! translating a vocabulary command. Internal commands draw their ids from a
//! range starting at [`INTERNAL_ID_BASE`], so their responses can be claimed by
//! [`Connection::dispatch`] while every other frame is handed back to the
//! caller for forwarding.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use clicker_protocol::{Command, Message, Response};
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};


/// First id used for proxy-issued commands.
///
/// Client ids are expected to stay below this value; anything at or above it
/// is treated as ours.
pub const INTERNAL_ID_BASE: u64 = u32::MAX as u64 + 1;

/// Pending internal commands keyed by id.
type CallbackMap = Arc<DashMap<u64, oneshot::Sender<Result<Value>>>>;

/// RAII guard removing the pending entry when a request future is dropped
/// before its response arrives (e.g. a wait that timed out mid-poll).
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u64, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		if self.callbacks.remove(&self.id).is_some() {
			debug!(target = "clicker.connection", id = self.id, "removed orphaned callback");
		}
	}
}

/// Future returned by [`Connection::send_command`].
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Shared handle to the browser socket.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct Connection {
	last_id: AtomicU64,
	callbacks: CallbackMap,
	outbound_tx: mpsc::UnboundedSender<Value>,
	closed: AtomicBool,
}

impl Connection {
	/// Creates a connection writing frames to `outbound_tx`.
	///
	/// Inbound frames are not read here: the owner feeds them through
	/// [`Connection::dispatch`].
	pub fn new(outbound_tx: mpsc::UnboundedSender<Value>) -> Self {
		Self {
			last_id: AtomicU64::new(INTERNAL_ID_BASE),
			callbacks: Arc::new(DashMap::new()),
			outbound_tx,
			closed: AtomicBool::new(false),
		}
	}

	fn next_id(&self) -> u64 {
		self.last_id.fetch_add(1, Ordering::SeqCst)
	}

	/// Sends a BiDi command and awaits its result.
	///
	/// # Errors
	///
	/// - `Error::Remote` when the browser answers with an error frame
	/// - `Error::ChannelClosed` when the socket goes away first
	pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.next_id();
		let (tx, rx) = oneshot::channel();
		self.callbacks.insert(id, tx);
		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));
		if self.closed.load(Ordering::SeqCst) {
			return Err(Error::ChannelClosed);
		}

		let frame = serde_json::to_value(Command {
			id,
			method: method.to_string(),
			params,
		})?;
		trace!(target = "clicker.connection", id, method, "sending command");

		if self.outbound_tx.send(frame).is_err() {
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Typed wrapper around [`Connection::send_command`].
	pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
	where
		P: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let value = self.send_command(method, serde_json::to_value(params)?).await?;
		serde_json::from_value(value)
			.map_err(|e| Error::ProtocolError(format!("unexpected {method} result: {e}")))
	}

	/// Writes a frame to the browser unchanged (client passthrough).
	pub fn forward(&self, frame: Value) -> Result<()> {
		self.outbound_tx.send(frame).map_err(|_| Error::ChannelClosed)
	}

	/// Routes one inbound frame.
	///
	/// Responses to pending internal commands complete their waiter and yield
	/// `None`. Everything else comes back for the caller to forward.
	pub fn dispatch(&self, message: Message) -> Option<Message> {
		match message {
			Message::Response(response) if response.id >= INTERNAL_ID_BASE => {
				match self.callbacks.remove(&response.id) {
					Some((id, tx)) => {
						trace!(target = "clicker.connection", id, "completing command");
						let _ = tx.send(response_result(response));
					}
					None => {
						warn!(target = "clicker.connection", id = response.id, "response for unknown internal id");
					}
				}
				None
			}
			other => Some(other),
		}
	}

	/// Number of internal commands still awaiting a response.
	pub fn pending(&self) -> usize {
		self.callbacks.len()
	}

	/// Fails every pending command with `Error::ChannelClosed`, and every
	/// command sent afterwards.
	///
	/// Called once the inbound side of the socket is gone.
	pub fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let ids: Vec<u64> = self.callbacks.iter().map(|entry| *entry.key()).collect();
		for id in ids {
			if let Some((_, tx)) = self.callbacks.remove(&id) {
				let _ = tx.send(Err(Error::ChannelClosed));
			}
		}
	}
}

fn response_result(response: Response) -> Result<Value> {
	if response.is_error() {
		return Err(Error::Remote {
			error: response.error.unwrap_or_else(|| "unknown error".to_string()),
			message: response.message.unwrap_or_default(),
			stacktrace: response.stacktrace,
		});
	}
	Ok(response.result.unwrap_or(Value::Null))
}
