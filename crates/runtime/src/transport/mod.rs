//! JSON frame transport to the browser host.
//!
//! A transport is reduced to a pair of channels: [`TransportParts::outbound`]
//! accepts frames to write and [`TransportParts::inbound`] yields frames read.
//! The WebSocket implementation runs one reader and one writer task; the
//! inbound channel closes when the socket does.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

use crate::error::{Error, Result};


const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Channel halves of a running transport.
#[derive(Debug)]
pub struct TransportParts {
	/// Frames to send to the peer.
	pub outbound: mpsc::UnboundedSender<Value>,
	/// Frames received from the peer.
	pub inbound: mpsc::UnboundedReceiver<Value>,
}

impl TransportParts {
	/// Two transports wired back to back.
	///
	/// Whatever one side sends, the other receives. Used to stand a fake
	/// browser up in tests.
	pub fn in_memory() -> (TransportParts, TransportParts) {
		let (a_tx, a_rx) = mpsc::unbounded_channel();
		let (b_tx, b_rx) = mpsc::unbounded_channel();
		(
			TransportParts {
				outbound: a_tx,
				inbound: b_rx,
			},
			TransportParts {
				outbound: b_tx,
				inbound: a_rx,
			},
		)
	}
}

/// WebSocket transport to a BiDi endpoint.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects once to `url` and starts the reader and writer tasks.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		let (socket, _) = connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		debug!(target = "clicker.transport", url, "websocket connected");

		let (mut sink, mut stream) = socket.split();
		let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
		let (in_tx, in_rx) = mpsc::unbounded_channel::<Value>();

		tokio::spawn(async move {
			while let Some(frame) = out_rx.recv().await {
				if let Err(e) = sink.send(WsMessage::Text(frame.to_string())).await {
					debug!(target = "clicker.transport", error = %e, "websocket write failed");
					return;
				}
			}
			let _ = sink.send(WsMessage::Close(None)).await;
		});

		tokio::spawn(async move {
			while let Some(next) = stream.next().await {
				let frame = match next {
					Ok(WsMessage::Text(text)) => serde_json::from_str::<Value>(&text),
					Ok(WsMessage::Binary(bytes)) => serde_json::from_slice::<Value>(&bytes),
					Ok(WsMessage::Close(_)) => break,
					Ok(_) => continue,
					Err(e) => {
						debug!(target = "clicker.transport", error = %e, "websocket read failed");
						break;
					}
				};
				match frame {
					Ok(value) => {
						if in_tx.send(value).is_err() {
							break;
						}
					}
					Err(e) => warn!(target = "clicker.transport", error = %e, "dropping malformed frame"),
				}
			}
			debug!(target = "clicker.transport", "websocket reader finished");
		});

		Ok(TransportParts {
			outbound: out_tx,
			inbound: in_rx,
		})
	}

	/// Connects to `url`, retrying until `timeout` elapses.
	///
	/// The browser host opens its listening socket some time after the
	/// process starts, so the first attempts are expected to fail.
	pub async fn connect_with_retry(url: &str, timeout: Duration) -> Result<TransportParts> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			match Self::connect(url).await {
				Ok(parts) => return Ok(parts),
				Err(err) if tokio::time::Instant::now() + RETRY_INTERVAL >= deadline => {
					return Err(Error::ConnectionFailed(format!(
						"gave up after {}ms: {err}",
						timeout.as_millis()
					)));
				}
				Err(err) => {
					debug!(target = "clicker.transport", url, error = %err, "connect attempt failed; retrying");
					tokio::time::sleep(RETRY_INTERVAL).await;
				}
			}
		}
	}
}
