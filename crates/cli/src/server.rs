//! Client-facing WebSocket server.
//!
//! Each connected client gets its own browser host and BiDi session. Client
//! text frames are JSON commands for the router; whatever the router sends
//! back is written to the client as text frames. When either side goes away
//! the browser is shut down.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::routing::get;
use clicker_runtime::{BrowserProcess, WebSocketTransport, shutdown};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use crate::config::ServeConfig;

/// Binds the configured address and serves until the listener fails.
pub async fn run(config: ServeConfig) -> Result<()> {
	let listener = TcpListener::bind(config.listen)
		.await
		.with_context(|| format!("Failed to bind proxy server to {}", config.listen))?;
	serve(listener, Arc::new(config)).await
}

/// Serves clients on an already bound listener.
pub async fn serve(listener: TcpListener, config: Arc<ServeConfig>) -> Result<()> {
	let addr = listener.local_addr().context("reading listener address")?;
	info!(target = "clicker", %addr, browser = %config.browser.display(), "proxy listening");

	let app = Router::new()
		.route(
			"/",
			get(
				|ws: WebSocketUpgrade, State(config): State<Arc<ServeConfig>>| async move {
					ws.on_upgrade(move |socket| handle_client(socket, config))
				},
			),
		)
		.with_state(config);

	axum::serve(listener, app.into_make_service())
		.await
		.context("Proxy server error")
}

async fn handle_client(socket: WebSocket, config: Arc<ServeConfig>) {
	info!(target = "clicker", "client connected");
	match run_session(socket, &config).await {
		Ok(()) => info!(target = "clicker", "client session finished"),
		Err(err) => warn!(target = "clicker", error = %format!("{err:#}"), "client session failed"),
	}
}

async fn run_session(socket: WebSocket, config: &ServeConfig) -> Result<()> {
	let process = BrowserProcess::launch(&config.launch_config())
		.await
		.context("launching browser host")?;

	let browser = match WebSocketTransport::connect_with_retry(config.bidi_url.as_str(), config.connect_timeout).await {
		Ok(browser) => browser,
		Err(err) => {
			shutdown(&process, None).await;
			return Err(err).with_context(|| format!("connecting to {}", config.bidi_url));
		}
	};

	let (client_tx, client_rx) = mpsc::unbounded_channel::<Value>();
	let (router, mut reader) = clicker::Router::attach(browser, client_tx);

	let (mut ws_tx, mut ws_rx) = socket.split();
	let mut outgoing = UnboundedReceiverStream::new(client_rx);
	let send_task = tokio::spawn(async move {
		while let Some(frame) = outgoing.next().await {
			if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
				break;
			}
		}
	});

	loop {
		tokio::select! {
			msg = ws_rx.next() => match msg {
				Some(Ok(Message::Text(text))) => match serde_json::from_str::<Value>(text.as_str()) {
					Ok(frame) => {
						router.submit(frame);
					}
					Err(err) => warn!(target = "clicker", error = %err, "dropping malformed client frame"),
				},
				Some(Ok(Message::Close(_))) | None => {
					debug!(target = "clicker", "client closed the connection");
					break;
				}
				Some(Ok(_)) => {}
				Some(Err(err)) => {
					warn!(target = "clicker", error = %err, "client websocket error");
					break;
				}
			},
			_ = &mut reader => {
				info!(target = "clicker", "browser connection closed");
				break;
			}
		}
	}

	shutdown(&process, Some(router.session().connection())).await;
	send_task.abort();
	Ok(())
}
