//! End-to-end proxy test: a real client socket, the axum server, a stand-in
//! browser host process and a fake BiDi endpoint.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use clicker_cli::config::ServeConfig;
use clicker_cli::server;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Accepts one BiDi connection and answers every command with an empty
/// success, except `session.status`. Received methods are reported on the
/// returned channel.
async fn fake_bidi_endpoint() -> (String, mpsc::UnboundedReceiver<String>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let url = format!("ws://{}/session", listener.local_addr().unwrap());
	let (seen_tx, seen_rx) = mpsc::unbounded_channel();

	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		while let Some(Ok(Message::Text(text))) = ws.next().await {
			let command: Value = serde_json::from_str(&text).unwrap();
			let method = command["method"].as_str().unwrap_or_default().to_string();
			let result = match method.as_str() {
				"session.status" => json!({"ready": true, "message": "fake"}),
				_ => json!({}),
			};
			let _ = seen_tx.send(method);
			let reply = json!({"type": "success", "id": command["id"], "result": result});
			if ws.send(Message::Text(reply.to_string())).await.is_err() {
				break;
			}
		}
	});

	(url, seen_rx)
}

async fn next_json<S>(client: &mut S) -> Value
where
	S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
	loop {
		match tokio::time::timeout(Duration::from_secs(5), client.next()).await {
			Ok(Some(Ok(Message::Text(text)))) => return serde_json::from_str(&text).unwrap(),
			Ok(Some(Ok(_))) => continue,
			other => panic!("no frame from proxy: {other:?}"),
		}
	}
}

#[tokio::test]
async fn proxies_one_client_end_to_end() {
	let (bidi_url, mut seen) = fake_bidi_endpoint().await;

	let config = ServeConfig {
		listen: "127.0.0.1:0".parse().unwrap(),
		browser: which::which("sleep").unwrap(),
		browser_args: vec!["30".to_string()],
		bidi_url: bidi_url.parse().unwrap(),
		headless: false,
		connect_timeout: Duration::from_secs(5),
	};
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let proxy_addr = listener.local_addr().unwrap();
	tokio::spawn(server::serve(listener, Arc::new(config)));

	let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{proxy_addr}/")).await.unwrap();

	let click = json!({"id": 1, "method": "vibium:mouse.click", "params": {"x": 4, "y": 8, "context": "ctx"}});
	client.send(Message::Text(click.to_string())).await.unwrap();
	assert_eq!(
		next_json(&mut client).await,
		json!({"type": "success", "id": 1, "result": {"clicked": true}})
	);
	assert_eq!(seen.recv().await.unwrap(), "input.performActions");

	let status = json!({"id": 2, "method": "session.status", "params": {}});
	client.send(Message::Text(status.to_string())).await.unwrap();
	assert_eq!(
		next_json(&mut client).await,
		json!({"type": "success", "id": 2, "result": {"ready": true, "message": "fake"}})
	);
	assert_eq!(seen.recv().await.unwrap(), "session.status");

	client.close(None).await.unwrap();

	let closed = tokio::time::timeout(Duration::from_secs(5), seen.recv()).await.unwrap();
	assert_eq!(closed.as_deref(), Some("browser.close"));

	// The session kills its browser host once shutdown finishes.
	let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
	while !clicker_runtime::registry().is_empty() {
		assert!(tokio::time::Instant::now() < deadline, "browser host still registered");
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
}
