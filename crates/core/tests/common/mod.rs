//! In-memory fake browser for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use clicker::Router;
use clicker_runtime::TransportParts;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// What the fake browser answers to one command.
pub enum Reply {
	Result(Value),
	Error(&'static str, &'static str),
	/// Never answer.
	Silent,
	/// Close the browser side of the transport.
	Hangup,
}

pub struct Harness {
	pub router: Router,
	client: mpsc::UnboundedReceiver<Value>,
	browser_tx: Option<mpsc::UnboundedSender<Value>>,
	log: Arc<Mutex<Vec<Value>>>,
	backlog: Vec<Value>,
}

impl Harness {
	/// Starts a session whose browser answers with `respond`.
	pub fn start<F>(mut respond: F) -> Self
	where
		F: FnMut(&Value) -> Reply + Send + 'static,
	{
		let (proxy_side, browser_side) = TransportParts::in_memory();
		let (client_tx, client) = mpsc::unbounded_channel();
		let (router, _reader) = Router::attach(proxy_side, client_tx);

		let log = Arc::new(Mutex::new(Vec::new()));
		let browser_tx = Some(browser_side.outbound.clone());

		let seen = Arc::clone(&log);
		let TransportParts {
			outbound,
			mut inbound,
		} = browser_side;
		tokio::spawn(async move {
			while let Some(command) = inbound.recv().await {
				seen.lock().push(command.clone());
				let frame = match respond(&command) {
					Reply::Result(result) => json!({"type": "success", "id": command["id"], "result": result}),
					Reply::Error(error, message) => json!({
						"type": "error", "id": command["id"], "error": error, "message": message
					}),
					Reply::Silent => continue,
					Reply::Hangup => break,
				};
				if outbound.send(frame).is_err() {
					break;
				}
			}
		});

		Self {
			router,
			client,
			browser_tx,
			log,
			backlog: Vec::new(),
		}
	}

	/// Sends a client command and waits for the reply with the same id.
	pub async fn call(&mut self, id: u64, method: &str, params: Value) -> Value {
		self.router.submit(json!({"id": id, "method": method, "params": params}));
		self.reply(id).await
	}

	/// Waits for the reply to `id`; unrelated frames are kept for
	/// [`Harness::next_frame`].
	pub async fn reply(&mut self, id: u64) -> Value {
		if let Some(pos) = self.backlog.iter().position(|f| is_reply_to(f, id)) {
			return self.backlog.remove(pos);
		}
		loop {
			let frame = self.client.recv().await.expect("client channel closed");
			if is_reply_to(&frame, id) {
				return frame;
			}
			self.backlog.push(frame);
		}
	}

	/// Next frame delivered to the client, in arrival order.
	pub async fn next_frame(&mut self) -> Value {
		if !self.backlog.is_empty() {
			return self.backlog.remove(0);
		}
		self.client.recv().await.expect("client channel closed")
	}

	/// Pushes a frame from the browser to the proxy.
	pub fn push(&self, frame: Value) {
		let browser = self.browser_tx.as_ref().expect("browser released");
		browser.send(frame).expect("proxy gone");
	}

	/// Drops the harness's handle on the browser side, so a [`Reply::Hangup`]
	/// closes the transport for real.
	pub fn release_browser(&mut self) {
		self.browser_tx = None;
	}

	/// Every command the browser received, in order.
	pub fn commands(&self) -> Vec<Value> {
		self.log.lock().clone()
	}

	/// Commands the browser received for `method`.
	pub fn sent(&self, method: &str) -> Vec<Value> {
		self.log.lock().iter().filter(|c| c["method"] == method).cloned().collect()
	}
}

fn is_reply_to(frame: &Value, id: u64) -> bool {
	frame.get("id").and_then(Value::as_u64) == Some(id) && frame.get("type").is_some()
}

/// `functionDeclaration` of a `script.callFunction` command.
pub fn declaration(command: &Value) -> &str {
	command["params"]["functionDeclaration"].as_str().unwrap_or_default()
}

/// Successful call result holding a string.
pub fn string_result(value: &str) -> Value {
	json!({"type": "success", "result": {"type": "string", "value": value}, "realm": "realm-1"})
}

pub fn remote_result(result: Value) -> Value {
	json!({"type": "success", "result": result, "realm": "realm-1"})
}

pub fn exception_result(text: &str) -> Value {
	json!({
		"type": "exception",
		"exceptionDetails": {"text": text, "lineNumber": 0, "columnNumber": 0},
		"realm": "realm-1"
	})
}

/// Find-script answer for a present element.
pub fn found(tag: &str, text: &str, x: f64, y: f64, width: f64, height: f64) -> Value {
	let info = json!({"tag": tag, "text": text, "box": {"x": x, "y": y, "width": width, "height": height}});
	string_result(&info.to_string())
}

pub fn not_found() -> Value {
	string_result(r#"{"error":"element not found"}"#)
}

pub fn tree(contexts: &[&str]) -> Value {
	let contexts: Vec<Value> = contexts
		.iter()
		.map(|c| json!({"context": c, "url": "about:blank", "children": null}))
		.collect();
	json!({"contexts": contexts})
}
