//! Page WebSocket monitoring.
//!
//! A monitor script wraps `window.WebSocket` in the page and reports socket
//! activity through a BiDi channel argument. The browser delivers each report
//! as a `script.message` event on [`WS_CHANNEL`]; [`claim`] turns those into
//! `vibium:ws.*` client events.

use clicker_protocol::{
	AddPreloadScript, AddPreloadScriptResult, CallFunction, ClientEvent, EvaluateResult, Event, LocalValue,
	ScriptMessage, Subscribe,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::error::Result;
use crate::script::success_value;
use crate::session::Session;

/// Channel name the monitor reports on.
pub const WS_CHANNEL: &str = "vibium-ws";

/// Wraps `window.WebSocket`; takes the channel function as its argument.
///
/// Installing twice in one realm is a no-op.
pub const WS_MONITOR_SCRIPT: &str = r#"(channel) => {
	if (window.__vibiumWsMonitor) return;
	window.__vibiumWsMonitor = true;
	const OrigWS = window.WebSocket;
	let nextId = 1;
	const render = (data) => typeof data === 'string' ? data : '[binary]';

	window.WebSocket = function(url, protocols) {
		const id = nextId++;
		const urlStr = typeof url === 'string' ? url : url.toString();
		const ws = protocols !== undefined ? new OrigWS(url, protocols) : new OrigWS(url);

		channel(JSON.stringify({type: 'created', id, url: urlStr}));
		ws.addEventListener('open', () => channel(JSON.stringify({type: 'open', id})));
		ws.addEventListener('message', (e) => {
			channel(JSON.stringify({type: 'message', id, data: render(e.data), direction: 'received'}));
		});
		ws.addEventListener('close', (e) => {
			channel(JSON.stringify({type: 'close', id, code: e.code, reason: e.reason}));
		});
		ws.addEventListener('error', () => channel(JSON.stringify({type: 'error', id})));

		const send = ws.send.bind(ws);
		ws.send = function(data) {
			channel(JSON.stringify({type: 'message', id, data: render(data), direction: 'sent'}));
			return send(data);
		};
		return ws;
	};

	window.WebSocket.CONNECTING = 0;
	window.WebSocket.OPEN = 1;
	window.WebSocket.CLOSING = 2;
	window.WebSocket.CLOSED = 3;
	window.WebSocket.prototype = OrigWS.prototype;
}"#;

fn channel_arg() -> Vec<LocalValue> {
	vec![LocalValue::channel(WS_CHANNEL)]
}

/// Starts WebSocket monitoring for `context`.
///
/// Subscribes to `script.message` and installs the monitor preload script,
/// each at most once per session, then injects the monitor into the page that
/// is already loaded (preload scripts only run on later navigations).
pub async fn on_websocket(session: &Session, context: &str) -> Result<()> {
	session
		.subscription()
		.get_or_try_init(move || async move {
			let subscribe = Subscribe {
				events: vec!["script.message".to_string()],
			};
			session.call::<_, Value>("session.subscribe", &subscribe).await?;
			debug!(target = "clicker.websocket", "subscribed to script.message");
			Ok::<_, crate::Error>(())
		})
		.await?;

	session
		.monitor()
		.get_or_try_init(move || async move {
			let preload = AddPreloadScript {
				function_declaration: WS_MONITOR_SCRIPT.to_string(),
				arguments: channel_arg(),
				contexts: Some(vec![context.to_string()]),
			};
			let installed: AddPreloadScriptResult = session.call("script.addPreloadScript", &preload).await?;
			info!(target = "clicker.websocket", script = %installed.script, context, "websocket monitor installed");
			Ok::<_, crate::Error>(installed.script)
		})
		.await?;

	let inject = CallFunction {
		result_ownership: None,
		..CallFunction::new(WS_MONITOR_SCRIPT, context, channel_arg())
	};
	let result: EvaluateResult = session.call("script.callFunction", &inject).await?;
	success_value(result)?;
	Ok(())
}

/// Outcome of offering a browser event to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
	/// Not a monitor report; forward it unchanged.
	Unclaimed,
	/// A monitor report with nothing to emit.
	Dropped,
	/// A monitor report to emit.
	Event(ClientEvent),
}

/// Translates a `script.message` event from the monitor channel.
pub fn translate(event: &Event) -> Translation {
	if event.method != "script.message" {
		return Translation::Unclaimed;
	}
	let Ok(message) = ScriptMessage::deserialize(&event.params) else {
		return Translation::Unclaimed;
	};
	if message.channel != WS_CHANNEL {
		return Translation::Unclaimed;
	}
	let Some(payload) = message.data.as_str() else {
		return Translation::Unclaimed;
	};

	let report: Map<String, Value> = match serde_json::from_str(payload) {
		Ok(report) => report,
		Err(e) => {
			debug!(target = "clicker.websocket", error = %e, "dropping malformed monitor report");
			return Translation::Dropped;
		}
	};

	let mut params = Map::new();
	params.insert("context".into(), json!(message.source.context.unwrap_or_default()));
	if let Some(id) = report.get("id").and_then(Value::as_f64) {
		params.insert("id".into(), json!(id as i64));
	}
	let text = |key: &str| json!(report.get(key).and_then(Value::as_str).unwrap_or_default());

	let method = match report.get("type").and_then(Value::as_str) {
		Some("created") => {
			params.insert("url".into(), text("url"));
			"vibium:ws.created"
		}
		Some("open") => "vibium:ws.open",
		Some("message") => {
			params.insert("data".into(), text("data"));
			params.insert("direction".into(), text("direction"));
			"vibium:ws.message"
		}
		Some("close") => {
			if let Some(code) = report.get("code").and_then(Value::as_f64) {
				params.insert("code".into(), json!(code as i64));
			}
			params.insert("reason".into(), text("reason"));
			"vibium:ws.closed"
		}
		Some("error") => "vibium:ws.error",
		other => {
			debug!(target = "clicker.websocket", kind = ?other, "dropping unknown monitor report");
			return Translation::Dropped;
		}
	};

	Translation::Event(ClientEvent {
		method: method.to_string(),
		params: Value::Object(params),
	})
}

/// Offers `event` to the bridge; returns whether it was consumed.
///
/// Nothing is claimed before the session subscribed to `script.message`.
pub fn claim(session: &Session, event: &Event) -> bool {
	if !session.is_subscribed() {
		return false;
	}
	match translate(event) {
		Translation::Unclaimed => false,
		Translation::Dropped => true,
		Translation::Event(client_event) => {
			session.emit(client_event);
			true
		}
	}
}
