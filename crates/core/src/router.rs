//! Command routing.
//!
//! The router owns both directions of a session:
//!
//! - client frames: `vibium:` commands run on their own task and answer with a
//!   success or error reply; anything else is written to the browser as is
//! - browser frames: responses to internal commands complete their waiters,
//!   monitor reports become `vibium:ws.*` events, everything else goes back to
//!   the client unchanged

use std::sync::Arc;
use std::time::Duration;

use clicker_protocol::{ClientCommand, ClientReply, Message, VOCABULARY_PREFIX};
use clicker_runtime::{Connection, INTERNAL_ID_BASE, TransportParts};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::query::ElementQuery;
use crate::session::Session;
use crate::wait::{WaitState, wait_for_function, wait_for_state};
use crate::{actions, resolver, state, websocket};

/// Routes traffic for one session.
#[derive(Debug, Clone)]
pub struct Router {
	session: Arc<Session>,
}

impl Router {
	/// Builds a session over `browser` and starts reading browser frames.
	///
	/// Frames for the client are written to `client`. The returned handle
	/// finishes when the browser side of the transport closes.
	pub fn attach(browser: TransportParts, client: mpsc::UnboundedSender<Value>) -> (Self, JoinHandle<()>) {
		let TransportParts { outbound, inbound } = browser;
		let connection = Arc::new(Connection::new(outbound));
		let session = Arc::new(Session::new(connection, client));
		let reader = tokio::spawn(pump_browser(Arc::clone(&session), inbound));
		(Self { session }, reader)
	}

	pub fn session(&self) -> &Arc<Session> {
		&self.session
	}

	/// Accepts one client frame.
	///
	/// Vocabulary commands are handled on a spawned task so a slow wait does
	/// not hold up later commands; the handle is returned for callers that
	/// want to join it.
	///
	/// Ids from [`INTERNAL_ID_BASE`] up belong to the proxy's own commands;
	/// frames using them are refused with an error reply.
	pub fn submit(&self, frame: Value) -> Option<JoinHandle<()>> {
		if let Some(id) = frame.get("id").and_then(Value::as_u64).filter(|id| *id >= INTERNAL_ID_BASE) {
			warn!(target = "clicker.router", id, "client used a reserved command id");
			self.session.reply(ClientReply::Error {
				id,
				error: "invalid argument".to_string(),
				message: format!("command id {id} is reserved for the proxy"),
			});
			return None;
		}

		let is_vocabulary = frame
			.get("method")
			.and_then(Value::as_str)
			.is_some_and(|method| method.starts_with(VOCABULARY_PREFIX));

		if !is_vocabulary {
			trace!(target = "clicker.router", "forwarding client frame");
			if let Err(err) = self.session.connection().forward(frame) {
				warn!(target = "clicker.router", error = %err, "browser gone; dropping client frame");
			}
			return None;
		}

		let command = match ClientCommand::deserialize(&frame) {
			Ok(command) => command,
			Err(err) => {
				match frame.get("id").and_then(Value::as_u64) {
					Some(id) => self.session.reply(ClientReply::Error {
						id,
						error: "invalid argument".to_string(),
						message: format!("malformed command: {err}"),
					}),
					None => warn!(target = "clicker.router", error = %err, "dropping malformed command without id"),
				}
				return None;
			}
		};

		let session = Arc::clone(&self.session);
		Some(tokio::spawn(clicker_runtime::guard(async move {
			let reply = execute(&session, &command).await;
			session.reply(reply);
		})))
	}
}

/// Runs one vocabulary command and builds its reply.
pub async fn execute(session: &Session, command: &ClientCommand) -> ClientReply {
	let op = command.vocabulary_method().unwrap_or(&command.method);
	debug!(target = "clicker.router", id = command.id, op, "handling command");

	match handle(session, op, &command.params).await {
		Ok(result) => ClientReply::Success {
			id: command.id,
			result,
		},
		Err(err) => {
			debug!(target = "clicker.router", id = command.id, op, error = %err, "command failed");
			ClientReply::Error {
				id: command.id,
				error: err.kind().to_string(),
				message: format!("{op}: {err}"),
			}
		}
	}
}

async fn handle(session: &Session, op: &str, params: &Map<String, Value>) -> Result<Value> {
	match op {
		"keyboard.press" => {
			let key = input_str(params, "key");
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::press(&context, key)).await?;
			Ok(json!({"pressed": true}))
		}
		"keyboard.down" => {
			let key = input_str(params, "key");
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::key_down(&context, key)).await?;
			Ok(json!({"pressed": true}))
		}
		"keyboard.up" => {
			let key = input_str(params, "key");
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::key_up(&context, key)).await?;
			Ok(json!({"released": true}))
		}
		"keyboard.type" => {
			let text = input_str(params, "text");
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::type_text(&context, text)).await?;
			Ok(json!({"typed": true}))
		}
		"mouse.click" => {
			let (x, y) = point(params);
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::click(&context, x, y)).await?;
			Ok(json!({"clicked": true}))
		}
		"mouse.move" => {
			let (x, y) = point(params);
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::mouse_move(&context, x, y)).await?;
			Ok(json!({"moved": true}))
		}
		"mouse.down" => {
			let button = button(params);
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::mouse_down(&context, button)).await?;
			Ok(json!({"pressed": true}))
		}
		"mouse.up" => {
			let button = button(params);
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::mouse_up(&context, button)).await?;
			Ok(json!({"released": true}))
		}
		"mouse.wheel" => {
			let (x, y) = point(params);
			let delta_x = input_f64(params, "deltaX");
			let delta_y = input_f64(params, "deltaY");
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::wheel(&context, x, y, delta_x, delta_y)).await?;
			Ok(json!({"scrolled": true}))
		}
		"touch.tap" => {
			let (x, y) = point(params);
			let context = session.resolve_context(params).await?;
			actions::perform(session, &actions::tap(&context, x, y)).await?;
			Ok(json!({"tapped": true}))
		}

		"el.text" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"text": state::text(session, &context, &query).await?}))
		}
		"el.innerText" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"text": state::inner_text(session, &context, &query).await?}))
		}
		"el.html" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"html": state::html(session, &context, &query).await?}))
		}
		"el.value" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"value": state::value(session, &context, &query).await?}))
		}
		"el.attr" => {
			let name = required_str(params, "name")?;
			let (context, query) = element(session, params).await?;
			Ok(json!({"value": state::attribute(session, &context, &query, name).await?}))
		}
		"el.bounds" => {
			let (context, query) = element(session, params).await?;
			Ok(serde_json::to_value(state::bounds(session, &context, &query).await?)
				.map_err(|e| Error::Decode(e.to_string()))?)
		}
		"el.isVisible" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"visible": state::is_visible(session, &context, &query).await?}))
		}
		"el.isHidden" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"hidden": state::is_hidden(session, &context, &query).await?}))
		}
		"el.isEnabled" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"enabled": state::is_enabled(session, &context, &query).await?}))
		}
		"el.isChecked" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"checked": state::is_checked(session, &context, &query).await?}))
		}
		"el.isEditable" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"editable": state::is_editable(session, &context, &query).await?}))
		}
		"el.eval" => {
			let function = required_str(params, "fn")?;
			let (context, query) = element(session, params).await?;
			Ok(json!({"value": state::eval(session, &context, &query, function).await?}))
		}
		"el.screenshot" => {
			let (context, query) = element(session, params).await?;
			Ok(json!({"data": state::screenshot(session, &context, &query).await?}))
		}
		"el.waitFor" => {
			let wait_state = WaitState::parse(optional_str(params, "state")?)?;
			let (context, query) = element(session, params).await?;
			wait_for_state(session, &context, &query, wait_state).await?;
			Ok(json!({"state": wait_state.as_str()}))
		}

		"page.waitFor" => {
			let (context, query) = element(session, params).await?;
			let info = resolver::resolve(session, &context, &query).await?;
			serde_json::to_value(info).map_err(|e| Error::Decode(e.to_string()))
		}
		"page.wait" => {
			let ms = optional_f64(params, "ms")?.unwrap_or(0.0);
			if ms > 0.0 {
				tokio::time::sleep(Duration::from_millis(ms as u64)).await;
			}
			Ok(json!({"waited": true}))
		}
		"page.waitForFunction" => {
			let function = required_str(params, "fn")?;
			let timeout = optional_f64(params, "timeout")?
				.filter(|ms| *ms > 0.0)
				.map_or(crate::DEFAULT_TIMEOUT, |ms| Duration::from_millis(ms as u64));
			let context = session.resolve_context(params).await?;
			let value = wait_for_function(session, &context, function, timeout).await?;
			Ok(json!({"value": value}))
		}
		"page.onWebSocket" => {
			let context = session.resolve_context(params).await?;
			websocket::on_websocket(session, &context).await?;
			Ok(json!({}))
		}

		#[cfg(test)]
		"test.panic" => panic!("handler bug"),

		other => Err(Error::UnknownMethod(other.to_string())),
	}
}

/// Query parameters are validated before any browser traffic.
async fn element(session: &Session, params: &Map<String, Value>) -> Result<(String, ElementQuery)> {
	let query = ElementQuery::from_params(params)?;
	let context = session.resolve_context(params).await?;
	Ok((context, query))
}

fn optional_str<'a>(params: &'a Map<String, Value>, name: &str) -> Result<Option<&'a str>> {
	match params.get(name) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(s)),
		Some(other) => Err(Error::Parameter(format!("{name} must be a string, got {other}"))),
	}
}

fn required_str<'a>(params: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
	optional_str(params, name)?.ok_or_else(|| Error::Parameter(format!("missing {name}")))
}

fn optional_f64(params: &Map<String, Value>, name: &str) -> Result<Option<f64>> {
	match params.get(name) {
		None | Some(Value::Null) => Ok(None),
		Some(value) => value
			.as_f64()
			.map(Some)
			.ok_or_else(|| Error::Parameter(format!("{name} must be a number, got {value}"))),
	}
}

// Input parameters are lenient: missing or mistyped values become 0 or "".

fn input_str<'a>(params: &'a Map<String, Value>, name: &str) -> &'a str {
	params.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn input_f64(params: &Map<String, Value>, name: &str) -> f64 {
	params.get(name).and_then(Value::as_f64).unwrap_or(0.0)
}

fn point(params: &Map<String, Value>) -> (f64, f64) {
	(input_f64(params, "x"), input_f64(params, "y"))
}

fn button(params: &Map<String, Value>) -> u32 {
	match params.get("button").and_then(Value::as_f64) {
		Some(b) if (0.0..=f64::from(u32::MAX)).contains(&b) => b as u32,
		_ => 0,
	}
}

/// Reads browser frames until the transport closes.
async fn pump_browser(session: Arc<Session>, mut inbound: mpsc::UnboundedReceiver<Value>) {
	while let Some(frame) = inbound.recv().await {
		let message = match Message::deserialize(&frame) {
			Ok(message) => message,
			Err(err) => {
				debug!(target = "clicker.router", error = %err, "unparsed browser frame; forwarding");
				session.send_to_client(frame);
				continue;
			}
		};

		match session.connection().dispatch(message) {
			None => {}
			Some(Message::Event(event)) => {
				if !websocket::claim(&session, &event) {
					session.send_to_client(frame);
				}
			}
			Some(_) => session.send_to_client(frame),
		}
	}

	debug!(target = "clicker.router", "browser transport closed");
	session.connection().close();
}
