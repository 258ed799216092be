//! WebDriver BiDi message shapes.
//!
//! Only the commands and events the proxy issues or inspects are modelled;
//! everything else travels through as raw [`serde_json::Value`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command frame sent to the browser host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
	/// Correlation id, echoed back in the matching [`Response`].
	pub id: u64,
	/// BiDi method, e.g. `script.callFunction`.
	pub method: String,
	/// Method parameters as a JSON object.
	pub params: Value,
}

/// Response frame for a previously sent [`Command`].
///
/// Success frames carry `result`; error frames carry `error`, `message` and
/// usually `stacktrace`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u64,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// BiDi error code such as `no such frame` or `unknown command`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stacktrace: Option<String>,
}

impl Response {
	/// Returns true when the frame reports a protocol-level error.
	pub fn is_error(&self) -> bool {
		self.error.is_some() || self.kind.as_deref() == Some("error")
	}
}

/// Unsolicited event frame pushed by the browser host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

/// Discriminated union of inbound frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response frame (has a numeric `id`)
	Response(Response),
	/// Event frame (has `method`, no `id`)
	Event(Event),
	/// Anything else, e.g. an error frame with `id: null`
	Unknown(Value),
}

/// Typed encoding of a JavaScript value returned by the script module.
///
/// Kept loosely typed: `value` is whatever JSON the host sent for the given
/// `type`, and is absent for `null` and `undefined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteValue {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
}

impl RemoteValue {
	/// Returns the string payload when this is a `string` remote value.
	pub fn as_str(&self) -> Option<&str> {
		if self.kind != "string" {
			return None;
		}
		self.value.as_ref().and_then(Value::as_str)
	}

	/// Returns true for `null` and `undefined`.
	pub fn is_nullish(&self) -> bool {
		matches!(self.kind.as_str(), "null" | "undefined")
	}
}

/// Argument passed to `script.callFunction` / `script.addPreloadScript`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LocalValue {
	String(String),
	Number(f64),
	Boolean(bool),
	/// A channel function; calling it from page code emits `script.message`.
	Channel(ChannelProperties),
}

impl LocalValue {
	pub fn string(value: impl Into<String>) -> Self {
		Self::String(value.into())
	}

	pub fn channel(name: impl Into<String>) -> Self {
		Self::Channel(ChannelProperties { channel: name.into() })
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProperties {
	pub channel: String,
}

/// Script target addressing a browsing context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
	pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOwnership {
	Root,
	None,
}

/// Parameters for `script.callFunction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunction {
	pub function_declaration: String,
	pub target: Target,
	#[serde(default)]
	pub arguments: Vec<LocalValue>,
	pub await_promise: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result_ownership: Option<ResultOwnership>,
}

impl CallFunction {
	/// Call `declaration` in `context` with the given arguments, not awaiting
	/// promises and taking root ownership of the result.
	pub fn new(declaration: impl Into<String>, context: impl Into<String>, arguments: Vec<LocalValue>) -> Self {
		Self {
			function_declaration: declaration.into(),
			target: Target {
				context: context.into(),
			},
			arguments,
			await_promise: false,
			result_ownership: Some(ResultOwnership::Root),
		}
	}

	pub fn awaiting(mut self) -> Self {
		self.await_promise = true;
		self
	}
}

/// Result of `script.callFunction` / `script.evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EvaluateResult {
	Success {
		result: RemoteValue,
	},
	Exception {
		#[serde(rename = "exceptionDetails")]
		exception_details: ExceptionDetails,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionDetails {
	#[serde(default)]
	pub text: String,
}

/// Parameters for `script.addPreloadScript`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPreloadScript {
	pub function_declaration: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub arguments: Vec<LocalValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contexts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPreloadScriptResult {
	/// Preload script id, usable with `script.removePreloadScript`.
	pub script: String,
}

/// Parameters for `session.subscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscribe {
	pub events: Vec<String>,
}

/// Parameters for `browsingContext.captureScreenshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureScreenshot {
	pub context: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub clip: Option<ClipRectangle>,
}

/// Screenshot clip region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipRectangle {
	Box { x: f64, y: f64, width: f64, height: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureScreenshotResult {
	/// Base64 encoded PNG.
	pub data: String,
}

/// Parameters for `browsingContext.getTree`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTree {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_depth: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTreeResult {
	pub contexts: Vec<BrowsingContextInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowsingContextInfo {
	pub context: String,
	#[serde(default)]
	pub url: String,
}

/// Parameters of the `script.message` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptMessage {
	pub channel: String,
	pub data: RemoteValue,
	pub source: Source,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Source {
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default)]
	pub realm: Option<String>,
}
