//! Page scripts used to inspect elements, and decoders for their results.
//!
//! Every element script takes `(scope, selector, index, hasIndex)` and locates
//! the element the same way. What it reports when the lookup fails, and how
//! it encodes the answer, depends on the template's result shape:
//!
//! | template       | found                  | missing                           |
//! |----------------|------------------------|-----------------------------------|
//! | `TextExtract`  | string                 | `null`                            |
//! | `BoolCheck`    | `"true"` / `"false"`   | `"error:<reason>"`                |
//! | `JsonExtract`  | `'{"value": ...}'`     | `'{"error": "<reason>"}'`         |
//!
//! `Eval` and `Attribute` use the JSON shape and take a fifth argument.

use clicker_protocol::{EvaluateResult, RemoteValue};
use serde_json::Value;

use crate::error::{Error, Result};

/// Locates `el`; `$MISS_ROOT` and `$MISS_EL` are replaced per shape.
const LOCATE: &str = "
	const root = scope ? document.querySelector(scope) : document;
	if (!root) return $MISS_ROOT;
	const el = hasIndex ? root.querySelectorAll(selector)[index] : root.querySelector(selector);
	if (!el) return $MISS_EL;";

/// Find script for element resolution. Scrolls the element into view and
/// reports its tag, trimmed text and bounding box.
pub const FIND_SCRIPT: &str = "(scope, selector, index, hasIndex) => {
	const root = scope ? document.querySelector(scope) : document;
	if (!root) return JSON.stringify({error: 'root not found'});
	const el = hasIndex ? root.querySelectorAll(selector)[index] : root.querySelector(selector);
	if (!el) return JSON.stringify({error: 'element not found'});
	el.scrollIntoView({block: 'center', inline: 'center', behavior: 'instant'});
	const rect = el.getBoundingClientRect();
	return JSON.stringify({
		tag: el.tagName.toLowerCase(),
		text: (el.textContent || '').trim(),
		box: {x: rect.x, y: rect.y, width: rect.width, height: rect.height},
	});
}";

/// Visibility check body for [`ScriptTemplate::BoolCheck`].
pub const VISIBLE_CHECK: &str = "
		const style = window.getComputedStyle(el);
		if (style.display === 'none') return false;
		if (style.visibility === 'hidden') return false;
		if (parseFloat(style.opacity) === 0) return false;
		const rect = el.getBoundingClientRect();
		return rect.width > 0 && rect.height > 0;";

/// Exact inverse of [`VISIBLE_CHECK`].
pub const HIDDEN_CHECK: &str = "
		const style = window.getComputedStyle(el);
		if (style.display === 'none') return true;
		if (style.visibility === 'hidden') return true;
		if (parseFloat(style.opacity) === 0) return true;
		const rect = el.getBoundingClientRect();
		return rect.width === 0 || rect.height === 0;";

/// Element script templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTemplate<'a> {
	/// Evaluates an expression over `el` that yields a string.
	TextExtract(&'a str),
	/// Runs a function body over `el`; its truthiness is the answer.
	BoolCheck(&'a str),
	/// Runs a function body over `el` that returns `JSON.stringify({value})`.
	JsonExtract(&'a str),
	/// Runs user code `new Function('el', fn)`; fifth argument is `fn`.
	Eval,
	/// Reads `el.getAttribute(name)`; fifth argument is `name`.
	Attribute,
}

impl ScriptTemplate<'_> {
	/// Renders the function declaration sent as `functionDeclaration`.
	pub fn render(&self) -> String {
		match self {
			Self::TextExtract(expr) => {
				format!("(scope, selector, index, hasIndex) => {{{}\n\treturn {expr};\n}}", locate("null", "null"))
			}
			Self::BoolCheck(body) => format!(
				"(scope, selector, index, hasIndex) => {{{}\n\tconst check = (el) => {{{body}\n\t}};\n\treturn check(el) ? 'true' : 'false';\n}}",
				locate("'error:root not found'", "'error:element not found'")
			),
			Self::JsonExtract(body) => {
				format!("(scope, selector, index, hasIndex) => {{{}{body}\n}}", json_locate())
			}
			Self::Eval => format!(
				"(scope, selector, index, hasIndex, fn) => {{{}\n\tconst userFn = new Function('el', fn);\n\treturn JSON.stringify({{value: userFn(el)}});\n}}",
				json_locate()
			),
			Self::Attribute => format!(
				"(scope, selector, index, hasIndex, name) => {{{}\n\treturn JSON.stringify({{value: el.getAttribute(name)}});\n}}",
				json_locate()
			),
		}
	}
}

fn locate(miss_root: &str, miss_el: &str) -> String {
	LOCATE.replace("$MISS_ROOT", miss_root).replace("$MISS_EL", miss_el)
}

fn json_locate() -> String {
	locate("JSON.stringify({error: 'root not found'})", "JSON.stringify({error: 'element not found'})")
}

/// Unwraps a call result, turning a thrown exception into [`Error::Script`].
pub fn success_value(result: EvaluateResult) -> Result<RemoteValue> {
	match result {
		EvaluateResult::Success { result } => Ok(result),
		EvaluateResult::Exception { exception_details } => Err(Error::Script(exception_details.text)),
	}
}

/// Decodes the [`ScriptTemplate::TextExtract`] shape.
pub fn decode_text(result: EvaluateResult) -> Result<String> {
	let value = success_value(result)?;
	if value.is_nullish() {
		return Err(Error::element_not_found());
	}
	value
		.as_str()
		.map(str::to_string)
		.ok_or_else(|| Error::Decode(format!("expected string result, got {}", value.kind)))
}

/// Decodes the [`ScriptTemplate::BoolCheck`] shape.
pub fn decode_bool(result: EvaluateResult) -> Result<bool> {
	let value = success_value(result)?;
	match value.as_str() {
		Some("true") => Ok(true),
		Some("false") => Ok(false),
		Some(other) => match other.strip_prefix("error:") {
			Some(message) => Err(Error::from_script_message(message)),
			None => Err(Error::Decode(format!("unexpected check result: {other:?}"))),
		},
		None => Err(Error::Decode(format!("expected string result, got {}", value.kind))),
	}
}

/// Decodes the JSON shape shared by [`ScriptTemplate::JsonExtract`],
/// [`ScriptTemplate::Eval`] and [`ScriptTemplate::Attribute`].
///
/// `{"value": null}` and a missing `value` (JavaScript `undefined`) both
/// decode to `Value::Null`.
pub fn decode_json(result: EvaluateResult) -> Result<Value> {
	let value = success_value(result)?;
	let text = value
		.as_str()
		.ok_or_else(|| Error::Decode(format!("expected string result, got {}", value.kind)))?;
	let parsed: Value =
		serde_json::from_str(text).map_err(|e| Error::Decode(format!("invalid JSON from page: {e}")))?;
	let Value::Object(mut object) = parsed else {
		return Err(Error::Decode(format!("expected JSON object from page, got {text}")));
	};
	if let Some(error) = object.get("error").and_then(Value::as_str) {
		return Err(Error::from_script_message(error));
	}
	Ok(object.remove("value").unwrap_or(Value::Null))
}
