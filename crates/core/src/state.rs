//! Element state queries.
//!
//! Each query runs one element script against a fresh lookup; none of them
//! wait for the element except [`screenshot`], which needs a box to clip to.

use clicker_protocol::{
	CallFunction, CaptureScreenshot, CaptureScreenshotResult, ClipRectangle, EvaluateResult, LocalValue,
};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::query::{BoundingBox, ElementQuery};
use crate::resolver::resolve;
use crate::script::{HIDDEN_CHECK, ScriptTemplate, VISIBLE_CHECK, decode_bool, decode_json, decode_text};
use crate::session::Session;

const BOUNDS_BODY: &str = "
	const rect = el.getBoundingClientRect();
	return JSON.stringify({value: {x: rect.x, y: rect.y, width: rect.width, height: rect.height}});";

async fn run(
	session: &Session,
	context: &str,
	query: &ElementQuery,
	template: ScriptTemplate<'_>,
	extra: Option<LocalValue>,
) -> Result<EvaluateResult> {
	let mut arguments = query.script_args();
	arguments.extend(extra);
	let call = CallFunction::new(template.render(), context, arguments);
	session.call("script.callFunction", &call).await
}

/// Runs a [`ScriptTemplate::BoolCheck`] body.
pub(crate) async fn check(
	session: &Session,
	context: &str,
	query: &ElementQuery,
	template: ScriptTemplate<'_>,
) -> Result<bool> {
	decode_bool(run(session, context, query, template, None).await?)
}

async fn extract_text(session: &Session, context: &str, query: &ElementQuery, expr: &str) -> Result<String> {
	decode_text(run(session, context, query, ScriptTemplate::TextExtract(expr), None).await?)
}

/// `textContent`, trimmed.
pub async fn text(session: &Session, context: &str, query: &ElementQuery) -> Result<String> {
	extract_text(session, context, query, "(el.textContent || '').trim()").await
}

/// `innerText`, trimmed.
pub async fn inner_text(session: &Session, context: &str, query: &ElementQuery) -> Result<String> {
	extract_text(session, context, query, "(el.innerText || '').trim()").await
}

pub async fn html(session: &Session, context: &str, query: &ElementQuery) -> Result<String> {
	extract_text(session, context, query, "el.innerHTML").await
}

/// Form control value; empty for elements without one.
pub async fn value(session: &Session, context: &str, query: &ElementQuery) -> Result<String> {
	extract_text(session, context, query, "el.value || ''").await
}

/// Attribute value, `None` when the attribute is absent.
pub async fn attribute(session: &Session, context: &str, query: &ElementQuery, name: &str) -> Result<Option<String>> {
	let result = run(session, context, query, ScriptTemplate::Attribute, Some(LocalValue::string(name))).await?;
	match decode_json(result)? {
		Value::Null => Ok(None),
		Value::String(s) => Ok(Some(s)),
		other => Err(Error::Decode(format!("attribute value is not a string: {other}"))),
	}
}

pub async fn bounds(session: &Session, context: &str, query: &ElementQuery) -> Result<BoundingBox> {
	let result = run(session, context, query, ScriptTemplate::JsonExtract(BOUNDS_BODY), None).await?;
	serde_json::from_value(decode_json(result)?).map_err(|e| Error::Decode(format!("invalid bounds: {e}")))
}

/// Computed visibility: displayed, not `visibility: hidden`, non-zero
/// opacity and a non-empty box.
pub async fn is_visible(session: &Session, context: &str, query: &ElementQuery) -> Result<bool> {
	check(session, context, query, ScriptTemplate::BoolCheck(VISIBLE_CHECK)).await
}

/// Exact complement of [`is_visible`] for an element that exists.
pub async fn is_hidden(session: &Session, context: &str, query: &ElementQuery) -> Result<bool> {
	check(session, context, query, ScriptTemplate::BoolCheck(HIDDEN_CHECK)).await
}

pub async fn is_enabled(session: &Session, context: &str, query: &ElementQuery) -> Result<bool> {
	check(session, context, query, ScriptTemplate::BoolCheck("return !el.disabled;")).await
}

pub async fn is_checked(session: &Session, context: &str, query: &ElementQuery) -> Result<bool> {
	check(session, context, query, ScriptTemplate::BoolCheck("return !!el.checked;")).await
}

pub async fn is_editable(session: &Session, context: &str, query: &ElementQuery) -> Result<bool> {
	check(session, context, query, ScriptTemplate::BoolCheck("return !el.disabled && !el.readOnly;")).await
}

/// Runs `function` as the body of `new Function('el', function)`.
///
/// The return value travels through `JSON.stringify`, so it must be
/// JSON-representable; `undefined` comes back as `null`.
pub async fn eval(session: &Session, context: &str, query: &ElementQuery, function: &str) -> Result<Value> {
	let result = run(session, context, query, ScriptTemplate::Eval, Some(LocalValue::string(function))).await?;
	decode_json(result)
}

/// Base64 PNG of the element, clipped to its box after scrolling it into view.
pub async fn screenshot(session: &Session, context: &str, query: &ElementQuery) -> Result<String> {
	let info = resolve(session, context, query).await?;
	let params = CaptureScreenshot {
		context: context.to_string(),
		clip: Some(ClipRectangle::Box {
			x: info.bbox.x,
			y: info.bbox.y,
			width: info.bbox.width,
			height: info.bbox.height,
		}),
	};
	let shot: CaptureScreenshotResult = session.call("browsingContext.captureScreenshot", &params).await?;
	Ok(shot.data)
}
