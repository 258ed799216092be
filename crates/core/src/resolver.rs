//! Element resolution.

use clicker_protocol::{CallFunction, EvaluateResult};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::query::{ElementInfo, ElementQuery};
use crate::script::{FIND_SCRIPT, success_value};
use crate::session::Session;
use crate::wait::{POLL_INTERVAL, poll_until};

/// Looks the element up once.
///
/// Scrolls it into view as a side effect.
///
/// # Errors
///
/// `RootNotFound` / `ElementNotFound` when the scope or selector match
/// nothing, `Decode` when the page reports an unusable shape (including a
/// negative box).
pub async fn resolve_no_wait(session: &Session, context: &str, query: &ElementQuery) -> Result<ElementInfo> {
	let call = CallFunction::new(FIND_SCRIPT, context, query.script_args());
	let result: EvaluateResult = session.call("script.callFunction", &call).await?;
	let value = success_value(result)?;

	let Some(text) = value.as_str().filter(|s| !s.is_empty()) else {
		return Err(Error::element_not_found());
	};
	let parsed: Value =
		serde_json::from_str(text).map_err(|e| Error::Decode(format!("invalid element info: {e}")))?;
	if let Some(error) = parsed.get("error").and_then(Value::as_str) {
		return Err(Error::from_script_message(error));
	}
	serde_json::from_value(parsed).map_err(|e| Error::Decode(format!("invalid element info: {e}")))
}

/// Looks the element up, polling until it exists or `query.timeout` passes.
pub async fn resolve(session: &Session, context: &str, query: &ElementQuery) -> Result<ElementInfo> {
	poll_until(POLL_INTERVAL, query.timeout, move || async move {
		match resolve_no_wait(session, context, query).await {
			Ok(info) => Ok(Some(info)),
			Err(err) if err.is_not_found() => {
				trace!(target = "clicker.resolver", %query, "not found yet");
				Ok(None)
			}
			Err(err) => Err(err),
		}
	})
	.await
	.map_err(|err| {
		if !err.is_timeout() {
			return err;
		}
		Error::Timeout(format!("timeout after {}ms waiting for {query}", query.timeout.as_millis()))
	})
}
