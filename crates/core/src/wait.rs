//! Condition polling.
//!
//! Every "wait for X" command goes through [`poll_until`]: evaluate, stop on
//! success, fail once the deadline has passed, otherwise sleep one interval.
//! Each evaluation is itself cut off one interval past the deadline, so a
//! wait never overruns its deadline by more than one interval even when the
//! browser stops answering.

use std::future::Future;
use std::time::Duration;

use clicker_protocol::{CallFunction, EvaluateResult, RemoteValue};
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::query::ElementQuery;
use crate::resolver::resolve_no_wait;
use crate::script::{HIDDEN_CHECK, ScriptTemplate, VISIBLE_CHECK};
use crate::session::Session;
use crate::state::check;

/// Interval between polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls `predicate` until it yields a value, fails, or `timeout` passes.
///
/// The predicate returns `Ok(Some(v))` when done, `Ok(None)` to poll again
/// and `Err` to abort the wait.
pub async fn poll_until<T, F, Fut>(interval: Duration, timeout: Duration, mut predicate: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Option<T>>>,
{
	let deadline = Instant::now() + timeout;
	let timed_out = || Error::Timeout(format!("timed out after {}ms", timeout.as_millis()));
	loop {
		match tokio::time::timeout_at(deadline + interval, predicate()).await {
			Ok(outcome) => {
				if let Some(value) = outcome? {
					return Ok(value);
				}
			}
			Err(_) => return Err(timed_out()),
		}
		if Instant::now() >= deadline {
			return Err(timed_out());
		}
		tokio::time::sleep(interval).await;
	}
}

/// Element state accepted by `el.waitFor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitState {
	/// Present in the DOM.
	Attached,
	/// Absent from the DOM.
	Detached,
	/// Present and rendered.
	#[default]
	Visible,
	/// Absent, or present but not rendered.
	Hidden,
}

impl WaitState {
	/// Parses the `state` parameter; `None` means [`WaitState::Visible`].
	pub fn parse(state: Option<&str>) -> Result<Self> {
		match state {
			None | Some("") | Some("visible") => Ok(Self::Visible),
			Some("hidden") => Ok(Self::Hidden),
			Some("attached") => Ok(Self::Attached),
			Some("detached") => Ok(Self::Detached),
			Some(other) => Err(Error::Parameter(format!(
				"unknown state: {other} (expected visible, hidden, attached, detached)"
			))),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Attached => "attached",
			Self::Detached => "detached",
			Self::Visible => "visible",
			Self::Hidden => "hidden",
		}
	}
}

/// Evaluates `state` once.
async fn state_met(session: &Session, context: &str, query: &ElementQuery, state: WaitState) -> Result<bool> {
	let found = match resolve_no_wait(session, context, query).await {
		Ok(_) => true,
		Err(err) if err.is_not_found() => false,
		Err(err) => return Err(err),
	};

	match (state, found) {
		(WaitState::Attached, found) => Ok(found),
		(WaitState::Detached, found) => Ok(!found),
		(WaitState::Visible, false) => Ok(false),
		(WaitState::Hidden, false) => Ok(true),
		(WaitState::Visible, true) => {
			let visible = check(session, context, query, ScriptTemplate::BoolCheck(VISIBLE_CHECK)).await;
			settle(visible, false)
		}
		(WaitState::Hidden, true) => {
			let hidden = check(session, context, query, ScriptTemplate::BoolCheck(HIDDEN_CHECK)).await;
			settle(hidden, true)
		}
	}
}

/// The element can vanish between lookup and check; that counts as
/// `when_missing`.
fn settle(outcome: Result<bool>, when_missing: bool) -> Result<bool> {
	match outcome {
		Err(err) if err.is_not_found() => Ok(when_missing),
		other => other,
	}
}

/// Waits until the element addressed by `query` reaches `state`.
pub async fn wait_for_state(session: &Session, context: &str, query: &ElementQuery, state: WaitState) -> Result<()> {
	poll_until(POLL_INTERVAL, query.timeout, move || async move {
		Ok(state_met(session, context, query, state).await?.then_some(()))
	})
	.await
	.map_err(|err| {
		if !err.is_timeout() {
			return err;
		}
		Error::Timeout(format!(
			"timeout waiting for {query} to be {} after {}ms",
			state.as_str(),
			query.timeout.as_millis()
		))
	})
}

/// JavaScript truthiness of a remote value.
pub fn is_truthy(value: &RemoteValue) -> bool {
	match value.kind.as_str() {
		"boolean" => value.value.as_ref().and_then(Value::as_bool).unwrap_or(false),
		"number" => match &value.value {
			Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
			// NaN, Infinity, -0 arrive as strings
			Some(Value::String(special)) => !matches!(special.as_str(), "NaN" | "-0"),
			_ => false,
		},
		"string" => value.value.as_ref().and_then(Value::as_str).is_some_and(|s| !s.is_empty()),
		"null" | "undefined" => false,
		_ => true,
	}
}

/// Polls `function` in `context` until it returns a truthy value.
///
/// A thrown exception counts as "not yet"; connection failures abort.
pub async fn wait_for_function(session: &Session, context: &str, function: &str, timeout: Duration) -> Result<Value> {
	let call = &CallFunction::new(function, context, Vec::new()).awaiting();
	poll_until(POLL_INTERVAL, timeout, move || async move {
		match session.call::<_, EvaluateResult>("script.callFunction", call).await? {
			EvaluateResult::Success { result } if is_truthy(&result) => Ok(Some(result.value.unwrap_or(Value::Null))),
			EvaluateResult::Success { .. } | EvaluateResult::Exception { .. } => Ok(None),
		}
	})
	.await
	.map_err(|err| {
		if !err.is_timeout() {
			return err;
		}
		Error::Timeout(format!(
			"timeout waiting for function to return truthy after {}ms",
			timeout.as_millis()
		))
	})
}
