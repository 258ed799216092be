//! Element addressing and the element snapshot returned by lookups.

use std::fmt;
use std::time::Duration;

use clicker_protocol::LocalValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Timeout applied when a command does not name one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How to find an element: `selector` within `scope`, optionally the
/// `index`-th match.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementQuery {
	/// Scope selector; empty means the whole document.
	pub scope: String,
	pub selector: String,
	pub index: Option<u32>,
	pub timeout: Duration,
}

impl ElementQuery {
	pub fn new(selector: impl Into<String>) -> Self {
		Self {
			scope: String::new(),
			selector: selector.into(),
			index: None,
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();
		self
	}

	pub fn index(mut self, index: u32) -> Self {
		self.index = Some(index);
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Reads `{scope, selector, index, timeout}` from command params.
	///
	/// `timeout` is in milliseconds; zero, negative or absent means
	/// [`DEFAULT_TIMEOUT`].
	pub fn from_params(params: &Map<String, Value>) -> Result<Self> {
		let selector = match params.get("selector") {
			Some(Value::String(s)) if !s.is_empty() => s.clone(),
			Some(Value::String(_)) | None => return Err(Error::Parameter("missing selector".to_string())),
			Some(other) => return Err(Error::Parameter(format!("selector must be a string, got {other}"))),
		};

		let scope = match params.get("scope") {
			None | Some(Value::Null) => String::new(),
			Some(Value::String(s)) => s.clone(),
			Some(other) => return Err(Error::Parameter(format!("scope must be a string, got {other}"))),
		};

		let index = match params.get("index") {
			None | Some(Value::Null) => None,
			Some(value) => match value.as_f64() {
				Some(n) if n >= 0.0 && n <= f64::from(u32::MAX) => Some(n as u32),
				_ => return Err(Error::Parameter(format!("index must be a non-negative number, got {value}"))),
			},
		};

		let timeout = params
			.get("timeout")
			.and_then(Value::as_f64)
			.filter(|ms| *ms > 0.0)
			.map_or(DEFAULT_TIMEOUT, |ms| Duration::from_millis(ms as u64));

		Ok(Self {
			scope,
			selector,
			index,
			timeout,
		})
	}

	/// The `(scope, selector, index, hasIndex)` arguments every element
	/// script takes.
	pub fn script_args(&self) -> Vec<LocalValue> {
		vec![
			LocalValue::string(&self.scope),
			LocalValue::string(&self.selector),
			LocalValue::Number(f64::from(self.index.unwrap_or(0))),
			LocalValue::Boolean(self.index.is_some()),
		]
	}
}

impl fmt::Display for ElementQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "'{}'", self.selector)?;
		if let Some(index) = self.index {
			write!(f, "[{index}]")?;
		}
		if !self.scope.is_empty() {
			write!(f, " in '{}'", self.scope)?;
		}
		Ok(())
	}
}

/// Element rectangle in CSS pixels relative to the viewport.
///
/// Negative extents are rejected when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBox")]
pub struct BoundingBox {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

#[derive(Deserialize)]
struct RawBox {
	x: f64,
	y: f64,
	width: f64,
	height: f64,
}

impl TryFrom<RawBox> for BoundingBox {
	type Error = String;

	fn try_from(raw: RawBox) -> std::result::Result<Self, Self::Error> {
		if raw.width < 0.0 || raw.height < 0.0 {
			return Err(format!("negative box extent {}x{}", raw.width, raw.height));
		}
		Ok(Self {
			x: raw.x,
			y: raw.y,
			width: raw.width,
			height: raw.height,
		})
	}
}

/// Snapshot of a resolved element. Never cached: each lookup re-searches the
/// DOM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
	pub tag: String,
	pub text: String,
	#[serde(rename = "box")]
	pub bbox: BoundingBox,
}
