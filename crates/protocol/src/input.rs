//! `input.performActions` payloads.

use serde::{Deserialize, Serialize};

/// Parameters for `input.performActions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformActions {
	pub context: String,
	pub actions: Vec<SourceActions>,
}

/// One input source and the ticks it performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceActions {
	Key {
		id: String,
		actions: Vec<KeyAction>,
	},
	Pointer {
		id: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		parameters: Option<PointerParameters>,
		actions: Vec<PointerAction>,
	},
	Wheel {
		id: String,
		actions: Vec<WheelAction>,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyAction {
	KeyDown { value: String },
	KeyUp { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
	Mouse,
	Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerParameters {
	#[serde(rename = "pointerType")]
	pub pointer_type: PointerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerAction {
	PointerMove {
		x: i64,
		y: i64,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		duration: Option<u64>,
	},
	PointerDown {
		button: u32,
	},
	PointerUp {
		button: u32,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WheelAction {
	Scroll {
		x: i64,
		y: i64,
		#[serde(rename = "deltaX")]
		delta_x: i64,
		#[serde(rename = "deltaY")]
		delta_y: i64,
	},
}
