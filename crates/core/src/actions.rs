//! Input intents compiled to `input.performActions`.
//!
//! Builders are pure; [`perform`] sends the result. Coordinates are rounded
//! to the nearest whole CSS pixel.

use clicker_protocol::{
	KeyAction, PerformActions, PointerAction, PointerParameters, PointerType, SourceActions, WheelAction, resolve_key,
	split_combo,
};
use serde_json::Value;

use crate::error::Result;
use crate::session::Session;

const KEYBOARD: &str = "keyboard";
const MOUSE: &str = "mouse";
const TOUCH: &str = "touch";
const WHEEL: &str = "wheel";

fn key_source(context: &str, actions: Vec<KeyAction>) -> PerformActions {
	PerformActions {
		context: context.to_string(),
		actions: vec![SourceActions::Key {
			id: KEYBOARD.to_string(),
			actions,
		}],
	}
}

fn pointer_source(context: &str, pointer_type: PointerType, actions: Vec<PointerAction>) -> PerformActions {
	let id = match pointer_type {
		PointerType::Touch => TOUCH,
		PointerType::Mouse => MOUSE,
	};
	PerformActions {
		context: context.to_string(),
		actions: vec![SourceActions::Pointer {
			id: id.to_string(),
			parameters: Some(PointerParameters { pointer_type }),
			actions,
		}],
	}
}

fn pixel(v: f64) -> i64 {
	v.round() as i64
}

fn move_to(x: f64, y: f64) -> PointerAction {
	PointerAction::PointerMove {
		x: pixel(x),
		y: pixel(y),
		duration: Some(0),
	}
}

/// Presses and releases `key`; `"Control+a"` holds Control around `a`.
pub fn press(context: &str, key: &str) -> PerformActions {
	let keys: Vec<String> = split_combo(key).into_iter().map(resolve_key).collect();
	let downs = keys.iter().map(|k| KeyAction::KeyDown { value: k.clone() });
	let ups = keys.iter().rev().map(|k| KeyAction::KeyUp { value: k.clone() });
	key_source(context, downs.chain(ups).collect())
}

pub fn key_down(context: &str, key: &str) -> PerformActions {
	key_source(context, vec![KeyAction::KeyDown { value: resolve_key(key) }])
}

pub fn key_up(context: &str, key: &str) -> PerformActions {
	key_source(context, vec![KeyAction::KeyUp { value: resolve_key(key) }])
}

/// Types `text` one character at a time.
pub fn type_text(context: &str, text: &str) -> PerformActions {
	let actions = text
		.chars()
		.flat_map(|c| {
			let value = c.to_string();
			[KeyAction::KeyDown { value: value.clone() }, KeyAction::KeyUp { value }]
		})
		.collect();
	key_source(context, actions)
}

pub fn click(context: &str, x: f64, y: f64) -> PerformActions {
	pointer_source(
		context,
		PointerType::Mouse,
		vec![
			move_to(x, y),
			PointerAction::PointerDown { button: 0 },
			PointerAction::PointerUp { button: 0 },
		],
	)
}

pub fn tap(context: &str, x: f64, y: f64) -> PerformActions {
	pointer_source(
		context,
		PointerType::Touch,
		vec![
			move_to(x, y),
			PointerAction::PointerDown { button: 0 },
			PointerAction::PointerUp { button: 0 },
		],
	)
}

pub fn mouse_move(context: &str, x: f64, y: f64) -> PerformActions {
	pointer_source(context, PointerType::Mouse, vec![move_to(x, y)])
}

pub fn mouse_down(context: &str, button: u32) -> PerformActions {
	pointer_source(context, PointerType::Mouse, vec![PointerAction::PointerDown { button }])
}

pub fn mouse_up(context: &str, button: u32) -> PerformActions {
	pointer_source(context, PointerType::Mouse, vec![PointerAction::PointerUp { button }])
}

pub fn wheel(context: &str, x: f64, y: f64, delta_x: f64, delta_y: f64) -> PerformActions {
	PerformActions {
		context: context.to_string(),
		actions: vec![SourceActions::Wheel {
			id: WHEEL.to_string(),
			actions: vec![WheelAction::Scroll {
				x: pixel(x),
				y: pixel(y),
				delta_x: pixel(delta_x),
				delta_y: pixel(delta_y),
			}],
		}],
	}
}

/// Sends an action sequence.
pub async fn perform(session: &Session, actions: &PerformActions) -> Result<()> {
	session.call::<_, Value>("input.performActions", actions).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn key_values(actions: &PerformActions) -> Vec<(String, String)> {
		let SourceActions::Key { actions, .. } = &actions.actions[0] else {
			panic!("expected key source");
		};
		actions
			.iter()
			.map(|a| match a {
				KeyAction::KeyDown { value } => ("down".to_string(), value.clone()),
				KeyAction::KeyUp { value } => ("up".to_string(), value.clone()),
			})
			.collect()
	}

	#[test]
	fn press_combo_releases_in_reverse() {
		let actions = press("ctx", "Control+Shift+a");
		let ctrl = "\u{E009}".to_string();
		let shift = "\u{E008}".to_string();
		assert_eq!(
			key_values(&actions),
			vec![
				("down".into(), ctrl.clone()),
				("down".into(), shift.clone()),
				("down".into(), "a".into()),
				("up".into(), "a".into()),
				("up".into(), shift),
				("up".into(), ctrl),
			]
		);
	}

	#[test]
	fn type_text_pairs_each_character() {
		let values = key_values(&type_text("ctx", "hé"));
		assert_eq!(values.len(), 4);
		assert_eq!(values[1], ("up".to_string(), "h".to_string()));
		assert_eq!(values[2], ("down".to_string(), "é".to_string()));
	}

	#[test]
	fn tap_uses_touch_source_and_rounds() {
		assert_eq!(
			serde_json::to_value(tap("ctx", 10.9, -3.7)).unwrap(),
			json!({
				"context": "ctx",
				"actions": [{
					"type": "pointer",
					"id": "touch",
					"parameters": {"pointerType": "touch"},
					"actions": [
						{"type": "pointerMove", "x": 11, "y": -4, "duration": 0},
						{"type": "pointerDown", "button": 0},
						{"type": "pointerUp", "button": 0},
					]
				}]
			})
		);
	}

	#[test]
	fn wheel_scrolls_once() {
		let value = serde_json::to_value(wheel("ctx", 1.2, 2.0, 0.0, 120.5)).unwrap();
		assert_eq!(value["actions"][0]["id"], "wheel");
		assert_eq!(
			value["actions"][0]["actions"],
			json!([{"type": "scroll", "x": 1, "y": 2, "deltaX": 0, "deltaY": 121}])
		);
	}
}
