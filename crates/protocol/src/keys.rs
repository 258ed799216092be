//! Key name resolution for keyboard actions.
//!
//! BiDi key actions carry a single grapheme. Named keys are encoded as the
//! WebDriver private-use code points (`\u{E000}` range); printable characters
//! are sent as themselves.

/// Resolves a key name (`"Enter"`, `"Control"`, `"a"`) to the value used in a
/// `keyDown`/`keyUp` action.
///
/// Unknown multi-character names pass through unchanged so the browser can
/// report them.
pub fn resolve_key(name: &str) -> String {
	let code = match name {
		"Unidentified" => '\u{E000}',
		"Cancel" => '\u{E001}',
		"Help" => '\u{E002}',
		"Backspace" => '\u{E003}',
		"Tab" => '\u{E004}',
		"Clear" => '\u{E005}',
		"Return" => '\u{E006}',
		"Enter" => '\u{E007}',
		"Shift" | "ShiftLeft" => '\u{E008}',
		"Control" | "ControlLeft" | "Ctrl" => '\u{E009}',
		"Alt" | "AltLeft" | "Option" => '\u{E00A}',
		"Pause" => '\u{E00B}',
		"Escape" | "Esc" => '\u{E00C}',
		"Space" => '\u{E00D}',
		"PageUp" => '\u{E00E}',
		"PageDown" => '\u{E00F}',
		"End" => '\u{E010}',
		"Home" => '\u{E011}',
		"ArrowLeft" => '\u{E012}',
		"ArrowUp" => '\u{E013}',
		"ArrowRight" => '\u{E014}',
		"ArrowDown" => '\u{E015}',
		"Insert" => '\u{E016}',
		"Delete" => '\u{E017}',
		"F1" => '\u{E031}',
		"F2" => '\u{E032}',
		"F3" => '\u{E033}',
		"F4" => '\u{E034}',
		"F5" => '\u{E035}',
		"F6" => '\u{E036}',
		"F7" => '\u{E037}',
		"F8" => '\u{E038}',
		"F9" => '\u{E039}',
		"F10" => '\u{E03A}',
		"F11" => '\u{E03B}',
		"F12" => '\u{E03C}',
		"Meta" | "MetaLeft" | "Command" | "Cmd" => '\u{E03D}',
		"ShiftRight" => '\u{E050}',
		"ControlRight" => '\u{E051}',
		"AltRight" => '\u{E052}',
		"MetaRight" => '\u{E053}',
		"ControlOrMeta" if cfg!(target_os = "macos") => '\u{E03D}',
		"ControlOrMeta" => '\u{E009}',
		_ => return name.to_string(),
	};
	code.to_string()
}

/// Splits a key combination such as `"Control+Shift+a"` into its components.
///
/// A trailing `++` denotes the plus key itself (`"Control++"`), and a lone
/// `"+"` is the plus key.
pub fn split_combo(key: &str) -> Vec<&str> {
	if key == "+" || !key.contains('+') {
		return vec![key];
	}
	if let Some(modifiers) = key.strip_suffix("++") {
		let mut parts: Vec<&str> = modifiers.split('+').filter(|p| !p.is_empty()).collect();
		parts.push("+");
		return parts;
	}
	key.split('+').filter(|p| !p.is_empty()).collect()
}
