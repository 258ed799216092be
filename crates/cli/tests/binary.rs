//! Tests that run the `clicker` binary.

use std::process::Command;

fn run_clicker(args: &[&str]) -> (bool, String, String) {
	let output = Command::new(env!("CARGO_BIN_EXE_clicker"))
		.args(args)
		.output()
		.expect("failed to execute clicker");
	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

#[test]
fn help_lists_serve() {
	let (success, stdout, _) = run_clicker(&["--help"]);
	assert!(success);
	assert!(stdout.contains("serve"));
}

#[test]
fn missing_browser_fails_before_listening() {
	let (success, _, stderr) = run_clicker(&[
		"serve",
		"--listen",
		"127.0.0.1:0",
		"--browser",
		"clicker-test-no-such-browser",
		"--bidi-url",
		"ws://127.0.0.1:1/session",
	]);
	assert!(!success);
	assert!(stderr.contains("Browser not found"), "{stderr}");
}

#[cfg(unix)]
#[test]
fn rejects_non_websocket_bidi_url() {
	let (success, _, stderr) = run_clicker(&["serve", "--browser", "/bin/sh", "--bidi-url", "http://127.0.0.1:9222"]);
	assert!(!success);
	assert!(stderr.contains("ws:// or wss://"), "{stderr}");
}
