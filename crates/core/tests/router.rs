mod common;

use clicker::script::{HIDDEN_CHECK, VISIBLE_CHECK};
use common::{Harness, Reply, declaration, found, string_result, tree};
use serde_json::{Value, json};

fn actions_ok(command: &Value) -> Reply {
	match command["method"].as_str() {
		Some("input.performActions") => Reply::Result(json!({})),
		Some("browsingContext.getTree") => Reply::Result(tree(&["top-1", "top-2"])),
		_ => Reply::Error("unknown command", "unexpected"),
	}
}

#[tokio::test]
async fn click_compiles_to_one_pointer_sequence() {
	let mut harness = Harness::start(actions_ok);

	let reply = harness
		.call(1, "vibium:mouse.click", json!({"x": 10.7, "y": 20.2, "context": "ctx-1"}))
		.await;

	assert_eq!(reply, json!({"type": "success", "id": 1, "result": {"clicked": true}}));
	assert!(harness.sent("browsingContext.getTree").is_empty());

	let performed = harness.sent("input.performActions");
	assert_eq!(performed.len(), 1);
	assert_eq!(
		performed[0]["params"],
		json!({
			"context": "ctx-1",
			"actions": [{
				"type": "pointer",
				"id": "mouse",
				"parameters": {"pointerType": "mouse"},
				"actions": [
					{"type": "pointerMove", "x": 11, "y": 20, "duration": 0},
					{"type": "pointerDown", "button": 0},
					{"type": "pointerUp", "button": 0},
				]
			}]
		})
	);
}

#[tokio::test]
async fn missing_context_falls_back_to_first_top_level_context() {
	let mut harness = Harness::start(actions_ok);

	let reply = harness.call(2, "vibium:keyboard.press", json!({"key": "Control+a"})).await;
	assert_eq!(reply["result"], json!({"pressed": true}));

	let tree_calls = harness.sent("browsingContext.getTree");
	assert_eq!(tree_calls.len(), 1);
	assert_eq!(tree_calls[0]["params"], json!({"maxDepth": 0}));

	let performed = &harness.sent("input.performActions")[0]["params"];
	assert_eq!(performed["context"], "top-1");
	assert_eq!(
		performed["actions"][0]["actions"],
		json!([
			{"type": "keyDown", "value": "\u{E009}"},
			{"type": "keyDown", "value": "a"},
			{"type": "keyUp", "value": "a"},
			{"type": "keyUp", "value": "\u{E009}"},
		])
	);
}

#[tokio::test]
async fn empty_tree_is_a_context_error() {
	let mut harness = Harness::start(|command| match command["method"].as_str() {
		Some("browsingContext.getTree") => Reply::Result(tree(&[])),
		_ => Reply::Result(json!({})),
	});

	let reply = harness.call(3, "vibium:keyboard.type", json!({"text": "hi"})).await;

	assert_eq!(reply["type"], "error");
	assert_eq!(reply["id"], 3);
	assert_eq!(reply["error"], "no such frame");
	assert_eq!(reply["message"], "keyboard.type: no browsing context available");
	assert!(harness.sent("input.performActions").is_empty());
}

#[tokio::test]
async fn invalid_parameters_fail_before_any_browser_traffic() {
	let mut harness = Harness::start(actions_ok);

	let missing = harness.call(4, "vibium:el.attr", json!({"selector": "a"})).await;
	assert_eq!(missing["error"], "invalid argument");
	assert_eq!(missing["message"], "el.attr: missing name");

	let no_selector = harness.call(5, "vibium:el.text", json!({})).await;
	assert_eq!(no_selector["error"], "invalid argument");

	let bad_params = harness.call(6, "vibium:el.text", json!("not an object")).await;
	assert_eq!(bad_params["error"], "invalid argument");

	assert!(harness.commands().is_empty());
}

#[tokio::test]
async fn input_commands_fill_in_missing_parameters() {
	let mut harness = Harness::start(actions_ok);

	let click = harness.call(13, "vibium:mouse.click", json!({"context": "c"})).await;
	assert_eq!(click["result"], json!({"clicked": true}));

	let down = harness.call(14, "vibium:mouse.down", json!({"context": "c", "button": "1"})).await;
	assert_eq!(down["result"], json!({"pressed": true}));

	let press = harness.call(15, "vibium:keyboard.press", json!({"context": "c"})).await;
	assert_eq!(press["result"], json!({"pressed": true}));

	let wheel = harness.call(16, "vibium:mouse.wheel", json!({"context": "c", "deltaY": 50})).await;
	assert_eq!(wheel["result"], json!({"scrolled": true}));

	let performed = harness.sent("input.performActions");
	assert_eq!(
		performed[0]["params"]["actions"][0]["actions"][0],
		json!({"type": "pointerMove", "x": 0, "y": 0, "duration": 0})
	);
	assert_eq!(performed[1]["params"]["actions"][0]["actions"], json!([{"type": "pointerDown", "button": 0}]));
	assert_eq!(
		performed[2]["params"]["actions"][0]["actions"],
		json!([{"type": "keyDown", "value": ""}, {"type": "keyUp", "value": ""}])
	);
	assert_eq!(
		performed[3]["params"]["actions"][0]["actions"],
		json!([{"type": "scroll", "x": 0, "y": 0, "deltaX": 0, "deltaY": 50}])
	);
}

#[tokio::test]
async fn unknown_vocabulary_method_is_reported() {
	let mut harness = Harness::start(actions_ok);

	let reply = harness.call(7, "vibium:el.nope", json!({"context": "c"})).await;

	assert_eq!(
		reply,
		json!({
			"type": "error",
			"id": 7,
			"error": "unknown command",
			"message": "el.nope: unknown method: el.nope"
		})
	);
}

#[tokio::test]
async fn foreign_traffic_passes_through_verbatim() {
	let mut harness = Harness::start(|command| match command["method"].as_str() {
		Some("session.status") => Reply::Result(json!({"ready": true, "message": ""})),
		_ => Reply::Error("unknown command", "unexpected"),
	});

	let command = json!({"id": 41, "method": "session.status", "params": {}, "extra": [1, 2]});
	assert!(harness.router.submit(command.clone()).is_none());

	let reply = harness.reply(41).await;
	assert_eq!(reply, json!({"type": "success", "id": 41, "result": {"ready": true, "message": ""}}));
	assert_eq!(harness.commands(), vec![command]);

	let event = json!({"type": "event", "method": "log.entryAdded", "params": {"text": "hello"}});
	harness.push(event.clone());
	assert_eq!(harness.next_frame().await, event);
}

#[tokio::test]
async fn browser_error_codes_reach_the_client() {
	let mut harness = Harness::start(|_| Reply::Error("move target out of bounds", "x is outside the viewport"));

	let reply = harness
		.call(8, "vibium:mouse.move", json!({"x": 9000, "y": 1, "context": "c"}))
		.await;

	assert_eq!(reply["error"], "move target out of bounds");
	assert_eq!(
		reply["message"],
		"mouse.move: move target out of bounds: x is outside the viewport"
	);
}

#[tokio::test]
async fn wheel_down_and_up_report_their_payloads() {
	let mut harness = Harness::start(actions_ok);
	let context = json!({"context": "c"});

	let down = harness.call(9, "vibium:mouse.down", context.clone()).await;
	assert_eq!(down["result"], json!({"pressed": true}));

	let up = harness.call(10, "vibium:mouse.up", json!({"context": "c", "button": 2})).await;
	assert_eq!(up["result"], json!({"released": true}));

	let wheel = harness
		.call(11, "vibium:mouse.wheel", json!({"context": "c", "x": 5, "y": 6, "deltaY": 240}))
		.await;
	assert_eq!(wheel["result"], json!({"scrolled": true}));

	let tap = harness.call(12, "vibium:touch.tap", json!({"context": "c", "x": 1, "y": 1})).await;
	assert_eq!(tap["result"], json!({"tapped": true}));

	let performed = harness.sent("input.performActions");
	assert_eq!(performed[1]["params"]["actions"][0]["actions"], json!([{"type": "pointerUp", "button": 2}]));
	assert_eq!(performed[2]["params"]["actions"][0]["type"], "wheel");
	assert_eq!(performed[3]["params"]["actions"][0]["parameters"]["pointerType"], "touch");
}

#[tokio::test]
async fn element_queries_decode_script_results() {
	let mut harness = Harness::start(|command| {
		let source = declaration(command);
		let args = &command["params"]["arguments"];
		let answer = if source.contains("el.getAttribute(name)") {
			match args[4]["value"].as_str() {
				Some("href") => string_result(r#"{"value":"/home"}"#),
				_ => string_result(r#"{"value":null}"#),
			}
		} else if source.contains("el.innerHTML") {
			string_result("<b>Hi</b>")
		} else if source.contains("textContent") {
			string_result("Hi")
		} else if source.contains("!el.disabled;") {
			string_result("error:element not found")
		} else {
			string_result(r#"{"value":{"x":1,"y":2,"width":30,"height":40}}"#)
		};
		Reply::Result(answer)
	});
	let target = json!({"context": "c", "selector": "a.home", "scope": "nav", "index": 1});

	let text = harness.call(20, "vibium:el.text", target.clone()).await;
	assert_eq!(text["result"], json!({"text": "Hi"}));

	let html = harness.call(21, "vibium:el.html", target.clone()).await;
	assert_eq!(html["result"], json!({"html": "<b>Hi</b>"}));

	let mut attr = target.clone();
	attr["name"] = json!("href");
	assert_eq!(harness.call(22, "vibium:el.attr", attr.clone()).await["result"], json!({"value": "/home"}));

	attr["name"] = json!("title");
	assert_eq!(harness.call(23, "vibium:el.attr", attr).await["result"], json!({"value": null}));

	let bounds = harness.call(24, "vibium:el.bounds", target.clone()).await;
	assert_eq!(bounds["result"], json!({"x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0}));

	let enabled = harness.call(25, "vibium:el.isEnabled", target.clone()).await;
	assert_eq!(enabled["error"], "no such element");
	assert_eq!(enabled["message"], "el.isEnabled: element not found");

	let first = &harness.sent("script.callFunction")[0]["params"];
	assert_eq!(first["target"], json!({"context": "c"}));
	assert_eq!(
		first["arguments"],
		json!([
			{"type": "string", "value": "nav"},
			{"type": "string", "value": "a.home"},
			{"type": "number", "value": 1.0},
			{"type": "boolean", "value": true},
		])
	);
}

#[tokio::test]
async fn visibility_queries_are_complementary() {
	for displayed in [true, false] {
		let mut harness = Harness::start(move |command| {
			let source = declaration(command);
			let visible = if source.contains(VISIBLE_CHECK) {
				displayed
			} else if source.contains(HIDDEN_CHECK) {
				!displayed
			} else {
				return Reply::Error("unknown command", "unexpected");
			};
			Reply::Result(string_result(if visible { "true" } else { "false" }))
		});
		let target = json!({"context": "c", "selector": "#banner"});

		let visible = harness.call(1, "vibium:el.isVisible", target.clone()).await;
		let hidden = harness.call(2, "vibium:el.isHidden", target).await;

		assert_eq!(visible["result"]["visible"], displayed);
		assert_eq!(hidden["result"]["hidden"], !displayed);
	}
}

#[tokio::test]
async fn eval_script_errors_surface_as_javascript_errors() {
	let mut harness = Harness::start(|_| Reply::Result(common::exception_result("ReferenceError: nope is not defined")));

	let reply = harness
		.call(30, "vibium:el.eval", json!({"context": "c", "selector": "p", "fn": "return nope;"}))
		.await;

	assert_eq!(reply["error"], "javascript error");
	assert_eq!(reply["message"], "el.eval: ReferenceError: nope is not defined");
}

#[tokio::test]
async fn screenshot_is_clipped_to_the_element_box() {
	let mut harness = Harness::start(|command| match command["method"].as_str() {
		Some("script.callFunction") => Reply::Result(found("img", "", 10.0, 20.0, 64.0, 32.0)),
		Some("browsingContext.captureScreenshot") => Reply::Result(json!({"data": "iVBORw0KGgo="})),
		_ => Reply::Error("unknown command", "unexpected"),
	});

	let reply = harness
		.call(31, "vibium:el.screenshot", json!({"context": "c", "selector": "img.logo"}))
		.await;

	assert_eq!(reply["result"], json!({"data": "iVBORw0KGgo="}));
	let capture = &harness.sent("browsingContext.captureScreenshot")[0]["params"];
	assert_eq!(
		capture["clip"],
		json!({"type": "box", "x": 10.0, "y": 20.0, "width": 64.0, "height": 32.0})
	);
}

#[tokio::test]
async fn missing_scope_root_is_reported() {
	let mut harness = Harness::start(|command| {
		if declaration(command).contains("el.getAttribute(name)") {
			Reply::Result(string_result(r#"{"error":"root not found"}"#))
		} else {
			Reply::Result(common::remote_result(json!({"type": "null"})))
		}
	});
	let target = json!({"context": "c", "selector": "input", "scope": "#gone", "name": "id"});

	// Text extraction reports any miss as null.
	let value = harness.call(32, "vibium:el.value", target.clone()).await;
	assert_eq!(value["error"], "no such element");
	assert_eq!(value["message"], "el.value: element not found");

	let attr = harness.call(33, "vibium:el.attr", target).await;
	assert_eq!(attr["error"], "no such element");
	assert_eq!(attr["message"], "el.attr: root not found");
}

#[tokio::test]
async fn malformed_vocabulary_frames() {
	let mut harness = Harness::start(actions_ok);

	// No id: nothing to reply to.
	assert!(harness.router.submit(json!({"method": "vibium:mouse.click"})).is_none());

	assert!(harness.router.submit(json!({"id": 50, "method": "vibium:mouse.click", "params": 3})).is_none());
	let reply = harness.reply(50).await;
	assert_eq!(reply["error"], "invalid argument");

	assert!(harness.commands().is_empty());
}

#[tokio::test]
async fn reserved_command_ids_are_refused() {
	let mut harness = Harness::start(actions_ok);
	let reserved = 1u64 << 32;

	assert!(harness.router.submit(json!({"id": reserved, "method": "session.status", "params": {}})).is_none());
	let reply = harness.reply(reserved).await;
	assert_eq!(reply["type"], "error");
	assert_eq!(reply["error"], "invalid argument");
	assert_eq!(reply["message"], "command id 4294967296 is reserved for the proxy");

	let vocabulary = harness.call(reserved + 1, "vibium:mouse.click", json!({"context": "c"})).await;
	assert_eq!(vocabulary["error"], "invalid argument");

	assert!(harness.commands().is_empty());
}
