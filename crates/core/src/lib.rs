//! clicker - a WebDriver BiDi translation proxy
//!
//! Sits between an automation client and a browser host speaking WebDriver
//! BiDi. Clients send a compact `vibium:` vocabulary (keyboard, mouse and
//! touch input, element state queries, waits, WebSocket observation); each
//! command is compiled into one or more BiDi exchanges. Everything outside the
//! vocabulary passes through untouched.
//!
//! # Example
//!
//! ```ignore
//! use clicker::Router;
//! use clicker_runtime::WebSocketTransport;
//!
//! let browser = WebSocketTransport::connect("ws://127.0.0.1:9222/session").await?;
//! let (client_tx, mut client_rx) = tokio::sync::mpsc::unbounded_channel();
//! let (router, reader) = Router::attach(browser, client_tx);
//!
//! router.submit(serde_json::json!({
//!     "id": 1,
//!     "method": "vibium:el.waitFor",
//!     "params": {"selector": "#login", "state": "visible"}
//! }));
//! let reply = client_rx.recv().await;
//! ```
//!
//! # Modules
//!
//! - [`router`] - method dispatch, replies, passthrough
//! - [`resolver`] / [`wait`] - element lookup and condition polling
//! - [`actions`] / [`state`] - input and state query translation
//! - [`websocket`] - page WebSocket monitoring bridge

pub mod actions;
pub mod error;
pub mod query;
pub mod resolver;
pub mod router;
pub mod script;
pub mod session;
pub mod state;
pub mod wait;
pub mod websocket;

pub use error::{Error, Result};
pub use query::{BoundingBox, DEFAULT_TIMEOUT, ElementInfo, ElementQuery};
pub use router::Router;
pub use session::Session;
pub use wait::{POLL_INTERVAL, WaitState, poll_until};
