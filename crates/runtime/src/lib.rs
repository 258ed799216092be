//! clicker runtime - browser host lifecycle, transport, and correlation
//!
//! This crate provides the low-level infrastructure the proxy core builds on:
//!
//! - **Process management**: Launching the browser host, tracking it in a
//!   process-wide registry, and terminating it with the platform's policy
//! - **Transport**: JSON frames over a WebSocket (or in-memory channels in tests)
//! - **Connection**: Request/response correlation for internally issued BiDi
//!   commands, with passthrough of everything else
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   clicker    │  Router, translators, wait engine
//! └──────┬───────┘
//!        │ send_command / dispatch
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  id correlation
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket transport
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │Process │  │  launch / kill / panic cleanup
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod cleanup;
pub mod connection;
pub mod error;
pub mod platform;
pub mod process;
pub mod transport;

pub use cleanup::{guard, with_cleanup};
pub use connection::{Connection, INTERNAL_ID_BASE};
pub use error::{Error, Result};
pub use platform::Platform;
pub use process::{BrowserProcess, LaunchConfig, ProcessRegistry, registry, shutdown};
pub use transport::{TransportParts, WebSocketTransport};
