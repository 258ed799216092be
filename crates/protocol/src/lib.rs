//! Wire types for the clicker proxy.
//!
//! This crate contains the serde-serializable types that cross the wire on
//! either side of the proxy:
//!
//! - [`bidi`] - WebDriver BiDi commands, responses, events and script values
//!   exchanged with the browser host
//! - [`input`] - `input.performActions` action sequences
//! - [`keys`] - key name to WebDriver code point resolution
//! - [`client`] - the `vibium:` command vocabulary spoken by automation clients
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and small lookups
//! - **1:1 with the wire**: Field names match the BiDi specification
//! - **Stable**: Changes only when a wire format changes

pub mod bidi;
pub mod client;
pub mod input;
pub mod keys;

pub use bidi::*;
pub use client::*;
pub use input::*;
pub use keys::{resolve_key, split_combo};
