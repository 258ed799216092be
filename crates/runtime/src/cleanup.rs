//! Panic cleanup.
//!
//! Browser hosts must not outlive a panicking caller. Both wrappers kill every
//! registered process when the wrapped code panics, then let the panic carry on.

use std::future::Future;
use std::panic::{AssertUnwindSafe, UnwindSafe};

use futures_util::FutureExt;
use tracing::error;

use crate::process::registry;

fn on_panic() {
	let killed = registry().kill_all();
	error!(target = "clicker.process", killed, "panic detected; killed browser processes");
}

/// Runs `f`, killing all registered browser processes if it panics.
///
/// The panic is re-raised after cleanup.
pub fn with_cleanup<F, T>(f: F) -> T
where
	F: FnOnce() -> T + UnwindSafe,
{
	match std::panic::catch_unwind(f) {
		Ok(value) => value,
		Err(payload) => {
			on_panic();
			std::panic::resume_unwind(payload)
		}
	}
}

/// Async form of [`with_cleanup`].
pub async fn guard<F, T>(future: F) -> T
where
	F: Future<Output = T>,
{
	match AssertUnwindSafe(future).catch_unwind().await {
		Ok(value) => value,
		Err(payload) => {
			on_panic();
			std::panic::resume_unwind(payload)
		}
	}
}
