//! Platform process-termination policy.
//!
//! The two platform families differ in how a browser host tree is torn down:
//!
//! - **Process-group platforms** (unix): the host is launched in its own
//!   process group, the graceful `browser.close` is allowed to run first, and
//!   the fallback kill sends SIGKILL to the recorded pid.
//! - **Tree-kill platforms** (windows): the graceful close is skipped, since
//!   the host may exit before the tree kill runs and orphan its children, and
//!   termination is always a forced `taskkill /T` on the top-level pid.
//!
//! The variant is chosen once per process; call sites only consult
//! [`current`].

use std::sync::LazyLock;

use tokio::process::Command;
use tracing::debug;

/// Platform capability consulted by the launcher and shutdown sequencer.
pub trait Platform: Send + Sync + std::fmt::Debug {
	/// Short name for logs.
	fn name(&self) -> &'static str;

	/// Prepares `cmd` so the spawned host gets the platform's grouping.
	fn set_process_group(&self, cmd: &mut Command);

	/// Forcefully terminates `pid` (and, where the platform requires it, its tree).
	///
	/// Killing a pid that no longer exists is a silent no-op.
	fn kill_by_pid(&self, pid: u32);

	/// Whether the protocol-level `browser.close` must be skipped before killing.
	fn skip_graceful_shutdown(&self) -> bool;
}

/// POSIX process-group policy.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixGroups;

#[cfg(unix)]
impl Platform for PosixGroups {
	fn name(&self) -> &'static str {
		"posix-groups"
	}

	fn set_process_group(&self, cmd: &mut Command) {
		cmd.process_group(0);
	}

	fn kill_by_pid(&self, pid: u32) {
		let Ok(raw) = libc::pid_t::try_from(pid) else {
			return;
		};
		// SAFETY: kill(2) has no memory-safety preconditions.
		let rc = unsafe { libc::kill(raw, libc::SIGKILL) };
		if rc != 0 {
			let err = std::io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::ESRCH) {
				debug!(target = "clicker.process", pid, error = %err, "kill failed");
			}
		}
	}

	fn skip_graceful_shutdown(&self) -> bool {
		false
	}
}

/// Whole-tree forced termination via `taskkill`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeKill;

impl Platform for TreeKill {
	fn name(&self) -> &'static str {
		"tree-kill"
	}

	fn set_process_group(&self, _cmd: &mut Command) {}

	fn kill_by_pid(&self, pid: u32) {
		let result = std::process::Command::new("taskkill")
			.args(["/T", "/F", "/PID", &pid.to_string()])
			.stdout(std::process::Stdio::null())
			.stderr(std::process::Stdio::null())
			.status();
		if let Err(err) = result {
			debug!(target = "clicker.process", pid, error = %err, "taskkill failed");
		}
	}

	fn skip_graceful_shutdown(&self) -> bool {
		true
	}
}

static CURRENT: LazyLock<Box<dyn Platform>> = LazyLock::new(|| {
	#[cfg(unix)]
	let platform: Box<dyn Platform> = Box::new(PosixGroups);
	#[cfg(not(unix))]
	let platform: Box<dyn Platform> = Box::new(TreeKill);
	debug!(target = "clicker.process", platform = platform.name(), "selected process policy");
	platform
});

/// The policy for the running platform.
pub fn current() -> &'static dyn Platform {
	&**CURRENT
}
