//! Browser host process management
//!
//! Handles launching the browser host, tracking every live host in a
//! process-wide registry, and terminating it. Termination is idempotent: the
//! first [`BrowserProcess::kill`] wins, later calls (from shutdown, drop, or
//! panic cleanup) are no-ops.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::platform;


/// How long a freshly spawned host must stay alive to count as launched.
pub const DEFAULT_STARTUP_PROBE: Duration = Duration::from_millis(100);

const GRACEFUL_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
const GRACEFUL_EXIT_WAIT: Duration = Duration::from_secs(2);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What to spawn as the browser host.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
	/// Executable path (already resolved).
	pub executable: PathBuf,
	/// Command-line arguments.
	pub args: Vec<String>,
	/// Startup probe window; an exit inside it is a launch failure.
	pub startup_probe: Duration,
}

impl LaunchConfig {
	pub fn new(executable: impl Into<PathBuf>) -> Self {
		Self {
			executable: executable.into(),
			args: Vec::new(),
			startup_probe: DEFAULT_STARTUP_PROBE,
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}
}

/// A spawned browser host.
///
/// Dropping the handle kills the process.
#[derive(Debug)]
pub struct BrowserProcess {
	pid: u32,
	/// Whether `browser.close` should be attempted before killing.
	graceful_shutdown: bool,
	child: Mutex<Option<Child>>,
	killed: AtomicBool,
}

impl BrowserProcess {
	/// Launch the browser host described by `config`.
	///
	/// The process is placed in its own process group where the platform
	/// supports it and registered for panic cleanup.
	///
	/// # Errors
	///
	/// Returns `Error::LaunchFailed` if the process cannot be spawned or exits
	/// within the startup probe window.
	pub async fn launch(config: &LaunchConfig) -> Result<Arc<Self>> {
		let platform = platform::current();

		let mut cmd = Command::new(&config.executable);
		cmd.args(&config.args)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::inherit());
		platform.set_process_group(&mut cmd);

		let mut child = cmd.spawn().map_err(|e| {
			Error::LaunchFailed(format!("failed to spawn {}: {e}", config.executable.display()))
		})?;
		let pid = child
			.id()
			.ok_or_else(|| Error::LaunchFailed("process exited before its pid was read".to_string()))?;

		tokio::time::sleep(config.startup_probe).await;

		match child.try_wait() {
			Ok(Some(status)) => {
				return Err(Error::LaunchFailed(format!(
					"browser exited immediately with status: {status}"
				)));
			}
			Ok(None) => {}
			Err(e) => {
				return Err(Error::LaunchFailed(format!("failed to check process status: {e}")));
			}
		}

		let process = Arc::new(Self {
			pid,
			graceful_shutdown: !platform.skip_graceful_shutdown(),
			child: Mutex::new(Some(child)),
			killed: AtomicBool::new(false),
		});
		registry().register(&process);

		info!(
			target = "clicker.process",
			pid,
			executable = %config.executable.display(),
			policy = platform.name(),
			"browser launched"
		);
		Ok(process)
	}

	pub fn pid(&self) -> u32 {
		self.pid
	}

	/// Whether the shutdown sequencer should send `browser.close` first.
	pub fn graceful_shutdown(&self) -> bool {
		self.graceful_shutdown
	}

	pub fn is_killed(&self) -> bool {
		self.killed.load(Ordering::SeqCst)
	}

	/// Returns true once the process has exited (reaping it if needed).
	pub fn has_exited(&self) -> bool {
		match self.child.lock().as_mut() {
			Some(child) => !matches!(child.try_wait(), Ok(None)),
			None => true,
		}
	}

	/// Polls for exit until `timeout`; returns whether the process exited.
	pub async fn wait_for_exit(&self, timeout: Duration) -> bool {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			if self.has_exited() {
				return true;
			}
			if tokio::time::Instant::now() >= deadline {
				return false;
			}
			tokio::time::sleep(EXIT_POLL_INTERVAL).await;
		}
	}

	/// Force-terminates the process using the platform policy.
	///
	/// Safe to call any number of times and from any thread. A process that
	/// already exited on its own is not signalled, since its pid may belong to
	/// something else by now.
	pub fn kill(&self) {
		if self.killed.swap(true, Ordering::SeqCst) {
			return;
		}
		registry().forget(self);

		let mut guard = self.child.lock();
		let Some(child) = guard.as_mut() else {
			return;
		};
		if let Ok(Some(status)) = child.try_wait() {
			debug!(target = "clicker.process", pid = self.pid, %status, "browser already exited");
			return;
		}

		platform::current().kill_by_pid(self.pid);
		info!(target = "clicker.process", pid = self.pid, "browser killed");
	}
}

impl Drop for BrowserProcess {
	fn drop(&mut self) {
		self.kill();
	}
}

/// Process-wide set of live browser hosts, used for panic cleanup.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
	processes: Mutex<HashMap<u32, Weak<BrowserProcess>>>,
}

impl ProcessRegistry {
	fn register(&self, process: &Arc<BrowserProcess>) {
		self.processes.lock().insert(process.pid, Arc::downgrade(process));
	}

	fn forget(&self, process: &BrowserProcess) {
		let mut processes = self.processes.lock();
		if let Some(entry) = processes.get(&process.pid) {
			if std::ptr::eq(entry.as_ptr(), process) {
				processes.remove(&process.pid);
			}
		}
	}

	/// Number of tracked processes.
	pub fn len(&self) -> usize {
		self.processes.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains(&self, pid: u32) -> bool {
		self.processes.lock().contains_key(&pid)
	}

	/// Kills every tracked process and returns how many were live.
	pub fn kill_all(&self) -> usize {
		let live: Vec<Arc<BrowserProcess>> = self
			.processes
			.lock()
			.drain()
			.filter_map(|(_, process)| process.upgrade())
			.collect();

		for process in &live {
			process.kill();
		}
		live.len()
	}
}

static REGISTRY: LazyLock<ProcessRegistry> = LazyLock::new(ProcessRegistry::default);

/// The process-wide registry.
pub fn registry() -> &'static ProcessRegistry {
	&REGISTRY
}

/// Shuts the browser host down.
///
/// Unless the platform skips it, `browser.close` is sent first over
/// `connection` and given a bounded time to take effect. The process is always
/// killed afterwards.
pub async fn shutdown(process: &BrowserProcess, connection: Option<&Connection>) {
	match connection {
		Some(conn) if process.graceful_shutdown() => {
			let close = conn.send_command("browser.close", serde_json::json!({}));
			match tokio::time::timeout(GRACEFUL_CLOSE_TIMEOUT, close).await {
				Ok(Ok(_)) => {
					debug!(target = "clicker.process", pid = process.pid(), "browser.close acknowledged");
					process.wait_for_exit(GRACEFUL_EXIT_WAIT).await;
				}
				Ok(Err(err)) => {
					debug!(target = "clicker.process", pid = process.pid(), error = %err, "browser.close failed");
				}
				Err(_) => {
					warn!(target = "clicker.process", pid = process.pid(), "browser.close timed out");
				}
			}
		}
		Some(_) => {
			debug!(
				target = "clicker.process",
				pid = process.pid(),
				"skipping graceful close on this platform"
			);
		}
		None => {}
	}

	process.kill();
}
