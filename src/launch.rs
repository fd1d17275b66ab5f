//! Data structures for tracking launch state.
//!
//! A `LaunchState` pairs one immutable `LaunchConfig` with everything that
//! changes over the process's runtime: status, log buffer, the live child
//! handle, and the last exit code. States are created once at startup and
//! live for the whole session; a relaunch re-arms the same entry.

use tokio::process::Child;

use crate::config::LaunchConfig;
use crate::output::{LogBuffer, MAX_LOG_LINES};

/// The current lifecycle status of a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// Never started (initial state).
    NotStarted,
    /// Spawned, waiting for the readiness marker.
    Starting,
    /// Actively running.
    Running,
    /// Exited with code 0.
    Finished,
    /// Exited non-zero, was killed by a signal, or failed to spawn.
    Failed,
    /// Terminated by the user.
    Stopped,
}

impl LaunchStatus {
    /// Sidebar label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            LaunchStatus::NotStarted => "Not started",
            LaunchStatus::Starting => "Starting",
            LaunchStatus::Running => "Running",
            LaunchStatus::Finished => "Finished",
            LaunchStatus::Failed => "Failed",
            LaunchStatus::Stopped => "Stopped",
        }
    }
}

/// Runtime state of a single launch.
///
/// `child` is present if and only if the status is `Starting` or `Running`;
/// it is cleared the instant the process exits or is terminated.
#[derive(Debug)]
pub struct LaunchState {
    pub config: LaunchConfig,
    pub status: LaunchStatus,
    pub log: LogBuffer,
    pub child: Option<Child>,
    pub exit_code: Option<i32>,
}

impl LaunchState {
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            config,
            status: LaunchStatus::NotStarted,
            log: LogBuffer::new(MAX_LOG_LINES),
            child: None,
            exit_code: None,
        }
    }
}
