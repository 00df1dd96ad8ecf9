//! Domain models for asynchronous Proxmox tasks.
//!
//! Every mutating operation (create, power transitions, delete) returns a
//! UPID that is polled until it reaches a terminal state.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Handle for a task submitted to the hypervisor. Immutable once issued.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskHandle {
    /// The node the task runs on.
    pub node: String,
    /// The opaque UPID returned by Proxmox (e.g., `UPID:pve:000A1B2C:...`).
    pub upid: String,
    /// When the task was submitted, as observed locally.
    pub submitted_at: SystemTime,
}

impl TaskHandle {
    pub fn new(node: impl Into<String>, upid: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            upid: upid.into(),
            submitted_at: SystemTime::now(),
        }
    }
}

/// Terminal and non-terminal task states.
///
/// Transitions are monotonic: pending -> running -> {succeeded, failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Resolved status of a task, as reported by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    pub upid: String,
    pub state: TaskState,
    /// Failure detail from the hypervisor, when the task failed upstream.
    pub detail: Option<String>,
    /// Set when the tracker gave up waiting rather than observing a
    /// hypervisor-reported terminal state.
    pub timed_out: bool,
}

/// Raw task status from `/nodes/{node}/tasks/{upid}/status`.
///
/// Proxmox reports `status: "running"` while in flight and
/// `status: "stopped"` with an `exitstatus` once done; `"OK"` means success.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskStatusRaw {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitstatus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
}

impl TaskStatusRaw {
    /// Folds the raw Proxmox representation into a [`TaskState`] plus
    /// optional failure detail.
    pub fn resolve(&self) -> (TaskState, Option<String>) {
        if self.status != "stopped" {
            return (TaskState::Running, None);
        }
        match self.exitstatus.as_deref() {
            Some("OK") => (TaskState::Succeeded, None),
            Some(other) => (TaskState::Failed, Some(other.to_string())),
            None => (TaskState::Failed, Some("task stopped without exit status".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_task_is_not_terminal() {
        let raw = TaskStatusRaw {
            status: "running".into(),
            exitstatus: None,
            node: None,
            pid: None,
        };
        let (state, detail) = raw.resolve();
        assert_eq!(state, TaskState::Running);
        assert!(!state.is_terminal());
        assert!(detail.is_none());
    }

    #[test]
    fn stopped_ok_resolves_to_succeeded() {
        let raw = TaskStatusRaw {
            status: "stopped".into(),
            exitstatus: Some("OK".into()),
            node: None,
            pid: None,
        };
        assert_eq!(raw.resolve(), (TaskState::Succeeded, None));
    }

    #[test]
    fn stopped_with_error_carries_detail() {
        let raw = TaskStatusRaw {
            status: "stopped".into(),
            exitstatus: Some("command failed: exit code 1".into()),
            node: None,
            pid: None,
        };
        let (state, detail) = raw.resolve();
        assert_eq!(state, TaskState::Failed);
        assert_eq!(detail.as_deref(), Some("command failed: exit code 1"));
    }
}
