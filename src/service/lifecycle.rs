//! Power transitions and deletion for existing VMs.
//!
//! Start, stop, shutdown, and reset are forwarded to the hypervisor without
//! client-side state checks; invalid transitions are the hypervisor's to
//! reject, and that rejection comes back through the error mapper. Deletion
//! guards the running state locally because it is irreversible.

use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::core::domain::model::{PowerState, TaskHandle, TaskState};
use crate::core::infrastructure::hypervisor::{Hypervisor, PowerAction};
use crate::service::tasks::TaskTracker;
use std::sync::Arc;
use tokio::time::Duration;

pub struct LifecycleController {
    api: Arc<dyn Hypervisor>,
    tracker: TaskTracker,
    /// Bound on the stop task awaited during a forced delete.
    stop_timeout: Duration,
}

impl LifecycleController {
    pub fn new(api: Arc<dyn Hypervisor>, tracker: TaskTracker, stop_timeout: Duration) -> Self {
        Self {
            api,
            tracker,
            stop_timeout,
        }
    }

    /// Submits a power transition without checking the current state first.
    pub async fn transition(
        &self,
        node: &str,
        vmid: u32,
        action: PowerAction,
    ) -> BridgeResult<TaskHandle> {
        tracing::info!(node, vmid, action = action.endpoint(), "power transition");
        self.api.vm_power(node, vmid, action).await
    }

    /// Deletes a VM. Refuses while the VM is running unless `force` is set,
    /// in which case a stop task is submitted and awaited to success before
    /// the delete is issued. Irreversible; there is no recycle state.
    pub async fn delete(&self, node: &str, vmid: u32, force: bool) -> BridgeResult<TaskHandle> {
        let status = self.api.vm_status(node, vmid).await?;

        if status.power() == PowerState::Running {
            if !force {
                let name = status.name.as_deref().unwrap_or("unnamed");
                return Err(BridgeError::Conflict(format!(
                    "VM {vmid} ({name}) is running; stop it first or pass force=true"
                )));
            }
            let stop = self.api.vm_power(node, vmid, PowerAction::Stop).await?;
            let outcome = self.tracker.await_task(&stop, self.stop_timeout).await?;
            if outcome.state != TaskState::Succeeded {
                let detail = outcome.detail.unwrap_or_else(|| "no detail".to_string());
                return Err(if outcome.timed_out {
                    BridgeError::Timeout(format!("stop of VM {vmid} before delete: {detail}"))
                } else {
                    BridgeError::Upstream {
                        status: None,
                        message: format!("stop of VM {vmid} before delete failed: {detail}"),
                    }
                });
            }
        }

        tracing::info!(node, vmid, force, "submitting VM deletion");
        self.api.delete_vm(node, vmid).await
    }
}
