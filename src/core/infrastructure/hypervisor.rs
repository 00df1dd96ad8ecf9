//! The hypervisor collaborator seam.
//!
//! Services depend on [`Hypervisor`] rather than the HTTP client directly so
//! the orchestration logic can be tested against a mock. [`PveApi`] is the
//! production implementation backed by [`ApiClient`].

use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::core::domain::model::{
    ClusterStatusItem, CreateVmParams, CtListItem, ExecStatus, NodeListItem, NodeStatus,
    StoragePool, TaskHandle, TaskStatusRaw, VmConfig, VmListItem, VmStatusCurrent,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::api_client::ApiClient;

/// Power transition submitted to `/nodes/{node}/qemu/{vmid}/status/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Start,
    Stop,
    Shutdown,
    Reset,
}

impl PowerAction {
    pub fn endpoint(self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Stop => "stop",
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reset => "reset",
        }
    }
}

/// Inventory queries and task submissions against the virtualization
/// platform. One method per upstream call; no caching anywhere, the
/// hypervisor is the sole source of truth.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Hypervisor: Send + Sync {
    async fn list_nodes(&self) -> BridgeResult<Vec<NodeListItem>>;
    async fn node_status(&self, node: &str) -> BridgeResult<NodeStatus>;
    async fn list_vms(&self, node: &str) -> BridgeResult<Vec<VmListItem>>;
    /// Fetches a VM's config; `Ok(None)` when the vmid is unknown on the node.
    async fn vm_config(&self, node: &str, vmid: u32) -> BridgeResult<Option<VmConfig>>;
    async fn vm_status(&self, node: &str, vmid: u32) -> BridgeResult<VmStatusCurrent>;
    async fn create_vm(&self, node: &str, params: &CreateVmParams) -> BridgeResult<TaskHandle>;
    async fn vm_power(&self, node: &str, vmid: u32, action: PowerAction)
        -> BridgeResult<TaskHandle>;
    async fn delete_vm(&self, node: &str, vmid: u32) -> BridgeResult<TaskHandle>;
    /// Starts a guest-agent command, returning its pid.
    async fn agent_exec(&self, node: &str, vmid: u32, command: &str) -> BridgeResult<u64>;
    async fn agent_exec_status(&self, node: &str, vmid: u32, pid: u64) -> BridgeResult<ExecStatus>;
    async fn list_containers(&self, node: &str) -> BridgeResult<Vec<CtListItem>>;
    async fn list_storage(&self, node: &str) -> BridgeResult<Vec<StoragePool>>;
    async fn cluster_status(&self) -> BridgeResult<Vec<ClusterStatusItem>>;
    async fn task_status(&self, node: &str, upid: &str) -> BridgeResult<TaskStatusRaw>;
}

/// Production [`Hypervisor`] backed by the authenticated API client.
pub struct PveApi {
    client: Arc<ApiClient>,
}

impl PveApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct AgentExecResponse {
    pid: u64,
}

/// Proxmox reports a missing vmid as an error body mentioning that the
/// configuration file does not exist, not always as a clean 404.
fn is_missing_vm(err: &BridgeError) -> bool {
    match err {
        BridgeError::NotFound(_) => true,
        BridgeError::Upstream { message, .. } => {
            message.to_lowercase().contains("does not exist")
        }
        _ => false,
    }
}

#[async_trait]
impl Hypervisor for PveApi {
    async fn list_nodes(&self) -> BridgeResult<Vec<NodeListItem>> {
        self.client.get("nodes").await
    }

    async fn node_status(&self, node: &str) -> BridgeResult<NodeStatus> {
        self.client.get(&format!("nodes/{node}/status")).await
    }

    async fn list_vms(&self, node: &str) -> BridgeResult<Vec<VmListItem>> {
        self.client.get(&format!("nodes/{node}/qemu")).await
    }

    async fn vm_config(&self, node: &str, vmid: u32) -> BridgeResult<Option<VmConfig>> {
        match self
            .client
            .get::<VmConfig>(&format!("nodes/{node}/qemu/{vmid}/config"))
            .await
        {
            Ok(config) => Ok(Some(config)),
            Err(err) if is_missing_vm(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn vm_status(&self, node: &str, vmid: u32) -> BridgeResult<VmStatusCurrent> {
        self.client
            .get(&format!("nodes/{node}/qemu/{vmid}/status/current"))
            .await
    }

    async fn create_vm(&self, node: &str, params: &CreateVmParams) -> BridgeResult<TaskHandle> {
        let upid: String = self.client.post(&format!("nodes/{node}/qemu"), params).await?;
        Ok(TaskHandle::new(node, upid))
    }

    async fn vm_power(
        &self,
        node: &str,
        vmid: u32,
        action: PowerAction,
    ) -> BridgeResult<TaskHandle> {
        let upid: String = self
            .client
            .post_empty(&format!(
                "nodes/{node}/qemu/{vmid}/status/{}",
                action.endpoint()
            ))
            .await?;
        Ok(TaskHandle::new(node, upid))
    }

    async fn delete_vm(&self, node: &str, vmid: u32) -> BridgeResult<TaskHandle> {
        let upid: String = self.client.delete(&format!("nodes/{node}/qemu/{vmid}")).await?;
        Ok(TaskHandle::new(node, upid))
    }

    async fn agent_exec(&self, node: &str, vmid: u32, command: &str) -> BridgeResult<u64> {
        let body = serde_json::json!({
            "command": ["/bin/sh", "-c", command],
        });
        let response: AgentExecResponse = self
            .client
            .post(&format!("nodes/{node}/qemu/{vmid}/agent/exec"), &body)
            .await?;
        Ok(response.pid)
    }

    async fn agent_exec_status(&self, node: &str, vmid: u32, pid: u64) -> BridgeResult<ExecStatus> {
        self.client
            .get(&format!(
                "nodes/{node}/qemu/{vmid}/agent/exec-status?pid={pid}"
            ))
            .await
    }

    async fn list_containers(&self, node: &str) -> BridgeResult<Vec<CtListItem>> {
        self.client.get(&format!("nodes/{node}/lxc")).await
    }

    async fn list_storage(&self, node: &str) -> BridgeResult<Vec<StoragePool>> {
        self.client.get(&format!("nodes/{node}/storage")).await
    }

    async fn cluster_status(&self) -> BridgeResult<Vec<ClusterStatusItem>> {
        self.client.get("cluster/status").await
    }

    async fn task_status(&self, node: &str, upid: &str) -> BridgeResult<TaskStatusRaw> {
        self.client
            .get(&format!("nodes/{node}/tasks/{upid}/status"))
            .await
    }
}
