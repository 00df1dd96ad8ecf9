//! VM provisioning.
//!
//! Composes a validated creation request and a resolved storage descriptor
//! into one hypervisor creation call. The duplicate pre-check is best-effort;
//! true vmid uniqueness is enforced by the hypervisor, whose rejection
//! surfaces as a conflict.

use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::core::domain::model::{CreateVmParams, StorageDescriptor, TaskHandle};
use crate::core::infrastructure::hypervisor::Hypervisor;
use crate::service::storage::StorageResolver;
use crate::service::validate::CreateVmRequest;
use std::sync::Arc;

const DEFAULT_OSTYPE: &str = "l26";

/// Outcome of a successful submission: the enqueued task plus the storage
/// choice that shaped the disk, for reporting.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub task: TaskHandle,
    pub storage: StorageDescriptor,
}

pub struct VmProvisioner {
    api: Arc<dyn Hypervisor>,
    resolver: StorageResolver,
}

impl VmProvisioner {
    pub fn new(api: Arc<dyn Hypervisor>, resolver: StorageResolver) -> Self {
        Self { api, resolver }
    }

    /// Submits a creation task for the requested VM. Returns without waiting
    /// for completion; awaiting the task is the caller's responsibility.
    /// No retry on failure; a retried create could duplicate identifiers.
    pub async fn create(&self, request: &CreateVmRequest) -> BridgeResult<Provisioned> {
        if let Some(existing) = self.api.vm_config(&request.node, request.vmid).await? {
            let name = existing.name.unwrap_or_else(|| "unnamed".to_string());
            return Err(BridgeError::Conflict(format!(
                "VM {} ({name}) already exists on node {}",
                request.vmid, request.node
            )));
        }

        let storage = self
            .resolver
            .resolve(&request.node, request.storage.as_deref())
            .await?;

        let params = build_params(request, &storage);
        tracing::info!(
            node = %request.node,
            vmid = request.vmid,
            pool = %storage.pool,
            format = storage.format.as_str(),
            "submitting VM creation"
        );
        let task = self.api.create_vm(&request.node, &params).await?;
        Ok(Provisioned { task, storage })
    }
}

fn build_params(request: &CreateVmRequest, storage: &StorageDescriptor) -> CreateVmParams {
    CreateVmParams {
        vmid: request.vmid,
        name: request.name.clone(),
        cores: request.cores,
        memory: request.memory_mb,
        ostype: request
            .ostype
            .clone()
            .unwrap_or_else(|| DEFAULT_OSTYPE.to_string()),
        scsihw: "virtio-scsi-pci".to_string(),
        boot: "order=scsi0".to_string(),
        agent: 1,
        vga: "std".to_string(),
        net0: "virtio,bridge=vmbr0".to_string(),
        scsi0: format!(
            "{}:{},format={}",
            storage.pool,
            request.disk_gb,
            storage.format.as_str()
        ),
        ide2: storage
            .supports_cloudinit
            .then(|| format!("{}:cloudinit", storage.pool)),
    }
}
