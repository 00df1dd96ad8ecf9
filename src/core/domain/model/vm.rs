//! Domain models for QEMU virtual machine operations.
//!
//! This module defines the structures used when interacting with VMs via the
//! Proxmox API. Field names mirror the wire format.

use serde::{Deserialize, Serialize};

/// A virtual machine as returned by the `/nodes/{node}/qemu` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VmListItem {
    /// The VM identifier (unique per cluster).
    pub vmid: u32,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Current status (e.g., "running", "stopped").
    pub status: String,
    /// CPU usage fraction (0.0 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    /// Allocated vCPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxcpu: Option<u32>,
    /// Memory usage in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    /// Maximum memory in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    /// Uptime in seconds (if running).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

/// Power state of a VM or container, derived from the upstream status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Running,
    Stopped,
    Paused,
    Unknown,
}

impl PowerState {
    pub fn from_status(status: &str) -> Self {
        match status {
            "running" => PowerState::Running,
            "stopped" => PowerState::Stopped,
            "paused" => PowerState::Paused,
            _ => PowerState::Unknown,
        }
    }
}

/// Runtime status of a VM from `/nodes/{node}/qemu/{vmid}/status/current`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VmStatusCurrent {
    /// Current status string (e.g., "running", "stopped", "paused").
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// QEMU guest agent enabled flag from the config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<u8>,
}

impl VmStatusCurrent {
    pub fn power(&self) -> PowerState {
        PowerState::from_status(&self.status)
    }
}

/// Subset of a VM configuration from `/nodes/{node}/qemu/{vmid}/config`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VmConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Number of cores per socket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sockets: Option<u32>,
    /// Memory in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ostype: Option<String>,
}

/// Parameters submitted to `POST /nodes/{node}/qemu` when creating a VM.
///
/// Built by the provisioner from a validated request plus a resolved storage
/// descriptor; never constructed from raw user input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateVmParams {
    pub vmid: u32,
    pub name: String,
    pub cores: u32,
    /// Memory in MB.
    pub memory: u32,
    pub ostype: String,
    pub scsihw: String,
    pub boot: String,
    /// QEMU guest agent enabled (1).
    pub agent: u8,
    pub vga: String,
    /// Virtualized NIC on the default bridge.
    pub net0: String,
    /// Primary disk, e.g. `local-lvm:10,format=raw`.
    pub scsi0: String,
    /// Cloud-init drive, only on file-based storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ide2: Option<String>,
}

/// Result of `agent/exec-status` for a guest-agent command.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecStatus {
    /// Non-zero once the process has exited.
    #[serde(default)]
    pub exited: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitcode: Option<i64>,
    #[serde(default, rename = "out-data", skip_serializing_if = "Option::is_none")]
    pub out_data: Option<String>,
    #[serde(default, rename = "err-data", skip_serializing_if = "Option::is_none")]
    pub err_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_from_status_strings() {
        assert_eq!(PowerState::from_status("running"), PowerState::Running);
        assert_eq!(PowerState::from_status("stopped"), PowerState::Stopped);
        assert_eq!(PowerState::from_status("paused"), PowerState::Paused);
        assert_eq!(PowerState::from_status("prelaunch"), PowerState::Unknown);
    }

    #[test]
    fn create_params_omit_cloudinit_drive_when_absent() {
        let params = CreateVmParams {
            vmid: 200,
            name: "test".into(),
            cores: 1,
            memory: 2048,
            ostype: "l26".into(),
            scsihw: "virtio-scsi-pci".into(),
            boot: "order=scsi0".into(),
            agent: 1,
            vga: "std".into(),
            net0: "virtio,bridge=vmbr0".into(),
            scsi0: "local-lvm:10,format=raw".into(),
            ide2: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("ide2").is_none());
        assert_eq!(json["scsi0"], "local-lvm:10,format=raw");
    }
}
