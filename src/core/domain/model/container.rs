//! Domain model for LXC containers.

use serde::{Deserialize, Serialize};

/// A container as returned by the `/nodes/{node}/lxc` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CtListItem {
    /// The container identifier (shares the vmid space with VMs).
    pub vmid: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// Current status (e.g., "running", "stopped").
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxcpu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Set to 1 when this is a template rather than a runnable container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<u8>,
}
