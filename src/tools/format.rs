//! Plain-text rendering of tool results.

use crate::core::domain::model::{
    ClusterStatusItem, CtListItem, NodeListItem, NodeStatus, StorageDescriptor, StoragePool,
    TaskHandle,
};
use crate::service::Provisioned;
use crate::service::validate::CreateVmRequest;
use std::fmt::Write;

/// One row of the cluster-wide VM listing, enriched with the core count from
/// the VM's config when that fetch succeeded.
#[derive(Debug, Clone)]
pub struct VmSummary {
    pub vmid: u32,
    pub name: String,
    pub status: String,
    pub node: String,
    pub cores: Option<u32>,
    pub mem: u64,
    pub maxmem: u64,
}

pub fn bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = value as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn nodes(items: &[NodeListItem]) -> String {
    let mut out = String::from("Proxmox nodes:\n");
    for n in items {
        let _ = writeln!(
            out,
            "  {} [{}]  cpu: {:.0}%  memory: {} / {}",
            n.node,
            n.status,
            n.cpu.unwrap_or(0.0) * 100.0,
            bytes(n.mem.unwrap_or(0)),
            bytes(n.maxmem.unwrap_or(0)),
        );
    }
    out
}

pub fn node_status(node: &str, status: &NodeStatus) -> String {
    let mut out = format!("Node {node}:\n");
    if let Some(uptime) = status.uptime {
        let _ = writeln!(out, "  uptime: {}h", uptime / 3600);
    }
    if let Some(cpu) = status.cpu {
        let _ = writeln!(out, "  cpu: {:.0}%", cpu * 100.0);
    }
    if let Some(mem) = &status.memory {
        let _ = writeln!(out, "  memory: {} / {}", bytes(mem.used), bytes(mem.total));
    }
    if let Some(ver) = &status.pveversion {
        let _ = writeln!(out, "  version: {ver}");
    }
    out
}

pub fn vms(items: &[VmSummary]) -> String {
    if items.is_empty() {
        return "No virtual machines found.".to_string();
    }
    let mut out = String::from("Virtual machines:\n");
    for vm in items {
        let cores = vm
            .cores
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "  {} {} [{}] on {}  cores: {}  memory: {} / {}",
            vm.vmid,
            vm.name,
            vm.status,
            vm.node,
            cores,
            bytes(vm.mem),
            bytes(vm.maxmem),
        );
    }
    out
}

pub fn containers(items: &[(String, CtListItem)]) -> String {
    if items.is_empty() {
        return "No containers found.".to_string();
    }
    let mut out = String::from("Containers:\n");
    for (node, ct) in items {
        let _ = writeln!(
            out,
            "  {} {} [{}] on {}  memory: {} / {}",
            ct.vmid,
            ct.name.as_deref().unwrap_or("unnamed"),
            ct.status,
            node,
            bytes(ct.mem.unwrap_or(0)),
            bytes(ct.maxmem.unwrap_or(0)),
        );
    }
    out
}

pub fn storage(items: &[StoragePool]) -> String {
    if items.is_empty() {
        return "No storage pools found.".to_string();
    }
    let mut out = String::from("Storage pools:\n");
    for pool in items {
        let _ = writeln!(
            out,
            "  {} [{}]  used: {} / {}",
            pool.storage,
            pool.kind,
            bytes(pool.used.unwrap_or(0)),
            bytes(pool.total.unwrap_or(0)),
        );
    }
    out
}

pub fn cluster_status(items: &[ClusterStatusItem]) -> String {
    let mut out = String::from("Cluster status:\n");
    for item in items {
        match item.kind.as_str() {
            "cluster" => {
                let quorate = if item.quorate == Some(1) { "ok" } else { "lost" };
                let _ = writeln!(
                    out,
                    "  cluster {}  quorum: {}  nodes: {}",
                    item.name,
                    quorate,
                    item.nodes.unwrap_or(0),
                );
            }
            "node" => {
                let online = if item.online == Some(1) { "online" } else { "offline" };
                let _ = writeln!(out, "  node {} [{}]", item.name, online);
            }
            _ => {}
        }
    }
    out
}

pub fn vm_created(request: &CreateVmRequest, provisioned: &Provisioned) -> String {
    let storage: &StorageDescriptor = &provisioned.storage;
    let mut out = format!(
        "VM {} creation submitted on node {}.\n\
         Configuration:\n\
         \x20 name: {}\n\
         \x20 cores: {}\n\
         \x20 memory: {} MB\n\
         \x20 disk: {} GB on {} ({} format)\n\
         \x20 network: virtio on bridge vmbr0\n\
         \x20 QEMU guest agent: enabled\n",
        request.vmid,
        request.node,
        request.name,
        request.cores,
        request.memory_mb,
        request.disk_gb,
        storage.pool,
        storage.format.as_str(),
    );
    if !storage.supports_cloudinit {
        out.push_str("  note: block-backed storage, no cloud-init drive attached\n");
    }
    let _ = writeln!(out, "Task: {}", provisioned.task.upid);
    out
}

pub fn task_submitted(operation: &str, vmid: u32, task: &TaskHandle) -> String {
    format!("VM {vmid} {operation} initiated.\nTask: {}", task.upid)
}

pub fn command_output(
    command: &str,
    exitcode: Option<i64>,
    stdout: Option<&str>,
    stderr: Option<&str>,
) -> String {
    let mut out = format!(
        "Command: {command}\nExit code: {}\n",
        exitcode.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())
    );
    if let Some(text) = stdout {
        if !text.is_empty() {
            let _ = writeln!(out, "Output:\n{text}");
        }
    }
    if let Some(text) = stderr {
        if !text.is_empty() {
            let _ = writeln!(out, "Errors:\n{text}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_picks_sensible_units() {
        assert_eq!(bytes(512), "512 B");
        assert_eq!(bytes(2048), "2.0 KiB");
        assert_eq!(bytes(4 * 1024 * 1024 * 1024), "4.0 GiB");
    }

    #[test]
    fn vm_listing_marks_missing_core_counts() {
        let rendered = vms(&[VmSummary {
            vmid: 100,
            name: "web".into(),
            status: "running".into(),
            node: "pve".into(),
            cores: None,
            mem: 0,
            maxmem: 0,
        }]);
        assert!(rendered.contains("cores: N/A"));
    }

    #[test]
    fn empty_listings_say_so() {
        assert!(vms(&[]).contains("No virtual machines"));
        assert!(storage(&[]).contains("No storage pools"));
    }
}
