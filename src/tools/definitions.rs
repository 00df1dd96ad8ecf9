//! Tool names, descriptions, and input schemas.
//!
//! One entry per callable tool; the MCP front end serves these verbatim from
//! `tools/list`, and the REST front end uses the names as endpoint paths.

use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn no_params() -> Value {
    json!({"type": "object", "properties": {}, "required": []})
}

fn instance_params() -> Value {
    json!({
        "type": "object",
        "properties": {
            "node": {"type": "string", "description": "Host node name (e.g. 'pve')"},
            "vmid": {"type": "string", "description": "VM ID number (e.g. '101')"}
        },
        "required": ["node", "vmid"]
    })
}

pub fn all() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "get_nodes",
            description: "List all nodes in the Proxmox cluster with their status, CPU, and memory usage.",
            input_schema: no_params(),
        },
        ToolDef {
            name: "get_node_status",
            description: "Get detailed status information for a specific Proxmox node.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "node": {"type": "string", "description": "Name of node to query (e.g. 'pve1')"}
                },
                "required": ["node"]
            }),
        },
        ToolDef {
            name: "get_vms",
            description: "List all virtual machines across the cluster with their status and resource usage.",
            input_schema: no_params(),
        },
        ToolDef {
            name: "get_containers",
            description: "List all LXC containers across the cluster with their status.",
            input_schema: no_params(),
        },
        ToolDef {
            name: "get_storage",
            description: "List storage pools across the cluster with their usage and backend type.",
            input_schema: no_params(),
        },
        ToolDef {
            name: "get_cluster_status",
            description: "Get overall Proxmox cluster health and quorum status.",
            input_schema: no_params(),
        },
        ToolDef {
            name: "create_vm",
            description: "Create a new virtual machine with the given configuration. \
                The disk format is chosen from the storage backend: block-backed pools \
                (lvm, lvmthin) get raw images, file-backed pools (dir, nfs, cifs) get \
                qcow2 with a cloud-init drive.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "node": {"type": "string", "description": "Host node name (e.g. 'pve')"},
                    "vmid": {"type": "string", "description": "New VM ID number (e.g. '200')"},
                    "name": {"type": "string", "description": "VM name (e.g. 'web-server')"},
                    "cpus": {"type": "integer", "minimum": 1, "maximum": 32, "description": "Number of CPU cores"},
                    "memory": {"type": "integer", "minimum": 512, "maximum": 131072, "description": "Memory size in MB"},
                    "disk_size": {"type": "integer", "minimum": 5, "maximum": 1000, "description": "Disk size in GB"},
                    "storage": {"type": "string", "description": "Storage pool name (optional, auto-detected when omitted)"},
                    "ostype": {"type": "string", "description": "OS type (optional, default 'l26' for Linux)"}
                },
                "required": ["node", "vmid", "name", "cpus", "memory", "disk_size"]
            }),
        },
        ToolDef {
            name: "start_vm",
            description: "Start a virtual machine.",
            input_schema: instance_params(),
        },
        ToolDef {
            name: "stop_vm",
            description: "Stop a virtual machine (force stop).",
            input_schema: instance_params(),
        },
        ToolDef {
            name: "shutdown_vm",
            description: "Shut down a virtual machine gracefully.",
            input_schema: instance_params(),
        },
        ToolDef {
            name: "reset_vm",
            description: "Reset (hard restart) a virtual machine.",
            input_schema: instance_params(),
        },
        ToolDef {
            name: "delete_vm",
            description: "Permanently delete a virtual machine, its disks, and its snapshots. \
                Refuses while the VM is running unless force is set.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "node": {"type": "string", "description": "Host node name (e.g. 'pve')"},
                    "vmid": {"type": "string", "description": "VM ID number (e.g. '998')"},
                    "force": {"type": "boolean", "description": "Stop the VM first if it is running (default false)"}
                },
                "required": ["node", "vmid"]
            }),
        },
        ToolDef {
            name: "execute_vm_command",
            description: "Execute a shell command inside a running VM via the QEMU guest agent.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "node": {"type": "string", "description": "Host node name (e.g. 'pve')"},
                    "vmid": {"type": "string", "description": "VM ID number (e.g. '100')"},
                    "command": {"type": "string", "description": "Shell command to run (e.g. 'uname -a')"}
                },
                "required": ["node", "vmid", "command"]
            }),
        },
    ]
}
