//! Domain models for storage pools and the backend classification that picks
//! a compatible disk image format.

use serde::{Deserialize, Serialize};

/// A storage pool as returned by `/nodes/{node}/storage`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoragePool {
    /// Pool identifier (e.g., `local-lvm`, `vm-storage`).
    pub storage: String,
    /// Storage plugin type (e.g., `lvm`, `lvmthin`, `dir`, `nfs`, `cifs`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Comma-separated content types this pool may hold (e.g., `images,rootdir`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Whether the pool is active on the queried node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<u8>,
    /// Whether the pool is shared across nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<u8>,
    /// Total capacity in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Used space in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<u64>,
    /// Available space in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avail: Option<u64>,
}

impl StoragePool {
    /// True when the pool can hold VM disk images.
    pub fn supports_images(&self) -> bool {
        self.content
            .as_deref()
            .map(|c| c.split(',').any(|part| part.trim() == "images"))
            .unwrap_or(false)
    }
}

/// Backend class of a storage pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Logical-volume or raw block device backed. No general filesystem.
    Block,
    /// Filesystem backed (local directory, NFS, CIFS).
    File,
}

/// Disk image format supported by a storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    Raw,
    Qcow2,
}

impl DiskFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DiskFormat::Raw => "raw",
            DiskFormat::Qcow2 => "qcow2",
        }
    }
}

/// Derived description of a storage pool, recomputed per request.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageDescriptor {
    pub pool: String,
    pub backend: StorageBackend,
    pub format: DiskFormat,
    /// File-based pools can hold a cloud-init image alongside the disk.
    pub supports_cloudinit: bool,
    pub supports_snapshots: bool,
}

impl StorageDescriptor {
    /// Classifies a pool by its plugin type.
    ///
    /// Block-backed types (`lvm`, `lvmthin`, `zfspool`) take `raw` images and
    /// cannot hold a cloud-init file; filesystem types (`dir`, `nfs`, `cifs`)
    /// take `qcow2` with cloud-init and snapshot support. Unknown plugin
    /// types are treated as block-backed.
    pub fn classify(pool: &str, kind: &str) -> Self {
        match kind {
            "dir" | "nfs" | "cifs" => StorageDescriptor {
                pool: pool.to_string(),
                backend: StorageBackend::File,
                format: DiskFormat::Qcow2,
                supports_cloudinit: true,
                supports_snapshots: true,
            },
            "lvmthin" | "zfspool" => StorageDescriptor {
                pool: pool.to_string(),
                backend: StorageBackend::Block,
                format: DiskFormat::Raw,
                supports_cloudinit: false,
                supports_snapshots: true,
            },
            _ => StorageDescriptor {
                pool: pool.to_string(),
                backend: StorageBackend::Block,
                format: DiskFormat::Raw,
                supports_cloudinit: false,
                supports_snapshots: false,
            },
        }
    }
}
