//! Domain model for cluster-wide health, from `/cluster/status`.
//!
//! The endpoint returns a heterogeneous list: one `cluster` entry with quorum
//! information plus one `node` entry per member.

use serde::{Deserialize, Serialize};

/// One entry from the `/cluster/status` list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterStatusItem {
    /// Entry discriminator: `cluster` or `node`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Quorate flag (cluster entry only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorate: Option<u8>,
    /// Member count (cluster entry only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    /// Online flag (node entries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Set when this node entry is the one answering the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<u8>,
}
