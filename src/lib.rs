//! Bridge exposing Proxmox VE operations as callable tools.
//!
//! Inventory queries, VM provisioning, power-state control, and guest-agent
//! command execution are offered as named tools reachable through two front
//! ends: an MCP stdio protocol adapter and a generated REST surface. The
//! hypervisor remains the sole source of truth: every operation re-queries
//! it, and mutations come back as task handles that can be awaited through
//! the task tracker.
//!
//! # Examples
//!
//! ```no_run
//! use pve_bridge::config::{Options, ProxmoxConfig};
//! use pve_bridge::core::infrastructure::api_client::ApiClient;
//! use pve_bridge::core::infrastructure::hypervisor::PveApi;
//! use pve_bridge::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! # async fn run() -> pve_bridge::error::BridgeResult<()> {
//! let proxmox = ProxmoxConfig {
//!     host: "proxmox.example.com".into(),
//!     port: 8006,
//!     username: "root".into(),
//!     password: "secret".into(),
//!     realm: "pam".into(),
//!     verify_ssl: false,
//! };
//! let client = Arc::new(ApiClient::new(&proxmox, None)?);
//! let registry = ToolRegistry::new(Arc::new(PveApi::new(client)), &Options::default());
//! let text = registry.call("get_nodes", &serde_json::json!({})).await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod service;
pub mod tools;

pub use crate::core::domain::error;
pub use crate::core::domain::error::{BridgeError, BridgeResult};
pub use crate::core::domain::model;
