//! Storage pool resolution.
//!
//! Picks a pool for a new VM disk and classifies its backend to select a
//! compatible image format. The classification is re-derived on every request
//! because pool backends can change under us.

use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::core::domain::model::{StorageDescriptor, StoragePool};
use crate::core::infrastructure::hypervisor::Hypervisor;
use std::sync::Arc;

/// Pools tried first during auto-detection, in order.
const PREFERRED_POOLS: [&str; 2] = ["local-lvm", "vm-storage"];

pub struct StorageResolver {
    api: Arc<dyn Hypervisor>,
    default_storage: Option<String>,
}

impl StorageResolver {
    pub fn new(api: Arc<dyn Hypervisor>, default_storage: Option<String>) -> Self {
        Self {
            api,
            default_storage,
        }
    }

    /// Resolves `requested` (or a default when `None`) to a classified
    /// descriptor. The pool must exist on `node` and accept VM images.
    pub async fn resolve(
        &self,
        node: &str,
        requested: Option<&str>,
    ) -> BridgeResult<StorageDescriptor> {
        let pools = self.api.list_storage(node).await?;

        let chosen = match requested.or(self.default_storage.as_deref()) {
            Some(name) => {
                let pool = pools.iter().find(|p| p.storage == name).ok_or_else(|| {
                    BridgeError::NotFound(format!("storage pool '{name}' on node {node}"))
                })?;
                if !pool.supports_images() {
                    return Err(BridgeError::validation(
                        "storage",
                        format!("pool '{name}' does not support VM images"),
                    ));
                }
                pool
            }
            None => auto_detect(&pools).ok_or_else(|| {
                BridgeError::NotFound(format!("no storage pool on node {node} supports VM images"))
            })?,
        };

        let descriptor = StorageDescriptor::classify(&chosen.storage, &chosen.kind);
        tracing::debug!(
            node,
            pool = %descriptor.pool,
            backend = ?descriptor.backend,
            format = descriptor.format.as_str(),
            "resolved storage pool"
        );
        Ok(descriptor)
    }
}

fn auto_detect(pools: &[StoragePool]) -> Option<&StoragePool> {
    for preferred in PREFERRED_POOLS {
        if let Some(pool) = pools
            .iter()
            .find(|p| p.storage == preferred && p.supports_images())
        {
            return Some(pool);
        }
    }
    pools.iter().find(|p| p.supports_images())
}
