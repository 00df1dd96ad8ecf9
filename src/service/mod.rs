//! Orchestration services: validation, storage resolution, provisioning,
//! lifecycle control, and task tracking.

pub mod lifecycle;
pub mod provision;
pub mod storage;
pub mod tasks;
pub mod validate;

pub use lifecycle::LifecycleController;
pub use provision::{Provisioned, VmProvisioner};
pub use storage::StorageResolver;
pub use tasks::TaskTracker;
