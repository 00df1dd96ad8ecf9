pub mod cluster;
pub mod container;
pub mod node;
pub mod storage;
pub mod task;
pub mod vm;

pub use cluster::ClusterStatusItem;
pub use container::CtListItem;
pub use node::{MemoryUsage, NodeListItem, NodeStatus};
pub use storage::{DiskFormat, StorageBackend, StorageDescriptor, StoragePool};
pub use task::{TaskHandle, TaskState, TaskStatus, TaskStatusRaw};
pub use vm::{CreateVmParams, ExecStatus, PowerState, VmConfig, VmListItem, VmStatusCurrent};
