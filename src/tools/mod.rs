//! The tool registry: one named, schema-described operation per entry,
//! dispatched from both front ends through [`ToolRegistry::call`].

pub mod definitions;
pub mod format;

use crate::config::Options;
use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::core::domain::model::PowerState;
use crate::core::infrastructure::hypervisor::{Hypervisor, PowerAction};
use crate::service::{LifecycleController, StorageResolver, TaskTracker, VmProvisioner};
use crate::service::validate;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{Duration, Instant, sleep};

use definitions::ToolDef;
use format::VmSummary;

/// Interval between guest-agent exec-status polls.
const EXEC_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ToolRegistry {
    api: Arc<dyn Hypervisor>,
    provisioner: VmProvisioner,
    lifecycle: LifecycleController,
    exec_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(api: Arc<dyn Hypervisor>, options: &Options) -> Self {
        let poll_interval = Duration::from_millis(options.poll_interval_ms);
        let task_timeout = Duration::from_secs(options.task_timeout_secs);
        let resolver = StorageResolver::new(api.clone(), options.default_storage.clone());
        let provisioner = VmProvisioner::new(api.clone(), resolver);
        let tracker = TaskTracker::new(api.clone(), poll_interval);
        let lifecycle = LifecycleController::new(api.clone(), tracker, task_timeout);
        Self {
            api,
            provisioner,
            lifecycle,
            exec_timeout: Duration::from_secs(options.exec_timeout_secs),
        }
    }

    /// The full tool catalog, served from `tools/list` and used to build the
    /// REST routes.
    pub fn tools(&self) -> Vec<ToolDef> {
        definitions::all()
    }

    /// Dispatches a tool call by name. Unknown names are a not-found error.
    pub async fn call(&self, name: &str, args: &Value) -> BridgeResult<String> {
        tracing::info!(tool = name, "tool invoked");
        match name {
            "get_nodes" => self.get_nodes().await,
            "get_node_status" => self.get_node_status(args).await,
            "get_vms" => self.get_vms().await,
            "get_containers" => self.get_containers().await,
            "get_storage" => self.get_storage().await,
            "get_cluster_status" => self.get_cluster_status().await,
            "create_vm" => self.create_vm(args).await,
            "start_vm" => self.power(args, PowerAction::Start).await,
            "stop_vm" => self.power(args, PowerAction::Stop).await,
            "shutdown_vm" => self.power(args, PowerAction::Shutdown).await,
            "reset_vm" => self.power(args, PowerAction::Reset).await,
            "delete_vm" => self.delete_vm(args).await,
            "execute_vm_command" => self.execute_vm_command(args).await,
            other => Err(BridgeError::NotFound(format!("tool '{other}'"))),
        }
    }

    async fn get_nodes(&self) -> BridgeResult<String> {
        let nodes = self.api.list_nodes().await?;
        Ok(format::nodes(&nodes))
    }

    async fn get_node_status(&self, args: &Value) -> BridgeResult<String> {
        let node = validate::parse_node(args)?;
        let status = self.api.node_status(&node).await?;
        Ok(format::node_status(&node, &status))
    }

    /// Lists VMs across every node, enriching each with its configured core
    /// count. A failed config fetch degrades that row rather than failing
    /// the whole listing.
    async fn get_vms(&self) -> BridgeResult<String> {
        let mut summaries = Vec::new();
        for node in self.api.list_nodes().await? {
            for vm in self.api.list_vms(&node.node).await? {
                let cores = match self.api.vm_config(&node.node, vm.vmid).await {
                    Ok(Some(config)) => config.cores,
                    Ok(None) => None,
                    Err(err) => {
                        tracing::debug!(vmid = vm.vmid, %err, "config fetch failed");
                        None
                    }
                };
                summaries.push(VmSummary {
                    vmid: vm.vmid,
                    name: vm.name.unwrap_or_else(|| "unnamed".to_string()),
                    status: vm.status,
                    node: node.node.clone(),
                    cores,
                    mem: vm.mem.unwrap_or(0),
                    maxmem: vm.maxmem.unwrap_or(0),
                });
            }
        }
        Ok(format::vms(&summaries))
    }

    async fn get_containers(&self) -> BridgeResult<String> {
        let mut all = Vec::new();
        for node in self.api.list_nodes().await? {
            for ct in self.api.list_containers(&node.node).await? {
                all.push((node.node.clone(), ct));
            }
        }
        Ok(format::containers(&all))
    }

    /// Aggregates pools across nodes; shared pools appear once.
    async fn get_storage(&self) -> BridgeResult<String> {
        let mut pools = Vec::new();
        for node in self.api.list_nodes().await? {
            for pool in self.api.list_storage(&node.node).await? {
                if !pools.iter().any(|p: &crate::core::domain::model::StoragePool| {
                    p.storage == pool.storage
                }) {
                    pools.push(pool);
                }
            }
        }
        Ok(format::storage(&pools))
    }

    async fn get_cluster_status(&self) -> BridgeResult<String> {
        let status = self.api.cluster_status().await?;
        Ok(format::cluster_status(&status))
    }

    async fn create_vm(&self, args: &Value) -> BridgeResult<String> {
        let request = validate::parse_create(args)?;
        let provisioned = self.provisioner.create(&request).await?;
        Ok(format::vm_created(&request, &provisioned))
    }

    async fn power(&self, args: &Value, action: PowerAction) -> BridgeResult<String> {
        let instance = validate::parse_instance(args)?;
        let task = self
            .lifecycle
            .transition(&instance.node, instance.vmid, action)
            .await?;
        Ok(format::task_submitted(action.endpoint(), instance.vmid, &task))
    }

    async fn delete_vm(&self, args: &Value) -> BridgeResult<String> {
        let request = validate::parse_delete(args)?;
        let task = self
            .lifecycle
            .delete(&request.target.node, request.target.vmid, request.force)
            .await?;
        Ok(format!(
            "VM {} deletion submitted on node {}. This permanently removes the \
             configuration, all disks, and all snapshots.\nTask: {}",
            request.target.vmid, request.target.node, task.upid
        ))
    }

    /// Runs a shell command through the QEMU guest agent and waits (bounded)
    /// for it to exit.
    async fn execute_vm_command(&self, args: &Value) -> BridgeResult<String> {
        let request = validate::parse_exec(args)?;
        let (node, vmid) = (&request.target.node, request.target.vmid);

        let status = self.api.vm_status(node, vmid).await?;
        if status.power() != PowerState::Running {
            return Err(BridgeError::Conflict(format!(
                "VM {vmid} is not running; the guest agent needs a running VM"
            )));
        }

        let pid = self.api.agent_exec(node, vmid, &request.command).await?;
        let deadline = Instant::now() + self.exec_timeout;
        loop {
            let exec = self.api.agent_exec_status(node, vmid, pid).await?;
            if exec.exited != 0 {
                return Ok(format::command_output(
                    &request.command,
                    exec.exitcode,
                    exec.out_data.as_deref(),
                    exec.err_data.as_deref(),
                ));
            }
            if Instant::now() + EXEC_POLL_INTERVAL > deadline {
                return Err(BridgeError::Timeout(format!(
                    "command on VM {vmid} did not finish within {} seconds",
                    self.exec_timeout.as_secs()
                )));
            }
            sleep(EXEC_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::model::{
        ExecStatus, NodeListItem, VmConfig, VmListItem, VmStatusCurrent,
    };
    use crate::core::infrastructure::hypervisor::MockHypervisor;
    use serde_json::json;

    fn node(name: &str) -> NodeListItem {
        NodeListItem {
            node: name.into(),
            status: "online".into(),
            cpu: Some(0.1),
            maxcpu: Some(8),
            mem: Some(1 << 30),
            maxmem: Some(4 << 30),
            uptime: Some(3600),
        }
    }

    fn registry(api: MockHypervisor) -> ToolRegistry {
        ToolRegistry::new(Arc::new(api), &Options::default())
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let err = registry(MockHypervisor::new())
            .call("destroy_cluster", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_vms_degrades_when_config_fetch_fails() {
        let mut api = MockHypervisor::new();
        api.expect_list_nodes().returning(|| Ok(vec![node("pve")]));
        api.expect_list_vms().returning(|_| {
            Ok(vec![
                VmListItem {
                    vmid: 100,
                    name: Some("web".into()),
                    status: "running".into(),
                    cpu: None,
                    maxcpu: None,
                    mem: Some(1 << 30),
                    maxmem: Some(2 << 30),
                    uptime: None,
                },
                VmListItem {
                    vmid: 101,
                    name: Some("db".into()),
                    status: "stopped".into(),
                    cpu: None,
                    maxcpu: None,
                    mem: None,
                    maxmem: None,
                    uptime: None,
                },
            ])
        });
        api.expect_vm_config().returning(|_, vmid| {
            if vmid == 100 {
                Ok(Some(VmConfig {
                    name: Some("web".into()),
                    cores: Some(4),
                    sockets: None,
                    memory: Some(2048),
                    ostype: None,
                }))
            } else {
                Err(BridgeError::Upstream {
                    status: Some(500),
                    message: "config unavailable".into(),
                })
            }
        });

        let text = registry(api).call("get_vms", &json!({})).await.unwrap();
        assert!(text.contains("100 web [running] on pve  cores: 4"));
        assert!(text.contains("101 db [stopped] on pve  cores: N/A"));
    }

    #[tokio::test]
    async fn create_vm_validation_failure_never_reaches_the_api() {
        let mut api = MockHypervisor::new();
        api.expect_vm_config().times(0);
        api.expect_create_vm().times(0);

        let err = registry(api)
            .call(
                "create_vm",
                &json!({
                    "node": "pve", "vmid": "200", "name": "t",
                    "cpus": 33, "memory": 2048, "disk_size": 10
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation { ref field, .. } if field == "cpus"));
    }

    #[tokio::test]
    async fn power_tools_forward_their_matching_action() {
        use crate::core::domain::model::TaskHandle;

        let cases = [
            ("start_vm", PowerAction::Start),
            ("stop_vm", PowerAction::Stop),
            ("shutdown_vm", PowerAction::Shutdown),
            ("reset_vm", PowerAction::Reset),
        ];
        for (tool, expected) in cases {
            let mut api = MockHypervisor::new();
            api.expect_vm_power()
                .withf(move |node, vmid, action| {
                    node == "pve" && *vmid == 100 && *action == expected
                })
                .times(1)
                .returning(|node, _, action| {
                    Ok(TaskHandle::new(node, format!("UPID:pve:0001:qm{}", action.endpoint())))
                });

            let text = registry(api)
                .call(tool, &json!({"node": "pve", "vmid": "100"}))
                .await
                .unwrap();
            assert!(
                text.contains(&format!("{} initiated", expected.endpoint())),
                "{tool}: {text}"
            );
        }
    }

    #[tokio::test]
    async fn execute_command_on_stopped_vm_conflicts() {
        let mut api = MockHypervisor::new();
        api.expect_vm_status().returning(|_, _| {
            Ok(VmStatusCurrent {
                status: "stopped".into(),
                name: None,
                cpu: None,
                mem: None,
                maxmem: None,
                uptime: None,
                agent: None,
            })
        });
        api.expect_agent_exec().times(0);

        let err = registry(api)
            .call(
                "execute_vm_command",
                &json!({"node": "pve", "vmid": "100", "command": "uptime"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Conflict(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn execute_command_polls_until_exit() {
        let mut api = MockHypervisor::new();
        api.expect_vm_status().returning(|_, _| {
            Ok(VmStatusCurrent {
                status: "running".into(),
                name: None,
                cpu: None,
                mem: None,
                maxmem: None,
                uptime: None,
                agent: Some(1),
            })
        });
        api.expect_agent_exec().returning(|_, _, _| Ok(4242));
        let mut polls = 0;
        api.expect_agent_exec_status().returning(move |_, _, pid| {
            assert_eq!(pid, 4242);
            polls += 1;
            Ok(ExecStatus {
                exited: if polls >= 2 { 1 } else { 0 },
                exitcode: Some(0),
                out_data: Some("Linux pve 6.8".into()),
                err_data: None,
            })
        });

        let text = registry(api)
            .call(
                "execute_vm_command",
                &json!({"node": "pve", "vmid": "100", "command": "uname -a"}),
            )
            .await
            .unwrap();
        assert!(text.contains("Exit code: 0"));
        assert!(text.contains("Linux pve 6.8"));
    }

    #[tokio::test]
    async fn get_storage_dedupes_shared_pools() {
        let mut api = MockHypervisor::new();
        api.expect_list_nodes()
            .returning(|| Ok(vec![node("pve1"), node("pve2")]));
        api.expect_list_storage().returning(|_| {
            Ok(vec![crate::core::domain::model::StoragePool {
                storage: "shared-nfs".into(),
                kind: "nfs".into(),
                content: Some("images".into()),
                active: Some(1),
                shared: Some(1),
                total: Some(1 << 40),
                used: Some(1 << 39),
                avail: None,
            }])
        });

        let text = registry(api).call("get_storage", &json!({})).await.unwrap();
        assert_eq!(text.matches("shared-nfs").count(), 1);
    }
}
