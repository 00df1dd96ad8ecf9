//! Task completion tracking.
//!
//! Turns a fire-and-forget task handle into a deterministic outcome by
//! polling the hypervisor's task-status endpoint. The wait is bounded: on
//! timeout a failed status tagged `timed_out` is returned instead of blocking
//! past the deadline, and transient poll errors are retried a bounded number
//! of times before propagating.

use crate::core::domain::error::{BridgeError, BridgeResult};
use crate::core::domain::model::{TaskHandle, TaskState, TaskStatus};
use crate::core::infrastructure::hypervisor::Hypervisor;
use std::sync::Arc;
use tokio::time::{Duration, Instant, sleep};

/// Consecutive poll failures tolerated before the error propagates.
const MAX_POLL_FAILURES: u32 = 3;

pub struct TaskTracker {
    api: Arc<dyn Hypervisor>,
    poll_interval: Duration,
}

impl TaskTracker {
    pub fn new(api: Arc<dyn Hypervisor>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    /// Polls until the task reaches a terminal state or `timeout` elapses.
    pub async fn await_task(
        &self,
        handle: &TaskHandle,
        timeout: Duration,
    ) -> BridgeResult<TaskStatus> {
        let deadline = Instant::now() + timeout;
        let mut failures = 0u32;

        loop {
            match self.api.task_status(&handle.node, &handle.upid).await {
                Ok(raw) => {
                    failures = 0;
                    let (state, detail) = raw.resolve();
                    if state.is_terminal() {
                        tracing::debug!(upid = %handle.upid, ?state, "task finished");
                        return Ok(TaskStatus {
                            upid: handle.upid.clone(),
                            state,
                            detail,
                            timed_out: false,
                        });
                    }
                }
                Err(err) if is_transient(&err) => {
                    failures += 1;
                    tracing::warn!(upid = %handle.upid, failures, %err, "task poll failed");
                    if failures > MAX_POLL_FAILURES {
                        return Err(err);
                    }
                }
                Err(err) => return Err(err),
            }

            if Instant::now() + self.poll_interval > deadline {
                tracing::warn!(upid = %handle.upid, ?timeout, "task wait timed out");
                return Ok(TaskStatus {
                    upid: handle.upid.clone(),
                    state: TaskState::Failed,
                    detail: Some(format!(
                        "task did not finish within {} seconds",
                        timeout.as_secs()
                    )),
                    timed_out: true,
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

/// Network hiccups and upstream blips are worth retrying; authentication and
/// not-found failures are not.
fn is_transient(err: &BridgeError) -> bool {
    matches!(err, BridgeError::Timeout(_) | BridgeError::Upstream { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::model::TaskStatusRaw;
    use crate::core::infrastructure::hypervisor::MockHypervisor;

    fn raw(status: &str, exit: Option<&str>) -> TaskStatusRaw {
        TaskStatusRaw {
            status: status.into(),
            exitstatus: exit.map(Into::into),
            node: None,
            pid: None,
        }
    }

    fn handle() -> TaskHandle {
        TaskHandle::new("pve", "UPID:pve:0001:qmcreate")
    }

    fn tracker(api: MockHypervisor) -> TaskTracker {
        TaskTracker::new(Arc::new(api), Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_success_after_running_polls() {
        let mut api = MockHypervisor::new();
        let mut polls = 0;
        api.expect_task_status().returning(move |_, _| {
            polls += 1;
            if polls < 3 {
                Ok(raw("running", None))
            } else {
                Ok(raw("stopped", Some("OK")))
            }
        });

        let status = tracker(api)
            .await_task(&handle(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(status.state, TaskState::Succeeded);
        assert!(!status.timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_hypervisor_failure_detail() {
        let mut api = MockHypervisor::new();
        api.expect_task_status()
            .returning(|_, _| Ok(raw("stopped", Some("unable to create image: no space"))));

        let status = tracker(api)
            .await_task(&handle(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(status.state, TaskState::Failed);
        assert!(!status.timed_out);
        assert!(status.detail.unwrap().contains("no space"));
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out_with_tag() {
        let mut api = MockHypervisor::new();
        api.expect_task_status()
            .returning(|_, _| Ok(raw("running", None)));

        let status = tracker(api)
            .await_task(&handle(), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(status.state, TaskState::Failed);
        assert!(status.timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_then_propagated() {
        let mut api = MockHypervisor::new();
        api.expect_task_status().returning(|_, _| {
            Err(BridgeError::Upstream {
                status: Some(503),
                message: "pveproxy restarting".into(),
            })
        });

        let err = tracker(api)
            .await_task(&handle(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Upstream { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_resets_the_failure_budget() {
        let mut api = MockHypervisor::new();
        let mut polls = 0;
        api.expect_task_status().returning(move |_, _| {
            polls += 1;
            match polls {
                // two transient failures, one good poll, repeat, then done
                1 | 2 | 4 | 5 => Err(BridgeError::Timeout("poll timed out".into())),
                3 => Ok(raw("running", None)),
                _ => Ok(raw("stopped", Some("OK"))),
            }
        });

        let status = tracker(api)
            .await_task(&handle(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(status.state, TaskState::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_errors_propagate_immediately() {
        let mut api = MockHypervisor::new();
        api.expect_task_status()
            .times(1)
            .returning(|_, _| Err(BridgeError::Auth("ticket revoked".into())));

        let err = tracker(api)
            .await_task(&handle(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Auth(_)));
    }
}
