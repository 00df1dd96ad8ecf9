//! REST front end: every tool is reachable as `POST /<tool_name>` with a JSON
//! body of tool arguments, plus a `GET /health` liveness probe that performs
//! no hypervisor calls.

use crate::core::domain::error::BridgeError;
use crate::tools::ToolRegistry;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// JSON error body for non-200 responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        let code = match &err {
            BridgeError::Validation { .. } => "VALIDATION_ERROR",
            BridgeError::Auth(_) => "AUTH_ERROR",
            BridgeError::NotFound(_) => "NOT_FOUND",
            BridgeError::Conflict(_) => "CONFLICT",
            BridgeError::Timeout(_) => "UPSTREAM_TIMEOUT",
            BridgeError::Upstream { .. } => "UPSTREAM_ERROR",
        };
        ApiError {
            error: err.to_string(),
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "AUTH_ERROR" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "UPSTREAM_TIMEOUT" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    result: String,
}

pub fn router(registry: Arc<ToolRegistry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:tool", post(call_tool))
        .with_state(registry)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn call_tool(
    State(registry): State<Arc<ToolRegistry>>,
    Path(tool): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<ToolResponse>, ApiError> {
    let args = body.map(|Json(v)| v).unwrap_or_else(|| serde_json::json!({}));
    let result = registry.call(&tool, &args).await?;
    Ok(Json(ToolResponse { result }))
}

/// Serves the router until the process is signalled.
pub async fn serve(registry: Arc<ToolRegistry>, addr: std::net::SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "REST front end listening");
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::core::domain::model::NodeListItem;
    use crate::core::infrastructure::hypervisor::MockHypervisor;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(api: MockHypervisor) -> Router {
        router(Arc::new(ToolRegistry::new(Arc::new(api), &Options::default())))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_answers_without_touching_the_hypervisor() {
        let mut api = MockHypervisor::new();
        api.expect_list_nodes().times(0);

        let response = app(api)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn tool_call_returns_result_payload() {
        let mut api = MockHypervisor::new();
        api.expect_list_nodes().returning(|| {
            Ok(vec![NodeListItem {
                node: "pve".into(),
                status: "online".into(),
                cpu: None,
                maxcpu: None,
                mem: None,
                maxmem: None,
                uptime: None,
            }])
        });

        let response = app(api)
            .oneshot(
                Request::post("/get_nodes")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["result"].as_str().unwrap().contains("pve"));
    }

    #[tokio::test]
    async fn validation_failures_are_bad_requests() {
        let response = app(MockHypervisor::new())
            .oneshot(
                Request::post("/create_vm")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"node": "pve", "vmid": "200", "name": "t",
                            "cpus": 0, "memory": 2048, "disk_size": 10}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_tool_is_404() {
        let response = app(MockHypervisor::new())
            .oneshot(
                Request::post("/enhance_cluster")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let mut api = MockHypervisor::new();
        api.expect_vm_status().returning(|_, _| {
            Ok(crate::core::domain::model::VmStatusCurrent {
                status: "running".into(),
                name: Some("web".into()),
                cpu: None,
                mem: None,
                maxmem: None,
                uptime: None,
                agent: None,
            })
        });

        let response = app(api)
            .oneshot(
                Request::post("/delete_vm")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"node": "pve", "vmid": "100"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "CONFLICT");
    }
}
