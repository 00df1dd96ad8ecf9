//! Error taxonomy for bridge operations.
//!
//! Every failure surfaced to a caller is one of the variants below. Upstream
//! failures are translated through [`map_status`] / [`map_transport`] so that
//! raw Proxmox payloads never reach a caller verbatim.

use reqwest::StatusCode;
use thiserror::Error;

/// The main error type for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Malformed or out-of-range input. Detected locally, never reaches the
    /// hypervisor.
    #[error("invalid field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Credentials rejected by the Proxmox API.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Node, storage pool, VM, or container does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A state precondition was violated (duplicate vmid, delete while
    /// running without force).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An API call or task wait exceeded its bound.
    #[error("upstream timeout: {0}")]
    Timeout(String),

    /// Any other upstream failure, wrapping the original status and message.
    #[error("upstream API error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

impl BridgeError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Type alias for results that may fail with a [`BridgeError`].
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Upper bound on how much of an upstream body ends up in an error message.
const MAX_DETAIL_LEN: usize = 240;

fn detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no detail provided".to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_DETAIL_LEN).collect();
    if trimmed.chars().count() > MAX_DETAIL_LEN {
        out.push_str("...");
    }
    out
}

/// Maps a non-2xx Proxmox response onto the taxonomy.
///
/// Table: 401/403 are authentication failures, 404 is not-found, 5xx means the
/// upstream is unavailable, anything else is a generic upstream error.
pub fn map_status(status: StatusCode, body: &str) -> BridgeError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BridgeError::Auth(detail(body)),
        StatusCode::NOT_FOUND => BridgeError::NotFound(detail(body)),
        s if s.is_server_error() => BridgeError::Upstream {
            status: Some(s.as_u16()),
            message: format!("service unavailable: {}", detail(body)),
        },
        s => BridgeError::Upstream {
            status: Some(s.as_u16()),
            message: detail(body),
        },
    }
}

/// Maps a transport-level failure (connection refused, request timeout) onto
/// the taxonomy.
pub fn map_transport(err: &reqwest::Error) -> BridgeError {
    if err.is_timeout() {
        BridgeError::Timeout(err.to_string())
    } else {
        BridgeError::Upstream {
            status: None,
            message: err.to_string(),
        }
    }
}
