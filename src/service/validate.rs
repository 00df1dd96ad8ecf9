//! Request validation.
//!
//! Turns the raw JSON arguments of a tool call into a normalized,
//! strongly-typed request, or fails naming the offending field. Validation is
//! pure; it never contacts the hypervisor.

use crate::core::domain::error::{BridgeError, BridgeResult};
use serde_json::Value;

pub const CPU_RANGE: (u32, u32) = (1, 32);
pub const MEMORY_MB_RANGE: (u32, u32) = (512, 131_072);
pub const DISK_GB_RANGE: (u32, u32) = (5, 1000);

/// A validated VM creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateVmRequest {
    pub node: String,
    pub vmid: u32,
    pub name: String,
    pub cores: u32,
    pub memory_mb: u32,
    pub disk_gb: u32,
    pub storage: Option<String>,
    pub ostype: Option<String>,
}

/// A validated reference to an existing VM or container.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRef {
    pub node: String,
    pub vmid: u32,
}

/// A validated deletion request.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub target: InstanceRef,
    pub force: bool,
}

/// A validated guest-agent command request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecRequest {
    pub target: InstanceRef,
    pub command: String,
}

pub fn parse_create(params: &Value) -> BridgeResult<CreateVmRequest> {
    Ok(CreateVmRequest {
        node: require_str(params, "node")?,
        vmid: require_vmid(params)?,
        name: require_str(params, "name")?,
        cores: require_bounded(params, "cpus", CPU_RANGE)?,
        memory_mb: require_bounded(params, "memory", MEMORY_MB_RANGE)?,
        disk_gb: require_bounded(params, "disk_size", DISK_GB_RANGE)?,
        storage: optional_str(params, "storage")?,
        ostype: optional_str(params, "ostype")?,
    })
}

pub fn parse_instance(params: &Value) -> BridgeResult<InstanceRef> {
    Ok(InstanceRef {
        node: require_str(params, "node")?,
        vmid: require_vmid(params)?,
    })
}

pub fn parse_delete(params: &Value) -> BridgeResult<DeleteRequest> {
    let force = match params.get("force") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(BridgeError::validation("force", "must be a boolean"));
        }
    };
    Ok(DeleteRequest {
        target: parse_instance(params)?,
        force,
    })
}

pub fn parse_exec(params: &Value) -> BridgeResult<ExecRequest> {
    Ok(ExecRequest {
        target: parse_instance(params)?,
        command: require_str(params, "command")?,
    })
}

pub fn parse_node(params: &Value) -> BridgeResult<String> {
    require_str(params, "node")
}

fn require_str(params: &Value, field: &str) -> BridgeResult<String> {
    let value = params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| BridgeError::validation(field, "required string field is missing"))?;
    if value.trim().is_empty() {
        return Err(BridgeError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

fn optional_str(params: &Value, field: &str) -> BridgeResult<Option<String>> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.clone())),
        Some(Value::String(_)) => Err(BridgeError::validation(field, "must not be empty")),
        Some(_) => Err(BridgeError::validation(field, "must be a string")),
    }
}

/// `vmid` arrives as a string even though it is numeric; it must parse as a
/// positive integer. A bare JSON number is tolerated.
fn require_vmid(params: &Value) -> BridgeResult<u32> {
    let raw = params
        .get("vmid")
        .ok_or_else(|| BridgeError::validation("vmid", "required field is missing"))?;
    let vmid = match raw {
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| BridgeError::validation("vmid", "must be a positive integer"))?,
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| BridgeError::validation("vmid", "must be a positive integer"))?,
        _ => {
            return Err(BridgeError::validation(
                "vmid",
                "must be a positive integer string",
            ));
        }
    };
    if vmid == 0 {
        return Err(BridgeError::validation("vmid", "must be a positive integer"));
    }
    Ok(vmid)
}

fn require_bounded(params: &Value, field: &str, (min, max): (u32, u32)) -> BridgeResult<u32> {
    let value = params
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| BridgeError::validation(field, "required integer field is missing"))?;
    let value =
        u32::try_from(value).map_err(|_| BridgeError::validation(field, "value out of range"))?;
    if value < min || value > max {
        return Err(BridgeError::validation(
            field,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_create() -> Value {
        json!({
            "node": "pve",
            "vmid": "200",
            "name": "test",
            "cpus": 1,
            "memory": 2048,
            "disk_size": 10
        })
    }

    #[test]
    fn valid_create_request_parses() {
        let req = parse_create(&base_create()).unwrap();
        assert_eq!(req.node, "pve");
        assert_eq!(req.vmid, 200);
        assert_eq!(req.cores, 1);
        assert_eq!(req.memory_mb, 2048);
        assert_eq!(req.disk_gb, 10);
        assert!(req.storage.is_none());
        assert!(req.ostype.is_none());
    }

    #[test]
    fn bounds_accept_edges_and_reject_one_past() {
        let cases = [
            ("cpus", CPU_RANGE),
            ("memory", MEMORY_MB_RANGE),
            ("disk_size", DISK_GB_RANGE),
        ];
        for (field, (min, max)) in cases {
            for ok in [min, max] {
                let mut params = base_create();
                params[field] = json!(ok);
                assert!(parse_create(&params).is_ok(), "{field}={ok} should pass");
            }
            for bad in [min - 1, max + 1] {
                let mut params = base_create();
                params[field] = json!(bad);
                let err = parse_create(&params).unwrap_err();
                match err {
                    BridgeError::Validation { field: f, .. } => assert_eq!(f, field),
                    other => panic!("expected validation error for {field}={bad}: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn vmid_accepts_numeric_string_and_number() {
        let mut params = base_create();
        params["vmid"] = json!(300);
        assert_eq!(parse_create(&params).unwrap().vmid, 300);
    }

    #[test]
    fn vmid_rejects_garbage_and_zero() {
        for bad in [json!("abc"), json!("0"), json!("-5"), json!(true)] {
            let mut params = base_create();
            params["vmid"] = bad.clone();
            assert!(
                matches!(
                    parse_create(&params),
                    Err(BridgeError::Validation { ref field, .. }) if field == "vmid"
                ),
                "vmid={bad} should be rejected"
            );
        }
    }

    #[test]
    fn empty_node_is_rejected() {
        let mut params = base_create();
        params["node"] = json!("  ");
        assert!(matches!(
            parse_create(&params),
            Err(BridgeError::Validation { ref field, .. }) if field == "node"
        ));
    }

    #[test]
    fn delete_force_defaults_false() {
        let req = parse_delete(&json!({"node": "pve", "vmid": "100"})).unwrap();
        assert!(!req.force);
        let req = parse_delete(&json!({"node": "pve", "vmid": "100", "force": true})).unwrap();
        assert!(req.force);
    }

    #[test]
    fn delete_rejects_non_boolean_force() {
        assert!(parse_delete(&json!({"node": "pve", "vmid": "100", "force": "yes"})).is_err());
    }

    #[test]
    fn exec_requires_command() {
        assert!(parse_exec(&json!({"node": "pve", "vmid": "100"})).is_err());
        let req = parse_exec(&json!({"node": "pve", "vmid": "100", "command": "uname -a"})).unwrap();
        assert_eq!(req.command, "uname -a");
    }
}
