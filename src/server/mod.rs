//! Front ends: MCP over stdio and REST over HTTP. Both dispatch through the
//! same tool registry.

pub mod mcp;
pub mod rest;
