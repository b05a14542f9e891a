// src/mcp/mod.rs
//
// JSON-RPC (MCP) surface: every action is exposed as one tool.

pub mod handler;
pub mod protocol;
