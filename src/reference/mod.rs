//! Reference stdio backend
//!
//! A deterministic MCP-style backend used to exercise the bridge end to end. It reads
//! JSON-RPC requests from stdin and writes one response line per request to stdout.

pub mod server;
pub mod tools;

pub use server::{Method, ReferenceServer};
