//! JSON-RPC envelopes shared by the bridge and the reference backend
//!
//! Provides error-code constants, response builders and audit redaction of request params.

pub mod audit;
pub mod rpc;
