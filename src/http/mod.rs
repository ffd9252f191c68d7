//! HTTP front of the bridge
//!
//! Provides the external API routing: one POST route per backend plus health and discovery.

pub mod handlers;
