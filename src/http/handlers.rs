//! Axum HTTP handlers for the bridge
//!
//! Provides the health probe, the server discovery listing and the per-backend POST endpoint.

use std::collections::BTreeMap;

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;

use crate::{
    bridge::{Bridge, BridgeReply},
    AppState,
};

pub const DISCOVERY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub servers: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct ServerEntry {
    pub name: String,
    pub url: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServersResponse {
    pub servers: Vec<ServerEntry>,
    pub schema_version: u32,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        servers: state.registry.availability(),
    })
}

pub async fn servers(State(state): State<AppState>) -> Json<ServersResponse> {
    let servers = state
        .registry
        .iter()
        .map(|backend| ServerEntry {
            name: backend.name.clone(),
            url: format!("{}/{}", state.public_url, backend.route),
            enabled: true,
            description: backend.description.clone(),
        })
        .collect();

    Json(ServersResponse {
        servers,
        schema_version: DISCOVERY_SCHEMA_VERSION,
    })
}

pub async fn backend_endpoint(bridge: Bridge, body: Bytes) -> BridgeReply {
    bridge.handle(&body).await
}
