use std::sync::Arc;

use axum::{
    body::Bytes,
    middleware,
    routing::{get, post},
    Router,
};

pub mod bridge;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod reference;
pub mod registry;
pub mod tool_client;

use bridge::{Bridge, ProcessRunner};
use registry::BackendRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BackendRegistry>,
    pub runner: Arc<dyn ProcessRunner>,
    pub public_url: Arc<str>,
}

impl AppState {
    pub fn new(
        registry: BackendRegistry,
        runner: Arc<dyn ProcessRunner>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            runner,
            public_url: Arc::<str>::from(public_url.into()),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(http::handlers::health))
        .route("/servers", get(http::handlers::servers));

    for backend in state.registry.iter() {
        let bridge = Bridge::new(Arc::new(backend.clone()), state.runner.clone());
        router = router.route(
            &format!("/{}", backend.route),
            post(move |body: Bytes| http::handlers::backend_endpoint(bridge.clone(), body)),
        );
    }

    router
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
