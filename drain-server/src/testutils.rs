use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, header};
use data_encoding::BASE64;
use drain_config::Config;
use drain_metrics::RecordingSink;
use drain_quotas::{FloodProtector, MemoryFloodStore};
use tower::ServiceExt;

use crate::service::ServiceState;
use crate::services::server::make_app;

/// A server with in-memory backends.
pub struct TestServer {
    pub state: ServiceState,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<MemoryFloodStore>,
}

impl TestServer {
    /// Creates a server from a YAML configuration.
    pub fn new(yaml: &str) -> Self {
        let config = Arc::new(Config::from_yaml_str(yaml).unwrap());
        let sink = Arc::new(RecordingSink::new());
        let store = Arc::new(MemoryFloodStore::new());

        let protector =
            FloodProtector::new(config.flood_protection().clone(), Some(store.clone()));
        let state = ServiceState::new(config, protector, sink.clone());

        Self { state, sink, store }
    }

    /// Sends a request and returns the status and body.
    pub async fn send(&self, request: Request<Body>) -> (u16, String) {
        let response: Response<Body> = make_app(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status().as_u16();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    /// Posts a log batch with the given credentials.
    pub async fn post(&self, credentials: &str, body: impl Into<Body>) -> (u16, String) {
        let request = Request::post("/")
            .header(header::AUTHORIZATION, basic_auth(credentials))
            .body(body.into())
            .unwrap();

        self.send(request).await
    }
}

/// Builds the value of an `Authorization` header from `name:password`.
pub fn basic_auth(credentials: &str) -> String {
    format!("Basic {}", BASE64.encode(credentials.as_bytes()))
}
