#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wraps the REAL kernel router and state. Only the language
//! registry and engine factory are stubs, so tests can count how often the
//! dispatcher reaches them.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use langcheck_kernel::{AppState, Config, routes};
use langcheck_test_utils::{StubFactory, StubRegistry};

/// Loopback caller used by [`TestApp::request`].
pub const LOCAL: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000);

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    admin: Router,
    pub state: AppState,
    pub registry: Arc<StubRegistry>,
    pub factory: Arc<StubFactory>,
}

impl TestApp {
    /// Default configuration with an engine that flags nothing.
    pub fn new() -> Self {
        Self::with(Config::default(), StubFactory::new())
    }

    /// Default configuration, engine flagging `word`.
    pub fn flagging(word: &str) -> Self {
        Self::with(Config::default(), StubFactory::new().flagging(word))
    }

    pub fn with(config: Config, factory: StubFactory) -> Self {
        let registry = Arc::new(StubRegistry::new());
        let factory = Arc::new(factory);
        let state = AppState::new(&config, registry.clone(), factory.clone());

        Self {
            router: routes::app(state.clone()),
            admin: routes::admin(state.clone()),
            state,
            registry,
            factory,
        }
    }

    /// Send a request from loopback.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.request_from(request, LOCAL).await
    }

    /// Send a request as if it arrived from `remote`.
    pub async fn request_from(&self, mut request: Request<Body>, remote: SocketAddr) -> Response {
        request.extensions_mut().insert(ConnectInfo(remote));
        self.send(request).await
    }

    /// Send a request without connection info attached.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request to the admin router.
    pub async fn admin_request(&self, request: Request<Body>) -> Response {
        self.admin
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: &str) -> Response {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

/// Content-Type header of a response.
pub fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn response_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
