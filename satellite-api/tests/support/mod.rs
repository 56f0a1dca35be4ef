//! Shared harness for the router-level tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use satellite_api::{create_router, AppState, Backends, HashCost, ServerConfig};
use satellite_storage::{CacheBackend, InMemoryCache, ObjectStore, TenantStore};
use satellite_test_utils::fixtures::{
    acme_domain, acme_namespace, acme_objects, basic_auth_header, ACME_HOST, ALICE,
    ALICE_PASSWORD,
};
use secrecy::SecretString;
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Config with a cheap hash cost and [`ADMIN_KEY`] enabled.
pub fn test_config(storage_root: &Path) -> ServerConfig {
    ServerConfig::default()
        .with_hash_cost(HashCost::minimal())
        .with_storage_root(storage_root)
        .with_admin_key(ADMIN_KEY)
}

/// `acme.example` with basic auth, user alice and `/index.html`, over an
/// in-memory cache.
pub async fn acme_state() -> AppState {
    acme_state_with(test_config(&std::env::temp_dir()), Arc::new(InMemoryCache::new())).await
}

/// Like [`acme_state`] but with a caller-chosen config and cache backend.
pub async fn acme_state_with(config: ServerConfig, cache: Arc<dyn CacheBackend>) -> AppState {
    let objects = acme_objects().await;
    acme_state_over(config, cache, objects).await
}

/// `acme.example` and alice, with `objects` as the in-memory object backend.
pub async fn acme_state_over(
    config: ServerConfig,
    cache: Arc<dyn CacheBackend>,
    objects: Arc<dyn ObjectStore>,
) -> AppState {
    let mut backends = Backends::in_memory(&config.storage_root);
    backends.cache = cache;
    backends.objects.memory = objects;

    let state = AppState::with_backends(config, backends);
    if let Err(e) = state.tenants.put(acme_domain()).await {
        panic!("seeding acme.example failed: {e}");
    }
    if let Err(e) = state
        .credentials
        .add_user(
            &acme_namespace(),
            ALICE,
            SecretString::from(ALICE_PASSWORD.to_string()),
        )
        .await
    {
        panic!("seeding alice failed: {e}");
    }
    state
}

pub async fn acme_app() -> Router {
    create_router(acme_state().await)
}

/// A `GET` for `path` on `host` with no credentials.
pub fn get(host: &str, path: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(header::HOST, host)
}

/// A `GET` on `acme.example` as alice.
pub fn acme_get(path: &str) -> axum::http::request::Builder {
    get(ACME_HOST, path).header(
        header::AUTHORIZATION,
        basic_auth_header(ALICE, ALICE_PASSWORD),
    )
}

/// A JSON `POST` to an admin procedure on `host`.
pub fn rpc(host: &str, procedure: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/_/rpc/{procedure}"))
        .header(header::HOST, host)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-api-key", ADMIN_KEY)
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("JSON body")
}
