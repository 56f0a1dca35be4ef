//! Admin RPC procedures through the full router.

mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use satellite_api::{create_router, ServerConfig};
use satellite_storage::{InMemoryCache, TenantStore};
use satellite_test_utils::fixtures::{basic_auth_header, ACME_HOST, ALICE_PASSWORD};
use serde_json::json;
use support::*;

#[tokio::test]
async fn missing_or_wrong_key_is_unauthorized() {
    let app = acme_app().await;

    let mut request = rpc(ACME_HOST, "SettingsService.SetAuth", json!({ "type": "none" }));
    request.headers_mut().remove("x-api-key");
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let mut request = rpc(ACME_HOST, "SettingsService.SetAuth", json!({ "type": "none" }));
    request
        .headers_mut()
        .insert("x-api-key", "wrong".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_disabled_without_keys() {
    let config = ServerConfig {
        admin_keys: Vec::new(),
        ..test_config(&std::env::temp_dir())
    };
    let app = create_router(acme_state_with(config, Arc::new(InMemoryCache::new())).await);

    let response = send(
        &app,
        rpc(ACME_HOST, "SettingsService.SetAuth", json!({ "type": "none" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn set_domain_then_serve_it() {
    let app = acme_app().await;
    let response = send(
        &app,
        rpc(
            ACME_HOST,
            "DomainService.SetDomain",
            json!({ "domain": {
                "name": "Blog.Example",
                "aliases": ["www.blog.example"],
                "auth": { "type": "none" },
                "storage": { "type": "memory", "bucket": "site" }
            }}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));

    // Known but empty tenant: resolution succeeds, object lookup misses.
    let request = get("www.blog.example", "/").body(Body::empty()).unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn set_domain_rejects_invalid_names() {
    let app = acme_app().await;
    let response = send(
        &app,
        rpc(
            ACME_HOST,
            "DomainService.SetDomain",
            json!({ "domain": { "name": "bad host/../x" } }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn set_auth_to_none_opens_the_site() {
    let app = acme_app().await;
    let response = send(
        &app,
        rpc(ACME_HOST, "SettingsService.SetAuth", json!({ "type": "none" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = get(ACME_HOST, "/index.html").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_auth_type_writes_nothing() {
    let state = acme_state().await;
    let app = create_router(state.clone());
    let response = send(
        &app,
        rpc(ACME_HOST, "SettingsService.SetAuth", json!({ "type": "oauth" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let record = state
        .tenants
        .get(ACME_HOST)
        .await
        .unwrap()
        .expect("acme exists");
    assert_eq!(record.auth.kind, "basic");
}

#[tokio::test]
async fn set_storage_validates_fs_buckets() {
    let state = acme_state().await;
    let app = create_router(state.clone());

    let response = send(
        &app,
        rpc(
            ACME_HOST,
            "SettingsService.SetStorage",
            json!({ "type": "fs", "bucket": ".." }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        rpc(
            ACME_HOST,
            "SettingsService.SetStorage",
            json!({ "type": "fs", "bucket": "public" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let record = state
        .tenants
        .get(ACME_HOST)
        .await
        .unwrap()
        .expect("acme exists");
    assert_eq!(record.storage.kind, "fs");
    assert_eq!(record.storage.bucket, "public");
}

#[tokio::test]
async fn settings_for_unknown_host_are_not_found() {
    let app = acme_app().await;
    let response = send(
        &app,
        rpc(
            "nobody.example",
            "SettingsService.SetAuth",
            json!({ "type": "basic" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn add_user_then_authenticate() {
    let app = acme_app().await;
    let response = send(
        &app,
        rpc(
            ACME_HOST,
            "BasicAuthService.AddUser",
            json!({ "username": "bob", "password": "builder" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = get(ACME_HOST, "/index.html")
        .header(header::AUTHORIZATION, basic_auth_header("bob", "builder"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    let request = get(ACME_HOST, "/index.html")
        .header(header::AUTHORIZATION, basic_auth_header("bob", ALICE_PASSWORD))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_user_rejects_invalid_usernames() {
    let app = acme_app().await;
    let response = send(
        &app,
        rpc(
            ACME_HOST,
            "BasicAuthService.AddUser",
            json!({ "username": "bob smith", "password": "builder" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn malformed_json_is_invalid_input() {
    let app = acme_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/_/rpc/BasicAuthService.AddUser")
        .header(header::HOST, ACME_HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-api-key", ADMIN_KEY)
        .body(Body::from("{\"username\":"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn unknown_procedure_is_not_found() {
    let app = acme_app().await;
    let response = send(&app, rpc(ACME_HOST, "DomainService.DropAll", json!({}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
