#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use coop_cms_api::{config::AppConfig, state::AppState};
use coop_cms_core::events::bus::EventBus;
use coop_cms_core::store::MemoryDocumentStore;
use coop_cms_core::ContentService;
use http_body_util::BodyExt as _;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router over a fresh in-memory store, configured through `vars` on top of
/// `STORE_BACKEND=memory`.
pub fn app_with(vars: &[(&str, &str)]) -> (Router, MemoryDocumentStore) {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("STORE_BACKEND".to_string(), "memory".to_string());
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }
    let config = AppConfig::from_lookup(|name| env.get(name).cloned()).expect("valid test config");

    let store = MemoryDocumentStore::new();
    let service = ContentService::new(
        Arc::new(store.clone()),
        EventBus::new(config.event_bus_capacity),
        config.service_settings(),
    );
    let app = coop_cms_api::build_app(AppState::new(service, config));
    (app, store)
}

pub fn app() -> Router {
    app_with(&[]).0
}

/// Send one request and decode the JSON response body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

/// Create the `about` page used by most scenarios.
pub async fn seed_about(app: &Router) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/pages",
        Some(json!({
            "slug": "about",
            "data": {
                "hero": {"title": "Old", "subtitle": "Keep me"},
                "sections": {"links": [{"url": "/a"}, {"url": "/b"}, {"url": "/c"}]}
            },
            "status": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}
