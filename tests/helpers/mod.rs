//! Test helpers module
//!
//! Database setup, a mock stats service and HTTP utilities shared by the
//! integration tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod stats_mock;
pub mod test_data;

pub use database_helper::*;
pub use stats_mock::*;
pub use test_data::*;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

/// Send one request through the router and decode the JSON response
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    match body {
        Some(json) => send_raw(app, method, uri, &json.to_string()).await,
        None => {
            let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
            dispatch(app, request).await
        }
    }
}

/// Send a request with a raw JSON body
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}
