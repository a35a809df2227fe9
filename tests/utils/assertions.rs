//! Test assertion helpers
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::to_bytes,
    http::{header::LOCATION, StatusCode},
    response::Response,
};
use serde::de::DeserializeOwned;

/// Asserts a 303 to `expected`
pub fn assert_redirect(response: &Response, expected: &str) {
    assert_eq!(
        response.status(),
        StatusCode::SEE_OTHER,
        "expected a redirect to {}",
        expected
    );
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok());
    assert_eq!(location, Some(expected));
}

/// Asserts the plain-text 403 ownership rejection
pub async fn assert_forbidden(response: Response) {
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Forbidden");
}

pub async fn json_body<T: DeserializeOwned>(response: Response) -> T {
    assert!(
        response.status().is_success() || response.status().is_client_error(),
        "unexpected status {}",
        response.status()
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
