//! HTTP surface tests driven in-process through the router.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use warden::gate::SecurityGate;
use warden::server::{router, AppState};
use warden::token::SecretKey;

const ACL_DOC: &str = r#"{
    "assign": [ { "subject": "dashboard", "roles": ["admin"] } ],
    "roles": { "admin": ["read", "write"] }
}"#;

fn test_state() -> AppState {
    let gate = SecurityGate::new(SecretKey::from_bytes([0x42u8; 32]));
    gate.acl().load(ACL_DOC.as_bytes()).expect("test ACL");
    AppState { gate: Arc::new(gate) }
}

async fn body_text(response: axum::response::Response) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::test]
async fn token_roundtrip_over_http() -> Result<()> {
    let app = router(test_state());

    let response = app
        .clone()
        .oneshot(Request::builder().method("PUT").uri("/token").body(Body::from("admin"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_text(response).await?;
    assert_eq!(token.split('.').count(), 3);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/valid")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await?, "Valid token");
    Ok(())
}

#[tokio::test]
async fn missing_token_is_forbidden() -> Result<()> {
    let app = router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/valid").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await?, "Missing token");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_forbidden() -> Result<()> {
    let app = router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/valid")
                .header("authorization", "Bearer not-a-real-token")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await?, "Invalid token");
    Ok(())
}

#[tokio::test]
async fn empty_credential_is_bad_request() -> Result<()> {
    let app = router(test_state());
    let response = app
        .oneshot(Request::builder().method("PUT").uri("/token").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn status_reports_the_active_flag() -> Result<()> {
    let state = test_state();
    let app = router(state.clone());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/status").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_str(&body_text(response).await?)?;
    // The test state loads the ACL directly without initialize().
    assert_eq!(doc["security"], false);
    assert_eq!(doc["roles"], 1);
    Ok(())
}
