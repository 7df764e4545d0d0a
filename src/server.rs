//!
//! warden HTTP surface
//! -------------------
//! Thin Axum boundary over the security gate. The gate itself is pure
//! computation; this module only moves bytes in and out of it.
//!
//! Responsibilities:
//! - Token issuance: `PUT /token` with the raw credential text as body.
//! - Token validation: `GET /valid` with an `Authorization: Bearer` header.
//! - Gate status: `GET /status` reporting the security-active flag.
//! - Startup: key generation, strict ACL load, listener setup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, info};

use crate::config::WardenConfig;
use crate::error::AppError;
use crate::gate::SecurityGate;
use crate::token::SecretKey;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<SecurityGate>,
}

pub async fn run() -> anyhow::Result<()> {
    run_with_config(WardenConfig::from_env()).await
}

/// Start the warden HTTP server with the given configuration.
///
/// Generates the process secret key, performs the strict ACL load (a
/// missing or unreadable ACL file aborts startup), and mounts the routes.
pub async fn run_with_config(config: WardenConfig) -> anyhow::Result<()> {
    let key = SecretKey::generate()?;
    let gate = Arc::new(SecurityGate::new(key));
    gate.initialize(&config)?;

    let app = router(AppState { gate });
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "warden ok" }))
        .route("/token", put(issue_token))
        .route("/valid", get(check_valid))
        .route("/status", get(status))
        .with_state(state)
}

/// Read the bearer credential from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization").or_else(|| headers.get("Authorization"))?;
    let s = value.to_str().ok()?;
    let rest = s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer "))?;
    let token = rest.trim();
    if token.is_empty() { None } else { Some(token.to_string()) }
}

fn status_of(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn issue_token(State(state): State<AppState>, body: String) -> impl IntoResponse {
    if body.is_empty() {
        let err = AppError::user("missing_credential", "Missing credential");
        return (status_of(&err), err.message().to_string());
    }
    match state.gate.create_token(body.as_bytes()) {
        Ok(token) => (StatusCode::OK, token),
        Err(e) => {
            let err = AppError::from(e);
            (status_of(&err), err.message().to_string())
        }
    }
}

async fn check_valid(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = bearer_token(&headers) else {
        let err = AppError::forbidden("missing_token", "Missing token");
        return (status_of(&err), err.message().to_string());
    };
    match state.gate.authorize(&token) {
        Ok(ctx) => {
            debug!(roles = ?ctx.roles(), "token contents resolved");
            (StatusCode::OK, "Valid token".to_string())
        }
        Err(e) => {
            let err = AppError::from(e);
            (status_of(&err), err.message().to_string())
        }
    }
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "security": state.gate.is_active(),
        "roles": state.gate.acl().role_count(),
    }))
}
