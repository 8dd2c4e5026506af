//! Axum-based webhook gateway.
//!
//! Two jobs: answer Meta's one-time subscription handshake, and accept
//! event notifications. Notifications are verified against the app secret
//! (`X-Hub-Signature-256`), decoded, and handed to the reply dispatcher on
//! a background task so the platform gets its 200 within the delivery
//! deadline regardless of Send API latency.

use crate::config::Config;
use crate::dispatch::ReplyDispatcher;
use crate::events::WebhookPayload;
use crate::send_api::{SendApi, SendApiClient};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s) — prevents slow-loris attacks
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const VERIFICATION_FAILED_BODY: &str = "Error, wrong validation token";

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<ReplyDispatcher>,
}

/// Run the webhook gateway until the process is stopped.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let display_addr = listener.local_addr()?;

    let send_api: Arc<dyn SendApi> = Arc::new(SendApiClient::new(config.page_access_token.clone()));
    let dispatcher = Arc::new(ReplyDispatcher::new(send_api, config.server_url.clone()));
    let state = AppState {
        config: Arc::new(config),
        dispatcher,
    };

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/webhook", get(handle_verify).post(handle_notification))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    println!("🦀 pagebridge listening on http://{display_addr}");
    println!("  GET  /webhook  — Meta subscription handshake");
    println!("  POST /webhook  — event notifications (signed)");
    println!("  GET  /health   — health check");
    println!("  Press Ctrl+C to stop.\n");

    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /health — always public (no secrets leaked)
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Subscription handshake query params
#[derive(serde::Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook — Meta webhook verification
async fn handle_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
) -> impl IntoResponse {
    // Constant-time comparison to prevent timing attacks
    let token_matches = params
        .verify_token
        .as_deref()
        .is_some_and(|t| constant_time_eq(t, &state.config.verify_token));
    if params.mode.as_deref() == Some("subscribe") && token_matches {
        if let Some(challenge) = params.challenge {
            tracing::info!("Webhook verified successfully");
            return (StatusCode::OK, challenge);
        }
        return (StatusCode::BAD_REQUEST, "Missing hub.challenge".to_string());
    }

    tracing::warn!("Webhook verification failed — token mismatch");
    (StatusCode::FORBIDDEN, VERIFICATION_FAILED_BODY.to_string())
}

/// Compare strings without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verify the webhook signature Meta sends with each callback
/// (`X-Hub-Signature-256`). Returns true if the signature is valid.
/// See: <https://developers.facebook.com/docs/graph-api/webhooks/getting-started#verification-requests>
pub fn verify_signature(app_secret: &str, body: &[u8], signature_header: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // Signature format: "sha256=<hex_signature>"
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };

    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&expected).is_ok()
}

/// POST /webhook — incoming event notification
async fn handle_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !verify_signature(&state.config.app_secret, &body, signature) {
        tracing::warn!(
            "Webhook signature verification failed (signature: {})",
            if signature.is_empty() {
                "missing"
            } else {
                "invalid"
            }
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Invalid signature"})),
        )
            .into_response();
    }

    let payload = match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Failed to parse webhook body: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid JSON payload"})),
            )
                .into_response();
        }
    };

    if payload.object != "page" {
        tracing::warn!("Ignoring webhook for unsupported object {:?}", payload.object);
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Unsupported webhook object"})),
        )
            .into_response();
    }

    // Acknowledge within the platform's deadline; replies go out in the
    // background, in array order, and their failures stay out of this
    // response.
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.process_entries(&payload.entry).await;
    });

    (StatusCode::OK, "ok").into_response()
}
