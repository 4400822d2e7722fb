//! HTTP surface
//!
//! Exposes the receive operation as `GET /receive_email`. The
//! response contract is deliberately small:
//!
//! - `200` with the JSON message on a match
//! - `204` when the polling deadline passes with no match
//! - `401` with an `Unauthorized` body when the `Authorization`
//!   header fails the secret check
//! - `500` with an `Error: <message>` body on any internal failure,
//!   including missing or malformed query parameters

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use crate::client::Letterbox;
use crate::config::Config;
use crate::error::{Error, Result};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub letterbox: Arc<Letterbox>,
}

/// Query parameters for [`receive_email`]
///
/// Both are required, but extraction never rejects: validation
/// happens in the handler so a missing parameter surfaces as the
/// contract's `500` rather than a framework `400`.
#[derive(Debug, Deserialize)]
pub struct ReceiveQuery {
    #[serde(rename = "utcReceivedAfter")]
    pub utc_received_after: Option<String>,
    pub recipient: Option<String>,
}

/// Create the API router
#[must_use]
pub fn router(letterbox: Arc<Letterbox>) -> Router {
    Router::new()
        .route("/receive_email", get(receive_email))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(AppState { letterbox })
}

/// Bind the configured address and serve until shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server loop
/// fails.
pub async fn serve(config: &Config, letterbox: Arc<Letterbox>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    serve_on(listener, letterbox).await
}

/// Serve on an already-bound listener.
///
/// Useful when the caller needs the ephemeral port before the server
/// starts, as the integration tests do.
///
/// # Errors
///
/// Returns an error if the server loop fails.
pub async fn serve_on(listener: tokio::net::TcpListener, letterbox: Arc<Letterbox>) -> Result<()> {
    axum::serve(listener, router(letterbox)).await?;
    Ok(())
}

/// Health check endpoint
#[allow(clippy::unused_async)]
async fn health() -> &'static str {
    "OK"
}

/// Receive-email endpoint
async fn receive_email(
    State(state): State<AppState>,
    Query(query): Query<ReceiveQuery>,
    headers: HeaderMap,
) -> Response {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.letterbox.authorize(auth_header).await {
        Ok(true) => {}
        Ok(false) => {
            debug!("rejected unauthorized request");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
        Err(e) => return internal_error(&e),
    }

    let (recipient, received_after) = match validate(&query) {
        Ok(parsed) => parsed,
        Err(e) => return internal_error(&e),
    };

    match state.letterbox.receive(recipient, received_after).await {
        Ok(Some(email)) => (StatusCode::OK, Json(email)).into_response(),
        Ok(None) => (StatusCode::NO_CONTENT, "no email found").into_response(),
        Err(e) => internal_error(&e),
    }
}

fn validate(query: &ReceiveQuery) -> Result<(&str, DateTime<Utc>)> {
    let recipient = query
        .recipient
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| Error::Parse("recipient query parameter is required".to_string()))?;
    let raw = query
        .utc_received_after
        .as_deref()
        .ok_or_else(|| Error::Parse("utcReceivedAfter query parameter is required".to_string()))?;
    let received_after = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| Error::Parse(format!("invalid utcReceivedAfter: {e}")))?
        .with_timezone(&Utc);
    Ok((recipient, received_after))
}

fn internal_error(e: &Error) -> Response {
    error!("request failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
}
