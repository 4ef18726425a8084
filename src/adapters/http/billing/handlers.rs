//! HTTP handler for the billing webhook endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use tracing::error;

use super::dto::WebhookAckResponse;
use crate::application::handlers::billing::{ProcessWebhookCommand, ProcessWebhookHandler};
use crate::domain::billing::ReconciliationError;

/// Shared state for billing routes.
#[derive(Clone)]
pub struct BillingAppState {
    pub webhook_handler: Arc<ProcessWebhookHandler>,
}

/// Webhook intake.
///
/// The body must stay raw `Bytes` until the signature is verified; any
/// earlier parse would break the signature contract.
///
/// Responses: 200 on processed-or-gracefully-skipped, 400 on signature or
/// payload failure, 500 only when the dedup store itself failed.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookAckResponse::error("Missing Stripe-Signature header")),
        );
    };

    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match state.webhook_handler.handle(cmd).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAckResponse::ok())),
        Err(err @ ReconciliationError::StoreWriteFailed(_)) => {
            error!(error = %err, "webhook processing failed unexpectedly");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookAckResponse::error("Internal error")),
            )
        }
        Err(err) => (
            err.status_code(),
            Json(WebhookAckResponse::error(err.to_string())),
        ),
    }
}
