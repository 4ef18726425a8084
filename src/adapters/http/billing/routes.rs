//! Axum router for the webhook endpoint.
//!
//! Webhooks carry no session auth; authenticity rests entirely on the
//! signature check inside the handler.

use axum::routing::post;
use axum::Router;

use super::handlers::{handle_stripe_webhook, BillingAppState};

/// # Routes
/// - `POST /stripe` - billing provider webhook intake
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
