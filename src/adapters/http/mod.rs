//! HTTP adapters: Axum routes and handlers.

pub mod billing;

use axum::routing::get;
use axum::Router;

use billing::BillingAppState;

async fn health() -> &'static str {
    "ok"
}

/// Builds the application router.
pub fn app_router(state: BillingAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", billing::webhook_routes())
        .with_state(state)
}
