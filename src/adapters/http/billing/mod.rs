//! Billing webhook HTTP surface.

mod dto;
mod handlers;
mod routes;

pub use handlers::BillingAppState;
pub use routes::webhook_routes;
