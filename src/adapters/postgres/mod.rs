//! PostgreSQL adapters.

mod listing_repository;
mod payment_ledger;
mod subscription_repository;
mod user_repository;
mod webhook_event_repository;

pub use listing_repository::PostgresListingRepository;
pub use payment_ledger::PostgresPaymentLedger;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_repository::PostgresUserRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
