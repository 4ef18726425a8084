//! In-memory adapters.
//!
//! Used by tests and local development; each mirrors the contract of its
//! Postgres counterpart, including upsert-by-external-id semantics.

mod billing_provider;
mod listing_repository;
mod payment_ledger;
mod subscription_repository;
mod user_repository;
mod webhook_event_repository;

pub use billing_provider::MockBillingProvider;
pub use listing_repository::InMemoryListingRepository;
pub use payment_ledger::InMemoryPaymentLedger;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use user_repository::InMemoryUserRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
