//! Foundation layer: shared value objects and error types.

mod errors;
mod ids;

pub use errors::{DomainError, ErrorCode};
pub use ids::{ListingId, PaymentId, SubscriptionId, UserId};
