//! Listing persistence port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, ListingId};
use crate::domain::marketplace::Listing;

/// Repository for marketplace listings.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Finds a listing by id.
    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, DomainError>;

    /// Marks a listing as featured until the given expiration.
    /// `last_payment_ref` is the provider's payment-intent id, or the
    /// session id when no intent exists.
    ///
    /// Returns `false` when no listing with that id exists; a missing
    /// listing is the caller's decision, not a repository error.
    async fn set_featured(
        &self,
        id: ListingId,
        expiration: DateTime<Utc>,
        last_payment_ref: &str,
    ) -> Result<bool, DomainError>;
}
