//! In-memory listing repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ListingId};
use crate::domain::marketplace::Listing;
use crate::ports::ListingRepository;

#[derive(Default)]
pub struct InMemoryListingRepository {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, listing: Listing) {
        self.listings.write().await.insert(listing.id, listing);
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, DomainError> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn set_featured(
        &self,
        id: ListingId,
        expiration: DateTime<Utc>,
        last_payment_ref: &str,
    ) -> Result<bool, DomainError> {
        let mut listings = self.listings.write().await;
        match listings.get_mut(&id) {
            Some(listing) => {
                listing.is_featured = true;
                listing.feature_expiration = Some(expiration);
                listing.last_payment_id = Some(last_payment_ref.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
