//! Service/product listing feature state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ListingId, UserId};

/// A directory listing as the billing core sees it.
///
/// Only the featured-placement fields are mutated here, by the one-off
/// feature-purchase flow. Creation and editing happen elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub title: String,

    /// Featured-placement flag. Meaningful only while `feature_expiration`
    /// is in the future; readers must treat an expired flag as not
    /// featured, since no background sweep clears it.
    pub is_featured: bool,

    /// When the purchased feature window ends.
    pub feature_expiration: Option<DateTime<Utc>>,

    /// Payment-intent (or session) id of the purchase that featured this
    /// listing last.
    pub last_payment_id: Option<String>,
}

impl Listing {
    /// Creates an unfeatured listing.
    pub fn new(id: ListingId, owner_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            title: title.into(),
            is_featured: false,
            feature_expiration: None,
            last_payment_id: None,
        }
    }

    /// True when the listing is featured and the window has not lapsed.
    pub fn is_currently_featured(&self, now: DateTime<Utc>) -> bool {
        self.is_featured && self.feature_expiration.map_or(false, |exp| exp > now)
    }
}
