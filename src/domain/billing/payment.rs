//! Payment ledger records.
//!
//! The ledger is an append-only audit trail of completed payments. It is
//! diagnostic, not authoritative: a failed ledger write is logged and
//! swallowed, never allowed to fail the event that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ListingId, PaymentId, UserId};

/// What a payment paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// One-off featured-placement purchase for a listing.
    Feature,
    /// Subscription checkout or renewal.
    Subscription,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Subscription => "subscription",
        }
    }
}

/// One completed payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub user_id: Option<UserId>,
    pub listing_id: Option<ListingId>,
    pub stripe_session_id: String,
    pub stripe_payment_intent_id: Option<String>,
    /// Amount in major currency units, converted from the provider's
    /// minor units.
    pub amount: f64,
    pub currency: String,
    pub payment_type: PaymentType,
    pub status: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Converts a minor-unit amount (cents) into major units.
    pub fn amount_from_minor_units(minor: i64) -> f64 {
        minor as f64 / 100.0
    }

    /// Builds a featured-placement ledger row.
    pub fn feature(
        user_id: Option<UserId>,
        listing_id: ListingId,
        session_id: impl Into<String>,
        payment_intent_id: Option<String>,
        amount_minor: i64,
        currency: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            listing_id: Some(listing_id),
            stripe_session_id: session_id.into(),
            stripe_payment_intent_id: payment_intent_id,
            amount: Self::amount_from_minor_units(amount_minor),
            currency: currency.into(),
            payment_type: PaymentType::Feature,
            status: "completed".to_string(),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Builds a subscription-payment ledger row.
    pub fn subscription(
        user_id: UserId,
        session_id: impl Into<String>,
        payment_intent_id: Option<String>,
        amount_minor: i64,
        currency: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id: Some(user_id),
            listing_id: None,
            stripe_session_id: session_id.into(),
            stripe_payment_intent_id: payment_intent_id,
            amount: Self::amount_from_minor_units(amount_minor),
            currency: currency.into(),
            payment_type: PaymentType::Subscription,
            status: "completed".to_string(),
            metadata,
            created_at: Utc::now(),
        }
    }
}
