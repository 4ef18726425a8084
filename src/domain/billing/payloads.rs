//! Typed views over event payload objects.
//!
//! Handlers deserialize `event.data.object` into these shapes. Fields the
//! pipeline never reads are left out; serde ignores them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::SubscriptionStatus;
use crate::domain::foundation::{ListingId, UserId};

/// Checkout session payload (`checkout.session.completed`).
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// True when the session metadata tags this as a one-off
    /// featured-placement purchase.
    pub fn is_feature_purchase(&self) -> bool {
        self.metadata.contains_key("listing_id")
    }

    /// Listing id from metadata, if present and well-formed.
    pub fn listing_id(&self) -> Option<ListingId> {
        self.metadata.get("listing_id")?.parse().ok()
    }

    /// User id from metadata, if present and well-formed.
    pub fn user_id(&self) -> Option<UserId> {
        self.metadata.get("user_id")?.parse().ok()
    }

    /// Payment reference for the ledger: the payment intent, or the
    /// session id when no intent exists.
    pub fn payment_reference(&self) -> &str {
        self.payment_intent.as_deref().unwrap_or(&self.id)
    }
}

/// Subscription payload (`customer.subscription.*`).
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub price: Option<PriceObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceObject {
    pub id: String,
}

impl SubscriptionObject {
    pub fn parsed_status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_provider(&self.status)
    }

    /// Price id of the first line item.
    pub fn price_id(&self) -> Option<&str> {
        self.items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.as_str())
    }

    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.current_period_start
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn canceled_at_time(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Invoice payload (`invoice.payment_succeeded` / `invoice.payment_failed`).
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub currency: String,
    pub payment_intent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_session_detects_feature_purchase() {
        let listing_id = ListingId::new();
        let user_id = UserId::new();
        let session: CheckoutSessionObject = serde_json::from_value(json!({
            "id": "cs_feat_1",
            "customer": "cus_1",
            "payment_intent": "pi_1",
            "amount_total": 2500,
            "currency": "usd",
            "metadata": {
                "listing_id": listing_id.to_string(),
                "user_id": user_id.to_string()
            }
        }))
        .unwrap();

        assert!(session.is_feature_purchase());
        assert_eq!(session.listing_id(), Some(listing_id));
        assert_eq!(session.user_id(), Some(user_id));
        assert_eq!(session.payment_reference(), "pi_1");
    }

    #[test]
    fn checkout_session_without_metadata_is_not_feature_purchase() {
        let session: CheckoutSessionObject = serde_json::from_value(json!({
            "id": "cs_sub_1",
            "customer": "cus_1",
            "subscription": "sub_1"
        }))
        .unwrap();

        assert!(!session.is_feature_purchase());
        assert_eq!(session.payment_reference(), "cs_sub_1");
    }

    #[test]
    fn malformed_metadata_ids_are_ignored() {
        let session: CheckoutSessionObject = serde_json::from_value(json!({
            "id": "cs_bad",
            "metadata": { "listing_id": "not-a-uuid" }
        }))
        .unwrap();

        assert!(session.is_feature_purchase());
        assert!(session.listing_id().is_none());
    }

    #[test]
    fn subscription_object_extracts_price_and_periods() {
        let sub: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "trialing",
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "cancel_at_period_end": true,
            "items": { "data": [ { "price": { "id": "price_monthly" } } ] }
        }))
        .unwrap();

        assert_eq!(sub.parsed_status(), SubscriptionStatus::Trialing);
        assert_eq!(sub.price_id(), Some("price_monthly"));
        assert!(sub.cancel_at_period_end);
        assert_eq!(sub.period_start().unwrap().timestamp(), 1704067200);
        assert_eq!(sub.period_end().unwrap().timestamp(), 1706745600);
    }

    #[test]
    fn subscription_object_tolerates_missing_items() {
        let sub: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_2",
            "customer": "cus_2",
            "status": "active"
        }))
        .unwrap();

        assert!(sub.price_id().is_none());
        assert!(sub.period_end().is_none());
    }

    #[test]
    fn invoice_without_subscription_reference() {
        let invoice: InvoiceObject = serde_json::from_value(json!({
            "id": "in_1",
            "customer": "cus_1",
            "amount_paid": 1999,
            "currency": "usd"
        }))
        .unwrap();

        assert!(invoice.subscription.is_none());
        assert_eq!(invoice.amount_paid, 1999);
    }
}
