//! Subscription status as mirrored from the billing provider.

use serde::{Deserialize, Serialize};

/// Subscription lifecycle status.
///
/// `None` means the user has never subscribed. The remaining variants
/// mirror Stripe's subscription status strings; provider statuses we do
/// not track explicitly collapse to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    None,
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    Unknown,
}

impl SubscriptionStatus {
    /// True when this status grants marketplace access.
    ///
    /// This is the single entitlement gate: only `active` and `trialing`
    /// subscriptions are entitled. `past_due` keeps access only through
    /// the explicit grace-period path, never through this gate.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }

    /// Parses a provider status string. Also accepts our own stored
    /// `none`, which the provider never sends.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "none" => Self::None,
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "incomplete" | "incomplete_expired" | "unpaid" => Self::Incomplete,
            _ => Self::Unknown,
        }
    }

    /// Stable string form used in persistence and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_and_trialing_grant_access() {
        assert!(SubscriptionStatus::Active.grants_access());
        assert!(SubscriptionStatus::Trialing.grants_access());

        assert!(!SubscriptionStatus::None.grants_access());
        assert!(!SubscriptionStatus::PastDue.grants_access());
        assert!(!SubscriptionStatus::Canceled.grants_access());
        assert!(!SubscriptionStatus::Incomplete.grants_access());
        assert!(!SubscriptionStatus::Unknown.grants_access());
    }

    #[test]
    fn parses_known_provider_statuses() {
        assert_eq!(
            SubscriptionStatus::from_provider("active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_provider("past_due"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::from_provider("incomplete_expired"),
            SubscriptionStatus::Incomplete
        );
    }

    #[test]
    fn unrecognized_status_is_unknown() {
        assert_eq!(
            SubscriptionStatus::from_provider("paused"),
            SubscriptionStatus::Unknown
        );
    }

    #[test]
    fn as_str_roundtrips_for_provider_statuses() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Trialing,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
        ] {
            assert_eq!(SubscriptionStatus::from_provider(status.as_str()), status);
        }
    }
}
