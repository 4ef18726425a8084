//! Error taxonomy for webhook reconciliation.
//!
//! The variants map one-to-one onto the propagation policy: signature and
//! payload failures stop the request with a 4xx; resolution and downstream
//! failures are logged and acknowledged so the provider stops redelivering
//! an event we can never use; only an unexpected processor failure
//! surfaces as a 500.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur while reconciling a webhook event.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Webhook timestamp is outside the acceptable window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Failed to parse the signature header or payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The event could not be mapped to any known user, subscription,
    /// or listing.
    #[error("Could not resolve event target: {0}")]
    Unresolvable(String),

    /// A best-effort fetch from the billing provider failed in a way
    /// that prevented resolution.
    #[error("Billing provider fetch failed: {0}")]
    DownstreamFetchFailed(String),

    /// A write against the entity store failed.
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),
}

impl ReconciliationError {
    /// True for variants the router logs and acknowledges rather than
    /// surfacing to the transport layer. Redelivering an event we cannot
    /// resolve only compounds duplicate side effects.
    pub fn is_acknowledged(&self) -> bool {
        matches!(
            self,
            ReconciliationError::Unresolvable(_)
                | ReconciliationError::DownstreamFetchFailed(_)
                | ReconciliationError::StoreWriteFailed(_)
        )
    }

    /// HTTP status for errors that escape to the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReconciliationError::SignatureInvalid
            | ReconciliationError::TimestampOutOfRange
            | ReconciliationError::ParseError(_) => StatusCode::BAD_REQUEST,

            // Acknowledged variants never reach HTTP through the router;
            // if one does, it still must not trigger upstream retries.
            ReconciliationError::Unresolvable(_)
            | ReconciliationError::DownstreamFetchFailed(_) => StatusCode::OK,

            ReconciliationError::StoreWriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ReconciliationError {
    fn from(err: DomainError) -> Self {
        ReconciliationError::StoreWriteFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn signature_failures_are_bad_request() {
        assert_eq!(
            ReconciliationError::SignatureInvalid.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReconciliationError::TimestampOutOfRange.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReconciliationError::ParseError("bad json".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn resolution_failures_are_acknowledged() {
        assert!(ReconciliationError::Unresolvable("no user".into()).is_acknowledged());
        assert!(ReconciliationError::DownstreamFetchFailed("timeout".into()).is_acknowledged());
        assert!(ReconciliationError::StoreWriteFailed("insert failed".into()).is_acknowledged());
    }

    #[test]
    fn signature_failures_are_not_acknowledged() {
        assert!(!ReconciliationError::SignatureInvalid.is_acknowledged());
        assert!(!ReconciliationError::ParseError("x".into()).is_acknowledged());
    }

    #[test]
    fn store_write_failure_maps_to_internal_error() {
        assert_eq!(
            ReconciliationError::StoreWriteFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_error_converts_to_store_write_failure() {
        let err: ReconciliationError =
            DomainError::new(ErrorCode::DatabaseError, "connection lost").into();
        assert!(matches!(err, ReconciliationError::StoreWriteFailed(_)));
    }
}
