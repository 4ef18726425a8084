//! Payment ledger port.

use async_trait::async_trait;

use crate::domain::billing::PaymentRecord;
use crate::domain::foundation::DomainError;

/// Append-only ledger of completed payments.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Appends a payment record.
    async fn record(&self, payment: &PaymentRecord) -> Result<(), DomainError>;
}
