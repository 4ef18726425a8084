//! In-memory payment ledger.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::PaymentRecord;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PaymentLedger;

#[derive(Default)]
pub struct InMemoryPaymentLedger {
    payments: RwLock<Vec<PaymentRecord>>,
    fail: RwLock<bool>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn all(&self) -> Vec<PaymentRecord> {
        self.payments.read().await.clone()
    }

    /// Makes every subsequent write fail, for exercising the best-effort
    /// contract.
    pub async fn fail_writes(&self) {
        *self.fail.write().await = true;
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn record(&self, payment: &PaymentRecord) -> Result<(), DomainError> {
        if *self.fail.read().await {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "ledger write rejected",
            ));
        }
        self.payments.write().await.push(payment.clone());
        Ok(())
    }
}
