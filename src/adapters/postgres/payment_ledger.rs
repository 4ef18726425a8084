//! PostgreSQL implementation of PaymentLedger.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::PaymentRecord;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PaymentLedger;

pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn record(&self, payment: &PaymentRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, listing_id, stripe_session_id, stripe_payment_intent_id,
                amount, currency, payment_type, status, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.map(|id| *id.as_uuid()))
        .bind(payment.listing_id.map(|id| *id.as_uuid()))
        .bind(&payment.stripe_session_id)
        .bind(&payment.stripe_payment_intent_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.payment_type.as_str())
        .bind(&payment.status)
        .bind(&payment.metadata)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to record payment: {}", e),
            )
        })?;

        Ok(())
    }
}
