//! PostgreSQL implementation of ListingRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, ListingId, UserId};
use crate::domain::marketplace::Listing;
use crate::ports::ListingRepository;

pub struct PostgresListingRepository {
    pool: PgPool,
}

impl PostgresListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    is_featured: bool,
    feature_expiration: Option<DateTime<Utc>>,
    last_payment_id: Option<String>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: ListingId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            title: row.title,
            is_featured: row.is_featured,
            feature_expiration: row.feature_expiration,
            last_payment_id: row.last_payment_id,
        }
    }
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, DomainError> {
        let row: Option<ListingRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, title, is_featured, feature_expiration, last_payment_id
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find listing: {}", e),
            )
        })?;

        Ok(row.map(Listing::from))
    }

    async fn set_featured(
        &self,
        id: ListingId,
        expiration: DateTime<Utc>,
        last_payment_ref: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE listings SET
                is_featured = TRUE,
                feature_expiration = $2,
                last_payment_id = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(expiration)
        .bind(last_payment_ref)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to feature listing: {}", e),
            )
        })?;

        Ok(result.rows_affected() > 0)
    }
}
