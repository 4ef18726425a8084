//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::marketplace::User;
use crate::ports::UserRepository;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user's billing projection.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    is_subscribed: bool,
    subscription_status: String,
    subscription_plan: Option<String>,
    subscription_start: Option<DateTime<Utc>>,
    subscription_end: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            is_subscribed: row.is_subscribed,
            subscription_status: SubscriptionStatus::from_provider(&row.subscription_status),
            subscription_plan: row.subscription_plan,
            subscription_start: row.subscription_start,
            subscription_end: row.subscription_end,
        }
    }
}

const USER_COLUMNS: &str = "id, email, stripe_customer_id, stripe_subscription_id, \
     is_subscribed, subscription_status, subscription_plan, subscription_start, subscription_end";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
                })?;

        Ok(row.map(User::from))
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE stripe_customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find user by customer id: {}", e),
            )
        })?;

        Ok(row.map(User::from))
    }

    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE stripe_subscription_id = $1"
        ))
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find user by subscription id: {}", e),
            )
        })?;

        Ok(row.map(User::from))
    }

    async fn save_billing_state(&self, user: &User) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                stripe_customer_id = $2,
                stripe_subscription_id = $3,
                is_subscribed = $4,
                subscription_status = $5,
                subscription_plan = $6,
                subscription_start = $7,
                subscription_end = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.stripe_customer_id)
        .bind(&user.stripe_subscription_id)
        .bind(user.is_subscribed)
        .bind(user.subscription_status.as_str())
        .bind(&user.subscription_plan)
        .bind(user.subscription_start)
        .bind(user.subscription_end)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to save user billing state: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
        }

        Ok(())
    }
}
