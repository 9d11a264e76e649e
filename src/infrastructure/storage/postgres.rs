//! PostgreSQL repositories with connection pooling

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::merchant::{MerchantId, MerchantProfile, MerchantRepository};
use crate::domain::product::{Product, ProductId, ProductRepository};
use crate::domain::usage_log::{UsageLogEntry, UsageLogId, UsageLogRepository, UsageStatus};
use crate::domain::verification::{normalize_email, VerificationCode, VerificationCodeRepository};
use crate::domain::DomainError;

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/droutfit".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Opens a pooled connection to the configured database
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", name, e)))
}

/// PostgreSQL implementation of MerchantRepository backed by `profiles`
#[derive(Debug, Clone)]
pub struct PostgresMerchantRepository {
    pool: PgPool,
}

impl PostgresMerchantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MerchantRepository for PostgresMerchantRepository {
    async fn get(&self, id: &MerchantId) -> Result<Option<MerchantProfile>, DomainError> {
        let row = sqlx::query("SELECT id, credits, rate_limit FROM profiles WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get merchant profile: {}", e)))?;

        row.as_ref().map(row_to_merchant).transpose()
    }

    async fn any(&self) -> Result<Option<MerchantProfile>, DomainError> {
        let row = sqlx::query(
            "SELECT id, credits, rate_limit FROM profiles ORDER BY created_at, id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get merchant profile: {}", e)))?;

        row.as_ref().map(row_to_merchant).transpose()
    }

    async fn save(&self, merchant: MerchantProfile) -> Result<MerchantProfile, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, credits, rate_limit)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET credits = EXCLUDED.credits, rate_limit = EXCLUDED.rate_limit
            "#,
        )
        .bind(merchant.id().as_str())
        .bind(merchant.credits())
        .bind(merchant.rate_limit().map(|r| r as i32))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to save merchant profile: {}", e)))?;

        Ok(merchant)
    }

    async fn debit_credits(
        &self,
        id: &MerchantId,
        amount: i64,
    ) -> Result<Option<i64>, DomainError> {
        // Single conditional statement: concurrent debits can never drive the balance below zero
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE profiles
            SET credits = GREATEST(credits - $2, 0)
            WHERE id = $1 AND credits > 0
            RETURNING credits
            "#,
        )
        .bind(id.as_str())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to debit credits: {}", e)))?;

        Ok(remaining)
    }

    async fn add_credits(&self, id: &MerchantId, amount: i64) -> Result<Option<i64>, DomainError> {
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE profiles SET credits = credits + $2 WHERE id = $1 RETURNING credits",
        )
        .bind(id.as_str())
        .bind(amount.max(0))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to add credits: {}", e)))?;

        Ok(balance)
    }
}

fn row_to_merchant(row: &PgRow) -> Result<MerchantProfile, DomainError> {
    let id: String = column(row, "id")?;
    let credits: i64 = column(row, "credits")?;
    let rate_limit: Option<i32> = column(row, "rate_limit")?;

    let merchant = MerchantProfile::new(id, credits);

    Ok(match rate_limit {
        Some(limit) if limit >= 0 => merchant.with_rate_limit(limit as u32),
        _ => merchant,
    })
}

/// PostgreSQL implementation of ProductRepository
#[derive(Debug, Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        let row = sqlx::query(
            "SELECT id, user_id, usage_count, redirect_url FROM products WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get product: {}", e)))?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn save(&self, product: Product) -> Result<Product, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, user_id, usage_count, redirect_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET user_id = EXCLUDED.user_id, redirect_url = EXCLUDED.redirect_url
            "#,
        )
        .bind(product.id().as_str())
        .bind(product.merchant_id().as_str())
        .bind(product.usage_count() as i64)
        .bind(product.redirect_url())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to save product: {}", e)))?;

        Ok(product)
    }

    async fn increment_usage(&self, id: &ProductId) -> Result<Option<u64>, DomainError> {
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET usage_count = usage_count + 1 WHERE id = $1 RETURNING usage_count",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to increment product usage: {}", e)))?;

        Ok(count.map(|c| c.max(0) as u64))
    }
}

fn row_to_product(row: &PgRow) -> Result<Product, DomainError> {
    let id: String = column(row, "id")?;
    let merchant_id: String = column(row, "user_id")?;
    let usage_count: i64 = column(row, "usage_count")?;
    let redirect_url: Option<String> = column(row, "redirect_url")?;

    let product = Product::new(id, merchant_id).with_usage_count(usage_count.max(0) as u64);

    Ok(match redirect_url {
        Some(url) => product.with_redirect_url(url),
        None => product,
    })
}

/// PostgreSQL implementation of UsageLogRepository
#[derive(Debug, Clone)]
pub struct PostgresUsageLogRepository {
    pool: PgPool,
}

impl PostgresUsageLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLogRepository for PostgresUsageLogRepository {
    async fn create(&self, entry: UsageLogEntry) -> Result<UsageLogEntry, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO usage_logs (id, user_id, ip_address, product_id, status,
                                    latency_ms, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id().as_str())
        .bind(entry.merchant_id.as_str())
        .bind(&entry.ip_address)
        .bind(entry.product_id.as_deref())
        .bind(i32::from(entry.status.code()))
        .bind(entry.latency_ms as i64)
        .bind(entry.metadata.as_deref())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create usage log entry: {}", e)))?;

        Ok(entry)
    }

    async fn get(&self, id: &UsageLogId) -> Result<Option<UsageLogEntry>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, ip_address, product_id, status, latency_ms, metadata, created_at
            FROM usage_logs
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get usage log entry: {}", e)))?;

        row.as_ref().map(row_to_usage_entry).transpose()
    }

    async fn finalize(
        &self,
        id: &UsageLogId,
        status: UsageStatus,
        latency_ms: u64,
        metadata: Option<String>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE usage_logs SET status = $2, latency_ms = $3, metadata = $4 WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(i32::from(status.code()))
        .bind(latency_ms as i64)
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to finalize usage log entry: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Usage log entry '{}' not found",
                id
            )));
        }

        Ok(())
    }

    async fn count_since(
        &self,
        merchant_id: &MerchantId,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM usage_logs
            WHERE user_id = $1 AND ip_address = $2 AND created_at >= $3 AND status <> $4
            "#,
        )
        .bind(merchant_id.as_str())
        .bind(ip_address)
        .bind(since)
        .bind(i32::from(UsageStatus::Blocked.code()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count usage: {}", e)))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn list_by_merchant(
        &self,
        merchant_id: &MerchantId,
        limit: usize,
    ) -> Result<Vec<UsageLogEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, ip_address, product_id, status, latency_ms, metadata, created_at
            FROM usage_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(merchant_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list usage log entries: {}", e)))?;

        rows.iter().map(row_to_usage_entry).collect()
    }
}

fn row_to_usage_entry(row: &PgRow) -> Result<UsageLogEntry, DomainError> {
    let id: String = column(row, "id")?;
    let merchant_id: String = column(row, "user_id")?;
    let ip_address: String = column(row, "ip_address")?;
    let product_id: Option<String> = column(row, "product_id")?;
    let status: i32 = column(row, "status")?;
    let latency_ms: i64 = column(row, "latency_ms")?;
    let metadata: Option<String> = column(row, "metadata")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    let status = u16::try_from(status)
        .map_err(|_| DomainError::storage(format!("Invalid usage status in database: {}", status)))?;

    let mut entry = UsageLogEntry::pending(MerchantId::new(merchant_id), ip_address, product_id)
        .with_id(id)
        .with_status(UsageStatus::from_code(status))
        .with_created_at(created_at);
    entry.latency_ms = latency_ms.max(0) as u64;
    entry.metadata = metadata;

    Ok(entry)
}

/// PostgreSQL implementation of VerificationCodeRepository
#[derive(Debug, Clone)]
pub struct PostgresVerificationCodeRepository {
    pool: PgPool,
}

impl PostgresVerificationCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeRepository for PostgresVerificationCodeRepository {
    async fn replace(&self, code: VerificationCode) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO verification_codes (email, code_hash, expires_at, failed_attempts)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (email) DO UPDATE
            SET code_hash = EXCLUDED.code_hash,
                expires_at = EXCLUDED.expires_at,
                failed_attempts = 0
            "#,
        )
        .bind(code.email())
        .bind(code.code_hash())
        .bind(code.expires_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to store verification code: {}", e)))?;

        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<VerificationCode>, DomainError> {
        let row = sqlx::query(
            "SELECT email, code_hash, expires_at, failed_attempts FROM verification_codes WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get verification code: {}", e)))?;

        match row {
            Some(row) => {
                let failed_attempts: i32 = column(&row, "failed_attempts")?;
                Ok(Some(
                    VerificationCode::from_parts(
                        column(&row, "email")?,
                        column(&row, "code_hash")?,
                        column(&row, "expires_at")?,
                    )
                    .with_failed_attempts(u32::try_from(failed_attempts).unwrap_or(0)),
                ))
            }
            None => Ok(None),
        }
    }

    async fn record_failure(&self, email: &str) -> Result<u32, DomainError> {
        let count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE verification_codes
            SET failed_attempts = failed_attempts + 1
            WHERE email = $1
            RETURNING failed_attempts
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::storage(format!("Failed to record verification failure: {}", e))
        })?;

        Ok(count.and_then(|c| u32::try_from(c).ok()).unwrap_or(0))
    }

    async fn delete(&self, email: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(normalize_email(email))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete verification code: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
