//! Booking repository.
//!
//! [`BookingRepository`] is the narrow interface the handlers depend on:
//! find by owner, find all, insert, delete one by `(date, time)`. Scan order
//! for both finds is insertion order.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tokio::sync::RwLock;

use slot_booking_core::{BookingRecord, Email, Slot};

use super::RepositoryError;

/// Storage for booking records.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// All records owned by `email`.
    async fn find_by_user_email(&self, email: &Email)
    -> Result<Vec<BookingRecord>, RepositoryError>;

    /// Every record.
    async fn find_all(&self) -> Result<Vec<BookingRecord>, RepositoryError>;

    /// Append one record. Duplicate `(date, time)` pairs are accepted.
    async fn insert(&self, record: &BookingRecord) -> Result<(), RepositoryError>;

    /// Remove the first record with this `date` and `slot.time`.
    ///
    /// Returns the number of records removed, 0 or 1.
    async fn delete_one(&self, date: &str, time: &str) -> Result<u64, RepositoryError>;

    /// Check the backing store is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

#[derive(sqlx::FromRow)]
struct BookingRow {
    user_email: String,
    date: String,
    slot: Json<Slot>,
}

impl TryFrom<BookingRow> for BookingRecord {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self::new(email, row.date, row.slot.0))
    }
}

/// Repository backed by the `booking` table.
#[derive(Debug, Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn find_by_user_email(
        &self,
        email: &Email,
    ) -> Result<Vec<BookingRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r"
            SELECT user_email, date, slot
            FROM booking
            WHERE user_email = $1
            ORDER BY id
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRecord::try_from).collect()
    }

    async fn find_all(&self) -> Result<Vec<BookingRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r"
            SELECT user_email, date, slot
            FROM booking
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRecord::try_from).collect()
    }

    async fn insert(&self, record: &BookingRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO booking (user_email, date, slot)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(&record.user.email)
        .bind(&record.date)
        .bind(Json(&record.updated_slot))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_one(&self, date: &str, time: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM booking
            WHERE id = (
                SELECT id FROM booking
                WHERE date = $1 AND slot ->> 'time' = $2
                ORDER BY id
                LIMIT 1
            )
            ",
        )
        .bind(date)
        .bind(time)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Repository held in process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryBookingRepository {
    records: RwLock<Vec<BookingRecord>>,
}

impl MemoryBookingRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn find_by_user_email(
        &self,
        email: &Email,
    ) -> Result<Vec<BookingRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.user.email == *email)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<BookingRecord>, RepositoryError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, record: &BookingRecord) -> Result<(), RepositoryError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn delete_one(&self, date: &str, time: &str) -> Result<u64, RepositoryError> {
        let mut records = self.records.write().await;
        match records.iter().position(|record| record.matches_slot(date, time)) {
            Some(index) => {
                records.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
