//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! The per-book aggregation is pushed down into SQL here; the in-memory adapter
//! computes the same numbers with `reading_tracker_core::progress`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reading_tracker_core::domain::{
    Book, PasswordResetToken, Reading, ReadingEntry, User, UserCredentials,
};
use reading_tracker_core::ports::{DatabaseService, PortError, PortResult};
use reading_tracker_core::{BookProgress, BookSummary, CounterUpdate, NewBook, NewReading};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn book_not_found(book_id: Uuid) -> PortError {
    PortError::NotFound(format!("Book {} not found", book_id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    username: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            username: self.username,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    total_pages: Option<i32>,
    pages_read: i32,
    last_page_read: i32,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            total_pages: self.total_pages,
            pages_read: self.pages_read,
            last_page_read: self.last_page_read,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookSummaryRecord {
    #[sqlx(flatten)]
    book: BookRecord,
    total_pages_read: i64,
    last_page: i32,
}
impl BookSummaryRecord {
    fn to_domain(self) -> BookSummary {
        BookSummary {
            book: self.book.to_domain(),
            progress: BookProgress {
                total_pages_read: self.total_pages_read,
                last_page: self.last_page,
            },
        }
    }
}

#[derive(FromRow)]
struct ReadingRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    read_date: NaiveDate,
    pages_start: i32,
    pages_end: i32,
}
impl ReadingRecord {
    fn to_domain(self) -> Reading {
        Reading {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            read_date: self.read_date,
            pages_start: self.pages_start,
            pages_end: self.pages_end,
        }
    }
}

#[derive(FromRow)]
struct ReadingEntryRecord {
    #[sqlx(flatten)]
    reading: ReadingRecord,
    book_name: String,
}
impl ReadingEntryRecord {
    fn to_domain(self) -> ReadingEntry {
        ReadingEntry {
            reading: self.reading.to_domain(),
            book_name: self.book_name,
        }
    }
}

#[derive(FromRow)]
struct CounterRecord {
    pages_read: i32,
    total_pages: Option<i32>,
}

#[derive(FromRow)]
struct ResetRecord {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, username, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, username, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                PortError::Conflict(format!("User {} already exists", username))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, username, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", username)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET hashed_password = $1 WHERE user_id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_auth_sessions_for_user(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_reset_token(&self, token: &PasswordResetToken) -> PortResult<()> {
        sqlx::query("DELETE FROM password_resets WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&token.token)
            .bind(token.user_id)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn consume_reset_token(&self, token: &str) -> PortResult<Uuid> {
        let record = sqlx::query_as::<_, ResetRecord>(
            "DELETE FROM password_resets WHERE token = $1 RETURNING user_id, expires_at",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        match record {
            Some(r) if r.expires_at > Utc::now() => Ok(r.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn create_book(&self, user_id: Uuid, book: &NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (id, user_id, name, total_pages) VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, name, total_pages, pages_read, last_page_read, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&book.name)
        .bind(book.total_pages)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM readings WHERE book_id = $1 AND user_id = $2")
            .bind(book_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
            .bind(book_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn advance_book_counter(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        pages_today: i32,
    ) -> PortResult<CounterUpdate> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let current = sqlx::query_as::<_, CounterRecord>(
            "SELECT pages_read, total_pages FROM books WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| book_not_found(book_id))?;

        let update = reading_tracker_core::ReadingCounter::new(current.pages_read, current.total_pages)
            .advance(pages_today)?;

        sqlx::query("UPDATE books SET pages_read = $1, last_page_read = $2 WHERE id = $3")
            .bind(update.pages_read)
            .bind(update.last_page_read)
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(update)
    }

    async fn create_reading(&self, user_id: Uuid, reading: &NewReading) -> PortResult<Reading> {
        // The SELECT ... WHERE EXISTS guard keeps the insert owner-scoped in one statement.
        let record = sqlx::query_as::<_, ReadingRecord>(
            "INSERT INTO readings (id, user_id, book_id, read_date, pages_start, pages_end) \
             SELECT $1, $2, $3, $4, $5, $6 \
             WHERE EXISTS (SELECT 1 FROM books WHERE id = $3 AND user_id = $2) \
             RETURNING id, user_id, book_id, read_date, pages_start, pages_end",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(reading.book_id)
        .bind(reading.read_date)
        .bind(reading.pages_start)
        .bind(reading.pages_end)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| book_not_found(reading.book_id))?;
        Ok(record.to_domain())
    }

    async fn delete_reading(&self, user_id: Uuid, reading_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM readings WHERE id = $1 AND user_id = $2")
            .bind(reading_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn readings_for_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<Vec<Reading>> {
        let records = sqlx::query_as::<_, ReadingRecord>(
            "SELECT id, user_id, book_id, read_date, pages_start, pages_end FROM readings \
             WHERE book_id = $1 AND user_id = $2 ORDER BY read_date ASC",
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn book_summaries(&self, user_id: Uuid) -> PortResult<Vec<BookSummary>> {
        let records = sqlx::query_as::<_, BookSummaryRecord>(
            "SELECT b.id, b.user_id, b.name, b.total_pages, b.pages_read, b.last_page_read, b.created_at, \
                    COALESCE(SUM(r.pages_end - r.pages_start + 1), 0)::BIGINT AS total_pages_read, \
                    COALESCE(MAX(r.pages_end), 0) AS last_page \
             FROM books b \
             LEFT JOIN readings r ON r.book_id = b.id AND r.user_id = b.user_id \
             WHERE b.user_id = $1 \
             GROUP BY b.id \
             ORDER BY b.created_at ASC, b.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn reading_history(&self, user_id: Uuid) -> PortResult<Vec<ReadingEntry>> {
        let records = sqlx::query_as::<_, ReadingEntryRecord>(
            "SELECT r.id, r.user_id, r.book_id, r.read_date, r.pages_start, r.pages_end, \
                    b.name AS book_name \
             FROM readings r \
             JOIN books b ON b.id = r.book_id \
             WHERE r.user_id = $1 \
             ORDER BY r.read_date DESC, r.pages_start DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
