//! crates/reading_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mailers.
//!
//! Every book and reading operation takes the acting `user_id`; adapters must
//! filter by it so a user can never see or touch another user's rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::counter::CounterUpdate;
use crate::domain::{Book, PasswordResetToken, Reading, ReadingEntry, User, UserCredentials};
use crate::progress::BookSummary;
use crate::validation::{NewBook, NewReading, ValidationError};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `PortError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user of an unexpired session, `Unauthorized` otherwise.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    async fn delete_auth_sessions_for_user(&self, user_id: Uuid) -> PortResult<()>;

    // --- Password Reset ---
    async fn create_reset_token(&self, token: &PasswordResetToken) -> PortResult<()>;

    /// Deletes the token and returns its user. Unknown or expired tokens are `Unauthorized`.
    async fn consume_reset_token(&self, token: &str) -> PortResult<Uuid>;

    // --- Book Registry ---
    async fn create_book(&self, user_id: Uuid, book: &NewBook) -> PortResult<Book>;

    /// Deletes the book and all of its readings. Returns `false` when nothing matched.
    async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;

    /// Applies a "pages read today" submission to the book's running counter.
    async fn advance_book_counter(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        pages_today: i32,
    ) -> PortResult<CounterUpdate>;

    // --- Reading Ledger ---
    /// `NotFound` when the referenced book is not owned by `user_id`.
    async fn create_reading(&self, user_id: Uuid, reading: &NewReading) -> PortResult<Reading>;

    /// Returns `false` when nothing matched.
    async fn delete_reading(&self, user_id: Uuid, reading_id: Uuid) -> PortResult<bool>;

    async fn readings_for_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<Vec<Reading>>;

    // --- Aggregation ---
    /// One summary per book owned by the user, oldest book first.
    async fn book_summaries(&self, user_id: Uuid) -> PortResult<Vec<BookSummary>>;

    /// The user's readings joined with book names, newest date first.
    async fn reading_history(&self, user_id: Uuid) -> PortResult<Vec<ReadingEntry>>;
}

#[async_trait]
pub trait ResetNotifier: Send + Sync {
    /// Hands a freshly issued reset token to whatever delivers it to the user.
    async fn send_reset_token(&self, username: &str, token: &PasswordResetToken) -> PortResult<()>;
}
