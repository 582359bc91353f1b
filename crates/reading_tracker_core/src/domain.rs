//! crates/reading_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Represents a registered user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/reset - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub username: String,
    pub hashed_password: String,
}

/// A single-use token issued by the forgot-password flow.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A book on a user's shelf.
///
/// `pages_read` and `last_page_read` are the incremental counters; they are
/// independent of the reading ledger and only move through
/// [`crate::counter::ReadingCounter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub total_pages: Option<i32>,
    pub pages_read: i32,
    pub last_page_read: i32,
    pub created_at: DateTime<Utc>,
}

/// One logged interval of pages read on a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub read_date: NaiveDate,
    pub pages_start: i32,
    pub pages_end: i32,
}

impl Reading {
    /// Pages covered by this record, both ends inclusive.
    pub fn pages_read(&self) -> i64 {
        i64::from(self.pages_end) - i64::from(self.pages_start) + 1
    }
}

/// A reading joined with the name of its book, for the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingEntry {
    pub reading: Reading,
    pub book_name: String,
}
