//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `DatabaseService` port. Used by the
//! test suite and selectable at runtime with `DATABASE_URL=memory`.
//!
//! All tables sit behind one `RwLock`, so each port call is atomic with
//! respect to the others, matching the one-statement/one-transaction
//! behaviour of the Postgres adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{
    Book, PasswordResetToken, Reading, ReadingEntry, User, UserCredentials,
};
use reading_tracker_core::ports::{DatabaseService, PortError, PortResult};
use reading_tracker_core::{summarize_books, BookSummary, CounterUpdate, NewBook, NewReading};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

struct UserRow {
    user: User,
    hashed_password: String,
}

impl UserRow {
    fn credentials(&self) -> UserCredentials {
        UserCredentials {
            user_id: self.user.user_id,
            username: self.user.username.clone(),
            hashed_password: self.hashed_password.clone(),
        }
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    resets: HashMap<String, PasswordResetToken>,
    // Vecs keep insertion order, which doubles as creation order.
    books: Vec<Book>,
    readings: Vec<Reading>,
}

impl Tables {
    fn owned_book(&self, user_id: Uuid, book_id: Uuid) -> Option<&Book> {
        self.books
            .iter()
            .find(|b| b.id == book_id && b.user_id == user_id)
    }

    /// Drops sessions and reset tokens that can no longer be used.
    fn prune_expired(&mut self, now: DateTime<Utc>) {
        self.auth_sessions.retain(|_, (_, expires_at)| *expires_at > now);
        self.resets.retain(|_, reset| reset.expires_at > now);
    }
}

/// In-memory adapter that implements the `DatabaseService` port.
#[derive(Default)]
pub struct MemoryAdapter {
    tables: RwLock<Tables>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn book_not_found(book_id: Uuid) -> PortError {
    PortError::NotFound(format!("Book {} not found", book_id))
}

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|row| row.user.username == username) {
            return Err(PortError::Conflict(format!("User {} already exists", username)));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.user_id,
            UserRow {
                user: user.clone(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&user_id)
            .map(|row| row.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|row| row.user.username == username)
            .map(UserRow::credentials)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        row.hashed_password = hashed_password.to_string();
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.prune_expired(Utc::now());
        tables
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.tables.read().await.auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn delete_auth_sessions_for_user(&self, user_id: Uuid) -> PortResult<()> {
        self.tables
            .write()
            .await
            .auth_sessions
            .retain(|_, (owner, _)| *owner != user_id);
        Ok(())
    }

    async fn create_reset_token(&self, token: &PasswordResetToken) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.prune_expired(Utc::now());
        tables.resets.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn consume_reset_token(&self, token: &str) -> PortResult<Uuid> {
        match self.tables.write().await.resets.remove(token) {
            Some(reset) if reset.expires_at > Utc::now() => Ok(reset.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn create_book(&self, user_id: Uuid, book: &NewBook) -> PortResult<Book> {
        let created = Book {
            id: Uuid::new_v4(),
            user_id,
            name: book.name.clone(),
            total_pages: book.total_pages,
            pages_read: 0,
            last_page_read: 0,
            created_at: Utc::now(),
        };
        self.tables.write().await.books.push(created.clone());
        Ok(created)
    }

    async fn delete_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.owned_book(user_id, book_id).is_none() {
            return Ok(false);
        }
        tables.books.retain(|b| b.id != book_id);
        tables.readings.retain(|r| r.book_id != book_id);
        Ok(true)
    }

    async fn advance_book_counter(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        pages_today: i32,
    ) -> PortResult<CounterUpdate> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .iter_mut()
            .find(|b| b.id == book_id && b.user_id == user_id)
            .ok_or_else(|| book_not_found(book_id))?;
        let update = book.counter().advance(pages_today)?;
        book.pages_read = update.pages_read;
        book.last_page_read = update.last_page_read;
        Ok(update)
    }

    async fn create_reading(&self, user_id: Uuid, reading: &NewReading) -> PortResult<Reading> {
        let mut tables = self.tables.write().await;
        if tables.owned_book(user_id, reading.book_id).is_none() {
            return Err(book_not_found(reading.book_id));
        }
        let created = Reading {
            id: Uuid::new_v4(),
            user_id,
            book_id: reading.book_id,
            read_date: reading.read_date,
            pages_start: reading.pages_start,
            pages_end: reading.pages_end,
        };
        tables.readings.push(created.clone());
        Ok(created)
    }

    async fn delete_reading(&self, user_id: Uuid, reading_id: Uuid) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.readings.len();
        tables
            .readings
            .retain(|r| !(r.id == reading_id && r.user_id == user_id));
        Ok(tables.readings.len() < before)
    }

    async fn readings_for_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<Vec<Reading>> {
        let tables = self.tables.read().await;
        let mut readings: Vec<Reading> = tables
            .readings
            .iter()
            .filter(|r| r.book_id == book_id && r.user_id == user_id)
            .cloned()
            .collect();
        readings.sort_by_key(|r| r.read_date);
        Ok(readings)
    }

    async fn book_summaries(&self, user_id: Uuid) -> PortResult<Vec<BookSummary>> {
        let tables = self.tables.read().await;
        let books: Vec<Book> = tables
            .books
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        let readings: Vec<Reading> = tables
            .readings
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(summarize_books(books, &readings))
    }

    async fn reading_history(&self, user_id: Uuid) -> PortResult<Vec<ReadingEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<ReadingEntry> = tables
            .readings
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                let book = tables.owned_book(user_id, r.book_id)?;
                Some(ReadingEntry {
                    reading: r.clone(),
                    book_name: book.name.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.reading
                .read_date
                .cmp(&a.reading.read_date)
                .then(b.reading.pages_start.cmp(&a.reading.pages_start))
        });
        Ok(entries)
    }
}
