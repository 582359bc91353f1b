//! services/api/src/web/views.rs
//!
//! JSON shapes returned by the dashboard and the mutation endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use reading_tracker_core::{Book, BookSummary, CounterUpdate, Reading, ReadingEntry};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A book with both its ledger statistics and its running counter.
#[derive(Serialize, ToSchema)]
pub struct BookView {
    pub id: Uuid,
    pub name: String,
    pub total_pages: Option<i32>,
    /// Sum of `end - start + 1` over the book's readings.
    pub total_pages_read: i64,
    /// Highest end page across the book's readings, `0` when none.
    pub last_page: i32,
    pub pages_read: i32,
    pub last_page_read: i32,
    pub created_at: DateTime<Utc>,
}

impl From<BookSummary> for BookView {
    fn from(summary: BookSummary) -> Self {
        let BookSummary { book, progress } = summary;
        Self {
            id: book.id,
            name: book.name,
            total_pages: book.total_pages,
            total_pages_read: progress.total_pages_read,
            last_page: progress.last_page,
            pages_read: book.pages_read,
            last_page_read: book.last_page_read,
            created_at: book.created_at,
        }
    }
}

impl From<Book> for BookView {
    /// A freshly created book has no readings yet.
    fn from(book: Book) -> Self {
        BookSummary {
            book,
            progress: Default::default(),
        }
        .into()
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReadingView {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_name: Option<String>,
    pub read_date: NaiveDate,
    pub pages_start: i32,
    pub pages_end: i32,
    pub pages_read: i64,
}

impl From<ReadingEntry> for ReadingView {
    fn from(entry: ReadingEntry) -> Self {
        let mut view = Self::from(entry.reading);
        view.book_name = Some(entry.book_name);
        view
    }
}

impl From<Reading> for ReadingView {
    fn from(reading: Reading) -> Self {
        Self {
            id: reading.id,
            book_id: reading.book_id,
            book_name: None,
            read_date: reading.read_date,
            pages_start: reading.pages_start,
            pages_end: reading.pages_end,
            pages_read: reading.pages_read(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CounterView {
    pub book_id: Uuid,
    pub pages_read: i32,
    pub last_page_read: i32,
    pub total_pages: Option<i32>,
    /// Pages the raw counter has run past `total_pages`. Only `last_page_read`
    /// is clamped, so this flags the mismatch instead of hiding it.
    pub overshoot: Option<i32>,
}

impl CounterView {
    pub fn new(book_id: Uuid, update: CounterUpdate) -> Self {
        Self {
            book_id,
            pages_read: update.pages_read,
            last_page_read: update.last_page_read,
            total_pages: update.total_pages,
            overshoot: update.overshoot(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub authenticated: bool,
    pub user_id: Uuid,
    pub username: String,
    pub today: NaiveDate,
    pub books: Vec<BookView>,
    pub readings: Vec<ReadingView>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginPrompt {
    pub authenticated: bool,
    pub message: String,
}
