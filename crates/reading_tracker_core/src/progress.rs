//! crates/reading_tracker_core/src/progress.rs
//!
//! The per-book aggregation over the reading ledger.

use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{Book, Reading};

/// Derived statistics for one book. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookProgress {
    /// Sum of `end - start + 1` over every reading of the book.
    pub total_pages_read: i64,
    /// Highest `end` page across the readings, `0` when there are none.
    pub last_page: i32,
}

impl BookProgress {
    /// Aggregates a set of readings that all belong to the same book.
    pub fn from_readings<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        readings
            .into_iter()
            .fold(Self::default(), |acc, reading| acc.record(reading))
    }

    fn record(self, reading: &Reading) -> Self {
        Self {
            total_pages_read: self.total_pages_read + reading.pages_read(),
            last_page: self.last_page.max(reading.pages_end),
        }
    }
}

/// A book together with its ledger statistics: one dashboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    pub book: Book,
    pub progress: BookProgress,
}

/// Groups a user's readings by book and aggregates each group.
///
/// Every book yields exactly one summary, in the order given; readings whose
/// book is not in `books` are ignored.
pub fn summarize_books(books: Vec<Book>, readings: &[Reading]) -> Vec<BookSummary> {
    let mut by_book: HashMap<Uuid, BookProgress> = HashMap::new();
    for reading in readings {
        let entry = by_book.entry(reading.book_id).or_default();
        *entry = entry.record(reading);
    }

    books
        .into_iter()
        .map(|book| {
            let progress = by_book.get(&book.id).copied().unwrap_or_default();
            BookSummary { book, progress }
        })
        .collect()
}
