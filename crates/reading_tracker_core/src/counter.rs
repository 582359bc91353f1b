//! crates/reading_tracker_core/src/counter.rs
//!
//! The incremental page counter kept directly on a book.
//!
//! The raw `pages_read` counter may run past `total_pages`; only
//! `last_page_read` is clamped. Callers that care can inspect
//! [`CounterUpdate::overshoot`].

use crate::domain::Book;
use crate::validation::ValidationError;

/// The current counter state of one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingCounter {
    pub pages_read: i32,
    pub total_pages: Option<i32>,
}

/// The new counter values after a "pages read today" submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    pub pages_read: i32,
    pub last_page_read: i32,
    pub total_pages: Option<i32>,
}

impl ReadingCounter {
    pub fn new(pages_read: i32, total_pages: Option<i32>) -> Self {
        Self { pages_read, total_pages }
    }

    /// Adds `pages_today` to the running counter.
    pub fn advance(&self, pages_today: i32) -> Result<CounterUpdate, ValidationError> {
        if pages_today < 0 {
            return Err(ValidationError::NegativePagesToday);
        }
        let pages_read = self
            .pages_read
            .checked_add(pages_today)
            .ok_or(ValidationError::PageCountTooLarge)?;
        let last_page_read = match self.total_pages {
            Some(total) => pages_read.min(total),
            None => pages_read,
        };
        Ok(CounterUpdate {
            pages_read,
            last_page_read,
            total_pages: self.total_pages,
        })
    }
}

impl Book {
    /// The book's current counter state.
    pub fn counter(&self) -> ReadingCounter {
        ReadingCounter::new(self.pages_read, self.total_pages)
    }
}

impl CounterUpdate {
    /// Pages the raw counter has gone past the book's total, if any.
    pub fn overshoot(&self) -> Option<i32> {
        self.total_pages
            .map(|total| self.pages_read - total)
            .filter(|over| *over > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_within_total() {
        let update = ReadingCounter::new(120, Some(200)).advance(30).unwrap();
        assert_eq!(update.pages_read, 150);
        assert_eq!(update.last_page_read, 150);
        assert_eq!(update.overshoot(), None);
    }

    #[test]
    fn clamps_last_page_but_keeps_raw_counter() {
        let update = ReadingCounter::new(190, Some(200)).advance(30).unwrap();
        assert_eq!(update.pages_read, 220);
        assert_eq!(update.last_page_read, 200);
        assert_eq!(update.overshoot(), Some(20));
    }

    #[test]
    fn exactly_reaching_total_is_not_overshoot() {
        let update = ReadingCounter::new(190, Some(200)).advance(10).unwrap();
        assert_eq!(update.last_page_read, 200);
        assert_eq!(update.overshoot(), None);
    }

    #[test]
    fn zero_pages_is_accepted() {
        let update = ReadingCounter::new(42, Some(300)).advance(0).unwrap();
        assert_eq!(update.pages_read, 42);
        assert_eq!(update.last_page_read, 42);
    }

    #[test]
    fn rejects_negative_pages() {
        let err = ReadingCounter::new(10, Some(100)).advance(-1).unwrap_err();
        assert_eq!(err, ValidationError::NegativePagesToday);
    }

    #[test]
    fn no_total_means_no_clamp() {
        let update = ReadingCounter::new(500, None).advance(25).unwrap();
        assert_eq!(update.last_page_read, 525);
        assert_eq!(update.overshoot(), None);
    }

    #[test]
    fn overflow_is_a_validation_error() {
        let err = ReadingCounter::new(i32::MAX, None).advance(1).unwrap_err();
        assert_eq!(err, ValidationError::PageCountTooLarge);
    }
}
