//! crates/reading_tracker_core/src/validation.rs
//!
//! Shape checks for everything a user can submit. Only presence and
//! positivity are enforced.

use chrono::NaiveDate;
use uuid::Uuid;

/// A rejected submission. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username and password must not be empty.")]
    EmptyCredentials,
    #[error("Password must not be empty.")]
    EmptyPassword,
    #[error("Please select a book.")]
    NoBookSelected,
    #[error("Book name must not be empty.")]
    EmptyBookName,
    #[error("Total page count must be a positive number.")]
    NonPositiveTotalPages,
    #[error("Page numbers must be positive.")]
    NonPositivePage,
    #[error("End page must not be before the start page.")]
    StartAfterEnd,
    #[error("Pages read today cannot be negative.")]
    NegativePagesToday,
    #[error("Page count is too large.")]
    PageCountTooLarge,
    #[error("{0} must be a whole number.")]
    NotANumber(String),
    #[error("{0} is not a valid date.")]
    InvalidDate(String),
}

/// A username/password pair that passed the presence check.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self, ValidationError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::EmptyCredentials);
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// A book about to be added to a shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub name: String,
    pub total_pages: Option<i32>,
}

impl NewBook {
    pub fn new(name: &str, total_pages: Option<i32>) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyBookName);
        }
        if matches!(total_pages, Some(total) if total <= 0) {
            return Err(ValidationError::NonPositiveTotalPages);
        }
        Ok(Self {
            name: name.to_string(),
            total_pages,
        })
    }
}

/// A reading record about to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReading {
    pub book_id: Uuid,
    pub read_date: NaiveDate,
    pub pages_start: i32,
    pub pages_end: i32,
}

impl NewReading {
    pub fn new(
        book_id: Uuid,
        read_date: NaiveDate,
        pages_start: i32,
        pages_end: i32,
    ) -> Result<Self, ValidationError> {
        if pages_start < 1 || pages_end < 1 {
            return Err(ValidationError::NonPositivePage);
        }
        if pages_start > pages_end {
            return Err(ValidationError::StartAfterEnd);
        }
        Ok(Self {
            book_id,
            read_date,
            pages_start,
            pages_end,
        })
    }
}

/// Parses a whole-number form field. `field` names it in the error.
pub fn parse_page_count(field: &str, raw: &str) -> Result<i32, ValidationError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ValidationError::NotANumber(field.to_string()))
}

/// Parses an optional whole-number form field; blank means absent.
pub fn parse_optional_page_count(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<i32>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_page_count(field, value).map(Some),
    }
}

/// Parses the book selector of a reading form.
pub fn parse_book_id(raw: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ValidationError::NoBookSelected)
}

/// Parses an ISO `YYYY-MM-DD` date field; blank falls back to `today`.
pub fn parse_read_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(today),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(value.to_string())),
    }
}
