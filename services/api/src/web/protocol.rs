//! services/api/src/web/protocol.rs
//!
//! Defines the messages pushed to a user's WebSocket feed whenever their
//! library changes. Clients are expected to re-read `GET /` for full state;
//! the events only say what changed.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Represents the structured text messages the server sends to a subscribed client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibraryEvent {
    BookAdded {
        book_id: Uuid,
        name: String,
        total_pages: Option<i32>,
    },
    BookDeleted {
        book_id: Uuid,
    },
    ReadingAdded {
        reading_id: Uuid,
        book_id: Uuid,
        read_date: NaiveDate,
        pages_start: i32,
        pages_end: i32,
    },
    ReadingDeleted {
        reading_id: Uuid,
    },
    CounterUpdated {
        book_id: Uuid,
        pages_read: i32,
        last_page_read: i32,
    },

    /// Some events were dropped because the client fell behind; reload everything.
    Resync,
}
