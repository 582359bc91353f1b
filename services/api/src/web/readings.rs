//! services/api/src/web/readings.rs
//!
//! Reading ledger endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use reading_tracker_core::validation::{parse_book_id, parse_page_count, parse_read_date};
use reading_tracker_core::NewReading;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::{ApiForm, ApiPath};
use crate::web::protocol::LibraryEvent;
use crate::web::state::{AppState, CurrentUser};
use crate::web::views::ReadingView;

#[derive(Deserialize, ToSchema)]
pub struct AddReadingForm {
    #[serde(default)]
    pub book_id: String,
    /// `YYYY-MM-DD`; today when blank or absent.
    pub read_date: Option<String>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// POST /add_reading - Log a page range read on a given day
#[utoipa::path(
    post,
    path = "/add_reading",
    request_body(content = AddReadingForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Reading logged", body = ReadingView),
        (status = 400, description = "Missing book, bad date, or start page after end page"),
        (status = 404, description = "No such book on the caller's shelf"),
        (status = 303, description = "No session, redirected to /")
    )
)]
pub async fn add_reading_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiForm(form): ApiForm<AddReadingForm>,
) -> Result<impl IntoResponse, ApiError> {
    let book_id = parse_book_id(&form.book_id)?;
    let read_date = parse_read_date(form.read_date.as_deref(), Utc::now().date_naive())?;
    let start = parse_page_count("Start page", &form.start)?;
    let end = parse_page_count("End page", &form.end)?;
    let new_reading = NewReading::new(book_id, read_date, start, end)?;

    let reading = state.db.create_reading(user.user_id, &new_reading).await?;
    info!(
        user_id = %user.user_id,
        %book_id,
        pages = reading.pages_read(),
        "Reading logged"
    );

    state.events.publish(
        user.user_id,
        LibraryEvent::ReadingAdded {
            reading_id: reading.id,
            book_id,
            read_date: reading.read_date,
            pages_start: reading.pages_start,
            pages_end: reading.pages_end,
        },
    );

    Ok((StatusCode::CREATED, Json(ReadingView::from(reading))))
}

/// POST /delete_reading/{id} - Delete one reading record
///
/// Readings owned by someone else are left alone; the reply is the same.
#[utoipa::path(
    post,
    path = "/delete_reading/{id}",
    params(("id" = Uuid, Path, description = "The reading to delete")),
    responses(
        (status = 204, description = "Reading gone (or was never the caller's)"),
        (status = 303, description = "No session, redirected to /")
    )
)]
pub async fn delete_reading_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(reading_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.delete_reading(user.user_id, reading_id).await? {
        info!(user_id = %user.user_id, %reading_id, "Reading deleted");
        state
            .events
            .publish(user.user_id, LibraryEvent::ReadingDeleted { reading_id });
    }
    Ok(StatusCode::NO_CONTENT)
}
