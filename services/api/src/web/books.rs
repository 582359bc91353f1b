//! services/api/src/web/books.rs
//!
//! Book registry endpoints: add, delete, and the running page counter.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use reading_tracker_core::validation::{parse_optional_page_count, parse_page_count};
use reading_tracker_core::NewBook;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::{ApiForm, ApiPath};
use crate::web::protocol::LibraryEvent;
use crate::web::state::{AppState, CurrentUser};
use crate::web::views::{BookView, CounterView};

#[derive(Deserialize, ToSchema)]
pub struct AddBookForm {
    #[serde(default)]
    pub name: String,
    /// Optional; when given it must be a positive whole number.
    pub total_pages: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePagesForm {
    #[serde(default)]
    pub pages_today: String,
}

/// POST /add_book - Add a book to the caller's shelf
#[utoipa::path(
    post,
    path = "/add_book",
    request_body(content = AddBookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Book created", body = BookView),
        (status = 400, description = "Empty name or non-positive page count"),
        (status = 303, description = "No session, redirected to /")
    )
)]
pub async fn add_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiForm(form): ApiForm<AddBookForm>,
) -> Result<impl IntoResponse, ApiError> {
    let total_pages = parse_optional_page_count("Total pages", form.total_pages.as_deref())?;
    let new_book = NewBook::new(&form.name, total_pages)?;

    let book = state.db.create_book(user.user_id, &new_book).await?;
    info!(user_id = %user.user_id, book_id = %book.id, "Book added");

    state.events.publish(
        user.user_id,
        LibraryEvent::BookAdded {
            book_id: book.id,
            name: book.name.clone(),
            total_pages: book.total_pages,
        },
    );

    Ok((StatusCode::CREATED, Json(BookView::from(book))))
}

/// POST /delete_book/{id} - Delete a book and all of its readings
///
/// Books owned by someone else are left alone; the reply is the same.
#[utoipa::path(
    post,
    path = "/delete_book/{id}",
    params(("id" = Uuid, Path, description = "The book to delete")),
    responses(
        (status = 204, description = "Book gone (or was never the caller's)"),
        (status = 303, description = "No session, redirected to /")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(book_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.delete_book(user.user_id, book_id).await? {
        info!(user_id = %user.user_id, %book_id, "Book and its readings deleted");
        state
            .events
            .publish(user.user_id, LibraryEvent::BookDeleted { book_id });
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /update_pages/{id} - Add today's page count to a book's running counter
///
/// `last_page_read` is clamped to the book's total; `pages_read` is not.
#[utoipa::path(
    post,
    path = "/update_pages/{id}",
    params(("id" = Uuid, Path, description = "The book to update")),
    request_body(content = UpdatePagesForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Counter updated", body = CounterView),
        (status = 400, description = "Negative or non-numeric page count"),
        (status = 404, description = "No such book on the caller's shelf"),
        (status = 303, description = "No session, redirected to /")
    )
)]
pub async fn update_pages_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(book_id): ApiPath<Uuid>,
    ApiForm(form): ApiForm<UpdatePagesForm>,
) -> Result<impl IntoResponse, ApiError> {
    let pages_today = parse_page_count("Pages read today", &form.pages_today)?;

    let update = state
        .db
        .advance_book_counter(user.user_id, book_id, pages_today)
        .await?;
    let view = CounterView::new(book_id, update);

    if let Some(over) = view.overshoot {
        warn!(
            %book_id,
            pages_read = view.pages_read,
            total_pages = ?view.total_pages,
            "Page counter is {} past the book's total; last page was clamped",
            over
        );
    } else {
        info!(%book_id, pages_read = view.pages_read, "Page counter updated");
    }

    state.events.publish(
        user.user_id,
        LibraryEvent::CounterUpdated {
            book_id,
            pages_read: view.pages_read,
            last_page_read: view.last_page_read,
        },
    );

    Ok(Json(view))
}
