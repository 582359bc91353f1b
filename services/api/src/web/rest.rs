//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{auth, books, dashboard, protocol, readings, views, ws_handler};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard::index_handler,
        dashboard::health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::forgot_handler,
        auth::reset_handler,
        books::add_book_handler,
        books::delete_book_handler,
        books::update_pages_handler,
        readings::add_reading_handler,
        readings::delete_reading_handler,
        ws_handler::ws_handler,
    ),
    components(
        schemas(
            auth::CredentialsForm,
            auth::ForgotForm,
            auth::ResetForm,
            auth::AuthResponse,
            auth::MessageResponse,
            books::AddBookForm,
            books::UpdatePagesForm,
            readings::AddReadingForm,
            views::BookView,
            views::ReadingView,
            views::CounterView,
            views::DashboardResponse,
            views::LoginPrompt,
            protocol::LibraryEvent,
        )
    ),
    tags(
        (name = "Reading Tracker API", description = "Track books, log reading sessions, and follow per-book progress.")
    )
)]
pub struct ApiDoc;
