//! services/api/src/web/router.rs
//!
//! Assembles the HTTP router from the handlers.

use axum::{
    http::{header::{ACCEPT, CONTENT_TYPE}, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{forgot_handler, login_handler, logout_handler, register_handler, reset_handler},
    books::{add_book_handler, delete_book_handler, update_pages_handler},
    dashboard::{health_handler, index_handler},
    middleware::require_auth,
    readings::{add_reading_handler, delete_reading_handler},
    rest::ApiDoc,
    state::AppState,
    ws_handler,
};

/// Builds the complete application: API routes, auth layer, CORS, and Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/forgot", post(forgot_handler))
        .route("/reset", post(reset_handler))
        .route("/logout", get(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/add_book", post(add_book_handler))
        .route("/delete_book/{id}", post(delete_book_handler))
        .route("/update_pages/{id}", post(update_pages_handler))
        .route("/add_reading", post(add_reading_handler))
        .route("/delete_reading/{id}", post(delete_reading_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
