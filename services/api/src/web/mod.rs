pub mod auth;
pub mod books;
pub mod dashboard;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod protocol;
pub mod readings;
pub mod rest;
pub mod router;
pub mod state;
pub mod views;
pub mod ws_handler;

// Re-export the entry points the binary needs to build the web server.
pub use events::EventHub;
pub use middleware::require_auth;
pub use router::build_router;
pub use ws_handler::ws_handler;
