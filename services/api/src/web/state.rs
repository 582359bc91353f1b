//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the request-scoped identity.

use crate::config::Config;
use crate::web::events::EventHub;
use reading_tracker_core::ports::{DatabaseService, ResetNotifier};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub notifier: Arc<dyn ResetNotifier>,
    pub events: EventHub,
}

//=========================================================================================
// CurrentUser (Specific to One Request)
//=========================================================================================

/// The authenticated identity of the request being served.
///
/// Inserted into the request extensions by `require_auth`; handlers receive it
/// with `Extension<CurrentUser>` and pass its `user_id` to every port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
}
