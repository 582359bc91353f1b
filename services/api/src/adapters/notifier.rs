//! services/api/src/adapters/notifier.rs
//!
//! Delivery of password-reset tokens. There is no mail transport in this
//! service, so the default adapter writes the reset link to the log where an
//! operator can pick it up.

use async_trait::async_trait;
use reading_tracker_core::domain::PasswordResetToken;
use reading_tracker_core::ports::{PortResult, ResetNotifier};
use tracing::info;

/// A `ResetNotifier` that logs the reset link instead of sending it.
#[derive(Clone, Default)]
pub struct LogResetNotifier;

#[async_trait]
impl ResetNotifier for LogResetNotifier {
    async fn send_reset_token(&self, username: &str, token: &PasswordResetToken) -> PortResult<()> {
        info!(
            username,
            expires_at = %token.expires_at,
            "Password reset requested; submit token {} to POST /reset",
            token.token
        );
        Ok(())
    }
}
