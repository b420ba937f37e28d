/// Outbound mail collaborator
///
/// The auth flows only ever need one message: the password reset link. Real
/// delivery belongs to an external service behind this trait; the in-repo
/// implementation writes the dispatch to the log, which keeps development
/// and tests self-contained. The trait is injected through application
/// state, never reached through a global.

use async_trait::async_trait;
use tracing::info;

/// Error type for mail dispatch
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// The provider rejected or failed the dispatch
    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Mail dispatch collaborator
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the password reset message carrying the raw reset token
    ///
    /// Callers must not surface a failure here to the client: the
    /// forgot-password response stays identical whether or not anything
    /// was sent.
    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), EmailError>;
}

/// Log-only mailer
///
/// Stands in for a real provider; the reset link lands in the server log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), EmailError> {
        info!(email = %email, "Password reset requested; token: {}", token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        let result = mailer
            .send_password_reset("user@example.com", "raw-token")
            .await;
        assert!(result.is_ok());
    }
}
