pub mod http;

use async_trait::async_trait;

use crate::{app_error::AppResult, use_cases::account::SmsSender};

/// Fallback when no delivery endpoint is configured: the challenge is
/// dropped, loudly.
pub struct NoopSmsSender;

#[async_trait]
impl SmsSender for NoopSmsSender {
    async fn send_challenge(&self, to: &str) -> AppResult<()> {
        tracing::warn!(to, "SMS delivery not configured; challenge dropped");
        Ok(())
    }
}
