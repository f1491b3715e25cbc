use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    infra::http_client::build_client,
    use_cases::account::SmsSender,
};

/// Challenge delivery through the external SMS verification service. The
/// service generates and checks the codes; this side only triggers sends.
#[derive(Clone)]
pub struct HttpSmsSender {
    client: Client,
    api_url: Url,
    api_key: secrecy::SecretString,
    from: String,
}

impl HttpSmsSender {
    pub fn new(api_url: Url, api_key: secrecy::SecretString, from: String) -> Self {
        Self {
            client: build_client(),
            api_url,
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct ChallengeRequest<'a> {
    to: &'a str,
    from: &'a str,
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send_challenge(&self, to: &str) -> AppResult<()> {
        let body = ChallengeRequest {
            to,
            from: &self.from,
        };
        self.client
            .post(self.api_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}
