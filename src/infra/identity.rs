//! Client for the external identity provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_error::{AppError, AppResult};
use crate::application::validation::{IdentityAssertion, IdentityProvider};
use crate::infra::http_client::build_client;

pub struct HttpIdentityProvider {
    client: Client,
    verify_url: Url,
}

impl HttpIdentityProvider {
    pub fn new(verify_url: Url) -> Self {
        Self {
            client: build_client(),
            verify_url,
        }
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    subject: String,
    #[serde(rename = "emailVerified")]
    email_verified: bool,
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_identity_token(&self, token: &str) -> AppResult<IdentityAssertion> {
        // A timeout or transport failure is the check's normal failure, not
        // a distinct code; the detail stays in the logs.
        let response = self
            .client
            .post(self.verify_url.clone())
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity provider unreachable");
                AppError::InvalidIdentityToken
            })?;

        if !response.status().is_success() {
            return Err(AppError::InvalidIdentityToken);
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity provider returned an unreadable body");
                AppError::InvalidIdentityToken
            })?;

        Ok(IdentityAssertion {
            subject: body.subject,
            email_verified: body.email_verified,
        })
    }
}
