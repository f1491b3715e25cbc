//! Request-admission pipeline: ordered checks, first failure wins.
//!
//! A chain runs its checks strictly in sequence and stops at the first
//! failure, reporting only that failure's code; later checks never run, so a
//! rejected caller learns nothing about what would have failed next. Passing
//! checks return an enrichment patch that the executor merges into the
//! per-request context instead of mutating shared state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app_error::{AppError, AppResult};
use crate::application::jwt;
use crate::infra::config::AppConfig;
use crate::use_cases::capability::CapabilityUseCases;

/// Result of verifying a first-factor bearer token with the identity
/// provider.
#[derive(Debug, Clone)]
pub struct IdentityAssertion {
    pub subject: String,
    pub email_verified: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_identity_token(&self, token: &str) -> AppResult<IdentityAssertion>;
}

/// What the transport layer extracted from the incoming request.
#[derive(Debug, Default, Clone)]
pub struct RequestFacts {
    pub authorization: Option<String>,
    pub access_token: Option<String>,
    params: HashMap<&'static str, String>,
}

impl RequestFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization(mut self, value: Option<String>) -> Self {
        self.authorization = value;
        self
    }

    pub fn with_access_token(mut self, value: Option<String>) -> Self {
        self.access_token = value;
        self
    }

    pub fn with_param(mut self, name: &'static str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.params.insert(name, value);
        }
        self
    }

    /// A parameter counts as present only when it is non-blank.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Per-request context accumulated by passing checks.
#[derive(Debug, Default, Clone)]
pub struct AuthContext {
    pub subject: Option<String>,
    pub email_verified: bool,
    pub has_access: bool,
}

impl AuthContext {
    fn merged(mut self, patch: ContextPatch) -> Self {
        if let Some(subject) = patch.subject {
            self.subject = Some(subject);
        }
        if let Some(email_verified) = patch.email_verified {
            self.email_verified = email_verified;
        }
        if let Some(has_access) = patch.has_access {
            self.has_access = has_access;
        }
        self
    }

    /// The subject a subject-producing check wrote earlier in the chain.
    pub fn require_subject(&self) -> AppResult<&str> {
        self.subject
            .as_deref()
            .ok_or_else(|| AppError::Internal("validation chain produced no subject".into()))
    }
}

#[derive(Debug, Default)]
pub struct ContextPatch {
    pub subject: Option<String>,
    pub email_verified: Option<bool>,
    pub has_access: Option<bool>,
}

#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, facts: &RequestFacts, ctx: &AuthContext) -> AppResult<ContextPatch>;
}

#[derive(Default)]
pub struct ValidationChain {
    checks: Vec<Box<dyn Check>>,
}

impl ValidationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub async fn run(&self, facts: &RequestFacts) -> AppResult<AuthContext> {
        let mut ctx = AuthContext::default();
        for check in &self.checks {
            match check.run(facts, &ctx).await {
                Ok(patch) => ctx = ctx.merged(patch),
                Err(err) => {
                    tracing::debug!(check = check.name(), code = %err.code(), "Check failed");
                    return Err(err);
                }
            }
        }
        Ok(ctx)
    }
}

fn bearer_token(facts: &RequestFacts) -> AppResult<&str> {
    let header = facts
        .authorization
        .as_deref()
        .ok_or(AppError::MissingHeader)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingBearer)
}

/// First-factor check: verifies the bearer token with the identity provider
/// and writes the resolved subject into the context.
pub struct IdentityCheck {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityCheck {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Check for IdentityCheck {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn run(&self, facts: &RequestFacts, _ctx: &AuthContext) -> AppResult<ContextPatch> {
        let token = bearer_token(facts)?;
        let assertion = self.provider.verify_identity_token(token).await?;
        Ok(ContextPatch {
            subject: Some(assertion.subject),
            email_verified: Some(assertion.email_verified),
            ..Default::default()
        })
    }
}

/// Like [`IdentityCheck`], for endpoints that require a fully onboarded
/// account: the provider must also report the email as verified.
pub struct EmailVerifiedCheck {
    provider: Arc<dyn IdentityProvider>,
}

impl EmailVerifiedCheck {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Check for EmailVerifiedCheck {
    fn name(&self) -> &'static str {
        "email_verified"
    }

    async fn run(&self, facts: &RequestFacts, _ctx: &AuthContext) -> AppResult<ContextPatch> {
        let token = bearer_token(facts)?;
        let assertion = self.provider.verify_identity_token(token).await?;
        if !assertion.email_verified {
            return Err(AppError::InvalidIdentityToken);
        }
        Ok(ContextPatch {
            subject: Some(assertion.subject),
            email_verified: Some(true),
            ..Default::default()
        })
    }
}

fn verify_access(
    facts: &RequestFacts,
    ctx: &AuthContext,
    config: &AppConfig,
) -> AppResult<ContextPatch> {
    // A subject-producing check must have run earlier in the same chain.
    let subject = ctx
        .subject
        .as_deref()
        .ok_or(AppError::InvalidAccessToken)?;
    let token = facts
        .access_token
        .as_deref()
        .ok_or(AppError::InvalidAccessToken)?;
    jwt::verify(token, subject, &config.jwt_secret)?;
    Ok(ContextPatch {
        has_access: Some(true),
        ..Default::default()
    })
}

/// Session gate: the request must carry a valid access-token cookie for the
/// already-resolved subject.
pub struct AccessTokenCheck {
    config: Arc<AppConfig>,
}

impl AccessTokenCheck {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Check for AccessTokenCheck {
    fn name(&self) -> &'static str {
        "access_token"
    }

    async fn run(&self, facts: &RequestFacts, ctx: &AuthContext) -> AppResult<ContextPatch> {
        verify_access(facts, ctx, &self.config)
    }
}

/// Gate for the phone-number change: only enforced when the request actually
/// changes the number AND the account has a usable second factor. An account
/// with no eligible method must not be locked out of fixing its own number.
pub struct ConditionalSecondFactorCheck {
    capabilities: Arc<CapabilityUseCases>,
    config: Arc<AppConfig>,
}

impl ConditionalSecondFactorCheck {
    pub fn new(capabilities: Arc<CapabilityUseCases>, config: Arc<AppConfig>) -> Self {
        Self {
            capabilities,
            config,
        }
    }
}

#[async_trait]
impl Check for ConditionalSecondFactorCheck {
    fn name(&self) -> &'static str {
        "conditional_second_factor"
    }

    async fn run(&self, facts: &RequestFacts, ctx: &AuthContext) -> AppResult<ContextPatch> {
        if facts.param("phoneNumber").is_none() {
            return Ok(ContextPatch::default());
        }
        let subject = ctx
            .subject
            .as_deref()
            .ok_or(AppError::InvalidAccessToken)?;
        let set = self.capabilities.for_subject(subject).await?;
        if set.is_empty() {
            return Ok(ContextPatch::default());
        }
        verify_access(facts, ctx, &self.config)
    }
}

/// Non-empty parameter check; the failure code carries the field name for
/// client display.
pub struct RequiredField {
    name: &'static str,
}

impl RequiredField {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Check for RequiredField {
    fn name(&self) -> &'static str {
        "required_field"
    }

    async fn run(&self, facts: &RequestFacts, _ctx: &AuthContext) -> AppResult<ContextPatch> {
        if facts.param(self.name).is_none() {
            return Err(AppError::MissingParameter(self.name.to_string()));
        }
        Ok(ContextPatch::default())
    }
}
