//! In-memory mock implementations for the gateway's ports.
//!
//! These back both the unit tests and the HTTP-level route tests; none of
//! them talk to the network or a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validation::{IdentityAssertion, IdentityProvider},
    infra::rate_limit::RateLimiterTrait,
    use_cases::account::{AccountStore, DeviceKind, DeviceRecord, DeviceStore, SmsSender},
};

// ============================================================================
// StubIdentityProvider
// ============================================================================

/// Identity provider that accepts exactly the tokens it was told to.
#[derive(Default)]
pub struct StubIdentityProvider {
    tokens: Mutex<HashMap<String, IdentityAssertion>>,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, token: &str, subject: &str, email_verified: bool) {
        self.tokens.lock().unwrap().insert(
            token.to_string(),
            IdentityAssertion {
                subject: subject.to_string(),
                email_verified,
            },
        );
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn verify_identity_token(&self, token: &str) -> AppResult<IdentityAssertion> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(AppError::InvalidIdentityToken)
    }
}

// ============================================================================
// InMemoryDeviceStore
// ============================================================================

#[derive(Default)]
pub struct InMemoryDeviceStore {
    devices: Mutex<Vec<(String, DeviceRecord)>>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a device without going through registration.
    pub fn put(&self, subject: &str, device_id: &str, kind: DeviceKind) {
        self.devices.lock().unwrap().push((
            subject.to_string(),
            DeviceRecord {
                id: Uuid::new_v4(),
                device_id: device_id.to_string(),
                kind,
                name: String::new(),
                created_at: Some(Utc::now().naive_utc()),
            },
        ));
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn count_mobile(&self, subject: &str) -> AppResult<i64> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, d)| s == subject && d.kind == DeviceKind::Mobile)
            .count() as i64)
    }

    async fn count_all(&self, subject: &str) -> AppResult<i64> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == subject)
            .count() as i64)
    }

    async fn register(
        &self,
        subject: &str,
        device_id: &str,
        kind: DeviceKind,
        name: &str,
    ) -> AppResult<DeviceRecord> {
        let mut devices = self.devices.lock().unwrap();
        if devices
            .iter()
            .any(|(s, d)| s == subject && d.device_id == device_id)
        {
            return Err(AppError::DeviceExists);
        }
        let record = DeviceRecord {
            id: Uuid::new_v4(),
            device_id: device_id.to_string(),
            kind,
            name: name.to_string(),
            created_at: Some(Utc::now().naive_utc()),
        };
        devices.push((subject.to_string(), record.clone()));
        Ok(record)
    }

    async fn list(&self, subject: &str) -> AppResult<Vec<DeviceRecord>> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == subject)
            .map(|(_, d)| d.clone())
            .collect())
    }
}

// ============================================================================
// InMemoryAccountStore
// ============================================================================

#[derive(Default, Clone)]
struct AccountEntry {
    phone_number: Option<String>,
    phone_verified: bool,
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<String, AccountEntry>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account in a given phone state.
    pub fn put(&self, subject: &str, phone_number: Option<&str>, phone_verified: bool) {
        self.accounts.lock().unwrap().insert(
            subject.to_string(),
            AccountEntry {
                phone_number: phone_number.map(str::to_string),
                phone_verified,
            },
        );
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn ensure(&self, subject: &str) -> AppResult<()> {
        self.accounts
            .lock()
            .unwrap()
            .entry(subject.to_string())
            .or_default();
        Ok(())
    }

    async fn phone_verified(&self, subject: &str) -> AppResult<bool> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(subject)
            .map(|a| a.phone_verified)
            .unwrap_or(false))
    }

    async fn phone_number(&self, subject: &str) -> AppResult<Option<String>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(subject)
            .and_then(|a| a.phone_number.clone()))
    }

    async fn set_phone_number(&self, subject: &str, number: &str) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let entry = accounts.entry(subject.to_string()).or_default();
        entry.phone_number = Some(number.to_string());
        entry.phone_verified = false;
        Ok(())
    }
}

// ============================================================================
// CapturingSmsSender / StubRateLimiter
// ============================================================================

#[derive(Default)]
pub struct CapturingSmsSender {
    sent: Mutex<Vec<String>>,
}

impl CapturingSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recipients of every challenge sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsSender for CapturingSmsSender {
    async fn send_challenge(&self, to: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

/// Rate limiter that never limits - route tests exercise the chains, not the
/// middleware.
pub struct StubRateLimiter;

#[async_trait]
impl RateLimiterTrait for StubRateLimiter {
    async fn check(&self, _ip: &str) -> AppResult<()> {
        Ok(())
    }
}
