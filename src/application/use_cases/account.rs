//! Account and device plumbing around the capability resolver.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::use_cases::capability::CapabilityUseCases;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: Uuid,
    pub device_id: String,
    pub kind: DeviceKind,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn count_mobile(&self, subject: &str) -> AppResult<i64>;
    async fn count_all(&self, subject: &str) -> AppResult<i64>;
    /// Fails with `DeviceExists` when `(subject, device_id)` is taken.
    async fn register(
        &self,
        subject: &str,
        device_id: &str,
        kind: DeviceKind,
        name: &str,
    ) -> AppResult<DeviceRecord>;
    async fn list(&self, subject: &str) -> AppResult<Vec<DeviceRecord>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create the account row on first login; later calls are no-ops.
    async fn ensure(&self, subject: &str) -> AppResult<()>;
    async fn phone_verified(&self, subject: &str) -> AppResult<bool>;
    async fn phone_number(&self, subject: &str) -> AppResult<Option<String>>;
    /// Stores the number and clears the verified flag; re-verification runs
    /// through the external delivery service.
    async fn set_phone_number(&self, subject: &str, number: &str) -> AppResult<()>;
}

/// Delivery of SMS second-factor challenges. The external service owns code
/// generation and checking; this side only triggers a send.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_challenge(&self, to: &str) -> AppResult<()>;
}

pub struct AccountUseCases {
    accounts: Arc<dyn AccountStore>,
    devices: Arc<dyn DeviceStore>,
    capabilities: Arc<CapabilityUseCases>,
    sms: Arc<dyn SmsSender>,
}

impl AccountUseCases {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        devices: Arc<dyn DeviceStore>,
        capabilities: Arc<CapabilityUseCases>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        Self {
            accounts,
            devices,
            capabilities,
            sms,
        }
    }

    #[instrument(skip(self))]
    pub async fn login(&self, subject: &str) -> AppResult<()> {
        self.accounts.ensure(subject).await
    }

    #[instrument(skip(self))]
    pub async fn register_device(
        &self,
        subject: &str,
        device_id: &str,
        kind_raw: &str,
        name: &str,
    ) -> AppResult<DeviceRecord> {
        // An unknown kind is a client-side parameter problem, same bucket as
        // an absent one.
        let kind = DeviceKind::from_str(kind_raw)
            .map_err(|_| AppError::MissingParameter("kind".into()))?;
        self.devices.register(subject, device_id, kind, name).await
    }

    pub async fn list_devices(&self, subject: &str) -> AppResult<Vec<DeviceRecord>> {
        self.devices.list(subject).await
    }

    #[instrument(skip(self, number))]
    pub async fn change_phone(&self, subject: &str, number: &str) -> AppResult<()> {
        self.accounts.set_phone_number(subject, number).await
    }

    /// Dispatch an SMS second-factor challenge through the external delivery
    /// service.
    #[instrument(skip(self))]
    pub async fn start_sms_challenge(&self, subject: &str) -> AppResult<()> {
        let set = self.capabilities.for_subject(subject).await?;
        if !set.sms {
            return Err(AppError::PhoneNumberNotVerified);
        }
        let number = self
            .accounts
            .phone_number(subject)
            .await?
            .ok_or(AppError::PhoneNumberNotVerified)?;
        self.sms.send_challenge(&number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mocks::{
        CapturingSmsSender, InMemoryAccountStore, InMemoryDeviceStore,
    };

    fn use_cases() -> (
        AccountUseCases,
        Arc<InMemoryAccountStore>,
        Arc<InMemoryDeviceStore>,
        Arc<CapturingSmsSender>,
    ) {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let devices = Arc::new(InMemoryDeviceStore::new());
        let sms = Arc::new(CapturingSmsSender::new());
        let capabilities = Arc::new(CapabilityUseCases::new(
            devices.clone(),
            accounts.clone(),
        ));
        (
            AccountUseCases::new(accounts.clone(), devices.clone(), capabilities, sms.clone()),
            accounts,
            devices,
            sms,
        )
    }

    #[tokio::test]
    async fn register_device_rejects_unknown_kind() {
        let (use_cases, _, _, _) = use_cases();
        let err = use_cases
            .register_device("u1", "dev-1", "toaster", "Kitchen")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "MissingParameter:kind");
    }

    #[tokio::test]
    async fn register_device_twice_reports_device_exists() {
        let (use_cases, _, _, _) = use_cases();
        use_cases
            .register_device("u1", "dev-1", "mobile", "Phone")
            .await
            .unwrap();
        let err = use_cases
            .register_device("u1", "dev-1", "mobile", "Phone")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DeviceExists));
    }

    #[tokio::test]
    async fn sms_challenge_requires_verified_phone() {
        let (use_cases, accounts, _, sms) = use_cases();
        accounts.put("u1", Some("+4915112345678"), false);

        let err = use_cases.start_sms_challenge("u1").await.unwrap_err();
        assert!(matches!(err, AppError::PhoneNumberNotVerified));
        assert!(sms.sent().is_empty());

        accounts.put("u1", Some("+4915112345678"), true);
        use_cases.start_sms_challenge("u1").await.unwrap();
        assert_eq!(sms.sent(), vec!["+4915112345678".to_string()]);
    }

    #[tokio::test]
    async fn changing_phone_clears_verification() {
        let (use_cases, accounts, _, _) = use_cases();
        accounts.put("u1", Some("+111"), true);
        use_cases.change_phone("u1", "+222").await.unwrap();
        assert_eq!(accounts.phone_number("u1").await.unwrap().as_deref(), Some("+222"));
        assert!(!accounts.phone_verified("u1").await.unwrap());
    }
}
