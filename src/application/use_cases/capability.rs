//! Second-factor method resolution from an account's device population.

use std::sync::Arc;

use serde::Serialize;

use crate::app_error::AppResult;
use crate::use_cases::account::{AccountStore, DeviceStore};

/// The set of second-factor methods an account may use right now.
///
/// Purely derived from `(phone_verified, mobile_count, desktop_count)`; it has
/// no identity of its own and is recomputed on every request, because the
/// device population can change at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    pub sms: bool,
    pub qr: bool,
    pub ssid: bool,
    pub geolocation: bool,
    pub smart: bool,
}

impl CapabilitySet {
    /// Deterministic, no hidden state.
    ///
    /// Geolocation needs only a registered mobile device: the phone reports
    /// the location, a desktop plays no part in it.
    pub fn resolve(phone_verified: bool, mobile_count: i64, desktop_count: i64) -> Self {
        let qr = mobile_count > 0;
        let ssid = desktop_count > 0 && mobile_count > 0;
        Self {
            sms: phone_verified,
            qr,
            ssid,
            geolocation: mobile_count > 0,
            smart: ssid,
        }
    }

    /// An account with no eligible second factor. Not an error: callers
    /// decide whether to require a second factor at all.
    pub fn is_empty(&self) -> bool {
        !(self.sms || self.qr || self.ssid || self.geolocation)
    }
}

pub struct CapabilityUseCases {
    devices: Arc<dyn DeviceStore>,
    accounts: Arc<dyn AccountStore>,
}

impl CapabilityUseCases {
    pub fn new(devices: Arc<dyn DeviceStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { devices, accounts }
    }

    pub async fn for_subject(&self, subject: &str) -> AppResult<CapabilitySet> {
        let phone_verified = self.accounts.phone_verified(subject).await?;
        let mobile = self.devices.count_mobile(subject).await?;
        let all = self.devices.count_all(subject).await?;
        Ok(CapabilitySet::resolve(
            phone_verified,
            mobile,
            (all - mobile).max(0),
        ))
    }
}
