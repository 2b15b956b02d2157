use embassy_time::Duration;
use log::LevelFilter;

use crate::netup::{JoinParams, JoinPolicy, SecurityMode};

// Join request budget: 20 tries, 500ms apart, gives the radio ~10s to come
// online before lease acquisition is attempted anyway.
pub const JOIN_MAX_ATTEMPTS: u8 = 20;
pub const JOIN_RETRY_DELAY_MS: u64 = 500;

pub const DEFAULT_DEVICE_TYPE: &str = "esp32-w5500";
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Static inputs of one bring-up sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BringUpConfig<'a> {
    pub wireless: Option<JoinParams<'a>>,
    pub join_policy: JoinPolicy,
    /// `None` keeps the boot blocked until a lease arrives.
    pub deadline: Option<Duration>,
}

impl<'a> BringUpConfig<'a> {
    pub const fn wired() -> Self {
        Self {
            wireless: None,
            join_policy: JoinPolicy::defaults(),
            deadline: None,
        }
    }

    pub const fn wireless_join(params: JoinParams<'a>) -> Self {
        Self {
            wireless: Some(params),
            join_policy: JoinPolicy::defaults(),
            deadline: None,
        }
    }

    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub const fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = policy;
        self
    }
}

impl BringUpConfig<'static> {
    /// Configuration baked in at build time.
    pub fn from_env() -> Self {
        Self {
            wireless: wireless_params(),
            join_policy: JoinPolicy::defaults(),
            deadline: bringup_deadline(),
        }
    }
}

pub fn wireless_params() -> Option<JoinParams<'static>> {
    params_from_parts(
        option_env!("NETUP_WIFI_SSID").or(option_env!("SSID")),
        option_env!("NETUP_WIFI_PSK").or(option_env!("PASSWORD")),
        option_env!("NETUP_WIFI_SECURITY"),
    )
}

pub fn bringup_deadline() -> Option<Duration> {
    parse_deadline(option_env!("NETUP_BRINGUP_TIMEOUT_MS"))
}

pub fn device_type() -> &'static str {
    option_env!("MENDER_DEVICE_TYPE").unwrap_or(DEFAULT_DEVICE_TYPE)
}

fn params_from_parts<'a>(
    ssid: Option<&'a str>,
    psk: Option<&'a str>,
    security: Option<&str>,
) -> Option<JoinParams<'a>> {
    let ssid = ssid.filter(|ssid| !ssid.is_empty())?;
    let psk = psk.unwrap_or("");
    let security = match security.and_then(SecurityMode::parse) {
        Some(mode) => mode,
        None if psk.is_empty() => SecurityMode::None,
        None => SecurityMode::Psk,
    };
    Some(JoinParams {
        ssid,
        psk,
        security,
        channel: None,
    })
}

fn parse_deadline(raw: Option<&str>) -> Option<Duration> {
    match raw?.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}
