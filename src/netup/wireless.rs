use core::fmt;

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use crate::config::{JOIN_MAX_ATTEMPTS, JOIN_RETRY_DELAY_MS};

use super::iface::{IfaceError, NetInterface};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityMode {
    None,
    Psk,
    PskSha256,
    Sae,
}

impl SecurityMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Psk => "psk",
            Self::PskSha256 => "psk-sha256",
            Self::Sae => "sae",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" | "open" => Some(Self::None),
            "psk" | "wpa2" => Some(Self::Psk),
            "psk-sha256" => Some(Self::PskSha256),
            "sae" | "wpa3" => Some(Self::Sae),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct JoinParams<'a> {
    pub ssid: &'a str,
    pub psk: &'a str,
    pub security: SecurityMode,
    /// `None` scans every channel.
    pub channel: Option<u8>,
}

impl fmt::Debug for JoinParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinParams")
            .field("ssid", &self.ssid)
            .field("psk_len", &self.psk.len())
            .field("security", &self.security)
            .field("channel", &self.channel)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinPolicy {
    pub max_attempts: u8,
    pub retry_delay: Duration,
}

impl JoinPolicy {
    pub const fn defaults() -> Self {
        Self {
            max_attempts: JOIN_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(JOIN_RETRY_DELAY_MS),
        }
    }
}

impl Default for JoinPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { attempts: u8 },
    Exhausted { attempts: u8, last: IfaceError },
}

impl JoinOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::Exhausted { .. } => "exhausted",
        }
    }

    pub const fn attempts(self) -> u8 {
        match self {
            Self::Joined { attempts } | Self::Exhausted { attempts, .. } => attempts,
        }
    }
}

/// Issues join requests until one is accepted or the policy runs out.
///
/// Never fatal: an exhausted budget is reported and the caller moves on to
/// lease acquisition, the platform may still associate later.
pub async fn join_with_retry<I, D>(
    iface: &mut I,
    params: &JoinParams<'_>,
    policy: JoinPolicy,
    delay: &mut D,
) -> JoinOutcome
where
    I: NetInterface,
    D: DelayNs,
{
    let max_attempts = policy.max_attempts.max(1);
    let delay_ms = policy.retry_delay.as_millis().min(u32::MAX as u64) as u32;

    info!(
        "netup: joining ssid={} security={}",
        params.ssid,
        params.security.as_str()
    );

    let mut attempt = 0u8;
    loop {
        attempt += 1;
        match iface.request_join(params).await {
            Ok(()) => {
                info!("netup: join accepted attempt={}", attempt);
                return JoinOutcome::Joined { attempts: attempt };
            }
            Err(err) if attempt >= max_attempts => {
                error!(
                    "netup: join gave up after attempts={} err={}",
                    attempt, err
                );
                return JoinOutcome::Exhausted {
                    attempts: attempt,
                    last: err,
                };
            }
            Err(err) => {
                warn!(
                    "netup: join request failed attempt={}/{} err={}, retry in {}ms",
                    attempt, max_attempts, err, delay_ms
                );
                delay.delay_ms(delay_ms).await;
            }
        }
    }
}
