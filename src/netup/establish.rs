use core::{fmt, net::Ipv4Addr};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

use crate::config::BringUpConfig;

use super::{
    controller::{apply_identity, StateError},
    events::NetEventSource,
    gate::{BringUpTimeout, LeaseAcquired, ReadinessGate},
    identity::{read_hardware_id, HardwareIdSource, HardwareReadError, MacAddress},
    iface::{IfaceError, NetInterface},
    wireless::{join_with_retry, JoinOutcome},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityFailure {
    HardwareRead(HardwareReadError),
    State(StateError),
}

impl IdentityFailure {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HardwareRead(err) => err.as_str(),
            Self::State(err) => err.as_str(),
        }
    }
}

impl fmt::Display for IdentityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareRead(err) => write!(f, "{}", err),
            Self::State(err) => write!(f, "{}", err),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityOutcome {
    Derived(MacAddress),
    /// The interface kept whatever address it had before bring-up.
    Fallback(IdentityFailure),
}

impl IdentityOutcome {
    pub const fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BringUpError {
    Timeout(BringUpTimeout),
}

impl BringUpError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout(_) => "bringup_timeout",
        }
    }
}

impl fmt::Display for BringUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(timeout) => write!(f, "{}: {}", self.as_str(), timeout),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BringUpReport {
    pub identity: IdentityOutcome,
    pub join: Option<JoinOutcome>,
    pub dhcp: Result<(), IfaceError>,
    pub lease: LeaseAcquired,
    pub link_address: MacAddress,
    pub ipv4: Option<Ipv4Addr>,
}

/// Runs the whole bring-up sequence and parks until the interface has a
/// DHCP lease.
///
/// Only the final wait can fail, and only when `config.deadline` is set;
/// every earlier step degrades and continues.
pub async fn bring_up<'a, I, H, E, M, D>(
    iface: &mut I,
    hw: &mut H,
    events: &E,
    gate: &'a ReadinessGate<M>,
    config: &BringUpConfig<'_>,
    delay: &mut D,
) -> Result<BringUpReport, BringUpError>
where
    I: NetInterface,
    H: HardwareIdSource,
    E: NetEventSource<'a> + ?Sized,
    M: RawMutex + Sync,
    D: DelayNs,
{
    info!(
        "netup: using iface={} index={} mac={}",
        iface.name(),
        iface.index(),
        iface.link_address()
    );

    // Subscribe before anything can trigger a lease.
    if let Err(err) = gate.arm(events, iface.index()) {
        warn!("netup: event subscription failed err={}", err);
    }

    let identity = match install_identity(iface, hw) {
        Ok(mac) => IdentityOutcome::Derived(mac),
        Err(failure) => {
            warn!(
                "netup: chip id identity failed step={} err={}, keeping mac={}",
                failure.as_str(),
                failure,
                iface.link_address()
            );
            IdentityOutcome::Fallback(failure)
        }
    };

    let join = match config.wireless {
        Some(params) => {
            let outcome = join_with_retry(iface, &params, config.join_policy, delay).await;
            info!(
                "netup: join result={} attempts={}, requesting lease",
                outcome.as_str(),
                outcome.attempts()
            );
            Some(outcome)
        }
        None => None,
    };

    let dhcp = match iface.start_dhcp() {
        Ok(()) => {
            info!("netup: iface={} dhcp started", iface.index());
            Ok(())
        }
        Err(IfaceError::AlreadyInState) => {
            info!("netup: iface={} dhcp already running", iface.index());
            Ok(())
        }
        Err(err) => {
            warn!("netup: iface={} dhcp start failed err={}", iface.index(), err);
            Err(err)
        }
    };

    info!("netup: waiting for network up...");
    let lease = gate.wait(config.deadline).await.map_err(BringUpError::Timeout)?;

    let link_address = iface.link_address();
    let ipv4 = iface.ipv4_address();
    info!(
        "netup: network up iface={} address={} mac={}",
        lease.iface, lease.address, link_address
    );

    Ok(BringUpReport {
        identity,
        join,
        dhcp,
        lease,
        link_address,
        ipv4,
    })
}

fn install_identity<I, H>(iface: &mut I, hw: &mut H) -> Result<MacAddress, IdentityFailure>
where
    I: NetInterface,
    H: HardwareIdSource,
{
    let hw_id = read_hardware_id(hw).map_err(IdentityFailure::HardwareRead)?;
    let mac = hw_id.derive_link_address();
    info!("netup: derived mac={}", mac);
    apply_identity(iface, mac).map_err(IdentityFailure::State)?;
    Ok(mac)
}
