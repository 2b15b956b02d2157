use core::fmt;

use log::{error, info};

use super::{
    identity::MacAddress,
    iface::{IfaceError, NetInterface},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateError {
    DownTransition(IfaceError),
    AddressAssign(IfaceError),
    UpTransition(IfaceError),
}

impl StateError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DownTransition(_) => "down_transition",
            Self::AddressAssign(_) => "address_assign",
            Self::UpTransition(_) => "up_transition",
        }
    }

    pub const fn cause(self) -> IfaceError {
        match self {
            Self::DownTransition(err) | Self::AddressAssign(err) | Self::UpTransition(err) => err,
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} err={}", self.as_str(), self.cause())
    }
}

/// Installs `address` on `iface`: down, assign, up.
///
/// The stack only accepts a new link address while the interface is
/// administratively down, so this has to finish before a lease is requested.
/// A failed assignment still brings the interface back up: a reachable device
/// with its old address beats an unreachable one.
pub fn apply_identity<I: NetInterface>(iface: &mut I, address: MacAddress) -> Result<(), StateError> {
    match iface.admin_down() {
        Ok(()) => info!(
            "netup: iface={} admin={}",
            iface.index(),
            iface.admin_state().as_str()
        ),
        Err(IfaceError::AlreadyInState) => info!(
            "netup: iface={} admin={} (already)",
            iface.index(),
            iface.admin_state().as_str()
        ),
        Err(err) => {
            error!(
                "netup: iface={} bring down failed err={}",
                iface.index(),
                err
            );
            return Err(StateError::DownTransition(err));
        }
    }

    if let Err(err) = iface.set_link_address(address) {
        error!(
            "netup: iface={} set mac={} failed err={}",
            iface.index(),
            address,
            err
        );
        if let Err(up_err) = iface.admin_up() {
            error!(
                "netup: iface={} recovery bring up failed err={}",
                iface.index(),
                up_err
            );
        }
        return Err(StateError::AddressAssign(err));
    }
    info!("netup: iface={} mac={}", iface.index(), address);

    if let Err(err) = iface.admin_up() {
        error!("netup: iface={} bring up failed err={}", iface.index(), err);
        return Err(StateError::UpTransition(err));
    }
    info!(
        "netup: iface={} admin={}",
        iface.index(),
        iface.admin_state().as_str()
    );
    Ok(())
}
