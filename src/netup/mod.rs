//! Network bring-up and device identity.
//!
//! The sequence derives a link address from the chip id, installs it while the
//! interface is administratively down, starts lease acquisition (or joins the
//! configured wireless network) and parks on a [`ReadinessGate`] until the
//! platform reports a DHCP-assigned IPv4 address.

pub mod controller;
pub mod establish;
pub mod events;
pub mod gate;
pub mod identity;
pub mod iface;
pub mod wireless;

pub use controller::{apply_identity, StateError};
pub use establish::{bring_up, BringUpError, BringUpReport, IdentityFailure, IdentityOutcome};
pub use events::{
    AddrSource, Ipv4Entry, Ipv4Snapshot, NetEvent, NetEventKind, NetEventListener,
    NetEventSource, SubscribeError,
};
pub use gate::{BringUpTimeout, GatePhase, LeaseAcquired, ReadinessGate};
pub use identity::{
    crc32_ieee, derive_link_address, read_hardware_id, HardwareId, HardwareIdSource,
    HardwareReadError, MacAddress, HARDWARE_ID_LEN, VENDOR_PREFIX,
};
pub use iface::{AdminState, IfaceError, IfaceIndex, NetInterface};
pub use wireless::{join_with_retry, JoinOutcome, JoinParams, JoinPolicy, SecurityMode};
