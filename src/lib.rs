#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod netup;
pub mod ota;

pub use netup::{
    bring_up, BringUpError, BringUpReport, IdentityOutcome, MacAddress, NetInterface,
    ReadinessGate,
};
