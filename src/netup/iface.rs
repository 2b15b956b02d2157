use core::{fmt, net::Ipv4Addr};

use super::{identity::MacAddress, wireless::JoinParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IfaceIndex(pub u8);

impl fmt::Display for IfaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminState {
    Down,
    Up,
}

impl AdminState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
        }
    }
}

/// Status reported by the link layer for a single control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfaceError {
    AlreadyInState,
    NotSupported,
    Busy,
    NotReady,
    Platform(i32),
}

impl IfaceError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyInState => "already",
            Self::NotSupported => "not_supported",
            Self::Busy => "busy",
            Self::NotReady => "not_ready",
            Self::Platform(_) => "platform",
        }
    }

    /// Errno-style code for log lines.
    pub const fn code(self) -> i32 {
        match self {
            Self::AlreadyInState => -120,
            Self::NotSupported => -134,
            Self::Busy => -16,
            Self::NotReady => -19,
            Self::Platform(code) => code,
        }
    }
}

impl fmt::Display for IfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// Narrow control surface over a platform network interface.
///
/// Every call is a single request/response; none of them may suspend.
/// `request_join` is the exception and only exists on wireless links.
#[allow(async_fn_in_trait)]
pub trait NetInterface {
    fn index(&self) -> IfaceIndex;

    fn name(&self) -> &str;

    fn admin_state(&self) -> AdminState;

    /// `Err(IfaceError::AlreadyInState)` when the interface is already down.
    fn admin_down(&mut self) -> Result<(), IfaceError>;

    fn admin_up(&mut self) -> Result<(), IfaceError>;

    /// Only accepted while administratively down.
    fn set_link_address(&mut self, address: MacAddress) -> Result<(), IfaceError>;

    fn link_address(&self) -> MacAddress;

    fn start_dhcp(&mut self) -> Result<(), IfaceError>;

    fn ipv4_address(&self) -> Option<Ipv4Addr>;

    async fn request_join(&mut self, _params: &JoinParams<'_>) -> Result<(), IfaceError> {
        Err(IfaceError::NotSupported)
    }
}
