use core::{fmt, net::Ipv4Addr};

use super::iface::IfaceIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrSource {
    Manual,
    Dhcp,
}

impl AddrSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Dhcp => "dhcp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Entry {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub source: AddrSource,
}

/// IPv4 configuration of an interface at the moment an event was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Snapshot<'a> {
    pub unicast: &'a [Ipv4Entry],
    pub gateway: Option<Ipv4Addr>,
    /// `None` when the platform does not expose the lease duration.
    pub lease_secs: Option<u32>,
}

impl Ipv4Snapshot<'_> {
    pub fn dhcp_entries(&self) -> impl Iterator<Item = &Ipv4Entry> + '_ {
        self.unicast
            .iter()
            .filter(|entry| entry.source == AddrSource::Dhcp)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetEventKind {
    Ipv4AddrAdded,
    Ipv4AddrRemoved,
    Ipv6AddrAdded,
    LinkUp,
    LinkDown,
}

impl NetEventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ipv4AddrAdded => "ipv4_addr_add",
            Self::Ipv4AddrRemoved => "ipv4_addr_del",
            Self::Ipv6AddrAdded => "ipv6_addr_add",
            Self::LinkUp => "link_up",
            Self::LinkDown => "link_down",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetEvent<'a> {
    Ipv4AddrAdded {
        iface: IfaceIndex,
        ipv4: Ipv4Snapshot<'a>,
    },
    Ipv4AddrRemoved {
        iface: IfaceIndex,
    },
    Ipv6AddrAdded {
        iface: IfaceIndex,
    },
    LinkUp {
        iface: IfaceIndex,
    },
    LinkDown {
        iface: IfaceIndex,
    },
}

impl NetEvent<'_> {
    pub const fn kind(&self) -> NetEventKind {
        match self {
            Self::Ipv4AddrAdded { .. } => NetEventKind::Ipv4AddrAdded,
            Self::Ipv4AddrRemoved { .. } => NetEventKind::Ipv4AddrRemoved,
            Self::Ipv6AddrAdded { .. } => NetEventKind::Ipv6AddrAdded,
            Self::LinkUp { .. } => NetEventKind::LinkUp,
            Self::LinkDown { .. } => NetEventKind::LinkDown,
        }
    }

    pub const fn iface(&self) -> IfaceIndex {
        match *self {
            Self::Ipv4AddrAdded { iface, .. }
            | Self::Ipv4AddrRemoved { iface }
            | Self::Ipv6AddrAdded { iface }
            | Self::LinkUp { iface }
            | Self::LinkDown { iface } => iface,
        }
    }
}

/// Callback invoked from the platform's event-delivery context.
///
/// Implementations must not block.
pub trait NetEventListener: Sync {
    fn on_event(&self, event: &NetEvent<'_>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscribeError {
    Full,
}

impl SubscribeError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "listeners_full",
        }
    }
}

impl fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait NetEventSource<'a> {
    fn subscribe(&self, listener: &'a dyn NetEventListener) -> Result<(), SubscribeError>;
}
