use core::{
    fmt,
    net::Ipv4Addr,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};
use embassy_time::{Duration, Timer};
use log::{info, warn};

use super::{
    events::{NetEvent, NetEventListener, NetEventSource, SubscribeError},
    iface::IfaceIndex,
};

const NOT_ARMED: u8 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaseAcquired {
    pub iface: IfaceIndex,
    pub address: Ipv4Addr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BringUpTimeout {
    pub after: Duration,
}

impl fmt::Display for BringUpTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no lease after {}ms", self.after.as_millis())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePhase {
    Unsubscribed,
    Armed,
    Set,
    Consumed,
}

impl GatePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsubscribed => "unsubscribed",
            Self::Armed => "armed",
            Self::Set => "set",
            Self::Consumed => "consumed",
        }
    }
}

/// Single-permit rendezvous between the bring-up task and the event context.
///
/// The listener side hands the first DHCP lease on the tracked interface over
/// a one-slot channel; the permit is issued at most once per gate and never
/// re-armed. A second `wait` after consumption therefore blocks until its
/// deadline, or forever without one.
pub struct ReadinessGate<M: RawMutex> {
    tracked: AtomicU8,
    fired: AtomicBool,
    consumed: AtomicBool,
    permit: Channel<M, LeaseAcquired, 1>,
}

impl<M: RawMutex> ReadinessGate<M> {
    pub const fn new() -> Self {
        Self {
            tracked: AtomicU8::new(NOT_ARMED),
            fired: AtomicBool::new(false),
            consumed: AtomicBool::new(false),
            permit: Channel::new(),
        }
    }

    pub fn phase(&self) -> GatePhase {
        if self.tracked.load(Ordering::Acquire) == NOT_ARMED {
            GatePhase::Unsubscribed
        } else if self.consumed.load(Ordering::Acquire) {
            GatePhase::Consumed
        } else if self.fired.load(Ordering::Acquire) {
            GatePhase::Set
        } else {
            GatePhase::Armed
        }
    }

    pub fn tracked_iface(&self) -> Option<IfaceIndex> {
        match self.tracked.load(Ordering::Acquire) {
            NOT_ARMED => None,
            index => Some(IfaceIndex(index)),
        }
    }

    /// Blocks until the permit is set. `None` waits indefinitely.
    pub async fn wait(&self, deadline: Option<Duration>) -> Result<LeaseAcquired, BringUpTimeout> {
        let lease = match deadline {
            None => self.permit.receive().await,
            Some(after) => match select(self.permit.receive(), Timer::after(after)).await {
                Either::First(lease) => lease,
                Either::Second(()) => {
                    warn!(
                        "netup: no lease within {}ms phase={}",
                        after.as_millis(),
                        self.phase().as_str()
                    );
                    return Err(BringUpTimeout { after });
                }
            },
        };
        self.consumed.store(true, Ordering::Release);
        Ok(lease)
    }
}

impl<M: RawMutex + Sync> ReadinessGate<M> {
    /// Starts tracking `iface` and registers the gate with `events`.
    ///
    /// Interface indices are 1-based; index 0 never matches.
    pub fn arm<'a, E>(&'a self, events: &E, iface: IfaceIndex) -> Result<(), SubscribeError>
    where
        E: NetEventSource<'a> + ?Sized,
    {
        self.tracked.store(iface.0, Ordering::Release);
        events.subscribe(self)
    }
}

impl<M: RawMutex> Default for ReadinessGate<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex + Sync> NetEventListener for ReadinessGate<M> {
    fn on_event(&self, event: &NetEvent<'_>) {
        let NetEvent::Ipv4AddrAdded { iface, ipv4 } = *event else {
            return;
        };
        let tracked = self.tracked.load(Ordering::Acquire);
        if tracked == NOT_ARMED || iface.0 != tracked {
            return;
        }

        let mut leased = None;
        for (slot, entry) in ipv4.dhcp_entries().enumerate() {
            info!(
                "netup: iface={} {}[{}]={} subnet={} router={} lease={}",
                iface,
                entry.source.as_str(),
                slot,
                entry.address,
                entry.netmask,
                OrNone(ipv4.gateway),
                LeaseSecs(ipv4.lease_secs)
            );
            leased.get_or_insert(entry.address);
        }

        let Some(address) = leased else {
            return;
        };
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.permit.try_send(LeaseAcquired { iface, address }).is_err() {
            warn!("netup: readiness permit already pending iface={}", iface);
        }
    }
}

struct OrNone(Option<Ipv4Addr>);

impl fmt::Display for OrNone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{}", addr),
            None => f.write_str("none"),
        }
    }
}

struct LeaseSecs(Option<u32>);

impl fmt::Display for LeaseSecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(secs) => write!(f, "{}s", secs),
            None => f.write_str("unknown"),
        }
    }
}
