use core::{net::Ipv4Addr, pin::pin, task::Poll};
use std::{thread, time::Duration as StdDuration};

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;

use super::mock::{dhcp_entry, emit_ipv4, poll_once, MockEvents, LEASE_ADDR, NETMASK};
use crate::netup::{
    AddrSource, BringUpTimeout, GatePhase, IfaceIndex, Ipv4Entry, Ipv4Snapshot, LeaseAcquired,
    NetEvent, NetEventListener, ReadinessGate, SubscribeError,
};

type Gate = ReadinessGate<CriticalSectionRawMutex>;

const TRACKED: IfaceIndex = IfaceIndex(1);

#[test]
fn only_dhcp_ipv4_on_tracked_interface_releases() {
    let gate = Gate::new();
    let events = MockEvents::new();
    assert_eq!(gate.phase(), GatePhase::Unsubscribed);

    gate.arm(&events, TRACKED).expect("arm");
    assert_eq!(gate.phase(), GatePhase::Armed);
    assert_eq!(gate.tracked_iface(), Some(TRACKED));

    let mut wait = pin!(gate.wait(None));
    assert!(poll_once(wait.as_mut()).is_pending());

    events.emit(&NetEvent::Ipv6AddrAdded { iface: TRACKED });
    events.emit(&NetEvent::LinkUp { iface: TRACKED });
    assert!(poll_once(wait.as_mut()).is_pending());

    emit_ipv4(&events, IfaceIndex(2), &[dhcp_entry(Ipv4Addr::new(10, 0, 0, 9))]);
    assert!(poll_once(wait.as_mut()).is_pending());

    let manual = Ipv4Entry {
        address: Ipv4Addr::new(192, 168, 1, 77),
        netmask: NETMASK,
        source: AddrSource::Manual,
    };
    emit_ipv4(&events, TRACKED, &[manual]);
    assert!(poll_once(wait.as_mut()).is_pending());
    assert_eq!(gate.phase(), GatePhase::Armed);

    emit_ipv4(&events, TRACKED, &[manual, dhcp_entry(LEASE_ADDR)]);
    assert_eq!(gate.phase(), GatePhase::Set);
    assert_eq!(
        poll_once(wait.as_mut()),
        Poll::Ready(Ok(LeaseAcquired {
            iface: TRACKED,
            address: LEASE_ADDR,
        }))
    );
    assert_eq!(gate.phase(), GatePhase::Consumed);
}

#[test]
fn events_before_arming_are_ignored() {
    let gate = Gate::new();
    gate.on_event(&NetEvent::Ipv4AddrAdded {
        iface: TRACKED,
        ipv4: Ipv4Snapshot {
            unicast: &[dhcp_entry(LEASE_ADDR)],
            gateway: None,
            lease_secs: None,
        },
    });
    assert_eq!(gate.phase(), GatePhase::Unsubscribed);

    let events = MockEvents::new();
    gate.arm(&events, TRACKED).expect("arm");
    let result = block_on(gate.wait(Some(Duration::from_millis(20))));
    assert!(result.is_err());
}

#[test]
fn permit_is_issued_once() {
    let gate = Gate::new();
    let events = MockEvents::new();
    gate.arm(&events, TRACKED).expect("arm");

    emit_ipv4(&events, TRACKED, &[dhcp_entry(LEASE_ADDR)]);
    emit_ipv4(&events, TRACKED, &[dhcp_entry(Ipv4Addr::new(192, 168, 1, 51))]);

    let first = block_on(gate.wait(Some(Duration::from_secs(1)))).expect("first lease");
    assert_eq!(first.address, LEASE_ADDR);

    emit_ipv4(&events, TRACKED, &[dhcp_entry(Ipv4Addr::new(192, 168, 1, 52))]);
    let after = Duration::from_millis(30);
    assert_eq!(
        block_on(gate.wait(Some(after))),
        Err(BringUpTimeout { after })
    );
}

#[test]
fn deadline_expires_without_lease() {
    let gate = Gate::new();
    let events = MockEvents::new();
    gate.arm(&events, TRACKED).expect("arm");
    events.emit(&NetEvent::Ipv6AddrAdded { iface: TRACKED });

    let after = Duration::from_millis(25);
    let err = block_on(gate.wait(Some(after))).unwrap_err();
    assert_eq!(err.after, after);
    assert_eq!(gate.phase(), GatePhase::Armed);
}

#[test]
fn lease_signalled_from_another_thread_wakes_waiter() {
    let gate = Gate::new();
    let events = MockEvents::new();
    gate.arm(&events, TRACKED).expect("arm");

    let lease = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(StdDuration::from_millis(20));
            let entries = [dhcp_entry(LEASE_ADDR)];
            gate.on_event(&NetEvent::Ipv4AddrAdded {
                iface: TRACKED,
                ipv4: Ipv4Snapshot {
                    unicast: &entries,
                    gateway: None,
                    lease_secs: Some(3_600),
                },
            });
        });
        block_on(gate.wait(Some(Duration::from_secs(5))))
    });

    assert_eq!(lease.map(|lease| lease.address), Ok(LEASE_ADDR));
}

#[test]
fn full_event_source_is_reported() {
    let gate = Gate::new();
    let events = MockEvents::with_capacity(0);
    assert_eq!(gate.arm(&events, TRACKED), Err(SubscribeError::Full));
    assert_eq!(events.listener_count(), 0);
}
