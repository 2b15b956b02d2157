use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;

use super::mock::{
    ChipId, MockEvents, MockIface, Op, RecordingDelay, FACTORY_MAC, FIXTURE_MAC, JOIN_REFUSED,
    LEASE_ADDR,
};
use crate::{
    config::BringUpConfig,
    netup::{
        bring_up, AdminState, BringUpError, GatePhase, HardwareReadError, IdentityFailure,
        IdentityOutcome, IfaceError, JoinOutcome, JoinParams, JoinPolicy, ReadinessGate,
        SecurityMode, StateError,
    },
    ota::identity_from_interface,
};

type Gate = ReadinessGate<CriticalSectionRawMutex>;

const SAFETY_NET: Duration = Duration::from_secs(5);

const LAB_WIFI: JoinParams<'static> = JoinParams {
    ssid: "lab",
    psk: "secret",
    security: SecurityMode::Psk,
    channel: None,
};

#[test]
fn wired_bring_up_installs_derived_address_before_lease() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1).leasing_through(&events);
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wired().with_deadline(SAFETY_NET);

    let report = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .expect("bring up");

    assert_eq!(report.identity, IdentityOutcome::Derived(FIXTURE_MAC));
    assert_eq!(report.link_address, FIXTURE_MAC);
    assert_eq!(report.join, None);
    assert_eq!(report.dhcp, Ok(()));
    assert_eq!(report.lease.address, LEASE_ADDR);
    assert_eq!(report.ipv4, Some(LEASE_ADDR));
    assert_eq!(gate.phase(), GatePhase::Consumed);
    assert!(delay.ms.is_empty());

    let dhcp_at = iface.ops.iter().position(|op| *op == Op::StartDhcp);
    let up_at = iface.ops.iter().position(|op| *op == Op::AdminUp);
    assert!(up_at < dhcp_at);

    assert_eq!(
        identity_from_interface(&iface).value.as_str(),
        "00:08:dc:f6:77:24"
    );
}

#[test]
fn exhausted_join_still_requests_lease() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1).leasing_through(&events);
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wireless_join(LAB_WIFI).with_deadline(SAFETY_NET);

    let report = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .expect("bring up");

    assert_eq!(
        report.join,
        Some(JoinOutcome::Exhausted {
            attempts: 20,
            last: JOIN_REFUSED,
        })
    );
    assert_eq!(iface.join_count(), 20);
    assert_eq!(delay.ms, [500; 19]);
    assert_eq!(iface.ops.last(), Some(&Op::StartDhcp));
    assert_eq!(report.lease.address, LEASE_ADDR);

    let up_at = iface.ops.iter().position(|op| *op == Op::AdminUp);
    let first_join_at = iface.ops.iter().position(|op| *op == Op::Join);
    assert!(up_at.is_some());
    assert!(up_at < first_join_at);
    assert_eq!(report.link_address, FIXTURE_MAC);

    let outcome = report.join.expect("join attempted");
    assert_eq!(outcome.as_str(), "exhausted");
    assert_eq!(outcome.attempts(), 20);
}

#[test]
fn join_accepted_on_third_attempt() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1).leasing_through(&events);
    iface.joins_before_accept = Some(2);
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wireless_join(LAB_WIFI)
        .with_join_policy(JoinPolicy {
            max_attempts: 5,
            retry_delay: Duration::from_millis(100),
        })
        .with_deadline(SAFETY_NET);

    let report = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .expect("bring up");

    assert_eq!(report.join, Some(JoinOutcome::Joined { attempts: 3 }));
    assert_eq!(report.join.map(JoinOutcome::as_str), Some("joined"));
    assert_eq!(delay.ms, [100, 100]);
}

#[test]
fn short_chip_id_keeps_factory_address() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1).leasing_through(&events);
    let mut hw = ChipId {
        bytes: &[0xAA, 0xBB, 0xCC, 0xDD],
        status: Ok(()),
    };
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wired().with_deadline(SAFETY_NET);

    let report = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .expect("bring up");

    assert_eq!(
        report.identity,
        IdentityOutcome::Fallback(IdentityFailure::HardwareRead(HardwareReadError::Short {
            len: 4
        }))
    );
    assert_eq!(report.link_address, FACTORY_MAC);
    assert_eq!(iface.ops, [Op::StartDhcp]);
    assert_eq!(report.lease.address, LEASE_ADDR);
}

#[test]
fn rejected_address_degrades_to_factory_identity() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1).leasing_through(&events);
    iface.fail_set = Some(IfaceError::NotSupported);
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wired().with_deadline(SAFETY_NET);

    let report = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .expect("bring up");

    assert_eq!(
        report.identity,
        IdentityOutcome::Fallback(IdentityFailure::State(StateError::AddressAssign(
            IfaceError::NotSupported
        )))
    );
    assert!(!report.identity.is_derived());
    assert_eq!(iface.state, AdminState::Up);
    assert_eq!(report.link_address, FACTORY_MAC);
    assert_eq!(report.dhcp, Ok(()));
}

#[test]
fn refused_down_transition_keeps_factory_identity() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1).leasing_through(&events);
    iface.fail_down = Some(IfaceError::Busy);
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wired().with_deadline(SAFETY_NET);

    let report = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .expect("bring up");

    assert_eq!(
        report.identity,
        IdentityOutcome::Fallback(IdentityFailure::State(StateError::DownTransition(
            IfaceError::Busy
        )))
    );
    assert_eq!(report.link_address, FACTORY_MAC);
    assert_eq!(iface.ops, [Op::AdminDown, Op::StartDhcp]);
    assert_eq!(iface.state, AdminState::Up);
    assert_eq!(report.lease.address, LEASE_ADDR);
}

#[test]
fn missing_lease_times_out_when_deadline_set() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1);
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let after = Duration::from_millis(30);
    let config = BringUpConfig::wired().with_deadline(after);

    let err = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ))
    .unwrap_err();

    let BringUpError::Timeout(timeout) = err;
    assert_eq!(timeout.after, after);
    assert_eq!(iface.mac, FIXTURE_MAC);
    assert_eq!(gate.phase(), GatePhase::Armed);
}

#[test]
fn dhcp_start_failure_still_waits_for_lease() {
    let gate = Gate::new();
    let events = MockEvents::new();
    let mut iface = MockIface::new(1);
    iface.fail_dhcp = Some(IfaceError::Platform(-12));
    let mut hw = ChipId::fixture();
    let mut delay = RecordingDelay::default();
    let config = BringUpConfig::wired().with_deadline(Duration::from_millis(20));

    let result = block_on(bring_up(
        &mut iface, &mut hw, &events, &gate, &config, &mut delay,
    ));

    assert!(matches!(result, Err(BringUpError::Timeout(_))));
    assert_eq!(iface.ops.last(), Some(&Op::StartDhcp));
}
