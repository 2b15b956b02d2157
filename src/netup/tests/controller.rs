use super::mock::{MockIface, Op, FACTORY_MAC, FIXTURE_MAC};
use crate::netup::{apply_identity, AdminState, IfaceError, NetInterface, StateError};

#[test]
fn address_is_installed_while_down_then_restored_up() {
    let mut iface = MockIface::new(1);

    apply_identity(&mut iface, FIXTURE_MAC).expect("apply");

    assert_eq!(
        iface.ops,
        [
            Op::AdminDown,
            Op::SetMac {
                mac: FIXTURE_MAC,
                state_at_call: AdminState::Down,
            },
            Op::AdminUp,
        ]
    );
    assert_eq!(iface.admin_state(), AdminState::Up);
    assert_eq!(iface.admin_state().as_str(), "up");
    assert_eq!(iface.mac, FIXTURE_MAC);
}

#[test]
fn already_down_interface_is_not_an_error() {
    let mut iface = MockIface::new(1);
    iface.state = AdminState::Down;

    apply_identity(&mut iface, FIXTURE_MAC).expect("apply");

    assert_eq!(iface.mac, FIXTURE_MAC);
    assert_eq!(iface.state, AdminState::Up);
}

#[test]
fn failed_down_transition_stops_before_assignment() {
    let mut iface = MockIface::new(1);
    iface.fail_down = Some(IfaceError::Platform(-5));

    let err = apply_identity(&mut iface, FIXTURE_MAC).unwrap_err();

    assert_eq!(err, StateError::DownTransition(IfaceError::Platform(-5)));
    assert_eq!(iface.ops, [Op::AdminDown]);
    assert_eq!(iface.mac, FACTORY_MAC);
    assert_eq!(iface.state, AdminState::Up);
}

#[test]
fn failed_assignment_still_brings_interface_up() {
    let mut iface = MockIface::new(1);
    iface.fail_set = Some(IfaceError::Platform(-22));

    let err = apply_identity(&mut iface, FIXTURE_MAC).unwrap_err();

    assert_eq!(err, StateError::AddressAssign(IfaceError::Platform(-22)));
    assert_eq!(err.cause().code(), -22);
    assert_eq!(iface.ops.last(), Some(&Op::AdminUp));
    assert_eq!(iface.state, AdminState::Up);
    assert_eq!(iface.mac, FACTORY_MAC);
}

#[test]
fn failed_up_transition_is_reported_once() {
    let mut iface = MockIface::new(1);
    iface.fail_up = Some(IfaceError::NotReady);

    let err = apply_identity(&mut iface, FIXTURE_MAC).unwrap_err();

    assert_eq!(err, StateError::UpTransition(IfaceError::NotReady));
    assert_eq!(iface.mac, FIXTURE_MAC);
    assert_eq!(iface.admin_state().as_str(), "down");
    assert_eq!(iface.ops.iter().filter(|op| **op == Op::AdminUp).count(), 1);
}
