pub(crate) mod events;
#[cfg(not(feature = "wifi"))]
pub(crate) mod w5500;
#[cfg(feature = "wifi")]
pub(crate) mod wifi;

use core::{cell::Cell, net::Ipv4Addr};

use embassy_net::Stack;
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use log::{info, warn};
use mender_netup::{AddrSource, IfaceIndex, Ipv4Entry, Ipv4Snapshot, NetEvent};

use self::events::EventDispatcher;

#[cfg(not(feature = "wifi"))]
pub(crate) use self::w5500::spawn_link_tasks;
#[cfg(feature = "wifi")]
pub(crate) use self::wifi::spawn_link_tasks;

static LEASED_V4: Mutex<CriticalSectionRawMutex, Cell<Option<Ipv4Addr>>> =
    Mutex::new(Cell::new(None));

pub(crate) fn leased_ipv4() -> Option<Ipv4Addr> {
    LEASED_V4.lock(|leased| leased.get())
}

/// Turns embassy-net configuration changes into platform events.
#[embassy_executor::task]
pub(crate) async fn lease_watch_task(
    stack: Stack<'static>,
    events: &'static EventDispatcher,
    iface: IfaceIndex,
) {
    loop {
        stack.wait_link_up().await;
        info!("net: iface={} link up", iface);
        events.dispatch(&NetEvent::LinkUp { iface });

        stack.wait_config_up().await;
        match stack.config_v4() {
            Some(config) => {
                let address = config.address.address();
                LEASED_V4.lock(|leased| leased.set(Some(address)));
                let unicast = [Ipv4Entry {
                    address,
                    netmask: config.address.netmask(),
                    source: AddrSource::Dhcp,
                }];
                events.dispatch(&NetEvent::Ipv4AddrAdded {
                    iface,
                    ipv4: Ipv4Snapshot {
                        unicast: &unicast,
                        gateway: config.gateway,
                        lease_secs: None,
                    },
                });
            }
            None => warn!("net: iface={} config up without ipv4", iface),
        }

        stack.wait_config_down().await;
        LEASED_V4.lock(|leased| leased.set(None));
        info!("net: iface={} lease lost", iface);
        events.dispatch(&NetEvent::Ipv4AddrRemoved { iface });
        if !stack.is_link_up() {
            events.dispatch(&NetEvent::LinkDown { iface });
        }
    }
}
