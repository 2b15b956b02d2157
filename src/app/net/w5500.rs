//! Wiznet W5500 on SPI2, driven by `embassy-net-wiznet`.
//!
//! The chip takes its MAC once, when the driver is constructed, so the link
//! defers construction until `start_dhcp`: everything before that only edits
//! the address the driver will be built with.

use core::net::Ipv4Addr;

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use embassy_net_wiznet::{chip::W5500, Device, State};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    gpio::{Input, Output},
    rng::Rng,
    spi::master::Spi,
    Async,
};
use log::{error, info};
use mender_netup::{AdminState, IfaceError, IfaceIndex, MacAddress, NetInterface};
use static_cell::StaticCell;

use super::{events::EventDispatcher, lease_watch_task, leased_ipv4};

pub(crate) const SPI_FREQUENCY_MHZ: u32 = 20;

const IFACE: IfaceIndex = IfaceIndex(1);
// Board default until a derived identity is installed.
const BOARD_MAC: MacAddress = MacAddress([0x00, 0x08, 0xDC, 0x01, 0x02, 0x03]);
const RX_FRAMES: usize = 8;
const TX_FRAMES: usize = 8;
const STACK_SOCKETS: usize = 3;

type W5500Spi = ExclusiveDevice<Spi<'static, Async>, Output<'static>, Delay>;
type ChipRunner =
    embassy_net_wiznet::Runner<'static, W5500, W5500Spi, Input<'static>, Output<'static>>;

static START: Signal<CriticalSectionRawMutex, MacAddress> = Signal::new();

pub(crate) struct W5500Hw {
    pub(crate) spi: Spi<'static, Async>,
    pub(crate) cs: Output<'static>,
    pub(crate) int: Input<'static>,
    pub(crate) rst: Output<'static>,
}

pub(crate) struct W5500Runtime {
    spi: W5500Spi,
    int: Input<'static>,
    rst: Output<'static>,
}

pub(crate) fn setup(hw: W5500Hw) -> Result<(W5500Link, W5500Runtime), &'static str> {
    let spi = ExclusiveDevice::new(hw.spi, hw.cs, Delay)
        .map_err(|_| "w5500: chip select init failed")?;
    Ok((
        W5500Link::new(),
        W5500Runtime {
            spi,
            int: hw.int,
            rst: hw.rst,
        },
    ))
}

pub(crate) fn spawn_link_tasks(
    spawner: &Spawner,
    runtime: W5500Runtime,
    events: &'static EventDispatcher,
) {
    spawner.must_spawn(w5500_task(runtime, events));
}

pub(crate) struct W5500Link {
    admin: AdminState,
    mac: MacAddress,
    started: bool,
}

impl W5500Link {
    const fn new() -> Self {
        Self {
            admin: AdminState::Up,
            mac: BOARD_MAC,
            started: false,
        }
    }
}

impl NetInterface for W5500Link {
    fn index(&self) -> IfaceIndex {
        IFACE
    }

    fn name(&self) -> &str {
        "w5500"
    }

    fn admin_state(&self) -> AdminState {
        self.admin
    }

    fn admin_down(&mut self) -> Result<(), IfaceError> {
        if self.started {
            return Err(IfaceError::Busy);
        }
        if self.admin == AdminState::Down {
            return Err(IfaceError::AlreadyInState);
        }
        self.admin = AdminState::Down;
        Ok(())
    }

    fn admin_up(&mut self) -> Result<(), IfaceError> {
        if self.admin == AdminState::Up {
            return Err(IfaceError::AlreadyInState);
        }
        self.admin = AdminState::Up;
        Ok(())
    }

    fn set_link_address(&mut self, address: MacAddress) -> Result<(), IfaceError> {
        if self.started || self.admin != AdminState::Down {
            return Err(IfaceError::Busy);
        }
        self.mac = address;
        Ok(())
    }

    fn link_address(&self) -> MacAddress {
        self.mac
    }

    fn start_dhcp(&mut self) -> Result<(), IfaceError> {
        if self.started {
            return Err(IfaceError::AlreadyInState);
        }
        if self.admin != AdminState::Up {
            return Err(IfaceError::NotReady);
        }
        START.signal(self.mac);
        self.started = true;
        Ok(())
    }

    fn ipv4_address(&self) -> Option<Ipv4Addr> {
        leased_ipv4()
    }
}

#[embassy_executor::task]
async fn w5500_task(runtime: W5500Runtime, events: &'static EventDispatcher) {
    static STATE: StaticCell<State<RX_FRAMES, TX_FRAMES>> = StaticCell::new();
    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();

    let mac = START.wait().await;
    info!("w5500: init mac={}", mac);

    let (device, chip_runner) = match embassy_net_wiznet::new::<RX_FRAMES, TX_FRAMES, W5500, _, _, _>(
        mac.octets(),
        STATE.init(State::new()),
        runtime.spi,
        runtime.int,
        runtime.rst,
    )
    .await
    {
        Ok(parts) => parts,
        Err(err) => {
            error!("w5500: chip init failed err={:?}", err);
            return;
        }
    };

    let spawner = Spawner::for_current_executor().await;
    spawner.must_spawn(chip_task(chip_runner));

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (stack, net_runner) = embassy_net::new(
        device,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::<STACK_SOCKETS>::new()),
        seed,
    );
    spawner.must_spawn(net_task(net_runner));
    spawner.must_spawn(lease_watch_task(stack, events, IFACE));
    info!("w5500: dhcp client running");
}

#[embassy_executor::task]
async fn chip_task(runner: ChipRunner) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, Device<'static>>) -> ! {
    runner.run().await
}
