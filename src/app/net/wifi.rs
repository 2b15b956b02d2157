use core::net::Ipv4Addr;

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use esp_hal::rng::Rng;
use esp_radio::wifi::{
    AuthMethod, ClientConfig, Config as WifiRuntimeConfig, ModeConfig, WifiController, WifiDevice,
};
use log::{info, warn};
use mender_netup::{
    AdminState, IfaceError, IfaceIndex, JoinParams, MacAddress, NetInterface, SecurityMode,
};
use static_cell::StaticCell;

use super::{events::EventDispatcher, lease_watch_task, leased_ipv4};

const IFACE: IfaceIndex = IfaceIndex(1);
const STACK_SOCKETS: usize = 3;
const WIFI_RX_QUEUE_SIZE: usize = 3;
const WIFI_TX_QUEUE_SIZE: usize = 2;
const WIFI_STATIC_RX_BUF_NUM: u8 = 4;
const WIFI_DYNAMIC_RX_BUF_NUM: u16 = 8;
const WIFI_DYNAMIC_TX_BUF_NUM: u16 = 8;

// errno values reported for radio failures, the driver has no numeric codes.
const EIO: i32 = -5;
const ECONNREFUSED: i32 = -111;

pub(crate) struct WifiRuntime {
    net_runner: Runner<'static, WifiDevice<'static>>,
    stack: Stack<'static>,
}

pub(crate) fn setup(
    wifi: esp_hal::peripherals::WIFI<'static>,
) -> Result<(WifiLink, WifiRuntime), &'static str> {
    static RADIO_CTRL: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static STACK_RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();

    let radio_ctrl = esp_radio::init().map_err(|_| "wifi: esp_radio::init failed")?;
    let radio_ctrl = RADIO_CTRL.init(radio_ctrl);
    let (controller, ifaces) = esp_radio::wifi::new(radio_ctrl, wifi, wifi_runtime_config())
        .map_err(|_| "wifi: driver init failed")?;
    let mac = MacAddress(ifaces.sta.mac_address());

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (stack, net_runner) = embassy_net::new(
        ifaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::<STACK_SOCKETS>::new()),
        seed,
    );

    Ok((
        WifiLink {
            controller,
            admin: AdminState::Up,
            mac,
            dhcp_started: false,
        },
        WifiRuntime { net_runner, stack },
    ))
}

pub(crate) fn spawn_link_tasks(
    spawner: &Spawner,
    runtime: WifiRuntime,
    events: &'static EventDispatcher,
) {
    spawner.must_spawn(net_task(runtime.net_runner));
    spawner.must_spawn(lease_watch_task(runtime.stack, events, IFACE));
}

/// ESP32 station interface. The radio owns its MAC, so the derived
/// identity cannot be installed here.
pub(crate) struct WifiLink {
    controller: WifiController<'static>,
    admin: AdminState,
    mac: MacAddress,
    dhcp_started: bool,
}

impl NetInterface for WifiLink {
    fn index(&self) -> IfaceIndex {
        IFACE
    }

    fn name(&self) -> &str {
        "wlan0"
    }

    fn admin_state(&self) -> AdminState {
        self.admin
    }

    fn admin_down(&mut self) -> Result<(), IfaceError> {
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

    fn set_link_address(&mut self, _address: MacAddress) -> Result<(), IfaceError> {
        Err(IfaceError::NotSupported)
    }

    fn link_address(&self) -> MacAddress {
        self.mac
    }

    fn start_dhcp(&mut self) -> Result<(), IfaceError> {
        // The stack was created with a DHCPv4 config; it starts on link up.
        if self.dhcp_started {
            return Err(IfaceError::AlreadyInState);
        }
        self.dhcp_started = true;
        Ok(())
    }

    fn ipv4_address(&self) -> Option<Ipv4Addr> {
        leased_ipv4()
    }

    async fn request_join(&mut self, params: &JoinParams<'_>) -> Result<(), IfaceError> {
        let mut client = ClientConfig::default()
            .with_ssid(params.ssid.into())
            .with_password(params.psk.into())
            .with_auth_method(auth_method(params.security));
        if let Some(channel) = params.channel {
            client = client.with_channel(channel);
        }

        if let Err(err) = self.controller.set_config(&ModeConfig::Client(client)) {
            warn!("wifi: station config err={:?}", err);
            return Err(IfaceError::Platform(EIO));
        }

        match self.controller.is_started() {
            Ok(true) => {}
            Ok(false) => {
                if let Err(err) = self.controller.start_async().await {
                    warn!("wifi: start err={:?}", err);
                    return Err(IfaceError::NotReady);
                }
            }
            Err(err) => {
                warn!("wifi: status err={:?}", err);
                return Err(IfaceError::NotReady);
            }
        }

        match self.controller.connect_async().await {
            Ok(()) => {
                info!("wifi: connected ssid={}", params.ssid);
                Ok(())
            }
            Err(err) => {
                warn!("wifi: connect err={:?}", err);
                let _ = self.controller.disconnect_async().await;
                Err(IfaceError::Platform(ECONNREFUSED))
            }
        }
    }
}

fn auth_method(security: SecurityMode) -> AuthMethod {
    match security {
        SecurityMode::None => AuthMethod::None,
        SecurityMode::Psk | SecurityMode::PskSha256 => AuthMethod::Wpa2Personal,
        SecurityMode::Sae => AuthMethod::Wpa3Personal,
    }
}

fn wifi_runtime_config() -> WifiRuntimeConfig {
    WifiRuntimeConfig::default()
        .with_rx_queue_size(WIFI_RX_QUEUE_SIZE)
        .with_tx_queue_size(WIFI_TX_QUEUE_SIZE)
        .with_static_rx_buf_num(WIFI_STATIC_RX_BUF_NUM)
        .with_dynamic_rx_buf_num(WIFI_DYNAMIC_RX_BUF_NUM)
        .with_dynamic_tx_buf_num(WIFI_DYNAMIC_TX_BUF_NUM)
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
