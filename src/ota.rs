//! Hand-off to the OTA update client: device identity and static inventory.

use core::fmt;

use log::{error, info};

use crate::netup::{MacAddress, NetInterface};

pub const IDENTITY_NAME: &str = "mac";
const IDENTITY_JSON_MAX: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: &'static str,
    pub value: heapless::String<{ MacAddress::IDENTITY_STR_LEN }>,
}

impl DeviceIdentity {
    pub fn from_mac(mac: MacAddress) -> Self {
        Self {
            name: IDENTITY_NAME,
            value: mac.to_identity_string(),
        }
    }

    pub fn as_json(&self) -> heapless::String<IDENTITY_JSON_MAX> {
        use core::fmt::Write;

        let mut out = heapless::String::new();
        let _ = write!(out, "{{\"{}\": \"{}\"}}", self.name, self.value);
        out
    }
}

/// Re-reads the link address currently installed on `iface`.
pub fn identity_from_interface<I: NetInterface>(iface: &I) -> DeviceIdentity {
    DeviceIdentity::from_mac(iface.link_address())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InventoryItem {
    pub name: &'static str,
    pub value: &'static str,
}

#[cfg(not(feature = "wifi"))]
const NETWORK_INVENTORY: &str = "W5500-Ethernet";
#[cfg(feature = "wifi")]
const NETWORK_INVENTORY: &str = "ESP32-WiFi";

pub const PERSISTENT_INVENTORY: [InventoryItem; 3] = [
    InventoryItem {
        name: "App",
        value: "mender-mcu-integration",
    },
    InventoryItem {
        name: "Network",
        value: NETWORK_INVENTORY,
    },
    InventoryItem {
        name: "Display",
        value: "ILI9341-320x240",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OtaClientConfig {
    pub device_type: &'static str,
    pub recommissioning: bool,
}

impl OtaClientConfig {
    pub fn from_env() -> Self {
        Self {
            device_type: crate::config::device_type(),
            recommissioning: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtaError {
    Init,
    Inventory,
    Activate,
}

impl OtaError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Inventory => "inventory",
            Self::Activate => "activate",
        }
    }
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ota {} failed", self.as_str())
    }
}

/// The update client consumes the identity once the network is up.
pub trait OtaClient {
    fn init(&mut self, config: &OtaClientConfig, identity: &DeviceIdentity) -> Result<(), i32>;

    fn add_inventory(&mut self, items: &'static [InventoryItem]) -> Result<(), i32>;

    fn activate(&mut self) -> Result<(), i32>;
}

pub fn start_ota_client<C: OtaClient>(
    client: &mut C,
    config: &OtaClientConfig,
    identity: &DeviceIdentity,
) -> Result<(), OtaError> {
    info!(
        "ota: init device_type={} identity={}",
        config.device_type,
        identity.as_json()
    );
    client.init(config, identity).map_err(|code| {
        error!("ota: failed to initialize the client code={}", code);
        OtaError::Init
    })?;

    client.add_inventory(&PERSISTENT_INVENTORY).map_err(|code| {
        error!("ota: failed to add inventory code={}", code);
        OtaError::Inventory
    })?;
    info!("ota: inventory items={}", PERSISTENT_INVENTORY.len());

    client.activate().map_err(|code| {
        error!("ota: unable to activate the client code={}", code);
        OtaError::Activate
    })?;
    info!("ota: client activated");
    Ok(())
}
