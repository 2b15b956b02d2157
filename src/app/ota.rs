use log::info;
use mender_netup::ota::{DeviceIdentity, InventoryItem, OtaClient, OtaClientConfig};

/// Stand-in update client: prints what a real client would receive.
pub(crate) struct ConsoleOtaClient;

impl OtaClient for ConsoleOtaClient {
    fn init(&mut self, config: &OtaClientConfig, identity: &DeviceIdentity) -> Result<(), i32> {
        info!(
            "ota: identity {} device_type={} recommissioning={}",
            identity.as_json(),
            config.device_type,
            config.recommissioning
        );
        Ok(())
    }

    fn add_inventory(&mut self, items: &'static [InventoryItem]) -> Result<(), i32> {
        for item in items {
            info!("ota: inventory {}={}", item.name, item.value);
        }
        Ok(())
    }

    fn activate(&mut self) -> Result<(), i32> {
        Ok(())
    }
}
