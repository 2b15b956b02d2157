use mender_netup::{HardwareIdSource, HARDWARE_ID_LEN};

/// Factory station MAC burned into eFuse block 0, used as the chip id.
///
/// `BLK0_RDATA2[15:0]` holds the two high octets, `BLK0_RDATA1` the low four.
pub(crate) struct EfuseChipId;

impl EfuseChipId {
    fn read_words() -> (u32, u32) {
        // Read-only shadow registers, loaded by the ROM before `main`.
        unsafe {
            let efuse = &*esp32::EFUSE::PTR;
            (
                efuse.blk0_rdata1().read().bits(),
                efuse.blk0_rdata2().read().bits(),
            )
        }
    }

    fn factory_mac() -> [u8; HARDWARE_ID_LEN] {
        let (low, high) = Self::read_words();
        let low = low.to_be_bytes();
        [
            (high >> 8) as u8,
            high as u8,
            low[0],
            low[1],
            low[2],
            low[3],
        ]
    }
}

impl HardwareIdSource for EfuseChipId {
    fn read_device_id(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        let id = Self::factory_mac();
        // An unprogrammed block reads back as all zeros.
        if id.iter().all(|byte| *byte == 0) {
            return Err(-5);
        }
        let len = buf.len().min(id.len());
        buf[..len].copy_from_slice(&id[..len]);
        Ok(len)
    }
}
