use core::fmt;

use log::{error, info};

pub const HARDWARE_ID_LEN: usize = 6;
/// Wiznet OUI, the W5500 ships without a burned-in address.
pub const VENDOR_PREFIX: [u8; 3] = [0x00, 0x08, 0xDC];

const CRC32_TABLE: [u32; 256] = generate_crc32_table();

/// Read-only storage holding the chip's unique identifier.
pub trait HardwareIdSource {
    /// Fills `buf` and returns how many bytes the platform provided, or a
    /// negative platform status.
    fn read_device_id(&mut self, buf: &mut [u8]) -> Result<usize, i32>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HardwareReadError {
    Unavailable { code: i32 },
    Short { len: usize },
}

impl HardwareReadError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "hwid_unavailable",
            Self::Short { .. } => "hwid_short",
        }
    }
}

impl fmt::Display for HardwareReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unavailable { code } => write!(f, "{} code={}", self.as_str(), code),
            Self::Short { len } => write!(f, "{} len={}", self.as_str(), len),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HardwareId([u8; HARDWARE_ID_LEN]);

impl HardwareId {
    pub const fn new(bytes: [u8; HARDWARE_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn derive_link_address(&self) -> MacAddress {
        MacAddress::from_hash(crc32_ieee(&self.0))
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_colon_hex(f, &self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const IDENTITY_STR_LEN: usize = 17;

    const fn from_hash(hash: u32) -> Self {
        Self([
            VENDOR_PREFIX[0],
            VENDOR_PREFIX[1],
            VENDOR_PREFIX[2],
            (hash >> 16) as u8,
            (hash >> 8) as u8,
            hash as u8,
        ])
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub const fn is_vendor_prefixed(&self) -> bool {
        self.0[0] == VENDOR_PREFIX[0]
            && self.0[1] == VENDOR_PREFIX[1]
            && self.0[2] == VENDOR_PREFIX[2]
    }

    pub fn to_identity_string(&self) -> heapless::String<{ Self::IDENTITY_STR_LEN }> {
        use core::fmt::Write;

        let mut out = heapless::String::new();
        // 6 octets * 2 digits + 5 separators always fits.
        let _ = write!(out, "{}", self);
        out
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_colon_hex(f, &self.0)
    }
}

/// Hashes the whole identifier so chips from one batch with near-sequential
/// ids still spread over the 24-bit host part.
pub fn derive_link_address(hw_id: &[u8]) -> Result<MacAddress, HardwareReadError> {
    if hw_id.len() < HARDWARE_ID_LEN {
        return Err(HardwareReadError::Short { len: hw_id.len() });
    }
    Ok(MacAddress::from_hash(crc32_ieee(hw_id)))
}

pub fn read_hardware_id<S: HardwareIdSource>(
    source: &mut S,
) -> Result<HardwareId, HardwareReadError> {
    let mut buf = [0u8; HARDWARE_ID_LEN];
    let len = match source.read_device_id(&mut buf) {
        Ok(len) => len,
        Err(code) => {
            error!("netup: chip id read failed code={}", code);
            return Err(HardwareReadError::Unavailable { code });
        }
    };
    if len < HARDWARE_ID_LEN {
        error!("netup: chip id short len={}", len);
        return Err(HardwareReadError::Short { len });
    }

    let id = HardwareId(buf);
    info!("netup: chip id={}", id);
    Ok(id)
}

/// CRC-32/ISO-HDLC, the variant zlib and Ethernet use.
pub const fn crc32_ieee(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    let mut i = 0;
    while i < data.len() {
        let index = ((crc ^ data[i] as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
        i += 1;
    }
    !crc
}

const fn generate_crc32_table() -> [u32; 256] {
    const POLYNOMIAL: u32 = 0xEDB8_8320;
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

fn write_colon_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (idx, byte) in bytes.iter().enumerate() {
        if idx > 0 {
            f.write_str(":")?;
        }
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}
