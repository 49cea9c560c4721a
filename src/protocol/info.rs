pub const DEVICE_INFO_SIZE: usize = 10;

/// Identification record returned by GET_INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub unique_id: u32,
    pub device_type: u16,
    pub hw_version: u8,
    pub hw_revision: u8,
    pub fw_version: u8,
    pub fw_revision: u8,
}

pub const DEVICE_INFO: DeviceInfo = DeviceInfo {
    unique_id: 0xEFBE_ADDE,
    device_type: 0xEFBE,
    hw_version: 3,
    hw_revision: 0,
    fw_version: 3,
    fw_revision: 0,
};

impl DeviceInfo {
    pub fn encode(&self) -> [u8; DEVICE_INFO_SIZE] {
        let mut bytes = [0; DEVICE_INFO_SIZE];
        bytes[0..4].copy_from_slice(&self.unique_id.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.device_type.to_le_bytes());
        bytes[6] = self.hw_version;
        bytes[7] = self.hw_revision;
        bytes[8] = self.fw_version;
        bytes[9] = self.fw_revision;
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; DEVICE_INFO_SIZE] = bytes.get(..DEVICE_INFO_SIZE)?.try_into().ok()?;
        Some(Self {
            unique_id: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            device_type: u16::from_le_bytes([bytes[4], bytes[5]]),
            hw_version: bytes[6],
            hw_revision: bytes[7],
            fw_version: bytes[8],
            fw_revision: bytes[9],
        })
    }
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id {:#010x}, type {:#06x}, hardware {}.{}, firmware {}.{}",
            self.unique_id,
            self.device_type,
            self.hw_version,
            self.hw_revision,
            self.fw_version,
            self.fw_revision
        )
    }
}
