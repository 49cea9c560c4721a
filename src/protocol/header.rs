use crate::checksum::checksum;

pub const HEADER_SIZE: usize = 10;
/// The checksum is always the last field and never covers itself.
const CHECKSUM_OFFSET: usize = HEADER_SIZE - 2;

/// Frame header, identical for requests and replies.
///
/// Wire layout, little-endian, no padding:
///
/// | offset | field          |
/// |--------|----------------|
/// | 0      | cmd            |
/// | 1      | status         |
/// | 2..4   | request_length |
/// | 4..6   | reply_length   |
/// | 6..8   | address        |
/// | 8..10  | checksum       |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub cmd: u8,
    pub status: u8,
    pub request_length: u16,
    pub reply_length: u16,
    pub address: u16,
    pub checksum: u16,
}

impl Header {
    /// Builds a sealed request as host tooling would send it.
    pub fn request(cmd: u8, address: u16, reply_length: u16, payload: &[u8]) -> Self {
        let mut header = Self {
            cmd,
            status: 0,
            request_length: payload.len() as u16,
            reply_length,
            address,
            checksum: 0,
        };
        header.seal(payload);
        header
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0; HEADER_SIZE];
        bytes[0] = self.cmd;
        bytes[1] = self.status;
        bytes[2..4].copy_from_slice(&self.request_length.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.reply_length.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.address.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let word = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Self {
            cmd: bytes[0],
            status: bytes[1],
            request_length: word(2),
            reply_length: word(4),
            address: word(6),
            checksum: word(8),
        }
    }

    /// Checksum of the header fields before `checksum` plus the payload, summed separately.
    pub fn compute_checksum(&self, payload: &[u8]) -> u16 {
        checksum(&self.encode()[..CHECKSUM_OFFSET]).wrapping_add(checksum(payload))
    }

    pub fn seal(&mut self, payload: &[u8]) {
        self.checksum = self.compute_checksum(payload);
    }

    pub fn is_intact(&self, payload: &[u8]) -> bool {
        self.checksum == self.compute_checksum(payload)
    }
}

/// Splits one frame off the front of `bytes` as a host reads replies.
///
/// Returns the header, its reply payload and the unread remainder.
pub fn split_reply(bytes: &[u8]) -> Option<(Header, &[u8], &[u8])> {
    let raw: &[u8; HEADER_SIZE] = bytes.get(..HEADER_SIZE)?.try_into().ok()?;
    let header = Header::decode(raw);
    let end = HEADER_SIZE + header.reply_length as usize;
    let payload = bytes.get(HEADER_SIZE..end)?;
    Some((header, payload, &bytes[end..]))
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cmd: {:?}, status: {:#04x}, request: {}, reply: {}, address: {:#06x}, checksum: {:#06x}",
            self.cmd as char,
            self.status,
            self.request_length,
            self.reply_length,
            self.address,
            self.checksum
        )
    }
}
