use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

pub const SYNC: u8 = b'S';

/// Opcodes the host protocol names but this firmware does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[repr(u8)]
pub enum Reserved {
    WriteSingle = b'w',
    WriteBlock = b'W',
    EmulateBlock = b'E',
    SetReadDelay = b'd',
    GetReadDelay = b'D',
}

impl Reserved {
    pub fn opcode(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    Reserved(Reserved),
    Unknown(u8),
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsupported::Reserved(r) => write!(f, "{} ({:?})", r, r.opcode() as char),
            Unsupported::Unknown(op) => write!(f, "unknown opcode {:#04x}", op),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReadSingle,
    EmulateSingle,
    ReadBlock,
    GetInfo,
    /// Resynchronisation marker. Never answered.
    Sync,
    Unsupported(Unsupported),
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Command::ReadSingle => b'r',
            Command::EmulateSingle => b'e',
            Command::ReadBlock => b'R',
            Command::GetInfo => b'I',
            Command::Sync => SYNC,
            Command::Unsupported(Unsupported::Reserved(r)) => r.opcode(),
            Command::Unsupported(Unsupported::Unknown(op)) => *op,
        }
    }
}

impl From<u8> for Command {
    fn from(opcode: u8) -> Self {
        match opcode {
            b'r' => Command::ReadSingle,
            b'e' => Command::EmulateSingle,
            b'R' => Command::ReadBlock,
            b'I' => Command::GetInfo,
            SYNC => Command::Sync,
            op => Command::Unsupported(
                Reserved::iter()
                    .find(|r| r.opcode() == op)
                    .map_or(Unsupported::Unknown(op), Unsupported::Reserved),
            ),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::ReadSingle => write!(f, "READ_SINGLE"),
            Command::EmulateSingle => write!(f, "EMULATE_SINGLE"),
            Command::ReadBlock => write!(f, "READ_BLOCK"),
            Command::GetInfo => write!(f, "GET_INFO"),
            Command::Sync => write!(f, "SYNC"),
            Command::Unsupported(u) => write!(f, "UNSUPPORTED: {}", u),
        }
    }
}
