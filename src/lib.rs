use std::time::Duration;

use thiserror::Error;

pub use crate::components::bus::{
    BusError, BusState, CartridgeBus, ADDRESS_MASK, RESET_VECTOR, ROM_BOUNDARY,
};
pub use crate::components::cartridge::{CartridgeRom, RomError, SimulatedSlot};
pub use crate::components::gpio::{Gpio, Level, Pin, PinMode, SimulatedPort};
pub use crate::components::indicator::{AccessLed, ActivityIndicator};
pub use crate::components::wiring::Wiring;
pub use crate::protocol::command::{Command, Reserved, Unsupported, SYNC};
pub use crate::protocol::dispatch::DispatchError;
pub use crate::protocol::frame::{Bridge, Exchange, SessionStats};
pub use crate::protocol::header::{split_reply, Header, HEADER_SIZE};
pub use crate::protocol::info::{DeviceInfo, DEVICE_INFO, DEVICE_INFO_SIZE};
pub use crate::protocol::transport::{
    Chunk, ScriptedTransport, TcpTransport, Transport, TransportError,
};
pub use crate::protocol::ErrorFlags;

pub mod checksum;
mod components;
mod protocol;

const KIB: usize = 1024;

/// Payload capacity shared by the request and reply of one transaction.
pub const BUFFER_SIZE: usize = 8 * KIB;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Upper bound for each header or payload read.
    pub read_timeout: Duration,
    pub announce_blinks: usize,
    pub blink_on: Duration,
    pub blink_off: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(1000),
            announce_blinks: 5,
            blink_on: Duration::from_millis(200),
            blink_off: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Rom(#[from] RomError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HexWord(pub u16);

impl std::fmt::Debug for HexWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::fmt::Display for HexWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
