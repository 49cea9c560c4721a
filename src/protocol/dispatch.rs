use thiserror::Error;

use crate::components::bus::{BusError, CartridgeBus, ROM_BOUNDARY};
use crate::components::gpio::Gpio;
use crate::protocol::command::Command;
use crate::protocol::header::Header;
use crate::protocol::info::{DEVICE_INFO, DEVICE_INFO_SIZE};
use crate::protocol::ErrorFlags;
use crate::HexWord;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unsupported command {0}")]
    Unsupported(Command),
    #[error("Block of {length} bytes at {start} crosses the ROM boundary")]
    Range { start: HexWord, length: u16 },
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl DispatchError {
    pub fn flags(&self) -> ErrorFlags {
        match self {
            DispatchError::Unsupported(_) => ErrorFlags::COMMAND,
            DispatchError::Range { .. } => ErrorFlags::RANGE,
            DispatchError::Bus(_) => ErrorFlags::RANGE,
        }
    }
}

/// Runs a validated request against the bus.
///
/// `payload` holds the request data on entry and receives the reply data.
/// Returns the reply length. `header.reply_length` must already be clamped to the payload capacity.
pub fn dispatch<G: Gpio>(
    bus: &mut CartridgeBus<G>,
    header: &Header,
    payload: &mut [u8],
) -> Result<u16, DispatchError> {
    match Command::from(header.cmd) {
        Command::ReadSingle => {
            payload[0] = bus.read(header.address)?;
            Ok(1)
        }
        Command::EmulateSingle => {
            bus.emulate_read(header.address, payload[0]);
            Ok(1)
        }
        Command::ReadBlock => read_block(bus, header.address, header.reply_length, payload),
        Command::GetInfo => {
            payload[..DEVICE_INFO_SIZE].copy_from_slice(&DEVICE_INFO.encode());
            Ok(DEVICE_INFO_SIZE as u16)
        }
        command @ (Command::Sync | Command::Unsupported(_)) => {
            Err(DispatchError::Unsupported(command))
        }
    }
}

/// Sequential single-byte reads. The whole block must sit below the ROM boundary.
fn read_block<G: Gpio>(
    bus: &mut CartridgeBus<G>,
    start: u16,
    length: u16,
    payload: &mut [u8],
) -> Result<u16, DispatchError> {
    let end = start as u32 + length as u32;
    if end >= ROM_BOUNDARY as u32 || length as usize > payload.len() {
        return Err(DispatchError::Range {
            start: HexWord(start),
            length,
        });
    }
    for (offset, byte) in payload[..length as usize].iter_mut().enumerate() {
        *byte = bus.read(start + offset as u16)?;
    }
    Ok(length)
}
