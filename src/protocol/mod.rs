use bitflags::bitflags;

pub mod command;
pub mod dispatch;
pub mod frame;
pub mod header;
pub mod info;
pub mod transport;

bitflags! {
    /// Reply `status` bits. Every failure of a transaction is OR-ed in.
    #[derive(Default)]
    pub struct ErrorFlags: u8 {
        const COMMAND = 0b00000001;
        const CHECKSUM = 0b00000010;
        const LENGTH = 0b00000100;
        const RANGE = 0b00001000;
        const TIMEOUT = 0b00010000;
        /// Internal: the dispatcher produced more reply data than the buffer holds.
        const REPLY_LENGTH = 0b00100000;
    }
}
