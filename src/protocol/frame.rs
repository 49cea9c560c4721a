use crate::components::bus::{CartridgeBus, ADDRESS_MASK};
use crate::components::gpio::Gpio;
use crate::components::indicator::ActivityIndicator;
use crate::protocol::command::SYNC;
use crate::protocol::dispatch::dispatch;
use crate::protocol::header::{Header, HEADER_SIZE};
use crate::protocol::transport::{Transport, TransportError};
use crate::protocol::ErrorFlags;
use crate::{BridgeConfig, BUFFER_SIZE};

/// What one pass through the request/reply loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// Idle timeout or SYNC marker. Nothing was sent.
    Resync,
    Replied(Header),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub replies: u64,
    pub error_replies: u64,
    pub resyncs: u64,
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} replies ({} with errors), {} resyncs",
            self.replies, self.error_replies, self.resyncs
        )
    }
}

/// The firmware side of the link: answers host frames using the cartridge bus.
pub struct Bridge<G: Gpio, A: ActivityIndicator> {
    bus: CartridgeBus<G>,
    indicator: A,
    config: BridgeConfig,
    buffer: Box<[u8; BUFFER_SIZE]>,
}

impl<G: Gpio, A: ActivityIndicator> Bridge<G, A> {
    pub fn new(bus: CartridgeBus<G>, indicator: A, config: BridgeConfig) -> Self {
        Self {
            bus,
            indicator,
            config,
            buffer: Box::new([0; BUFFER_SIZE]),
        }
    }

    pub fn bus(&self) -> &CartridgeBus<G> {
        &self.bus
    }

    pub fn indicator(&self) -> &A {
        &self.indicator
    }

    /// Blinks the access LED so the host can see the bridge is ready.
    pub fn announce(&mut self) {
        self.indicator.blink(
            self.config.announce_blinks,
            self.config.blink_on,
            self.config.blink_off,
        );
    }

    /// Answers frames until the host goes away.
    pub fn serve<T: Transport>(&mut self, transport: &mut T) -> Result<SessionStats, TransportError> {
        let mut stats = SessionStats::default();
        while transport.is_connected() {
            match self.exchange(transport) {
                Ok(Exchange::Resync) => stats.resyncs += 1,
                Ok(Exchange::Replied(header)) => {
                    stats.replies += 1;
                    if header.status != 0 {
                        stats.error_replies += 1;
                    }
                }
                Err(TransportError::Disconnected) => break,
                Err(e) => return Err(e),
            }
        }
        log::info!("Session ended: {}", stats);
        Ok(stats)
    }

    /// Receives one frame and sends its reply.
    pub fn exchange<T: Transport>(&mut self, transport: &mut T) -> Result<Exchange, TransportError> {
        let mut raw = [0; HEADER_SIZE];
        let received = transport.read_exact_timeout(&mut raw, self.config.read_timeout)?;
        if received == 0 || raw[0] == SYNC {
            log::trace!("Resync after {} header bytes", received);
            return Ok(Exchange::Resync);
        }

        let mut header = Header::decode(&raw);
        log::debug!("Request: {}", header);

        let mut errors = ErrorFlags::empty();
        if received < HEADER_SIZE {
            log::warn!("Header timed out after {} bytes", received);
            errors |= ErrorFlags::TIMEOUT;
        } else {
            errors |= self.receive_payload(transport, &mut header)?;
        }

        if errors.is_empty() {
            errors |= self.run_command(&mut header);
        }

        self.reply(transport, header, errors)
    }

    fn receive_payload<T: Transport>(
        &mut self,
        transport: &mut T,
        header: &mut Header,
    ) -> Result<ErrorFlags, TransportError> {
        let mut errors = ErrorFlags::empty();
        let length = header.request_length as usize;

        if length > BUFFER_SIZE {
            log::warn!("Request length {} exceeds {}", length, BUFFER_SIZE);
            errors |= ErrorFlags::LENGTH;
        } else {
            let payload = &mut self.buffer[..length];
            let received = transport.read_exact_timeout(payload, self.config.read_timeout)?;
            if received < length {
                log::warn!("Payload timed out after {} of {} bytes", received, length);
                errors |= ErrorFlags::TIMEOUT;
            }
            if !header.is_intact(&payload[..received]) {
                log::warn!(
                    "Checksum mismatch: got {:#06x}, expected {:#06x}",
                    header.checksum,
                    header.compute_checksum(&payload[..received])
                );
                errors |= ErrorFlags::CHECKSUM;
            }
            if header.address > ADDRESS_MASK {
                log::warn!("Address {:#06x} out of range", header.address);
                errors |= ErrorFlags::RANGE;
            }
        }

        if header.reply_length as usize > BUFFER_SIZE {
            log::debug!(
                "Clamping reply length {} to {}",
                header.reply_length,
                BUFFER_SIZE
            );
            header.reply_length = BUFFER_SIZE as u16;
        }
        Ok(errors)
    }

    fn run_command(&mut self, header: &mut Header) -> ErrorFlags {
        self.indicator.on();
        let result = dispatch(&mut self.bus, header, &mut self.buffer[..]);
        self.indicator.off();

        match result {
            Ok(length) => {
                header.reply_length = length;
                debug_assert!(
                    length as usize <= BUFFER_SIZE,
                    "dispatcher produced {} reply bytes",
                    length
                );
                if length as usize > BUFFER_SIZE {
                    log::error!("Reply length {} exceeds buffer", length);
                    return ErrorFlags::REPLY_LENGTH;
                }
                ErrorFlags::empty()
            }
            Err(e) => {
                log::warn!("{}", e);
                e.flags()
            }
        }
    }

    fn reply<T: Transport>(
        &mut self,
        transport: &mut T,
        mut header: Header,
        errors: ErrorFlags,
    ) -> Result<Exchange, TransportError> {
        if !errors.is_empty() {
            header.reply_length = 0;
        }
        header.status = errors.bits();

        let payload = &self.buffer[..header.reply_length as usize];
        header.seal(payload);
        log::debug!("Reply: {} ({:?})", header, errors);

        transport.write_all(&header.encode())?;
        transport.write_all(payload)?;
        Ok(Exchange::Replied(header))
    }
}

#[cfg(test)]
mod tests_frame;
