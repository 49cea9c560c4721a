use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::protocol::header::Header;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Host disconnected")]
    Disconnected,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Byte stream to the host.
pub trait Transport {
    /// Fills `buf` or gives up once `timeout` elapses, returning how many bytes arrived.
    fn read_exact_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError>;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;
}

pub struct TcpTransport {
    stream: TcpStream,
    connected: bool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Result<Self, TransportError> {
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            connected: true,
        })
    }
}

impl Transport for TcpTransport {
    fn read_exact_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut filled = 0;
        while filled < buf.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.stream.set_read_timeout(Some(deadline - now))?;
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.connected = false;
                    if filled == 0 {
                        return Err(TransportError::Disconnected);
                    }
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    break
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.connected = false;
                    return Err(e.into());
                }
            }
        }
        Ok(filled)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        Write::write_all(&mut self.stream, buf).map_err(|e| {
            self.connected = false;
            TransportError::from(e)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Bytes(Vec<u8>),
    /// The host goes quiet long enough for the pending read to time out.
    Stall,
}

/// In-memory transport playing back a fixed script, then hanging up.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: VecDeque<Chunk>,
    written: Vec<u8>,
    connected: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            written: Vec::new(),
            connected: true,
        }
    }

    pub fn push_frame(&mut self, header: &Header, payload: &[u8]) -> &mut Self {
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(payload);
        self.push_bytes(&bytes)
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.script.push_back(Chunk::Bytes(bytes.to_vec()));
        self
    }

    pub fn push_stall(&mut self) -> &mut Self {
        self.script.push_back(Chunk::Stall);
        self
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ScriptedTransport {
    fn read_exact_timeout(
        &mut self,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.script.pop_front() {
                Some(Chunk::Bytes(mut bytes)) => {
                    let n = bytes.len().min(buf.len() - filled);
                    buf[filled..filled + n].copy_from_slice(&bytes[..n]);
                    filled += n;
                    if n < bytes.len() {
                        self.script.push_front(Chunk::Bytes(bytes.split_off(n)));
                    }
                }
                Some(Chunk::Stall) => break,
                None => {
                    self.connected = false;
                    if filled == 0 {
                        return Err(TransportError::Disconnected);
                    }
                    break;
                }
            }
        }
        Ok(filled)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        self.written.extend_from_slice(buf);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
