//! Blocking half-duplex UART handle.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::{Error, Result};

/// A single-owner UART handle. Implementors must deliver bytes in
/// transmission order and treat a read timeout as "no bytes available"
/// rather than an error.
pub trait SerialPort {
    /// Blocks up to `timeout` for at least one byte, then returns whatever
    /// is currently available. Returns an empty vector on timeout.
    fn read_ready(&mut self, timeout: Duration) -> Result<Vec<u8>>;

    /// Blocking write that guarantees in-order delivery of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Production serial port, backed by the OS UART device at `path`,
/// configured 8N1 with no hardware flow control.
pub struct RealSerialPort {
    inner: Box<dyn serialport::SerialPort>,
}

impl RealSerialPort {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let inner = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(50))
            .open()?;
        Ok(Self { inner })
    }
}

impl SerialPort for RealSerialPort {
    fn read_ready(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.inner.set_timeout(timeout)?;
        let mut buf = [0u8; 1024];
        match self.inner.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(Error::Io)
    }
}
