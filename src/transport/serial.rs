// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serial port transport.
//!
//! Not selectable by an OS readiness mechanism; the Receive Multiplexer
//! polls [`SerialTransport::bytes_available`] on a timer instead of
//! registering a handle with its `mio::Poll` selector.

use super::ConnectStatus;
use crate::error::{Error, Result};
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_millis(500);

pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn serialport::SerialPort>>,
    status: ConnectStatus,
}

impl SerialTransport {
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        SerialTransport {
            port_name,
            baud_rate,
            port: None,
            status: ConnectStatus::Disconnected,
        }
    }

    /// Enumerate serial ports visible to the OS, restoring the reference
    /// SDK's `find_port()` convenience as a read-only introspection helper.
    pub fn available_ports() -> Result<Vec<String>> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .map_err(|e| Error::TransportConfig(e.to_string()))
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn acquire(&mut self) -> Result<()> {
        log_debug!("serial: opening {} at {} baud", self.port_name, self.baud_rate);
        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| Error::TransportConfig(e.to_string()))?;
        self.port = Some(port);
        self.status = ConnectStatus::Connected;
        Ok(())
    }

    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        use std::io::Write;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    /// Number of bytes the OS currently has buffered for this port,
    /// polled by the multiplexer before issuing a coalescing sleep.
    pub fn bytes_available(&self) -> Result<usize> {
        let port = self.port.as_ref().ok_or(Error::NotConnected)?;
        Ok(port.bytes_to_read()? as usize)
    }

    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        let available = port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(0);
        }
        use std::io::Read;
        let to_read = available.min(buf.len());
        match port.read(&mut buf[..to_read]) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn release(&mut self) -> Result<()> {
        self.port = None;
        self.status = ConnectStatus::Disconnected;
        Ok(())
    }

    pub fn status(&self) -> ConnectStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_rejects_a_path_that_is_not_a_serial_device() {
        // A real filesystem path the OS will happily open as a file, but
        // never as a tty: proves `acquire` surfaces the platform's open
        // failure as `TransportConfig` rather than panicking or hanging.
        let file = tempfile::NamedTempFile::new().expect("create temp file");
        let path = file.path().to_string_lossy().to_string();

        let mut transport = SerialTransport::new(path, 9600);
        let err = transport.acquire().unwrap_err();
        assert!(matches!(err, Error::TransportConfig(_)));
        assert_eq!(transport.status(), ConnectStatus::Disconnected);
    }
}
