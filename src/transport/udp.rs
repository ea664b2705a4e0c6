// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP datagram transport.

use super::ConnectStatus;
use crate::error::{Error, Result};
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;

pub struct UdpTransport {
    remote_addr: String,
    remote_port: u16,
    local_addr: Option<String>,
    local_port: Option<u16>,
    socket: Option<mio::net::UdpSocket>,
    status: ConnectStatus,
}

impl UdpTransport {
    pub fn new(
        remote_addr: String,
        remote_port: u16,
        local_addr: Option<String>,
        local_port: Option<u16>,
    ) -> Self {
        UdpTransport {
            remote_addr,
            remote_port,
            local_addr,
            local_port,
            socket: None,
            status: ConnectStatus::Disconnected,
        }
    }

    pub fn local_addr_str(&self) -> &str {
        self.local_addr.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn local_port(&self) -> u16 {
        self.local_port.unwrap_or(0)
    }

    fn remote_socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.remote_addr, self.remote_port)
            .parse()
            .map_err(|e| Error::TransportConfig(format!("invalid remote UDP endpoint: {e}")))
    }

    pub fn acquire(&mut self) -> Result<()> {
        let bind_addr: SocketAddr = match (&self.local_addr, self.local_port) {
            (Some(addr), Some(port)) => format!("{addr}:{port}")
                .parse()
                .map_err(|e| Error::TransportConfig(format!("invalid local UDP endpoint: {e}")))?,
            _ => "0.0.0.0:0".parse().expect("static bind-any address is valid"),
        };

        log_debug!("udp: binding {bind_addr}");
        let socket = Socket::new(Domain::for_address(bind_addr), Type::DGRAM, None)
            .map_err(|e| Error::TransportConfig(e.to_string()))?;
        socket
            .bind(&bind_addr.into())
            .map_err(|e| Error::TransportConfig(format!("udp bind failed: {e}")))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| Error::TransportConfig(e.to_string()))?;

        let remote = self.remote_socket_addr()?;
        let std_socket: std::net::UdpSocket = socket.into();
        std_socket
            .connect(remote)
            .map_err(|e| Error::TransportConfig(format!("udp connect failed: {e}")))?;

        self.socket = Some(mio::net::UdpSocket::from_std(std_socket));
        self.status = ConnectStatus::Connected;
        log_info!("udp: connected to {remote}");
        Ok(())
    }

    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        socket.send(data)?;
        Ok(())
    }

    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        match socket.recv(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn release(&mut self) -> Result<()> {
        self.socket = None;
        self.status = ConnectStatus::Disconnected;
        Ok(())
    }

    pub fn status(&self) -> ConnectStatus {
        self.status
    }

    /// The `mio` readiness source to register with the multiplexer's
    /// selector.
    pub fn mio_source(&mut self) -> Option<&mut mio::net::UdpSocket> {
        self.socket.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_uses_local_endpoint() {
        let t = UdpTransport::new("127.0.0.1".into(), 9000, Some("127.0.0.1".into()), Some(5000));
        assert_eq!(t.local_addr_str(), "127.0.0.1");
        assert_eq!(t.local_port(), 5000);
    }

    #[test]
    fn unset_local_endpoint_defaults_to_bind_any() {
        let t = UdpTransport::new("127.0.0.1".into(), 9000, None, None);
        assert_eq!(t.local_addr_str(), "0.0.0.0");
        assert_eq!(t.local_port(), 0);
    }

    #[test]
    fn recv_before_acquire_is_not_connected() {
        let mut t = UdpTransport::new("127.0.0.1".into(), 9000, None, None);
        let mut buf = [0u8; 16];
        assert!(matches!(t.recv(&mut buf), Err(Error::NotConnected)));
    }
}
