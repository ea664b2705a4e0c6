// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCP client transport.
//!
//! `acquire` may block synchronously during `connect`; this only ever runs
//! on the caller's thread, never on the Receive Multiplexer's worker.

use super::ConnectStatus;
use crate::error::{Error, Result};
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TcpTransport {
    remote_addr: String,
    remote_port: u16,
    local_addr: Option<String>,
    local_port: Option<u16>,
    stream: Option<mio::net::TcpStream>,
    status: ConnectStatus,
}

impl TcpTransport {
    pub fn new(
        remote_addr: String,
        remote_port: u16,
        local_addr: Option<String>,
        local_port: Option<u16>,
    ) -> Self {
        TcpTransport {
            remote_addr,
            remote_port,
            local_addr,
            local_port,
            stream: None,
            status: ConnectStatus::Disconnected,
        }
    }

    pub fn local_addr_str(&self) -> &str {
        self.local_addr.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn local_port(&self) -> u16 {
        self.local_port.unwrap_or(0)
    }

    pub fn acquire(&mut self) -> Result<()> {
        let remote: SocketAddr = format!("{}:{}", self.remote_addr, self.remote_port)
            .parse()
            .map_err(|e| Error::TransportConfig(format!("invalid remote TCP endpoint: {e}")))?;

        let socket = Socket::new(Domain::for_address(remote), Type::STREAM, None)
            .map_err(|e| Error::TransportConfig(e.to_string()))?;

        if let (Some(addr), Some(port)) = (&self.local_addr, self.local_port) {
            let bind_addr: SocketAddr = format!("{addr}:{port}")
                .parse()
                .map_err(|e| Error::TransportConfig(format!("invalid local TCP endpoint: {e}")))?;
            socket
                .bind(&bind_addr.into())
                .map_err(|e| Error::TransportConfig(format!("tcp bind failed: {e}")))?;
        }

        log_debug!("tcp: connecting to {remote}");
        socket
            .connect_timeout(&remote.into(), CONNECT_TIMEOUT)
            .map_err(|e| Error::TransportConfig(format!("tcp connect failed: {e}")))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| Error::TransportConfig(e.to_string()))?;

        let std_stream: std::net::TcpStream = socket.into();
        self.stream = Some(mio::net::TcpStream::from_std(std_stream));
        self.status = ConnectStatus::Connected;
        log_info!("tcp: connected to {remote}");
        Ok(())
    }

    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        use std::io::Write;
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        stream.write_all(data)?;
        Ok(())
    }

    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        use std::io::Read;
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        match stream.read(buf) {
            Ok(0) => Err(Error::TransportIo(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "peer closed the connection",
            ))),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn release(&mut self) -> Result<()> {
        self.stream = None;
        self.status = ConnectStatus::Disconnected;
        Ok(())
    }

    pub fn status(&self) -> ConnectStatus {
        self.status
    }

    pub fn mio_source(&mut self) -> Option<&mut mio::net::TcpStream> {
        self.stream.as_mut()
    }
}
