// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport layer: one physical channel per Reader Session.
//!
//! Three variants share one capability set (acquire/send/recv/release);
//! serial is polled by the Receive Multiplexer on a timer, UDP and TCP
//! expose an `mio` readiness source and are registered with the
//! multiplexer's selector instead.

mod serial;
mod tcp;
mod udp;

pub use serial::SerialTransport;
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use crate::error::Result;

/// Connection lifecycle state shared by all transport variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    Disconnected,
    LocalResourceAcquired,
    Connected,
}

/// How a Reader Session should be connected; mirrors the configuration
/// surface's `connect_type` discriminant.
#[derive(Debug, Clone)]
pub enum ConnectParams {
    Serial { port_name: String, baud_rate: u32 },
    Udp { remote_addr: String, remote_port: u16, local_addr: Option<String>, local_port: Option<u16> },
    TcpClient { remote_addr: String, remote_port: u16, local_addr: Option<String>, local_port: Option<u16> },
    /// Reserved; always fails with `Error::Unsupported`.
    TcpServer,
}

/// One physical channel, owned exclusively by the Reader Session that
/// created it.
pub enum Transport {
    Serial(SerialTransport),
    Udp(UdpTransport),
    Tcp(TcpTransport),
}

impl Transport {
    pub fn connect(params: &ConnectParams) -> Result<Transport> {
        match params {
            ConnectParams::Serial { port_name, baud_rate } => {
                let mut t = SerialTransport::new(port_name.clone(), *baud_rate);
                t.acquire()?;
                Ok(Transport::Serial(t))
            }
            ConnectParams::Udp { remote_addr, remote_port, local_addr, local_port } => {
                let mut t = UdpTransport::new(
                    remote_addr.clone(),
                    *remote_port,
                    local_addr.clone(),
                    *local_port,
                );
                t.acquire()?;
                Ok(Transport::Udp(t))
            }
            ConnectParams::TcpClient { remote_addr, remote_port, local_addr, local_port } => {
                let mut t = TcpTransport::new(
                    remote_addr.clone(),
                    *remote_port,
                    local_addr.clone(),
                    *local_port,
                );
                t.acquire()?;
                Ok(Transport::Tcp(t))
            }
            ConnectParams::TcpServer => Err(crate::error::Error::Unsupported("tcp server transport")),
        }
    }

    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Transport::Serial(t) => t.send(data),
            Transport::Udp(t) => t.send(data),
            Transport::Tcp(t) => t.send(data),
        }
    }

    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Transport::Serial(t) => t.recv(buf),
            Transport::Udp(t) => t.recv(buf),
            Transport::Tcp(t) => t.recv(buf),
        }
    }

    pub fn release(&mut self) -> Result<()> {
        match self {
            Transport::Serial(t) => t.release(),
            Transport::Udp(t) => t.release(),
            Transport::Tcp(t) => t.release(),
        }
    }

    pub fn status(&self) -> ConnectStatus {
        match self {
            Transport::Serial(t) => t.status(),
            Transport::Udp(t) => t.status(),
            Transport::Tcp(t) => t.status(),
        }
    }

    /// A stable key identifying this transport's endpoint, used as the
    /// Reader Session's map key in the Receive Multiplexer.
    pub fn key(&self) -> String {
        match self {
            Transport::Serial(t) => t.port_name().to_string(),
            Transport::Udp(t) => format!("UDP:{}:{}", t.local_addr_str(), t.local_port()),
            Transport::Tcp(t) => format!("TCP:{}:{}", t.local_addr_str(), t.local_port()),
        }
    }

    /// Whether this transport can be registered with the multiplexer's
    /// `mio::Poll` selector (UDP, TCP) or must instead be polled on a
    /// timer (serial).
    pub fn is_pollable(&self) -> bool {
        !matches!(self, Transport::Serial(_))
    }

    /// The `mio` readiness source to register with the multiplexer's
    /// selector, or `None` for a serial transport (never pollable) or a
    /// source that implements `event::Source` differently per variant.
    pub fn mio_register(&mut self, registry: &mio::Registry, token: mio::Token) -> Result<()> {
        use mio::Interest;
        match self {
            Transport::Serial(_) => Err(crate::error::Error::Unsupported("serial transport is not pollable")),
            Transport::Udp(t) => {
                let source = t.mio_source().ok_or(crate::error::Error::NotConnected)?;
                registry.register(source, token, Interest::READABLE).map_err(Into::into)
            }
            Transport::Tcp(t) => {
                let source = t.mio_source().ok_or(crate::error::Error::NotConnected)?;
                registry.register(source, token, Interest::READABLE).map_err(Into::into)
            }
        }
    }

    /// Deregister this transport's `mio` source from `registry`. A no-op
    /// error for serial transports, which were never registered.
    pub fn mio_deregister(&mut self, registry: &mio::Registry) -> Result<()> {
        match self {
            Transport::Serial(_) => Ok(()),
            Transport::Udp(t) => match t.mio_source() {
                Some(source) => registry.deregister(source).map_err(Into::into),
                None => Ok(()),
            },
            Transport::Tcp(t) => match t.mio_source() {
                Some(source) => registry.deregister(source).map_err(Into::into),
                None => Ok(()),
            },
        }
    }
}
