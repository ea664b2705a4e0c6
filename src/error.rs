// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Mirrors the error taxonomy of the framing/dispatch core: configuration
//! failures surface from `connect`, I/O failures surface from commands or
//! flip a session to `Faulted`, and parse-layer failures never reach this
//! type at all — they are swallowed inside the frame codec's scan loop.

use std::fmt;

/// Errors surfaced by transports, reader sessions and the receive
/// multiplexer.
#[derive(Debug)]
pub enum Error {
    /// Bad port name, bad baud rate, or a bind/connect failure during
    /// `connect`.
    TransportConfig(String),
    /// A runtime send/recv failure on an already-connected transport.
    TransportIo(std::io::Error),
    /// A command was issued before `connect` or after the session
    /// transitioned to `Faulted`.
    NotConnected,
    /// The operation is not implemented by the chosen dialect.
    Unsupported(&'static str),
    /// Building a frame would exceed the fixed 128-byte send buffer.
    BufferOverflow { needed: usize, capacity: usize },
    /// Dispatch-side unexpected failure; the session continues running.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TransportConfig(msg) => write!(f, "transport configuration error: {msg}"),
            Error::TransportIo(err) => write!(f, "transport I/O error: {err}"),
            Error::NotConnected => write!(f, "session is not connected"),
            Error::Unsupported(op) => write!(f, "operation not supported by this dialect: {op}"),
            Error::BufferOverflow { needed, capacity } => write!(
                f,
                "send buffer overflow: frame needs {needed} bytes, capacity is {capacity}"
            ),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::TransportIo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::TransportIo(err)
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
