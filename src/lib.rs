// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multi-dialect RFID reader SDK.
//!
//! A Reader Session pairs one wire dialect ([`protocol::Dialect::General`],
//! [`protocol::Dialect::R2000`], [`protocol::Dialect::Uhf`] or
//! [`protocol::Dialect::M`]) with one [`transport::Transport`] (serial,
//! UDP or TCP client) and dispatches frames the dialect locates to an
//! application-supplied [`session::ReaderCallback`]. A single
//! [`mux::ReceiveMultiplexer`] drives every session's receive side from
//! one worker thread, selecting readiness for pollable transports and
//! polling serial ports on a timer.

pub mod checksum;
pub mod error;
#[macro_use]
pub mod logging;
pub mod mux;
pub mod protocol;
pub mod session;
pub mod status;
pub mod tlv;
pub mod transport;

pub use error::{Error, Result};
pub use mux::{session_handle, ReceiveMultiplexer, SessionHandle};
pub use protocol::{Dialect, LockType, MemoryBank};
pub use session::{NullCallback, ReaderCallback, ReaderSession, SessionConfig, SessionState};
pub use transport::{ConnectParams, ConnectStatus, Transport};
