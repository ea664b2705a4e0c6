// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reader Session: pairs one wire dialect with one [`Transport`] and
//! dispatches frames the dialect's `scan` locates to an application-
//! supplied [`ReaderCallback`].
//!
//! Unlike the reference SDK, which models each dialect as its own reader
//! class implementing a shared abstract base, every dialect here is one
//! variant of [`DialectCodec`] and every inbound frame is routed through
//! a small command-code lookup table into one unified callback trait —
//! the dispatch-table replaces the old per-dialect `isinstance` chain.

use crate::error::{Error, Result};
use crate::protocol::general::{self, GeneralCodec};
use crate::protocol::m_dialect::{self, MCodec};
use crate::protocol::r2000::{self, R2000Codec};
use crate::protocol::uhf::{self, CommandType, UhfCodec};
use crate::protocol::{Dialect, LockType, MemoryBank, ScanMatch, RECV_BUFFER_SIZE};
use crate::status::language;
use crate::transport::{ConnectParams, Transport};

/// Capability set an application implements to receive reader events.
/// Every method defaults to doing nothing; override only the
/// notifications the application cares about. Each receives the raw
/// frame bytes located by the dialect's `scan`, the frame's offset
/// within the scan buffer, and the session's transport key so a
/// callback shared across sessions can tell them apart.
pub trait ReaderCallback: Send {
    fn notify_recv_tags(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_start_inventory(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_stop_inventory(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_reset(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_read_tag_block(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_write_tag_block(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_lock_tag(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_kill_tag(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_inventory_once(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_query_muti_param(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_set_muti_param(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
    fn notify_relay_operation(&mut self, key: &str, frame: &[u8], offset: usize) {
        let _ = (key, frame, offset);
    }
}

/// A callback that ignores every notification; the default until an
/// application installs its own via [`ReaderSession::set_callback`].
#[derive(Default)]
pub struct NullCallback;

impl ReaderCallback for NullCallback {}

/// Reader Session lifecycle. Distinct from the transport's own
/// `ConnectStatus`: a session becomes `Faulted` on a recv failure and
/// stays there until the caller releases and reconnects, even though
/// the underlying transport object is simply gone by that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Faulted,
}

/// Which notification slot a dispatched frame maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifySlot {
    RecvTags,
    StartInventory,
    StopInventory,
    Reset,
    ReadTagBlock,
    WriteTagBlock,
    LockTag,
    KillTag,
    InventoryOnce,
    QueryMutiParam,
    SetMutiParam,
    RelayOperation,
}

impl NotifySlot {
    fn dispatch(self, cb: &mut dyn ReaderCallback, key: &str, frame: &[u8], offset: usize) {
        match self {
            NotifySlot::RecvTags => cb.notify_recv_tags(key, frame, offset),
            NotifySlot::StartInventory => cb.notify_start_inventory(key, frame, offset),
            NotifySlot::StopInventory => cb.notify_stop_inventory(key, frame, offset),
            NotifySlot::Reset => cb.notify_reset(key, frame, offset),
            NotifySlot::ReadTagBlock => cb.notify_read_tag_block(key, frame, offset),
            NotifySlot::WriteTagBlock => cb.notify_write_tag_block(key, frame, offset),
            NotifySlot::LockTag => cb.notify_lock_tag(key, frame, offset),
            NotifySlot::KillTag => cb.notify_kill_tag(key, frame, offset),
            NotifySlot::InventoryOnce => cb.notify_inventory_once(key, frame, offset),
            NotifySlot::QueryMutiParam => cb.notify_query_muti_param(key, frame, offset),
            NotifySlot::SetMutiParam => cb.notify_set_muti_param(key, frame, offset),
            NotifySlot::RelayOperation => cb.notify_relay_operation(key, frame, offset),
        }
    }
}

fn general_slot(command: u8) -> Option<NotifySlot> {
    match command {
        general::CMD_NOTIFY_TAG => Some(NotifySlot::RecvTags),
        general::CMD_IDENTIFY_TAG => Some(NotifySlot::InventoryOnce),
        general::CMD_STOP_INVENTORY => Some(NotifySlot::StopInventory),
        general::CMD_RESET_DEVICE => Some(NotifySlot::Reset),
        general::CMD_READ_TAG_BLOCK => Some(NotifySlot::ReadTagBlock),
        general::CMD_WRITE_TAG_BLOCK => Some(NotifySlot::WriteTagBlock),
        general::CMD_LOCK_TAG => Some(NotifySlot::LockTag),
        general::CMD_KILL_TAG => Some(NotifySlot::KillTag),
        general::CMD_QUERY_SINGLE_PARAM | general::CMD_QUERY_MUTI_PARAM => Some(NotifySlot::QueryMutiParam),
        general::CMD_SET_MUTI_PARAM => Some(NotifySlot::SetMutiParam),
        _ => None,
    }
}

fn r2000_slot(command: u8) -> Option<NotifySlot> {
    match command {
        r2000::CMD_TAG_NOTIFY => Some(NotifySlot::RecvTags),
        r2000::CMD_START_INVENTORY => Some(NotifySlot::StartInventory),
        r2000::CMD_STOP_INVENTORY => Some(NotifySlot::StopInventory),
        r2000::CMD_RESET_DEVICE => Some(NotifySlot::Reset),
        r2000::CMD_READ_TAG_BLOCK => Some(NotifySlot::ReadTagBlock),
        r2000::CMD_WRITE_TAG_BLOCK => Some(NotifySlot::WriteTagBlock),
        r2000::CMD_LOCK_TAG => Some(NotifySlot::LockTag),
        r2000::CMD_KILL_TAG => Some(NotifySlot::KillTag),
        _ => None,
    }
}

fn uhf_slot(command: u8) -> Option<NotifySlot> {
    if command == uhf::NOTIFY_TAGS_UPLOADED {
        return Some(NotifySlot::RecvTags);
    }
    match CommandType::from(command) {
        CommandType::Reset => Some(NotifySlot::Reset),
        CommandType::StartInventory => Some(NotifySlot::StartInventory),
        CommandType::StopInventory => Some(NotifySlot::StopInventory),
        CommandType::InventoryOnce => Some(NotifySlot::InventoryOnce),
        CommandType::ReadTag => Some(NotifySlot::ReadTagBlock),
        CommandType::WriteTag => Some(NotifySlot::WriteTagBlock),
        CommandType::LockTag => Some(NotifySlot::LockTag),
        CommandType::KillTag => Some(NotifySlot::KillTag),
        _ => None,
    }
}

fn m_slot(frame_type: u8, command: u8) -> Option<NotifySlot> {
    if frame_type == m_dialect::FRAME_TYPE_NOTIFICATION && command == m_dialect::NOTIFY_RECV_TAGS {
        return Some(NotifySlot::RecvTags);
    }
    match command {
        m_dialect::CMD_RESET => Some(NotifySlot::Reset),
        m_dialect::CMD_START_INVENTORY => Some(NotifySlot::StartInventory),
        m_dialect::CMD_STOP_INVENTORY => Some(NotifySlot::StopInventory),
        m_dialect::CMD_INVENTORY_ONCE => Some(NotifySlot::InventoryOnce),
        m_dialect::CMD_RELAY_OPERATION => Some(NotifySlot::RelayOperation),
        _ => None,
    }
}

/// The active wire dialect's codec, carrying whatever per-dialect wire
/// identity it needs (R2000's two-byte reader id, UHF/M's 16-bit
/// device address) alongside the codec state.
enum DialectCodec {
    General(GeneralCodec),
    R2000(R2000Codec),
    Uhf { codec: UhfCodec, address: u16 },
    M { codec: MCodec, address: u16 },
}

impl DialectCodec {
    fn dialect(&self) -> Dialect {
        match self {
            DialectCodec::General(_) => Dialect::General,
            DialectCodec::R2000(_) => Dialect::R2000,
            DialectCodec::Uhf { .. } => Dialect::Uhf,
            DialectCodec::M { .. } => Dialect::M,
        }
    }

    fn scan(&self, buf: &[u8]) -> Vec<ScanMatch> {
        match self {
            DialectCodec::General(_) => GeneralCodec::scan(buf),
            DialectCodec::R2000(_) => R2000Codec::scan(buf),
            DialectCodec::Uhf { .. } => UhfCodec::scan(buf),
            DialectCodec::M { .. } => MCodec::scan(buf),
        }
    }
}

/// Everything needed to give a [`ReaderSession`] its wire identity and
/// connect it. `reader_id` is read only by the R2000 dialect; `address`
/// only by UHF and M. No file or environment config loader exists —
/// applications build this directly or read values from their own
/// configuration surface.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub dialect: Dialect,
    pub connect: ConnectParams,
    pub reader_id: [u8; 2],
    pub address: u16,
    pub language: String,
}

impl SessionConfig {
    pub fn new(dialect: Dialect, connect: ConnectParams) -> Self {
        SessionConfig {
            dialect,
            connect,
            reader_id: [0, 0],
            address: 0,
            language: language::ENGLISH.to_string(),
        }
    }

    pub fn with_reader_id(mut self, reader_id: [u8; 2]) -> Self {
        self.reader_id = reader_id;
        self
    }

    pub fn with_address(mut self, address: u16) -> Self {
        self.address = address;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// One physical reader: a dialect codec, a transport acquired at
/// `connect` and released at `release`, a fixed 1024-byte receive
/// buffer, and a callback the Receive Multiplexer drives as frames
/// arrive. `key` is empty until the first successful `connect` and
/// stable afterward — it is the transport's own key, which is only
/// known once local resources (a bound socket, an opened port) exist.
pub struct ReaderSession {
    key: String,
    dialect: DialectCodec,
    connect_params: ConnectParams,
    transport: Option<Transport>,
    state: SessionState,
    recv_buf: Box<[u8]>,
    recv_len: usize,
    callback: Box<dyn ReaderCallback>,
    language: String,
}

impl ReaderSession {
    pub fn new(config: SessionConfig) -> Self {
        let dialect = match config.dialect {
            Dialect::General => DialectCodec::General(GeneralCodec::new()),
            Dialect::R2000 => DialectCodec::R2000(R2000Codec::new(config.reader_id)),
            Dialect::Uhf => DialectCodec::Uhf { codec: UhfCodec::new(), address: config.address },
            Dialect::M => DialectCodec::M { codec: MCodec::new(), address: config.address },
        };
        ReaderSession {
            key: String::new(),
            dialect,
            connect_params: config.connect,
            transport: None,
            state: SessionState::Disconnected,
            recv_buf: vec![0u8; RECV_BUFFER_SIZE].into_boxed_slice(),
            recv_len: 0,
            callback: Box::new(NullCallback),
            language: config.language,
        }
    }

    pub fn set_callback(&mut self, callback: Box<dyn ReaderCallback>) {
        self.callback = callback;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect.dialect()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Whether this session's transport can be registered with the
    /// Receive Multiplexer's `mio::Poll` selector, or must instead be
    /// polled on a timer. `None` before the first successful connect.
    pub fn is_pollable(&self) -> Option<bool> {
        self.transport.as_ref().map(Transport::is_pollable)
    }

    /// Register this session's transport with the Receive Multiplexer's
    /// `mio::Poll` selector under `token`. Only valid for UDP/TCP
    /// sessions; serial sessions are polled on a timer instead.
    pub fn register_with(&mut self, registry: &mio::Registry, token: mio::Token) -> Result<()> {
        self.transport.as_mut().ok_or(Error::NotConnected)?.mio_register(registry, token)
    }

    /// Deregister this session's transport from `registry`, best-effort.
    pub fn deregister_from(&mut self, registry: &mio::Registry) -> Result<()> {
        self.transport.as_mut().ok_or(Error::NotConnected)?.mio_deregister(registry)
    }

    /// Acquire the configured transport and move to `Connected`. Safe to
    /// call again after `release` to reconnect with the same parameters.
    pub fn connect(&mut self) -> Result<()> {
        let transport = Transport::connect(&self.connect_params)?;
        self.key = transport.key();
        self.transport = Some(transport);
        self.recv_len = 0;
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Release the transport and move to `Disconnected`, from either
    /// `Connected` or `Faulted`.
    pub fn release(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            transport.release()?;
        }
        self.state = SessionState::Disconnected;
        self.recv_len = 0;
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.state {
            SessionState::Connected => Ok(()),
            SessionState::Disconnected | SessionState::Faulted => Err(Error::NotConnected),
        }
    }

    fn send_frame(&mut self, frame: Vec<u8>) -> Result<()> {
        self.ensure_connected()?;
        let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
        transport.send(&frame)
    }

    /// Start continuous inventory. Unsupported by the General dialect,
    /// which has no wire command for it — matches the reference SDK's
    /// `GeneralReader.inventory()`, which sends nothing at all.
    pub fn inventory(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(_) => {
                return Err(Error::Unsupported("inventory: General dialect has no continuous-inventory command"))
            }
            DialectCodec::R2000(c) => c.build_start_inventory()?.to_vec(),
            DialectCodec::Uhf { codec, address } => codec.build_start_inventory(*address)?.to_vec(),
            DialectCodec::M { codec, address } => codec.build_start_inventory(*address)?.to_vec(),
        };
        self.send_frame(frame)
    }

    /// Single-shot inventory. Unsupported by R2000, which the reference
    /// SDK reports as "does not support" and returns early without
    /// sending anything.
    pub fn inventory_once(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_inventory_once()?.to_vec(),
            DialectCodec::R2000(_) => {
                return Err(Error::Unsupported("inventory_once: not supported by the R2000 dialect"))
            }
            DialectCodec::Uhf { codec, address } => codec.build_inventory_once(*address)?.to_vec(),
            DialectCodec::M { codec, address } => codec.build_inventory_once(*address)?.to_vec(),
        };
        self.send_frame(frame)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_stop_inventory()?.to_vec(),
            DialectCodec::R2000(c) => c.build_stop_inventory()?.to_vec(),
            DialectCodec::Uhf { codec, address } => codec.build_stop_inventory(*address)?.to_vec(),
            DialectCodec::M { codec, address } => codec.build_stop_inventory(*address)?.to_vec(),
        };
        self.send_frame(frame)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_reset()?.to_vec(),
            DialectCodec::R2000(c) => c.build_reset()?.to_vec(),
            DialectCodec::Uhf { codec, address } => codec.build_reset(*address)?.to_vec(),
            DialectCodec::M { codec, address } => codec.build_reset(*address)?.to_vec(),
        };
        self.send_frame(frame)
    }

    /// Read a block of tag memory. Unsupported by R2000 and M, which
    /// the reference SDK implements as no-ops that never reach the wire.
    pub fn read_tag_block(&mut self, bank: MemoryBank, word_addr: u16, word_count: u16) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_read_tag_block(bank, word_addr as u8, word_count as u8)?.to_vec(),
            DialectCodec::R2000(_) => {
                return Err(Error::Unsupported("read_tag_block: not supported by the R2000 dialect"))
            }
            DialectCodec::Uhf { codec, address } => codec.build_read_tag(*address, bank, word_addr, word_count)?.to_vec(),
            DialectCodec::M { .. } => return Err(Error::Unsupported("read_tag_block: not supported by the M dialect")),
        };
        self.send_frame(frame)
    }

    /// Write a block of tag memory. `data` must be word-aligned for the
    /// UHF dialect and hold exactly `word_count * 2` bytes for General.
    /// Unsupported by R2000 and M.
    pub fn write_tag_block(&mut self, bank: MemoryBank, word_addr: u16, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => {
                let word_count = (data.len() / 2) as u8;
                c.build_write_tag_block(bank, word_addr as u8, word_count, data)?.to_vec()
            }
            DialectCodec::R2000(_) => {
                return Err(Error::Unsupported("write_tag_block: not supported by the R2000 dialect"))
            }
            DialectCodec::Uhf { codec, address } => codec.build_write_tag(*address, bank, word_addr, data)?.to_vec(),
            DialectCodec::M { .. } => return Err(Error::Unsupported("write_tag_block: not supported by the M dialect")),
        };
        self.send_frame(frame)
    }

    /// Lock a tag memory bank. Unsupported by R2000 and M.
    pub fn lock_tag(&mut self, lock_type: LockType) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_lock_tag(lock_type)?.to_vec(),
            DialectCodec::R2000(_) => return Err(Error::Unsupported("lock_tag: not supported by the R2000 dialect")),
            DialectCodec::Uhf { codec, address } => codec.build_lock_tag(*address, lock_type)?.to_vec(),
            DialectCodec::M { .. } => return Err(Error::Unsupported("lock_tag: not supported by the M dialect")),
        };
        self.send_frame(frame)
    }

    /// Permanently kill a tag with a zero access/kill password, matching
    /// the reference SDK's default. Unsupported by R2000 and M.
    pub fn kill_tag(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_kill_tag()?.to_vec(),
            DialectCodec::R2000(_) => return Err(Error::Unsupported("kill_tag: not supported by the R2000 dialect")),
            DialectCodec::Uhf { codec, address } => codec.build_kill_tag(*address)?.to_vec(),
            DialectCodec::M { .. } => return Err(Error::Unsupported("kill_tag: not supported by the M dialect")),
        };
        self.send_frame(frame)
    }

    /// Query one or more reader parameters. General-only: the TLV-based
    /// dialects configure through `GetConfig`/`SetConfig` commands
    /// instead, which this SDK does not expose as a session operation.
    pub fn query_muti_param(&mut self, mem_address: u8, query_len: u8) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_query_muti_param(mem_address, query_len)?.to_vec(),
            _ => return Err(Error::Unsupported("query_muti_param: only supported by the General dialect")),
        };
        self.send_frame(frame)
    }

    /// Set one or more reader parameters. General-only; see
    /// [`Self::query_muti_param`].
    pub fn set_muti_param(&mut self, mem_address: u8, params: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::General(c) => c.build_set_muti_param(mem_address, params)?.to_vec(),
            _ => return Err(Error::Unsupported("set_muti_param: only supported by the General dialect")),
        };
        self.send_frame(frame)
    }

    /// Drive a relay for `time` units. `mask` bit 0 selects relay 1, bit
    /// 1 selects relay 2; both may be set at once. M-only.
    pub fn relay_operation(&mut self, mask: u8, op: u8, time: u8) -> Result<()> {
        self.ensure_connected()?;
        let frame = match &mut self.dialect {
            DialectCodec::M { codec, address } => codec.build_relay_operation(*address, mask, op, time)?.to_vec(),
            _ => return Err(Error::Unsupported("relay_operation: only supported by the M dialect")),
        };
        self.send_frame(frame)
    }

    /// Append newly received bytes to the receive buffer, scan for
    /// complete frames, dispatch each to the callback, and compact any
    /// leftover partial frame to the front of the buffer. Called by the
    /// Receive Multiplexer after it polls this session's transport.
    pub fn handle_recv(&mut self, new_bytes: &[u8]) -> Result<()> {
        if new_bytes.is_empty() {
            return Ok(());
        }
        let capacity = self.recv_buf.len();
        let new_bytes = if new_bytes.len() > capacity {
            // A single chunk bigger than the whole receive buffer can
            // never be appended; keep only its most recent `capacity`
            // bytes; a frame starting any earlier was already unrecoverable.
            &new_bytes[new_bytes.len() - capacity..]
        } else {
            new_bytes
        };
        if self.recv_len + new_bytes.len() > capacity {
            // A session this far out of sync resyncs faster by dropping
            // the stale buffer and waiting for the next start token than
            // by growing without bound.
            self.recv_len = 0;
        }
        let end = self.recv_len + new_bytes.len();
        self.recv_buf[self.recv_len..end].copy_from_slice(new_bytes);
        self.recv_len = end;

        let matches = self.dialect.scan(&self.recv_buf[..self.recv_len]);

        let mut dispatches = Vec::with_capacity(matches.len());
        let mut consumed = 0usize;
        for m in &matches {
            let frame = self.recv_buf[m.offset..m.offset + m.frame_len].to_vec();
            let slot = match &self.dialect {
                DialectCodec::General(_) => general_slot(m.command),
                DialectCodec::R2000(_) => r2000_slot(m.command),
                DialectCodec::Uhf { .. } => uhf_slot(m.command),
                DialectCodec::M { .. } => m_slot(frame[2], m.command),
            };
            if let Some(slot) = slot {
                dispatches.push((slot, m.offset, frame));
            }
            consumed = m.offset + m.frame_len;
        }
        if consumed > 0 {
            self.recv_buf.copy_within(consumed..self.recv_len, 0);
            self.recv_len -= consumed;
        }

        for (slot, offset, frame) in dispatches {
            slot.dispatch(self.callback.as_mut(), &self.key, &frame, offset);
        }
        Ok(())
    }

    /// Drain everything currently available on the transport and
    /// dispatch it. A recv error (not a zero-byte "nothing right now")
    /// faults the session; send failures never do, per the reference
    /// SDK's failure semantics.
    pub fn poll_transport(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let mut chunk = [0u8; 512];
        loop {
            let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
            match transport.recv(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => self.handle_recv(&chunk[..n])?,
                Err(e) => {
                    self.state = SessionState::Faulted;
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ConnectParams;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingCallback {
        recv_tags: Arc<AtomicUsize>,
        reset: Arc<AtomicUsize>,
    }

    impl ReaderCallback for CountingCallback {
        fn notify_recv_tags(&mut self, _key: &str, _frame: &[u8], _offset: usize) {
            self.recv_tags.fetch_add(1, Ordering::SeqCst);
        }
        fn notify_reset(&mut self, _key: &str, _frame: &[u8], _offset: usize) {
            self.reset.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn loopback_config(dialect: Dialect) -> SessionConfig {
        SessionConfig::new(
            dialect,
            ConnectParams::Udp {
                remote_addr: "127.0.0.1".into(),
                remote_port: 19001,
                local_addr: Some("127.0.0.1".into()),
                local_port: None,
            },
        )
    }

    #[test]
    fn new_session_starts_disconnected() {
        let session = ReaderSession::new(loopback_config(Dialect::Uhf));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.key(), "");
    }

    #[test]
    fn commands_before_connect_fail_not_connected() {
        let mut session = ReaderSession::new(loopback_config(Dialect::Uhf));
        assert!(matches!(session.inventory(), Err(Error::NotConnected)));
        assert!(matches!(session.reset(), Err(Error::NotConnected)));
    }

    #[test]
    fn general_dialect_rejects_continuous_inventory() {
        let mut session = ReaderSession::new(loopback_config(Dialect::General));
        session.connect().unwrap();
        assert!(matches!(session.inventory(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn r2000_dialect_rejects_tag_memory_ops() {
        let mut session = ReaderSession::new(
            SessionConfig::new(
                Dialect::R2000,
                ConnectParams::Udp {
                    remote_addr: "127.0.0.1".into(),
                    remote_port: 19002,
                    local_addr: Some("127.0.0.1".into()),
                    local_port: None,
                },
            )
            .with_reader_id([0x01, 0x02]),
        );
        session.connect().unwrap();
        assert!(matches!(session.inventory_once(), Err(Error::Unsupported(_))));
        assert!(matches!(session.read_tag_block(MemoryBank::User, 0, 1), Err(Error::Unsupported(_))));
        assert!(matches!(session.lock_tag(LockType::All), Err(Error::Unsupported(_))));
        assert!(matches!(session.kill_tag(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn m_dialect_rejects_tag_memory_ops_but_allows_relay() {
        let mut session = ReaderSession::new(loopback_config(Dialect::M).with_address(7));
        session.connect().unwrap();
        assert!(matches!(session.read_tag_block(MemoryBank::User, 0, 1), Err(Error::Unsupported(_))));
        session.relay_operation(0b01, 1, 5).unwrap();
    }

    #[test]
    fn release_then_reconnect_resets_state_and_buffer() {
        let mut session = ReaderSession::new(loopback_config(Dialect::Uhf).with_address(1));
        session.connect().unwrap();
        session.handle_recv(&[0xAA]).unwrap(); // partial noise, left in the buffer
        session.release().unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect().unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert!(matches!(session.inventory_once(), Ok(())));
    }

    #[test]
    fn handle_recv_does_not_panic_on_a_chunk_larger_than_the_receive_buffer() {
        let mut session = ReaderSession::new(loopback_config(Dialect::Uhf).with_address(1));
        session.connect().unwrap();
        let oversized = vec![0xAAu8; RECV_BUFFER_SIZE + 64];
        assert!(session.handle_recv(&oversized).is_ok());
        assert!(session.recv_len <= RECV_BUFFER_SIZE);
    }

    #[test]
    fn handle_recv_dispatches_uhf_tag_notification_and_compacts_buffer() {
        let counts = Arc::new(AtomicUsize::new(0));
        let mut session = ReaderSession::new(loopback_config(Dialect::Uhf).with_address(0));
        session.connect().unwrap();
        session.set_callback(Box::new(CountingCallback { recv_tags: counts.clone(), ..Default::default() }));

        let mut codec = UhfCodec::new();
        codec.build_header(uhf::FRAME_TYPE_NOTIFICATION, 0, CommandType::Unknown(uhf::NOTIFY_TAGS_UPLOADED));
        let frame = codec.finalize().unwrap().to_vec();

        let mut buf = frame.clone();
        buf.push(0xAA); // trailing partial noise must survive compaction
        session.handle_recv(&buf).unwrap();

        assert_eq!(counts.load(Ordering::SeqCst), 1);
        assert_eq!(session.recv_len, 1);
    }

    #[test]
    fn handle_recv_dispatches_m_reset_by_frame_type_and_command() {
        let counts = Arc::new(AtomicUsize::new(0));
        let mut session = ReaderSession::new(loopback_config(Dialect::M).with_address(3));
        session.connect().unwrap();
        session.set_callback(Box::new(CountingCallback { reset: counts.clone(), ..Default::default() }));

        let mut codec = MCodec::new();
        let frame = codec.build_reset(3).unwrap().to_vec();
        session.handle_recv(&frame).unwrap();

        assert_eq!(counts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poll_transport_before_connect_is_not_connected() {
        let mut session = ReaderSession::new(loopback_config(Dialect::General));
        assert!(matches!(session.poll_transport(), Err(Error::NotConnected)));
    }
}
