// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame codecs: one per wire dialect.
//!
//! Every dialect's `scan` follows the same six-step skeleton described in
//! the framing design (start-token search, length read, truncation check,
//! checksum verify, emit-and-advance or skip-one-and-resync) over
//! dialect-specific constants; each dialect module implements it directly
//! rather than through a shared generic, since the envelope shapes differ
//! enough (header width, reader-id, TLV payload) that a one-size abstraction
//! would cost more than it saves.

pub mod general;
pub mod m_dialect;
pub mod r2000;
pub mod uhf;

/// Which wire dialect a Reader Session speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    General,
    R2000,
    Uhf,
    M,
}

/// One frame located by a dialect's `scan`: its start offset and length
/// within the scanned buffer, and the command/notification code it
/// carries. The callback receives the raw bytes and `offset`, matching the
/// framing design's "each callback receives the raw frame bytes and the
/// offset of the frame's first byte" contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMatch {
    pub offset: usize,
    pub frame_len: usize,
    pub command: u8,
}

/// Receive buffer / send buffer sizes shared by every Reader Session,
/// per the data model.
pub const RECV_BUFFER_SIZE: usize = 1024;
pub const SEND_BUFFER_SIZE: usize = 128;

/// Tag memory bank selector for `read_tag_block` / `write_tag_block`.
/// Numeric values are the reference SDK's membank constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBank {
    Reserved,
    Epc,
    Tid,
    User,
}

impl MemoryBank {
    pub fn code(self) -> u8 {
        match self {
            MemoryBank::Reserved => 0,
            MemoryBank::Epc => 1,
            MemoryBank::Tid => 2,
            MemoryBank::User => 3,
        }
    }
}

/// Lock target selector for `lock_tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    User,
    Tid,
    Epc,
    AccessPwd,
    KillPwd,
    All,
}

impl LockType {
    pub fn code(self) -> u8 {
        match self {
            LockType::User => 0,
            LockType::Tid => 1,
            LockType::Epc => 2,
            LockType::AccessPwd => 3,
            LockType::KillPwd => 4,
            LockType::All => 5,
        }
    }
}
