// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UHF dialect: TLV-structured framing.
//!
//! Frame shape: `'R' 'F' [TYPE] [ADDR_HI] [ADDR_LO] [CMD] [LEN_HI] [LEN_LO]
//! [payload…] [CKSUM]` where `TYPE` distinguishes command/response/
//! notification and the payload is a concatenation of TLVs (see
//! [`crate::tlv`]). `LEN` is the payload length alone (unlike the M
//! dialect's header-inclusive convention — see [`super::m_dialect`]).
//! Checksum is an XOR fold over the header and payload, checksum byte
//! excluded.

use crate::checksum::xor_fold;
use crate::error::{Error, Result};
use crate::protocol::{LockType, MemoryBank, ScanMatch, RECV_BUFFER_SIZE, SEND_BUFFER_SIZE};
use crate::tlv::{tlv_type, Tlv};

/// Notification type for tag uploads during continuous inventory; carried
/// in the `command` field of a notification-type frame, outside the
/// command/response `CommandType` vocabulary.
pub const NOTIFY_TAGS_UPLOADED: u8 = 0x80;

pub const FRAME_TYPE_COMMAND: u8 = 0;
pub const FRAME_TYPE_RESPONSE: u8 = 1;
pub const FRAME_TYPE_NOTIFICATION: u8 = 2;

/// 8-byte header + 1-byte checksum, zero-length payload.
const MIN_ENVELOPE: usize = 9;
const MAX_PAYLOAD_LEN: usize = RECV_BUFFER_SIZE - MIN_ENVELOPE;

/// Command/response vocabulary carried by the UHF dialect, restored from
/// the original command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Reset,
    Version,
    GetConfig,
    SetConfig,
    SaveConfig,
    StartInventory,
    StopInventory,
    InventoryOnce,
    ReadTag,
    WriteTag,
    LockTag,
    KillTag,
    SetTxPower,
    GetTxPower,
    SetFrequency,
    GetFrequency,
    SetTxTime,
    GetTxTime,
    Unknown(u8),
}

impl CommandType {
    pub fn code(self) -> u8 {
        match self {
            CommandType::Reset => 0x01,
            CommandType::Version => 0x03,
            CommandType::GetConfig => 0x11,
            CommandType::SetConfig => 0x12,
            CommandType::SaveConfig => 0x13,
            CommandType::StartInventory => 0x21,
            CommandType::StopInventory => 0x22,
            CommandType::InventoryOnce => 0x23,
            CommandType::ReadTag => 0x31,
            CommandType::WriteTag => 0x32,
            CommandType::LockTag => 0x33,
            CommandType::KillTag => 0x34,
            CommandType::SetTxPower => 0x41,
            CommandType::GetTxPower => 0x42,
            CommandType::SetFrequency => 0x45,
            CommandType::GetFrequency => 0x46,
            CommandType::SetTxTime => 0x47,
            CommandType::GetTxTime => 0x48,
            CommandType::Unknown(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandType::Reset => "RESET",
            CommandType::Version => "VERSION",
            CommandType::GetConfig => "GET_CONFIG",
            CommandType::SetConfig => "SET_CONFIG",
            CommandType::SaveConfig => "SAVE_CONFIG",
            CommandType::StartInventory => "START_INVENTORY",
            CommandType::StopInventory => "STOP_INVENTORY",
            CommandType::InventoryOnce => "INVENTORY_ONCE",
            CommandType::ReadTag => "READ_TAG",
            CommandType::WriteTag => "WRITE_TAG",
            CommandType::LockTag => "LOCK_TAG",
            CommandType::KillTag => "KILL_TAG",
            CommandType::SetTxPower => "SET_TX_POWER",
            CommandType::GetTxPower => "GET_TX_POWER",
            CommandType::SetFrequency => "SET_FREQUENCY",
            CommandType::GetFrequency => "GET_FREQUENCY",
            CommandType::SetTxTime => "SET_TX_TIME",
            CommandType::GetTxTime => "GET_TX_TIME",
            CommandType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for CommandType {
    fn from(code: u8) -> Self {
        match code {
            0x01 => CommandType::Reset,
            0x03 => CommandType::Version,
            0x11 => CommandType::GetConfig,
            0x12 => CommandType::SetConfig,
            0x13 => CommandType::SaveConfig,
            0x21 => CommandType::StartInventory,
            0x22 => CommandType::StopInventory,
            0x23 => CommandType::InventoryOnce,
            0x31 => CommandType::ReadTag,
            0x32 => CommandType::WriteTag,
            0x33 => CommandType::LockTag,
            0x34 => CommandType::KillTag,
            0x41 => CommandType::SetTxPower,
            0x42 => CommandType::GetTxPower,
            0x45 => CommandType::SetFrequency,
            0x46 => CommandType::GetFrequency,
            0x47 => CommandType::SetTxTime,
            0x48 => CommandType::GetTxTime,
            other => CommandType::Unknown(other),
        }
    }
}

/// A parsed UHF frame borrowing from the original receive buffer slice.
#[derive(Debug, Clone, Copy)]
pub struct UhfFrame<'a> {
    pub frame_type: u8,
    pub address: u16,
    pub command: CommandType,
    pub payload: &'a [u8],
}

impl<'a> UhfFrame<'a> {
    /// Parse a single frame out of a slice already located by [`scan`].
    /// `bytes` must be exactly one frame (header, payload, checksum).
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < MIN_ENVELOPE || bytes[0] != b'R' || bytes[1] != b'F' {
            return Err(Error::Internal("not a UHF frame".into()));
        }
        let payload_len = u16::from_be_bytes([bytes[6], bytes[7]]) as usize;
        if bytes.len() != 8 + payload_len + 1 {
            return Err(Error::Internal("UHF frame length mismatch".into()));
        }
        Ok(UhfFrame {
            frame_type: bytes[2],
            address: u16::from_be_bytes([bytes[3], bytes[4]]),
            command: CommandType::from(bytes[5]),
            payload: &bytes[8..8 + payload_len],
        })
    }

    pub fn tlvs(&self) -> Vec<Tlv> {
        Tlv::parse_all(self.payload)
    }

    /// The `STATUS` TLV (0x07) if the payload carries one.
    pub fn status(&self) -> Option<u8> {
        self.tlvs()
            .into_iter()
            .find(|t| t.tlv_type == tlv_type::STATUS)
            .and_then(|t| t.status_value())
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status(), Some(0) | None)
    }
}

pub struct UhfCodec {
    buf: [u8; SEND_BUFFER_SIZE],
    len: usize,
}

impl UhfCodec {
    pub fn new() -> Self {
        UhfCodec { buf: [0u8; SEND_BUFFER_SIZE], len: 0 }
    }

    pub fn build_header(&mut self, frame_type: u8, address: u16, command: CommandType) {
        self.len = 0;
        self.push(b'R');
        self.push(b'F');
        self.push(frame_type);
        let [hi, lo] = address.to_be_bytes();
        self.push(hi);
        self.push(lo);
        self.push(command.code());
        self.push(0); // LEN_HI placeholder
        self.push(0); // LEN_LO placeholder
    }

    fn push(&mut self, byte: u8) {
        self.buf[self.len] = byte;
        self.len += 1;
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        if self.len + bytes.len() + 1 > SEND_BUFFER_SIZE {
            return Err(Error::BufferOverflow { needed: self.len + bytes.len() + 1, capacity: SEND_BUFFER_SIZE });
        }
        for &b in bytes {
            self.push(b);
        }
        Ok(())
    }

    pub fn write_tlv(&mut self, tlv: &Tlv) -> Result<()> {
        let bytes = tlv.to_bytes();
        self.extend(&bytes)
    }

    /// Patch `LEN` (payload length alone), compute and append the XOR
    /// checksum. Call only after the full TLV payload has been written.
    pub fn finalize(&mut self) -> Result<&[u8]> {
        if self.len + 1 > SEND_BUFFER_SIZE {
            return Err(Error::BufferOverflow { needed: self.len + 1, capacity: SEND_BUFFER_SIZE });
        }
        let payload_len = self.len - 8;
        let [hi, lo] = (payload_len as u16).to_be_bytes();
        self.buf[6] = hi;
        self.buf[7] = lo;
        let checksum = xor_fold(&self.buf[..self.len]);
        self.buf[self.len] = checksum;
        self.len += 1;
        Ok(&self.buf[..self.len])
    }

    pub fn build_start_inventory(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::StartInventory);
        self.finalize()
    }

    pub fn build_stop_inventory(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::StopInventory);
        self.finalize()
    }

    pub fn build_inventory_once(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::InventoryOnce);
        self.finalize()
    }

    pub fn build_reset(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::Reset);
        self.finalize()
    }

    /// TLV payload: `MEM_BANK`, `WORD_PTR`, `WORD_COUNT`, matching the
    /// reference SDK's `create_read_tag_command`.
    pub fn build_read_tag(&mut self, address: u16, bank: MemoryBank, word_ptr: u16, word_count: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::ReadTag);
        self.write_tlv(&Tlv::mem_bank(bank.code()))?;
        self.write_tlv(&Tlv::word_ptr(word_ptr))?;
        self.write_tlv(&Tlv::word_count(word_count))?;
        self.finalize()
    }

    /// TLV payload: `MEM_BANK`, `WORD_PTR`, `DATA`, matching the reference
    /// SDK's `create_write_tag_command`. `data` must be word-aligned.
    pub fn build_write_tag(&mut self, address: u16, bank: MemoryBank, word_ptr: u16, data: &[u8]) -> Result<&[u8]> {
        if data.len() % 2 != 0 {
            return Err(Error::Internal(format!(
                "write_tag: data length {} is not word-aligned",
                data.len()
            )));
        }
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::WriteTag);
        self.write_tlv(&Tlv::mem_bank(bank.code()))?;
        self.write_tlv(&Tlv::word_ptr(word_ptr))?;
        self.write_tlv(&Tlv::data(data.to_vec()))?;
        self.finalize()
    }

    /// TLV payload: `LOCK_TYPE`, `ACCESS_PWD` (zero by default).
    pub fn build_lock_tag(&mut self, address: u16, lock_type: LockType) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::LockTag);
        self.write_tlv(&Tlv::lock_type(lock_type.code()))?;
        self.write_tlv(&Tlv::access_pwd(vec![0, 0, 0, 0]))?;
        self.finalize()
    }

    /// TLV payload: `KILL_PWD` (zero by default).
    pub fn build_kill_tag(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CommandType::KillTag);
        self.write_tlv(&Tlv::kill_pwd(vec![0, 0, 0, 0]))?;
        self.finalize()
    }

    pub fn scan(buf: &[u8]) -> Vec<ScanMatch> {
        let mut matches = Vec::new();
        let mut pos = 0usize;
        let len = buf.len();

        while pos + MIN_ENVELOPE <= len {
            if buf[pos] != b'R' || buf[pos + 1] != b'F' {
                pos += 1;
                continue;
            }
            let frame_type = buf[pos + 2];
            if !matches!(frame_type, FRAME_TYPE_COMMAND | FRAME_TYPE_RESPONSE | FRAME_TYPE_NOTIFICATION) {
                pos += 1;
                continue;
            }

            let payload_len = u16::from_be_bytes([buf[pos + 6], buf[pos + 7]]) as usize;
            if payload_len > MAX_PAYLOAD_LEN {
                pos += 1;
                continue;
            }

            let checksum_offset = pos + 8 + payload_len;
            if checksum_offset >= len {
                break;
            }

            let declared_range = &buf[pos..checksum_offset];
            let stored_checksum = buf[checksum_offset];
            if xor_fold(declared_range) != stored_checksum {
                pos += 1;
                continue;
            }

            let command = buf[pos + 5];
            let frame_len = 8 + payload_len + 1;
            matches.push(ScanMatch { offset: pos, frame_len, command });
            pos += frame_len;
        }

        matches
    }
}

impl Default for UhfCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::Tlv;

    #[test]
    fn build_then_scan_round_trips() {
        let mut codec = UhfCodec::new();
        codec.build_header(FRAME_TYPE_COMMAND, 0x0001, CommandType::StartInventory);
        let frame = codec.finalize().unwrap().to_vec();

        let matches = UhfCodec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].frame_len, frame.len());
        assert_eq!(matches[0].command, CommandType::StartInventory.code());
    }

    #[test]
    fn tlv_payload_round_trips_inside_frame() {
        let mut codec = UhfCodec::new();
        codec.build_header(FRAME_TYPE_NOTIFICATION, 0x0000, CommandType::InventoryOnce);
        codec.write_tlv(&Tlv::epc(vec![0xE2, 0x80, 0x11, 0x22])).unwrap();
        let frame = codec.finalize().unwrap().to_vec();

        let parsed = UhfFrame::parse(&frame).unwrap();
        let tlvs = parsed.tlvs();
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].epc_value(), Some([0xE2, 0x80, 0x11, 0x22].as_slice()));
    }

    #[test]
    fn unrecognized_frame_type_is_skipped_as_noise() {
        let mut buf = vec![b'R', b'F', 0x09, 0, 0, 0x21, 0, 0];
        buf.push(xor_fold(&buf));
        let matches = UhfCodec::scan(&buf);
        assert!(matches.is_empty());
    }

    #[test]
    fn truncated_payload_waits_for_more_bytes() {
        let mut codec = UhfCodec::new();
        codec.build_header(FRAME_TYPE_COMMAND, 0, CommandType::Reset);
        let frame = codec.finalize().unwrap().to_vec();
        let matches = UhfCodec::scan(&frame[..frame.len() - 1]);
        assert!(matches.is_empty());
    }

    #[test]
    fn status_tlv_reports_success() {
        let mut codec = UhfCodec::new();
        codec.build_header(FRAME_TYPE_RESPONSE, 0, CommandType::Reset);
        codec.write_tlv(&Tlv::status(0)).unwrap();
        let frame = codec.finalize().unwrap().to_vec();
        let parsed = UhfFrame::parse(&frame).unwrap();
        assert!(parsed.is_success());
    }

    #[test]
    fn status_tlv_reports_failure() {
        let mut codec = UhfCodec::new();
        codec.build_header(FRAME_TYPE_RESPONSE, 0, CommandType::Reset);
        codec.write_tlv(&Tlv::status(0x14)).unwrap();
        let frame = codec.finalize().unwrap().to_vec();
        let parsed = UhfFrame::parse(&frame).unwrap();
        assert!(!parsed.is_success());
    }

    #[test]
    fn read_tag_tlvs_round_trip_through_scan() {
        let mut codec = UhfCodec::new();
        let frame = codec.build_read_tag(0x0001, MemoryBank::Tid, 2, 6).unwrap().to_vec();
        let matches = UhfCodec::scan(&frame);
        assert_eq!(matches.len(), 1);
        let parsed = UhfFrame::parse(&frame).unwrap();
        let tlvs = parsed.tlvs();
        assert_eq!(tlvs.len(), 3);
        assert_eq!(tlvs[0].raw_value(), Some(&[MemoryBank::Tid.code()][..]));
        assert_eq!(tlvs[1].raw_value(), Some(&2u16.to_be_bytes()[..]));
        assert_eq!(tlvs[2].raw_value(), Some(&6u16.to_be_bytes()[..]));
    }

    #[test]
    fn write_tag_rejects_unaligned_data() {
        let mut codec = UhfCodec::new();
        let err = codec.build_write_tag(0, MemoryBank::User, 0, &[0xAA]).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn lock_tag_carries_zero_access_password() {
        let mut codec = UhfCodec::new();
        let frame = codec.build_lock_tag(0, LockType::All).unwrap().to_vec();
        let parsed = UhfFrame::parse(&frame).unwrap();
        let tlvs = parsed.tlvs();
        assert_eq!(tlvs[0].raw_value(), Some(&[LockType::All.code()][..]));
        assert_eq!(tlvs[1].raw_value(), Some(&[0, 0, 0, 0][..]));
    }

    #[test]
    fn command_type_round_trips_through_code() {
        for ct in [
            CommandType::Reset,
            CommandType::Version,
            CommandType::StartInventory,
            CommandType::GetFrequency,
        ] {
            assert_eq!(CommandType::from(ct.code()), ct);
        }
    }
}
