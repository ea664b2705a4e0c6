// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! "GeneralReader" dialect: byte-oriented framing.
//!
//! Frame shape: `[START] [LEN] [CMD] [payload…] [CKSUM]`. `START`
//! distinguishes command/response/notification frames; `LEN` is one byte
//! counting from the LEN byte's own finalize-time formula (see
//! [`GeneralCodec::finalize`]) rather than a literal byte range, matching
//! the reference encoder exactly so built frames match the wire format
//! byte for byte.

use crate::checksum::negate_sum;
use crate::protocol::{LockType, MemoryBank, ScanMatch, SEND_BUFFER_SIZE};
use crate::error::{Error, Result};

pub const START_CMD_FLAG: u8 = 0xA0;
pub const START_RSP_FLAG: u8 = 0xE4;
pub const START_NOTIFY_FLAG: u8 = 0xE0;

pub const CMD_NOTIFY_TAG: u8 = 0xFF;
pub const CMD_QUERY_SINGLE_PARAM: u8 = 0x61;
pub const CMD_SET_MUTI_PARAM: u8 = 0x62;
pub const CMD_QUERY_MUTI_PARAM: u8 = 0x63;
pub const CMD_RESET_DEVICE: u8 = 0x65;
pub const CMD_QUERY_VERSION: u8 = 0x6A;
pub const CMD_STOP_INVENTORY: u8 = 0xFE;
pub const CMD_READ_TAG_BLOCK: u8 = 0x80;
pub const CMD_WRITE_TAG_BLOCK: u8 = 0x81;
pub const CMD_IDENTIFY_TAG: u8 = 0x82;
pub const CMD_ENCRYPT_TAG: u8 = 0x83;
pub const CMD_KILL_TAG: u8 = 0x86;
pub const CMD_LOCK_TAG: u8 = 0x87;

/// Minimum bytes needed to even attempt a scan match: START, LEN, CMD,
/// CKSUM.
const MIN_ENVELOPE: usize = 4;
/// Single-byte length field: values above this are spurious.
const MAX_LEN: usize = 0xFF;

pub struct GeneralCodec {
    buf: [u8; SEND_BUFFER_SIZE],
    len: usize,
}

impl Default for GeneralCodec {
    fn default() -> Self {
        GeneralCodec { buf: [0u8; SEND_BUFFER_SIZE], len: 0 }
    }
}

impl GeneralCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the send cursor and write `START`, a length placeholder, and
    /// `CMD`.
    pub fn build_header(&mut self, start: u8, cmd: u8) {
        self.len = 0;
        self.push(start);
        self.push(0); // length placeholder
        self.push(cmd);
    }

    /// Append a payload byte. Callers write the full payload before
    /// calling [`Self::finalize`].
    pub fn push(&mut self, byte: u8) {
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

    /// Patch the length byte, compute and append the checksum. Must be
    /// called only after every payload byte has been written.
    pub fn finalize(&mut self) -> Result<&[u8]> {
        if self.len + 1 > SEND_BUFFER_SIZE {
            return Err(Error::BufferOverflow { needed: self.len + 1, capacity: SEND_BUFFER_SIZE });
        }
        self.buf[1] = (self.len - 1) as u8;
        let checksum = negate_sum(&self.buf[..self.len]);
        self.buf[self.len] = checksum;
        self.len += 1;
        Ok(&self.buf[..self.len])
    }

    pub fn build_reset(&mut self) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_RESET_DEVICE);
        self.finalize()
    }

    pub fn build_stop_inventory(&mut self) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_STOP_INVENTORY);
        self.finalize()
    }

    pub fn build_inventory_once(&mut self) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_IDENTIFY_TAG);
        self.finalize()
    }

    /// Payload is `[membank, addr, length]`; single-byte addressing matches
    /// this dialect's byte-oriented envelope. Field layout here is a
    /// payload convention, not part of the wire compatibility contract.
    pub fn build_read_tag_block(&mut self, bank: MemoryBank, addr: u8, length: u8) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_READ_TAG_BLOCK);
        self.extend(&[bank.code(), addr, length])?;
        self.finalize()
    }

    /// Payload is `[membank, addr, length, data...]`; `data` must hold
    /// exactly `length * 2` bytes (word-aligned).
    pub fn build_write_tag_block(
        &mut self,
        bank: MemoryBank,
        addr: u8,
        length: u8,
        data: &[u8],
    ) -> Result<&[u8]> {
        if data.len() != length as usize * 2 {
            return Err(Error::Internal(format!(
                "write_tag_block: expected {} data bytes for length={length}, got {}",
                length as usize * 2,
                data.len()
            )));
        }
        self.build_header(START_CMD_FLAG, CMD_WRITE_TAG_BLOCK);
        self.extend(&[bank.code(), addr, length])?;
        self.extend(data)?;
        self.finalize()
    }

    pub fn build_lock_tag(&mut self, lock_type: LockType) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_LOCK_TAG);
        self.extend(&[lock_type.code()])?;
        self.finalize()
    }

    /// Payload is a zero access-kill password by default, per the
    /// reference SDK's `kill_tag`.
    pub fn build_kill_tag(&mut self) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_KILL_TAG);
        self.extend(&[0, 0, 0, 0])?;
        self.finalize()
    }

    pub fn build_query_muti_param(&mut self, mem_address: u8, query_len: u8) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_QUERY_SINGLE_PARAM);
        self.extend(&[query_len, 0x00, mem_address])?;
        self.finalize()
    }

    pub fn build_set_muti_param(&mut self, mem_address: u8, params: &[u8]) -> Result<&[u8]> {
        self.build_header(START_CMD_FLAG, CMD_SET_MUTI_PARAM);
        self.extend(&[params.len() as u8, 0x00, mem_address])?;
        self.extend(params)?;
        self.finalize()
    }

    /// Scan `buf` for every valid frame. Truncated frames are left for the
    /// next call (cursor never advances past the start token); corrupted
    /// frames are skipped one byte at a time.
    pub fn scan(buf: &[u8]) -> Vec<ScanMatch> {
        let mut matches = Vec::new();
        let mut pos = 0usize;
        let len = buf.len();

        while pos + MIN_ENVELOPE <= len {
            let start = buf[pos];
            if start != START_CMD_FLAG && start != START_RSP_FLAG && start != START_NOTIFY_FLAG {
                pos += 1;
                continue;
            }

            let declared_len = buf[pos + 1] as usize;
            if declared_len > MAX_LEN {
                pos += 1;
                continue;
            }

            // declared_len counts from LEN byte's finalize-time formula:
            // declared_len + 1 == bytes written before the checksum, i.e.
            // the checksum sits at pos + declared_len + 1.
            let checksum_offset = pos + declared_len + 1;
            if checksum_offset >= len {
                break; // not fully received yet; do not advance past start
            }

            let declared_range = &buf[pos..checksum_offset];
            let stored_checksum = buf[checksum_offset];
            if negate_sum(declared_range) != stored_checksum {
                pos += 1;
                continue;
            }

            let command = buf[pos + 2];
            let frame_len = declared_len + 2; // declared range + checksum byte
            matches.push(ScanMatch { offset: pos, frame_len, command });
            pos += frame_len;
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_reset_matches_checksum_rule() {
        let mut codec = GeneralCodec::new();
        let frame = codec.build_reset().unwrap();
        assert_eq!(frame, &[0xA0, 0x02, 0x65, 0xF9]);
    }

    #[test]
    fn scan_skips_leading_noise_byte() {
        let buf = [0xFF, 0xA0, 0x02, 0x65, 0xF9];
        let matches = GeneralCodec::scan(&buf);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 1);
        assert_eq!(matches[0].command, 0x65);
        assert_eq!(matches[0].offset + matches[0].frame_len, 5);
    }

    #[test]
    fn scan_of_truncated_frame_yields_nothing() {
        let buf = [0xA0, 0x02, 0x65];
        let matches = GeneralCodec::scan(&buf);
        assert!(matches.is_empty());
    }

    #[test]
    fn scan_is_idempotent_under_append() {
        let mut codec = GeneralCodec::new();
        let frame = codec.build_reset().unwrap().to_vec();
        let mut two_frames = frame.clone();
        two_frames.extend_from_slice(&frame);

        let first_pass = GeneralCodec::scan(&frame);
        let second_pass = GeneralCodec::scan(&two_frames);
        assert_eq!(first_pass.len(), 1);
        assert_eq!(second_pass.len(), 2);
        assert_eq!(second_pass[0].command, first_pass[0].command);
        assert_eq!(second_pass[1].command, first_pass[0].command);
    }

    #[test]
    fn bit_flip_in_checksum_resyncs_at_next_start_token() {
        let mut codec = GeneralCodec::new();
        let good = codec.build_reset().unwrap().to_vec();
        let mut corrupted = good.clone();
        corrupted[3] ^= 0x01; // flip one bit of the checksum
        let mut buf = corrupted;
        buf.extend_from_slice(&good);

        let matches = GeneralCodec::scan(&buf);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 4);
    }

    #[test]
    fn build_header_then_payload_then_finalize() {
        let mut codec = GeneralCodec::new();
        codec.build_header(START_CMD_FLAG, CMD_QUERY_SINGLE_PARAM);
        codec.extend(&[0x01, 0x02]).unwrap();
        let frame = codec.finalize().unwrap();
        assert_eq!(frame[0], START_CMD_FLAG);
        assert_eq!(frame[2], CMD_QUERY_SINGLE_PARAM);
        assert_eq!(frame.len(), 6); // START LEN CMD + 2 payload + CKSUM
        let matches = GeneralCodec::scan(frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_QUERY_SINGLE_PARAM);
    }

    #[test]
    fn read_tag_block_round_trips() {
        let mut codec = GeneralCodec::new();
        let frame = codec.build_read_tag_block(MemoryBank::User, 0x02, 0x04).unwrap().to_vec();
        let matches = GeneralCodec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_READ_TAG_BLOCK);
        assert_eq!(&frame[3..6], &[MemoryBank::User.code(), 0x02, 0x04]);
    }

    #[test]
    fn write_tag_block_rejects_mismatched_data_length() {
        let mut codec = GeneralCodec::new();
        let err = codec.build_write_tag_block(MemoryBank::Epc, 0, 2, &[0xAA]).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn write_tag_block_accepts_word_aligned_data() {
        let mut codec = GeneralCodec::new();
        let frame = codec.build_write_tag_block(MemoryBank::Epc, 0, 2, &[0x11, 0x22, 0x33, 0x44]).unwrap().to_vec();
        let matches = GeneralCodec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_WRITE_TAG_BLOCK);
    }

    #[test]
    fn kill_tag_defaults_to_zero_password() {
        let mut codec = GeneralCodec::new();
        let frame = codec.build_kill_tag().unwrap().to_vec();
        assert_eq!(&frame[3..7], &[0, 0, 0, 0]);
    }
}
