// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! "M" dialect: the UHF header shape with the General/R2000 checksum
//! rule and a header-inclusive 16-bit length.
//!
//! Frame shape: `'R' 'F' [TYPE] [ADDR_HI] [ADDR_LO] [CMD] [LEN_HI]
//! [LEN_LO] [payload…] [CKSUM]`, `cs = (~Σbytes + 1) & 0xFF`. Unlike the
//! base UHF dialect, `LEN` here counts from `LEN_HI` through the last
//! payload byte inclusive — i.e. `payload_len + 2`, not `payload_len`
//! alone. `finalize` is called exactly once, as the last step of every
//! builder method, after every payload byte (including any TLVs a relay
//! operation appends) has already been written — the length and checksum
//! are never touched again afterward.

use crate::checksum::negate_sum;
use crate::error::{Error, Result};
use crate::protocol::{ScanMatch, RECV_BUFFER_SIZE, SEND_BUFFER_SIZE};
use crate::tlv::Tlv;

pub const FRAME_TYPE_COMMAND: u8 = 0;
pub const FRAME_TYPE_RESPONSE: u8 = 1;
pub const FRAME_TYPE_NOTIFICATION: u8 = 2;

pub const CMD_RESET: u8 = 0x10;
pub const CMD_START_INVENTORY: u8 = 0x21;
pub const CMD_INVENTORY_ONCE: u8 = 0x22;
pub const CMD_STOP_INVENTORY: u8 = 0x23;
pub const CMD_RELAY_OPERATION: u8 = 0x4C;
/// Notification carrying an uploaded tag; seen only on notification-type
/// frames.
pub const NOTIFY_RECV_TAGS: u8 = 0x80;

/// Nested TLV carrying one relay's `[id][op][time]` triplet, inside the
/// 0x4C relay TLV.
pub const TLV_RELAY_ENTRY: u8 = 0x4C;

const MIN_ENVELOPE: usize = 9;
const MAX_PAYLOAD_LEN: usize = RECV_BUFFER_SIZE - MIN_ENVELOPE;

pub struct MCodec {
    buf: [u8; SEND_BUFFER_SIZE],
    len: usize,
}

impl MCodec {
    pub fn new() -> Self {
        MCodec { buf: [0u8; SEND_BUFFER_SIZE], len: 0 }
    }

    pub fn build_header(&mut self, frame_type: u8, address: u16, command: u8) {
        self.len = 0;
        self.push(b'R');
        self.push(b'F');
        self.push(frame_type);
        let [hi, lo] = address.to_be_bytes();
        self.push(hi);
        self.push(lo);
        self.push(command);
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

    /// Patch `LEN` (header-inclusive: `payload_len + 2`), compute and
    /// append the negate-sum checksum. The single finalize-after-all-
    /// writes call for every builder method in this module.
    pub fn finalize(&mut self) -> Result<&[u8]> {
        if self.len + 1 > SEND_BUFFER_SIZE {
            return Err(Error::BufferOverflow { needed: self.len + 1, capacity: SEND_BUFFER_SIZE });
        }
        let payload_len = self.len - 8;
        let declared_len = (payload_len + 2) as u16;
        let [hi, lo] = declared_len.to_be_bytes();
        self.buf[6] = hi;
        self.buf[7] = lo;
        let checksum = negate_sum(&self.buf[..self.len]);
        self.buf[self.len] = checksum;
        self.len += 1;
        Ok(&self.buf[..self.len])
    }

    pub fn build_reset(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CMD_RESET);
        self.finalize()
    }

    pub fn build_start_inventory(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CMD_START_INVENTORY);
        self.finalize()
    }

    pub fn build_stop_inventory(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CMD_STOP_INVENTORY);
        self.finalize()
    }

    pub fn build_inventory_once(&mut self, address: u16) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CMD_INVENTORY_ONCE);
        self.finalize()
    }

    /// Per set bit in `mask` (bit 0 = relay 1, bit 1 = relay 2), append a
    /// `[id][op][time]` triplet inside a single 0x4C TLV, then finalize —
    /// the append and the finalize never interleave across calls.
    pub fn build_relay_operation(&mut self, address: u16, mask: u8, op: u8, time: u8) -> Result<&[u8]> {
        self.build_header(FRAME_TYPE_COMMAND, address, CMD_RELAY_OPERATION);
        let mut entries = Vec::new();
        for relay_id in 0..2u8 {
            if mask & (1 << relay_id) != 0 {
                entries.push(relay_id + 1);
                entries.push(op);
                entries.push(time);
            }
        }
        self.write_tlv(&Tlv::new(TLV_RELAY_ENTRY, entries))?;
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

            let declared_len = u16::from_be_bytes([buf[pos + 6], buf[pos + 7]]) as usize;
            if declared_len < 2 {
                pos += 1;
                continue;
            }
            let payload_len = declared_len - 2;
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
            if negate_sum(declared_range) != stored_checksum {
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

impl Default for MCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_reset_then_scan_round_trips() {
        let mut codec = MCodec::new();
        let frame = codec.build_reset(0).unwrap().to_vec();
        assert_eq!(frame.len(), 9); // 8-byte header, no payload, 1 checksum byte
        assert_eq!(&frame[6..8], &[0x00, 0x02]); // LEN = payload_len(0) + 2

        let matches = MCodec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_RESET);
        assert_eq!(matches[0].frame_len, frame.len());
    }

    #[test]
    fn relay_operation_sets_only_requested_bits() {
        let mut codec = MCodec::new();
        let frame = codec.build_relay_operation(0, 0b01, 1, 5).unwrap().to_vec();
        let matches = MCodec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_RELAY_OPERATION);

        // payload is the 0x4C TLV wrapping exactly one [id, op, time] entry
        let header_len = 8;
        let payload = &frame[header_len..frame.len() - 1];
        let tlvs = Tlv::parse_all(payload);
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].raw_value(), Some(&[0x01, 0x01, 0x05][..]));
    }

    #[test]
    fn relay_operation_both_bits_appends_two_entries() {
        let mut codec = MCodec::new();
        let frame = codec.build_relay_operation(0, 0b11, 2, 9).unwrap().to_vec();
        let header_len = 8;
        let payload = &frame[header_len..frame.len() - 1];
        let tlvs = Tlv::parse_all(payload);
        assert_eq!(tlvs[0].raw_value(), Some(&[0x01, 0x02, 0x09, 0x02, 0x02, 0x09][..]));
    }

    #[test]
    fn truncated_frame_waits_for_more_bytes() {
        let mut codec = MCodec::new();
        let frame = codec.build_reset(0).unwrap().to_vec();
        let matches = MCodec::scan(&frame[..frame.len() - 1]);
        assert!(matches.is_empty());
    }

    #[test]
    fn implausible_declared_len_is_skipped_as_noise() {
        // LEN < 2 cannot encode a valid header-inclusive length.
        let mut buf = vec![b'R', b'F', 0, 0, 0, CMD_RESET, 0x00, 0x01];
        buf.push(negate_sum(&buf));
        let matches = MCodec::scan(&buf);
        assert!(matches.is_empty());
    }
}
