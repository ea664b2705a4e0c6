// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! "R2000" dialect: header-framed with a two-byte reader id and a
//! single-byte length field.
//!
//! Frame shape: `[START] [0x00] [LEN] [RID_HI] [RID_LO] [CMD] [payload…]
//! [CKSUM]`. The reference decoder additionally rejects any frame whose
//! declared length exceeds 255 — but `LEN` is itself one byte here, so
//! that rejection can never trigger; it was written for a 16-bit length
//! field this dialect doesn't actually have. There is nothing left to
//! redesign: a single byte cannot express a length past the 1024-byte
//! receive buffer in the first place, so `scan` only needs the
//! truncation check it already has (declared end past what's been
//! received ⇒ wait for more bytes).

use crate::checksum::negate_sum;
use crate::error::{Error, Result};
use crate::protocol::{ScanMatch, SEND_BUFFER_SIZE};

pub const START_CMD_FLAG: u8 = 0xAA;
pub const START_RSP_FLAG: u8 = 0xBB;

pub const CMD_TAG_NOTIFY: u8 = 0x10;
pub const CMD_STOP_INVENTORY: u8 = 0x31;
pub const CMD_START_INVENTORY: u8 = 0x32;
pub const CMD_READ_TAG_BLOCK: u8 = 0x39;
pub const CMD_WRITE_TAG_BLOCK: u8 = 0x49;
pub const CMD_LOCK_TAG: u8 = 0x82;
pub const CMD_KILL_TAG: u8 = 0x83;
pub const CMD_RESET_DEVICE: u8 = 0x65;

/// START, 0x00, LEN, RID_HI, RID_LO, CMD, CKSUM.
const MIN_ENVELOPE: usize = 7;

pub struct R2000Codec {
    buf: [u8; SEND_BUFFER_SIZE],
    len: usize,
    reader_id: [u8; 2],
}

impl R2000Codec {
    pub fn new(reader_id: [u8; 2]) -> Self {
        R2000Codec { buf: [0u8; SEND_BUFFER_SIZE], len: 0, reader_id }
    }

    pub fn build_header(&mut self, cmd: u8) {
        self.len = 0;
        self.push(START_CMD_FLAG);
        self.push(0x00);
        self.push(0); // LEN placeholder
        self.push(self.reader_id[0]);
        self.push(self.reader_id[1]);
        self.push(cmd);
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

    /// Patch `LEN`, compute and append the checksum. Call only after the
    /// full payload has been written.
    pub fn finalize(&mut self) -> Result<&[u8]> {
        if self.len + 1 > SEND_BUFFER_SIZE {
            return Err(Error::BufferOverflow { needed: self.len + 1, capacity: SEND_BUFFER_SIZE });
        }
        self.buf[2] = (self.len - 2) as u8;
        let checksum = negate_sum(&self.buf[..self.len]);
        self.buf[self.len] = checksum;
        self.len += 1;
        Ok(&self.buf[..self.len])
    }

    pub fn build_reset(&mut self) -> Result<&[u8]> {
        self.build_header(CMD_RESET_DEVICE);
        self.finalize()
    }

    pub fn build_start_inventory(&mut self) -> Result<&[u8]> {
        self.build_header(CMD_START_INVENTORY);
        self.finalize()
    }

    pub fn build_stop_inventory(&mut self) -> Result<&[u8]> {
        self.build_header(CMD_STOP_INVENTORY);
        self.finalize()
    }

    pub fn scan(buf: &[u8]) -> Vec<ScanMatch> {
        let mut matches = Vec::new();
        let mut pos = 0usize;
        let len = buf.len();

        while pos + MIN_ENVELOPE <= len {
            let start = buf[pos];
            if start != START_CMD_FLAG && start != START_RSP_FLAG {
                pos += 1;
                continue;
            }

            let declared_len = buf[pos + 2] as usize;

            // declared_len == bytes written (from 0x00 at pos+1 onward)
            // before the checksum; checksum sits at pos + declared_len + 2.
            let checksum_offset = pos + declared_len + 2;
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
            let frame_len = declared_len + 3;
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
    fn build_start_inventory_matches_checksum_rule() {
        // AA 00 04 00 00 32 -> checksum 0x20; see
        // negate_sum_of_start_inventory_header in checksum.rs.
        let mut codec = R2000Codec::new([0x00, 0x00]);
        let frame = codec.build_start_inventory().unwrap();
        assert_eq!(frame, &[0xAA, 0x00, 0x04, 0x00, 0x00, 0x32, 0x20]);
    }

    #[test]
    fn scan_recovers_built_frame() {
        let mut codec = R2000Codec::new([0x01, 0x02]);
        let frame = codec.build_stop_inventory().unwrap().to_vec();
        let matches = R2000Codec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_STOP_INVENTORY);
        assert_eq!(matches[0].frame_len, frame.len());
    }

    #[test]
    fn truncated_frame_waits_for_more_bytes() {
        let mut codec = R2000Codec::new([0, 0]);
        let frame = codec.build_start_inventory().unwrap().to_vec();
        let matches = R2000Codec::scan(&frame[..frame.len() - 1]);
        assert!(matches.is_empty());
    }

    #[test]
    fn declared_len_at_maximum_byte_value_still_matches() {
        // LEN is one byte: 0xFF (255) is the largest length this dialect
        // can ever declare, far short of the 1024-byte receive buffer.
        // `scan` must still locate this frame rather than treat the
        // maximal byte value as implausible.
        let declared_len: u8 = 0xFF;
        let payload_len = declared_len as usize - 4; // declared_len = header-from-LEN bytes + payload
        let mut frame = vec![START_CMD_FLAG, 0x00, declared_len, 0x01, 0x02, CMD_START_INVENTORY];
        frame.extend(std::iter::repeat(0u8).take(payload_len));
        frame.push(negate_sum(&frame));

        let matches = R2000Codec::scan(&frame);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, CMD_START_INVENTORY);
        assert_eq!(matches[0].frame_len, frame.len());
    }
}
