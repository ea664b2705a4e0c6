// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TLV (Type-Length-Value) codec for the UHF dialect.
//!
//! Type and length are each one byte; length is therefore capped at 255.
//! A TLV whose type is registered as compound (currently only `TAG`,
//! 0x50) carries a nested sequence of TLVs as its value instead of raw
//! bytes. Typed constructors and accessors live on [`Tlv`] directly rather
//! than behind a separate per-type class hierarchy — the per-type factory
//! registry the reference implementation used to sidestep import cycles
//! collapses to a single match here.

use crate::error::{Error, Result};

/// Recognized TLV type codes.
pub mod tlv_type {
    pub const EPC: u8 = 0x01;
    pub const ACCESS_PWD: u8 = 0x02;
    pub const KILL_PWD: u8 = 0x03;
    pub const TID: u8 = 0x04;
    pub const RSSI: u8 = 0x05;
    pub const TIME: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const VERSION: u8 = 0x20;
    pub const DEVICE_TYPE: u8 = 0x21;
    /// Compound: value is itself a sequence of TLVs.
    pub const TAG: u8 = 0x50;

    /// Memory bank selector carried by UHF read/write tag-memory commands.
    pub const MEM_BANK: u8 = 0x41;
    /// Starting word address carried by UHF read/write tag-memory commands.
    pub const WORD_PTR: u8 = 0x42;
    /// Word count carried by UHF read tag-memory commands.
    pub const WORD_COUNT: u8 = 0x43;
    /// Data payload carried by UHF write tag-memory commands.
    pub const DATA: u8 = 0x44;
    /// Lock target selector carried by UHF lock-tag commands.
    pub const LOCK_TYPE: u8 = 0x45;
}

fn is_compound(t: u8) -> bool {
    t == tlv_type::TAG
}

/// A parsed or to-be-encoded TLV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub tlv_type: u8,
    pub value: TlvValue,
}

/// The value carried by a TLV: either raw bytes or, for compound types, a
/// nested list of sub-TLVs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    Bytes(Vec<u8>),
    Sub(Vec<Tlv>),
}

impl Tlv {
    pub fn new(tlv_type: u8, value: Vec<u8>) -> Self {
        Tlv { tlv_type, value: TlvValue::Bytes(value) }
    }

    pub fn compound(tlv_type: u8, sub: Vec<Tlv>) -> Self {
        Tlv { tlv_type, value: TlvValue::Sub(sub) }
    }

    pub fn epc(epc: impl Into<Vec<u8>>) -> Self {
        Tlv::new(tlv_type::EPC, epc.into())
    }

    pub fn access_pwd(pwd: impl Into<Vec<u8>>) -> Self {
        Tlv::new(tlv_type::ACCESS_PWD, pwd.into())
    }

    pub fn kill_pwd(pwd: impl Into<Vec<u8>>) -> Self {
        Tlv::new(tlv_type::KILL_PWD, pwd.into())
    }

    pub fn tid(tid: impl Into<Vec<u8>>) -> Self {
        Tlv::new(tlv_type::TID, tid.into())
    }

    pub fn rssi(dbm: u8) -> Self {
        Tlv::new(tlv_type::RSSI, vec![dbm])
    }

    pub fn time(unix_seconds: u32) -> Self {
        Tlv::new(tlv_type::TIME, unix_seconds.to_be_bytes().to_vec())
    }

    pub fn status(code: u8) -> Self {
        Tlv::new(tlv_type::STATUS, vec![code])
    }

    pub fn device_type(code: u8) -> Self {
        Tlv::new(tlv_type::DEVICE_TYPE, vec![code])
    }

    pub fn mem_bank(bank: u8) -> Self {
        Tlv::new(tlv_type::MEM_BANK, vec![bank])
    }

    pub fn word_ptr(addr: u16) -> Self {
        Tlv::new(tlv_type::WORD_PTR, addr.to_be_bytes().to_vec())
    }

    pub fn word_count(count: u16) -> Self {
        Tlv::new(tlv_type::WORD_COUNT, count.to_be_bytes().to_vec())
    }

    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Tlv::new(tlv_type::DATA, bytes.into())
    }

    pub fn lock_type(lock_type: u8) -> Self {
        Tlv::new(tlv_type::LOCK_TYPE, vec![lock_type])
    }

    pub fn tag(sub: Vec<Tlv>) -> Self {
        Tlv::compound(tlv_type::TAG, sub)
    }

    /// Length of the encoded value (not including the type/length header).
    pub fn value_len(&self) -> usize {
        match &self.value {
            TlvValue::Bytes(b) => b.len(),
            TlvValue::Sub(subs) => subs.iter().map(|t| t.encoded_len()).sum(),
        }
    }

    /// Total encoded length, header included.
    pub fn encoded_len(&self) -> usize {
        2 + self.value_len()
    }

    pub fn raw_value(&self) -> Option<&[u8]> {
        match &self.value {
            TlvValue::Bytes(b) => Some(b),
            TlvValue::Sub(_) => None,
        }
    }

    pub fn sub_tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            TlvValue::Sub(subs) => Some(subs),
            TlvValue::Bytes(_) => None,
        }
    }

    pub fn epc_value(&self) -> Option<&[u8]> {
        (self.tlv_type == tlv_type::EPC).then(|| self.raw_value()).flatten()
    }

    pub fn rssi_value(&self) -> Option<u8> {
        if self.tlv_type != tlv_type::RSSI {
            return None;
        }
        self.raw_value().and_then(|v| v.first().copied())
    }

    pub fn time_value(&self) -> Option<u32> {
        if self.tlv_type != tlv_type::TIME {
            return None;
        }
        let v = self.raw_value()?;
        if v.len() < 4 {
            return None;
        }
        Some(u32::from_be_bytes([v[0], v[1], v[2], v[3]]))
    }

    pub fn status_value(&self) -> Option<u8> {
        if self.tlv_type != tlv_type::STATUS {
            return None;
        }
        self.raw_value().and_then(|v| v.first().copied())
    }

    pub fn device_type_value(&self) -> Option<u8> {
        if self.tlv_type != tlv_type::DEVICE_TYPE {
            return None;
        }
        self.raw_value().and_then(|v| v.first().copied())
    }

    /// Friendly name for a `DEVICE_TYPE` TLV's code.
    pub fn device_type_name(code: u8) -> &'static str {
        match code {
            0x01 => "Fixed RFID Reader",
            0x02 => "Handheld RFID Reader",
            0x03 => "Mobile RFID Reader",
            0x04 => "RFID Module",
            0xFF => "Development Board",
            _ => "Unknown Type",
        }
    }

    /// EPC pulled out of a compound `TAG` TLV's sub-TLVs, if present.
    pub fn tag_epc(&self) -> Option<&[u8]> {
        self.sub_tlvs()?.iter().find_map(|t| t.epc_value())
    }

    pub fn tag_rssi(&self) -> Option<u8> {
        self.sub_tlvs()?.iter().find_map(|t| t.rssi_value())
    }

    pub fn tag_time(&self) -> Option<u32> {
        self.sub_tlvs()?.iter().find_map(|t| t.time_value())
    }

    pub fn tag_tid(&self) -> Option<&[u8]> {
        self.sub_tlvs()?
            .iter()
            .find(|t| t.tlv_type == tlv_type::TID)
            .and_then(|t| t.raw_value())
    }

    /// Encode this TLV (and, recursively, any sub-TLVs) into `out`.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = self.value_len();
        if len > 0xFF {
            return Err(Error::BufferOverflow { needed: len, capacity: 0xFF });
        }
        out.push(self.tlv_type);
        out.push(len as u8);
        match &self.value {
            TlvValue::Bytes(b) => out.extend_from_slice(b),
            TlvValue::Sub(subs) => {
                for sub in subs {
                    sub.encode(out)?;
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        // len is bounded by construction of `Tlv` values used in this crate;
        // callers building adversarial values get the BufferOverflow error
        // via `encode` directly.
        let _ = self.encode(&mut out);
        out
    }

    /// Parse one TLV starting at `offset` in `data`. Returns the TLV and the
    /// offset just past it. Compound types recurse over their declared
    /// value window.
    pub fn parse(data: &[u8], offset: usize) -> Result<(Tlv, usize)> {
        if offset + 2 > data.len() {
            return Err(Error::Internal(format!(
                "truncated TLV header at offset {offset}"
            )));
        }
        let tlv_type = data[offset];
        let len = data[offset + 1] as usize;
        let value_start = offset + 2;
        let value_end = value_start + len;
        if value_end > data.len() {
            return Err(Error::Internal(format!(
                "truncated TLV value at offset {offset} (type=0x{tlv_type:02X}, length={len})"
            )));
        }
        let value_bytes = &data[value_start..value_end];
        if is_compound(tlv_type) {
            let mut subs = Vec::new();
            let mut pos = 0;
            while pos < value_bytes.len() {
                let (sub, next) = Tlv::parse(value_bytes, pos)?;
                subs.push(sub);
                pos = next;
            }
            Ok((Tlv::compound(tlv_type, subs), value_end))
        } else {
            Ok((Tlv::new(tlv_type, value_bytes.to_vec()), value_end))
        }
    }

    /// Parse every TLV in `data`, starting at offset 0, stopping (without
    /// error) at the first malformed TLV — matching the reference parser's
    /// tolerance of trailing garbage.
    pub fn parse_all(data: &[u8]) -> Vec<Tlv> {
        let mut tlvs = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            match Tlv::parse(data, offset) {
                Ok((tlv, next)) => {
                    tlvs.push(tlv);
                    offset = next;
                }
                Err(_) => break,
            }
        }
        tlvs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epc_tlv_parses_from_raw_bytes() {
        let payload = [0x01, 0x04, 0xE2, 0x80, 0x11, 0x22];
        let tlvs = Tlv::parse_all(&payload);
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].tlv_type, tlv_type::EPC);
        assert_eq!(tlvs[0].epc_value(), Some(&[0xE2, 0x80, 0x11, 0x22][..]));
    }

    #[test]
    fn round_trip_simple_tlv() {
        let tlv = Tlv::rssi(0x2A);
        let bytes = tlv.to_bytes();
        let (parsed, next) = Tlv::parse(&bytes, 0).unwrap();
        assert_eq!(next, bytes.len());
        assert_eq!(parsed, tlv);
        assert_eq!(parsed.rssi_value(), Some(0x2A));
    }

    #[test]
    fn round_trip_compound_tag() {
        let tag = Tlv::tag(vec![
            Tlv::epc(vec![0xE2, 0x80, 0x11, 0x22]),
            Tlv::rssi(0x30),
            Tlv::time(1_700_000_000),
            Tlv::tid(vec![0xAA, 0xBB]),
        ]);
        let bytes = tag.to_bytes();
        let (parsed, next) = Tlv::parse(&bytes, 0).unwrap();
        assert_eq!(next, bytes.len());
        assert_eq!(parsed, tag);
        assert_eq!(parsed.tag_epc(), Some(&[0xE2, 0x80, 0x11, 0x22][..]));
        assert_eq!(parsed.tag_rssi(), Some(0x30));
        assert_eq!(parsed.tag_time(), Some(1_700_000_000));
        assert_eq!(parsed.tag_tid(), Some(&[0xAA, 0xBB][..]));
    }

    #[test]
    fn truncated_tlv_value_is_an_error() {
        let data = [0x01, 0x04, 0xE2, 0x80]; // declares 4 bytes, only 2 present
        assert!(Tlv::parse(&data, 0).is_err());
    }

    #[test]
    fn parse_all_stops_at_first_malformed_tlv() {
        let mut data = Tlv::epc(vec![1, 2, 3]).to_bytes();
        data.push(0x05); // dangling RSSI type byte, no length/value follows
        let tlvs = Tlv::parse_all(&data);
        assert_eq!(tlvs.len(), 1);
    }

    #[test]
    fn device_type_name_known_and_unknown() {
        assert_eq!(Tlv::device_type_name(0x02), "Handheld RFID Reader");
        assert_eq!(Tlv::device_type_name(0x99), "Unknown Type");
    }

    #[test]
    fn unknown_type_preserved_as_opaque_bytes() {
        let tlv = Tlv::new(0x77, vec![9, 9, 9]);
        let bytes = tlv.to_bytes();
        let (parsed, _) = Tlv::parse(&bytes, 0).unwrap();
        assert_eq!(parsed.raw_value(), Some(&[9, 9, 9][..]));
    }
}
