//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Wire formats for the PIM messages this engine actually emits or
//! consumes on the control channel: Assert, Register-Stop, and the
//! Join/Prune group-set encoding shared by both directions. Hello and
//! Register (data-encapsulating) messages aren't modeled here since
//! neighbor liveness and the Register data path are out of scope
//! (`spec.md` Non-goals).

pub mod assert;
pub mod consts;
pub mod error;
pub mod jp;
pub mod register_stop;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use internet_checksum::Checksum;
use num_traits::FromPrimitive;

use crate::addr::PimAddr;
use crate::packet::consts::{self, AddressFamily, ENCODING_TYPE_NATIVE, MessageType};
use crate::packet::error::{DecodeError, DecodeResult};

/// Writes the RFC 4601 §4.9 Internet checksum into an encoded
/// message's reserved checksum field (bytes 2..4). Every `encode()`
/// in this module leaves those bytes zeroed; the network layer calls
/// this right before handing the buffer to the socket.
pub fn finalize_checksum(buf: &mut BytesMut) {
    buf[2..4].copy_from_slice(&[0, 0]);
    let mut cksum = Checksum::new();
    cksum.add_bytes(&buf[..]);
    buf[2..4].copy_from_slice(&cksum.checksum());
}

/// Decodes and verifies the 4-byte PIM common header (RFC 4601 §4.9),
/// returning the message type. On success `buf` is left positioned
/// at the start of the message body, ready for the per-type decoder.
pub fn decode_header(buf: &mut Bytes) -> DecodeResult<MessageType> {
    let mut unmasked = BytesMut::from(&buf[..]);
    if unmasked.len() < 4 {
        return Err(DecodeError::ReadOutOfBounds);
    }
    unmasked[2..4].copy_from_slice(&[0, 0]);
    let mut cksum = Checksum::new();
    cksum.add_bytes(&unmasked[..]);

    let first = buf.try_get_u8()?;
    let version = first >> 4;
    if version != consts::VERSION {
        return Err(DecodeError::InvalidVersion(version));
    }
    let msg_type = first & 0x0F;
    let _reserved = buf.try_get_u8()?;
    let rx_cksum = buf.try_get_u16()?;
    if cksum.checksum() != rx_cksum.to_be_bytes() {
        return Err(DecodeError::InvalidChecksum);
    }

    MessageType::from_u8(msg_type).ok_or(DecodeError::UnknownMessageType(msg_type))
}

/// An Encoded-Unicast-Address (RFC 4601 §4.9.1): no mask length, used
/// for RP/neighbor addresses such as the Assert sender.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncodedUnicastAddr(pub PimAddr);

impl EncodedUnicastAddr {
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let family = decode_family(buf)?;
        let _encoding = buf.try_get_u8()?;
        let addr = decode_addr(buf, family)?;
        Ok(EncodedUnicastAddr(addr))
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        encode_family(buf, self.0);
        buf.put_u8(ENCODING_TYPE_NATIVE);
        encode_addr(buf, self.0);
    }
}

/// An Encoded-Group-Address (RFC 4601 §4.9.1).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncodedGroupAddr {
    pub addr: PimAddr,
    pub mask_len: u8,
}

impl EncodedGroupAddr {
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let family = decode_family(buf)?;
        let _encoding = buf.try_get_u8()?;
        let _reserved = buf.try_get_u8()?;
        let mask_len = buf.try_get_u8()?;
        let addr = decode_addr(buf, family)?;
        Ok(EncodedGroupAddr { addr, mask_len })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        encode_family(buf, self.addr);
        buf.put_u8(ENCODING_TYPE_NATIVE);
        buf.put_u8(0);
        buf.put_u8(self.mask_len);
        encode_addr(buf, self.addr);
    }
}

/// An Encoded-Source-Address (RFC 4601 §4.9.1), carrying the
/// Sparse/WC/RPT flags used by Join/Prune group sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncodedSourceAddr {
    pub addr: PimAddr,
    pub mask_len: u8,
    pub flags: u8,
}

impl EncodedSourceAddr {
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let family = decode_family(buf)?;
        let _encoding = buf.try_get_u8()?;
        let flags = buf.try_get_u8()?;
        let mask_len = buf.try_get_u8()?;
        let addr = decode_addr(buf, family)?;
        Ok(EncodedSourceAddr { addr, mask_len, flags })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        encode_family(buf, self.addr);
        buf.put_u8(ENCODING_TYPE_NATIVE);
        buf.put_u8(self.flags);
        buf.put_u8(self.mask_len);
        encode_addr(buf, self.addr);
    }
}

fn decode_family(buf: &mut Bytes) -> DecodeResult<AddressFamily> {
    let family = buf.try_get_u8()?;
    AddressFamily::from_u8(family).ok_or(DecodeError::InvalidAddressFamily(family))
}

fn encode_family(buf: &mut BytesMut, addr: PimAddr) {
    let family = match addr {
        IpAddr::V4(_) => AddressFamily::Ipv4,
        IpAddr::V6(_) => AddressFamily::Ipv6,
    };
    buf.put_u8(family as u8);
}

fn decode_addr(buf: &mut Bytes, family: AddressFamily) -> DecodeResult<PimAddr> {
    match family {
        AddressFamily::Ipv4 => {
            let octets = buf.try_get_u32()?;
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        AddressFamily::Ipv6 => {
            let mut octets = [0u8; 16];
            buf.try_copy_to_slice(&mut octets)?;
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
    }
}

fn encode_addr(buf: &mut BytesMut, addr: PimAddr) {
    match addr {
        IpAddr::V4(addr) => buf.put_u32(addr.into()),
        IpAddr::V6(addr) => buf.put_slice(&addr.octets()),
    }
}
