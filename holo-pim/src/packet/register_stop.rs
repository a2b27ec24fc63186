//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Register-Stop message (RFC 4601 §4.9.4): sent by the RP to tell the
//! first-hop router to cancel its Register encapsulation.

use bytes::BufMut;
use bytes::{Bytes, BytesMut};

use crate::packet::consts::MessageType;
use crate::packet::error::DecodeResult;
use crate::packet::{EncodedGroupAddr, EncodedUnicastAddr};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegisterStop {
    pub group: EncodedGroupAddr,
    pub source: EncodedUnicastAddr,
}

impl RegisterStop {
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let group = EncodedGroupAddr::decode(buf)?;
        let source = EncodedUnicastAddr::decode(buf)?;
        Ok(RegisterStop { group, source })
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(
            crate::packet::consts::VERSION << 4 | MessageType::RegisterStop as u8,
        );
        buf.put_u8(0);
        buf.put_u16(0);
        self.group.encode(&mut buf);
        self.source.encode(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn register_stop_round_trips() {
        let msg = RegisterStop {
            group: EncodedGroupAddr {
                addr: IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1)),
                mask_len: 32,
            },
            // A Register-Stop's source field holds the original
            // packet's source address, which may be the wildcard
            // `0.0.0.0` when the RP is acknowledging a (*,G) Register.
            source: EncodedUnicastAddr(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 5))),
        };
        let encoded = msg.encode();
        let mut body = Bytes::copy_from_slice(&encoded[4..]);
        let decoded = RegisterStop::decode(&mut body).unwrap();
        assert_eq!(decoded, msg);
    }
}
