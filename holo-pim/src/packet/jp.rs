//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Join/Prune message (RFC 4601 §4.9.1): one upstream-neighbor
//! address, a holdtime, and a list of per-group join/prune source
//! sets. [`JoinPrune`] is the wire-level mirror of the
//! [`crate::jp::JoinPruneAssembler`]'s in-memory aggregation.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::packet::consts::{
    ESA_FLAG_RPT, ESA_FLAG_SPARSE, ESA_FLAG_WC, MessageType,
};
use crate::packet::error::DecodeResult;
use crate::packet::{EncodedGroupAddr, EncodedSourceAddr, EncodedUnicastAddr};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinPrune {
    pub upstream_neighbor: EncodedUnicastAddr,
    pub holdtime: u16,
    pub groups: Vec<JpGroup>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JpGroup {
    pub group: EncodedGroupAddr,
    pub joins: Vec<EncodedSourceAddr>,
    pub prunes: Vec<EncodedSourceAddr>,
}

impl JoinPrune {
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let upstream_neighbor = EncodedUnicastAddr::decode(buf)?;
        let _reserved = buf.try_get_u8()?;
        let num_groups = buf.try_get_u8()?;
        let holdtime = buf.try_get_u16()?;

        let mut groups = Vec::with_capacity(num_groups as usize);
        for _ in 0..num_groups {
            let group = EncodedGroupAddr::decode(buf)?;
            let num_joins = buf.try_get_u16()?;
            let num_prunes = buf.try_get_u16()?;
            let mut joins = Vec::with_capacity(num_joins as usize);
            for _ in 0..num_joins {
                joins.push(EncodedSourceAddr::decode(buf)?);
            }
            let mut prunes = Vec::with_capacity(num_prunes as usize);
            for _ in 0..num_prunes {
                prunes.push(EncodedSourceAddr::decode(buf)?);
            }
            groups.push(JpGroup { group, joins, prunes });
        }

        Ok(JoinPrune {
            upstream_neighbor,
            holdtime,
            groups,
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(
            crate::packet::consts::VERSION << 4 | MessageType::JoinPrune as u8,
        );
        buf.put_u8(0);
        buf.put_u16(0);
        self.upstream_neighbor.encode(&mut buf);
        buf.put_u8(0);
        buf.put_u8(self.groups.len() as u8);
        buf.put_u16(self.holdtime);
        for group in &self.groups {
            group.group.encode(&mut buf);
            buf.put_u16(group.joins.len() as u16);
            buf.put_u16(group.prunes.len() as u16);
            for source in &group.joins {
                source.encode(&mut buf);
            }
            for source in &group.prunes {
                source.encode(&mut buf);
            }
        }
        buf
    }
}

/// Builds the Encoded-Source-Address flags byte for a given entry
/// kind (RFC 4601 §4.9.1's `,S,G` / `,*,G` / `,S,G,rpt` notation).
pub fn encode_source_flags(is_wc: bool, is_rpt: bool) -> u8 {
    let mut flags = ESA_FLAG_SPARSE;
    if is_wc {
        flags |= ESA_FLAG_WC;
    }
    if is_rpt {
        flags |= ESA_FLAG_RPT;
    }
    flags
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn a(o: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, o))
    }

    #[test]
    fn join_prune_round_trips() {
        let msg = JoinPrune {
            upstream_neighbor: EncodedUnicastAddr(a(1)),
            holdtime: 210,
            groups: vec![JpGroup {
                group: EncodedGroupAddr {
                    addr: IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1)),
                    mask_len: 32,
                },
                joins: vec![EncodedSourceAddr {
                    addr: a(5),
                    mask_len: 32,
                    flags: encode_source_flags(false, false),
                }],
                prunes: vec![],
            }],
        };
        let encoded = msg.encode();
        let mut body = Bytes::copy_from_slice(&encoded[4..]);
        let decoded = JoinPrune::decode(&mut body).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn source_flags_encode_wc_and_rpt() {
        assert_eq!(encode_source_flags(false, false), ESA_FLAG_SPARSE);
        assert_eq!(
            encode_source_flags(true, true),
            ESA_FLAG_SPARSE | ESA_FLAG_WC | ESA_FLAG_RPT
        );
    }
}
