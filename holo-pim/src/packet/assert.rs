//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Assert message (RFC 4601 §4.9.5): the metric comparison a router
//! loses or wins determines who forwards onto a shared LAN.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::addr::AssertMetric;
use crate::packet::consts::MessageType;
use crate::packet::error::DecodeResult;
use crate::packet::{EncodedGroupAddr, EncodedUnicastAddr};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Assert {
    pub group: EncodedGroupAddr,
    pub source: EncodedUnicastAddr,
    pub metric: AssertMetric,
}

impl Assert {
    const RPT_BIT_MASK: u32 = 0x8000_0000;
    const METRIC_MASK: u32 = !Self::RPT_BIT_MASK;

    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let group = EncodedGroupAddr::decode(buf)?;
        let source = EncodedUnicastAddr::decode(buf)?;
        let metric_preference_raw = buf.try_get_u32()?;
        let metric = buf.try_get_u32()?;
        let rpt_bit = metric_preference_raw & Self::RPT_BIT_MASK != 0;
        let metric_preference = metric_preference_raw & Self::METRIC_MASK;
        Ok(Assert {
            group,
            source,
            metric: AssertMetric::new(rpt_bit, metric_preference, metric, source.0),
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(crate::packet::consts::VERSION << 4 | MessageType::Assert as u8);
        buf.put_u8(0);
        buf.put_u16(0);
        self.group.encode(&mut buf);
        self.source.encode(&mut buf);
        let mut metric_preference_raw = self.metric.preference;
        if self.metric.rpt {
            metric_preference_raw |= Self::RPT_BIT_MASK;
        }
        buf.put_u32(metric_preference_raw);
        buf.put_u32(self.metric.metric);
        buf
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn assert_round_trips() {
        let msg = Assert {
            group: EncodedGroupAddr {
                addr: IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1)),
                mask_len: 32,
            },
            source: EncodedUnicastAddr(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 5))),
            metric: AssertMetric::new(
                true,
                0,
                1,
                IpAddr::V4(Ipv4Addr::new(192, 0, 2, 5)),
            ),
        };
        let encoded = msg.encode();
        // Strip the common header (4 bytes) the same way a real
        // dispatcher would before handing the body to `Assert::decode`.
        let mut body = Bytes::copy_from_slice(&encoded[4..]);
        let decoded = Assert::decode(&mut body).unwrap();
        assert_eq!(decoded, msg);
    }
}
