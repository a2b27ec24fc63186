//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Family-aware address helpers and the Assert metric total order.

use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// An address used throughout the engine. Both variants of a running
/// instance are never mixed: the address family is fixed at startup
/// (see `spec.md` §3.1) and is enforced by [`PimAddr::same_family`].
pub type PimAddr = IpAddr;

/// The "multicast base" sentinel group used as the key for (*,*,RP)
/// entries, and the ZERO sentinel source used for (*,G) entries.
pub fn zero_addr(v4: bool) -> PimAddr {
    if v4 {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    }
}

pub fn is_zero_addr(addr: PimAddr) -> bool {
    addr.is_unspecified()
}

fn addr_to_u128(addr: PimAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn u128_to_addr(v4: bool, value: u128) -> PimAddr {
    if v4 {
        IpAddr::V4(Ipv4Addr::from(value as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(value))
    }
}

/// Returns the inclusive `(first, last)` address bounds of `prefix`,
/// used to turn the abstract "range iteration by prefix" requirement
/// of `spec.md` §4.6 (MrtTables `source_by_prefix_begin/end`) into a
/// concrete `BTreeMap` range query.
pub fn prefix_bounds(prefix: ipnetwork::IpNetwork) -> (PimAddr, PimAddr) {
    let v4 = prefix.is_ipv4();
    let width = if v4 { 32 } else { 128 };
    let base = addr_to_u128(prefix.ip());
    let host_bits = width - prefix.prefix() as u32;
    let mask = if host_bits == 0 {
        0
    } else {
        (1u128 << host_bits) - 1
    };
    let first = base & !mask;
    let last = first | mask;
    (u128_to_addr(v4, first), u128_to_addr(v4, last))
}

/// Assert message metric, compared per RFC 4601 §4.6.
///
/// A larger value under [`Ord`] means "better" (wins the Assert).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AssertMetric {
    // True if this metric was derived from (S,G,rpt)/(*,G) state
    // (i.e. it's an RPT-bit metric) rather than an (S,G) SPT metric.
    pub rpt: bool,
    pub preference: u32,
    pub metric: u32,
    pub origin: PimAddr,
}

impl AssertMetric {
    pub fn new(
        rpt: bool,
        preference: u32,
        metric: u32,
        origin: PimAddr,
    ) -> AssertMetric {
        AssertMetric {
            rpt,
            preference,
            metric,
            origin,
        }
    }

    /// The `AssertCancel` sentinel: always loses, used to withdraw a
    /// previously sent winning Assert.
    pub fn infinite(v4: bool) -> AssertMetric {
        AssertMetric {
            rpt: true,
            preference: u32::MAX >> 1,
            metric: u32::MAX,
            origin: zero_addr(v4),
        }
    }
}

// Rank used by both `Ord` and the explicit "is better than" helper:
// smaller rank wins preference-comparison order, but our `Ord` impl
// expresses "greater is better" directly, so we invert where needed.
impl Ord for AssertMetric {
    fn cmp(&self, other: &Self) -> Ordering {
        // Non-RPT (SPT) metrics always beat RPT metrics.
        match (self.rpt, other.rpt) {
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            _ => {}
        }
        // Lower preference is better routing-wise, but "better" here
        // means larger under this order, so preference compares
        // reversed.
        match other.preference.cmp(&self.preference) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match other.metric.cmp(&self.metric) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // Tie-break: higher originator address wins.
        self.origin.cmp(&other.origin)
    }
}

impl PartialOrd for AssertMetric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn m(rpt: bool, pref: u32, metric: u32, origin: u8) -> AssertMetric {
        AssertMetric::new(
            rpt,
            pref,
            metric,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, origin)),
        )
    }

    #[test]
    fn spt_beats_rpt() {
        let spt = m(false, 200, 200, 1);
        let rpt = m(true, 1, 1, 2);
        assert!(spt > rpt);
    }

    #[test]
    fn lower_preference_wins() {
        let better = m(false, 100, 10, 1);
        let worse = m(false, 110, 20, 2);
        assert!(better > worse);
    }

    #[test]
    fn lower_metric_wins_on_preference_tie() {
        let better = m(false, 100, 10, 1);
        let worse = m(false, 100, 20, 2);
        assert!(better > worse);
    }

    #[test]
    fn origin_breaks_full_tie() {
        let a = m(false, 100, 10, 5);
        let b = m(false, 100, 10, 9);
        assert!(b > a);
    }

    #[test]
    fn infinite_is_always_loser() {
        let inf = AssertMetric::infinite(true);
        let real = m(true, 1, 1, 1);
        assert!(real > inf);
    }

    #[test]
    fn scenario_s3_assert_loser() {
        // From spec.md §8.3 S3.
        let received = m(false, 100, 10, 1);
        let ours = m(false, 110, 20, 2);
        assert!(received > ours);
    }

    #[test]
    fn strict_total_order() {
        let a = m(false, 100, 10, 1);
        let b = m(false, 100, 10, 1);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a, b);
    }
}
