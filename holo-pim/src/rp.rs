//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! RP-Set and per-RP processing lists (C2).
//!
//! BSR/Auto-RP dynamic RP-Set learning is out of scope (`spec.md`
//! §1); the RP-Set here is a static, northbound-configured mapping of
//! group prefixes to candidate RPs, consistent with every other
//! `holo` protocol crate's "the control plane outside this crate
//! resolves the dynamic part, we consume the result" boundary.

use std::collections::BTreeMap;

use generational_arena::Index;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::addr::PimAddr;
use crate::collections::{MfcId, MreId};

pub type RpIndex = Index;

/// A single RP-Set entry: `rp` serves every group covered by
/// `group_prefix`, at the given `priority` (lower wins, RFC 4601
/// §4.7.2's `RP_Preference` tie-break approximation — the real
/// BSR/Auto-RP hash-based tie-break is out of scope).
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RpSetEntry {
    pub rp_addr: PimAddr,
    pub group_prefix: IpNetwork,
    pub priority: u8,
}

/// A live RP object: created the first time some entry resolves to
/// it, holding the per-kind processing lists so that "all entries
/// bound to RP X" can be time-sliced (`spec.md` §4.2).
#[derive(Debug)]
pub struct PimRp {
    pub index: RpIndex,
    pub addr: PimAddr,
    pub processing: RpProcessingLists,
}

#[derive(Clone, Debug, Default)]
pub struct RpProcessingLists {
    pub mre_rp: Vec<MreId>,
    pub mre_wc: Vec<MreId>,
    pub mre_sg: Vec<MreId>,
    pub mre_sg_rpt: Vec<MreId>,
    pub mfc: Vec<MfcId>,
    // Transient lists populated by `init_processing_*`, drained one
    // entry at a time as a task processes them. A non-empty
    // `processing_*` list after a time-slice yield is exactly the
    // remaining work.
    pub processing_mre_rp: Vec<MreId>,
    pub processing_mre_wc: Vec<MreId>,
    pub processing_mre_sg: Vec<MreId>,
    pub processing_mre_sg_rpt: Vec<MreId>,
    pub processing_mfc: Vec<MfcId>,
}

impl PimRp {
    fn new(index: RpIndex, addr: PimAddr) -> PimRp {
        PimRp {
            index,
            addr,
            processing: Default::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RpTable {
    set: Vec<RpSetEntry>,
    arena: generational_arena::Arena<PimRp>,
    by_addr: BTreeMap<PimAddr, RpIndex>,
}

impl RpTable {
    /// Replaces the configured RP-Set wholesale (northbound commit).
    pub fn set_config(&mut self, entries: Vec<RpSetEntry>) {
        self.set = entries;
    }

    pub fn config(&self) -> &[RpSetEntry] {
        &self.set
    }

    /// Finds the currently elected RP address for `group`, per
    /// longest-prefix-match on the configured RP-Set, tie-broken by
    /// lowest `priority` and then by highest RP address (RFC 4601
    /// §4.7.2 order).
    pub fn rp_find(&self, group: PimAddr) -> Option<PimAddr> {
        self.set
            .iter()
            .filter(|e| e.group_prefix.contains(group))
            .max_by(|a, b| {
                let prefix_len =
                    a.group_prefix.prefix().cmp(&b.group_prefix.prefix());
                let priority = b.priority.cmp(&a.priority);
                let addr = a.rp_addr.cmp(&b.rp_addr);
                prefix_len.then(priority).then(addr)
            })
            .map(|e| e.rp_addr)
    }

    /// Returns the live [`PimRp`] object for `addr`, creating it if
    /// this is the first entry to reference it.
    pub fn get_or_create(&mut self, addr: PimAddr) -> RpIndex {
        if let Some(idx) = self.by_addr.get(&addr) {
            return *idx;
        }
        let idx = self.arena.insert_with(|idx| PimRp::new(idx, addr));
        self.by_addr.insert(addr, idx);
        idx
    }

    pub fn get(&self, idx: RpIndex) -> Option<&PimRp> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: RpIndex) -> Option<&mut PimRp> {
        self.arena.get_mut(idx)
    }

    pub fn find_live(&self, addr: PimAddr) -> Option<RpIndex> {
        self.by_addr.get(&addr).copied()
    }

    /// Drops the live RP object for `addr` once nothing references it
    /// any longer (all processing lists empty).
    pub fn try_remove(&mut self, addr: PimAddr) {
        if let Some(idx) = self.by_addr.get(&addr).copied()
            && let Some(rp) = self.arena.get(idx)
            && rp.processing.mre_rp.is_empty()
            && rp.processing.mre_wc.is_empty()
            && rp.processing.mre_sg.is_empty()
            && rp.processing.mre_sg_rpt.is_empty()
            && rp.processing.mfc.is_empty()
        {
            self.by_addr.remove(&addr);
            self.arena.remove(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::str::FromStr;

    use super::*;

    fn rp(o: u8) -> PimAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, o))
    }

    #[test]
    fn longest_prefix_wins() {
        let mut table = RpTable::default();
        table.set_config(vec![
            RpSetEntry {
                rp_addr: rp(1),
                group_prefix: IpNetwork::from_str("224.0.0.0/4").unwrap(),
                priority: 0,
            },
            RpSetEntry {
                rp_addr: rp(2),
                group_prefix: IpNetwork::from_str("239.1.0.0/16").unwrap(),
                priority: 0,
            },
        ]);
        let group = IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1));
        assert_eq!(table.rp_find(group), Some(rp(2)));
    }

    #[test]
    fn no_match_returns_none() {
        let table = RpTable::default();
        assert_eq!(table.rp_find(rp(9)), None);
    }

    #[test]
    fn live_rp_created_once() {
        let mut table = RpTable::default();
        let a = table.get_or_create(rp(1));
        let b = table.get_or_create(rp(1));
        assert_eq!(a, b);
    }

    #[test]
    fn try_remove_requires_empty_lists() {
        let mut table = RpTable::default();
        let idx = table.get_or_create(rp(1));
        table.get_mut(idx).unwrap().processing.mre_wc.push(MreId::from(1));
        table.try_remove(rp(1));
        assert!(table.find_live(rp(1)).is_some());
        table.get_mut(idx).unwrap().processing.mre_wc.clear();
        table.try_remove(rp(1));
        assert!(table.find_live(rp(1)).is_none());
    }
}
