//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! MribView (C1): the incrementally-maintained unicast RPF trie.
//!
//! Unicast route computation itself is out of scope (`spec.md` §1):
//! `holo-routing` computes the RIB and pushes MRIB-relevant entries to
//! this crate over ibus (`southbound::rx`), which calls
//! [`MribView::begin`]/[`add_pending_insert`]/[`commit`] the same way
//! `holo-isis::route` consumes SPF results into the RIB.

use std::collections::BTreeSet;

use holo_utils::ip::IpAddrExt;
use ipnetwork::IpNetwork;
use prefix_trie::joint::map::JointPrefixMap;
use serde::{Deserialize, Serialize};

use crate::addr::PimAddr;
use crate::interface::Vid;

/// A single resolved RPF lookup result.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct MribEntry {
    pub next_hop: PimAddr,
    pub iif: Vid,
    pub metric_preference: u32,
    pub metric: u32,
}

/// A prefix whose best route may have changed, coalesced so that
/// overlapping prefixes collapse into their enclosing one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModifiedPrefix(pub IpNetwork);

#[derive(Debug, Default)]
pub struct MribView {
    trie: JointPrefixMap<IpNetwork, MribEntry>,
    // Entries inserted before their named interface existed; retried
    // whenever a matching interface appears (`spec.md` §4.1).
    deferred: Vec<(IpNetwork, MribEntry)>,
    pending_insert: Vec<(IpNetwork, MribEntry)>,
    pending_remove: Vec<IpNetwork>,
    down_ifaces: BTreeSet<Vid>,
}

impl MribView {
    /// Longest-prefix match for `addr`. Returns `None` if the best
    /// route's next-hop interface is administratively/operationally
    /// down.
    pub fn find(&self, addr: PimAddr) -> Option<MribEntry> {
        let prefix = addr.to_host_prefix();
        self.trie
            .get_lpm(&prefix)
            .map(|(_, entry)| *entry)
            .filter(|entry| !self.down_ifaces.contains(&entry.iif))
    }

    pub fn begin(&mut self) {
        self.pending_insert.clear();
        self.pending_remove.clear();
    }

    pub fn add_pending_insert(&mut self, prefix: IpNetwork, entry: MribEntry) {
        self.pending_insert.push((prefix, entry));
    }

    pub fn add_pending_remove(&mut self, prefix: IpNetwork) {
        self.pending_remove.push(prefix);
    }

    /// Applies the pending batch and returns the coalesced list of
    /// prefixes that may have changed.
    pub fn commit(&mut self) -> Vec<ModifiedPrefix> {
        let mut touched = Vec::new();

        for prefix in self.pending_remove.drain(..) {
            self.trie.remove(&prefix);
            touched.push(prefix);
        }
        for (prefix, entry) in self.pending_insert.drain(..) {
            self.trie.insert(prefix, entry);
            touched.push(prefix);
        }

        coalesce(touched)
    }

    /// Notifies the view that `vif` just came up; retries any deferred
    /// insert that was waiting on an interface of this name.
    pub fn retry_deferred(&mut self, vif: Vid) -> Vec<ModifiedPrefix> {
        let (ready, still_deferred): (Vec<_>, Vec<_>) =
            self.deferred.drain(..).partition(|(_, e)| e.iif == vif);
        self.deferred = still_deferred;
        let mut touched = Vec::new();
        for (prefix, entry) in ready {
            self.trie.insert(prefix, entry);
            touched.push(prefix);
        }
        coalesce(touched)
    }

    pub fn defer(&mut self, prefix: IpNetwork, entry: MribEntry) {
        self.deferred.push((prefix, entry));
    }

    pub fn set_iface_down(&mut self, vif: Vid) {
        self.down_ifaces.insert(vif);
    }

    pub fn set_iface_up(&mut self, vif: Vid) {
        self.down_ifaces.remove(&vif);
    }
}

/// Merges prefixes that fall inside another touched prefix into their
/// enclosing one, per `spec.md` §4.1's "coalesced list" requirement.
fn coalesce(mut prefixes: Vec<IpNetwork>) -> Vec<ModifiedPrefix> {
    prefixes.sort_by_key(|p| p.prefix());
    let mut result: Vec<IpNetwork> = Vec::new();
    'next: for p in prefixes {
        for kept in &result {
            if kept.contains(p.ip()) && kept.prefix() <= p.prefix() {
                continue 'next;
            }
        }
        result.retain(|kept| !(p.contains(kept.ip()) && p.prefix() <= kept.prefix()));
        result.push(p);
    }
    result.into_iter().map(ModifiedPrefix).collect()
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::str::FromStr;

    use super::*;

    fn entry(iif: u32) -> MribEntry {
        MribEntry {
            next_hop: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            iif: Vid(iif),
            metric_preference: 110,
            metric: 1,
        }
    }

    #[test]
    fn longest_prefix_match() {
        let mut view = MribView::default();
        view.begin();
        view.add_pending_insert(IpNetwork::from_str("10.0.0.0/8").unwrap(), entry(1));
        view.add_pending_insert(IpNetwork::from_str("10.0.0.1/32").unwrap(), entry(2));
        view.commit();

        let found = view.find(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))).unwrap();
        assert_eq!(found.iif, Vid(2));
    }

    #[test]
    fn down_iface_hides_route() {
        let mut view = MribView::default();
        view.begin();
        view.add_pending_insert(IpNetwork::from_str("10.0.0.1/32").unwrap(), entry(1));
        view.commit();
        view.set_iface_down(Vid(1));
        assert!(view.find(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))).is_none());
    }

    #[test]
    fn coalesce_merges_overlapping() {
        let touched = vec![
            IpNetwork::from_str("10.0.0.0/8").unwrap(),
            IpNetwork::from_str("10.1.0.0/16").unwrap(),
        ];
        let merged = coalesce(touched);
        assert_eq!(merged.len(), 1);
    }
}
