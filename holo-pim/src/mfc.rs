//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! PimMfc (C5): the forwarding-plane mirror of an (S,G)'s selected
//! outbound interface set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::addr::PimAddr;
use crate::collections::MfcId;
use crate::interface::Vid;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DataflowComparator {
    GreaterOrEqual,
    LessOrEqual,
}

#[derive(Clone, Copy, Debug)]
#[derive(Deserialize, Serialize)]
pub struct DataflowMonitor {
    pub threshold_packets: Option<u64>,
    pub threshold_bytes: Option<u64>,
    pub comparator: DataflowComparator,
    pub interval_secs: u32,
    pub is_one_shot: bool,
}

#[derive(Debug)]
pub struct PimMfc {
    pub id: MfcId,
    pub source: PimAddr,
    pub group: PimAddr,
    pub rp: Option<PimAddr>,
    pub iif: Option<Vid>,
    pub oifs: BTreeSet<Vid>,
    pub dataflow: Vec<DataflowMonitor>,
    // Mirrors `PimMre::is_task_delete_pending`; the MFC entry follows
    // the same delete-task discipline as an MRE (`spec.md` §3.3).
    pub is_task_delete_pending: bool,
}

impl PimMfc {
    /// `pub` (rather than `pub(crate)`) so `tests/conformance` can
    /// build fixture entries directly, matching [`PimMre::new`].
    pub fn new(id: MfcId, source: PimAddr, group: PimAddr) -> PimMfc {
        PimMfc {
            id,
            source,
            group,
            rp: None,
            iif: None,
            oifs: BTreeSet::new(),
            dataflow: Vec::new(),
            is_task_delete_pending: false,
        }
    }

    /// `iif = rpf_interface_s if (SPT bit OR no matching (*,G)) else
    /// rpf_interface_rp`.
    pub fn compute_iif(spt: bool, has_wc: bool, rpf_iface_s: Option<Vid>, rpf_iface_rp: Option<Vid>) -> Option<Vid> {
        if spt || !has_wc {
            rpf_iface_s
        } else {
            rpf_iface_rp
        }
    }

    /// `oifs = inherited_olist_sg if SPT else inherited_olist_sg_rpt`.
    pub fn compute_oifs(spt: bool, inherited_olist_sg: &BTreeSet<Vid>, inherited_olist_sg_rpt: &BTreeSet<Vid>) -> BTreeSet<Vid> {
        if spt {
            inherited_olist_sg.clone()
        } else {
            inherited_olist_sg_rpt.clone()
        }
    }

    /// Reprograms `iif`/`oifs`/`rp`; returns `true` if anything
    /// actually changed (so the southbound layer only reprograms the
    /// kernel MFC when needed — `spec.md` §8.2's `rp_changed`
    /// idempotence property).
    pub fn program(&mut self, iif: Option<Vid>, oifs: BTreeSet<Vid>, rp: Option<PimAddr>) -> bool {
        let changed = self.iif != iif || self.oifs != oifs || self.rp != rp;
        self.iif = iif;
        self.oifs = oifs;
        self.rp = rp;
        changed
    }

    pub fn entry_can_remove(&self) -> bool {
        self.iif.is_none() && self.oifs.is_empty() && self.dataflow.is_empty()
    }

    /// Evaluates a dataflow monitor upcall and returns whether it
    /// crossed its configured threshold (the caller feeds the result
    /// into `check_switch_to_spt_sg`).
    pub fn dataflow_crossed(monitor: &DataflowMonitor, packets: u64, bytes: u64) -> bool {
        match monitor.comparator {
            DataflowComparator::GreaterOrEqual => {
                monitor.threshold_packets.map(|t| packets >= t).unwrap_or(false)
                    || monitor.threshold_bytes.map(|t| bytes >= t).unwrap_or(false)
            }
            DataflowComparator::LessOrEqual => {
                monitor.threshold_packets.map(|t| packets <= t).unwrap_or(false)
                    || monitor.threshold_bytes.map(|t| bytes <= t).unwrap_or(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn a(o: u8) -> PimAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, o))
    }

    #[test]
    fn iif_follows_spt_bit() {
        assert_eq!(PimMfc::compute_iif(true, true, Some(Vid(1)), Some(Vid(2))), Some(Vid(1)));
        assert_eq!(PimMfc::compute_iif(false, true, Some(Vid(1)), Some(Vid(2))), Some(Vid(2)));
        assert_eq!(PimMfc::compute_iif(false, false, Some(Vid(1)), Some(Vid(2))), Some(Vid(1)));
    }

    #[test]
    fn program_reports_change() {
        let mut mfc = PimMfc::new(1, a(5), a(1));
        assert!(mfc.program(Some(Vid(1)), BTreeSet::from([Vid(2)]), None));
        assert!(!mfc.program(Some(Vid(1)), BTreeSet::from([Vid(2)]), None));
        assert!(mfc.program(Some(Vid(1)), BTreeSet::from([Vid(2), Vid(3)]), None));
    }

    #[test]
    fn dataflow_threshold_ge() {
        let monitor = DataflowMonitor {
            threshold_packets: Some(100),
            threshold_bytes: None,
            comparator: DataflowComparator::GreaterOrEqual,
            interval_secs: 10,
            is_one_shot: true,
        };
        assert!(PimMfc::dataflow_crossed(&monitor, 100, 0));
        assert!(!PimMfc::dataflow_crossed(&monitor, 99, 0));
    }
}
