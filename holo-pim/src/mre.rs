//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Multicast Routing Entries (C4): the four PIM-SM entry variants and
//! their downstream/upstream/assert/register state machines.
//!
//! One Rust type, [`PimMre`], backs all four variants — (\*,\*,RP),
//! (\*,G), (S,G), (S,G,rpt) — distinguished by [`EntryKind`]. Carrying
//! them in a single type (rather than four) keeps the shared
//! outbound-interface-list algebra (RFC 4601 §4.1) in one place, the
//! way `holo-isis::lsdb::Lsp` carries both level-1 and level-2 LSPs
//! under one type tagged by `Level`.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use enum_as_inner::EnumAsInner;
use holo_utils::task::TimeoutTask;
use serde::{Deserialize, Serialize};

use crate::addr::{AssertMetric, PimAddr};
use crate::collections::{MfcId, MreId};
use crate::interface::Vid;
use crate::jp::{JpAction, JpEntryType};
use crate::mrib::MribEntry;
use crate::neighbor::NeighborIndex;
use crate::policy::PolicyTags;
use crate::rp::RpIndex;

/// Default Join/Prune-override-interval fallback when the downstream
/// interface's configured value isn't available to a caller.
pub const DEFAULT_JP_OVERRIDE_SECS: u64 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumAsInner)]
#[derive(Deserialize, Serialize)]
pub enum EntryKind {
    Rp,
    Wc,
    Sg,
    SgRpt,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DownstreamState {
    #[default]
    NoInfo,
    Join,
    PrunePending,
    Prune,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AssertState {
    #[default]
    NoInfo,
    Winner,
    Loser,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum UpstreamJp {
    #[default]
    NotJoined,
    Joined,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum UpstreamSgRpt {
    #[default]
    RptNotJoined,
    Pruned,
    NotPruned,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RegisterState {
    #[default]
    NoInfo,
    Join,
    Prune,
    JoinPending,
}

/// Downstream per-interface state, including the (S,G,rpt) Tmp layer
/// used by the two-phase end-of-message commit (`spec.md` §4.4.1,
/// grounded on `pim_mre_join_prune.cc`'s `rpt_*_tmp` bits).
#[derive(Debug, Default)]
pub struct DsIfState {
    pub state: DownstreamState,
    // Set only on (S,G,rpt) entries mid-message; committed or reverted
    // by `receive_end_of_message_sg_rpt`.
    pub tmp_state: Option<DownstreamState>,
    pub expiry_timer: Option<TimeoutTask>,
    pub prune_pending_timer: Option<TimeoutTask>,
}

#[derive(Debug, Default)]
pub struct AssertIfState {
    pub state: AssertState,
    pub winner_metric: Option<AssertMetric>,
    pub assert_timer: Option<TimeoutTask>,
    pub rate_limited: bool,
    pub rate_limit_timer: Option<TimeoutTask>,
}

/// A weak, re-derivable reference to another entry, identified by the
/// stable object id rather than the arena index so it survives being
/// looked up again after the target entry is recreated.
pub type MreLink = Option<MreId>;

#[derive(Debug)]
pub struct PimMre {
    pub id: MreId,
    pub kind: EntryKind,
    pub source: PimAddr,
    pub group: PimAddr,

    pub rp: Option<RpIndex>,
    pub sg_rpt_link: MreLink,
    pub sg_link: MreLink,
    pub wc_link: MreLink,
    pub rp_link: MreLink,

    pub mrib_rp: Option<MribEntry>,
    pub mrib_s: Option<MribEntry>,
    pub mrib_next_hop_rp: Option<NeighborIndex>,
    pub mrib_next_hop_s: Option<NeighborIndex>,
    pub rpfp_nbr_wc: Option<NeighborIndex>,
    pub rpfp_nbr_sg: Option<NeighborIndex>,
    pub rpfp_nbr_sg_rpt: Option<NeighborIndex>,

    pub downstream: BTreeMap<Vid, DsIfState>,
    pub assert: BTreeMap<Vid, AssertIfState>,
    pub local_receiver_include: BTreeSet<Vid>,
    pub local_receiver_exclude: BTreeSet<Vid>,
    pub could_assert: BTreeSet<Vid>,
    pub assert_tracking_desired: BTreeSet<Vid>,

    // RP/WC/SG upstream scalar (unused on SgRpt entries).
    pub upstream_jp: UpstreamJp,
    // SgRpt-only upstream scalar.
    pub upstream_sg_rpt: UpstreamSgRpt,
    // SG-only register sub-machine.
    pub register_state: RegisterState,
    // SG-only SPT bit.
    pub spt: bool,
    // SG-only: set once the kernel dataflow monitor (armed when
    // `spt_switch_threshold_packets` is configured) reports the
    // traffic threshold crossed; consulted by `check_switch_to_spt_sg`.
    pub dataflow_crossed: bool,

    pub join_timer: Option<TimeoutTask>,
    pub register_stop_timer: Option<TimeoutTask>,
    pub keepalive_timer: Option<TimeoutTask>,
    pub keepalive_running: bool,

    pub policy_tags: PolicyTags,

    pub is_task_delete_pending: bool,
    pub is_task_delete_done: bool,
}

impl PimMre {
    /// Constructs a bare entry with no links, no MRIB, and every
    /// per-interface map empty. `pub` (rather than `pub(crate)`) so
    /// `tests/conformance` can build fixture entries directly, the
    /// same way this module's own unit tests do.
    pub fn new(
        id: MreId,
        kind: EntryKind,
        source: PimAddr,
        group: PimAddr,
    ) -> PimMre {
        PimMre {
            id,
            kind,
            source,
            group,
            rp: None,
            sg_rpt_link: None,
            sg_link: None,
            wc_link: None,
            rp_link: None,
            mrib_rp: None,
            mrib_s: None,
            mrib_next_hop_rp: None,
            mrib_next_hop_s: None,
            rpfp_nbr_wc: None,
            rpfp_nbr_sg: None,
            rpfp_nbr_sg_rpt: None,
            downstream: BTreeMap::new(),
            assert: BTreeMap::new(),
            local_receiver_include: BTreeSet::new(),
            local_receiver_exclude: BTreeSet::new(),
            could_assert: BTreeSet::new(),
            assert_tracking_desired: BTreeSet::new(),
            upstream_jp: UpstreamJp::NotJoined,
            upstream_sg_rpt: UpstreamSgRpt::RptNotJoined,
            register_state: RegisterState::NoInfo,
            spt: false,
            dataflow_crossed: false,
            join_timer: None,
            register_stop_timer: None,
            keepalive_timer: None,
            keepalive_running: false,
            policy_tags: PolicyTags::new(),
            is_task_delete_pending: false,
            is_task_delete_done: false,
        }
    }

    // ===== downstream Join/Prune (§4.4.1) =====

    /// `receive_join(I, holdtime)`.
    pub fn receive_join(&mut self, vif: Vid, holdtime: u16, arm_expiry: impl FnOnce(u16) -> TimeoutTask) {
        let entry = self.downstream.entry(vif).or_default();
        match entry.state {
            DownstreamState::NoInfo | DownstreamState::Prune => {
                entry.state = DownstreamState::Join;
                entry.prune_pending_timer = None;
                entry.expiry_timer = Some(arm_expiry(holdtime));
            }
            DownstreamState::Join => {
                // Monotonic refresh: only extend, never shorten.
                let extend = entry
                    .expiry_timer
                    .as_ref()
                    .map(|t| t.remaining() < Duration::from_secs(holdtime as u64))
                    .unwrap_or(true);
                if extend {
                    entry.expiry_timer = Some(arm_expiry(holdtime));
                }
            }
            DownstreamState::PrunePending => {
                entry.state = DownstreamState::Join;
                entry.prune_pending_timer = None;
                entry.expiry_timer = Some(arm_expiry(holdtime));
            }
        }
    }

    /// `receive_prune(I, holdtime)`.
    pub fn receive_prune(
        &mut self,
        vif: Vid,
        multiple_neighbors: bool,
        override_interval: u16,
        arm_prune_pending: impl FnOnce(u16) -> TimeoutTask,
    ) {
        let entry = match self.downstream.get_mut(&vif) {
            Some(e) => e,
            None => return,
        };
        if entry.state == DownstreamState::Join {
            entry.state = DownstreamState::PrunePending;
            let delay = if multiple_neighbors { override_interval } else { 0 };
            entry.prune_pending_timer = Some(arm_prune_pending(delay));
        }
        // PrunePending/Prune/NoInfo: unchanged or ignored.
    }

    /// `prune_pending_timer` fires for `vif`. Returns `true` if a
    /// PruneEcho should be emitted (more than one neighbor on `vif`).
    pub fn prune_pending_expire(&mut self, vif: Vid, multiple_neighbors: bool) -> bool {
        if let Some(entry) = self.downstream.get_mut(&vif) {
            entry.state = DownstreamState::Prune;
            entry.prune_pending_timer = None;
        }
        multiple_neighbors
    }

    /// `expiry_timer` fires for `vif`.
    pub fn expiry_expire(&mut self, vif: Vid) {
        if let Some(entry) = self.downstream.get_mut(&vif) {
            entry.state = DownstreamState::NoInfo;
            entry.expiry_timer = None;
        }
    }

    /// (S,G,rpt)-only: moves `vif`'s state into the Tmp layer, leaving
    /// the committed `state` untouched until end-of-message.
    pub fn set_tmp_state(&mut self, vif: Vid, state: DownstreamState) {
        debug_assert_eq!(self.kind, EntryKind::SgRpt);
        self.downstream.entry(vif).or_default().tmp_state = Some(state);
    }

    /// `receive_end_of_message_sg_rpt`: commits every pending Tmp bit,
    /// reverting interfaces that never saw an explicit (S,G,rpt) Prune
    /// in this message back to their pre-message state.
    pub fn receive_end_of_message_sg_rpt(&mut self) {
        debug_assert_eq!(self.kind, EntryKind::SgRpt);
        for entry in self.downstream.values_mut() {
            if let Some(tmp) = entry.tmp_state.take() {
                entry.state = tmp;
            }
        }
    }

    // ===== outbound-interface-list algebra (§4.4.4) =====

    fn ds_in(&self, want: &[DownstreamState]) -> BTreeSet<Vid> {
        self.downstream
            .iter()
            .filter(|(_, s)| want.contains(&s.state))
            .map(|(v, _)| *v)
            .collect()
    }

    pub fn joins_rp(&self) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::Rp);
        self.ds_in(&[DownstreamState::Join, DownstreamState::PrunePending])
    }

    pub fn joins_wc(&self) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::Wc);
        self.ds_in(&[DownstreamState::Join, DownstreamState::PrunePending])
    }

    pub fn joins_sg(&self) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        self.ds_in(&[DownstreamState::Join, DownstreamState::PrunePending])
    }

    pub fn prunes_sg_rpt(&self) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::SgRpt);
        self.downstream
            .iter()
            .filter(|(_, s)| {
                s.state == DownstreamState::Prune || s.tmp_state == Some(DownstreamState::Prune)
            })
            .map(|(v, _)| *v)
            .collect()
    }

    fn assert_winners(&self) -> BTreeSet<Vid> {
        self.assert
            .iter()
            .filter(|(_, s)| s.state == AssertState::Winner)
            .map(|(v, _)| *v)
            .collect()
    }

    pub fn i_am_assert_loser(&self, vif: Vid) -> bool {
        self.assert
            .get(&vif)
            .map(|s| s.state == AssertState::Loser)
            .unwrap_or(false)
    }

    /// `pim_include_wc`/`pim_include_sg`/`pim_exclude_sg`, parameterized
    /// by which "i_am_dr" set and local-receiver set to use so the one
    /// formula serves all three (§4.4.4).
    fn pim_local(
        &self,
        dr_ifaces: &BTreeSet<Vid>,
        lost_assert: &BTreeSet<Vid>,
        local_receivers: &BTreeSet<Vid>,
    ) -> BTreeSet<Vid> {
        let winners = self.assert_winners();
        dr_ifaces
            .union(&winners)
            .copied()
            .collect::<BTreeSet<_>>()
            .difference(lost_assert)
            .copied()
            .collect::<BTreeSet<_>>()
            .intersection(local_receivers)
            .copied()
            .collect()
    }

    pub fn pim_include_wc(&self, dr_ifaces: &BTreeSet<Vid>, lost_assert_wc: &BTreeSet<Vid>) -> BTreeSet<Vid> {
        self.pim_local(dr_ifaces, lost_assert_wc, &self.local_receiver_include)
    }

    pub fn pim_include_sg(&self, dr_ifaces: &BTreeSet<Vid>, lost_assert_sg: &BTreeSet<Vid>) -> BTreeSet<Vid> {
        self.pim_local(dr_ifaces, lost_assert_sg, &self.local_receiver_include)
    }

    pub fn pim_exclude_sg(&self, dr_ifaces: &BTreeSet<Vid>, lost_assert_sg: &BTreeSet<Vid>) -> BTreeSet<Vid> {
        self.pim_local(dr_ifaces, lost_assert_sg, &self.local_receiver_exclude)
    }

    pub fn immediate_olist_wc(&self, dr_ifaces: &BTreeSet<Vid>, lost_assert_wc: &BTreeSet<Vid>) -> BTreeSet<Vid> {
        self.joins_wc()
            .union(&self.pim_include_wc(dr_ifaces, lost_assert_wc))
            .copied()
            .collect::<BTreeSet<_>>()
            .difference(lost_assert_wc)
            .copied()
            .collect()
    }

    pub fn immediate_olist_sg(&self, dr_ifaces: &BTreeSet<Vid>, lost_assert_sg: &BTreeSet<Vid>) -> BTreeSet<Vid> {
        self.joins_sg()
            .union(&self.pim_include_sg(dr_ifaces, lost_assert_sg))
            .copied()
            .collect::<BTreeSet<_>>()
            .difference(lost_assert_sg)
            .copied()
            .collect()
    }

    /// `lost_assert_wc(I)`.
    pub fn lost_assert_wc(&self, rpf_iface_rp: Option<Vid>) -> BTreeSet<Vid> {
        self.assert
            .iter()
            .filter(|(vif, s)| {
                s.state == AssertState::Loser && Some(**vif) != rpf_iface_rp
            })
            .map(|(v, _)| *v)
            .collect()
    }

    /// `lost_assert_sg(I)`.
    pub fn lost_assert_sg(
        &self,
        rpf_iface_s: Option<Vid>,
        spt_assert_metric: AssertMetric,
    ) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        self.assert
            .iter()
            .filter(|(vif, s)| {
                s.state == AssertState::Loser
                    && s.winner_metric.map(|m| m > spt_assert_metric).unwrap_or(false)
                    && Some(**vif) != rpf_iface_s
            })
            .map(|(v, _)| *v)
            .collect()
    }

    /// `lost_assert_sg_rpt(I)`, evaluated against the sibling (S,G)'s
    /// assert state and SPT bit (the caller passes them in since this
    /// entry is the (S,G,rpt) one).
    pub fn lost_assert_sg_rpt(
        sg: &PimMre,
        rpf_iface_rp: Option<Vid>,
        rpf_iface_s: Option<Vid>,
    ) -> BTreeSet<Vid> {
        debug_assert_eq!(sg.kind, EntryKind::Sg);
        sg.assert
            .iter()
            .filter(|(vif, s)| {
                s.state == AssertState::Loser
                    && Some(**vif) != rpf_iface_rp
                    && (!sg.spt || Some(**vif) != rpf_iface_s)
            })
            .map(|(v, _)| *v)
            .collect()
    }

    /// `inherited_olist_sg_rpt`. `wc` is the sibling (\*,G) and `rp`
    /// the sibling (\*,\*,RP); either may be absent, in which case its
    /// contribution is empty.
    #[allow(clippy::too_many_arguments)]
    pub fn inherited_olist_sg_rpt(
        &self,
        rp: Option<&PimMre>,
        wc: Option<&PimMre>,
        dr_ifaces: &BTreeSet<Vid>,
        lost_assert_wc: &BTreeSet<Vid>,
        lost_assert_sg_rpt: &BTreeSet<Vid>,
    ) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::SgRpt);
        let joins_rp = rp.map(|e| e.joins_rp()).unwrap_or_default();
        let joins_wc = wc.map(|e| e.joins_wc()).unwrap_or_default();
        let prunes = self.prunes_sg_rpt();
        let left = joins_rp
            .union(&joins_wc)
            .copied()
            .collect::<BTreeSet<_>>()
            .difference(&prunes)
            .copied()
            .collect::<BTreeSet<_>>();

        let pim_include_wc = wc
            .map(|e| e.pim_include_wc(dr_ifaces, lost_assert_wc))
            .unwrap_or_default();
        let pim_exclude_sg = self.pim_exclude_sg(dr_ifaces, lost_assert_sg_rpt);
        let right = pim_include_wc
            .difference(&pim_exclude_sg)
            .copied()
            .collect::<BTreeSet<_>>();

        let lost = lost_assert_wc
            .union(lost_assert_sg_rpt)
            .copied()
            .collect::<BTreeSet<_>>();

        left.union(&right)
            .copied()
            .collect::<BTreeSet<_>>()
            .difference(&lost)
            .copied()
            .collect()
    }

    /// `inherited_olist_sg`. If `sg_rpt` is `None` (no sibling entry
    /// exists yet), its contribution is synthesized inline from `rp`
    /// and `wc` by calling [`PimMre::inherited_olist_sg_rpt`] on a
    /// throwaway (S,G,rpt)-shaped view — invariant 5 of `spec.md` §8.1.
    pub fn inherited_olist_sg(
        &self,
        sg_rpt: Option<&PimMre>,
        rp: Option<&PimMre>,
        wc: Option<&PimMre>,
        dr_ifaces: &BTreeSet<Vid>,
        lost_assert_wc: &BTreeSet<Vid>,
        lost_assert_sg: &BTreeSet<Vid>,
        lost_assert_sg_rpt: &BTreeSet<Vid>,
    ) -> BTreeSet<Vid> {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        let rpt_part = match sg_rpt {
            Some(sg_rpt) => {
                sg_rpt.inherited_olist_sg_rpt(rp, wc, dr_ifaces, lost_assert_wc, lost_assert_sg_rpt)
            }
            None => {
                let synthetic = PimMre::new(0, EntryKind::SgRpt, self.source, self.group);
                synthetic.inherited_olist_sg_rpt(rp, wc, dr_ifaces, lost_assert_wc, lost_assert_sg_rpt)
            }
        };
        rpt_part
            .union(&self.immediate_olist_sg(dr_ifaces, lost_assert_sg))
            .copied()
            .collect()
    }

    // ===== upstream Join/Prune desired predicates (§4.4.2) =====

    pub fn is_join_desired_rp(&self) -> bool {
        !self.joins_rp().is_empty()
    }

    pub fn is_join_desired_wc(&self, assert_winner_metric_wc_on_rpf_rp: bool) -> bool {
        !self.joins_wc().is_empty() || assert_winner_metric_wc_on_rpf_rp
    }

    pub fn is_join_desired_sg(&self, inherited_olist_nonempty: bool) -> bool {
        !self.joins_sg().is_empty() || (self.keepalive_running && inherited_olist_nonempty)
    }

    /// `is_prune_desired_sg_rpt`. `rpt_join_desired_g` is the sibling
    /// (\*,G)'s "is there any RPT interest in this group" predicate;
    /// `inherited_olist_empty` is this entry's own
    /// `inherited_olist_sg_rpt().is_empty()`.
    pub fn is_prune_desired_sg_rpt(
        &self,
        rpt_join_desired_g: bool,
        inherited_olist_empty: bool,
        spt_set: bool,
        rpfp_nbr_wc_ne_sg: bool,
    ) -> bool {
        rpt_join_desired_g && (inherited_olist_empty || (spt_set && rpfp_nbr_wc_ne_sg))
    }

    // ===== Register sub-machine (§4.4.5) =====

    pub fn register_receive_stop(&mut self, is_current_dr: bool, arm_register_stop: impl FnOnce() -> TimeoutTask) {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        if !is_current_dr {
            return;
        }
        match self.register_state {
            RegisterState::Join | RegisterState::JoinPending => {
                self.register_state = RegisterState::Prune;
                self.register_stop_timer = Some(arm_register_stop());
            }
            RegisterState::Prune | RegisterState::NoInfo => {}
        }
    }

    /// Register-stop timer expiry: Prune -> JoinPending, re-triggering
    /// one encapsulated data packet before returning to Join.
    pub fn register_stop_expire(&mut self) {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        if self.register_state == RegisterState::Prune {
            self.register_state = RegisterState::JoinPending;
        }
    }

    pub fn register_set_desired(&mut self, could_register: bool) {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        self.register_state = match (self.register_state, could_register) {
            (RegisterState::NoInfo, true) => RegisterState::Join,
            (RegisterState::Join, false) => RegisterState::NoInfo,
            (RegisterState::JoinPending, _) => RegisterState::Join,
            (other, _) => other,
        };
    }

    // ===== SPT switch (§4.4.6) =====

    pub fn check_switch_to_spt_sg(&mut self, threshold_reached: bool) -> bool {
        debug_assert_eq!(self.kind, EntryKind::Sg);
        if threshold_reached && !self.spt {
            self.spt = true;
            true
        } else {
            false
        }
    }

    // ===== removal (§3.3) =====

    pub fn entry_can_remove(&self, rp_still_in_rp_set: bool) -> bool {
        let downstream_empty = self
            .downstream
            .values()
            .all(|s| s.state == DownstreamState::NoInfo);
        let upstream_noinfo = match self.kind {
            EntryKind::Rp | EntryKind::Wc | EntryKind::Sg => {
                self.upstream_jp == UpstreamJp::NotJoined
            }
            EntryKind::SgRpt => self.upstream_sg_rpt == UpstreamSgRpt::RptNotJoined,
        };
        let register_noinfo = self.register_state == RegisterState::NoInfo;
        let timers_idle =
            self.keepalive_timer.is_none() && self.assert.values().all(|a| a.assert_timer.is_none());
        let receivers_empty =
            self.local_receiver_include.is_empty() && self.local_receiver_exclude.is_empty();
        let rp_gone = self.kind != EntryKind::Rp || !rp_still_in_rp_set;

        downstream_empty
            && upstream_noinfo
            && register_noinfo
            && timers_idle
            && receivers_empty
            && rp_gone
    }
}

/// An upstream Join/Prune emission request produced by recomputing an
/// upstream state machine, handed to the instance layer so it can
/// resolve the target neighbor and append to its [`JoinPruneAssembler`].
#[derive(Clone, Debug)]
pub struct JpEmission {
    pub neighbor: NeighborIndex,
    pub target: PimAddr,
    pub mask_len: u8,
    pub source: PimAddr,
    pub entry_type: JpEntryType,
    pub action: JpAction,
    pub holdtime: u16,
    pub new_group: bool,
}

/// A single MFC entry's dependent id set, used when an RP or (\*,G)
/// deletion needs to reprogram downstream MFC entries.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct MfcDependent(pub MfcId);

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn sg_entry() -> PimMre {
        let source = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let group = IpAddr::V4(Ipv4Addr::new(232, 0, 0, 1));
        PimMre::new(1, EntryKind::Sg, source, group)
    }

    #[test]
    fn spt_switch_ignores_unreached_threshold() {
        let mut entry = sg_entry();
        assert!(!entry.spt);
        assert!(!entry.check_switch_to_spt_sg(false));
        assert!(!entry.spt);
    }

    #[test]
    fn spt_switch_flips_once_on_threshold_reached() {
        let mut entry = sg_entry();
        assert!(entry.check_switch_to_spt_sg(true));
        assert!(entry.spt);
        // Already on the SPT: a second crossing is a no-op, not a
        // repeated transition.
        assert!(!entry.check_switch_to_spt_sg(true));
    }

    #[test]
    fn dataflow_crossed_starts_false() {
        let entry = sg_entry();
        assert!(!entry.dataflow_crossed);
    }

    #[test]
    fn register_receive_stop_ignored_when_not_dr() {
        let mut entry = sg_entry();
        entry.register_state = RegisterState::Join;
        entry.register_receive_stop(false, || unreachable!("not the DR"));
        assert_eq!(entry.register_state, RegisterState::Join);
    }

    #[test]
    fn register_receive_stop_moves_join_to_prune() {
        let mut entry = sg_entry();
        entry.register_state = RegisterState::Join;
        entry.register_receive_stop(true, || {
            TimeoutTask::new(Duration::from_secs(60), || async {})
        });
        assert_eq!(entry.register_state, RegisterState::Prune);
        assert!(entry.register_stop_timer.is_some());
    }

    #[test]
    fn register_stop_expire_cycles_prune_to_join_pending() {
        let mut entry = sg_entry();
        entry.register_state = RegisterState::Prune;
        entry.register_stop_expire();
        assert_eq!(entry.register_state, RegisterState::JoinPending);
        // Expiry only makes sense coming from Prune.
        entry.register_state = RegisterState::NoInfo;
        entry.register_stop_expire();
        assert_eq!(entry.register_state, RegisterState::NoInfo);
    }

    #[test]
    fn entry_can_remove_requires_idle_state() {
        let entry = sg_entry();
        assert!(entry.entry_can_remove(true));

        let mut busy = sg_entry();
        busy.upstream_jp = UpstreamJp::Joined;
        assert!(!busy.entry_can_remove(true));
    }

    #[test]
    fn entry_can_remove_rp_waits_for_rp_set_removal() {
        let entry = PimMre::new(
            2,
            EntryKind::Rp,
            IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1)),
            zero_addr(true),
        );
        assert!(!entry.entry_can_remove(true));
        assert!(entry.entry_can_remove(false));
    }
}
