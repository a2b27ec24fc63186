//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! The upward API (`spec.md` §6.2): every place outside the scheduler
//! that learns of a state change calls one of these methods to enqueue
//! a [`MreTask`] rather than recomputing anything inline. Each method
//! is named after the [`InputState`] variant it produces and reads the
//! affected entry ids off the processing lists already maintained on
//! [`PimRp`]/[`PimNbr`] (C2/C3) or off the `MrtTables` key-trees
//! (C6) for MRIB-driven/global events.

use ipnetwork::IpNetwork;

use crate::addr::{AssertMetric, PimAddr, zero_addr};
use crate::collections::{MfcId, MreId, MrtTables};
use crate::instance::{InstanceArenas, InstanceUpView};
use crate::interface::Vid;
use crate::mre::{AssertState, EntryKind};
use crate::mrib::ModifiedPrefix;
use crate::neighbor::NbrProcessingLists;
use crate::packet::consts::{ESA_FLAG_RPT, ESA_FLAG_WC};
use crate::rp::RpProcessingLists;
use crate::task::{MreTask, find_index_for_kind};
use crate::track::InputState;

/// Decodes a Join/Prune group's source entry into the `(kind, key
/// source, key group)` triple [`InstanceUpView::mre_find`] expects,
/// following the wire convention (*,*,RP) = WC+RPT flags with the RP
/// address carried in the source field, (*,G) = WC only with the
/// group's wildcard group address ignored, (S,G,rpt) = RPT only.
fn jp_entry_kind(
    flags: u8,
    source: PimAddr,
    group: PimAddr,
) -> (EntryKind, PimAddr, PimAddr) {
    let is_wc = flags & ESA_FLAG_WC != 0;
    let is_rpt = flags & ESA_FLAG_RPT != 0;
    match (is_wc, is_rpt) {
        (true, true) => (EntryKind::Rp, source, source),
        (true, false) => (EntryKind::Wc, group, group),
        (false, true) => (EntryKind::SgRpt, source, group),
        (false, false) => (EntryKind::Sg, source, group),
    }
}

/// Dispatches a decoded Join/Prune message's groups onto the upward
/// API (`spec.md` §4.4.1), resolving or creating the target entry for
/// each source entry and scheduling the matching `ReceiveJoin*`/
/// `ReceivePrune*` task.
pub fn process_join_prune(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    vid: Vid,
    _src: PimAddr,
    jp: crate::packet::jp::JoinPrune,
) -> Result<(), crate::error::Error> {
    let Some(iface) = arenas.interfaces.get_by_vid(vid) else {
        return Ok(());
    };
    if iface.state.primary_addr != Some(jp.upstream_neighbor.0) {
        // Not addressed to us: on a shared LAN other routers' J/P
        // messages are used only for Join-suppression/Prune-override,
        // which is folded into Hello/neighbor processing and thus out
        // of scope (`spec.md` §1 Non-goals).
        return Ok(());
    }

    for group in &jp.groups {
        for source in &group.joins {
            let (kind, key_source, key_group) =
                jp_entry_kind(source.flags, source.addr, group.group.addr);
            let Some(id) = instance.mre_find(kind, key_source, key_group, true) else {
                continue;
            };
            match kind {
                EntryKind::Rp => instance.add_task_receive_join_rp(id),
                EntryKind::Wc => instance.add_task_receive_join_wc(id),
                EntryKind::Sg => instance.add_task_receive_join_sg(id),
                EntryKind::SgRpt => instance.add_task_receive_join_sg_rpt(id),
            }
        }
        for source in &group.prunes {
            let (kind, key_source, key_group) =
                jp_entry_kind(source.flags, source.addr, group.group.addr);
            // Prunes never create an entry that wasn't already there:
            // pruning something we have no state for is a no-op.
            let Some(id) = instance.mre_find(kind, key_source, key_group, false) else {
                continue;
            };
            match kind {
                EntryKind::Rp => instance.add_task_receive_prune_rp(id),
                EntryKind::Wc => instance.add_task_receive_prune_wc(id),
                EntryKind::Sg => instance.add_task_receive_prune_sg(id),
                EntryKind::SgRpt => instance.add_task_receive_prune_sg_rpt(id),
            }
        }
    }
    Ok(())
}

/// RFC 4601 §4.6.1's three-state Assert machine, generalized across
/// the (S,G) and (*,G) entries that share the same per-interface
/// [`AssertIfState`](crate::mre::AssertIfState) representation. Only
/// the receive-side transitions are modeled: defending a win by
/// re-sending our own Assert is deferred (`DESIGN.md`), so a Winner
/// that hears an inferior Assert simply stays Winner without
/// re-asserting.
pub fn process_assert(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    vid: Vid,
    _src: PimAddr,
    assert: crate::packet::assert::Assert,
) -> Result<(), crate::error::Error> {
    let Some(_iface) = arenas.interfaces.get_by_vid(vid) else {
        return Ok(());
    };

    let rx = assert.metric;
    let kind = if assert.metric.rpt { EntryKind::Wc } else { EntryKind::Sg };
    let (source, group) = if kind == EntryKind::Wc {
        (zero_addr(assert.group.addr.is_ipv4()), assert.group.addr)
    } else {
        (assert.source.0, assert.group.addr)
    };
    let Some(id) = instance.mre_find(kind, source, group, true) else {
        return Ok(());
    };

    let tables = &mut instance.state.tables;
    let Some(idx) = find_index_for_kind(tables, kind, id) else {
        return Ok(());
    };
    let Some(entry) = tables.mre_arena.get_mut(idx) else {
        return Ok(());
    };
    let could_assert = entry.could_assert.contains(&vid);
    let ifstate = entry.assert.entry(vid).or_default();

    match ifstate.state {
        AssertState::NoInfo => {
            if could_assert {
                ifstate.state = AssertState::Loser;
                ifstate.winner_metric = Some(rx);
            }
        }
        AssertState::Winner => {
            let mine = ifstate.winner_metric.unwrap_or(AssertMetric::infinite(rx.origin.is_ipv4()));
            if rx > mine {
                ifstate.state = AssertState::Loser;
                ifstate.winner_metric = Some(rx);
            }
        }
        AssertState::Loser => {
            let better_than_stored = ifstate.winner_metric.map(|m| rx > m).unwrap_or(true);
            if better_than_stored {
                ifstate.winner_metric = Some(rx);
            }
        }
    }

    match kind {
        EntryKind::Wc => instance.add_task_assert_state_wc(id),
        EntryKind::Sg => instance.add_task_assert_state_sg(id),
        _ => {}
    }
    Ok(())
}

/// The first-hop side of the Register sub-machine (`spec.md` §4.4.5):
/// a Register-Stop acknowledges this router's own Register
/// encapsulation and resolves the (S,G) it targets from the message's
/// own source/group fields (this router acts as the registering
/// first-hop, not the RP, so no neighbor lookup is involved). Only the
/// currently registering DR honors it; a non-DR or an already-Pruned
/// entry ignores a stray or duplicate Register-Stop.
pub fn process_register_stop(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    _vid: Vid,
    rs: crate::packet::register_stop::RegisterStop,
) -> Result<(), crate::error::Error> {
    let Some(id) = instance.mre_find(EntryKind::Sg, rs.source.0, rs.group.addr, false) else {
        return Ok(());
    };

    let tables = &mut instance.state.tables;
    let Some(idx) = tables.mre_sg.get_by_id(id) else {
        return Ok(());
    };
    let Some(entry) = tables.mre_arena.get_mut(idx) else {
        return Ok(());
    };
    let is_current_dr = entry
        .mrib_s
        .map(|mrib| mrib.iif)
        .and_then(|vid| arenas.interfaces.get_by_vid(vid))
        .is_some_and(|iface| iface.state.is_dr);

    let register_stop_timerp = instance.tx.protocol_input.register_stop_timer.clone();
    entry.register_receive_stop(is_current_dr, || {
        crate::tasks::register_stop_timer(id, &register_stop_timerp)
    });
    Ok(())
}

impl InstanceUpView<'_> {
    fn enqueue(&mut self, task: MreTask) {
        self.state.scheduler.add_task(task);
        if self.state.tick_timer.is_none() {
            self.state.tick_timer =
                Some(crate::tasks::mre_tick_timer(&self.tx.protocol_input.mre_tick));
        }
    }

    fn enqueue_from_lists(
        &mut self,
        input: InputState,
        rp: &[MreId],
        wc: &[MreId],
        sg: &[MreId],
        sg_rpt: &[MreId],
        mfc: &[MfcId],
    ) {
        let mut task = MreTask::new(input);
        for &id in rp {
            task.rp.push(id);
        }
        for &id in wc {
            task.wc.push(id);
        }
        for &id in sg {
            task.sg.push(id);
        }
        for &id in sg_rpt {
            task.sg_rpt.push(id);
        }
        for &id in mfc {
            if !task.mfc.pending.contains(&id) {
                task.mfc.pending.push(id);
            }
        }
        self.enqueue(task);
    }

    /// `add_task_rp_changed`: the RP-Set binding for `lists`'s RP
    /// changed (new candidate RP elected, or priority/prefix updated).
    pub fn add_task_rp_changed(&mut self, lists: &RpProcessingLists) {
        self.enqueue_from_lists(
            InputState::RpChanged,
            &lists.mre_rp,
            &lists.mre_wc,
            &lists.mre_sg,
            &lists.mre_sg_rpt,
            &lists.mfc,
        );
    }

    /// `add_task_mrib_changed`: the unicast RPF view changed for the
    /// given coalesced prefixes. Looks up affected (S,G)/(S,G,rpt)
    /// entries by prefix and affected (*,*,RP)/(*,G) entries by
    /// address-in-prefix containment.
    pub fn add_task_mrib_changed(
        &mut self,
        tables: &MrtTables,
        prefixes: &[ModifiedPrefix],
    ) {
        let mut task = MreTask::new(InputState::MribChanged);
        for ModifiedPrefix(prefix) in prefixes {
            for (addr, idx) in tables.mre_rp.iter_with_addr() {
                if prefix.contains(addr) {
                    task.rp.push(tables.mre_arena[idx].id);
                }
            }
            for (addr, idx) in tables.mre_wc.iter_with_addr() {
                if prefix.contains(addr) {
                    task.wc.push(tables.mre_arena[idx].id);
                }
            }
            for idx in tables.mre_sg.source_by_prefix(*prefix) {
                task.sg.push(tables.mre_arena[idx].id);
            }
            for idx in tables.mre_sg_rpt.source_by_prefix(*prefix) {
                task.sg_rpt.push(tables.mre_arena[idx].id);
            }
            for idx in tables.mfc.source_by_prefix(*prefix) {
                let id = tables.mfc_arena[idx].id;
                if !task.mfc.pending.contains(&id) {
                    task.mfc.pending.push(id);
                }
            }
        }
        self.enqueue(task);
    }

    /// `add_task_delete_mrib_entries`: the named prefixes were
    /// withdrawn entirely (as opposed to re-pointed); entries that
    /// depended on them are scheduled for removal rather than
    /// recomputation.
    pub fn add_task_delete_mrib_entries(
        &mut self,
        tables: &MrtTables,
        prefixes: &[IpNetwork],
    ) {
        let mut task = MreTask::new(InputState::DeleteMribEntries);
        for prefix in prefixes {
            for (addr, idx) in tables.mre_rp.iter_with_addr() {
                if prefix.contains(addr) {
                    task.rp.push(tables.mre_arena[idx].id);
                }
            }
            for (addr, idx) in tables.mre_wc.iter_with_addr() {
                if prefix.contains(addr) {
                    task.wc.push(tables.mre_arena[idx].id);
                }
            }
            for idx in tables.mre_sg.source_by_prefix(*prefix) {
                task.sg.push(tables.mre_arena[idx].id);
            }
            for idx in tables.mre_sg_rpt.source_by_prefix(*prefix) {
                task.sg_rpt.push(tables.mre_arena[idx].id);
            }
        }
        self.enqueue(task);
    }

    /// `add_task_pim_nbr_changed`: a neighbor's reachability or
    /// metric changed; entries using it as an RPF'/upstream neighbor
    /// must be re-evaluated.
    pub fn add_task_pim_nbr_changed(&mut self, lists: &NbrProcessingLists) {
        self.enqueue_from_lists(
            InputState::PimNbrChanged,
            &lists.mre_rp,
            &lists.mre_wc,
            &lists.mre_sg,
            &lists.mre_sg_rpt,
            &lists.mfc,
        );
    }

    /// `add_task_pim_nbr_gen_id_changed`: the neighbor's Generation ID
    /// changed, meaning it lost state and every (*,*,RP) entry RPF'd
    /// through it must re-send its Join.
    pub fn add_task_pim_nbr_gen_id_changed(&mut self, lists: &NbrProcessingLists) {
        self.enqueue_from_lists(
            InputState::PimNbrGenIdChanged,
            &lists.mre_rp,
            &[],
            &[],
            &[],
            &[],
        );
    }

    /// Shared helper for the ten `ReceiveJoin*`/`ReceivePrune*`/
    /// `SeePruneWc`/`ReceiveEndOfMessageSgRpt` single-entry events:
    /// each always targets exactly one already-resolved entry.
    fn add_task_single(&mut self, input: InputState, kind: SingleKind, id: MreId) {
        let mut task = MreTask::new(input);
        match kind {
            SingleKind::Rp => task.rp.push(id),
            SingleKind::Wc => task.wc.push(id),
            SingleKind::Sg => task.sg.push(id),
            SingleKind::SgRpt => task.sg_rpt.push(id),
        }
        self.enqueue(task);
    }

    pub fn add_task_receive_join_rp(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceiveJoinRp, SingleKind::Rp, id);
    }

    pub fn add_task_receive_join_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceiveJoinWc, SingleKind::Wc, id);
    }

    pub fn add_task_receive_join_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceiveJoinSg, SingleKind::Sg, id);
    }

    pub fn add_task_receive_join_sg_rpt(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceiveJoinSgRpt, SingleKind::SgRpt, id);
    }

    pub fn add_task_receive_prune_rp(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceivePruneRp, SingleKind::Rp, id);
    }

    pub fn add_task_receive_prune_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceivePruneWc, SingleKind::Wc, id);
    }

    pub fn add_task_receive_prune_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceivePruneSg, SingleKind::Sg, id);
    }

    pub fn add_task_receive_prune_sg_rpt(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceivePruneSgRpt, SingleKind::SgRpt, id);
    }

    pub fn add_task_see_prune_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::SeePruneWc, SingleKind::Wc, id);
    }

    pub fn add_task_receive_end_of_message_sg_rpt(&mut self, id: MreId) {
        self.add_task_single(InputState::ReceiveEndOfMessageSgRpt, SingleKind::SgRpt, id);
    }

    pub fn add_task_downstream_jp_state_rp(&mut self, id: MreId) {
        self.add_task_single(InputState::DownstreamJpStateRp, SingleKind::Rp, id);
    }

    pub fn add_task_downstream_jp_state_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::DownstreamJpStateWc, SingleKind::Wc, id);
    }

    pub fn add_task_downstream_jp_state_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::DownstreamJpStateSg, SingleKind::Sg, id);
    }

    pub fn add_task_downstream_jp_state_sg_rpt(&mut self, id: MreId) {
        self.add_task_single(InputState::DownstreamJpStateSgRpt, SingleKind::SgRpt, id);
    }

    pub fn add_task_upstream_jp_state_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::UpstreamJpStateSg, SingleKind::Sg, id);
    }

    pub fn add_task_local_receiver_include_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::LocalReceiverIncludeWc, SingleKind::Wc, id);
    }

    pub fn add_task_local_receiver_include_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::LocalReceiverIncludeSg, SingleKind::Sg, id);
    }

    pub fn add_task_local_receiver_exclude_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::LocalReceiverExcludeWc, SingleKind::Wc, id);
    }

    pub fn add_task_local_receiver_exclude_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::LocalReceiverExcludeSg, SingleKind::Sg, id);
    }

    pub fn add_task_assert_state_wc(&mut self, id: MreId) {
        self.add_task_single(InputState::AssertStateWc, SingleKind::Wc, id);
    }

    pub fn add_task_assert_state_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::AssertStateSg, SingleKind::Sg, id);
    }

    pub fn add_task_spt_switch_threshold_changed(&mut self, ids: &[MreId]) {
        let mut task = MreTask::new(InputState::SptSwitchThresholdChanged);
        for &id in ids {
            task.sg.push(id);
        }
        self.enqueue(task);
    }

    pub fn add_task_was_switch_to_spt_desired_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::WasSwitchToSptDesiredSg, SingleKind::Sg, id);
    }

    pub fn add_task_keepalive_timer_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::KeepaliveTimerSg, SingleKind::Sg, id);
    }

    pub fn add_task_sptbit_sg(&mut self, id: MreId) {
        self.add_task_single(InputState::SptbitSg, SingleKind::Sg, id);
    }

    /// `add_task_i_am_dr`/`add_task_my_ip_address`/
    /// `add_task_my_ip_subnet_address`: DR status or local-address
    /// facts for an interface changed; every entry with downstream or
    /// assert state on that interface is re-evaluated. The caller (the
    /// interface layer) supplies the already-filtered id lists since
    /// per-interface membership isn't tracked by a dedicated
    /// processing list (`spec.md` §9 Open Question: left as an
    /// instance-wide re-scan rather than a new per-interface index).
    pub fn add_task_i_am_dr(&mut self, wc: &[MreId], sg: &[MreId]) {
        self.enqueue_from_lists(InputState::IAmDr, &[], wc, sg, &[], &[]);
    }

    pub fn add_task_my_ip_address(&mut self, rp: &[MreId], wc: &[MreId], sg: &[MreId]) {
        self.enqueue_from_lists(InputState::MyIpAddress, rp, wc, sg, &[], &[]);
    }

    pub fn add_task_my_ip_subnet_address(&mut self) {
        self.enqueue(MreTask::new(InputState::MyIpSubnetAddress));
    }

    pub fn add_task_start_vif(&mut self, rp: &[MreId], wc: &[MreId], sg: &[MreId], sg_rpt: &[MreId]) {
        self.enqueue_from_lists(InputState::StartVif, rp, wc, sg, sg_rpt, &[]);
    }

    pub fn add_task_stop_vif(&mut self, rp: &[MreId], wc: &[MreId], sg: &[MreId], sg_rpt: &[MreId]) {
        self.enqueue_from_lists(InputState::StopVif, rp, wc, sg, sg_rpt, &[]);
    }

    pub fn add_task_add_pim_mre(&mut self, kind: SingleKind, id: MreId) {
        self.add_task_single(InputState::AddPimMre, kind, id);
    }

    pub fn add_task_delete_pim_mre(&mut self, kind: SingleKind, id: MreId) {
        self.add_task_single(InputState::DeletePimMre, kind, id);
    }

    pub fn add_task_delete_pim_mfc(&mut self, id: MfcId) {
        let mut task = MreTask::new(InputState::DeletePimMfc);
        task.mfc.pending.push(id);
        self.enqueue(task);
    }
}

/// Selects which of the four MRE kind-selectors a single-entry event
/// targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SingleKind {
    Rp,
    Wc,
    Sg,
    SgRpt,
}
