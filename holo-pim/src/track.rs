//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! TrackState (C7): the static table mapping each input event to the
//! ordered list of output recomputations it drives, segregated by
//! entry kind so a task can be scoped to the kinds it actually
//! affects.
//!
//! The table is declarative: [`TrackState::build`] constructs it once
//! from per-input builder functions, each of which lists its
//! recomputations in dependency order (a recomputation that reads
//! another's result is listed after it), mirroring the "output-state
//! names its prerequisites" construction called for by `spec.md`
//! §4.7. [`dedup_tail`] then removes a later duplicate of an output
//! already present in the same per-kind list, since recomputing it
//! twice in one task slice is redundant.

use std::collections::HashMap;

/// Identifies which upward API entry point produced a task, without
/// its payload — the key into [`TrackState`]'s table. Names match
/// `spec.md` §6.2 verbatim.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InputState {
    RpChanged,
    MribChanged,
    DeleteMribEntries,
    PimNbrChanged,
    PimNbrGenIdChanged,
    ReceiveJoinRp,
    ReceiveJoinWc,
    ReceiveJoinSg,
    ReceiveJoinSgRpt,
    ReceivePruneRp,
    ReceivePruneWc,
    ReceivePruneSg,
    ReceivePruneSgRpt,
    SeePruneWc,
    ReceiveEndOfMessageSgRpt,
    DownstreamJpStateRp,
    DownstreamJpStateWc,
    DownstreamJpStateSg,
    DownstreamJpStateSgRpt,
    UpstreamJpStateSg,
    LocalReceiverIncludeWc,
    LocalReceiverIncludeSg,
    LocalReceiverExcludeWc,
    LocalReceiverExcludeSg,
    AssertStateWc,
    AssertStateSg,
    IAmDr,
    MyIpAddress,
    MyIpSubnetAddress,
    SptSwitchThresholdChanged,
    WasSwitchToSptDesiredSg,
    KeepaliveTimerSg,
    SptbitSg,
    StartVif,
    StopVif,
    AddPimMre,
    DeletePimMre,
    DeletePimMfc,
}

/// One recomputation action, dispatched in `task.rs` to a method on
/// `PimMre`/`PimMfc` (or an instance-level helper that needs
/// cross-entry context, such as `immediate_olist_wc`).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OutputState {
    RecomputeRpfRp,
    RecomputeRpfS,
    RecomputeRpBinding,
    RecomputeCouldAssertWc,
    RecomputeCouldAssertSg,
    RecomputeAssertTrackingDesiredWc,
    RecomputeAssertTrackingDesiredSg,
    RecomputeLostAssertWc,
    RecomputeLostAssertSg,
    RecomputeLostAssertSgRpt,
    RecomputeImmediateOlistWc,
    RecomputeImmediateOlistSg,
    RecomputeInheritedOlistSgRpt,
    RecomputeInheritedOlistSg,
    RecomputeIsJoinDesiredRp,
    RecomputeIsJoinDesiredWc,
    RecomputeIsJoinDesiredSg,
    RecomputeIsPruneDesiredSgRpt,
    RecomputeAssertWinnerMetric,
    RecomputeRegisterState,
    RecomputeSptSwitch,
    RecomputeIifOlistMfc,
    RecomputeEntryTryRemove,
}

/// Per-input, per-kind ordered action lists.
#[derive(Clone, Debug, Default)]
pub struct InputActions {
    pub rp: Vec<OutputState>,
    pub wc: Vec<OutputState>,
    pub sg: Vec<OutputState>,
    pub sg_rpt: Vec<OutputState>,
    pub mfc: Vec<OutputState>,
}

#[derive(Debug)]
pub struct TrackState {
    table: HashMap<InputState, InputActions>,
}

fn dedup_tail(actions: Vec<OutputState>) -> Vec<OutputState> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(actions.len());
    for a in actions {
        if seen.insert(a) {
            result.push(a);
        }
    }
    result
}

// ===== per-output-state prerequisite lists (the declarative part) =====

fn pre_rpf_rp() -> Vec<OutputState> {
    vec![OutputState::RecomputeRpfRp]
}

fn pre_rpf_s() -> Vec<OutputState> {
    vec![OutputState::RecomputeRpfS]
}

fn pre_is_join_desired_wc() -> Vec<OutputState> {
    let mut v = pre_rpf_rp();
    v.extend([
        OutputState::RecomputeCouldAssertWc,
        OutputState::RecomputeLostAssertWc,
        OutputState::RecomputeImmediateOlistWc,
        OutputState::RecomputeIsJoinDesiredWc,
    ]);
    v
}

fn pre_is_join_desired_sg() -> Vec<OutputState> {
    let mut v = pre_rpf_s();
    v.extend([
        OutputState::RecomputeCouldAssertSg,
        OutputState::RecomputeLostAssertSg,
        OutputState::RecomputeImmediateOlistSg,
        OutputState::RecomputeInheritedOlistSg,
        OutputState::RecomputeIsJoinDesiredSg,
        OutputState::RecomputeRegisterState,
    ]);
    v
}

fn pre_is_prune_desired_sg_rpt() -> Vec<OutputState> {
    vec![
        OutputState::RecomputeLostAssertSgRpt,
        OutputState::RecomputeInheritedOlistSgRpt,
        OutputState::RecomputeIsPruneDesiredSgRpt,
    ]
}

fn pre_mfc() -> Vec<OutputState> {
    vec![OutputState::RecomputeIifOlistMfc]
}

fn pre_remove() -> Vec<OutputState> {
    vec![OutputState::RecomputeEntryTryRemove]
}

impl TrackState {
    pub fn build() -> TrackState {
        let mut table = HashMap::new();

        let mut insert = |input: InputState, rp: Vec<OutputState>, wc: Vec<OutputState>, sg: Vec<OutputState>, sg_rpt: Vec<OutputState>, mfc: Vec<OutputState>| {
            table.insert(
                input,
                InputActions {
                    rp: dedup_tail(rp),
                    wc: dedup_tail(wc),
                    sg: dedup_tail(sg),
                    sg_rpt: dedup_tail(sg_rpt),
                    mfc: dedup_tail(mfc),
                },
            );
        };

        insert(
            InputState::MribChanged,
            [pre_rpf_rp(), vec![OutputState::RecomputeIsJoinDesiredRp, OutputState::RecomputeEntryTryRemove]].concat(),
            pre_is_join_desired_wc(),
            pre_is_join_desired_sg(),
            pre_is_prune_desired_sg_rpt(),
            pre_mfc(),
        );
        insert(InputState::DeleteMribEntries, pre_remove(), pre_remove(), pre_remove(), pre_remove(), vec![]);
        insert(
            InputState::RpChanged,
            [pre_rpf_rp(), vec![OutputState::RecomputeRpBinding, OutputState::RecomputeIsJoinDesiredRp]].concat(),
            [vec![OutputState::RecomputeRpBinding], pre_is_join_desired_wc()].concat(),
            vec![],
            vec![],
            pre_mfc(),
        );
        insert(InputState::PimNbrChanged, pre_rpf_rp(), pre_is_join_desired_wc(), pre_is_join_desired_sg(), pre_is_prune_desired_sg_rpt(), pre_mfc());
        insert(InputState::PimNbrGenIdChanged, pre_rpf_rp(), vec![], vec![], vec![], vec![]);

        insert(InputState::ReceiveJoinRp, vec![OutputState::RecomputeIsJoinDesiredRp], vec![], vec![], vec![], vec![]);
        insert(InputState::ReceiveJoinWc, vec![], pre_is_join_desired_wc(), vec![], vec![], vec![]);
        insert(InputState::ReceiveJoinSg, vec![], vec![], pre_is_join_desired_sg(), vec![], pre_mfc());
        insert(InputState::ReceiveJoinSgRpt, vec![], vec![], vec![], pre_is_prune_desired_sg_rpt(), pre_mfc());
        insert(InputState::ReceivePruneRp, vec![OutputState::RecomputeIsJoinDesiredRp], vec![], vec![], vec![], vec![]);
        insert(InputState::ReceivePruneWc, vec![], pre_is_join_desired_wc(), vec![], vec![], vec![]);
        insert(InputState::ReceivePruneSg, vec![], vec![], pre_is_join_desired_sg(), vec![], pre_mfc());
        insert(InputState::ReceivePruneSgRpt, vec![], vec![], vec![], pre_is_prune_desired_sg_rpt(), pre_mfc());
        insert(InputState::SeePruneWc, vec![], pre_is_join_desired_wc(), vec![], vec![], vec![]);
        insert(InputState::ReceiveEndOfMessageSgRpt, vec![], vec![], vec![], pre_is_prune_desired_sg_rpt(), pre_mfc());

        insert(InputState::DownstreamJpStateRp, vec![OutputState::RecomputeIsJoinDesiredRp], vec![], vec![], vec![], vec![]);
        insert(InputState::DownstreamJpStateWc, vec![], pre_is_join_desired_wc(), vec![], vec![], vec![]);
        insert(InputState::DownstreamJpStateSg, vec![], vec![], pre_is_join_desired_sg(), vec![], pre_mfc());
        insert(InputState::DownstreamJpStateSgRpt, vec![], vec![], vec![], pre_is_prune_desired_sg_rpt(), pre_mfc());
        insert(InputState::UpstreamJpStateSg, vec![], vec![], vec![OutputState::RecomputeEntryTryRemove], vec![], vec![]);

        insert(InputState::LocalReceiverIncludeWc, vec![], pre_is_join_desired_wc(), vec![], vec![], vec![]);
        insert(InputState::LocalReceiverIncludeSg, vec![], vec![], pre_is_join_desired_sg(), vec![], pre_mfc());
        insert(InputState::LocalReceiverExcludeWc, vec![], pre_is_join_desired_wc(), vec![], vec![], vec![]);
        insert(InputState::LocalReceiverExcludeSg, vec![], vec![], pre_is_join_desired_sg(), vec![], pre_mfc());

        insert(
            InputState::AssertStateWc,
            vec![],
            [vec![OutputState::RecomputeAssertWinnerMetric], pre_is_join_desired_wc()].concat(),
            vec![],
            pre_is_prune_desired_sg_rpt(),
            vec![],
        );
        insert(
            InputState::AssertStateSg,
            vec![],
            vec![],
            [vec![OutputState::RecomputeAssertWinnerMetric], pre_is_join_desired_sg()].concat(),
            pre_is_prune_desired_sg_rpt(),
            pre_mfc(),
        );

        insert(InputState::IAmDr, vec![], pre_is_join_desired_wc(), pre_is_join_desired_sg(), vec![], pre_mfc());
        insert(InputState::MyIpAddress, pre_rpf_rp(), pre_is_join_desired_wc(), pre_is_join_desired_sg(), vec![], pre_mfc());
        insert(InputState::MyIpSubnetAddress, vec![], vec![], vec![], vec![], vec![]);

        insert(InputState::SptSwitchThresholdChanged, vec![], vec![], vec![OutputState::RecomputeSptSwitch], vec![], pre_mfc());
        insert(InputState::WasSwitchToSptDesiredSg, vec![], vec![], vec![OutputState::RecomputeSptSwitch], vec![], pre_mfc());
        insert(InputState::KeepaliveTimerSg, vec![], vec![], pre_is_join_desired_sg(), vec![], vec![]);
        insert(
            InputState::SptbitSg,
            vec![],
            vec![],
            [vec![OutputState::RecomputeSptSwitch], pre_is_join_desired_sg()].concat(),
            pre_is_prune_desired_sg_rpt(),
            pre_mfc(),
        );

        insert(InputState::StartVif, pre_rpf_rp(), pre_is_join_desired_wc(), pre_is_join_desired_sg(), pre_is_prune_desired_sg_rpt(), pre_mfc());
        insert(InputState::StopVif, pre_rpf_rp(), pre_is_join_desired_wc(), pre_is_join_desired_sg(), pre_is_prune_desired_sg_rpt(), pre_mfc());

        insert(InputState::AddPimMre, pre_rpf_rp(), pre_is_join_desired_wc(), pre_is_join_desired_sg(), pre_is_prune_desired_sg_rpt(), vec![]);
        insert(InputState::DeletePimMre, pre_remove(), pre_remove(), pre_remove(), pre_remove(), vec![]);
        insert(InputState::DeletePimMfc, vec![], vec![], vec![], vec![], pre_remove());

        TrackState { table }
    }

    pub fn actions(&self, input: InputState) -> &InputActions {
        self.table.get(&input).unwrap_or(EMPTY_ACTIONS)
    }
}

static EMPTY_ACTIONS: &InputActions = &InputActions {
    rp: Vec::new(),
    wc: Vec::new(),
    sg: Vec::new(),
    sg_rpt: Vec::new(),
    mfc: Vec::new(),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mrib_changed_drives_all_kinds() {
        let table = TrackState::build();
        let actions = table.actions(InputState::MribChanged);
        assert!(!actions.rp.is_empty());
        assert!(!actions.wc.is_empty());
        assert!(!actions.sg.is_empty());
        assert!(!actions.mfc.is_empty());
    }

    #[test]
    fn dedup_removes_repeated_tail() {
        let deduped = dedup_tail(vec![
            OutputState::RecomputeRpfRp,
            OutputState::RecomputeIsJoinDesiredRp,
            OutputState::RecomputeRpfRp,
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn unknown_input_has_empty_actions() {
        let table = TrackState::build();
        let actions = table.actions(InputState::MyIpSubnetAddress);
        assert!(actions.rp.is_empty() && actions.mfc.is_empty());
    }
}
