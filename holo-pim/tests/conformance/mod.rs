//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Engine-level conformance scenarios, driven directly against
//! [`MrtTables`]/[`Scheduler`]/[`Interfaces`]/[`Neighbors`] the way
//! `mre.rs`/`track.rs`/`scheduler.rs`'s own `#[cfg(test)]` modules
//! exercise single entries, but end to end across the dependency-
//! driven scheduler. Each scenario below is named after its S1-S6
//! counterpart.
//!
//! This harness drives the Scheduler (C9) rather than `Instance`
//! (N1): `PimMre`/`PimMfc` construction is `pub` precisely so this
//! crate can build fixtures without the channel/northbound plumbing
//! that `holo-isis/tests/conformance`'s topology-YAML harness needs,
//! which PIM-SM's own Non-goals (no Hello/topology bring-up, no wire
//! parsing beyond Assert/Register-Stop) make unnecessary here.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use holo_pim::addr::{zero_addr, AssertMetric};
use holo_pim::collections::{Interfaces, MrtTables, Neighbors};
use holo_pim::interface::Vid;
use holo_pim::mre::{AssertState, DownstreamState, EntryKind, PimMre};
use holo_pim::mrib::MribEntry;
use holo_pim::scheduler::{new_task, Scheduler};
use holo_pim::task::MreTask;
use holo_pim::track::{InputState, TrackState};

const RP: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
const GROUP: IpAddr = IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1));
const SOURCE: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 5));
const JP_HOLDTIME: u16 = 210;

fn arm(secs: u16) -> holo_utils::task::TimeoutTask {
    holo_utils::task::TimeoutTask::new(Duration::from_secs(secs as u64), || async {})
}

/// A router with `if0` (upstream, towards the RP/source) and `if1`,
/// `if2` (downstream, towards receivers), matching `spec.md` §8.3's
/// fixed topology.
struct Fixture {
    tables: MrtTables,
    interfaces: Interfaces,
    neighbors: Neighbors,
    track: TrackState,
    if0: Vid,
    if1: Vid,
    if2: Vid,
}

impl Fixture {
    fn new() -> Fixture {
        let mut interfaces = Interfaces::default();
        let if0 = interfaces.insert("if0").vid;
        let if1 = interfaces.insert("if1").vid;
        let if2 = interfaces.insert("if2").vid;
        Fixture {
            tables: MrtTables::default(),
            interfaces,
            neighbors: Neighbors::default(),
            track: TrackState::build(),
            if0,
            if1,
            if2,
        }
    }

    /// Drains the scheduler, same cooperative loop
    /// `tasks::process_mre_tick` runs one slice of at a time.
    fn drain(&mut self, sched: &mut Scheduler) {
        while !sched.is_empty() {
            sched.tick(&mut self.tables, &self.interfaces, &mut self.neighbors, &self.track);
        }
    }

    fn insert_wc(&mut self, group: IpAddr) -> u32 {
        let idx = self.tables.mre_wc.insert(&mut self.tables.mre_arena, group, |id| {
            PimMre::new(id, EntryKind::Wc, zero_addr(group.is_ipv4()), group)
        });
        self.tables.mre_arena[idx].id
    }

    fn insert_sg(&mut self, source: IpAddr, group: IpAddr) -> u32 {
        let idx = self
            .tables
            .mre_sg
            .insert(&mut self.tables.mre_arena, source, group, |id| PimMre::new(id, EntryKind::Sg, source, group));
        self.tables.mre_arena[idx].id
    }

    fn run_single(&mut self, input: InputState, kind: EntryKind, id: u32) {
        let mut task = new_task(input);
        match kind {
            EntryKind::Rp => task.rp.push(id),
            EntryKind::Wc => task.wc.push(id),
            EntryKind::Sg => task.sg.push(id),
            EntryKind::SgRpt => task.sg_rpt.push(id),
        }
        let mut sched = Scheduler::default();
        sched.add_task(task);
        self.drain(&mut sched);
    }
}

/// S1: a last-hop router receives a (\*,G) Join on a downstream
/// interface and must start forwarding onto it, moving the entry's
/// upstream Join/Prune state to `Joined`.
#[test]
fn s1_shared_tree_join_at_last_hop() {
    let mut fx = Fixture::new();
    let wc_id = fx.insert_wc(GROUP);

    let nbr = fx.neighbors.insert(fx.if0, RP);
    let entry = fx.tables.mre_wc.get_by_addr(GROUP).and_then(|idx| fx.tables.mre_arena.get_mut(idx)).unwrap();
    entry.mrib_rp = Some(MribEntry { next_hop: RP, iif: fx.if0, metric_preference: 0, metric: 0 });
    entry.mrib_next_hop_rp = Some(nbr);
    assert!(entry.joins_wc().is_empty());
    entry.receive_join(fx.if1, JP_HOLDTIME, arm);

    assert_eq!(entry.joins_wc(), [fx.if1].into_iter().collect());
    assert_eq!(entry.upstream_jp, holo_pim::mre::UpstreamJp::NotJoined);

    fx.run_single(InputState::ReceiveJoinWc, EntryKind::Wc, wc_id);

    let entry = fx.tables.mre_wc.get_by_addr(GROUP).and_then(|idx| fx.tables.mre_arena.get(idx)).unwrap();
    assert_eq!(entry.upstream_jp, holo_pim::mre::UpstreamJp::Joined);
}

/// S2: the SPT-switch decision itself (the part the Scheduler/Track
/// table actually wires up, via `RecomputeSptSwitch`). `spt` flips
/// once traffic crosses the configured threshold and never flips back
/// on a repeated crossing report.
#[test]
fn s2_spt_switch_threshold_reached() {
    let mut fx = Fixture::new();
    let sg_id = fx.insert_sg(SOURCE, GROUP);
    fx.tables.spt_switch_threshold_packets = Some(100);

    let entry = fx.tables.mre_sg.find(SOURCE, GROUP).and_then(|idx| fx.tables.mre_arena.get_mut(idx)).unwrap();
    assert!(!entry.spt);
    entry.dataflow_crossed = true;

    fx.run_single(InputState::SptSwitchThresholdChanged, EntryKind::Sg, sg_id);

    let entry = fx.tables.mre_sg.find(SOURCE, GROUP).and_then(|idx| fx.tables.mre_arena.get(idx)).unwrap();
    assert!(entry.spt);
}

/// S3: this router loses an Assert on a downstream interface to a
/// neighbor with a better metric; the losing interface must drop out
/// of the (\*,G) immediate olist even though it's still Joined.
#[test]
fn s3_assert_loser_drops_from_olist() {
    let fx = Fixture::new();
    let mut entry = PimMre::new(1, EntryKind::Wc, zero_addr(true), GROUP);
    entry.receive_join(fx.if1, JP_HOLDTIME, arm);
    entry.receive_join(fx.if2, JP_HOLDTIME, arm);
    assert_eq!(entry.joins_wc(), [fx.if1, fx.if2].into_iter().collect());

    let winner = AssertMetric::new(false, 10, 10, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 9)));
    entry.assert.entry(fx.if1).or_default().state = AssertState::Loser;
    entry.assert.entry(fx.if1).or_default().winner_metric = Some(winner);
    assert!(entry.i_am_assert_loser(fx.if1));
    assert!(!entry.i_am_assert_loser(fx.if2));

    let dr_ifaces = [fx.if1, fx.if2].into_iter().collect();
    let lost = entry.lost_assert_wc(None);
    assert_eq!(lost, [fx.if1].into_iter().collect());
    assert_eq!(entry.immediate_olist_wc(&dr_ifaces, &lost), [fx.if2].into_iter().collect());
}

/// S4: an explicit Prune from a single downstream neighbor moves the
/// interface straight to `Prune` (no PruneEcho needed, since
/// `multiple_neighbors` is false); with a second neighbor present, the
/// same Prune only starts the override-interval PrunePending timer and
/// asks for a PruneEcho.
#[test]
fn s4_prune_override_suppression() {
    let fx = Fixture::new();

    let mut solo = PimMre::new(1, EntryKind::Wc, zero_addr(true), GROUP);
    solo.receive_join(fx.if1, JP_HOLDTIME, arm);
    solo.receive_prune(fx.if1, false, 3, arm);
    assert_eq!(solo.downstream.get(&fx.if1).unwrap().state, DownstreamState::PrunePending);
    assert!(!solo.prune_pending_expire(fx.if1, false));
    assert_eq!(solo.downstream.get(&fx.if1).unwrap().state, DownstreamState::Prune);

    let mut shared = PimMre::new(2, EntryKind::Wc, zero_addr(true), GROUP);
    shared.receive_join(fx.if1, JP_HOLDTIME, arm);
    shared.receive_prune(fx.if1, true, 3, arm);
    assert_eq!(shared.downstream.get(&fx.if1).unwrap().state, DownstreamState::PrunePending);
    let send_echo = shared.prune_pending_expire(fx.if1, true);
    assert!(send_echo);
    assert_eq!(shared.downstream.get(&fx.if1).unwrap().state, DownstreamState::Prune);
}

/// S5: the RP is withdrawn from the configured RP-Set; an
/// otherwise-idle (\*,\*,RP) entry for it becomes eligible for removal
/// once `rps.try_remove` drops it, but not before.
#[test]
fn s5_rp_removed_from_rp_set() {
    let mut fx = Fixture::new();
    fx.tables.rps.set_config(vec![holo_pim::rp::RpSetEntry {
        rp_addr: RP,
        group_prefix: "239.0.0.0/8".parse().unwrap(),
        priority: 0,
    }]);
    let rp_idx = fx.tables.rps.get_or_create(RP);
    assert!(fx.tables.rps.get(rp_idx).is_some());

    let idx = fx.tables.mre_rp.insert(&mut fx.tables.mre_arena, RP, |id| PimMre::new(id, EntryKind::Rp, RP, zero_addr(true)));
    let rp_in_config = |fx: &Fixture| fx.tables.rps.config().iter().any(|e| e.rp_addr == RP);

    let entry = &fx.tables.mre_arena[idx];
    assert!(!entry.entry_can_remove(rp_in_config(&fx)));

    fx.tables.rps.set_config(vec![]);
    fx.tables.rps.try_remove(RP);
    assert!(fx.tables.rps.find_live(RP).is_none());

    let entry = &fx.tables.mre_arena[idx];
    assert!(entry.entry_can_remove(rp_in_config(&fx)));
}

/// S6: a task iterating a batch of (S,G) entries must not disturb a
/// sibling entry queued in the same time-slice when one of them is
/// concurrently marked for deletion — the delete phase only frees
/// entries explicitly named in `delete_mre`, after the whole slice's
/// recomputation has already run.
#[test]
fn s6_deletion_during_active_iteration() {
    let mut fx = Fixture::new();
    let keep_id = fx.insert_sg(SOURCE, GROUP);
    let other_source = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 6));
    let doomed_id = fx.insert_sg(other_source, GROUP);

    {
        let idx = fx.tables.mre_sg.get_by_id(doomed_id).unwrap();
        fx.tables.mre_arena[idx].is_task_delete_pending = true;
    }

    let mut task = MreTask::new(InputState::DeleteMribEntries);
    task.sg.push(keep_id);
    task.sg.push(doomed_id);
    task.delete_mre.push(doomed_id);

    let mut sched = Scheduler::default();
    sched.add_task(task);
    fx.drain(&mut sched);

    assert!(fx.tables.mre_sg.get_by_id(doomed_id).is_none());
    assert!(fx.tables.mre_sg.find(other_source, GROUP).is_none());
    assert!(fx.tables.mre_sg.get_by_id(keep_id).is_some());
    assert!(fx.tables.mre_sg.find(SOURCE, GROUP).is_some());
}
