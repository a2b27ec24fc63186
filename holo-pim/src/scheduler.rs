//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Scheduler (C9): a FIFO of [`MreTask`]s driven by a 1ms cooperative
//! tick, the same `holo_utils::task::TimeoutTask` pattern
//! `holo-isis::instance` uses for its SPF-delay/LSP-origination
//! backoff timers.

use std::collections::VecDeque;

use crate::collections::{Interfaces, MrtTables, Neighbors};
use crate::task::MreTask;
use crate::track::{InputState, TrackState};

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<MreTask>,
}

impl Scheduler {
    /// `add_task(t)`: appends, coalescing into the tail if its
    /// `input_state` matches (`spec.md` §3.3, §4.9).
    pub fn add_task(&mut self, task: MreTask) {
        if let Some(tail) = self.queue.back_mut()
            && tail.input_state == task.input_state
        {
            tail.coalesce(task);
            return;
        }
        self.queue.push_back(task);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Runs one time-slice on the head task. If it fully drains, it's
    /// popped; the queue remains non-empty exactly when more work is
    /// pending, so the caller can decide whether to re-arm the tick
    /// timer.
    pub fn tick(
        &mut self,
        tables: &mut MrtTables,
        interfaces: &Interfaces,
        neighbors: &mut Neighbors,
        track: &TrackState,
    ) {
        let Some(task) = self.queue.front_mut() else {
            return;
        };
        if task.run_task(tables, interfaces, neighbors, track) {
            self.queue.pop_front();
        }
    }
}

pub fn new_task(input: InputState) -> MreTask {
    MreTask::new(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_matching_tail() {
        let mut sched = Scheduler::default();
        let mut t1 = MreTask::new(InputState::MribChanged);
        t1.rp.push(1);
        sched.add_task(t1);

        let mut t2 = MreTask::new(InputState::MribChanged);
        t2.rp.push(2);
        sched.add_task(t2);

        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn distinct_input_state_not_coalesced() {
        let mut sched = Scheduler::default();
        sched.add_task(MreTask::new(InputState::MribChanged));
        sched.add_task(MreTask::new(InputState::RpChanged));
        assert_eq!(sched.len(), 2);
    }
}
