//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Upstream Join/Prune message aggregation (C11).
//!
//! Each [`crate::neighbor::PimNbr`] owns an `outbound_jp_batch`. The
//! upstream state machines in `mre::upstream` append entries to it;
//! the southbound layer flushes it periodically into wire Join/Prune
//! messages. This module only assembles the batch — wire encoding is
//! `packet::jp`'s job, serialization triggers are the southbound
//! layer's.

use serde::{Deserialize, Serialize};

use crate::addr::PimAddr;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum JpEntryType {
    Rp,
    Wc,
    Sg,
    SgRpt,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum JpAction {
    Join,
    Prune,
}

#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct JpItem {
    pub source: PimAddr,
    pub entry_type: JpEntryType,
    pub action: JpAction,
    pub holdtime: u16,
}

// One (group, mask) block of the batch: RFC 4601 groups J/P entries
// for the same multicast group into a single "Multicast Group" block
// on the wire to avoid repeating the group address per source.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct JpGroup {
    pub group: PimAddr,
    pub mask_len: u8,
    pub items: Vec<JpItem>,
}

#[derive(Clone, Debug, Default)]
#[derive(Deserialize, Serialize)]
pub struct JoinPruneAssembler {
    groups: Vec<JpGroup>,
}

impl JoinPruneAssembler {
    pub fn new() -> JoinPruneAssembler {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[JpGroup] {
        &self.groups
    }

    /// Appends a Join or Prune item to the batch. Coalesces into the
    /// last group block when the group address matches and the caller
    /// doesn't force a new block (`new_group`).
    #[allow(clippy::too_many_arguments)]
    pub fn jp_entry_add(
        &mut self,
        target_group: PimAddr,
        mask_len: u8,
        source: PimAddr,
        entry_type: JpEntryType,
        action: JpAction,
        holdtime: u16,
        new_group: bool,
    ) {
        let item = JpItem {
            source,
            entry_type,
            action,
            holdtime,
        };

        if !new_group
            && let Some(last) = self.groups.last_mut()
            && last.group == target_group
            && last.mask_len == mask_len
        {
            last.items.push(item);
            return;
        }

        self.groups.push(JpGroup {
            group: target_group,
            mask_len,
            items: vec![item],
        });
    }

    /// Drains the batch, handing ownership of the assembled groups to
    /// the southbound layer for wire serialization.
    pub fn take(&mut self) -> Vec<JpGroup> {
        std::mem::take(&mut self.groups)
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
    fn coalesces_same_group() {
        let mut asm = JoinPruneAssembler::new();
        asm.jp_entry_add(
            a(1),
            32,
            a(5),
            JpEntryType::Sg,
            JpAction::Join,
            210,
            false,
        );
        asm.jp_entry_add(
            a(1),
            32,
            a(6),
            JpEntryType::SgRpt,
            JpAction::Prune,
            210,
            false,
        );
        assert_eq!(asm.groups().len(), 1);
        assert_eq!(asm.groups()[0].items.len(), 2);
    }

    #[test]
    fn new_group_forces_new_block() {
        let mut asm = JoinPruneAssembler::new();
        asm.jp_entry_add(
            a(1),
            32,
            a(5),
            JpEntryType::Sg,
            JpAction::Join,
            210,
            false,
        );
        asm.jp_entry_add(
            a(1),
            32,
            a(7),
            JpEntryType::Sg,
            JpAction::Join,
            210,
            true,
        );
        assert_eq!(asm.groups().len(), 2);
    }

    #[test]
    fn take_drains() {
        let mut asm = JoinPruneAssembler::new();
        asm.jp_entry_add(
            a(1),
            32,
            a(5),
            JpEntryType::Wc,
            JpAction::Join,
            210,
            false,
        );
        let drained = asm.take();
        assert_eq!(drained.len(), 1);
        assert!(asm.is_empty());
    }
}
