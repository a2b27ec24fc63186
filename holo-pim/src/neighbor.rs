//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! PIM neighbors.
//!
//! Neighbor discovery (Hello processing, generation-ID tracking) is
//! out of scope (`spec.md` §1); a [`PimNbr`] here represents an
//! already-discovered neighbor fact consumed by the core — a weak
//! target for upstream Join/Prune messages and Assert-winner
//! bookkeeping.

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::addr::PimAddr;
use crate::collections::{MfcId, MreId, NeighborId};
use crate::interface::Vid;
use crate::jp::JoinPruneAssembler;

pub type NeighborIndex = Index;

#[derive(Debug)]
pub struct PimNbr {
    pub index: NeighborIndex,
    pub id: NeighborId,
    pub vid: Vid,
    pub addr: PimAddr,
    // Outbound J/P batch assembled by the upstream state machines
    // (C11) and flushed by the southbound layer.
    pub outbound_jp_batch: JoinPruneAssembler,
    // Entries whose upstream RPF neighbor is this neighbor, so that
    // if the neighbor disappears they can be scheduled for
    // re-evaluation (`spec.md` §9, dangling-reference prevention).
    pub processing: NbrProcessingLists,
}

#[derive(Debug, Default)]
pub struct NbrProcessingLists {
    pub mre_rp: Vec<MreId>,
    pub mre_wc: Vec<MreId>,
    pub mre_sg: Vec<MreId>,
    pub mre_sg_rpt: Vec<MreId>,
    pub mfc: Vec<MfcId>,
}

impl PimNbr {
    pub(crate) fn new(
        index: NeighborIndex,
        id: NeighborId,
        vid: Vid,
        addr: PimAddr,
    ) -> PimNbr {
        PimNbr {
            index,
            id,
            vid,
            addr,
            outbound_jp_batch: JoinPruneAssembler::new(),
            processing: Default::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NbrKey {
    pub vid: Vid,
    pub addr: PimAddr,
}
