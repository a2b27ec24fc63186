//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use holo_northbound::rpc::{Provider, YangOps};

use crate::instance::Instance;

// No RPCs or YANG actions are defined for this instance; the PIM data
// model this engine exposes northbound is config/state only.
const YANG_OPS: YangOps<Instance> = YangOps {
    rpc: phf::phf_map! {},
};

impl Provider for Instance {
    const YANG_OPS: YangOps<Self> = YANG_OPS;
}
