//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::borrow::Cow;

use holo_yang::ToYang;

use crate::mfc::DataflowComparator;
use crate::mre::{
    AssertState, DownstreamState, EntryKind, RegisterState, UpstreamJp,
    UpstreamSgRpt,
};

impl ToYang for EntryKind {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            EntryKind::Rp => "star-star-rp".into(),
            EntryKind::Wc => "star-g".into(),
            EntryKind::Sg => "s-g".into(),
            EntryKind::SgRpt => "s-g-rpt".into(),
        }
    }
}

impl ToYang for DownstreamState {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            DownstreamState::NoInfo => "no-info".into(),
            DownstreamState::Join => "join".into(),
            DownstreamState::PrunePending => "prune-pending".into(),
            DownstreamState::Prune => "prune".into(),
        }
    }
}

impl ToYang for AssertState {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            AssertState::NoInfo => "no-info".into(),
            AssertState::Winner => "winner".into(),
            AssertState::Loser => "loser".into(),
        }
    }
}

impl ToYang for UpstreamJp {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            UpstreamJp::NotJoined => "not-joined".into(),
            UpstreamJp::Joined => "joined".into(),
        }
    }
}

impl ToYang for UpstreamSgRpt {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            UpstreamSgRpt::RptNotJoined => "rpt-not-joined".into(),
            UpstreamSgRpt::Pruned => "pruned".into(),
            UpstreamSgRpt::NotPruned => "not-pruned".into(),
        }
    }
}

impl ToYang for RegisterState {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            RegisterState::NoInfo => "no-info".into(),
            RegisterState::Join => "join".into(),
            RegisterState::Prune => "prune".into(),
            RegisterState::JoinPending => "join-pending".into(),
        }
    }
}

impl ToYang for DataflowComparator {
    fn to_yang(&self) -> Cow<'static, str> {
        match self {
            DataflowComparator::GreaterOrEqual => "ge".into(),
            DataflowComparator::LessOrEqual => "le".into(),
        }
    }
}
