//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use holo_utils::ibus::IbusMsg;
use tracing::{debug, debug_span};

use crate::addr::PimAddr;
use crate::interface::Vid;
use crate::mre::EntryKind;

// PIM debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Instances
    InstanceCreate,
    InstanceDelete,
    InstanceStart,
    InstanceStop,
    // Interfaces
    InterfaceCreate(&'a str),
    InterfaceDelete(&'a str),
    InterfaceStart(&'a str),
    InterfaceStop(&'a str),
    // Neighbors
    NeighborCreate(Vid, PimAddr),
    NeighborDelete(Vid, PimAddr),
    // Entries
    MreCreate(EntryKind, PimAddr, PimAddr),
    MreDelete(EntryKind, PimAddr, PimAddr),
    MreTaskCoalesce(usize),
    MfcProgram(PimAddr, PimAddr),
    // Network
    PacketRx(Vid, PimAddr),
    PacketTx(Vid, PimAddr),
    // Internal bus
    IbusRx(&'a IbusMsg),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate
            | Debug::InstanceDelete
            | Debug::InstanceStart
            | Debug::InstanceStop => {
                // Parent span(s): pim-instance
                debug!("{}", self);
            }
            Debug::InterfaceCreate(name)
            | Debug::InterfaceDelete(name)
            | Debug::InterfaceStart(name)
            | Debug::InterfaceStop(name) => {
                // Parent span(s): pim-instance
                debug_span!("interface", %name).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::NeighborCreate(vid, addr) | Debug::NeighborDelete(vid, addr) => {
                // Parent span(s): pim-instance
                debug_span!("neighbor", ?vid, %addr).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::MreCreate(kind, source, group) | Debug::MreDelete(kind, source, group) => {
                // Parent span(s): pim-instance
                debug_span!("mre", ?kind, %source, %group).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::MreTaskCoalesce(pending) => {
                // Parent span(s): pim-instance, scheduler
                debug!(%pending, "{}", self);
            }
            Debug::MfcProgram(source, group) => {
                // Parent span(s): pim-instance
                debug_span!("mfc", %source, %group).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::PacketRx(vid, addr) | Debug::PacketTx(vid, addr) => {
                // Parent span(s): pim-instance, network
                debug_span!("network", ?vid, %addr).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::IbusRx(msg) => {
                // Parent span(s): pim-instance, internal-bus
                debug_span!("internal-bus").in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        debug!(?msg, "{}", self);
                    })
                })
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => write!(f, "instance created"),
            Debug::InstanceDelete => write!(f, "instance deleted"),
            Debug::InstanceStart => write!(f, "starting instance"),
            Debug::InstanceStop => write!(f, "stopping instance"),
            Debug::InterfaceCreate(..) => write!(f, "interface created"),
            Debug::InterfaceDelete(..) => write!(f, "interface deleted"),
            Debug::InterfaceStart(..) => write!(f, "starting interface"),
            Debug::InterfaceStop(..) => write!(f, "stopping interface"),
            Debug::NeighborCreate(..) => write!(f, "neighbor created"),
            Debug::NeighborDelete(..) => write!(f, "neighbor deleted"),
            Debug::MreCreate(..) => write!(f, "entry created"),
            Debug::MreDelete(..) => write!(f, "entry deleted"),
            Debug::MreTaskCoalesce(..) => write!(f, "task coalesced into pending scheduler entry"),
            Debug::MfcProgram(..) => write!(f, "reprogramming forwarding entry"),
            Debug::PacketRx(..) => write!(f, "packet received"),
            Debug::PacketTx(..) => write!(f, "packet sent"),
            Debug::IbusRx(..) => write!(f, "ibus message received"),
        }
    }
}
