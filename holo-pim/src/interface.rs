//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! PIM-enabled interface state.
//!
//! Hello processing and DR election itself are out of scope (`spec.md`
//! §1): this module holds the already-resolved facts the core state
//! machines consume (is this interface the DR, how many neighbors are
//! on it, its configured J/P period).

use std::collections::BTreeSet;
use std::sync::Arc;

use generational_arena::Index;
use holo_utils::socket::{AsyncFd, Socket};
use holo_utils::task::Task;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{Sender, UnboundedSender, unbounded_channel};

use crate::addr::PimAddr;
use crate::collections::InterfaceId;
use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::network;
use crate::tasks;
use crate::tasks::messages::input::NetRxPacketMsg;
use crate::tasks::messages::output::NetTxPacketMsg;

/// Virtual interface identifier, used as the sparse-map key for all
/// per-interface entry state (`spec.md` §9: "replace fixed arrays with
/// sparse maps when MAX_VIFS is large").
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Vid(pub u32);

impl std::fmt::Display for Vid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vif{}", self.0)
    }
}

pub type InterfaceIndex = Index;

#[derive(Debug)]
pub struct Interface {
    pub index: InterfaceIndex,
    pub id: InterfaceId,
    pub vid: Vid,
    pub name: String,
    pub config: InterfaceCfg,
    pub state: InterfaceState,
}

#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct InterfaceCfg {
    pub enabled: bool,
    pub dr_priority: u32,
    pub hello_holdtime: u16,
    pub jp_period: u16,
    pub jp_holdtime: u16,
    pub jp_override_interval: u16,
    pub assert_time: u16,
    pub assert_override_interval: u16,
}

impl Default for InterfaceCfg {
    fn default() -> InterfaceCfg {
        // RFC 4601 §4.9 default timer values.
        InterfaceCfg {
            enabled: false,
            dr_priority: 1,
            hello_holdtime: 105,
            jp_period: 60,
            jp_holdtime: 210,
            jp_override_interval: 3,
            assert_time: 180,
            assert_override_interval: 3,
        }
    }
}

#[derive(Debug, Default)]
pub struct InterfaceState {
    pub ifindex: Option<u32>,
    pub primary_addr: Option<PimAddr>,
    // All addresses currently assigned to the interface, kept so a new
    // primary can be picked when the current one is removed.
    pub addr_list: BTreeSet<IpNetwork>,
    // Whether we are the Designated Router on this interface.
    pub is_dr: bool,
    // Number of PIM neighbors currently known on this interface, other
    // than ourselves. Drives the PruneEcho / J/P-override-interval
    // decision in `receive_prune` (`spec.md` §4.4.1).
    pub neighbor_count: u32,
    // The raw socket and its Rx/Tx tasks, present only while the
    // interface is operational (enabled, with a primary address and a
    // resolved ifindex).
    pub net: Option<InterfaceNet>,
}

/// Owns a PIM-enabled interface's raw socket and its Rx/Tx child
/// tasks, following `holo-ospf::interface::InterfaceNet`'s pattern:
/// dropping this value closes the socket and aborts the Rx task, and
/// the queued Tx task keeps draining buffered packets until it too is
/// dropped.
#[derive(Debug)]
pub struct InterfaceNet {
    pub socket: Arc<AsyncFd<Socket>>,
    pub net_tx_packetp: UnboundedSender<NetTxPacketMsg>,
    _net_rx_task: Task<()>,
    _net_tx_task: Task<()>,
}

impl Interface {
    pub(crate) fn new(
        index: InterfaceIndex,
        id: InterfaceId,
        vid: Vid,
        name: String,
    ) -> Interface {
        Interface {
            index,
            id,
            vid,
            name,
            config: Default::default(),
            state: Default::default(),
        }
    }

    // RFC 4601 §4.3.3: the downstream J/P-override decision depends on
    // whether more than one neighbor is present on the LAN.
    pub fn has_multiple_neighbors(&self) -> bool {
        self.state.neighbor_count > 1
    }

    // Starts or stops the interface depending on whether it is now
    // ready to run: enabled, with a resolved ifindex and a primary
    // address. Called after every topology or configuration change
    // that might have flipped that readiness.
    pub(crate) fn update(
        &mut self,
        enabled: bool,
        net_rx_packetp: &Sender<NetRxPacketMsg>,
    ) -> Result<(), Error> {
        let ready = enabled
            && self.state.ifindex.is_some()
            && self.state.primary_addr.is_some();
        if ready {
            self.start(net_rx_packetp)
        } else {
            self.stop();
            Ok(())
        }
    }

    // Opens the raw socket, joins the all-PIM-routers multicast group
    // and spawns the Rx/Tx child tasks. A no-op if the interface is
    // already running.
    fn start(
        &mut self,
        net_rx_packetp: &Sender<NetRxPacketMsg>,
    ) -> Result<(), Error> {
        if self.state.net.is_some() {
            return Ok(());
        }
        let Some(ifindex) = self.state.ifindex else {
            return Ok(());
        };
        let Some(primary_addr) = self.state.primary_addr else {
            return Ok(());
        };
        let af = if primary_addr.is_ipv4() {
            holo_utils::ip::AddressFamily::Ipv4
        } else {
            holo_utils::ip::AddressFamily::Ipv6
        };

        let socket = network::socket(&self.name, af)
            .map_err(IoError::SocketError)?;
        network::join_multicast(&socket, af, ifindex)
            .map_err(IoError::MulticastJoinError)?;
        let socket = Arc::new(AsyncFd::new(socket).map_err(IoError::SocketError)?);

        let (net_tx_packetp, net_tx_packetc) = unbounded_channel();
        let _net_rx_task = tasks::net_rx(socket.clone(), self.vid, af, net_rx_packetp);
        let _net_tx_task = tasks::net_tx(socket.clone(), net_tx_packetc);

        self.state.net = Some(InterfaceNet {
            socket,
            net_tx_packetp,
            _net_rx_task,
            _net_tx_task,
        });

        Debug::InterfaceStart(&self.name).log();

        Ok(())
    }

    // Closes the raw socket and drops its child tasks. A no-op if the
    // interface isn't running.
    pub(crate) fn stop(&mut self) {
        if self.state.net.take().is_none() {
            return;
        }

        Debug::InterfaceStop(&self.name).log();
    }
}
