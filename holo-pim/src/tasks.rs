//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Inter-task message types and the cooperative-scheduler / network
//! child tasks, following the `holo-isis::tasks` diagram-plus-messages
//! layout.
//!
//! ```text
//!                                     +--------------+
//!                                     |  northbound  |
//!                                     +--------------+
//!                                           | ^
//!                        northbound_rx (1x) V | (1x) northbound_tx
//!                                     +--------------+
//!                  net_rx_packet (Nx) |              | -> (Nx) net_tx_packet
//!                        send_jp (Nx) |   instance   |
//!                       mre_tick (1x) |              |
//!                                     +--------------+
//!                              ibus_tx (1x) | ^ (1x) ibus_rx
//!                                           V |
//!                                     +--------------+
//!                                     |     ibus     |
//!                                     +--------------+
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use holo_utils::ip::AddressFamily;
use holo_utils::socket::{AsyncFd, Socket};
use holo_utils::task::{IntervalTask, Task, TimeoutTask};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;
use tracing::{Instrument, debug_span};

use crate::addr::PimAddr;
use crate::collections::{InterfaceId, MreId};
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{InstanceArenas, InstanceUpView};
use crate::interface::Vid;
use crate::mre::EntryKind;
use crate::packet::consts::MessageType;
use crate::packet::error::DecodeError;

/// RFC 4601 §4.11's `Register_Suppression_Time` default.
pub(crate) const REGISTER_SUPPRESSION_TIME: Duration = Duration::from_secs(60);

pub mod messages {
    use super::*;

    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::ProtocolMsg;

    pub mod input {
        use super::*;

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub enum ProtocolMsg {
            NetRxPacket(NetRxPacketMsg),
            MreTick(MreTickMsg),
            SendJp(SendJpMsg),
            RegisterStopTimer(RegisterStopTimerMsg),
        }

        /// A raw PIM control packet received on `vid` from `src`, still
        /// undecoded so the decode error (if any) can be logged with
        /// full context rather than swallowed in the network task.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct NetRxPacketMsg {
            pub vid: Vid,
            pub src: PimAddr,
            #[serde(default)]
            pub bytes: Bytes,
            pub msg_type: Result<MessageType, DecodeError>,
        }

        /// The scheduler's cooperative tick: run one time-slice.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct MreTickMsg {}

        /// Periodic per-interface Join/Prune transmission (`spec.md`
        /// §1's "periodic J/P refresh" ambient behavior, driven by each
        /// interface's configured `jp_period`).
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct SendJpMsg {
            pub iface_id: InterfaceId,
        }

        /// An (S,G) entry's Register-Stop suppression timer expired
        /// (`spec.md` §4.4.5): Prune -> JoinPending.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct RegisterStopTimerMsg {
            pub id: MreId,
        }
    }

    pub mod output {
        use super::*;

        #[derive(Debug)]
        #[derive(Serialize)]
        pub enum ProtocolMsg {
            NetTxPacket(NetTxPacketMsg),
        }

        #[derive(Debug)]
        #[derive(Serialize)]
        pub struct NetTxPacketMsg {
            pub vid: Vid,
            pub dst: PimAddr,
            pub bytes: Vec<u8>,
        }
    }
}

use messages::ProtocolInputMsg;
use messages::input::{MreTickMsg, NetRxPacketMsg, RegisterStopTimerMsg, SendJpMsg};

// ===== child tasks =====

/// Network Rx task: reads raw PIM packets off a per-interface raw
/// socket and forwards them for decode-and-dispatch on the main task,
/// mirroring `holo-isis::tasks::net_rx`'s supervised-spawn idiom.
pub(crate) fn net_rx(
    socket: Arc<AsyncFd<Socket>>,
    vid: Vid,
    af: AddressFamily,
    net_rx_packetp: &Sender<NetRxPacketMsg>,
) -> Task<()> {
    #[cfg(not(feature = "testing"))]
    {
        let span1 = debug_span!("network");
        let _span1_guard = span1.enter();
        let span2 = debug_span!("input");
        let _span2_guard = span2.enter();

        let net_rx_packetp = net_rx_packetp.clone();
        Task::spawn_supervised(move || {
            let socket = socket.clone();
            let net_rx_packetp = net_rx_packetp.clone();
            async move {
                let _ = crate::network::read_loop(socket, vid, af, net_rx_packetp).await;
            }
            .in_current_span()
        })
    }
    #[cfg(feature = "testing")]
    {
        Task::spawn(async move { std::future::pending().await })
    }
}

/// Network Tx task: drains an interface's outgoing-packet channel and
/// writes each message to its raw socket, mirroring `net_rx`'s
/// supervised-spawn idiom. Spawned **detached** (not supervised as a
/// child the instance owns a handle to) so a buffered Join/Prune still
/// flushes after the instance itself is torn down, matching
/// `holo-ospf::interface::InterfaceNet`'s `_net_tx_task`.
pub(crate) fn net_tx(
    socket: Arc<AsyncFd<Socket>>,
    net_tx_packetc: tokio::sync::mpsc::UnboundedReceiver<
        messages::output::NetTxPacketMsg,
    >,
) -> Task<()> {
    let span1 = debug_span!("network");
    let _span1_guard = span1.enter();
    let span2 = debug_span!("output");
    let _span2_guard = span2.enter();

    Task::spawn(
        crate::network::write_loop(socket, net_tx_packetc).in_current_span(),
    )
}

/// Arms the cooperative scheduler tick. Re-armed by the main loop
/// whenever the queue transitions empty -> non-empty, following the
/// same backoff-timer idiom as `holo-isis`'s LSP-origination timer.
pub(crate) fn mre_tick_timer(mre_tickp: &Sender<MreTickMsg>) -> TimeoutTask {
    TimeoutTask::new(Duration::from_millis(1), {
        let mre_tickp = mre_tickp.clone();
        move || {
            let mre_tickp = mre_tickp.clone();
            async move {
                let _ = mre_tickp.send(MreTickMsg {}).await;
            }
        }
    })
}

/// Arms an (S,G) entry's Register-Stop suppression timer
/// (`spec.md` §4.4.5), following the same send-on-fire idiom as
/// `mre_tick_timer`.
pub(crate) fn register_stop_timer(
    id: MreId,
    register_stop_timerp: &Sender<RegisterStopTimerMsg>,
) -> TimeoutTask {
    TimeoutTask::new(REGISTER_SUPPRESSION_TIME, {
        let register_stop_timerp = register_stop_timerp.clone();
        move || {
            let register_stop_timerp = register_stop_timerp.clone();
            async move {
                let _ = register_stop_timerp.send(RegisterStopTimerMsg { id }).await;
            }
        }
    })
}

/// Arms an interface's periodic J/P refresh timer.
pub(crate) fn send_jp_interval(
    iface_id: InterfaceId,
    period: u16,
    send_jpp: &Sender<SendJpMsg>,
) -> IntervalTask {
    IntervalTask::new(Duration::from_secs(period as u64), true, {
        let send_jpp = send_jpp.clone();
        move || {
            let send_jpp = send_jpp.clone();
            async move {
                let _ = send_jpp.send(SendJpMsg { iface_id }).await;
            }
        }
    })
}

// ===== protocol message dispatch =====

pub(crate) fn process_protocol_msg(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: ProtocolInputMsg,
) -> Result<(), Error> {
    match msg {
        ProtocolInputMsg::NetRxPacket(msg) => {
            process_net_rx_packet(instance, arenas, msg)?;
        }
        ProtocolInputMsg::MreTick(_msg) => {
            process_mre_tick(instance, arenas);
        }
        ProtocolInputMsg::SendJp(msg) => {
            crate::network::send_jp_batch(instance, arenas, msg.iface_id)?;
        }
        ProtocolInputMsg::RegisterStopTimer(msg) => {
            process_register_stop_expire(instance, msg.id);
        }
    }
    Ok(())
}

fn process_register_stop_expire(instance: &mut InstanceUpView<'_>, id: MreId) {
    let tables = &mut instance.state.tables;
    if let Some(idx) = tables.mre_sg.get_by_id(id)
        && let Some(entry) = tables.mre_arena.get_mut(idx)
    {
        debug_assert_eq!(entry.kind, EntryKind::Sg);
        entry.register_stop_expire();
    }
}

fn process_net_rx_packet(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: NetRxPacketMsg,
) -> Result<(), Error> {
    Debug::PacketRx(msg.vid, msg.src).log();

    let msg_type = msg
        .msg_type
        .map_err(|err| Error::MalformedMessage(msg.vid, err.to_string()))?;

    let mut buf = msg.bytes.clone();
    match msg_type {
        MessageType::JoinPrune => {
            let jp = crate::packet::jp::JoinPrune::decode(&mut buf)
                .map_err(|err| Error::MalformedMessage(msg.vid, err.to_string()))?;
            crate::events::process_join_prune(instance, arenas, msg.vid, msg.src, jp)?;
        }
        MessageType::Assert => {
            let assert = crate::packet::assert::Assert::decode(&mut buf)
                .map_err(|err| Error::MalformedMessage(msg.vid, err.to_string()))?;
            crate::events::process_assert(instance, arenas, msg.vid, msg.src, assert)?;
        }
        MessageType::RegisterStop => {
            let rs = crate::packet::register_stop::RegisterStop::decode(&mut buf)
                .map_err(|err| Error::MalformedMessage(msg.vid, err.to_string()))?;
            crate::events::process_register_stop(instance, arenas, msg.vid, rs)?;
        }
        MessageType::Hello | MessageType::Register => {
            // Out of scope (`spec.md` §1): Hello/neighbor discovery and
            // Register data-encapsulation are handled outside this crate.
        }
    }
    Ok(())
}

fn process_mre_tick(instance: &mut InstanceUpView<'_>, arenas: &mut InstanceArenas) {
    instance.state.scheduler.tick(
        &mut instance.state.tables,
        &arenas.interfaces,
        &mut instance.state.neighbors,
        &instance.state.track,
    );
    push_dirty_mfc(instance, arenas);
    instance.state.tick_timer = if !instance.state.scheduler.is_empty() {
        Some(mre_tick_timer(&instance.tx.protocol_input.mre_tick))
    } else {
        None
    };
}

// The kernel dataflow monitor is polled on this cadence; RFC 4601
// doesn't mandate a period, `holo-pim` just needs something short
// enough that the SPT switch isn't noticeably delayed.
const DATAFLOW_POLL_INTERVAL_SECS: u32 = 5;

// Drains `MrtTables::dirty_mfc` and mirrors each reprogrammed entry
// into the kernel multicast forwarding cache via `holo-routing`,
// following the same dirty-set-then-batch-push pattern
// `holo_routing::rib::Rib` uses for its own southbound route installs.
fn push_dirty_mfc(instance: &mut InstanceUpView<'_>, arenas: &InstanceArenas) {
    for (source, group) in instance.state.tables.deleted_mfc.drain(..) {
        let msg = holo_utils::southbound::PimMfcUninstallMsg { source, group };
        instance.tx.ibus.pim_mfc_del(msg);
    }

    let ids: Vec<_> = instance.state.tables.dirty_mfc.iter().copied().collect();
    let threshold_packets = instance.state.tables.spt_switch_threshold_packets;

    for id in ids {
        instance.state.tables.dirty_mfc.remove(&id);

        let Some(idx) = instance.state.tables.mfc.get_by_id(id) else {
            continue;
        };
        let Some(mfc) = instance.state.tables.mfc_arena.get(idx) else {
            continue;
        };

        let Some(iif_vid) = mfc.iif else {
            continue;
        };
        let Some(iif) = arenas.interfaces.get_by_vid(iif_vid) else {
            continue;
        };
        let oifs = mfc
            .oifs
            .iter()
            .filter_map(|vid| arenas.interfaces.get_by_vid(*vid))
            .map(|iface| iface.name.clone())
            .collect();

        let msg = holo_utils::southbound::PimMfcInstallMsg {
            source: mfc.source,
            group: mfc.group,
            iif: iif.name.clone(),
            oifs,
        };
        let (source, group) = (mfc.source, mfc.group);
        instance.tx.ibus.pim_mfc_add(msg);

        sync_dataflow_monitor(instance, source, group, threshold_packets);
    }
}

// Arms (or disarms) the kernel dataflow monitor for an (S,G) so the
// threshold-based SPT switch (RFC 4601 §4.8.5) gets driven by real
// traffic counters instead of switching immediately.
fn sync_dataflow_monitor(
    instance: &mut InstanceUpView<'_>,
    source: crate::addr::PimAddr,
    group: crate::addr::PimAddr,
    threshold_packets: Option<u64>,
) {
    let Some(sg_idx) = instance.state.tables.mre_sg.find(source, group) else {
        return;
    };
    let Some(entry) = instance.state.tables.mre_arena.get(sg_idx) else {
        return;
    };
    let on_rpt = !entry.spt && !entry.dataflow_crossed;
    let Some(mfc_idx) = instance.state.tables.mfc.find(source, group) else {
        return;
    };
    let Some(mfc) = instance.state.tables.mfc_arena.get_mut(mfc_idx) else {
        return;
    };

    let should_monitor = on_rpt && threshold_packets.is_some();
    if should_monitor && mfc.dataflow.is_empty() {
        mfc.dataflow.push(crate::mfc::DataflowMonitor {
            threshold_packets,
            threshold_bytes: None,
            comparator: crate::mfc::DataflowComparator::GreaterOrEqual,
            interval_secs: DATAFLOW_POLL_INTERVAL_SECS,
            is_one_shot: true,
        });
        instance.tx.ibus.pim_dataflow_add(
            source,
            group,
            threshold_packets,
            None,
            DATAFLOW_POLL_INTERVAL_SECS,
        );
    } else if !should_monitor && !mfc.dataflow.is_empty() {
        mfc.dataflow.clear();
        instance.tx.ibus.pim_dataflow_del(source, group);
    }
}
