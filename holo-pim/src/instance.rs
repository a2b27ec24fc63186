//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use holo_protocol::{
    InstanceChannelsTx, InstanceShared, MessageReceiver, ProtocolInstance,
};
use holo_utils::ibus::IbusMsg;
use holo_utils::protocol::Protocol;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::collections::{Interfaces, MrtTables, Neighbors};
use crate::debug::Debug;
use crate::error::Error;
use crate::interface::Interface;
use crate::mrib::MribView;
use crate::northbound::configuration::InstanceCfg;
use crate::scheduler::Scheduler;
use crate::tasks::messages::input::{
    MreTickMsg, NetRxPacketMsg, RegisterStopTimerMsg, SendJpMsg,
};
use crate::tasks::messages::{ProtocolInputMsg, ProtocolOutputMsg};
use crate::track::TrackState;
use crate::{events, ibus, tasks};

#[derive(Debug)]
pub struct Instance {
    // Instance name.
    pub name: String,
    // Instance configuration data.
    pub config: InstanceCfg,
    // Instance state data, present only while the instance is active.
    pub state: Option<InstanceState>,
    // Instance arenas, kept alive across instance up/down transitions
    // so interface configuration survives a restart.
    pub arenas: InstanceArenas,
    // Instance Tx channels.
    pub tx: InstanceChannelsTx<Instance>,
    // Shared data.
    pub shared: InstanceShared,
}

#[derive(Debug, Default)]
pub struct InstanceArenas {
    pub interfaces: Interfaces,
}

#[derive(Debug)]
pub struct InstanceState {
    // The four MRE tables plus the MFC and RP-Set (C6/C2/C5).
    pub tables: MrtTables,
    // PIM neighbor table (C3).
    pub neighbors: Neighbors,
    // Dependency-driven recomputation scheduler (C9).
    pub scheduler: Scheduler,
    // Static input-to-output dependency table (C8).
    pub track: TrackState,
    // Incrementally-maintained unicast RPF view (C1).
    pub mrib: MribView,
    // The scheduler's cooperative tick timer, armed whenever the
    // queue transitions empty -> non-empty and dropped (cancelling
    // it) once it drains.
    pub tick_timer: Option<holo_utils::task::TimeoutTask>,
}

#[derive(Clone, Debug)]
pub struct ProtocolInputChannelsTx {
    // Network Rx event: a PIM control packet was received.
    pub net_rx_packet: Sender<NetRxPacketMsg>,
    // Scheduler cooperative tick.
    pub mre_tick: Sender<MreTickMsg>,
    // Periodic per-interface Join/Prune transmission.
    pub send_jp: Sender<SendJpMsg>,
    // An (S,G) entry's Register-Stop suppression timer expired.
    pub register_stop_timer: Sender<RegisterStopTimerMsg>,
}

#[derive(Debug)]
pub struct ProtocolInputChannelsRx {
    pub net_rx_packet: Receiver<NetRxPacketMsg>,
    pub mre_tick: Receiver<MreTickMsg>,
    pub send_jp: Receiver<SendJpMsg>,
    pub register_stop_timer: Receiver<RegisterStopTimerMsg>,
}

pub struct InstanceUpView<'a> {
    pub name: &'a str,
    pub config: &'a InstanceCfg,
    pub state: &'a mut InstanceState,
    pub tx: &'a InstanceChannelsTx<Instance>,
    pub shared: &'a InstanceShared,
}

// ===== impl Instance =====

impl Instance {
    // Checks if the instance needs to be started or stopped in
    // response to a northbound or southbound event.
    pub(crate) fn update(&mut self) {
        match self.is_ready() {
            true if !self.is_active() => self.start(),
            false if self.is_active() => self.stop(),
            _ => (),
        }
    }

    fn start(&mut self) {
        Debug::InstanceStart.log();

        self.state = Some(InstanceState {
            tables: Default::default(),
            neighbors: Default::default(),
            scheduler: Default::default(),
            track: TrackState::build(),
            mrib: Default::default(),
            tick_timer: None,
        });
        self.rp_set_update();
        self.spt_switch_threshold_update();

        self.tx.ibus.router_id_sub();
        for iface in self.arenas.interfaces.iter() {
            self.tx.ibus.interface_sub(Some(iface.name.clone()), None);
        }
    }

    fn stop(&mut self) {
        Debug::InstanceStop.log();

        for iface in self.arenas.interfaces.iter() {
            self.tx.ibus.interface_unsub(Some(iface.name.clone()));
        }

        self.state = None;
    }

    pub(crate) fn reset(&mut self) {
        if self.is_active() {
            self.stop();
            self.update();
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state.is_some()
    }

    fn is_ready(&self) -> bool {
        self.config.enabled
    }

    pub(crate) fn as_up(&mut self) -> Option<(InstanceUpView<'_>, &mut InstanceArenas)> {
        let state = self.state.as_mut()?;
        let instance = InstanceUpView {
            name: &self.name,
            config: &self.config,
            state,
            tx: &self.tx,
            shared: &self.shared,
        };
        Some((instance, &mut self.arenas))
    }

    // ===== northbound configuration-event handlers =====

    // `Event::RpSetChanged`: reload the RP-Set and schedule
    // `add_task_rp_changed` for every entry that might rebind. The
    // RP-Set is a rare, wholesale config replacement (not a per-RP
    // delta), so rather than track which individual entries point at
    // which RP, every (*,*,RP) and (*,G) entry is rescanned directly
    // off `MrtTables` and re-queued, the same full-table-scan idiom
    // `spt_switch_threshold_update` below uses for `mre_sg`.
    pub(crate) fn rp_set_update(&mut self) {
        let Some((mut instance, _arenas)) = self.as_up() else {
            return;
        };
        instance.state.tables.rps.set_config(instance.config.rp_set.clone());

        let mre_rp: Vec<_> = instance
            .state
            .tables
            .mre_rp
            .iter()
            .map(|idx| instance.state.tables.mre_arena[idx].id)
            .collect();
        let mre_wc: Vec<_> = instance
            .state
            .tables
            .mre_wc
            .iter()
            .map(|idx| instance.state.tables.mre_arena[idx].id)
            .collect();
        if !mre_rp.is_empty() || !mre_wc.is_empty() {
            let lists = crate::rp::RpProcessingLists {
                mre_rp,
                mre_wc,
                ..Default::default()
            };
            instance.add_task_rp_changed(&lists);
        }
    }

    // `Event::InterfaceUpdate`: a PIM-specific interface parameter
    // changed (jp-period, assert-time, etc); no recomputation is
    // triggered here, only the config struct is already up to date by
    // the time this fires, per the northbound callback contract.
    pub(crate) fn interface_update(&mut self, _iface_id: crate::collections::InterfaceId) {}

    // `Event::SptSwitchThresholdChanged`: re-run the SPT-switch
    // decision for every (S,G) entry.
    pub(crate) fn spt_switch_threshold_update(&mut self) {
        let Some((mut instance, _arenas)) = self.as_up() else {
            return;
        };
        instance.state.tables.spt_switch_threshold_packets =
            instance.config.spt_switch_threshold_packets;
        let ids: Vec<_> = instance
            .state
            .tables
            .mre_sg
            .iter()
            .map(|idx| instance.state.tables.mre_arena[idx].id)
            .collect();
        instance.add_task_spt_switch_threshold_changed(&ids);
    }
}

impl ProtocolInstance for Instance {
    const PROTOCOL: Protocol = Protocol::PIM;

    type ProtocolInputMsg = ProtocolInputMsg;
    type ProtocolOutputMsg = ProtocolOutputMsg;
    type ProtocolInputChannelsTx = ProtocolInputChannelsTx;
    type ProtocolInputChannelsRx = ProtocolInputChannelsRx;

    fn new(
        name: String,
        shared: InstanceShared,
        tx: InstanceChannelsTx<Instance>,
    ) -> Instance {
        Debug::InstanceCreate.log();

        Instance {
            name,
            config: Default::default(),
            state: None,
            arenas: Default::default(),
            tx,
            shared,
        }
    }

    fn init(&mut self) {
        self.tx.ibus.router_id_sub();
    }

    fn shutdown(mut self) {
        self.stop();
        Debug::InstanceDelete.log();
    }

    fn process_ibus_msg(&mut self, msg: IbusMsg) {
        if let Err(error) = ibus::rx::process(self, msg) {
            error.log();
        }
    }

    fn process_protocol_msg(&mut self, msg: ProtocolInputMsg) {
        let Some((mut instance, arenas)) = self.as_up() else {
            return;
        };

        if let Err(error) = tasks::process_protocol_msg(&mut instance, arenas, msg) {
            error.log();
        }
    }

    fn protocol_input_channels()
    -> (ProtocolInputChannelsTx, ProtocolInputChannelsRx) {
        let (net_rx_packetp, net_rx_packetc) = mpsc::channel(4);
        let (mre_tickp, mre_tickc) = mpsc::channel(4);
        let (send_jpp, send_jpc) = mpsc::channel(4);
        let (register_stop_timerp, register_stop_timerc) = mpsc::channel(4);

        let tx = ProtocolInputChannelsTx {
            net_rx_packet: net_rx_packetp,
            mre_tick: mre_tickp,
            send_jp: send_jpp,
            register_stop_timer: register_stop_timerp,
        };
        let rx = ProtocolInputChannelsRx {
            net_rx_packet: net_rx_packetc,
            mre_tick: mre_tickc,
            send_jp: send_jpc,
            register_stop_timer: register_stop_timerc,
        };

        (tx, rx)
    }

    #[cfg(feature = "testing")]
    fn test_dir() -> String {
        format!("{}/tests/conformance", env!("CARGO_MANIFEST_DIR"))
    }
}

// ===== impl ProtocolInputChannelsRx =====

impl MessageReceiver<ProtocolInputMsg> for ProtocolInputChannelsRx {
    async fn recv(&mut self) -> Option<ProtocolInputMsg> {
        tokio::select! {
            biased;
            msg = self.net_rx_packet.recv() => {
                msg.map(ProtocolInputMsg::NetRxPacket)
            }
            msg = self.mre_tick.recv() => {
                msg.map(ProtocolInputMsg::MreTick)
            }
            msg = self.send_jp.recv() => {
                msg.map(ProtocolInputMsg::SendJp)
            }
            msg = self.register_stop_timer.recv() => {
                msg.map(ProtocolInputMsg::RegisterStopTimer)
            }
        }
    }
}

// ===== impl InstanceUpView =====

impl InstanceUpView<'_> {
    /// `mre_find(source, group, lookup_flags, create_flags)` (§3.4):
    /// resolves the MRE for `(source, group)` of the given `kind`,
    /// creating it (and its siblings, if `create` is set) when absent.
    pub(crate) fn mre_find(
        &mut self,
        kind: crate::mre::EntryKind,
        source: crate::addr::PimAddr,
        group: crate::addr::PimAddr,
        create: bool,
    ) -> Option<crate::collections::MreId> {
        use crate::addr::zero_addr;
        use crate::mre::EntryKind;

        let tables = &mut self.state.tables;
        let existing = match kind {
            EntryKind::Rp => tables.mre_rp.get_by_addr(source),
            EntryKind::Wc => tables.mre_wc.get_by_addr(group),
            EntryKind::Sg => tables.mre_sg.find(source, group),
            EntryKind::SgRpt => tables.mre_sg_rpt.find(source, group),
        };
        if let Some(idx) = existing {
            return Some(tables.mre_arena[idx].id);
        }
        if !create {
            return None;
        }

        let (key_addr, src, grp) = match kind {
            EntryKind::Rp => (source, source, zero_addr(source.is_ipv4())),
            EntryKind::Wc => (group, zero_addr(group.is_ipv4()), group),
            EntryKind::Sg | EntryKind::SgRpt => (source, source, group),
        };
        let idx = match kind {
            EntryKind::Rp => tables.mre_rp.insert(&mut tables.mre_arena, key_addr, |id| {
                crate::mre::PimMre::new(id, kind, src, grp)
            }),
            EntryKind::Wc => tables.mre_wc.insert(&mut tables.mre_arena, key_addr, |id| {
                crate::mre::PimMre::new(id, kind, src, grp)
            }),
            EntryKind::Sg => tables.mre_sg.insert(&mut tables.mre_arena, src, grp, |id| {
                crate::mre::PimMre::new(id, kind, src, grp)
            }),
            EntryKind::SgRpt => tables.mre_sg_rpt.insert(&mut tables.mre_arena, src, grp, |id| {
                crate::mre::PimMre::new(id, kind, src, grp)
            }),
        };
        let id = tables.mre_arena[idx].id;
        let selector = match kind {
            EntryKind::Rp => events::SingleKind::Rp,
            EntryKind::Wc => events::SingleKind::Wc,
            EntryKind::Sg => events::SingleKind::Sg,
            EntryKind::SgRpt => events::SingleKind::SgRpt,
        };
        self.add_task_add_pim_mre(selector, id);
        Some(id)
    }
}

#[allow(dead_code)]
pub(crate) type InterfaceRef<'a> = &'a Interface;
