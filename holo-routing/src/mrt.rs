//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Kernel multicast forwarding cache (MFC) programming for PIM-SM.
//!
//! Owns the `MRT_INIT`-enabled raw socket the kernel multicast routing
//! API requires, the ifname -> vif-index allocation table PIM programs
//! against, and the dataflow (SPT-switch) upcall monitors that poll
//! the kernel's per-(S,G) traffic counters on `holo-pim`'s behalf.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::time::Duration;

use holo_utils::capabilities;
use holo_utils::ibus::{IbusMsg, IbusSubscriber};
use holo_utils::socket::{RawSocketExt, Socket};
use holo_utils::southbound::{
    PimMfcInstallMsg, PimMfcUninstallMsg, PimRegisterVifAddMsg,
    PimRegisterVifDelMsg,
};
use holo_utils::task::IntervalTask;
use tracing::warn;

pub struct Mrt {
    socket: Option<Socket>,
    vifs: HashMap<String, u16>,
    next_vif: u16,
    register_vif: Option<u16>,
    dataflows: HashMap<(IpAddr, IpAddr), DataflowMonitor>,
}

struct DataflowMonitor {
    // Keeps the polling task alive; dropped (and thus cancelled) once
    // the `(source, group)` pair is unregistered.
    _task: IntervalTask,
}

impl Default for Mrt {
    fn default() -> Mrt {
        Mrt {
            socket: mrt_socket(),
            vifs: HashMap::new(),
            next_vif: 0,
            register_vif: None,
            dataflows: HashMap::new(),
        }
    }
}

fn mrt_socket() -> Option<Socket> {
    use socket2::{Domain, Protocol, Type};

    let result = capabilities::raise(|| {
        Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::from(libc::IPPROTO_IGMP)))
    })
    .and_then(|socket| socket.set_mrt_init(true).map(|()| socket));

    match result {
        Ok(socket) => Some(socket),
        Err(error) => {
            warn!(%error, "failed to initialize kernel multicast routing");
            None
        }
    }
}

impl Mrt {
    // Allocates (or looks up) the vif id the kernel multicast routing
    // table uses for `ifname`, creating the vif on first use.
    fn vif_for(&mut self, ifname: &str, ifindex: u32) -> Option<u16> {
        if let Some(vifid) = self.vifs.get(ifname) {
            return Some(*vifid);
        }

        let socket = self.socket.as_ref()?;
        let vifid = self.next_vif;
        if let Err(error) = socket.start_vif(ifindex, vifid) {
            warn!(%ifname, %error, "failed to create vif");
            return None;
        }
        self.next_vif += 1;
        self.vifs.insert(ifname.to_owned(), vifid);
        Some(vifid)
    }

    pub(crate) fn mfc_add(
        &mut self,
        interfaces: &BTreeMap<String, crate::Interface>,
        msg: PimMfcInstallMsg,
    ) {
        let (IpAddr::V4(source), IpAddr::V4(group)) = (msg.source, msg.group)
        else {
            // The kernel MRT API this is grounded on (Linux `ip_mroute`)
            // is IPv4-only; PIM-SM for IPv6 has no kernel fast path here.
            return;
        };

        if self.socket.is_none() {
            return;
        }

        let iif_vif = if let Some(vifid) = self.register_vif
            && msg.iif.is_empty()
        {
            vifid
        } else {
            let Some(ifindex) = interfaces.get(&msg.iif).map(|iface| iface.ifindex)
            else {
                return;
            };
            let Some(vifid) = self.vif_for(&msg.iif, ifindex) else {
                return;
            };
            vifid
        };

        let oif_vifs: Vec<u16> = msg
            .oifs
            .iter()
            .filter_map(|ifname| {
                let ifindex = interfaces.get(ifname)?.ifindex;
                self.vif_for(ifname, ifindex)
            })
            .collect();

        let socket = self.socket.as_ref().unwrap();
        if let Err(error) = socket.add_mfc(source, group, iif_vif, &oif_vifs) {
            warn!(%source, %group, %error, "failed to install MFC entry");
        }
    }

    pub(crate) fn mfc_del(&mut self, msg: PimMfcUninstallMsg) {
        let (IpAddr::V4(source), IpAddr::V4(group)) = (msg.source, msg.group)
        else {
            return;
        };
        let Some(socket) = self.socket.as_ref() else {
            return;
        };
        if let Err(error) = socket.del_mfc(source, group) {
            warn!(%source, %group, %error, "failed to uninstall MFC entry");
        }
    }

    // Creates the Register decapsulation vif. `local_addr` isn't used
    // by the raw kernel API (a vif only needs a vif id here), it is
    // kept on the message for symmetry with the southbound API and for
    // a future netlink-based implementation.
    pub(crate) fn register_vif_add(&mut self, _msg: PimRegisterVifAddMsg) {
        if self.register_vif.is_some() {
            return;
        }
        let Some(socket) = self.socket.as_ref() else {
            return;
        };
        let vifid = self.next_vif;
        if let Err(error) = socket.start_vif(0, vifid) {
            warn!(%error, "failed to create Register vif");
            return;
        }
        self.next_vif += 1;
        self.register_vif = Some(vifid);
    }

    pub(crate) fn register_vif_del(&mut self, _msg: PimRegisterVifDelMsg) {
        let Some(vifid) = self.register_vif.take() else {
            return;
        };
        if let Some(socket) = self.socket.as_ref()
            && let Err(error) = socket.stop_vif(vifid)
        {
            warn!(%error, "failed to delete Register vif");
        }
    }

    pub(crate) fn dataflow_add(
        &mut self,
        subscriber: Option<IbusSubscriber>,
        source: IpAddr,
        group: IpAddr,
        threshold_packets: Option<u64>,
        threshold_bytes: Option<u64>,
        interval_secs: u32,
    ) {
        let Some(subscriber) = subscriber else {
            return;
        };
        let (IpAddr::V4(source_v4), IpAddr::V4(group_v4)) = (source, group)
        else {
            return;
        };
        let Some(socket) = self.socket.as_ref() else {
            return;
        };

        // Re-arming an already-monitored pair just replaces the old
        // monitor (and its thresholds) with a fresh one. The socket is
        // cloned (shares the same fd) so the polling task can own it
        // independently of `self`.
        let socket = match socket.try_clone() {
            Ok(socket) => socket,
            Err(error) => {
                warn!(%error, "failed to clone MRT socket");
                return;
            }
        };
        let mut last = (0u64, 0u64);
        let task = IntervalTask::new(
            Duration::from_secs(interval_secs.max(1) as u64),
            false,
            move || {
                let socket = &socket;
                let subscriber = subscriber.clone();
                let crossed = match socket.sg_count(source_v4, group_v4) {
                    Ok((pkts, bytes)) => {
                        let (dpkts, dbytes) = (
                            pkts.saturating_sub(last.0),
                            bytes.saturating_sub(last.1),
                        );
                        last = (pkts, bytes);
                        threshold_packets.is_some_and(|t| dpkts >= t)
                            || threshold_bytes.is_some_and(|t| dbytes >= t)
                    }
                    Err(error) => {
                        warn!(%error, "failed to read kernel (S,G) counters");
                        false
                    }
                };
                async move {
                    if crossed {
                        let msg = IbusMsg::PimDataflowAlarm { source, group };
                        let _ = subscriber.tx.send(msg);
                    }
                }
            },
        );

        self.dataflows
            .insert((source, group), DataflowMonitor { _task: task });
    }

    pub(crate) fn dataflow_del(&mut self, source: IpAddr, group: IpAddr) {
        self.dataflows.remove(&(source, group));
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    // No socket fixture is constructed (the raw socket setup needs
    // `CAP_NET_ADMIN`); these tests exercise the no-kernel-available
    // fallback paths, which is also what a sandboxed CI run hits.
    fn mrt_without_socket() -> Mrt {
        Mrt {
            socket: None,
            vifs: HashMap::new(),
            next_vif: 0,
            register_vif: None,
            dataflows: HashMap::new(),
        }
    }

    #[test]
    fn vif_for_without_socket_returns_none() {
        let mut mrt = mrt_without_socket();
        assert!(mrt.vif_for("eth0", 1).is_none());
        assert!(mrt.vifs.is_empty());
    }

    #[test]
    fn mfc_add_without_socket_is_a_noop() {
        let mut mrt = mrt_without_socket();
        let interfaces = BTreeMap::new();
        mrt.mfc_add(
            &interfaces,
            PimMfcInstallMsg {
                source: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
                group: IpAddr::V4(Ipv4Addr::new(232, 0, 0, 1)),
                iif: "eth0".to_owned(),
                oifs: Default::default(),
            },
        );
        assert!(mrt.vifs.is_empty());
    }

    #[test]
    fn mfc_add_ignores_ipv6_pairs() {
        let mut mrt = mrt_without_socket();
        let interfaces = BTreeMap::new();
        mrt.mfc_add(
            &interfaces,
            PimMfcInstallMsg {
                source: "2001:db8::1".parse().unwrap(),
                group: "ff0e::1".parse().unwrap(),
                iif: "eth0".to_owned(),
                oifs: Default::default(),
            },
        );
        // Falls through the IPv4-only guard before ever touching the
        // (absent) socket or the vif table.
        assert!(mrt.vifs.is_empty());
    }

    #[test]
    fn register_vif_add_without_socket_is_a_noop() {
        let mut mrt = mrt_without_socket();
        mrt.register_vif_add(PimRegisterVifAddMsg {
            local_addr: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
        });
        assert!(mrt.register_vif.is_none());
    }

    #[test]
    fn register_vif_del_without_vif_is_a_noop() {
        let mut mrt = mrt_without_socket();
        mrt.register_vif_del(PimRegisterVifDelMsg {
            local_addr: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
        });
        assert!(mrt.register_vif.is_none());
    }

    #[test]
    fn dataflow_add_without_subscriber_is_a_noop() {
        let mut mrt = mrt_without_socket();
        mrt.dataflow_add(
            None,
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            IpAddr::V4(Ipv4Addr::new(232, 0, 0, 1)),
            Some(100),
            None,
            5,
        );
        assert!(mrt.dataflows.is_empty());
    }

    #[test]
    fn dataflow_del_on_unknown_pair_is_a_noop() {
        let mut mrt = mrt_without_socket();
        mrt.dataflow_del(
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            IpAddr::V4(Ipv4Addr::new(232, 0, 0, 1)),
        );
        assert!(mrt.dataflows.is_empty());
    }
}
