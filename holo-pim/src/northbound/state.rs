//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::sync::LazyLock as Lazy;

use enum_as_inner::EnumAsInner;
use holo_northbound::state::{
    Callbacks, CallbacksBuilder, ListEntryKind, Provider,
};
use holo_yang::{ToYang, YangObject, YangPath};
use yang3::data::DataNodeRef;
use yang3::schema::SchemaModule;

use crate::instance::Instance;
use crate::mfc::PimMfc;
use crate::mre::{EntryKind, PimMre};
use crate::neighbor::PimNbr;

#[derive(Debug, Default, EnumAsInner)]
pub enum ListEntry<'a> {
    #[default]
    None,
    Neighbor(&'a PimNbr),
    Mre(&'a PimMre),
    Mfc(&'a PimMfc),
}

pub static CALLBACKS: Lazy<Callbacks<Instance>> = Lazy::new(load_callbacks);

fn load_callbacks() -> Callbacks<Instance> {
    CallbacksBuilder::<Instance>::default()
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/neighbors/neighbor",
        ))
        .get_iterate(|instance, _args| {
            let Some(state) = &instance.state else {
                return None;
            };
            let iter = state.neighbors.iter().map(ListEntry::Neighbor);
            Some(Box::new(iter))
        })
        .get_object(|instance, args| {
            let nbr = args.list_entry.as_neighbor().unwrap();
            let interface = instance
                .arenas
                .interfaces
                .get_by_vid(nbr.vid)
                .map(|iface| iface.name.clone());
            Box::new(NeighborObject {
                address: nbr.addr.to_string(),
                interface,
            })
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/mroutes/mroute",
        ))
        .get_iterate(|instance, _args| {
            let Some(state) = &instance.state else {
                return None;
            };
            let tables = &state.tables;
            let iter = tables
                .mre_rp
                .iter()
                .chain(tables.mre_wc.iter())
                .chain(tables.mre_sg.iter())
                .chain(tables.mre_sg_rpt.iter())
                .map(|idx| ListEntry::Mre(&tables.mre_arena[idx]));
            Some(Box::new(iter))
        })
        .get_object(|_instance, args| {
            let mre = args.list_entry.as_mre().unwrap();
            let (
                upstream_join_prune,
                upstream_sg_rpt,
                register_state,
                spt,
                keepalive_running,
            ) = match mre.kind {
                EntryKind::Rp | EntryKind::Wc => {
                    (Some(mre.upstream_jp.to_yang()), None, None, None, None)
                }
                EntryKind::Sg => (
                    Some(mre.upstream_jp.to_yang()),
                    None,
                    Some(mre.register_state.to_yang()),
                    Some(mre.spt),
                    Some(mre.keepalive_running),
                ),
                EntryKind::SgRpt => {
                    (None, Some(mre.upstream_sg_rpt.to_yang()), None, None, None)
                }
            };
            Box::new(MrouteEntryObject {
                kind: mre.kind.to_yang(),
                source: mre.source.to_string(),
                group: mre.group.to_string(),
                upstream_join_prune,
                upstream_sg_rpt,
                register_state,
                spt,
                keepalive_running,
            })
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/mfc/mfc-entry",
        ))
        .get_iterate(|instance, _args| {
            let Some(state) = &instance.state else {
                return None;
            };
            let tables = &state.tables;
            let iter = tables
                .mfc
                .iter()
                .map(|idx| ListEntry::Mfc(&tables.mfc_arena[idx]));
            Some(Box::new(iter))
        })
        .get_object(|instance, args| {
            let mfc = args.list_entry.as_mfc().unwrap();
            let iif = mfc.iif.and_then(|vid| {
                instance
                    .arenas
                    .interfaces
                    .get_by_vid(vid)
                    .map(|iface| iface.name.clone())
            });
            let oifs = mfc
                .oifs
                .iter()
                .filter_map(|vid| {
                    instance
                        .arenas
                        .interfaces
                        .get_by_vid(*vid)
                        .map(|iface| iface.name.clone())
                })
                .collect();
            Box::new(MfcEntryObject {
                source: mfc.source.to_string(),
                group: mfc.group.to_string(),
                rp: mfc.rp.map(|rp| rp.to_string()),
                iif,
                oifs,
                is_task_delete_pending: mfc.is_task_delete_pending,
            })
        })
        .build()
}

impl Provider for Instance {
    type ListEntry<'a> = ListEntry<'a>;

    fn callbacks() -> Option<&'static Callbacks<Instance>> {
        Some(&CALLBACKS)
    }
}

impl ListEntryKind for ListEntry<'_> {}

// ===== YANG object structs =====
//
// These mirror what `holo-northbound/build.rs` would generate from a
// real schema module (`into_data_node()` skips list-key leaves, which
// are instead rendered by `list_keys()`). No pre-built `ietf-pim`
// module is vendored in this workspace, so the structs below are
// written by hand following that same codegen pattern.

struct NeighborObject {
    address: String,
    interface: Option<String>,
}

impl YangObject for NeighborObject {
    fn into_data_node(self, dnode: &mut DataNodeRef<'_>) {
        let module: Option<&SchemaModule<'_>> = None;
        if let Some(interface) = self.interface {
            dnode.new_term(module, "interface", Some(&interface)).unwrap();
        }
    }

    fn list_keys(&self) -> String {
        format!("[address='{}']", self.address)
    }
}

struct MrouteEntryObject {
    kind: std::borrow::Cow<'static, str>,
    source: String,
    group: String,
    upstream_join_prune: Option<std::borrow::Cow<'static, str>>,
    upstream_sg_rpt: Option<std::borrow::Cow<'static, str>>,
    register_state: Option<std::borrow::Cow<'static, str>>,
    spt: Option<bool>,
    keepalive_running: Option<bool>,
}

impl YangObject for MrouteEntryObject {
    fn into_data_node(self, dnode: &mut DataNodeRef<'_>) {
        let module: Option<&SchemaModule<'_>> = None;
        if let Some(upstream_join_prune) = self.upstream_join_prune {
            dnode
                .new_term(module, "upstream-join-prune", Some(&upstream_join_prune))
                .unwrap();
        }
        if let Some(upstream_sg_rpt) = self.upstream_sg_rpt {
            dnode
                .new_term(module, "upstream-sg-rpt", Some(&upstream_sg_rpt))
                .unwrap();
        }
        if let Some(register_state) = self.register_state {
            dnode
                .new_term(module, "register-state", Some(&register_state))
                .unwrap();
        }
        if let Some(spt) = self.spt {
            dnode.new_term(module, "spt", Some(&spt.to_string())).unwrap();
        }
        if let Some(keepalive_running) = self.keepalive_running {
            dnode
                .new_term(module, "keepalive-running", Some(&keepalive_running.to_string()))
                .unwrap();
        }
    }

    fn list_keys(&self) -> String {
        format!(
            "[kind='{}'][source='{}'][group='{}']",
            self.kind, self.source, self.group
        )
    }
}

struct MfcEntryObject {
    source: String,
    group: String,
    rp: Option<String>,
    iif: Option<String>,
    oifs: Vec<String>,
    is_task_delete_pending: bool,
}

impl YangObject for MfcEntryObject {
    fn into_data_node(self, dnode: &mut DataNodeRef<'_>) {
        let module: Option<&SchemaModule<'_>> = None;
        if let Some(rp) = self.rp {
            dnode.new_term(module, "rp", Some(&rp)).unwrap();
        }
        if let Some(iif) = self.iif {
            dnode.new_term(module, "iif", Some(&iif)).unwrap();
        }
        for oif in &self.oifs {
            dnode.new_term(module, "oif", Some(oif)).unwrap();
        }
        dnode
            .new_term(
                module,
                "delete-pending",
                Some(&self.is_task_delete_pending.to_string()),
            )
            .unwrap();
    }

    fn list_keys(&self) -> String {
        format!("[source='{}'][group='{}']", self.source, self.group)
    }
}
