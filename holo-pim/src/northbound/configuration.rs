//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::sync::LazyLock as Lazy;
use std::time::Duration;

use enum_as_inner::EnumAsInner;
use holo_northbound::configuration::{
    Callbacks, CallbacksBuilder, Provider, ValidationCallbacks,
    ValidationCallbacksBuilder,
};
use holo_utils::yang::DataNodeRefExt;
use holo_yang::YangPath;
use ipnetwork::IpNetwork;

use crate::addr::PimAddr;
use crate::collections::InterfaceId;
use crate::instance::Instance;
use crate::rp::RpSetEntry;

#[derive(Debug, Default, EnumAsInner)]
pub enum ListEntry {
    #[default]
    None,
    RpSet(IpNetwork, RpAddr),
    Interface(InterfaceId),
}

// Newtype so `ListEntry::RpSet`'s second field reads as what it is at
// call sites rather than a bare `PimAddr`.
pub type RpAddr = PimAddr;

#[derive(Debug)]
pub enum Resource {}

#[derive(Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Event {
    InstanceUpdate,
    RpSetChanged,
    InterfaceUpdate(InterfaceId),
    SptSwitchThresholdChanged,
}

// Instance-wide configuration data.
#[derive(Debug)]
pub struct InstanceCfg {
    pub enabled: bool,
    pub rp_set: Vec<RpSetEntry>,
    pub spt_switch_threshold_packets: Option<u64>,
    pub register_suppress_time: Duration,
    pub register_probe_time: Duration,
    pub keepalive_period: Duration,
}

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            enabled: true,
            rp_set: Vec::new(),
            // `None` means "switch to the SPT on the first data
            // packet", the RFC 4601 default.
            spt_switch_threshold_packets: None,
            register_suppress_time: Duration::from_secs(60),
            register_probe_time: Duration::from_secs(5),
            keepalive_period: Duration::from_secs(210),
        }
    }
}

pub static VALIDATION_CALLBACKS: Lazy<ValidationCallbacks> =
    Lazy::new(load_validation_callbacks);
pub static CALLBACKS: Lazy<Callbacks<Instance>> = Lazy::new(load_callbacks);

fn load_callbacks() -> Callbacks<Instance> {
    CallbacksBuilder::<Instance>::default()
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/enabled",
        ))
        .modify_apply(|instance, args| {
            instance.config.enabled = args.dnode.get_bool();

            let event_queue = args.event_queue;
            event_queue.insert(Event::InstanceUpdate);
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/spt-switch-threshold-packets",
        ))
        .modify_apply(|instance, args| {
            instance.config.spt_switch_threshold_packets =
                Some(args.dnode.get_u64());

            let event_queue = args.event_queue;
            event_queue.insert(Event::SptSwitchThresholdChanged);
        })
        .delete_apply(|instance, args| {
            instance.config.spt_switch_threshold_packets = None;

            let event_queue = args.event_queue;
            event_queue.insert(Event::SptSwitchThresholdChanged);
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/register-suppress-time",
        ))
        .modify_apply(|instance, args| {
            let secs = args.dnode.get_u16();
            instance.config.register_suppress_time =
                Duration::from_secs(secs as u64);
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/register-probe-time",
        ))
        .modify_apply(|instance, args| {
            let secs = args.dnode.get_u16();
            instance.config.register_probe_time =
                Duration::from_secs(secs as u64);
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/keepalive-period",
        ))
        .modify_apply(|instance, args| {
            let secs = args.dnode.get_u16();
            instance.config.keepalive_period = Duration::from_secs(secs as u64);
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/rp/rp-set/rp-set-entry",
        ))
        .create_apply(|instance, args| {
            let group_prefix =
                args.dnode.get_prefix_relative("group-prefix").unwrap();
            let rp_addr = args.dnode.get_ip_relative("rp-address").unwrap();
            instance.config.rp_set.push(RpSetEntry {
                rp_addr,
                group_prefix,
                priority: 0,
            });

            let event_queue = args.event_queue;
            event_queue.insert(Event::RpSetChanged);
        })
        .delete_apply(|instance, args| {
            let (group_prefix, rp_addr) = args.list_entry.into_rp_set().unwrap();
            instance.config.rp_set.retain(|entry| {
                entry.group_prefix != group_prefix || entry.rp_addr != rp_addr
            });

            let event_queue = args.event_queue;
            event_queue.insert(Event::RpSetChanged);
        })
        .lookup(|_instance, _list_entry, dnode| {
            let group_prefix = dnode.get_prefix_relative("group-prefix").unwrap();
            let rp_addr = dnode.get_ip_relative("rp-address").unwrap();
            ListEntry::RpSet(group_prefix, rp_addr)
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/rp/rp-set/rp-set-entry/priority",
        ))
        .modify_apply(|instance, args| {
            let (group_prefix, rp_addr) = args.list_entry.into_rp_set().unwrap();
            let priority = args.dnode.get_u8();
            if let Some(entry) = instance
                .config
                .rp_set
                .iter_mut()
                .find(|entry| {
                    entry.group_prefix == group_prefix && entry.rp_addr == rp_addr
                })
            {
                entry.priority = priority;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::RpSetChanged);
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface",
        ))
        .create_apply(|instance, args| {
            let name = args.dnode.get_string_relative("name").unwrap();
            let iface = instance.arenas.interfaces.insert(&name);
            let iface_id = iface.id;

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .delete_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            if let Some(iface) = instance.arenas.interfaces.get_by_id(iface_id) {
                let idx = iface.index;
                instance.arenas.interfaces.delete(idx);
            }
        })
        .lookup(|instance, _list_entry, dnode| {
            let name = dnode.get_string_relative("name").unwrap();
            let iface = instance
                .arenas
                .interfaces
                .get_by_name(&name)
                .expect("could not find PIM interface");
            ListEntry::Interface(iface.id)
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/enabled",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let enabled = args.dnode.get_bool();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.enabled = enabled;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/dr-priority",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let dr_priority = args.dnode.get_u32();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.dr_priority = dr_priority;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/hello-holdtime",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let hello_holdtime = args.dnode.get_u16();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.hello_holdtime = hello_holdtime;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/jp-period",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let jp_period = args.dnode.get_u16();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.jp_period = jp_period;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/jp-holdtime",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let jp_holdtime = args.dnode.get_u16();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.jp_holdtime = jp_holdtime;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/jp-override-interval",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let jp_override_interval = args.dnode.get_u16();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.jp_override_interval = jp_override_interval;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/assert-time",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let assert_time = args.dnode.get_u16();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.assert_time = assert_time;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .path(YangPath::new(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol/ietf-pim:pim/interfaces/interface/assert-override-interval",
        ))
        .modify_apply(|instance, args| {
            let iface_id = args.list_entry.into_interface().unwrap();
            let assert_override_interval = args.dnode.get_u16();
            if let Some(iface) = instance.arenas.interfaces.get_mut_by_id(iface_id) {
                iface.config.assert_override_interval = assert_override_interval;
            }

            let event_queue = args.event_queue;
            event_queue.insert(Event::InterfaceUpdate(iface_id));
        })
        .build()
}

fn load_validation_callbacks() -> ValidationCallbacks {
    ValidationCallbacksBuilder::default().build()
}

impl Provider for Instance {
    type ListEntry = ListEntry;
    type Event = Event;
    type Resource = Resource;

    fn validation_callbacks() -> Option<&'static ValidationCallbacks> {
        Some(&VALIDATION_CALLBACKS)
    }

    fn callbacks() -> &'static Callbacks<Instance> {
        &CALLBACKS
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::InstanceUpdate => {
                self.update();
            }
            Event::RpSetChanged => {
                self.rp_set_update();
            }
            Event::InterfaceUpdate(iface_id) => {
                self.interface_update(iface_id);
            }
            Event::SptSwitchThresholdChanged => {
                self.spt_switch_threshold_update();
            }
        }
    }
}
