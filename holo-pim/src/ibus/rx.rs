//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_utils::ibus::IbusMsg;
use holo_utils::southbound::{AddressMsg, InterfaceUpdateMsg};

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;

// ===== global functions =====

pub(crate) fn process(instance: &mut Instance, msg: IbusMsg) -> Result<(), Error> {
    Debug::IbusRx(&msg).log();

    match msg {
        IbusMsg::InterfaceUpd(msg) => process_iface_update(instance, msg)?,
        IbusMsg::InterfaceDel(ifname) => process_iface_del(instance, &ifname)?,
        IbusMsg::InterfaceAddressAdd(msg) => process_addr_add(instance, msg)?,
        IbusMsg::InterfaceAddressDel(msg) => process_addr_del(instance, msg)?,
        IbusMsg::PimDataflowAlarm { source, group } => {
            process_dataflow_alarm(instance, source, group)
        }
        // The Router ID isn't consulted by any PIM-SM state machine: RP
        // candidacy comes entirely from the configured RP-Set, and the
        // Register source address is the RPF neighbor's own primary
        // address. Subscribed to for parity with the other protocols.
        IbusMsg::RouterIdUpdate(_) => {}
        _ => {}
    }

    Ok(())
}

fn process_dataflow_alarm(
    instance: &mut Instance,
    source: std::net::IpAddr,
    group: std::net::IpAddr,
) {
    let Some((mut up, _arenas)) = instance.as_up() else {
        return;
    };
    let Some(idx) = up.state.tables.mre_sg.find(source, group) else {
        return;
    };
    let Some(entry) = up.state.tables.mre_arena.get_mut(idx) else {
        return;
    };
    if entry.dataflow_crossed {
        return;
    }
    entry.dataflow_crossed = true;
    let id = entry.id;
    up.add_task_spt_switch_threshold_changed(&[id]);
}

fn process_iface_update(
    instance: &mut Instance,
    msg: InterfaceUpdateMsg,
) -> Result<(), Error> {
    let Some((up, arenas)) = instance.as_up() else {
        return Ok(());
    };
    let Some(iface) = arenas.interfaces.get_mut_by_name(&msg.ifname) else {
        return Ok(());
    };

    iface.state.ifindex = Some(msg.ifindex);
    iface.update(iface.config.enabled, &up.tx.protocol_input.net_rx_packet)?;

    Ok(())
}

fn process_iface_del(instance: &mut Instance, ifname: &str) -> Result<(), Error> {
    let Some((_up, arenas)) = instance.as_up() else {
        return Ok(());
    };
    let Some(iface) = arenas.interfaces.get_mut_by_name(ifname) else {
        return Ok(());
    };

    iface.stop();
    iface.state.ifindex = None;
    iface.state.primary_addr = None;
    iface.state.addr_list.clear();

    Ok(())
}

fn process_addr_add(instance: &mut Instance, msg: AddressMsg) -> Result<(), Error> {
    let Some((up, arenas)) = instance.as_up() else {
        return Ok(());
    };
    let Some(iface) = arenas.interfaces.get_mut_by_name(&msg.ifname) else {
        return Ok(());
    };

    if !iface.state.addr_list.insert(msg.addr) {
        return Ok(());
    }
    if iface.state.primary_addr.is_none() {
        iface.state.primary_addr = Some(msg.addr.ip());
    }
    iface.update(iface.config.enabled, &up.tx.protocol_input.net_rx_packet)?;

    Ok(())
}

fn process_addr_del(instance: &mut Instance, msg: AddressMsg) -> Result<(), Error> {
    let Some((up, arenas)) = instance.as_up() else {
        return Ok(());
    };
    let Some(iface) = arenas.interfaces.get_mut_by_name(&msg.ifname) else {
        return Ok(());
    };

    if !iface.state.addr_list.remove(&msg.addr) {
        return Ok(());
    }
    if iface.state.primary_addr == Some(msg.addr.ip()) {
        iface.state.primary_addr =
            iface.state.addr_list.iter().next().map(|net| net.ip());
    }
    iface.update(iface.config.enabled, &up.tx.protocol_input.net_rx_packet)?;

    Ok(())
}
